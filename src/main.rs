use clap::Parser;
use consul_entrypoint::cli::Cli;
use consul_entrypoint::{Config, bootstrap, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.apply_to(&mut config);

    telemetry::init_tracing(&config.logging)?;

    bootstrap::run(config).await
}
