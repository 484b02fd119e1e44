//! 命令行参数

use crate::config::Config;
use clap::Parser;

/// consul-entrypoint [--] <command> [args...]
#[derive(Debug, Parser)]
#[command(
    name = "consul-entrypoint",
    version,
    about = "Keep this instance registered with Consul while an application server runs in the foreground"
)]
pub struct Cli {
    /// 前台命令及其参数，原样传递；省略时运行内置应用
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// 命令行给出的前台命令覆盖配置中的命令
    pub fn apply_to(self, config: &mut Config) {
        if !self.command.is_empty() {
            config.server.command = self.command;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("consul-entrypoint").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn help_prints_usage_instead_of_launching() {
        let err = Cli::try_parse_from(["consul-entrypoint", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn command_after_separator_keeps_its_flags() {
        let cli = parse(&["--", "uvicorn", "server:app", "--host", "0.0.0.0", "--reload"]);
        assert_eq!(
            cli.command,
            vec!["uvicorn", "server:app", "--host", "0.0.0.0", "--reload"]
        );
    }

    #[test]
    fn command_without_separator_keeps_its_flags() {
        let cli = parse(&["uvicorn", "server:app", "--reload"]);
        assert_eq!(cli.command, vec!["uvicorn", "server:app", "--reload"]);
    }

    #[test]
    fn no_command_keeps_configured_one() {
        let mut config = Config::default();
        config.server.command = vec!["gunicorn".to_string()];

        parse(&[]).apply_to(&mut config);
        assert_eq!(config.server.command, vec!["gunicorn"]);

        parse(&["uvicorn", "server:app"]).apply_to(&mut config);
        assert_eq!(config.server.command, vec!["uvicorn", "server:app"]);
    }
}
