//! Consul Entrypoint
//!
//! Container entrypoint: keeps the instance registered with a Consul agent on a
//! fixed period while an application server runs in the foreground.

pub mod app;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod registrar;
pub mod registry;
pub mod runtime;
pub mod server;
pub mod telemetry;
pub mod types;
pub mod utils;

// Re-exports
pub use config::{Config, LogFormat};
pub use error::{EntrypointError, ErrorCategory, Result};
pub use registrar::{Registrar, RegistrarStats, RegistrationTemplate};
pub use registry::{ConsulRegistry, ServiceRegistry};
pub use runtime::ServiceRuntime;
pub use types::{HealthCheck, HealthCheckProtocol, ServiceRegistration};
