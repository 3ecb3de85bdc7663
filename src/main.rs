//! stoker: settings discovery and configuration launcher.
//!
//! Entry point for the stoker binary.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use stoker::config::{Config, Options};
use stoker::discovery::{Locator, SearchPathActivator, SETTINGS_ENV_VAR};
use stoker::launch::{launch, operator_message};
use stoker::server::init_tracing;
use stoker::Result;

/// stoker: launch a Django-style application with layered configuration
#[derive(Parser, Debug)]
#[command(name = "stoker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file path or dotted settings module
    settings_path: Option<String>,

    /// Launcher config file (TOML)
    #[arg(short, long, env = "STOKER_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Address to bind, as host:port
    #[arg(short, long, env = "STOKER_BIND")]
    bind: Option<String>,

    /// Worker process count resolved for the application host
    #[arg(short, long, env = "STOKER_WORKERS")]
    workers: Option<i64>,

    /// Listen backlog size
    #[arg(long, env = "STOKER_BACKLOG")]
    backlog: Option<i64>,

    /// Concurrent connections per worker
    #[arg(long, env = "STOKER_WORKER_CONNECTIONS")]
    worker_connections: Option<i64>,

    /// Worker timeout in seconds
    #[arg(short, long, env = "STOKER_TIMEOUT")]
    timeout: Option<i64>,

    /// Graceful shutdown timeout in seconds
    #[arg(long, env = "STOKER_GRACEFUL_TIMEOUT")]
    graceful_timeout: Option<i64>,

    /// Keep-alive seconds (0 disables)
    #[arg(long, env = "STOKER_KEEPALIVE")]
    keepalive: Option<i64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STOKER_LOGLEVEL")]
    loglevel: Option<String>,

    /// Process name override
    #[arg(long, env = "STOKER_PROC_NAME")]
    proc_name: Option<String>,

    /// Pid file path
    #[arg(short, long, env = "STOKER_PIDFILE")]
    pidfile: Option<std::path::PathBuf>,

    /// Enable JSON logging output
    #[arg(long, env = "STOKER_LOG_JSON")]
    log_json: bool,
}

impl Cli {
    /// Explicit-options overlay for the final merge pass. Flags the user
    /// did not supply stay `None`, the unset marker.
    fn overlay(&self) -> Options {
        let mut options = Options::new();
        options.insert(
            "bind".to_string(),
            self.bind.clone().map(toml::Value::String),
        );
        options.insert(
            "workers".to_string(),
            self.workers.map(toml::Value::Integer),
        );
        options.insert(
            "backlog".to_string(),
            self.backlog.map(toml::Value::Integer),
        );
        options.insert(
            "worker_connections".to_string(),
            self.worker_connections.map(toml::Value::Integer),
        );
        options.insert(
            "timeout".to_string(),
            self.timeout.map(toml::Value::Integer),
        );
        options.insert(
            "graceful_timeout".to_string(),
            self.graceful_timeout.map(toml::Value::Integer),
        );
        options.insert(
            "keepalive".to_string(),
            self.keepalive.map(toml::Value::Integer),
        );
        options.insert(
            "loglevel".to_string(),
            self.loglevel.clone().map(toml::Value::String),
        );
        options.insert(
            "proc_name".to_string(),
            self.proc_name.clone().map(toml::Value::String),
        );
        options.insert(
            "pidfile".to_string(),
            self.pidfile
                .as_ref()
                .map(|p| toml::Value::String(p.display().to_string())),
        );
        options
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", operator_message(&err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let base_dir = std::env::current_dir()?;
    let activator = SearchPathActivator::from_env(&base_dir);
    let locator = Locator::new(base_dir, &activator);

    let ambient = std::env::var(SETTINGS_ENV_VAR).ok();
    let settings = locator.locate(
        cli.settings_path.as_deref(),
        SETTINGS_ENV_VAR,
        ambient.as_deref(),
    )?;

    let config = Config::merge(cli.config.as_deref(), &cli.overlay())?;

    init_tracing(config.loglevel(), cli.log_json);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        module = %settings.module_name,
        "stoker starting"
    );

    launch(config, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overlay_marks_unsupplied_flags_unset() {
        let cli = Cli::parse_from(["stoker", "--workers", "4"]);
        let overlay = cli.overlay();
        assert_eq!(overlay["workers"], Some(toml::Value::Integer(4)));
        assert_eq!(overlay["bind"], None);
        assert_eq!(overlay["timeout"], None);
    }

    #[test]
    fn test_cli_accepts_positional_settings_path() {
        let cli = Cli::parse_from(["stoker", "myproj/settings.py", "-b", "0.0.0.0:9000"]);
        assert_eq!(cli.settings_path.as_deref(), Some("myproj/settings.py"));
        assert_eq!(cli.bind.as_deref(), Some("0.0.0.0:9000"));
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
