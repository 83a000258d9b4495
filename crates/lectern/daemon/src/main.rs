//! Lectern Daemon - projector and meeting core service
//!
//! The daemon provides:
//! - REST API for projectors, config, tags, chat, messages and countdowns
//! - Projector element composition (activate, prune, project, ...)
//! - History log with rebuild
//! - Autoupdate stream of every change

use clap::Parser;
use lectern_daemon::error::{DaemonError, DaemonResult};
use lectern_daemon::{DaemonConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lectern Daemon CLI
#[derive(Parser)]
#[command(name = "lecternd")]
#[command(about = "Lectern Daemon - projector and meeting core service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LECTERN_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration file
    #[arg(short, long, env = "LECTERN_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "LECTERN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "LECTERN_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        "Starting Lectern daemon"
    );

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await
}
