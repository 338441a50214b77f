//! TAT Daemon - timeline and stage-progression service
//!
//! Serves the timeline engine over REST and streams stage transitions
//! as server-sent events.

use clap::Parser;
use tat_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// TAT Daemon CLI
#[derive(Parser)]
#[command(name = "tatd")]
#[command(about = "TAT Daemon - timeline and stage-progression service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TAT_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "TAT_LISTEN_ADDR")]
    listen: Option<String>,

    /// JSON engine configuration with catalogs and TAT tables
    #[arg(long, env = "TAT_CATALOGS")]
    catalogs: Option<String>,

    /// Log level
    #[arg(long, env = "TAT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "TAT_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // CLI overrides
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(catalogs) = cli.catalogs {
        config.engine.catalogs = Some(catalogs);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

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
        "Starting tatd"
    );

    let server = Server::new(config)?;
    server.run().await
}
