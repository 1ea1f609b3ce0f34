use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use spider_registry::{Fetcher, HttpFetcher, RuleRegistry, TestRunner};
use spider_server::api::AppState;
use spider_server::config::SpiderConfig;

/// Spider rule admin HTTP server.
#[derive(Parser, Debug)]
#[command(name = "spider-server", about = "HTTP admin server for spider crawl rules")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "spider.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config_path = Path::new(&cli.config);
    if !config_path.exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }
    let config = SpiderConfig::load(config_path)?;

    let store = spider_server::store_factory::create_store(&config.store).await?;
    info!(backend = %config.store.backend, "rule store initialized");

    let fetcher: Arc<dyn Fetcher> =
        Arc::new(HttpFetcher::new(config.fetch.to_fetch_config())?);

    let state = AppState {
        registry: Arc::new(RuleRegistry::new(Arc::clone(&store))),
        runner: Arc::new(TestRunner::new(fetcher)),
    };
    let app = spider_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "spider-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release store connections (with configurable timeout).
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    if tokio::time::timeout(shutdown_timeout, store.close())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded while closing the rule store"
        );
    }

    info!("spider-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
