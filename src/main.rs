//! Reddit trademark proxy.
//!
//! ```text
//!     Client ──▶ axum server ──▶ RequestForwarder ──▶ UpstreamClient ──▶ www.reddit.com
//!                                                            │
//!     Client ◀── ResponseRelay ◀── ContentRewriter (HTML) ◀──┘
//!                       └──────── streamed as-is (everything else)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use reddit_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use reddit_proxy::lifecycle::{wait_for_signal, Shutdown};
use reddit_proxy::observability::{logging, metrics};
use reddit_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "reddit-proxy")]
#[command(about = "Reverse proxy that marks six-letter words on Reddit pages")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `upstream.target_host`.
    #[arg(short, long)]
    target_host: Option<String>,
}

fn resolve_config(args: Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(target_host) = args.target_host {
        config.upstream.target_host = target_host;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(Args::parse())?;

    logging::init_logging(&config.observability)?;
    tracing::info!("reddit-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        target_host = %config.upstream.target_host,
        timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
