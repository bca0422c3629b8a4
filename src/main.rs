//! Proxy registry service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ http::server ──▶ http::handlers ──▶ store::ProxyStore
//!                 (request ID,      (validate,          ├ memory
//!                  trace, limits)    dispatch)          └ sqlite
//!     Client Response                    │
//!     ◀────────── http::response ◀───────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use proxy_registry::config::{self, ServiceConfig, StorageBackend};
use proxy_registry::lifecycle;
use proxy_registry::observability::logging;

#[derive(Parser)]
#[command(name = "proxy-registry")]
#[command(about = "HTTP registry of proxy servers keyed by hostname", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override storage.backend.
    #[arg(short, long, value_enum)]
    storage: Option<StorageBackend>,

    /// Override storage.path.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut ServiceConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(backend) = self.storage {
            config.storage.backend = backend;
        }
        if let Some(path) = self.db_path {
            config.storage.path = path;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ServiceConfig::default(),
    };
    args.apply(&mut config);
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("proxy-registry v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.storage.backend,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
