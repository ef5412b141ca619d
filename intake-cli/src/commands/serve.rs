//! HTTP server command
//!
//! Runs the intake API until Ctrl+C or SIGTERM.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use intake_server::{run_server, AppConfig, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Database URL (overrides environment); `memory://` for an in-process store
    #[arg(long)]
    pub database_url: Option<String>,

    /// Environment label (overrides APP_ENV)
    #[arg(long)]
    pub env: Option<String>,

    /// Connect lazily on first request instead of warming up at startup
    #[arg(long)]
    pub lazy: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(url) = args.database_url {
        config.database_url = Some(url);
    }
    if let Some(label) = args.env {
        config.environment = intake_server::Environment::parse(&label);
    }

    if config.database_url.is_none() {
        tracing::warn!("DATABASE_URL not set; submissions will be rejected with 503");
    }

    let state = Arc::new(AppState::from_config(config).context("Failed to configure store")?);

    // Always-resident deployment: open the connection now, without blocking startup
    if !args.lazy {
        let warm = state.clone();
        tokio::spawn(async move {
            if warm.connections.get().await.is_err() {
                tracing::warn!("initial store connection failed; will retry on next request");
            }
        });
    }

    let server = ServerConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
    };

    // Run server (blocks until shutdown)
    run_server(state, server).await.context("Server error")?;

    Ok(())
}
