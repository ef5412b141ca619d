//! Configuration and connectivity check
//!
//! Loads configuration the same way `serve` does, connects once, and prints
//! what the health check would report.

use anyhow::{bail, Context, Result};
use clap::Parser;

use intake_server::{AppConfig, AppState};

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Database URL (overrides environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn run_check(args: CheckArgs) -> Result<()> {
    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(url) = args.database_url {
        config.database_url = Some(url);
    }

    println!("environment:      {}", config.environment);
    println!("allowed origins:  {}", config.allowed_origins.join(", "));
    println!(
        "rate limit:       {} requests / {}s",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );
    println!("offline accept:   {}", config.accept_when_offline);
    println!("trust proxy:      {}", config.trust_proxy);
    if config.environment.is_production() && config.admin_key.is_none() {
        println!("warning: ADMIN_KEY not set; GET /contacts will reject every request");
    }

    let state = AppState::from_config(config).context("Failed to configure store")?;
    let store = match state.connections.get().await {
        Ok(store) => store,
        Err(e) => bail!("store connection failed: {e}"),
    };

    let stats = store.stats().await.context("Failed to read store stats")?;
    let databases = store
        .list_databases()
        .await
        .context("Failed to list databases")?;
    println!("store:            connected ({} contacts)", stats.contacts);
    println!("databases:        {}", databases.join(", "));

    state.connections.close().await;
    Ok(())
}
