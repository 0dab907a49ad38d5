use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use levelwatch_lib::{Monitor, MonitorConfig};

use crate::server::build_router;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides BIND_ADDR / PORT)
    #[arg(long)]
    pub bind: Option<String>,

    /// Serve the endpoints without starting the background check loop
    #[arg(long)]
    pub no_loop: bool,
}

pub async fn run(args: &ServeArgs, config: MonitorConfig) -> Result<()> {
    let addr = args.bind.clone().unwrap_or_else(|| config.bind_addr.clone());
    let monitor = Arc::new(Monitor::new(config)?);

    if !args.no_loop {
        let looping = Arc::clone(&monitor);
        tokio::spawn(async move { looping.run_loop().await });
        tracing::info!("Monitor loop started.");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, build_router(monitor))
        .await
        .context("Server error")?;

    Ok(())
}
