//! slotsync - shared slot editor server.

use anyhow::Context;
use clap::Parser;
use slotsync::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("slotsync=info,tower_http=info")
                }),
        )
        .init();

    let config = Cli::parse()
        .into_config()
        .context("invalid configuration")?;

    // Handle Ctrl+C
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    })
    .context("failed to install Ctrl+C handler")?;

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║              slotsync - Shared Slot Editor                 ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!("🌐 Listening on http://{}", config.listen);
    println!("   • GET /           - Editor page ({} slots)", config.slot_count);
    println!("   • GET /api/state  - Current state");
    println!("   • GET /health     - Health check");
    println!("   • WS  /ws         - Live updates");
    println!();

    slotsync::server::run_server(config, async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
    })
    .await?;

    println!("👋 slotsync has exited. Goodbye!");
    Ok(())
}
