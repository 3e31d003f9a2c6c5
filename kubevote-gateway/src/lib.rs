//! The vote gateway (C5): TCP accept loop, per-connection Votifier
//! protocol handler, claim-queue poller, and join-notification poller
//! (spec §4.5).

pub mod claim_poller;
pub mod config;
pub mod connection;
pub mod gateway;
pub mod join_poller;
pub mod notified;

pub use config::GatewayConfig;
pub use gateway::Gateway;

/// Runs the gateway to completion: binds the listener, optionally logs an
/// RC self-test result, then serves until a shutdown signal is received.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let gateway = Gateway::new(&config).await?;
    gateway.self_test_rc().await;

    let cancel = gateway.cancel_token();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received, stopping votifier");
        shutdown.cancel();
    });

    tracing::info!("votifier gateway started");
    gateway.run().await;
    tracing::info!("votifier gateway stopped");

    Ok(())
}

async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}
