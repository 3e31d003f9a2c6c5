//! The bridge engine (C6) and chat-platform adapter (C7): relays chat
//! between a channel and the game, polls status, and serves the
//! `players` slash command (spec §4.6, §4.7).

pub mod adapter;
pub mod avatar;
pub mod bridge;
pub mod config;
pub mod error;
pub mod handler;
pub mod players_command;
pub mod sanitize;
pub mod serenity_adapter;
pub mod stats;
pub mod status_fsm;

use std::sync::Arc;

use kubevote_rc::RcClient;
use serenity::all::GatewayIntents;
use serenity::http::Http;
use tokio_util::sync::CancellationToken;

use adapter::ChatPlatform;
use bridge::BridgeState;
use config::BridgeConfig;
use handler::Handler;
use serenity_adapter::SerenityAdapter;

/// Runs the bridge to completion: connects to the chat platform, starts
/// the stats poller and topic updater, then serves until a shutdown
/// signal is received.
pub async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    let rc = Arc::new(RcClient::new(config.rcon_addr, config.rcon_password.clone()));
    let guild_id = config.discord_guild_id;

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let serenity_http = Arc::new(Http::new(&config.discord_token));
    let serenity_adapter = Arc::new(SerenityAdapter::new(serenity_http));
    let chat_platform: Arc<dyn ChatPlatform> = serenity_adapter.clone();

    let state = BridgeState::new(config, rc.clone(), chat_platform);

    let mut client = serenity::Client::builder(&state.config.discord_token, intents)
        .event_handler(Handler {
            state: state.clone(),
            adapter: serenity_adapter,
            guild_id,
        })
        .await?;

    let shard_manager = client.shard_manager.clone();
    let cancel = CancellationToken::new();

    let stats_task = tokio::spawn(bridge::run_stats_poller(state.clone(), cancel.clone()));
    let topic_task = tokio::spawn(bridge::run_topic_updater(state.clone(), cancel.clone()));

    let shutdown_state = state.clone();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received, stopping bridge");
        shutdown_cancel.cancel();
        shutdown_state.announce_shutdown().await;
        shard_manager.shutdown_all().await;
    });

    tracing::info!("bridge starting");
    client.start().await?;

    cancel.cancel();
    let _ = stats_task.await;
    let _ = topic_task.await;
    rc.close().await;

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
