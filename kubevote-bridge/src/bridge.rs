//! The bridge orchestrator: stats polling, status FSM, topic updates and
//! chat relay (spec §4.6).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kubevote_rc::RcClient;
use kubevote_utils::locks::SyncMutex;
use tokio_util::sync::CancellationToken;

use crate::adapter::{ChatPlatform, EmbedSpec, WebhookHandle};
use crate::config::BridgeConfig;
use crate::sanitize;
use crate::stats::{self, Event, StatsSnapshot};
use crate::status_fsm::{StatusFsm, StatusNotification};

const COLOR_ONLINE: u32 = 0x2ECC71;
const COLOR_OFFLINE: u32 = 0xE74C3C;
const COLOR_JOIN: u32 = 0x2ECC71;
const COLOR_LEAVE: u32 = 0xE74C3C;
const COLOR_STARTUP: u32 = 0x9B59B6;
const COLOR_ERROR: u32 = 0xE74C3C;
const WEBHOOK_NAME: &str = "Minecraft Bridge";

const CHAT_AVATAR_SIZE: u32 = 128;
/// Avatar pixel size used for join/leave embeds and the `players` command.
pub const EMBED_AVATAR_SIZE: u32 = 32;

/// Shared state mutated by the stats poller, topic updater and inbound
/// chat handler.
pub struct BridgeState {
    pub config: BridgeConfig,
    pub rc: Arc<RcClient>,
    pub adapter: Arc<dyn ChatPlatform>,
    fsm: SyncMutex<StatusFsm>,
    last_topic: SyncMutex<Option<String>>,
    latest_stats: SyncMutex<Option<StatsSnapshot>>,
    webhook: SyncMutex<Option<WebhookHandle>>,
    shutdown_sent: AtomicBool,
}

impl BridgeState {
    /// Builds fresh bridge state; does not perform any I/O.
    pub fn new(config: BridgeConfig, rc: Arc<RcClient>, adapter: Arc<dyn ChatPlatform>) -> Arc<Self> {
        Arc::new(Self {
            config,
            rc,
            adapter,
            fsm: SyncMutex::new(StatusFsm::new()),
            last_topic: SyncMutex::new(None),
            latest_stats: SyncMutex::new(None),
            webhook: SyncMutex::new(None),
            shutdown_sent: AtomicBool::new(false),
        })
    }

    /// Resolves (or creates) the channel webhook, unless a manual
    /// `DISCORD_WEBHOOK_URL` is configured.
    pub async fn resolve_webhook(&self) {
        if self.config.discord_webhook_url.is_some() {
            return;
        }

        match self
            .adapter
            .get_or_create_webhook(self.config.discord_channel_id, WEBHOOK_NAME)
            .await
        {
            Ok(handle) => *self.webhook.lock() = Some(handle),
            Err(err) => tracing::error!(%err, "failed to resolve bridge webhook, embeds will be dropped"),
        }
    }

    /// Sends the one-shot startup embed.
    pub async fn announce_startup(&self) {
        let embed = EmbedSpec::new("Bridge Online", "Discord bot started", COLOR_STARTUP);
        if let Err(err) = self.adapter.send_embed(self.config.discord_channel_id, embed).await {
            tracing::error!(%err, "failed to send startup embed");
        }
        self.adapter.set_presence(&self.config.server_name).await;
    }

    /// Sends the one-shot shutdown embed, guarded so it fires exactly once.
    pub async fn announce_shutdown(&self) {
        if self.shutdown_sent.swap(true, Ordering::SeqCst) {
            return;
        }

        let embed = EmbedSpec::new("Bridge Offline", "Discord bot stopped", COLOR_ERROR);
        if let Err(err) = self.adapter.send_embed(self.config.discord_channel_id, embed).await {
            tracing::error!(%err, "failed to send shutdown embed");
        }
    }

    /// Relays a sanitised in-game-bound chat message; on RC failure
    /// replies an error embed on the originating channel.
    pub async fn relay_chat_to_game(&self, username: &str, content: &str) {
        let user = sanitize::sanitize_username(username);
        let message = sanitize::sanitize_message(content, self.config.max_message_length);

        let command = format!("discordmsg \"{user}\" {message}");
        if let Err(err) = self.rc.exec(&command).await {
            tracing::warn!(%err, "failed to relay chat message to the game");
            let embed = EmbedSpec::new(
                "Message was not delivered",
                format!("> {content}"),
                COLOR_ERROR,
            );
            if let Err(embed_err) = self.adapter.send_embed(self.config.discord_channel_id, embed).await {
                tracing::error!(%embed_err, "failed to send delivery-failure embed");
            }
        }
    }

    async fn post_chat_message(&self, player: &str, uuid: &str, message: &str) {
        let avatar = stats::avatar_url(uuid, CHAT_AVATAR_SIZE);

        if let Some(url) = &self.config.discord_webhook_url {
            if let Err(err) = self.adapter.post_webhook_url(url, message, player, &avatar).await {
                tracing::warn!(%err, "failed to post chat message via configured webhook url");
            }
            return;
        }

        let handle = self.webhook.lock().clone();
        match handle {
            Some(handle) => {
                if let Err(err) = self.adapter.send_via_webhook(&handle, message, player, &avatar).await {
                    tracing::warn!(%err, "failed to post chat message via webhook");
                }
            }
            None => tracing::warn!("no webhook available, dropping in-game chat message"),
        }
    }

    async fn process_events(&self, events: &[Event]) {
        for event in events {
            match event {
                Event::Chat { player, uuid, message } => {
                    self.post_chat_message(player, uuid, message).await;
                }
                Event::Join { player, .. } => {
                    let embed = EmbedSpec::new("Player Joined", format!("{player} logged in"), COLOR_JOIN);
                    if let Err(err) = self.adapter.send_embed(self.config.discord_channel_id, embed).await {
                        tracing::warn!(%err, "failed to send join embed");
                    }
                }
                Event::Leave { player, .. } => {
                    let embed = EmbedSpec::new("Player Left", format!("{player} logged out"), COLOR_LEAVE);
                    if let Err(err) = self.adapter.send_embed(self.config.discord_channel_id, embed).await {
                        tracing::warn!(%err, "failed to send leave embed");
                    }
                }
                Event::Unknown => {}
            }
        }
    }

    async fn notify_status(&self, notification: StatusNotification) {
        let embed = match notification {
            StatusNotification::Online => EmbedSpec::new(
                "Server Online",
                format!("{} is back online", self.config.server_name),
                COLOR_ONLINE,
            ),
            StatusNotification::Restarting => EmbedSpec::new(
                "Server Restarting",
                format!("{} is offline or restarting", self.config.server_name),
                COLOR_OFFLINE,
            ),
        };

        if let Err(err) = self.adapter.send_embed(self.config.discord_channel_id, embed).await {
            tracing::error!(%err, "failed to send status notification embed");
        }
    }

    /// Returns the most recently observed stats snapshot, if any.
    pub fn current_stats(&self) -> Option<StatsSnapshot> {
        self.latest_stats.lock().clone()
    }

    /// Whether the status FSM currently believes the server is online.
    pub fn is_online(&self) -> bool {
        self.fsm.lock().state() == crate::status_fsm::ServerState::Online
    }
}

/// Polls `getstats` on every tick, driving the status FSM and relaying
/// any chat/join/leave events it reports (spec §4.6).
pub async fn run_stats_poller(state: Arc<BridgeState>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.stats_check_interval_secs));

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = stats::fetch(&state.rc).await;
                let notification = state.fsm.lock().on_tick(snapshot.is_some(), Instant::now());

                if let Some(notification) = notification {
                    state.notify_status(notification).await;
                }

                if let Some(snapshot) = &snapshot {
                    state.process_events(&snapshot.messages).await;
                }

                *state.latest_stats.lock() = snapshot;
            }
        }
    }
}

/// Edits the channel topic to reflect the latest stats, rate-limited to
/// one edit per distinct topic string (spec §4.6).
pub async fn run_topic_updater(state: Arc<BridgeState>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.topic_update_interval_secs));

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(stats) = state.current_stats() else { continue };
                let topic = format!(
                    "TPS: {:.2} | Players: {} | Uptime: {}",
                    stats.tps, stats.player_count, stats.uptime
                );

                let unchanged = state.last_topic.lock().as_deref() == Some(topic.as_str());
                if unchanged {
                    continue;
                }

                match state.adapter.edit_topic(state.config.discord_channel_id, &topic).await {
                    Ok(()) => *state.last_topic.lock() = Some(topic),
                    Err(err) => tracing::warn!(%err, "failed to edit channel topic"),
                }
            }
        }
    }
}
