//! Builds the response for the `players` slash command (spec §4.6).

use crate::adapter::{ChatPlatform, EmbedSpec};
use crate::avatar;
use crate::bridge::{BridgeState, EMBED_AVATAR_SIZE};
use crate::stats;

const MAX_LISTED: usize = 20;
const ATTACHMENT_NAME: &str = "players.png";
const COLOR_OFFLINE: u32 = 0xE67E22;
const COLOR_ONLINE: u32 = 0x3498DB;

/// The `players` slash-command response: the embed to send, and whether
/// it should be sent ephemerally (the offline placeholder only).
pub struct PlayersResponse {
    /// The embed to attach to the interaction response.
    pub embed: EmbedSpec,
    /// Whether the response should be ephemeral (offline placeholder).
    pub ephemeral: bool,
}

/// Builds the `players` slash-command embed, fetching and compositing
/// avatars when the server is online and at least one fetch succeeds.
pub async fn build_embed(state: &BridgeState) -> PlayersResponse {
    let Some(stats) = state.current_stats().filter(|_| state.is_online()) else {
        let embed = EmbedSpec::new(
            "Players Online (0)",
            "The server is offline or restarting.",
            COLOR_OFFLINE,
        );
        return PlayersResponse { embed, ephemeral: true };
    };

    let names: Vec<&str> = stats.players.iter().take(MAX_LISTED).map(|p| p.name.as_str()).collect();
    let description = if names.is_empty() {
        "No players online.".to_string()
    } else {
        names.iter().map(|name| format!("- {name}")).collect::<Vec<_>>().join("\n")
    };

    let mut embed = EmbedSpec::new(
        format!("Players Online ({})", stats.player_count),
        description,
        COLOR_ONLINE,
    );
    embed.footer = Some(format!("TPS: {:.2} | Uptime: {}", stats.tps, stats.uptime));

    let avatars = fetch_avatars(state.adapter.as_ref(), &stats.players[..names.len().min(stats.players.len())]).await;
    if let Ok(Some(png)) = avatar::composite_grid(&avatars, EMBED_AVATAR_SIZE, 5, 4) {
        embed.image = Some((ATTACHMENT_NAME.to_string(), png));
    }

    PlayersResponse { embed, ephemeral: false }
}

async fn fetch_avatars(adapter: &dyn ChatPlatform, players: &[stats::PlayerRef]) -> Vec<Vec<u8>> {
    let mut avatars = Vec::with_capacity(players.len());

    for player in players.iter().take(MAX_LISTED) {
        let url = stats::avatar_url(&player.uuid, EMBED_AVATAR_SIZE);
        match adapter.http_get_bytes(&url).await {
            Ok(bytes) => avatars.push(bytes),
            Err(err) => tracing::debug!(player = %player.name, %err, "failed to fetch avatar"),
        }
    }

    avatars
}
