//! The bridge stats snapshot and its `getstats` JSON wire format (spec §3).

use kubevote_rc::RcClient;
use serde::Deserialize;

/// A point-in-time snapshot of the game's state, as reported by
/// `getstats` (spec §3).
#[derive(Debug, Clone, Deserialize)]
pub struct StatsSnapshot {
    /// Current ticks-per-second.
    pub tps: f64,
    /// Number of online players.
    #[serde(rename = "playerCount")]
    pub player_count: u32,
    /// Human-readable uptime string, passed through verbatim.
    pub uptime: String,
    /// Players currently online.
    #[serde(default)]
    pub players: Vec<PlayerRef>,
    /// Chat/join/leave events since the last poll.
    #[serde(default)]
    pub messages: Vec<Event>,
}

/// A minimal player reference: display name plus UUID for avatar lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRef {
    /// The player's display name.
    pub name: String,
    /// The player's UUID, used to build an `mc-heads.net` avatar URL.
    pub uuid: String,
}

/// A tagged event surfaced by the game since the previous stats poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// A chat message sent in-game.
    Chat {
        /// The speaking player's display name.
        player: String,
        /// The speaking player's UUID.
        uuid: String,
        /// The message text.
        message: String,
    },
    /// A player joined the game.
    Join {
        /// The joining player's display name.
        player: String,
        /// The joining player's UUID.
        uuid: String,
    },
    /// A player left the game.
    Leave {
        /// The leaving player's display name.
        player: String,
        /// The leaving player's UUID.
        uuid: String,
    },
    /// Any event type not recognised by this version of the bridge;
    /// ignored when processing messages (spec §4.6).
    #[serde(other)]
    Unknown,
}

/// Polls `getstats` and parses the response. A parse error is treated
/// identically to an RC failure: both yield `None` (spec §4.6, §7).
pub async fn fetch(rc: &RcClient) -> Option<StatsSnapshot> {
    let response = match rc.exec("getstats").await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(%err, "getstats rc call failed");
            return None;
        }
    };

    match serde_json::from_str(&response) {
        Ok(stats) => Some(stats),
        Err(err) => {
            tracing::warn!(%err, "getstats response was not valid JSON");
            None
        }
    }
}

/// Builds an `mc-heads.net` avatar URL for `uuid` at the requested pixel
/// size (spec §4.6).
pub fn avatar_url(uuid: &str, size: u32) -> String {
    format!("https://mc-heads.net/avatar/{uuid}/{size}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_stats_payload() {
        let raw = r#"{
            "tps": 19.85,
            "playerCount": 2,
            "uptime": "21h 1m",
            "players": [{"name": "Steve", "uuid": "abc-123"}],
            "messages": [
                {"type": "chat", "player": "Steve", "uuid": "abc-123", "message": "hi"},
                {"type": "join", "player": "Alex", "uuid": "def-456"},
                {"type": "leave", "player": "Alex", "uuid": "def-456"},
                {"type": "unknown", "player": "Nobody"}
            ]
        }"#;

        let stats: StatsSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.player_count, 2);
        assert_eq!(stats.players.len(), 1);
        // The unknown-typed event still deserializes to `Event::Unknown`
        // and is retained here; it's only ignored later, by
        // `process_events`.
        assert_eq!(stats.messages.len(), 4);
    }

    #[test]
    fn avatar_url_uses_the_requested_size() {
        assert_eq!(avatar_url("abc", 32), "https://mc-heads.net/avatar/abc/32");
        assert_eq!(avatar_url("abc", 128), "https://mc-heads.net/avatar/abc/128");
    }
}
