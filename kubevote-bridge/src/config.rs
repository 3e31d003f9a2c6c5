//! Environment-variable configuration for the bridge (spec §6).

use std::net::{SocketAddr, ToSocketAddrs};

use kubevote_utils::config::{env_bool, env_int, env_opt_str, env_str, require_str, ConfigError};

/// Resolved configuration for the `bridge` binary.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The game's RC address.
    pub rcon_addr: SocketAddr,
    /// The RC password.
    pub rcon_password: String,
    /// The chat-platform bot token.
    pub discord_token: String,
    /// The channel the bridge relays chat in and edits the topic of.
    pub discord_channel_id: u64,
    /// Optional guild id, for fast (per-guild) slash-command registration.
    pub discord_guild_id: Option<u64>,
    /// Optional pre-configured webhook URL, bypassing auto-discovery.
    pub discord_webhook_url: Option<String>,
    /// Display name used in status embeds.
    pub server_name: String,
    /// Seconds between topic-update attempts.
    pub topic_update_interval_secs: u64,
    /// Seconds between `getstats` polls.
    pub stats_check_interval_secs: u64,
    /// Maximum relayed message length.
    pub max_message_length: usize,
    /// Raises the log level to `debug` when true.
    pub debug: bool,
}

impl BridgeConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let rcon_host = env_str("RCON_HOST", "localhost");
        let rcon_port = env_int("RCON_PORT", 25575)?;
        let rcon_password = require_str("RCON_PASSWORD")?;
        let rcon_addr = resolve_addr("RCON_HOST", &rcon_host, rcon_port)?;

        let discord_token = require_str("DISCORD_TOKEN")?;
        let discord_channel_id = parse_id("DISCORD_CHANNEL_ID", &require_str("DISCORD_CHANNEL_ID")?)?;
        let discord_guild_id = match env_opt_str("DISCORD_GUILD_ID") {
            Some(raw) => Some(parse_id("DISCORD_GUILD_ID", &raw)?),
            None => None,
        };
        let discord_webhook_url = env_opt_str("DISCORD_WEBHOOK_URL");

        let server_name = env_str("SERVER_NAME", "Minecraft Server");
        let topic_update_interval_secs = env_int("TOPIC_UPDATE_INTERVAL", 60)?.max(1) as u64;
        let stats_check_interval_secs = env_int("STATS_CHECK_INTERVAL", 5)?.max(1) as u64;
        let max_message_length = env_int("MAX_MESSAGE_LENGTH", 256)?.max(1) as usize;
        let debug = env_bool("DEBUG", false);

        Ok(Self {
            rcon_addr,
            rcon_password,
            discord_token,
            discord_channel_id,
            discord_guild_id,
            discord_webhook_url,
            server_name,
            topic_update_interval_secs,
            stats_check_interval_secs,
            max_message_length,
            debug,
        })
    }
}

/// Resolves `host:port` to a [`SocketAddr`], performing a blocking DNS
/// lookup when `host` isn't already a literal IP address (e.g. the
/// `localhost` default).
fn resolve_addr(key: &'static str, host: &str, port: i64) -> Result<SocketAddr, ConfigError> {
    (host, port as u16)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| ConfigError::Invalid {
            key,
            expected: "a resolvable host:port address",
            value: format!("{host}:{port}"),
        })
}

fn parse_id(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        expected: "an integer snowflake id",
        value: value.to_string(),
    })
}
