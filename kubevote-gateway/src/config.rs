//! Environment-variable configuration for the vote gateway (spec §6).

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use kubevote_utils::config::{env_bool, env_int, env_str, require_str, ConfigError};

/// Resolved configuration for the `votifier` binary.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The game's RC address.
    pub rcon_addr: SocketAddr,
    /// The RC password.
    pub rcon_password: String,
    /// The address the Votifier listener binds to.
    pub votifier_addr: SocketAddr,
    /// Directory holding `private.pem` / `public.pem`.
    pub keys_path: PathBuf,
    /// Raises the log level to `debug` when true.
    pub debug: bool,
}

impl GatewayConfig {
    /// Loads configuration from the process environment (`.env` first, per
    /// [`kubevote_utils::config::load_dotenv`]).
    pub fn load() -> Result<Self, ConfigError> {
        let rcon_host = env_str("RCON_HOST", "localhost");
        let rcon_port = env_int("RCON_PORT", 25575)?;
        let rcon_password = require_str("RCON_PASSWORD")?;

        let votifier_host = env_str("VOTIFIER_HOST", "0.0.0.0");
        let votifier_port = env_int("VOTIFIER_PORT", 8192)?;

        let keys_path = PathBuf::from(env_str("KEYS_PATH", "keys"));
        let debug = env_bool("DEBUG", false);

        let rcon_addr = resolve_addr("RCON_HOST", &rcon_host, rcon_port)?;
        let votifier_addr = resolve_addr("VOTIFIER_HOST", &votifier_host, votifier_port)?;

        Ok(Self {
            rcon_addr,
            rcon_password,
            votifier_addr,
            keys_path,
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
