//! Error taxonomy for the remote-command client (spec §4.1/§7).

use thiserror::Error;

/// Errors produced by [`crate::RcClient`].
#[derive(Debug, Error)]
pub enum RcError {
    /// The game could not be reached within the connect timeout, or the
    /// TCP connection failed outright.
    #[error("remote command server unreachable: {0}")]
    Unreachable(#[source] std::io::Error),

    /// Authentication was rejected (response `packet_id == -1`).
    #[error("remote command authentication failed")]
    AuthFailed,

    /// The connection dropped mid-request; the caller should retry, which
    /// will reconnect and re-authenticate.
    #[error("remote command connection lost: {0}")]
    Disconnected(#[source] std::io::Error),

    /// A packet on the wire did not match the framing described in §3.
    #[error("malformed remote command packet: {0}")]
    Protocol(String),
}
