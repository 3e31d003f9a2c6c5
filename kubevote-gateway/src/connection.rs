//! Per-connection Votifier protocol handler (spec §4.5 step 1-8).

use std::sync::Arc;
use std::time::Duration;

use kubevote_crypto::{self as crypto, KeyPair};
use kubevote_rc::RcClient;
use kubevote_store::{PendingRewardsStore, VoteDeduplicator};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles one accepted Votifier connection end to end, per §4.5.
///
/// Every path closes the socket; errors are logged, never propagated —
/// a malformed vote attempt must not disturb the accept loop.
pub async fn handle(
    mut socket: TcpStream,
    peer: std::net::SocketAddr,
    keys: Arc<KeyPair>,
    dedup: Arc<VoteDeduplicator>,
    pending: Arc<PendingRewardsStore>,
    rc: Arc<RcClient>,
) {
    match timeout(SOCKET_TIMEOUT, socket.write_all(crypto::GREETING)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(%peer, %err, "failed to send votifier greeting");
            return;
        }
        Err(_) => {
            tracing::warn!(%peer, "timed out sending votifier greeting");
            return;
        }
    }

    let mut block = [0u8; crypto::BLOCK_SIZE];
    match timeout(SOCKET_TIMEOUT, socket.read_exact(&mut block)).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => {
            tracing::warn!(%peer, %err, "vote block read failed");
            return;
        }
        Err(_) => {
            tracing::warn!(%peer, "timed out reading vote block");
            return;
        }
    }

    let vote = match crypto::process(&keys.private_key, &block) {
        Ok(vote) => vote,
        Err(err) => {
            tracing::warn!(%peer, %err, "rejected malformed vote block");
            return;
        }
    };

    if dedup.is_duplicate(&vote.user, &vote.service) {
        tracing::info!(user = %vote.user, service = %vote.service, "duplicate vote, dropping");
        return;
    }
    dedup.mark_processed(&vote.user, &vote.service);

    let sanitized_service = vote.service.replace(' ', "_");
    let command = format!("kubevote process {} {}", vote.user, sanitized_service);

    match rc.exec(&command).await {
        Ok(response) if is_offline_response(&response) => {
            if let Err(err) = pending.add(&vote.user, &vote.service) {
                tracing::error!(user = %vote.user, %err, "failed to queue pending reward");
            } else {
                tracing::info!(user = %vote.user, service = %vote.service, "player offline, queued pending reward");
            }
        }
        Ok(response) => {
            tracing::info!(user = %vote.user, service = %vote.service, %response, "vote delivered");
        }
        Err(err) => {
            tracing::warn!(user = %vote.user, %err, "rc exec failed, queuing pending reward");
            if let Err(err) = pending.add(&vote.user, &vote.service) {
                tracing::error!(user = %vote.user, %err, "failed to queue pending reward");
            }
        }
    }
}

fn is_offline_response(response: &str) -> bool {
    let lower = response.to_lowercase();
    lower.contains("not found") || lower.contains("no player")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_response_detection_is_case_insensitive() {
        assert!(is_offline_response("Error: No Player was found"));
        assert!(is_offline_response("player not found"));
        assert!(!is_offline_response("ok"));
    }
}
