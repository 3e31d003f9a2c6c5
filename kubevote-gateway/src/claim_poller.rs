//! Claim-queue poller (spec §4.5).
//!
//! Every tick asks the game for the set of players who ran `/vote claim`
//! since the last poll and reconciles their pending rewards.

use std::sync::Arc;
use std::time::Duration;

use kubevote_rc::RcClient;
use kubevote_store::PendingRewardsStore;
use tokio_util::sync::CancellationToken;

use crate::notified::NotifiedSet;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MARKER: &str = "CLAIMQUEUE:";

/// Runs until `cancel` fires.
pub async fn run(
    rc: Arc<RcClient>,
    pending: Arc<PendingRewardsStore>,
    notified: Arc<NotifiedSet>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(err) = poll_once(&rc, &pending, &notified).await {
                    tracing::warn!(%err, "claim queue poll failed");
                }
            }
        }
    }
}

async fn poll_once(
    rc: &RcClient,
    pending: &PendingRewardsStore,
    notified: &NotifiedSet,
) -> Result<(), kubevote_rc::RcError> {
    let response = rc.exec("kubevote claimqueue").await?;

    let Some(idx) = response.find(MARKER) else {
        return Ok(());
    };

    let names = response[idx + MARKER.len()..]
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty());

    for name in names {
        claim_one(rc, pending, notified, name).await;
    }

    Ok(())
}

async fn claim_one(rc: &RcClient, pending: &PendingRewardsStore, notified: &NotifiedSet, user: &str) {
    let count = pending.pending_count(user);

    if let Err(err) = rc.exec(&format!("kubevote claim {user} {count}")).await {
        tracing::warn!(user, %err, "failed to send claim feedback");
        return;
    }

    if count > 0 {
        if let Err(err) = pending.claim_all(user) {
            tracing::error!(user, %err, "failed to mark rewards claimed");
            return;
        }
        if let Err(err) = pending.clear_claimed(user) {
            tracing::error!(user, %err, "failed to clear claimed rewards");
        }
        notified.remove(user);
        tracing::info!(user, count, "claimed pending rewards");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_extraction_splits_and_trims_names() {
        let response = "CLAIMQUEUE: Steve, Alex ,  ";
        let idx = response.find(MARKER).unwrap();
        let names: Vec<&str> = response[idx + MARKER.len()..]
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        assert_eq!(names, vec!["Steve", "Alex"]);
    }
}
