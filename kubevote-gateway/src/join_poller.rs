//! Join-notification poller (spec §4.5).
//!
//! Polls `list`, diffs the online set against the previous tick, and
//! `tellraw`s any newly-joined player with pending rewards a clickable
//! claim prompt.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use kubevote_rc::RcClient;
use kubevote_store::PendingRewardsStore;
use tokio_util::sync::CancellationToken;

use crate::notified::NotifiedSet;

const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Runs until `cancel` fires.
pub async fn run(
    rc: Arc<RcClient>,
    pending: Arc<PendingRewardsStore>,
    notified: Arc<NotifiedSet>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut online: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match poll_online(&rc).await {
                    Ok(new_online) => {
                        reconcile(&rc, &pending, &notified, &mut online, new_online).await;
                    }
                    Err(err) => tracing::warn!(%err, "join poller: failed to list players"),
                }
            }
        }
    }
}

async fn poll_online(rc: &RcClient) -> Result<HashSet<String>, kubevote_rc::RcError> {
    let response = rc.exec("list").await?;
    Ok(parse_player_list(&response))
}

/// Parses the tail-after-colon comma-separated player list, stripping
/// `[TAG]` prefixes.
fn parse_player_list(response: &str) -> HashSet<String> {
    let Some(idx) = response.find(':') else {
        return HashSet::new();
    };

    response[idx + 1..]
        .split(',')
        .map(strip_tag_prefix)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_tag_prefix(name: &str) -> &str {
    match name.rfind(']') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

async fn reconcile(
    rc: &RcClient,
    pending: &PendingRewardsStore,
    notified: &NotifiedSet,
    online: &mut HashSet<String>,
    new_online: HashSet<String>,
) {
    if new_online.is_empty() && !online.is_empty() {
        tracing::debug!("join poller: parsed empty player list, treating as transient parse failure");
        return;
    }

    let joined: Vec<String> = new_online.difference(online).cloned().collect();
    let left: Vec<String> = online.difference(&new_online).cloned().collect();

    for name in &joined {
        if notified.contains(name) {
            continue;
        }
        let count = pending.pending_count(name);
        if count == 0 {
            continue;
        }

        let message = claim_prompt_json(count);
        if let Err(err) = rc.exec(&format!("tellraw {name} {message}")).await {
            tracing::warn!(user = %name, %err, "failed to send join notification");
            continue;
        }
        notified.insert(name);
    }

    for name in &left {
        notified.remove(name);
    }

    *online = new_online;
}

fn claim_prompt_json(count: usize) -> String {
    format!(
        r#"{{"text":"You have {count} pending vote reward(s)! ","color":"gold","extra":[{{"text":"Click here to claim","color":"green","underlined":true,"clickEvent":{{"action":"run_command","value":"/vote claim"}}}}]}}"#
    )
}
