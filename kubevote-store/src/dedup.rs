//! Sliding-window vote deduplication (spec §3, §4.4).
//!
//! No surviving Python source implements this class directly; behaviour
//! follows spec.md's description exactly: an in-memory, case-insensitive
//! set of `(user, service)` pairs with a 1-hour TTL, pruned lazily.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use kubevote_utils::locks::SyncMutex;

/// TTL for a dedup entry (spec §3).
pub const DEDUP_TTL: Duration = Duration::from_secs(3600);

/// In-process, crash-forgetful vote deduplicator.
///
/// A crash loses all history; this is acceptable because upstream voting
/// sites almost never double-submit within the TTL window.
pub struct VoteDeduplicator {
    seen: SyncMutex<HashMap<String, Instant>>,
}

impl Default for VoteDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteDeduplicator {
    /// Creates an empty deduplicator.
    pub fn new() -> Self {
        Self {
            seen: SyncMutex::new(HashMap::new()),
        }
    }

    /// Returns whether `(user, service)` was marked processed within the
    /// last hour. Prunes expired entries first.
    pub fn is_duplicate(&self, user: &str, service: &str) -> bool {
        let key = dedup_key(user, service);
        let mut seen = self.seen.lock();
        prune(&mut seen);
        seen.contains_key(&key)
    }

    /// Records `(user, service)` as processed at the current instant.
    pub fn mark_processed(&self, user: &str, service: &str) {
        let key = dedup_key(user, service);
        let mut seen = self.seen.lock();
        seen.insert(key, Instant::now());
    }
}

fn dedup_key(user: &str, service: &str) -> String {
    format!("{}:{}", user.to_lowercase(), service.to_lowercase())
}

fn prune(seen: &mut HashMap<String, Instant>) {
    let now = Instant::now();
    seen.retain(|_, ts| now.saturating_duration_since(*ts) < DEDUP_TTL);
}
