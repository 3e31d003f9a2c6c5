//! The "already notified" set shared between the join poller and the
//! claim-queue poller (spec §4.5).
//!
//! The join poller owns the *online* bookkeeping exclusively; this set is
//! the one piece of that state the claim poller also mutates, when a
//! reward is claimed while the player is still online (so it notifies
//! again for anything earned later in the same session).

use std::collections::HashSet;

use kubevote_utils::locks::SyncMutex;

/// Tracks lowercase usernames already notified of a pending reward.
#[derive(Default)]
pub struct NotifiedSet {
    names: SyncMutex<HashSet<String>>,
}

impl NotifiedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `user` (case-insensitive) has already been notified.
    pub fn contains(&self, user: &str) -> bool {
        self.names.lock().contains(&user.to_lowercase())
    }

    /// Marks `user` as notified.
    pub fn insert(&self, user: &str) {
        self.names.lock().insert(user.to_lowercase());
    }

    /// Clears the notified flag for `user`, e.g. after a claim.
    pub fn remove(&self, user: &str) {
        self.names.lock().remove(&user.to_lowercase());
    }
}
