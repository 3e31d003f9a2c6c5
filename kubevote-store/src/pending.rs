//! Durable, per-player FIFO of pending rewards for offline players (spec
//! §3, §4.3).
//!
//! Ported from `original_source/votifier_service/pending_rewards.py`'s
//! `PendingRewardsStore`: one mutex guards both the in-memory map and the
//! on-disk JSON file, and every mutation rewrites the whole file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use kubevote_utils::locks::SyncMutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A single pending reward awaiting claim by an offline player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingReward {
    /// The player's username, in its original casing.
    pub username: String,
    /// The voting service that granted this reward.
    pub service: String,
    /// ISO-8601 UTC timestamp of when the vote was recorded.
    pub timestamp: String,
    /// Whether this reward has already been claimed.
    #[serde(default)]
    pub claimed: bool,
}

type RewardMap = HashMap<String, Vec<PendingReward>>;

/// Thread-safe, disk-backed store of pending rewards (spec §4.3).
pub struct PendingRewardsStore {
    path: PathBuf,
    rewards: SyncMutex<RewardMap>,
}

impl PendingRewardsStore {
    /// Loads `path` if it exists, tolerating a missing file (fresh start)
    /// or a corrupt one (logs a warning, starts empty, leaves the file
    /// untouched on disk).
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let rewards = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RewardMap>(&contents) {
                Ok(map) => {
                    tracing::info!(players = map.len(), "loaded pending rewards");
                    map
                }
                Err(err) => {
                    tracing::warn!(%err, path = %path.display(), "pending rewards file is corrupt, starting empty");
                    RewardMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no pending rewards file found, starting fresh");
                RewardMap::new()
            }
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "failed to read pending rewards file, starting empty");
                RewardMap::new()
            }
        };

        Self {
            path,
            rewards: SyncMutex::new(rewards),
        }
    }

    /// Appends a new unclaimed reward for `user` and persists immediately.
    pub fn add(&self, user: &str, service: &str) -> Result<(), StoreError> {
        let mut rewards = self.rewards.lock();
        let key = user.to_lowercase();

        rewards.entry(key).or_default().push(PendingReward {
            username: user.to_string(),
            service: service.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            claimed: false,
        });

        self.save(&rewards)?;
        tracing::info!(user, service, "added pending reward");
        Ok(())
    }

    /// Returns the unclaimed rewards for `user`.
    pub fn pending(&self, user: &str) -> Vec<PendingReward> {
        let rewards = self.rewards.lock();
        rewards
            .get(&user.to_lowercase())
            .map(|list| list.iter().filter(|r| !r.claimed).cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of unclaimed rewards for `user`.
    pub fn pending_count(&self, user: &str) -> usize {
        self.pending(user).len()
    }

    /// Marks every reward for `user` as claimed and returns the ones that
    /// were previously unclaimed, persisting the change.
    pub fn claim_all(&self, user: &str) -> Result<Vec<PendingReward>, StoreError> {
        let mut rewards = self.rewards.lock();
        let key = user.to_lowercase();

        let unclaimed = rewards
            .get(&key)
            .map(|list| list.iter().filter(|r| !r.claimed).cloned().collect())
            .unwrap_or_default();

        if let Some(list) = rewards.get_mut(&key) {
            for reward in list.iter_mut() {
                reward.claimed = true;
            }
        }

        self.save(&rewards)?;
        tracing::info!(user, claimed = unclaimed.len(), "claimed pending rewards");
        Ok(unclaimed)
    }

    /// Drops claimed entries for `user`, removing the player's key
    /// entirely if nothing remains, and persists the change.
    pub fn clear_claimed(&self, user: &str) -> Result<(), StoreError> {
        let mut rewards = self.rewards.lock();
        let key = user.to_lowercase();

        if let Some(list) = rewards.get_mut(&key) {
            list.retain(|r| !r.claimed);
            if list.is_empty() {
                rewards.remove(&key);
            }
        }

        self.save(&rewards)
    }

    /// Returns every player (lowercase key) with at least one unclaimed
    /// reward.
    pub fn all_players_with_pending(&self) -> Vec<String> {
        let rewards = self.rewards.lock();
        rewards
            .iter()
            .filter(|(_, list)| list.iter().any(|r| !r.claimed))
            .map(|(user, _)| user.clone())
            .collect()
    }

    fn save(&self, rewards: &RewardMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Persist)?;
        }

        let json = serde_json::to_string_pretty(rewards)?;
        write_atomically(&self.path, json.as_bytes()).map_err(StoreError::Persist)?;
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)
}
