//! Error taxonomy for the pending-reward store (spec §4.3/§7).

use thiserror::Error;

/// Errors produced by [`crate::PendingRewardsStore`].
///
/// Load-time parse failures are intentionally *not* surfaced here: per
/// §9's Open Question resolution, a corrupt file is logged and treated as
/// an empty store rather than a fatal error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing the JSON file back to disk failed.
    #[error("failed to persist pending rewards: {0}")]
    Persist(#[source] std::io::Error),

    /// Serializing the in-memory map to JSON failed.
    #[error("failed to serialize pending rewards: {0}")]
    Serialize(#[from] serde_json::Error),
}
