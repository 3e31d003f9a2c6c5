//! Lock type aliases, kept separate so call sites don't couple to a
//! specific lock implementation.

/// A synchronous mutex.
pub type SyncMutex<T> = parking_lot::Mutex<T>;

/// An asynchronous mutex, held across an entire request/response cycle
/// where callers must not interleave (see `kubevote_rc::RcClient`).
pub type AsyncMutex<T> = tokio::sync::Mutex<T>;
