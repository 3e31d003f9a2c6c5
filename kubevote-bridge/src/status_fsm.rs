//! The status FSM, debounced with a consecutive-failure threshold and a
//! notification cooldown (spec §4.6, §9).

use std::time::{Duration, Instant};

/// Consecutive `getstats` failures required to declare the server offline.
pub const OFFLINE_THRESHOLD: u32 = 3;
/// Minimum time between two notifications in the same direction.
pub const STATUS_COOLDOWN: Duration = Duration::from_secs(30);

/// The two observable server states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// `getstats` has been failing for at least [`OFFLINE_THRESHOLD`] ticks.
    Offline,
    /// `getstats` is succeeding.
    Online,
}

/// A notification the caller should emit as a side effect of a
/// transition, subject to the cooldown already having been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusNotification {
    /// The server just came back online.
    Online,
    /// The server just went offline (or is restarting).
    Restarting,
}

/// The bridge's status state machine (spec §4.6).
///
/// Mutated only from the stats-poller task; other readers see eventually
/// consistent state (spec §5).
pub struct StatusFsm {
    state: ServerState,
    consecutive_fail: u32,
    last_online_notify: Option<Instant>,
    last_restarting_notify: Option<Instant>,
}

impl Default for StatusFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusFsm {
    /// Starts in the `Offline` state, per spec §8's testable property.
    pub fn new() -> Self {
        Self {
            state: ServerState::Offline,
            consecutive_fail: 0,
            last_online_notify: None,
            last_restarting_notify: None,
        }
    }

    /// The current state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Applies the result of one stats-poller tick, returning a
    /// notification to emit if this tick caused a debounced transition.
    pub fn on_tick(&mut self, stats_ok: bool, now: Instant) -> Option<StatusNotification> {
        if stats_ok {
            self.consecutive_fail = 0;

            if self.state == ServerState::Offline {
                self.state = ServerState::Online;
                return self.notify_if_due(StatusNotification::Online, now);
            }
            None
        } else {
            self.consecutive_fail += 1;

            if self.state == ServerState::Online && self.consecutive_fail >= OFFLINE_THRESHOLD {
                self.state = ServerState::Offline;
                return self.notify_if_due(StatusNotification::Restarting, now);
            }
            None
        }
    }

    fn notify_if_due(&mut self, notification: StatusNotification, now: Instant) -> Option<StatusNotification> {
        let last_notify = match notification {
            StatusNotification::Online => &mut self.last_online_notify,
            StatusNotification::Restarting => &mut self.last_restarting_notify,
        };

        let due = match last_notify {
            Some(last) => now.saturating_duration_since(*last) >= STATUS_COOLDOWN,
            None => true,
        };

        if due {
            *last_notify = Some(now);
            Some(notification)
        } else {
            None
        }
    }
}
