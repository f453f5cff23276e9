//! Dwell-based debouncing of finger-count changes.
//!
//! A change in finger count is only accepted once it has been observed for
//! longer than the dwell window.  The window is measured in clock time from
//! the first differing frame, not in frames, so gaps in detection neither
//! advance nor reset it.

use std::time::Duration;

use tracing::debug;

/// Default dwell window before a new count is accepted.
pub const DEFAULT_DWELL_MS: u64 = 200;

/// Debounce state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Current count matches the last dispatched one.
    Stable,
    /// A different count was seen; waiting out the dwell window.
    Pending { since: Duration },
}

/// Result of feeding one frame's finger count to the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// Count matches the last dispatched count.
    Unchanged,
    /// First differing frame; dwell timer started.
    PendingStarted,
    /// Still pending, dwell not yet elapsed.
    Waiting { elapsed: Duration },
    /// Count went back to the last dispatched count before the dwell elapsed.
    Reverted,
    /// Dwell elapsed; the caller dispatches the current reading.
    Accepted { elapsed: Duration },
}

/// Holds the last dispatched count and the pending timer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// Dwell window.  Elapsed time must strictly exceed it.
    pub dwell: Duration,
    state: DebounceState,
    last_dispatched: Option<u8>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DWELL_MS))
    }
}

impl Debouncer {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            state: DebounceState::Stable,
            last_dispatched: None,
        }
    }

    /// Start of the current pending window, if any.
    pub fn pending_since(&self) -> Option<Duration> {
        match self.state {
            DebounceState::Pending { since } => Some(since),
            DebounceState::Stable => None,
        }
    }

    /// Finger count of the last accepted change, `None` before the first.
    pub fn last_dispatched(&self) -> Option<u8> {
        self.last_dispatched
    }

    /// Feed the finger count of a frame with a detected hand.
    ///
    /// While pending, the count may wobble between values that all differ
    /// from the last dispatched one; the timer keeps its original start and
    /// whichever count is current when the window elapses is accepted.
    pub fn observe(&mut self, finger_count: u8, now: Duration) -> DebounceOutcome {
        let changed = self.last_dispatched != Some(finger_count);

        match (self.state, changed) {
            (DebounceState::Stable, false) => DebounceOutcome::Unchanged,
            (DebounceState::Stable, true) => {
                self.state = DebounceState::Pending { since: now };
                debug!(
                    "pending: {} -> {} at {:.3}s",
                    fmt_count(self.last_dispatched),
                    finger_count,
                    now.as_secs_f64()
                );
                DebounceOutcome::PendingStarted
            }
            (DebounceState::Pending { .. }, false) => {
                self.state = DebounceState::Stable;
                debug!("pending reverted to {}", finger_count);
                DebounceOutcome::Reverted
            }
            (DebounceState::Pending { since }, true) => {
                let elapsed = now.saturating_sub(since);
                if elapsed > self.dwell {
                    self.last_dispatched = Some(finger_count);
                    self.state = DebounceState::Stable;
                    DebounceOutcome::Accepted { elapsed }
                } else {
                    DebounceOutcome::Waiting { elapsed }
                }
            }
        }
    }
}

#[cfg(test)]
impl Debouncer {
    pub(crate) fn state(&self) -> DebounceState {
        self.state
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }
}

/// Format an optional count for logs and s-expressions.
pub fn fmt_count(count: Option<u8>) -> String {
    count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "nil".to_string())
}

// ── Tests ──────────────────────────────────────────────────
