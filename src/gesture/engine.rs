//! Gesture engine: per-frame classification, debounce and action selection.
//!
//! Owns the only mutable state of the pipeline (the debouncer) and is driven
//! by `&mut` from a single frame loop.

use std::time::Duration;

use tracing::{debug, info};

use super::action::{select_action, ActionEvent, GestureCategory};
use super::classify::{ClassifierConfig, GestureReading};
use super::clock::{Clock, SystemClock};
use super::debounce::{fmt_count, DebounceOutcome, Debouncer, DEFAULT_DWELL_MS};
use super::landmarks::LandmarkFrame;

// ── Config ─────────────────────────────────────────────────

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enable gesture processing.
    pub enabled: bool,
    /// Time (ms) a new finger count must persist before it is accepted.
    pub dwell_ms: u64,
    pub classifier: ClassifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dwell_ms: DEFAULT_DWELL_MS,
            classifier: ClassifierConfig::default(),
        }
    }
}

// ── Output ─────────────────────────────────────────────────

/// An accepted gesture transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub reading: GestureReading,
    pub category: GestureCategory,
    /// `None` when the accepted gesture maps to no action.
    pub action: Option<ActionEvent>,
    /// Time since the change was first seen.
    pub elapsed: Duration,
}

/// Counters for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames: u64,
    pub no_hand_frames: u64,
    pub pending_started: u64,
    pub reverted: u64,
    pub dispatches: u64,
    pub unmapped_dispatches: u64,
}

// ── Engine ─────────────────────────────────────────────────

pub struct GestureEngine<C: Clock = SystemClock> {
    pub config: EngineConfig,
    clock: C,
    debouncer: Debouncer,
    stats: EngineStats,
    last_reading: Option<GestureReading>,
}

impl GestureEngine<SystemClock> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> GestureEngine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Self {
        let debouncer = Debouncer::new(Duration::from_millis(config.dwell_ms));
        Self {
            config,
            clock,
            debouncer,
            stats: EngineStats::default(),
            last_reading: None,
        }
    }

    /// Process one frame.  `None` means the detector found no hand; the
    /// debouncer is left untouched so a pending change keeps its start time.
    pub fn process(&mut self, frame: Option<&LandmarkFrame>) -> Option<Dispatch> {
        if !self.config.enabled {
            return None;
        }

        self.stats.frames += 1;
        let Some(frame) = frame else {
            self.stats.no_hand_frames += 1;
            return None;
        };

        let reading = self.config.classifier.read(frame);
        debug!(
            "fingers {}, thumb {}",
            reading.finger_count,
            reading.thumb.as_str()
        );
        self.last_reading = Some(reading);

        let now = self.clock.now();
        match self.debouncer.observe(reading.finger_count, now) {
            DebounceOutcome::PendingStarted => {
                self.stats.pending_started += 1;
                None
            }
            DebounceOutcome::Reverted => {
                self.stats.reverted += 1;
                None
            }
            DebounceOutcome::Unchanged | DebounceOutcome::Waiting { .. } => None,
            DebounceOutcome::Accepted { elapsed } => {
                let category = GestureCategory::of(&reading);
                let action = select_action(&reading);
                self.stats.dispatches += 1;
                match action {
                    Some(a) => info!(
                        "gesture accepted: {} fingers, thumb {} -> {} ({:.0}ms)",
                        reading.finger_count,
                        reading.thumb.as_str(),
                        a.as_str(),
                        elapsed.as_secs_f64() * 1000.0
                    ),
                    None => self.stats.unmapped_dispatches += 1,
                }
                Some(Dispatch {
                    reading,
                    category,
                    action,
                    elapsed,
                })
            }
        }
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        let (fingers, thumb) = match &self.last_reading {
            Some(r) => (r.finger_count.to_string(), format!(":{}", r.thumb.as_str())),
            None => ("nil".to_string(), "nil".to_string()),
        };
        let pending_ms = match self.debouncer.pending_since() {
            Some(since) => format!(
                "{:.0}",
                self.clock.now().saturating_sub(since).as_secs_f64() * 1000.0
            ),
            None => "nil".to_string(),
        };
        format!(
            concat!(
                "(:enabled {} :fingers {} :thumb {} :last-dispatched {} :pending-ms {}",
                " :frames {} :no-hand {} :pending {} :reverted {} :dispatches {} :unmapped {})"
            ),
            if self.config.enabled { "t" } else { "nil" },
            fingers,
            thumb,
            fmt_count(self.debouncer.last_dispatched()),
            pending_ms,
            self.stats.frames,
            self.stats.no_hand_frames,
            self.stats.pending_started,
            self.stats.reverted,
            self.stats.dispatches,
            self.stats.unmapped_dispatches,
        )
    }

    /// Generate s-expression for IPC config.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:enabled {} :dwell-ms {} :thumb-deadband {:.3})",
            if self.config.enabled { "t" } else { "nil" },
            self.config.dwell_ms,
            self.config.classifier.thumb_deadband,
        )
    }
}

#[cfg(test)]
impl<C: Clock> GestureEngine<C> {
    pub(crate) fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }
}

// ── Tests ──────────────────────────────────────────────────
