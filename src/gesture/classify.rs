//! Per-frame gesture classification.
//!
//! Turns one `LandmarkFrame` into a `GestureReading`: how many fingers are
//! raised and which way the thumb points.  Stateless; the debouncer decides
//! what to do with the readings.

use super::landmarks::{HandLandmark, LandmarkFrame};

/// Default vertical deadband for thumb orientation, in normalized units.
pub const DEFAULT_THUMB_DEADBAND: f32 = 0.05;

// ── Thumb state ────────────────────────────────────────────

/// Thumb orientation from the deadband classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbState {
    Up,
    Down,
    Neutral,
}

impl ThumbState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Neutral => "neutral",
        }
    }
}

/// Raw thumb tip position relative to its joint, strict comparison, no deadband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbTilt {
    /// Tip is higher in the image than the joint.
    Above,
    /// Tip is lower in the image than the joint.
    Below,
    Level,
}

// ── Reading ────────────────────────────────────────────────

/// Classification of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureReading {
    /// Raised fingers, 0-5.
    pub finger_count: u8,
    pub thumb: ThumbState,
    pub thumb_tilt: ThumbTilt,
}

// ── Config ─────────────────────────────────────────────────

/// Classifier thresholds.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Minimum |tip.y - joint.y| for the thumb to count as up or down.
    pub thumb_deadband: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thumb_deadband: DEFAULT_THUMB_DEADBAND,
        }
    }
}

impl ClassifierConfig {
    /// Classify one frame.
    pub fn read(&self, frame: &LandmarkFrame) -> GestureReading {
        GestureReading {
            finger_count: count_fingers(frame),
            thumb: thumb_state(frame, self.thumb_deadband),
            thumb_tilt: thumb_tilt(frame),
        }
    }
}

// ── Classifiers ────────────────────────────────────────────

/// Count raised fingers (0-5).
///
/// A non-thumb finger is raised when its tip sits above its base by more
/// than half the wrist to middle-base distance, which scales with apparent
/// hand size.  The thumb is raised when its tip is left of its IP joint.
/// That rule assumes a mirrored view of a right hand and reads inverted for
/// the left hand; downstream mappings depend on it as is.
pub fn count_fingers(frame: &LandmarkFrame) -> u8 {
    let wrist = frame.get(HandLandmark::Wrist);
    let palm = frame.get(HandLandmark::MiddleMcp);
    let threshold = (wrist.y - palm.y) / 2.0;

    let mut count = HandLandmark::finger_base_tip_pairs()
        .iter()
        .filter(|(base, tip)| frame.get(*base).y - frame.get(*tip).y > threshold)
        .count() as u8;

    if frame.get(HandLandmark::ThumbTip).x < frame.get(HandLandmark::ThumbIp).x {
        count += 1;
    }
    count
}

/// Thumb orientation with a fixed deadband around level.
pub fn thumb_state(frame: &LandmarkFrame, deadband: f32) -> ThumbState {
    let d = frame.get(HandLandmark::ThumbTip).y - frame.get(HandLandmark::ThumbIp).y;
    if d < -deadband {
        ThumbState::Up
    } else if d > deadband {
        ThumbState::Down
    } else {
        ThumbState::Neutral
    }
}

fn thumb_tilt(frame: &LandmarkFrame) -> ThumbTilt {
    let tip = frame.get(HandLandmark::ThumbTip).y;
    let joint = frame.get(HandLandmark::ThumbIp).y;
    if tip < joint {
        ThumbTilt::Above
    } else if tip > joint {
        ThumbTilt::Below
    } else {
        ThumbTilt::Level
    }
}

// ── Tests ──────────────────────────────────────────────────
