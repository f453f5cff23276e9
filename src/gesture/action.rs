//! Gesture-to-action mapping.
//!
//! An accepted reading is first sorted into a `GestureCategory`, in fixed
//! priority order, then the category picks at most one `ActionEvent`.

use std::collections::HashMap;

use super::classify::{GestureReading, ThumbState, ThumbTilt};

// ── Actions ────────────────────────────────────────────────

/// Discrete control actions handed to the action sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionEvent {
    Next,
    Previous,
    Back,
    Forward,
    VolumeDown,
    VolumeUp,
    PlayPause,
}

impl ActionEvent {
    pub const ALL: [ActionEvent; 7] = [
        Self::Next,
        Self::Previous,
        Self::Back,
        Self::Forward,
        Self::VolumeDown,
        Self::VolumeUp,
        Self::PlayPause,
    ];

    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Back => "back",
            Self::Forward => "forward",
            Self::VolumeDown => "volume-down",
            Self::VolumeUp => "volume-up",
            Self::PlayPause => "play-pause",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == s)
    }

    /// Default key chord, in xdotool key syntax.
    pub fn default_chord(&self) -> &'static str {
        match self {
            Self::Next => "shift+n",
            Self::Previous => "shift+p",
            Self::Back => "alt+Left",
            Self::Forward => "Right",
            Self::VolumeDown => "Down",
            Self::VolumeUp => "Up",
            Self::PlayPause => "space",
        }
    }
}

// ── Categories ─────────────────────────────────────────────

/// Closed set of gesture shapes, listed in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureCategory {
    ThumbUp,
    ThumbDown,
    Fingers(u8),
    /// Closed fist with the thumb tip above its joint, no deadband.
    FistThumbAbove,
    /// Closed fist with the thumb tip below its joint, no deadband.
    FistThumbBelow,
    Unmapped,
}

impl GestureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThumbUp => "thumb-up",
            Self::ThumbDown => "thumb-down",
            Self::Fingers(_) => "fingers",
            Self::FistThumbAbove => "fist-thumb-above",
            Self::FistThumbBelow => "fist-thumb-below",
            Self::Unmapped => "unmapped",
        }
    }

    /// Classify a reading.  Thumb orientation wins over finger count even
    /// when both apply.  The fist cases use the raw thumb tilt rather than
    /// the deadband classifier.
    pub fn of(reading: &GestureReading) -> Self {
        match (reading.thumb, reading.finger_count, reading.thumb_tilt) {
            (ThumbState::Up, _, _) => Self::ThumbUp,
            (ThumbState::Down, _, _) => Self::ThumbDown,
            (_, n @ 1..=5, _) => Self::Fingers(n),
            (_, 0, ThumbTilt::Above) => Self::FistThumbAbove,
            (_, 0, ThumbTilt::Below) => Self::FistThumbBelow,
            _ => Self::Unmapped,
        }
    }

    pub fn action(&self) -> Option<ActionEvent> {
        match self {
            Self::ThumbUp | Self::FistThumbAbove => Some(ActionEvent::Next),
            Self::ThumbDown | Self::FistThumbBelow => Some(ActionEvent::Previous),
            Self::Fingers(5) => Some(ActionEvent::Back),
            Self::Fingers(4) => Some(ActionEvent::Forward),
            Self::Fingers(3) => Some(ActionEvent::VolumeDown),
            Self::Fingers(2) => Some(ActionEvent::VolumeUp),
            Self::Fingers(1) => Some(ActionEvent::PlayPause),
            Self::Fingers(_) | Self::Unmapped => None,
        }
    }
}

/// Pick the action for an accepted reading.
pub fn select_action(reading: &GestureReading) -> Option<ActionEvent> {
    GestureCategory::of(reading).action()
}

// ── Key chords ─────────────────────────────────────────────

/// Action to key chord table used by key-injecting sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    chords: HashMap<ActionEvent, String>,
}

impl Default for Keymap {
    fn default() -> Self {
        let chords = ActionEvent::ALL
            .iter()
            .map(|a| (*a, a.default_chord().to_string()))
            .collect();
        Self { chords }
    }
}

impl Keymap {
    pub fn chord(&self, action: ActionEvent) -> &str {
        self.chords
            .get(&action)
            .map(String::as_str)
            .unwrap_or_else(|| action.default_chord())
    }

    pub fn bind(&mut self, action: ActionEvent, chord: &str) {
        self.chords.insert(action, chord.to_string());
    }

    /// Generate s-expression plist of all bindings, in action order.
    pub fn to_sexp(&self) -> String {
        let body: Vec<String> = ActionEvent::ALL
            .iter()
            .map(|a| format!(":{} \"{}\"", a.as_str(), self.chord(*a)))
            .collect();
        format!("({})", body.join(" "))
    }
}

// ── Tests ──────────────────────────────────────────────────
