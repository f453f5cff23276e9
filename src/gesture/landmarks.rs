//! Hand landmark data structures.
//!
//! Models the 21 keypoints per hand emitted by the landmark detector
//! (MediaPipe hand layout).  Coordinates are normalized to the image:
//! x grows to the right, y grows downward.

use anyhow::bail;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector order.  Classification reads only a
/// few of them; the rest keep the enum aligned with the detector layout.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// (base, tip) pairs for the four non-thumb fingers.
    pub fn finger_base_tip_pairs() -> [(HandLandmark, HandLandmark); 4] {
        [
            (Self::IndexMcp, Self::IndexTip),
            (Self::MiddleMcp, Self::MiddleTip),
            (Self::RingMcp, Self::RingTip),
            (Self::PinkyMcp, Self::PinkyTip),
        ]
    }
}

// ── Landmark point ─────────────────────────────────────────

/// A single landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the wrist.  Unused by classification.
    pub z: f32,
}

// ── Landmark frame ─────────────────────────────────────────

/// All 21 landmarks of one hand in one video frame.
///
/// The fixed-size array makes a partially populated frame unrepresentable;
/// detector output is checked once, at conversion time.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Landmark at a semantic position.
    pub fn get(&self, landmark: HandLandmark) -> &Landmark {
        &self.points[landmark.index()]
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkFrame {
    type Error = anyhow::Error;

    fn try_from(points: Vec<Landmark>) -> anyhow::Result<Self> {
        if points.len() != LANDMARK_COUNT {
            bail!(
                "expected {} hand landmarks, got {}",
                LANDMARK_COUNT,
                points.len()
            );
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        out.copy_from_slice(&points);
        Ok(Self { points: out })
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
impl Landmark {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

#[cfg(test)]
impl LandmarkFrame {
    /// Replace one landmark, for building synthetic frames.
    pub(crate) fn with(mut self, landmark: HandLandmark, x: f32, y: f32) -> Self {
        self.points[landmark.index()] = Landmark::new(x, y);
        self
    }
}

/// A relaxed open hand, fingers pointing up, thumb to the right of its joint.
///
/// Wrist at y=0.9 and middle base at y=0.6 give an adaptive threshold of 0.15.
/// Every finger tip sits 0.1 above its base, below that threshold, and the
/// thumb tip is level with its joint, so the frame classifies as 0 fingers
/// with a neutral thumb.
#[cfg(test)]
pub(crate) fn neutral_frame() -> LandmarkFrame {
    use HandLandmark::*;
    let mut points = [Landmark::default(); LANDMARK_COUNT];
    let mut set = |l: HandLandmark, x: f32, y: f32| points[l.index()] = Landmark::new(x, y);

    set(Wrist, 0.5, 0.9);
    set(ThumbCmc, 0.42, 0.85);
    set(ThumbMcp, 0.38, 0.78);
    set(ThumbIp, 0.35, 0.72);
    set(ThumbTip, 0.37, 0.72);
    for (i, (base, tip)) in HandLandmark::finger_base_tip_pairs().iter().enumerate() {
        let x = 0.42 + 0.06 * i as f32;
        set(*base, x, 0.6);
        set(*tip, x, 0.5);
    }
    set(IndexPip, 0.42, 0.57);
    set(IndexDip, 0.42, 0.53);
    set(MiddlePip, 0.48, 0.57);
    set(MiddleDip, 0.48, 0.53);
    set(RingPip, 0.54, 0.57);
    set(RingDip, 0.54, 0.53);
    set(PinkyPip, 0.60, 0.57);
    set(PinkyDip, 0.60, 0.53);
    LandmarkFrame { points }
}

/// `neutral_frame` with the first `fingers` non-thumb fingers extended
/// (tip 0.3 above base, over the 0.15 threshold).
#[cfg(test)]
pub(crate) fn frame_with_fingers(fingers: usize) -> LandmarkFrame {
    let mut frame = neutral_frame();
    for (base, tip) in HandLandmark::finger_base_tip_pairs().iter().take(fingers) {
        let b = *frame.get(*base);
        frame = frame.with(*tip, b.x, b.y - 0.3);
    }
    frame
}

// ── Tests ──────────────────────────────────────────────────
