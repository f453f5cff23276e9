//! Landmark input from an external hand detector.
//!
//! The detector (e.g. a MediaPipe wrapper) writes one JSON object per
//! processed video frame:
//!
//! ```json
//! {"t": 1.25,
//!  "hands": [{"landmarks": [{"x": 0.5, "y": 0.9, "z": 0.0}, ...],
//!             "handedness": "Right", "score": 0.93}]}
//! ```
//!
//! An empty or missing `hands` array means no hand in that frame.  Only the
//! first hand is used; `handedness` and `score` are accepted and ignored.

use std::io::BufRead;

use anyhow::Context;
use serde::Deserialize;

use crate::gesture::landmarks::{Landmark, LandmarkFrame};

/// One processed video frame from the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSample {
    /// Capture timestamp in seconds, if the detector supplies one.
    pub timestamp_s: Option<f64>,
    /// First detected hand, `None` when no hand was found.
    pub hand: Option<LandmarkFrame>,
}

/// Pull-based supplier of detector samples.
pub trait LandmarkSource {
    /// Next sample, or `Ok(None)` at end of stream.
    fn next_sample(&mut self) -> anyhow::Result<Option<DetectorSample>>;
}

#[derive(Deserialize)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize)]
struct HandJson {
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize)]
struct FrameJson {
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    hands: Vec<HandJson>,
}

/// Parse one JSON line into a sample.  A hand without exactly 21
/// landmarks is an error.
pub fn parse_sample(line: &str) -> anyhow::Result<DetectorSample> {
    let frame: FrameJson = serde_json::from_str(line).context("invalid landmark JSON")?;
    let hand = match frame.hands.into_iter().next() {
        Some(hand) => {
            let points: Vec<Landmark> = hand
                .landmarks
                .into_iter()
                .map(|l| Landmark { x: l.x, y: l.y, z: l.z })
                .collect();
            Some(LandmarkFrame::try_from(points)?)
        }
        None => None,
    };
    Ok(DetectorSample {
        timestamp_s: frame.t,
        hand,
    })
}

/// Reads JSON lines from any buffered reader (stdin, file, pipe).
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_no: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_sample(&mut self) -> anyhow::Result<Option<DetectorSample>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .context("failed to read landmark stream")?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let sample = parse_sample(trimmed)
                .with_context(|| format!("landmark stream line {}", self.line_no))?;
            return Ok(Some(sample));
        }
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
fn hand_json(count: usize) -> String {
    let points: Vec<String> = (0..count)
        .map(|i| format!("{{\"x\":{:.2},\"y\":0.5,\"z\":0.0}}", i as f32 * 0.01))
        .collect();
    format!("{{\"landmarks\":[{}],\"handedness\":\"Right\",\"score\":0.9}}", points.join(","))
}

// ── Tests ──────────────────────────────────────────────────
