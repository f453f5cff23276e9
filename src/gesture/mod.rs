//! Gesture subsystem: hand landmarks in, debounced control actions out.
//!
//! - `landmarks`: 21-point hand frames from the detector
//! - `classify`: finger count and thumb orientation per frame
//! - `debounce`: dwell-window state machine over finger counts
//! - `action`: priority mapping from accepted readings to actions
//! - `engine`: owns the debounce state and drives the above per frame
//!
//! Nothing here performs I/O.

pub mod action;
pub mod classify;
pub mod clock;
pub mod debounce;
pub mod engine;
pub mod landmarks;

pub use action::{ActionEvent, Keymap};
pub use clock::{Clock, ManualClock};
pub use engine::{EngineConfig, GestureEngine};
