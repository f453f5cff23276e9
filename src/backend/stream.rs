//! Frame loop: pull detector samples, run the engine, push actions.
//!
//! Samples are read on a dedicated thread and handed over a channel, so the
//! loop keeps polling the shutdown flag and the exit timer while the
//! detector is silent.  Runs until the landmark stream ends, SIGTERM/SIGINT
//! arrives, or the optional exit timer fires.  Engine status is logged
//! periodically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::gesture::{Clock, GestureEngine, ManualClock};
use crate::sink::ActionSink;
use crate::source::{DetectorSample, LandmarkSource};

/// Global flag set by SIGTERM/SIGINT handlers.
pub static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Samples buffered between the reader thread and the frame loop.
const READER_QUEUE: usize = 64;

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
pub fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Frame loop configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Stop after this much wall time.
    pub exit_after: Option<Duration>,
    /// Interval between status log lines.
    pub status_interval: Duration,
    /// Longest wait for a sample before the loop rechecks its stop conditions.
    pub poll_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            exit_after: None,
            status_interval: Duration::from_secs(60),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Why the frame loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Signal,
    ExitTimer,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndOfStream => "end of stream",
            Self::Signal => "signal",
            Self::ExitTimer => "exit timer",
        }
    }
}

/// Read samples on a background thread.  The channel disconnects at end of
/// stream; a read error is sent once and ends the thread.
pub fn spawn_reader(
    mut source: Box<dyn LandmarkSource + Send>,
) -> anyhow::Result<Receiver<anyhow::Result<DetectorSample>>> {
    let (tx, rx) = mpsc::sync_channel(READER_QUEUE);
    std::thread::Builder::new()
        .name("landmark-reader".into())
        .spawn(move || loop {
            match source.next_sample() {
                Ok(Some(sample)) => {
                    if tx.send(Ok(sample)).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        })
        .context("failed to spawn landmark reader thread")?;
    Ok(rx)
}

/// Drive the engine's clock from sample timestamps.  Samples without a
/// timestamp leave the clock where it is.
pub fn replay_timestamp(clock: &ManualClock, sample: &DetectorSample) -> anyhow::Result<()> {
    if let Some(t) = sample.timestamp_s {
        let t = Duration::try_from_secs_f64(t)
            .with_context(|| format!("invalid timestamp {}", t))?;
        clock.set(t);
    }
    Ok(())
}

/// Run the frame loop over samples from `spawn_reader`.  `replay` is given
/// the engine's clock handle when timing follows sample timestamps instead
/// of the wall clock.
pub fn run<C: Clock>(
    samples: &Receiver<anyhow::Result<DetectorSample>>,
    engine: &mut GestureEngine<C>,
    sink: &mut dyn ActionSink,
    config: &StreamConfig,
    replay: Option<&ManualClock>,
    shutdown: &AtomicBool,
) -> anyhow::Result<StopReason> {
    let start_time = Instant::now();
    let mut last_status_log = Instant::now();

    let reason = loop {
        // Check shutdown flag (set by signal handler)
        if shutdown.load(Ordering::SeqCst) {
            info!("shutdown signal received, exiting");
            break StopReason::Signal;
        }

        if let Some(dur) = config.exit_after {
            if start_time.elapsed() >= dur {
                info!("exit timer fired after {}s", dur.as_secs());
                break StopReason::ExitTimer;
            }
        }

        if last_status_log.elapsed() >= config.status_interval {
            info!("status: {}", engine.status_sexp());
            last_status_log = Instant::now();
        }

        let sample = match samples.recv_timeout(config.poll_interval) {
            Ok(Ok(sample)) => sample,
            Ok(Err(e)) => {
                warn!("landmark stream failed after {} frames", engine.stats().frames);
                return Err(e);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("landmark stream closed");
                break StopReason::EndOfStream;
            }
        };

        if let Some(clock) = replay {
            replay_timestamp(clock, &sample)?;
        }

        if let Some(dispatch) = engine.process(sample.hand.as_ref()) {
            match dispatch.action {
                Some(action) => sink.execute(action),
                None => debug!(
                    "{} fingers ({}) held {}ms, no action",
                    dispatch.reading.finger_count,
                    dispatch.category.as_str(),
                    dispatch.elapsed.as_millis()
                ),
            }
        }
    };

    info!(
        "frame loop stopped ({}): {}",
        reason.as_str(),
        engine.status_sexp()
    );
    Ok(reason)
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
struct VecSource {
    samples: std::collections::VecDeque<DetectorSample>,
}

#[cfg(test)]
impl LandmarkSource for VecSource {
    fn next_sample(&mut self) -> anyhow::Result<Option<DetectorSample>> {
        Ok(self.samples.pop_front())
    }
}

/// A detector that stays silent until `release` is dropped or signalled.
#[cfg(test)]
struct IdleSource {
    release: mpsc::Receiver<()>,
}

#[cfg(test)]
impl LandmarkSource for IdleSource {
    fn next_sample(&mut self) -> anyhow::Result<Option<DetectorSample>> {
        let _ = self.release.recv();
        Ok(None)
    }
}

#[cfg(test)]
#[derive(Default)]
struct RecordingSink {
    actions: Vec<crate::gesture::ActionEvent>,
}

#[cfg(test)]
impl ActionSink for RecordingSink {
    fn execute(&mut self, action: crate::gesture::ActionEvent) {
        self.actions.push(action);
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::frame_with_fingers;
    use crate::gesture::{ActionEvent, EngineConfig};
    use crate::source::JsonLinesSource;
    use std::io::Cursor;
    use std::sync::Arc;

    fn sample(t: f64, fingers: Option<usize>) -> DetectorSample {
        DetectorSample {
            timestamp_s: Some(t),
            hand: fingers.map(frame_with_fingers),
        }
    }

    fn replay_engine() -> (GestureEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let engine = GestureEngine::with_clock(EngineConfig::default(), clock.clone());
        (engine, clock)
    }

    /// Replay `samples` through a fresh engine, returning why the loop
    /// stopped, the engine and the recorded actions.
    fn replay(
        samples: Vec<DetectorSample>,
        config: &StreamConfig,
    ) -> (StopReason, GestureEngine<ManualClock>, Vec<ActionEvent>) {
        let (mut engine, clock) = replay_engine();
        let rx = spawn_reader(Box::new(VecSource {
            samples: samples.into(),
        }))
        .unwrap();
        let mut sink = RecordingSink::default();
        let shutdown = AtomicBool::new(false);
        let reason = run(&rx, &mut engine, &mut sink, config, Some(&clock), &shutdown).unwrap();
        (reason, engine, sink.actions)
    }

    #[test]
    fn test_replay_dispatches_on_timestamps() {
        let samples = (0..=6).map(|i| sample(i as f64 * 0.05, Some(1))).collect();
        let (reason, engine, actions) = replay(samples, &StreamConfig::default());

        assert_eq!(reason, StopReason::EndOfStream);
        assert_eq!(actions, vec![ActionEvent::PlayPause]);
        assert_eq!(engine.stats().frames, 7);
    }

    #[test]
    fn test_no_hand_samples_do_not_reach_sink() {
        let samples = vec![sample(0.0, Some(2)), sample(0.1, None), sample(0.3, Some(2))];
        let (_, engine, actions) = replay(samples, &StreamConfig::default());

        assert_eq!(actions, vec![ActionEvent::VolumeUp]);
        assert_eq!(engine.stats().no_hand_frames, 1);
    }

    #[test]
    fn test_unmapped_dispatch_not_sent() {
        let samples = vec![sample(0.0, Some(0)), sample(0.5, Some(0))];
        let (_, engine, actions) = replay(samples, &StreamConfig::default());

        assert!(actions.is_empty());
        assert_eq!(engine.stats().unmapped_dispatches, 1);
    }

    #[test]
    fn test_missing_timestamp_keeps_clock() {
        let clock = ManualClock::new();
        clock.set_millis(400);
        let s = DetectorSample {
            timestamp_s: None,
            hand: None,
        };
        replay_timestamp(&clock, &s).unwrap();
        assert_eq!(clock.now(), Duration::from_millis(400));
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        let clock = ManualClock::new();
        assert!(replay_timestamp(&clock, &sample(-1.0, None)).is_err());
    }

    #[test]
    fn test_exit_timer_stops_before_reading() {
        let config = StreamConfig {
            exit_after: Some(Duration::ZERO),
            ..StreamConfig::default()
        };
        let (reason, engine, _) = replay(vec![sample(0.0, Some(1))], &config);
        assert_eq!(reason, StopReason::ExitTimer);
        assert_eq!(engine.stats().frames, 0);
    }

    #[test]
    fn test_exit_timer_fires_while_detector_idle() {
        let (_release, release_rx) = mpsc::channel::<()>();
        let rx = spawn_reader(Box::new(IdleSource {
            release: release_rx,
        }))
        .unwrap();
        let (mut engine, clock) = replay_engine();
        let mut sink = RecordingSink::default();
        let config = StreamConfig {
            exit_after: Some(Duration::from_millis(150)),
            poll_interval: Duration::from_millis(20),
            ..StreamConfig::default()
        };
        let shutdown = AtomicBool::new(false);

        let started = Instant::now();
        let reason = run(&rx, &mut engine, &mut sink, &config, Some(&clock), &shutdown).unwrap();
        assert_eq!(reason, StopReason::ExitTimer);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(engine.stats().frames, 0);
    }

    #[test]
    fn test_shutdown_flag_stops_idle_loop() {
        let (_release, release_rx) = mpsc::channel::<()>();
        let rx = spawn_reader(Box::new(IdleSource {
            release: release_rx,
        }))
        .unwrap();
        let (mut engine, clock) = replay_engine();
        let mut sink = RecordingSink::default();
        let config = StreamConfig {
            exit_after: Some(Duration::from_secs(5)),
            poll_interval: Duration::from_millis(20),
            ..StreamConfig::default()
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        });

        let started = Instant::now();
        let reason = run(&rx, &mut engine, &mut sink, &config, Some(&clock), &shutdown).unwrap();
        assert_eq!(reason, StopReason::Signal);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_source_error_propagates() {
        let (mut engine, clock) = replay_engine();
        let input = "{\"t\":0.0,\"hands\":[{\"landmarks\":[]}]}\n";
        let rx = spawn_reader(Box::new(JsonLinesSource::new(Cursor::new(input)))).unwrap();
        let mut sink = RecordingSink::default();
        let shutdown = AtomicBool::new(false);
        let config = StreamConfig::default();

        let err = run(&rx, &mut engine, &mut sink, &config, Some(&clock), &shutdown).unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"), "{:#}", err);
    }
}
