//! Frame loop backends: wall-clock live input or timestamp replay.

pub mod stream;

use tracing::info;

use crate::gesture::{EngineConfig, GestureEngine, ManualClock};
use crate::sink::ActionSink;
use crate::source::LandmarkSource;

pub use stream::{StopReason, StreamConfig};

/// Where dwell timing comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClockMode {
    /// Wall clock at the time each sample is processed.
    System,
    /// Timestamps (`t`) carried by the samples.
    Replay,
}

impl ClockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Replay => "replay",
        }
    }
}

/// Run the gesture pipeline with the selected clock.
pub fn run(
    clock: ClockMode,
    engine_config: EngineConfig,
    source: Box<dyn LandmarkSource + Send>,
    sink: &mut dyn ActionSink,
    config: &StreamConfig,
) -> anyhow::Result<StopReason> {
    stream::install_signal_handlers();
    info!("clock: {}", clock.as_str());

    let samples = stream::spawn_reader(source)?;
    let shutdown = &stream::SHUTDOWN_REQUESTED;

    match clock {
        ClockMode::System => {
            let mut engine = GestureEngine::new(engine_config);
            info!("engine config: {}", engine.config_sexp());
            stream::run(&samples, &mut engine, sink, config, None, shutdown)
        }
        ClockMode::Replay => {
            let handle = ManualClock::new();
            let mut engine = GestureEngine::with_clock(engine_config, handle.clone());
            info!("engine config: {}", engine.config_sexp());
            stream::run(&samples, &mut engine, sink, config, Some(&handle), shutdown)
        }
    }
}
