//! gesturectl - hand-gesture media controller.
//!
//! Reads hand landmarks from a detector stream, classifies finger count and
//! thumb orientation, debounces changes and emits control actions.

mod backend;
mod config;
mod gesture;
mod ipc;
mod sink;
mod source;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use backend::{ClockMode, StreamConfig};
use config::Config;
use sink::{ActionSink, ExecSink, LogSink, SexpSink};
use source::{JsonLinesSource, LandmarkSource};

/// Action output selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum SinkKind {
    /// IPC event s-expressions on stdout
    Sexp,
    /// Log actions only (dry run)
    Log,
    /// Run `<exec-program> key <chord>` per action
    Exec,
}

#[derive(Parser, Debug)]
#[command(name = "gesturectl", about = "Hand-gesture media controller")]
struct Cli {
    /// Landmark stream, one JSON object per line (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Where accepted actions go
    #[arg(long, value_enum, default_value = "sexp")]
    sink: SinkKind,

    /// Key injection program for the exec sink
    #[arg(long, default_value = "xdotool")]
    exec_program: String,

    /// Dwell timing source
    #[arg(long, value_enum, default_value = "system")]
    clock: ClockMode,

    /// S-expression config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the dwell window (ms)
    #[arg(long)]
    dwell_ms: Option<u64>,

    /// Override the thumb up/down deadband (normalized units)
    #[arg(long)]
    thumb_deadband: Option<f32>,

    /// Exit after N seconds
    #[arg(long)]
    exit_after: Option<u64>,

    /// Seconds between status log lines
    #[arg(long, default_value_t = 60)]
    status_interval: u64,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(ms) = self.dwell_ms {
            config.engine.dwell_ms = ms;
        }
        if let Some(deadband) = self.thumb_deadband {
            if deadband.is_nan() || deadband < 0.0 {
                bail!("--thumb-deadband must be a non-negative number");
            }
            config.engine.classifier.thumb_deadband = deadband;
        }
        Ok(config)
    }

    fn open_source(&self) -> anyhow::Result<Box<dyn LandmarkSource + Send>> {
        match &self.input {
            Some(path) => {
                let file = File::open(path).with_context(|| {
                    format!("failed to open landmark stream {}", path.display())
                })?;
                info!("input: {}", path.display());
                Ok(Box::new(JsonLinesSource::new(BufReader::new(file))))
            }
            None => {
                info!("input: stdin");
                Ok(Box::new(JsonLinesSource::new(BufReader::new(std::io::stdin()))))
            }
        }
    }

    fn build_sink(&self, config: &Config) -> Box<dyn ActionSink> {
        info!("keys: {}", config.keys.to_sexp());
        match self.sink {
            SinkKind::Sexp => Box::new(SexpSink::new(std::io::stdout(), config.keys.clone())),
            SinkKind::Log => Box::new(LogSink::default()),
            SinkKind::Exec => {
                Box::new(ExecSink::new(self.exec_program.clone(), config.keys.clone()))
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("gesturectl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout carries the sexp sink.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesturectl=info".into()),
        )
        .init();

    info!("gesturectl v{} starting", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;
    let source = cli.open_source()?;
    let mut sink = cli.build_sink(&config);
    let stream_config = StreamConfig {
        exit_after: cli.exit_after.map(Duration::from_secs),
        status_interval: Duration::from_secs(cli.status_interval.max(1)),
        ..StreamConfig::default()
    };

    let reason = backend::run(
        cli.clock,
        config.engine,
        source,
        sink.as_mut(),
        &stream_config,
    )?;
    info!("gesturectl exiting ({})", reason.as_str());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["gesturectl"]);
        assert_eq!(cli.sink, SinkKind::Sexp);
        assert_eq!(cli.clock, ClockMode::System);
        assert_eq!(cli.exec_program, "xdotool");
        assert_eq!(cli.status_interval, 60);
        let config = cli.load_config().unwrap();
        assert_eq!(config.engine.dwell_ms, 200);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "gesturectl",
            "--sink",
            "log",
            "--clock",
            "replay",
            "--dwell-ms",
            "300",
            "--thumb-deadband",
            "0.1",
        ]);
        assert_eq!(cli.sink, SinkKind::Log);
        assert_eq!(cli.clock, ClockMode::Replay);
        let config = cli.load_config().unwrap();
        assert_eq!(config.engine.dwell_ms, 300);
        assert!((config.engine.classifier.thumb_deadband - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_cli_rejects_negative_deadband() {
        let cli = Cli::parse_from(["gesturectl", "--thumb-deadband=-0.5"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn test_missing_input_file() {
        let cli = Cli::parse_from(["gesturectl", "--input", "/nonexistent/landmarks.jsonl"]);
        let err = cli.open_source().err().unwrap();
        assert!(err.to_string().contains("failed to open landmark stream"));
    }
}
