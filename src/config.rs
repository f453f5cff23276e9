//! Runtime configuration.
//!
//! Defaults come from the component configs; an optional s-expression file
//! overrides them, and command-line flags override the file.
//!
//! ```lisp
//! (:enabled t
//!  :dwell-ms 250
//!  :thumb-deadband 0.05
//!  :keys (:next "shift+n" :play-pause "k"))
//! ```

use std::path::Path;

use anyhow::{bail, Context};
use lexpr::Value;
use tracing::debug;

use crate::gesture::{ActionEvent, EngineConfig, Keymap};
use crate::ipc::sexp::{get_bool, get_float, get_uint, get_value, plist_pairs, scalar_string};

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub engine: EngineConfig,
    pub keys: Keymap,
}

impl Config {
    /// Load defaults overridden by the file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::default();
        config
            .apply_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply an s-expression plist on top of the current values.
    pub fn apply_str(&mut self, raw: &str) -> anyhow::Result<()> {
        let value = lexpr::from_str(raw).context("malformed s-expression")?;
        self.apply(&value)
    }

    fn apply(&mut self, value: &Value) -> anyhow::Result<()> {
        if !matches!(value, Value::Cons(_) | Value::Null | Value::Nil) {
            bail!("config must be a plist, got {}", value);
        }

        if let Some(enabled) = get_bool(value, "enabled") {
            self.engine.enabled = enabled;
        }
        if get_value(value, "dwell-ms").is_some() {
            match get_uint(value, "dwell-ms") {
                Some(ms) => self.engine.dwell_ms = ms,
                None => bail!(":dwell-ms must be a non-negative integer"),
            }
        }
        if get_value(value, "thumb-deadband").is_some() {
            match get_float(value, "thumb-deadband") {
                Some(d) if d >= 0.0 => self.engine.classifier.thumb_deadband = d as f32,
                _ => bail!(":thumb-deadband must be a non-negative number"),
            }
        }
        if let Some(keys) = get_value(value, "keys") {
            for (name, chord) in plist_pairs(keys) {
                let Some(action) = ActionEvent::from_str(name) else {
                    bail!("unknown action :{} in :keys", name);
                };
                let chord = scalar_string(chord);
                if chord.is_empty() || chord == "nil" {
                    bail!("empty key chord for :{}", name);
                }
                self.keys.bind(action, &chord);
            }
        }
        Ok(())
    }
}
