//! Action sinks: where accepted actions go.
//!
//! Execution is fire-and-forget: a sink never reports back to the engine,
//! and failures are logged rather than stopping the frame loop.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use crate::gesture::{ActionEvent, Keymap};
use crate::ipc::sexp::{escape_string, format_event};

/// Push-based consumer of actions.
pub trait ActionSink {
    fn execute(&mut self, action: ActionEvent);
}

/// Writes one IPC event s-expression per action, flushed immediately.
pub struct SexpSink<W: Write> {
    out: W,
    keys: Keymap,
}

impl<W: Write> SexpSink<W> {
    pub fn new(out: W, keys: Keymap) -> Self {
        Self { out, keys }
    }
}

/// Event s-expression for one action.
pub fn action_event_sexp(action: ActionEvent, chord: &str) -> String {
    format_event(
        "gesture-action",
        &[
            ("action", &format!(":{}", action.as_str())),
            ("keys", &format!("\"{}\"", escape_string(chord))),
        ],
    )
}

impl<W: Write> ActionSink for SexpSink<W> {
    fn execute(&mut self, action: ActionEvent) {
        let line = action_event_sexp(action, self.keys.chord(action));
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!("failed to write action {}: {}", action.as_str(), e);
        }
    }
}

/// Dry run: logs actions and does nothing else.
#[derive(Debug, Default)]
pub struct LogSink {
    pub executed: u64,
}

impl ActionSink for LogSink {
    fn execute(&mut self, action: ActionEvent) {
        self.executed += 1;
        info!("action #{}: {} (dry run)", self.executed, action.as_str());
    }
}

/// Runs `<program> key <chord>` per action, e.g. `xdotool key shift+n`.
/// Children are not waited on; finished ones are reaped on the next action
/// and when the sink is dropped.
pub struct ExecSink {
    program: String,
    keys: Keymap,
    children: Vec<Child>,
}

impl ExecSink {
    pub fn new(program: impl Into<String>, keys: Keymap) -> Self {
        Self {
            program: program.into(),
            keys,
            children: Vec::new(),
        }
    }

    /// Command that would be spawned for `action`.
    pub fn command(&self, action: ActionEvent) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("key")
            .arg(self.keys.chord(action))
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        cmd
    }

    /// Collect exited children.  Returns how many are still running.
    pub fn reap(&mut self) -> usize {
        let program = &self.program;
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    warn!("{} (pid {}) exited with {}", program, child.id(), status);
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("failed to poll {} (pid {}): {}", program, child.id(), e);
                false
            }
        });
        self.children.len()
    }
}

impl ActionSink for ExecSink {
    fn execute(&mut self, action: ActionEvent) {
        let running = self.reap();
        if running > 0 {
            debug!("{} earlier {} process(es) still running", running, self.program);
        }
        match self.command(action).spawn() {
            Ok(child) => {
                info!(
                    "action: {} -> {} key {} (pid {})",
                    action.as_str(),
                    self.program,
                    self.keys.chord(action),
                    child.id()
                );
                self.children.push(child);
            }
            Err(e) => warn!(
                "failed to run {} for action {}: {}",
                self.program,
                action.as_str(),
                e
            ),
        }
    }
}

impl Drop for ExecSink {
    fn drop(&mut self) {
        let running = self.reap();
        if running > 0 {
            debug!("leaving {} {} process(es) running at exit", running, self.program);
        }
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Whether `pid` is an unreaped (zombie) child of this process.
#[cfg(all(test, target_os = "linux"))]
fn is_zombie_child(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
        return false;
    };
    // "pid (comm) state ppid ..."
    let rest = stat.rsplit_once(") ").map(|(_, r)| r).unwrap_or("");
    let mut fields = rest.split_whitespace();
    let me = std::process::id().to_string();
    fields.next() == Some("Z") && fields.next() == Some(me.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_event_sexp() {
        assert_eq!(
            action_event_sexp(ActionEvent::Next, "shift+n"),
            "(:type :event :event :gesture-action :action :next :keys \"shift+n\")"
        );
    }

    #[test]
    fn test_sexp_sink_writes_lines() {
        let mut keys = Keymap::default();
        keys.bind(ActionEvent::PlayPause, "k");
        let mut buf = Vec::new();
        let mut sink = SexpSink::new(&mut buf, keys);
        sink.execute(ActionEvent::PlayPause);
        sink.execute(ActionEvent::VolumeUp);

        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(":action :play-pause :keys \"k\""));
        assert!(lines[1].contains(":action :volume-up :keys \"Up\""));
    }

    #[test]
    fn test_sexp_sink_parses_back() {
        let mut buf = Vec::new();
        SexpSink::new(&mut buf, Keymap::default()).execute(ActionEvent::Back);
        let out = String::from_utf8(buf).unwrap();
        let value = lexpr::from_str(out.trim()).unwrap();
        assert_eq!(
            crate::ipc::sexp::get_keyword(&value, "action"),
            Some("back".to_string())
        );
        assert_eq!(
            crate::ipc::sexp::get_keyword(&value, "keys"),
            Some("alt+Left".to_string())
        );
    }

    #[test]
    fn test_log_sink_counts() {
        let mut sink = LogSink::default();
        sink.execute(ActionEvent::Next);
        sink.execute(ActionEvent::Previous);
        assert_eq!(sink.executed, 2);
    }

    #[test]
    fn test_exec_sink_command() {
        let sink = ExecSink::new("xdotool", Keymap::default());
        let cmd = sink.command(ActionEvent::Previous);
        assert_eq!(cmd.get_program(), "xdotool");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["key", "shift+p"]);
    }

    #[test]
    fn test_exec_sink_reaps_finished_children() {
        let mut sink = ExecSink::new("true", Keymap::default());
        for _ in 0..5 {
            sink.execute(ActionEvent::PlayPause);
        }
        assert!(sink.children.len() <= 5);

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while sink.reap() > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(sink.reap(), 0);
        assert!(sink.children.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_exec_sink_leaves_no_zombies() {
        let mut sink = ExecSink::new("true", Keymap::default());
        let mut pids = Vec::new();
        for _ in 0..5 {
            sink.execute(ActionEvent::Next);
            pids.push(sink.children.last().unwrap().id());
        }

        std::thread::sleep(std::time::Duration::from_millis(500));
        sink.execute(ActionEvent::Next);

        let zombies = pids.iter().filter(|pid| is_zombie_child(**pid)).count();
        assert_eq!(zombies, 0);
    }

    #[test]
    fn test_exec_sink_missing_program_does_not_panic() {
        let mut sink = ExecSink::new("/nonexistent/gesturectl-keys", Keymap::default());
        sink.execute(ActionEvent::Forward);
    }
}
