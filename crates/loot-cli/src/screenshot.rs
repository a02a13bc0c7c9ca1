//! Screenshots of the player's own globals.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::NaiveDateTime;
use loot_core::{Event, EventKind};
use rust_decimal::Decimal;

/// Receives own globals that should be captured.
///
/// Implementations must not block the caller and must not fail it: the tick
/// loop keeps going whatever happens to a capture.
pub trait ScreenshotTrigger: Send {
    fn capture(&self, delay: Duration, directory: &Path, global: &Event);
}

/// Does nothing. Used when screenshots are disabled or no command is set.
#[derive(Debug, Default)]
pub struct NoScreenshots;

impl ScreenshotTrigger for NoScreenshots {
    fn capture(&self, _delay: Duration, _directory: &Path, _global: &Event) {}
}

/// Runs a capture command on a background thread after a delay.
#[derive(Debug, Clone)]
pub struct BackgroundScreenshots {
    command: Vec<String>,
}

impl BackgroundScreenshots {
    pub const fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Starts the capture and returns the thread running it, or `None` if the
    /// event is not a global.
    pub fn spawn(&self, delay: Duration, directory: &Path, global: &Event) -> Option<JoinHandle<()>> {
        let EventKind::Global { subject, value, .. } = global.kind() else {
            return None;
        };
        let target = shot_path(directory, subject, *value, global.time());
        let command = self.command.clone();

        let spawned = std::thread::Builder::new()
            .name("screenshot".to_string())
            .spawn(move || {
                std::thread::sleep(delay);
                if let Err(e) = take_shot(&command, &target) {
                    tracing::warn!(path = %target.display(), error = %e, "screenshot failed");
                }
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "failed to start screenshot thread");
                None
            }
        }
    }
}

impl ScreenshotTrigger for BackgroundScreenshots {
    fn capture(&self, delay: Duration, directory: &Path, global: &Event) {
        let _ = self.spawn(delay, directory, global);
    }
}

/// `<dir>/<subject>_<value>_<timestamp>.png`, with path separators in the
/// subject replaced.
pub fn shot_path(directory: &Path, subject: &str, value: Decimal, time: NaiveDateTime) -> PathBuf {
    let subject: String = subject
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    directory.join(format!(
        "{subject}_{value}_{}.png",
        time.format("%Y-%m-%d_%H-%M-%S")
    ))
}

fn take_shot(command: &[String], target: &Path) -> anyhow::Result<()> {
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("no screenshot command configured");
    };
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let target_text = target.to_string_lossy();
    let mut cmd = Command::new(program);
    let mut placed = false;
    for arg in args {
        if arg.contains("{path}") {
            placed = true;
            cmd.arg(arg.replace("{path}", &target_text));
        } else {
            cmd.arg(arg);
        }
    }
    if !placed {
        cmd.arg(target);
    }

    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{program} exited with {status}");
    }
    tracing::info!(path = %target.display(), "saved screenshot");
    Ok(())
}
