//! Mapping from window clap counts to media-key actions.
//!
//! The count mapping is exact-match: one clap toggles play/pause, two
//! claps pause, any other count is logged and ignored.

use crate::config::AppConfig;
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use std::process::Command;

/// Media-control actions the dispatcher can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    TogglePlayPause,
    Pause,
}

impl MediaAction {
    pub fn label(self) -> &'static str {
        match self {
            MediaAction::TogglePlayPause => "toggle-play-pause",
            MediaAction::Pause => "pause",
        }
    }
}

/// Exact-match count policy: 1 → toggle, 2 → pause, everything else (zero
/// or three and up) → no action.
pub fn action_for_count(count: usize) -> Option<MediaAction> {
    match count {
        1 => Some(MediaAction::TogglePlayPause),
        2 => Some(MediaAction::Pause),
        _ => None,
    }
}

/// Where window actions go. Keeps the pipeline testable without real key
/// injection.
pub trait ActionSink {
    fn dispatch(&mut self, action: MediaAction) -> Result<()>;
}

/// Injects a keystroke into the desktop session via xdotool.
pub struct KeystrokeSink {
    command: String,
    toggle_key: String,
    pause_key: String,
}

impl KeystrokeSink {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            command: config.xdotool_cmd.clone(),
            toggle_key: config.toggle_key.clone(),
            pause_key: config.pause_key.clone(),
        }
    }

    fn key_for(&self, action: MediaAction) -> &str {
        match action {
            MediaAction::TogglePlayPause => &self.toggle_key,
            MediaAction::Pause => &self.pause_key,
        }
    }
}

impl ActionSink for KeystrokeSink {
    fn dispatch(&mut self, action: MediaAction) -> Result<()> {
        let key = self.key_for(action);
        let output = Command::new(&self.command)
            .arg("key")
            .arg(key)
            .output()
            .with_context(|| format!("failed to spawn {}", self.command))?;
        if !output.status.success() {
            return Err(anyhow!(
                "{} key {key} failed: {}",
                self.command,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        log_debug(&format!(
            "dispatched {} via {} key {key}",
            action.label(),
            self.command
        ));
        Ok(())
    }
}

/// Logs the action instead of touching the desktop.
pub struct DryRunSink;

impl ActionSink for DryRunSink {
    fn dispatch(&mut self, action: MediaAction) -> Result<()> {
        println!("[dry-run] {}", action.label());
        log_debug(&format!("dry-run action: {}", action.label()));
        Ok(())
    }
}
