//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::Parser;
use std::time::Duration;

pub use defaults::{
    DEFAULT_BAND_HIGH_HZ, DEFAULT_BAND_LOW_HZ, DEFAULT_BLOCK_SIZE, DEFAULT_CALIBRATE_AMBIENT_MS,
    DEFAULT_CALIBRATE_CLAP_MS, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CLAP_INTERVAL_MS,
    DEFAULT_IDLE_DELAY_MS, DEFAULT_RMS_THRESHOLD, DEFAULT_SAMPLE_RATE, DEFAULT_WINDOW_MS,
};

/// CLI options for the clapctl listener. Validated values keep the
/// key-injection subprocess safe.
#[derive(Debug, Parser, Clone)]
#[command(about = "clapctl: clap-controlled media keys", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Measure ambient and clap levels, suggest a threshold, then exit
    #[arg(long = "calibrate", default_value_t = false)]
    pub calibrate: bool,

    /// Ambient noise sample duration for calibration (milliseconds)
    #[arg(long = "calibrate-ambient-ms", default_value_t = DEFAULT_CALIBRATE_AMBIENT_MS)]
    pub calibrate_ambient_ms: u64,

    /// Clap sample duration for calibration (milliseconds)
    #[arg(long = "calibrate-clap-ms", default_value_t = DEFAULT_CALIBRATE_CLAP_MS)]
    pub calibrate_clap_ms: u64,

    /// Analysis sample rate (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Samples per analysis block
    #[arg(long = "block-size", default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// Listening window duration (milliseconds)
    #[arg(long = "window-ms", default_value_t = DEFAULT_WINDOW_MS)]
    pub window_ms: u64,

    /// RMS amplitude gate, linear full scale
    #[arg(long = "threshold", default_value_t = DEFAULT_RMS_THRESHOLD, allow_hyphen_values = true)]
    pub threshold: f32,

    /// Minimum spacing between accepted claps (milliseconds)
    #[arg(long = "clap-interval-ms", default_value_t = DEFAULT_CLAP_INTERVAL_MS)]
    pub clap_interval_ms: u64,

    /// Lower edge of the accepted dominant-frequency band (Hz)
    #[arg(long = "band-low-hz", default_value_t = DEFAULT_BAND_LOW_HZ)]
    pub band_low_hz: f32,

    /// Upper edge of the accepted dominant-frequency band (Hz)
    #[arg(long = "band-high-hz", default_value_t = DEFAULT_BAND_HIGH_HZ)]
    pub band_high_hz: f32,

    /// Block channel capacity between the capture callback and the pipeline
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Pause between listening windows (milliseconds)
    #[arg(long = "idle-delay-ms", default_value_t = DEFAULT_IDLE_DELAY_MS)]
    pub idle_delay_ms: u64,

    /// Run a single listening window and exit
    #[arg(long = "once", default_value_t = false)]
    pub once: bool,

    /// Log actions instead of injecting keystrokes
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Key-injection binary
    #[arg(long = "xdotool-cmd", env = "CLAPCTL_XDOTOOL", default_value = "xdotool")]
    pub xdotool_cmd: String,

    /// Key sent for the play/pause toggle action (one clap)
    #[arg(long = "toggle-key", default_value = "k")]
    pub toggle_key: String,

    /// Key sent for the pause action (two claps)
    #[arg(long = "pause-key", default_value = "space")]
    pub pause_key: String,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "CLAPCTL_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "CLAPCTL_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}

/// Tunable parameters for the detection pipeline.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub sample_rate: u32,
    pub block_size: usize,
    pub window_ms: u64,
    pub threshold: f32,
    pub clap_interval_ms: u64,
    pub band_low_hz: f32,
    pub band_high_hz: f32,
    pub channel_capacity: usize,
}

impl DetectorConfig {
    /// Debounce spacing in the timestamp clock domain (seconds).
    pub fn min_interval_secs(&self) -> f64 {
        self.clap_interval_ms as f64 / 1000.0
    }

    /// Wall-clock length of one analysis block.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / f64::from(self.sample_rate.max(1)))
    }
}
