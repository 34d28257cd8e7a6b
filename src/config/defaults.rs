//! Default values and hard limits for the CLI options.

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const DEFAULT_BLOCK_SIZE: usize = 2_048;
pub const DEFAULT_WINDOW_MS: u64 = 10_000;
pub const DEFAULT_RMS_THRESHOLD: f32 = 0.01;
pub const DEFAULT_CLAP_INTERVAL_MS: u64 = 500;
pub const DEFAULT_BAND_LOW_HZ: f32 = 500.0;
pub const DEFAULT_BAND_HIGH_HZ: f32 = 4_000.0;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const DEFAULT_IDLE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_CALIBRATE_AMBIENT_MS: u64 = 2_000;
pub const DEFAULT_CALIBRATE_CLAP_MS: u64 = 3_000;

pub(super) const MAX_WINDOW_MS: u64 = 600_000;
pub(super) const MAX_CLAP_INTERVAL_MS: u64 = 10_000;
pub(super) const MAX_IDLE_DELAY_MS: u64 = 60_000;
pub(super) const MIN_CALIBRATE_SAMPLE_MS: u64 = 500;
pub(super) const MAX_CALIBRATE_SAMPLE_MS: u64 = 60_000;
pub(super) const MAX_KEY_NAME_LEN: usize = 32;
