use super::defaults::{
    MAX_CALIBRATE_SAMPLE_MS, MAX_CLAP_INTERVAL_MS, MAX_IDLE_DELAY_MS, MAX_KEY_NAME_LEN,
    MAX_WINDOW_MS, MIN_CALIBRATE_SAMPLE_MS,
};
use super::{AppConfig, DetectorConfig};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::{fs, path::Path};

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the key-injection binary path.
    pub fn validate(&mut self) -> Result<()> {
        if !(8_000..=192_000).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between 8000 and 192000 Hz, got {}",
                self.sample_rate
            );
        }
        if !(256..=16_384).contains(&self.block_size) {
            bail!(
                "--block-size must be between 256 and 16384 samples, got {}",
                self.block_size
            );
        }
        if self.window_ms == 0 || self.window_ms > MAX_WINDOW_MS {
            bail!(
                "--window-ms must be between 1 and {MAX_WINDOW_MS}, got {}",
                self.window_ms
            );
        }
        // One block must fit inside the window, or no block ever completes.
        if (self.block_size as u64).saturating_mul(1_000)
            > self.window_ms.saturating_mul(u64::from(self.sample_rate))
        {
            bail!(
                "--block-size {} is longer than --window-ms {} at {} Hz",
                self.block_size,
                self.window_ms,
                self.sample_rate
            );
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            bail!(
                "--threshold must be between 0.0 and 1.0 (linear full scale), got {}",
                self.threshold
            );
        }
        if self.clap_interval_ms == 0 || self.clap_interval_ms > MAX_CLAP_INTERVAL_MS {
            bail!(
                "--clap-interval-ms must be between 1 and {MAX_CLAP_INTERVAL_MS}, got {}",
                self.clap_interval_ms
            );
        }
        if !self.band_low_hz.is_finite() || self.band_low_hz < 0.0 {
            bail!("--band-low-hz must be a non-negative frequency");
        }
        if !self.band_high_hz.is_finite() || self.band_high_hz <= self.band_low_hz {
            bail!(
                "--band-high-hz ({}) must exceed --band-low-hz ({})",
                self.band_high_hz,
                self.band_low_hz
            );
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if self.band_high_hz > nyquist {
            bail!(
                "--band-high-hz ({}) exceeds the Nyquist limit ({nyquist} Hz at {} Hz)",
                self.band_high_hz,
                self.sample_rate
            );
        }
        if !(8..=1_024).contains(&self.channel_capacity) {
            bail!(
                "--channel-capacity must be between 8 and 1024, got {}",
                self.channel_capacity
            );
        }
        if self.idle_delay_ms > MAX_IDLE_DELAY_MS {
            bail!(
                "--idle-delay-ms must be at most {MAX_IDLE_DELAY_MS}, got {}",
                self.idle_delay_ms
            );
        }
        for (flag, value) in [
            ("--calibrate-ambient-ms", self.calibrate_ambient_ms),
            ("--calibrate-clap-ms", self.calibrate_clap_ms),
        ] {
            if !(MIN_CALIBRATE_SAMPLE_MS..=MAX_CALIBRATE_SAMPLE_MS).contains(&value) {
                bail!(
                    "{flag} must be between {MIN_CALIBRATE_SAMPLE_MS} and {MAX_CALIBRATE_SAMPLE_MS} ms, got {value}"
                );
            }
        }

        self.xdotool_cmd = sanitize_binary(&self.xdotool_cmd, "--xdotool-cmd", &["xdotool"])?;
        validate_key_name(&self.toggle_key, "--toggle-key")?;
        validate_key_name(&self.pause_key, "--pause-key")?;

        Ok(())
    }

    /// Snapshot the CLI-controlled pipeline settings for downstream consumers.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            window_ms: self.window_ms,
            threshold: self.threshold,
            clap_interval_ms: self.clap_interval_ms,
            band_low_hz: self.band_low_hz,
            band_high_hz: self.band_high_hz,
            channel_capacity: self.channel_capacity,
        }
    }
}

/// Key names are passed straight to the injection tool, so keep them simple.
pub(super) fn validate_key_name(value: &str, flag: &str) -> Result<()> {
    if value.is_empty() || value.len() > MAX_KEY_NAME_LEN {
        bail!("{flag} must be 1..={MAX_KEY_NAME_LEN} characters");
    }
    if !value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '_' | '-'))
    {
        bail!("{flag} may only contain ASCII letters, digits, '+', '_' or '-', got '{value}'");
    }
    Ok(())
}

/// Allow either a known binary name or an existing executable path.
pub(super) fn sanitize_binary(value: &str, flag: &str, allowlist: &[&str]) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{flag} cannot be empty");
    }
    if let Some(allowed) = allowlist
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(trimmed))
    {
        return Ok((*allowed).to_string());
    }

    let path = Path::new(trimmed);
    if path.is_absolute() || trimmed.contains(std::path::MAIN_SEPARATOR) {
        let canonical = path
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {flag} '{trimmed}'"))?;
        let metadata = fs::metadata(&canonical)
            .with_context(|| format!("failed to inspect {flag} '{}'", canonical.display()))?;
        if !metadata.is_file() {
            bail!("{flag} '{}' is not a file", canonical.display());
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode();
            if mode & 0o111 == 0 {
                bail!(
                    "{flag} '{}' exists but is not executable (mode {:o})",
                    canonical.display(),
                    mode
                );
            }
        }
        return canonical
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("{flag} must be valid UTF-8"));
    }

    bail!("{flag} must be one of {allowlist:?} or an existing binary path");
}
