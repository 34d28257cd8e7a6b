//! Level conversion helpers for calibration output and debug logs.

const METER_FLOOR: f32 = 1e-6;

/// Convert a linear RMS level to dBFS, floored so silence stays finite.
pub fn dbfs(rms: f32) -> f32 {
    20.0 * rms.max(METER_FLOOR).log10()
}
