//! Per-block composition of the gate, classifier, and debouncer.

use super::debounce::DebounceState;
use super::gate::{rms, AmplitudeGate};
use super::spectral::{FrequencyBand, SpectralAnalyzer, SpectralResult};
use super::AudioBlock;
use crate::config::DetectorConfig;

/// An accepted clap.
///
/// `timestamp` is in the block clock domain (seconds). The measured RMS
/// and dominant frequency ride along for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClapEvent {
    pub timestamp: f64,
    pub rms: f32,
    pub dominant_hz: f32,
}

/// What happened to one block inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockOutcome {
    /// Rejected by the amplitude gate.
    Quiet,
    /// Loud, but the dominant frequency fell outside the accepted band.
    OutOfBand(SpectralResult),
    /// Loud and in band, but within the debounce interval.
    Debounced(SpectralResult),
    /// Accepted clap.
    Clap(ClapEvent),
}

/// Block-at-a-time clap detector: gate, then FFT band check, then debounce.
///
/// Holds the per-window debounce state; `reset` starts a fresh window.
pub struct ClapDetector {
    gate: AmplitudeGate,
    band: FrequencyBand,
    min_interval_secs: f64,
    spectral: SpectralAnalyzer,
    debounce: DebounceState,
}

impl ClapDetector {
    pub fn new(cfg: &DetectorConfig) -> Self {
        Self {
            gate: AmplitudeGate::new(cfg.threshold),
            band: FrequencyBand::new(cfg.band_low_hz, cfg.band_high_hz),
            min_interval_secs: cfg.min_interval_secs(),
            spectral: SpectralAnalyzer::new(cfg.sample_rate, cfg.block_size),
            debounce: DebounceState::new(),
        }
    }

    /// Run one block through the pipeline.
    ///
    /// Quiet blocks stop at the gate and never reach the FFT. Loud blocks
    /// whose dominant frequency lands outside the band are dropped after
    /// classification. Hits closer than the debounce interval to the
    /// previous accepted clap are dropped without touching the state.
    pub fn process_block(&mut self, block: &AudioBlock) -> BlockOutcome {
        let level = rms(&block.samples);
        if !self.gate.passes(level) {
            return BlockOutcome::Quiet;
        }
        let spectrum = self.spectral.analyze(&block.samples);
        if !self.band.contains(spectrum.dominant_hz) {
            return BlockOutcome::OutOfBand(spectrum);
        }
        if !self.debounce.accept(block.timestamp, self.min_interval_secs) {
            return BlockOutcome::Debounced(spectrum);
        }
        BlockOutcome::Clap(ClapEvent {
            timestamp: block.timestamp,
            rms: level,
            dominant_hz: spectrum.dominant_hz,
        })
    }

    /// Start a fresh window; claps never carry over between windows.
    pub fn reset(&mut self) {
        self.debounce.reset();
    }

    pub fn block_size(&self) -> usize {
        self.spectral.block_size()
    }
}
