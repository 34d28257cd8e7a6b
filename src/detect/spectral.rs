//! Frequency-domain classification of loud blocks.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Dominant-frequency measurement for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralResult {
    pub dominant_hz: f32,
    pub magnitude: f32,
}

/// Inclusive dominant-frequency acceptance band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl FrequencyBand {
    pub fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, hz: f32) -> bool {
        (self.low_hz..=self.high_hz).contains(&hz)
    }
}

/// Reusable forward FFT for fixed-size blocks.
///
/// The transform plan and scratch buffer are allocated once, so per-block
/// analysis stays allocation-free.
pub struct SpectralAnalyzer {
    sample_rate: u32,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl SpectralAnalyzer {
    pub fn new(sample_rate: u32, block_size: usize) -> Self {
        let size = block_size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            sample_rate,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Samples per transform frame this analyzer was planned for.
    pub fn block_size(&self) -> usize {
        self.buffer.len()
    }

    /// Frequency spacing between adjacent bins (Hz).
    pub fn bin_hz(&self) -> f32 {
        self.sample_rate as f32 / self.buffer.len() as f32
    }

    /// Transform one block and report the strongest bin of the
    /// non-negative half-spectrum.
    ///
    /// Ties resolve to the lowest bin. The reported frequency is the bin
    /// center, not interpolated. Blocks shorter than the planned size are
    /// zero-padded; longer ones are truncated.
    pub fn analyze(&mut self, samples: &[f32]) -> SpectralResult {
        let padded = samples.iter().copied().chain(std::iter::repeat(0.0));
        for (slot, sample) in self.buffer.iter_mut().zip(padded) {
            *slot = Complex::new(sample, 0.0);
        }
        self.fft.process(&mut self.buffer);

        let half = (self.buffer.len() / 2).max(1);
        let mut best_bin = 0usize;
        let mut best_magnitude = self.buffer[0].norm();
        for (bin, value) in self.buffer[..half].iter().enumerate().skip(1) {
            let magnitude = value.norm();
            if magnitude > best_magnitude {
                best_bin = bin;
                best_magnitude = magnitude;
            }
        }

        SpectralResult {
            dominant_hz: best_bin as f32 * self.bin_hz(),
            magnitude: best_magnitude,
        }
    }
}
