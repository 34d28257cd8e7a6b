//! Clap detection pipeline.
//!
//! Turns a stream of fixed-size audio blocks into discrete clap events: an
//! RMS gate rejects quiet blocks, an FFT classifier checks that the
//! dominant frequency sits inside the expected band, and a debouncer
//! enforces a minimum spacing between accepted events. A window tracker
//! aggregates the events of one listening window; windows are independent
//! episodes and share no state.

mod debounce;
mod gate;
mod pipeline;
mod spectral;
#[cfg(test)]
mod tests;
mod window;

pub use debounce::DebounceState;
pub use gate::{rms, AmplitudeGate};
pub use pipeline::{BlockOutcome, ClapDetector, ClapEvent};
pub use spectral::{FrequencyBand, SpectralAnalyzer, SpectralResult};
pub use window::{run_offline_window, StopReason, WindowMetrics, WindowResult, WindowTracker};

/// One block of mono samples delivered by the capture side.
///
/// `timestamp` is seconds since stream start in the device clock domain,
/// derived from the running sample counter rather than wall time.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub timestamp: f64,
}

impl AudioBlock {
    pub fn new(samples: Vec<f32>, sample_rate: u32, timestamp: f64) -> Self {
        Self {
            samples,
            sample_rate,
            timestamp,
        }
    }
}
