//! Window aggregation: one fixed-duration detection episode.

use super::pipeline::{BlockOutcome, ClapDetector, ClapEvent};
use super::AudioBlock;
use crate::config::DetectorConfig;
use crate::log_debug;

/// Why a listening window ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The configured window duration elapsed.
    Elapsed,
    /// Shutdown was requested mid-window.
    Interrupted,
    /// The capture device could not be opened.
    DeviceUnavailable(String),
    /// The capture stream failed mid-window.
    StreamFault(String),
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::Elapsed => "elapsed",
            StopReason::Interrupted => "interrupted",
            StopReason::DeviceUnavailable(_) => "device_unavailable",
            StopReason::StreamFault(_) => "stream_fault",
        }
    }

    /// Faulted windows abort and report no events.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            StopReason::DeviceUnavailable(_) | StopReason::StreamFault(_)
        )
    }
}

/// Counters collected while a window runs, for observability and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMetrics {
    pub blocks_processed: usize,
    pub blocks_loud: usize,
    pub blocks_in_band: usize,
    pub blocks_skipped: usize,
    pub blocks_dropped: usize,
    pub stop_reason: StopReason,
}

impl Default for WindowMetrics {
    fn default() -> Self {
        Self {
            blocks_processed: 0,
            blocks_loud: 0,
            blocks_in_band: 0,
            blocks_skipped: 0,
            blocks_dropped: 0,
            stop_reason: StopReason::Elapsed,
        }
    }
}

/// One finalized listening window: the accepted claps, in order, plus the
/// counters. Consecutive event timestamps always differ by strictly more
/// than the configured debounce interval.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowResult {
    pub events: Vec<ClapEvent>,
    pub metrics: WindowMetrics,
}

impl WindowResult {
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Empty result for a window that never produced usable audio.
    pub fn faulted(reason: StopReason) -> Self {
        Self {
            events: Vec::new(),
            metrics: WindowMetrics {
                stop_reason: reason,
                ..WindowMetrics::default()
            },
        }
    }
}

/// Accumulates one window's events as blocks arrive.
///
/// Owned by whichever thread consumes the block channel; the capture
/// callback never touches it.
pub struct WindowTracker {
    detector: ClapDetector,
    events: Vec<ClapEvent>,
    metrics: WindowMetrics,
}

impl WindowTracker {
    pub fn new(cfg: &DetectorConfig) -> Self {
        Self {
            detector: ClapDetector::new(cfg),
            events: Vec::new(),
            metrics: WindowMetrics::default(),
        }
    }

    /// Feed one delivered block. Malformed blocks (empty, or not the
    /// planned block size) are skipped and counted, never classified.
    pub fn on_block(&mut self, block: &AudioBlock) -> Option<ClapEvent> {
        if block.samples.is_empty() || block.samples.len() != self.detector.block_size() {
            self.metrics.blocks_skipped += 1;
            return None;
        }
        self.metrics.blocks_processed += 1;
        match self.detector.process_block(block) {
            BlockOutcome::Quiet => None,
            BlockOutcome::OutOfBand(spectrum) => {
                self.metrics.blocks_loud += 1;
                log_debug(&format!(
                    "window: ignored loud block at {:.2}s, dominant {:.1} Hz out of band",
                    block.timestamp, spectrum.dominant_hz
                ));
                None
            }
            BlockOutcome::Debounced(_) => {
                self.metrics.blocks_loud += 1;
                self.metrics.blocks_in_band += 1;
                None
            }
            BlockOutcome::Clap(event) => {
                self.metrics.blocks_loud += 1;
                self.metrics.blocks_in_band += 1;
                self.events.push(event);
                Some(event)
            }
        }
    }

    pub fn record_dropped(&mut self, dropped: usize) {
        self.metrics.blocks_dropped = dropped;
    }

    pub fn blocks_processed(&self) -> usize {
        self.metrics.blocks_processed
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Close the window. Faults abort: the event list is discarded so the
    /// caller always sees an empty result alongside the failure condition.
    pub fn finish(mut self, stop_reason: StopReason) -> WindowResult {
        if stop_reason.is_fault() {
            self.events.clear();
        }
        self.metrics.stop_reason = stop_reason;
        WindowResult {
            events: self.events,
            metrics: self.metrics,
        }
    }
}

/// Run the pipeline over pre-built blocks, without a device.
///
/// Used by tests and benchmarks. Identical block sequences always produce
/// identical results; blocks stamped past the window duration are ignored.
pub fn run_offline_window(blocks: &[AudioBlock], cfg: &DetectorConfig) -> WindowResult {
    let mut tracker = WindowTracker::new(cfg);
    let window_secs = cfg.window_ms as f64 / 1000.0;
    for block in blocks {
        if block.timestamp >= window_secs {
            break;
        }
        tracker.on_block(block);
    }
    tracker.finish(StopReason::Elapsed)
}
