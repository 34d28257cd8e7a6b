use super::{
    rms, run_offline_window, AudioBlock, BlockOutcome, ClapDetector, DebounceState, FrequencyBand,
    SpectralAnalyzer, StopReason, WindowTracker,
};
use crate::config::DetectorConfig;
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 48_000;
const BLOCK_SIZE: usize = 2_048;

fn test_config() -> DetectorConfig {
    DetectorConfig {
        sample_rate: SAMPLE_RATE,
        block_size: BLOCK_SIZE,
        window_ms: 10_000,
        threshold: 0.01,
        clap_interval_ms: 500,
        band_low_hz: 500.0,
        band_high_hz: 4_000.0,
        channel_capacity: 64,
    }
}

/// Sine at an exact bin center, so the transform concentrates all energy
/// in that bin. RMS of the block is amplitude / sqrt(2).
fn sine_block(bin: usize, amplitude: f32, timestamp: f64) -> AudioBlock {
    let hz = bin as f32 * SAMPLE_RATE as f32 / BLOCK_SIZE as f32;
    let samples = (0..BLOCK_SIZE)
        .map(|i| amplitude * (2.0 * PI * hz * i as f32 / SAMPLE_RATE as f32).sin())
        .collect();
    AudioBlock::new(samples, SAMPLE_RATE, timestamp)
}

/// Bin 43 sits at ~1008 Hz, inside the default 500..4000 band.
fn clap_block(timestamp: f64) -> AudioBlock {
    sine_block(43, 0.08, timestamp)
}

fn silent_block(timestamp: f64) -> AudioBlock {
    AudioBlock::new(vec![0.0; BLOCK_SIZE], SAMPLE_RATE, timestamp)
}

#[test]
fn rms_of_silence_is_zero() {
    assert_eq!(rms(&[0.0; 64]), 0.0);
    assert_eq!(rms(&[]), 0.0);
}

#[test]
fn rms_of_constant_signal_matches_level() {
    let level = rms(&[0.5; 256]);
    assert!((level - 0.5).abs() < 1e-6);
}

#[test]
fn gate_rejects_rms_equal_to_threshold() {
    let mut cfg = test_config();
    cfg.threshold = 0.5;
    let mut detector = ClapDetector::new(&cfg);
    // Constant block: RMS is exactly the threshold, strict > must reject.
    let block = AudioBlock::new(vec![0.5; BLOCK_SIZE], SAMPLE_RATE, 0.0);
    assert_eq!(detector.process_block(&block), BlockOutcome::Quiet);
}

#[test]
fn quiet_blocks_never_reach_classification() {
    let mut cfg = test_config();
    cfg.threshold = 0.2;
    // In-band spectral content, but below the gate.
    let blocks = vec![clap_block(0.0), clap_block(1.0)];
    let result = run_offline_window(&blocks, &cfg);
    assert_eq!(result.count(), 0);
    assert_eq!(result.metrics.blocks_loud, 0);
    assert_eq!(result.metrics.blocks_processed, 2);
}

#[test]
fn pure_sine_reports_bin_center_frequency() {
    let mut analyzer = SpectralAnalyzer::new(SAMPLE_RATE, BLOCK_SIZE);
    // Bin 64 at 48 kHz / 2048 samples is exactly 1500 Hz.
    let block = sine_block(64, 0.1, 0.0);
    let spectrum = analyzer.analyze(&block.samples);
    assert!(
        (spectrum.dominant_hz - 1_500.0).abs() < 1e-3,
        "got {} Hz",
        spectrum.dominant_hz
    );
    assert!(spectrum.magnitude > 0.0);
}

#[test]
fn dominant_frequency_stays_in_half_spectrum() {
    let mut analyzer = SpectralAnalyzer::new(SAMPLE_RATE, BLOCK_SIZE);
    for bin in [1usize, 43, 512, 1_023] {
        let spectrum = analyzer.analyze(&sine_block(bin, 0.1, 0.0).samples);
        assert!(spectrum.dominant_hz <= SAMPLE_RATE as f32 / 2.0);
    }
}

#[test]
fn magnitude_tie_resolves_to_lowest_bin() {
    let mut analyzer = SpectralAnalyzer::new(SAMPLE_RATE, BLOCK_SIZE);
    // All-zero input ties every bin at magnitude zero.
    let zeros = vec![0.0; BLOCK_SIZE];
    let spectrum = analyzer.analyze(&zeros);
    assert_eq!(spectrum.dominant_hz, 0.0);
    assert_eq!(spectrum.magnitude, 0.0);
}

#[test]
fn band_bounds_are_inclusive() {
    let band = FrequencyBand::new(500.0, 4_000.0);
    assert!(band.contains(500.0));
    assert!(band.contains(4_000.0));
    assert!(!band.contains(499.99));
    assert!(!band.contains(4_000.01));
}

#[test]
fn debounce_accepts_first_event() {
    let mut state = DebounceState::new();
    assert!(state.accept(0.1, 0.5));
    assert_eq!(state.last_accepted(), Some(0.1));
}

#[test]
fn debounce_rejects_within_interval_without_state_change() {
    let mut state = DebounceState::new();
    assert!(state.accept(0.0, 0.5));
    assert!(!state.accept(0.2, 0.5));
    // The rejected hit must not slide the interval forward.
    assert_eq!(state.last_accepted(), Some(0.0));
    assert!(state.accept(0.51, 0.5));
}

#[test]
fn debounce_rejects_exact_interval_gap() {
    let mut state = DebounceState::new();
    assert!(state.accept(0.0, 0.5));
    assert!(!state.accept(0.5, 0.5));
}

#[test]
fn debounce_reset_forgets_previous_event() {
    let mut state = DebounceState::new();
    assert!(state.accept(0.0, 0.5));
    state.reset();
    assert!(state.accept(0.1, 0.5));
}

#[test]
fn close_claps_count_once() {
    let cfg = test_config();
    let blocks = vec![clap_block(0.0), clap_block(0.2)];
    let result = run_offline_window(&blocks, &cfg);
    assert_eq!(result.count(), 1);
    assert_eq!(result.metrics.blocks_in_band, 2);
}

#[test]
fn spaced_claps_count_twice() {
    let cfg = test_config();
    let blocks = vec![clap_block(0.0), clap_block(0.6)];
    let result = run_offline_window(&blocks, &cfg);
    assert_eq!(result.count(), 2);
    let gap = result.events[1].timestamp - result.events[0].timestamp;
    assert!(gap > cfg.min_interval_secs());
}

#[test]
fn event_timestamps_are_strictly_increasing_and_spaced() {
    let cfg = test_config();
    let blocks: Vec<AudioBlock> = (0..8).map(|i| clap_block(i as f64 * 0.3)).collect();
    let result = run_offline_window(&blocks, &cfg);
    assert!(result.count() >= 2);
    for pair in result.events.windows(2) {
        assert!(pair[1].timestamp - pair[0].timestamp > cfg.min_interval_secs());
    }
}

#[test]
fn out_of_band_block_produces_no_event() {
    let cfg = test_config();
    // Bin 8 is 187.5 Hz, loud but below the band.
    let blocks = vec![sine_block(8, 0.08, 0.0)];
    let result = run_offline_window(&blocks, &cfg);
    assert_eq!(result.count(), 0);
    assert_eq!(result.metrics.blocks_loud, 1);
    assert_eq!(result.metrics.blocks_in_band, 0);
}

#[test]
fn silent_block_stops_at_the_gate() {
    let cfg = test_config();
    let result = run_offline_window(&[silent_block(0.0)], &cfg);
    assert_eq!(result.count(), 0);
    assert_eq!(result.metrics.blocks_loud, 0);
}

#[test]
fn identical_input_yields_identical_result() {
    let cfg = test_config();
    let blocks = vec![
        clap_block(0.0),
        silent_block(0.1),
        clap_block(0.7),
        sine_block(8, 0.08, 1.0),
    ];
    let first = run_offline_window(&blocks, &cfg);
    let second = run_offline_window(&blocks, &cfg);
    assert_eq!(first, second);
}

#[test]
fn malformed_blocks_are_skipped_not_classified() {
    let cfg = test_config();
    let mut tracker = WindowTracker::new(&cfg);
    tracker.on_block(&AudioBlock::new(Vec::new(), SAMPLE_RATE, 0.0));
    tracker.on_block(&AudioBlock::new(vec![0.5; 100], SAMPLE_RATE, 0.1));
    assert!(tracker.on_block(&clap_block(0.2)).is_some());
    let result = tracker.finish(StopReason::Elapsed);
    assert_eq!(result.metrics.blocks_skipped, 2);
    assert_eq!(result.metrics.blocks_processed, 1);
    assert_eq!(result.count(), 1);
}

#[test]
fn offline_window_ignores_blocks_past_duration() {
    let mut cfg = test_config();
    cfg.window_ms = 1_000;
    let blocks = vec![clap_block(0.0), clap_block(1.5)];
    let result = run_offline_window(&blocks, &cfg);
    assert_eq!(result.count(), 1);
}

#[test]
fn faulted_window_reports_empty_events() {
    let cfg = test_config();
    let mut tracker = WindowTracker::new(&cfg);
    assert!(tracker.on_block(&clap_block(0.0)).is_some());
    let result = tracker.finish(StopReason::StreamFault("device vanished".to_string()));
    assert!(result.events.is_empty());
    assert_eq!(result.metrics.stop_reason.label(), "stream_fault");
}

#[test]
fn interrupted_window_keeps_accepted_events() {
    let cfg = test_config();
    let mut tracker = WindowTracker::new(&cfg);
    tracker.on_block(&clap_block(0.0));
    let result = tracker.finish(StopReason::Interrupted);
    assert_eq!(result.count(), 1);
    assert!(!result.metrics.stop_reason.is_fault());
}

#[test]
fn detector_reset_starts_a_fresh_window() {
    let cfg = test_config();
    let mut detector = ClapDetector::new(&cfg);
    assert!(matches!(
        detector.process_block(&clap_block(0.0)),
        BlockOutcome::Clap(_)
    ));
    assert!(matches!(
        detector.process_block(&clap_block(0.1)),
        BlockOutcome::Debounced(_)
    ));
    detector.reset();
    // Same early timestamp is acceptable again after the boundary.
    assert!(matches!(
        detector.process_block(&clap_block(0.1)),
        BlockOutcome::Clap(_)
    ));
}
