use super::dispatch::{append_downmixed_samples, BlockDispatcher};
use super::meter::dbfs;
use super::resample::{
    adjust_block_length, basic_resample, convert_block_to_rate, design_low_pass,
    downsampling_tap_count, resample_linear, resample_to_rate,
};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn downmixes_multi_channel_audio() {
    let mut buf = Vec::new();
    let samples = [1.0f32, -1.0, 0.5, 0.5];
    append_downmixed_samples(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![0.0, 0.5]);
}

#[test]
fn preserves_single_channel_audio() {
    let mut buf = Vec::new();
    let samples = [0.1f32, 0.2, 0.3];
    append_downmixed_samples(&mut buf, &samples, 1, |sample| sample);
    assert_eq!(buf, samples);
}

#[test]
fn dispatcher_chunks_into_fixed_blocks() {
    let (sender, receiver) = bounded(8);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = BlockDispatcher::new(4, sender, dropped.clone());

    let data: Vec<f32> = (0..10).map(|i| i as f32).collect();
    dispatcher.push(&data, 1, |sample| sample);

    let first = receiver.try_recv().expect("first block");
    assert_eq!(first.start_sample, 0);
    assert_eq!(first.samples, vec![0.0, 1.0, 2.0, 3.0]);

    let second = receiver.try_recv().expect("second block");
    assert_eq!(second.start_sample, 4);
    assert_eq!(second.samples, vec![4.0, 5.0, 6.0, 7.0]);

    // Two trailing samples stay pending until the next callback.
    assert!(receiver.try_recv().is_err());
    assert_eq!(dropped.load(Ordering::Relaxed), 0);
}

#[test]
fn dispatcher_counts_drops_and_keeps_timestamps_monotonic() {
    let (sender, receiver) = bounded(1);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = BlockDispatcher::new(2, sender, dropped.clone());

    dispatcher.push(&[0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0], 1, |sample| sample);
    assert_eq!(dropped.load(Ordering::Relaxed), 2);

    // The delivered block is the first one; the sample counter still
    // advanced past the dropped ones.
    let delivered = receiver.try_recv().expect("one block fits the channel");
    assert_eq!(delivered.start_sample, 0);

    dispatcher.push(&[6.0f32, 7.0], 1, |sample| sample);
    let next = receiver.try_recv().expect("next block");
    assert_eq!(next.start_sample, 6);
}

#[test]
fn resample_returns_input_when_rates_match() {
    let input = vec![0.1f32, 0.2, 0.3];
    assert_eq!(resample_to_rate(&input, 48_000, 48_000), input);
}

#[test]
fn resample_returns_empty_for_empty_input() {
    let input: Vec<f32> = Vec::new();
    assert!(resample_to_rate(&input, 44_100, 48_000).is_empty());
}

#[test]
fn resample_scales_length_with_ratio() {
    let input: Vec<f32> = (0..960).map(|i| (i as f32 * 0.01).sin()).collect();
    let output = resample_to_rate(&input, 48_000, 16_000);
    let expected = (input.len() as f64 / 3.0).round() as isize;
    let diff = (output.len() as isize - expected).abs();
    // Sinc chunking can stray by a few samples on some hosts.
    assert!(diff <= 10, "expected ~{expected} samples, got {}", output.len());
}

#[test]
fn resample_linear_scales_length() {
    let input = vec![0.0f32, 1.0, 2.0, 3.0];
    let result = resample_linear(&input, 0.5);
    assert!(result.len() < input.len());
    assert!((result.first().copied().unwrap_or_default() - 0.0).abs() < 1e-6);
}

#[test]
fn basic_resample_downsamples() {
    let input = vec![0.0, 1.0, 0.5, -0.5, -1.0, 0.0];
    let result = basic_resample(&input, 48_000, 16_000);
    assert!(result.len() < input.len());
}

#[test]
fn tap_count_is_odd_and_bounded() {
    for device_rate in [16_000u32, 44_100, 48_000, 96_000, 192_000] {
        let taps = downsampling_tap_count(device_rate, 16_000);
        assert_eq!(taps % 2, 1);
        assert!(taps <= 129);
    }
}

#[test]
fn low_pass_design_is_normalized() {
    let coeffs = design_low_pass(0.25, 21);
    let sum: f32 = coeffs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-4);
}

#[test]
fn convert_block_pads_to_desired_length() {
    let input = vec![0.25f32; 1_881];
    let output = convert_block_to_rate(input, 44_100, 48_000, 2_048);
    assert_eq!(output.len(), 2_048);
}

#[test]
fn convert_block_is_identity_sized_at_equal_rates() {
    let input: Vec<f32> = (0..2_048).map(|i| (i as f32 * 0.001).sin()).collect();
    let output = convert_block_to_rate(input.clone(), 48_000, 48_000, 2_048);
    assert_eq!(output, input);
}

#[test]
fn adjust_block_length_truncates_and_pads() {
    assert_eq!(adjust_block_length(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    assert_eq!(adjust_block_length(vec![1.0, 2.0], 4), vec![1.0, 2.0, 2.0, 2.0]);
}

#[test]
fn dbfs_floors_silence_and_tracks_level() {
    assert!(dbfs(0.0) <= -119.0);
    assert!((dbfs(1.0) - 0.0).abs() < 1e-3);
    assert!(dbfs(0.1) < dbfs(0.5));
}
