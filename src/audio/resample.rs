//! Sample-rate normalization between the device's native rate and the
//! configured analysis rate.

#[cfg(feature = "high-quality-audio")]
use crate::log_debug;
#[cfg(feature = "high-quality-audio")]
use anyhow::{anyhow, Result};
#[cfg(feature = "high-quality-audio")]
use rubato::{InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction};
use std::cmp::Ordering as CmpOrdering;
use std::f32::consts::PI;
#[cfg(feature = "high-quality-audio")]
use std::sync::atomic::{AtomicBool, Ordering};

// Practical device rates (~0.01x .. 8x ratios around common hardware).
pub(super) const MIN_DEVICE_RATE: u32 = 2_000;
pub(super) const MAX_DEVICE_RATE: u32 = 1_600_000;
const MAX_DOWNSAMPLING_TAPS: usize = 129;

#[cfg(feature = "high-quality-audio")]
static RESAMPLER_WARNING_SHOWN: AtomicBool = AtomicBool::new(false);

pub(super) fn resample_to_rate(input: &[f32], device_rate: u32, target_rate: u32) -> Vec<f32> {
    if device_rate == 0 || target_rate == 0 {
        return input.to_vec(); // avoid div-by-zero elsewhere
    }
    if input.is_empty() || device_rate == target_rate {
        return input.to_vec();
    }

    #[cfg(feature = "high-quality-audio")]
    match resample_with_rubato(input, device_rate, target_rate) {
        Ok(output) => return output,
        Err(err) => {
            if !RESAMPLER_WARNING_SHOWN.swap(true, Ordering::AcqRel) {
                log_debug(&format!(
                    "high-quality resampler failed ({err}); falling back to basic path"
                ));
            }
        }
    }

    basic_resample(input, device_rate, target_rate)
}

#[cfg(feature = "high-quality-audio")]
fn resample_with_rubato(input: &[f32], device_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return Err(anyhow!(
            "unsupported device sample rate {device_rate}Hz for resampling"
        ));
    }
    let ratio = f64::from(target_rate) / f64::from(device_rate);
    if !(0.01..=8.0).contains(&ratio) {
        return Err(anyhow!("resample ratio {ratio} outside supported bounds"));
    }

    let chunk = 256usize;
    let params = InterpolationParameters {
        sinc_len: 64,
        f_cutoff: 0.90,
        interpolation: InterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut rs = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk, 1)
        .map_err(|e| anyhow!("failed to construct sinc resampler: {e:?}"))?;

    let target_len = ((input.len() as f64) * ratio).round().max(1.0) as usize;
    let mut out = Vec::with_capacity(target_len + 8);
    let mut seg = vec![0.0f32; chunk];
    let mut idx = 0usize;
    while idx < input.len() {
        let end = (idx + chunk).min(input.len());
        let len = end - idx;
        let pad = input[end - 1];
        seg.fill(pad);
        seg[..len].copy_from_slice(&input[idx..end]);
        let produced = rs
            .process(std::slice::from_ref(&seg), None)
            .map_err(|e| anyhow!("resampler process failed: {e:?}"))?;
        out.extend_from_slice(&produced[0]);
        idx = end;
    }

    Ok(adjust_block_length(out, target_len))
}

pub(super) fn basic_resample(input: &[f32], device_rate: u32, target_rate: u32) -> Vec<f32> {
    if device_rate == 0 || target_rate == 0 || input.is_empty() {
        return input.to_vec();
    }
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return input.to_vec();
    }

    let ratio = target_rate as f32 / device_rate as f32;
    let filtered = if device_rate > target_rate {
        // When decimating we run a small FIR low-pass to avoid aliasing.
        let taps = downsampling_tap_count(device_rate, target_rate);
        low_pass_fir(input, device_rate, target_rate, taps)
    } else {
        input.to_vec()
    };
    resample_linear(&filtered, ratio)
}

/// Lightweight linear resampler used after optional filtering; good enough
/// for level and dominant-frequency analysis of short blocks.
pub(super) fn resample_linear(input: &[f32], ratio: f32) -> Vec<f32> {
    let input_len = input.len();
    let output_len = (input_len as f32 * ratio).round() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f32 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx - idx as f32;

        if idx + 1 < input_len {
            let sample = input[idx] * (1.0 - frac) + input[idx + 1] * frac;
            output.push(sample);
        } else {
            let pad = input.last().copied().unwrap_or(0.0);
            output.push(pad);
        }
    }

    output
}

/// Pick a tap count based on the decimation ratio so the FIR stays short for
/// near-equal rates and longer for heavy downsampling.
pub(super) fn downsampling_tap_count(device_rate: u32, target_rate: u32) -> usize {
    let decimation_ratio = device_rate as f32 / target_rate.max(1) as f32;
    let mut taps = (decimation_ratio * 4.0).ceil().max(11.0) as usize;
    if taps % 2 == 0 {
        taps += 1;
    }
    taps.min(MAX_DOWNSAMPLING_TAPS)
}

/// Basic FIR low-pass that tames frequencies above the target Nyquist before
/// samples are dropped, so high-frequency content cannot alias into the band
/// the classifier inspects.
pub(super) fn low_pass_fir(input: &[f32], device_rate: u32, target_rate: u32, taps: usize) -> Vec<f32> {
    if input.is_empty() || taps <= 1 {
        return input.to_vec();
    }

    let normalized_cutoff = (target_rate as f32 * 0.5 / device_rate as f32).min(0.499);
    let coeffs = design_low_pass(normalized_cutoff, taps);
    let half = taps / 2;
    let mut output = Vec::with_capacity(input.len());

    for n in 0..input.len() {
        let mut acc = 0.0;
        for (k, coeff) in coeffs.iter().enumerate() {
            if let Some(idx) = n.checked_add(k).and_then(|sum| sum.checked_sub(half)) {
                if let Some(sample) = input.get(idx) {
                    acc += *sample * coeff;
                }
            }
        }
        output.push(acc);
    }

    output
}

/// Normalized Hamming-windowed sinc taps for the FIR filter.
pub(super) fn design_low_pass(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    let mut coeffs = Vec::with_capacity(taps);
    let m = (taps - 1) as f32;

    for n in 0..taps {
        let centered = n as f32 - m / 2.0;
        let x = 2.0 * PI * normalized_cutoff * centered;
        let sinc = if centered == 0.0 {
            2.0 * normalized_cutoff
        } else {
            (2.0 * normalized_cutoff * x.sin()) / x
        };
        let window = if taps <= 1 {
            1.0
        } else {
            0.54 - 0.46 * ((2.0 * PI * n as f32) / m).cos()
        };
        coeffs.push(sinc * window);
    }

    let sum: f32 = coeffs.iter().sum();
    if sum != 0.0 {
        for coeff in coeffs.iter_mut() {
            *coeff /= sum;
        }
    }

    coeffs
}

/// Resample one dispatched block to the analysis rate and force it to the
/// exact analysis block size.
pub(super) fn convert_block_to_rate(
    block: Vec<f32>,
    device_rate: u32,
    target_rate: u32,
    desired_len: usize,
) -> Vec<f32> {
    if device_rate == target_rate {
        return adjust_block_length(block, desired_len);
    }
    let resampled = resample_to_rate(&block, device_rate, target_rate);
    adjust_block_length(resampled, desired_len)
}

pub(super) fn adjust_block_length(mut data: Vec<f32>, desired: usize) -> Vec<f32> {
    match data.len().cmp(&desired) {
        CmpOrdering::Greater => {
            data.truncate(desired);
        }
        CmpOrdering::Less => {
            let pad = *data.last().unwrap_or(&0.0);
            data.resize(desired, pad);
        }
        CmpOrdering::Equal => {}
    }
    data
}
