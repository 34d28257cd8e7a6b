//! System microphone capture via CPAL.
//!
//! Handles device selection, format conversion, and the per-window capture
//! loop that feeds the detection pipeline.

use super::dispatch::{append_downmixed_samples, BlockDispatcher, RawBlock};
use super::resample::{convert_block_to_rate, resample_to_rate};
use crate::config::DetectorConfig;
use crate::detect::{AudioBlock, StopReason, WindowResult, WindowTracker};
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Audio input device wrapper.
///
/// Abstracts CPAL device handling and provides the per-window capture loop
/// plus a plain timed capture for calibration.
pub struct Recorder {
    device: cpal::Device,
}

impl Recorder {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a recorder, optionally forcing a specific device so users can
    /// pick the right microphone when the host exposes multiple inputs.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self { device })
    }

    /// Get the name of the active capture device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Capture raw audio for `duration`, normalize the incoming format, and
    /// return mono data resampled to `target_rate`. Used by calibration mode.
    pub fn record_for(&self, duration: Duration, target_rate: u32) -> Result<Vec<f32>> {
        let default_config = self.device.default_input_config()?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));
        let device_name = self.device_name();

        log_debug(&format!(
            "record_for config: format={format:?} sample_rate={device_rate}Hz channels={channels}"
        ));

        // cpal delivers samples on a callback thread; collect them in a shared
        // buffer so ownership stays on the caller side.
        let expected_samples =
            (duration.as_secs_f64() * device_rate as f64 * channels as f64).ceil() as usize;
        let buffer = Arc::new(Mutex::new(Vec::<f32>::with_capacity(expected_samples)));
        let buffer_clone = buffer.clone();

        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));

        // Convert every supported sample type to f32 up front so the rest of
        // the pipeline stays format-agnostic.
        let stream = match format {
            SampleFormat::F32 => self.device.build_input_stream(
                &device_config,
                move |data: &[f32], _| {
                    if let Ok(mut buf) = buffer_clone.lock() {
                        append_downmixed_samples(&mut buf, data, channels, |sample| sample);
                    }
                },
                err_fn,
                None,
            )?,
            SampleFormat::I16 => self.device.build_input_stream(
                &device_config,
                move |data: &[i16], _| {
                    if let Ok(mut buf) = buffer_clone.lock() {
                        append_downmixed_samples(&mut buf, data, channels, |sample| {
                            sample as f32 / 32_768.0_f32
                        });
                    }
                },
                err_fn,
                None,
            )?,
            SampleFormat::U16 => self.device.build_input_stream(
                &device_config,
                move |data: &[u16], _| {
                    if let Ok(mut buf) = buffer_clone.lock() {
                        append_downmixed_samples(&mut buf, data, channels, |sample| {
                            (sample as f32 - 32_768.0_f32) / 32_768.0_f32
                        });
                    }
                },
                err_fn,
                None,
            )?,
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play()?;
        std::thread::sleep(duration);
        if let Err(err) = stream.pause() {
            log_debug(&format!("failed to pause audio stream: {err}"));
        }
        drop(stream);

        let samples = buffer
            .lock()
            .map_err(|_| anyhow!("audio buffer lock poisoned"))?;

        if samples.is_empty() {
            return Err(anyhow!(
                "no samples captured from '{device_name}'; check microphone permissions and availability. {}",
                mic_permission_hint()
            ));
        }

        Ok(resample_to_rate(&samples, device_rate, target_rate))
    }

    /// Run one listening window against the live device.
    ///
    /// Never panics across the window boundary: open or stream failures
    /// abort the window and surface as a fault reason on an empty result,
    /// so the caller's loop can simply continue with the next window.
    pub fn listen_window(
        &self,
        cfg: &DetectorConfig,
        stop_flag: Option<&AtomicBool>,
    ) -> WindowResult {
        match listen_window_impl(self, cfg, stop_flag) {
            Ok(result) => result,
            Err(err) => {
                log_debug(&format!("listen_window aborted: {err:#}"));
                WindowResult::faulted(StopReason::DeviceUnavailable(format!("{err:#}")))
            }
        }
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}

/// Runs one listening window: streams device blocks through the detection
/// pipeline until the window deadline, an interrupt, or a stream fault.
///
/// The CPAL callback only chunks and forwards samples; classification and
/// the debounce state live on this thread, so no synchronization beyond the
/// block channel is needed. The stream is paused and dropped on every exit
/// path before the result is produced.
fn listen_window_impl(
    recorder: &Recorder,
    cfg: &DetectorConfig,
    stop_flag: Option<&AtomicBool>,
) -> Result<WindowResult> {
    let default_config = recorder
        .device
        .default_input_config()
        .context("failed to query device input config")?;
    let format = default_config.sample_format();
    let device_config: StreamConfig = default_config.into();
    let device_rate = device_config.sample_rate.0;
    let channels = usize::from(device_config.channels.max(1));

    // Scale the dispatch size with the rate ratio so one dispatched block
    // resamples to exactly one analysis block.
    let device_block_samples = ((cfg.block_size as u64 * u64::from(device_rate))
        / u64::from(cfg.sample_rate.max(1)))
    .max(1) as usize;

    let (sender, receiver) = bounded::<RawBlock>(cfg.channel_capacity.max(1));
    let dropped = Arc::new(AtomicUsize::new(0));
    let dispatcher = Arc::new(Mutex::new(BlockDispatcher::new(
        device_block_samples,
        sender,
        dropped.clone(),
    )));

    let stream_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let err_fn = {
        let stream_error = stream_error.clone();
        move |err: cpal::StreamError| {
            log_debug(&format!("audio_stream_error: {err}"));
            if let Ok(mut slot) = stream_error.lock() {
                slot.get_or_insert_with(|| err.to_string());
            }
        }
    };

    let stream = match format {
        SampleFormat::F32 => {
            let dispatcher = dispatcher.clone();
            let dropped = dropped.clone();
            recorder.device.build_input_stream(
                &device_config,
                move |data: &[f32], _| {
                    if let Ok(mut pump) = dispatcher.try_lock() {
                        pump.push(data, channels, |sample| sample);
                    } else {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::I16 => {
            let dispatcher = dispatcher.clone();
            let dropped = dropped.clone();
            recorder.device.build_input_stream(
                &device_config,
                move |data: &[i16], _| {
                    if let Ok(mut pump) = dispatcher.try_lock() {
                        pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                    } else {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::U16 => {
            let dispatcher = dispatcher.clone();
            let dropped = dropped.clone();
            recorder.device.build_input_stream(
                &device_config,
                move |data: &[u16], _| {
                    if let Ok(mut pump) = dispatcher.try_lock() {
                        pump.push(data, channels, |sample| {
                            (sample as f32 - 32_768.0) / 32_768.0
                        });
                    } else {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                err_fn,
                None,
            )?
        }
        other => return Err(anyhow!("unsupported sample format: {other:?}")),
    };

    stream.play().context("failed to start capture stream")?;

    let mut tracker = WindowTracker::new(cfg);
    let deadline = Instant::now() + Duration::from_millis(cfg.window_ms);
    let wait_time = cfg.block_duration();
    let mut stop_reason = StopReason::Elapsed;

    while Instant::now() < deadline {
        if let Some(flag) = stop_flag {
            if flag.load(Ordering::Relaxed) {
                stop_reason = StopReason::Interrupted;
                break;
            }
        }
        if let Some(msg) = stream_error.lock().ok().and_then(|mut slot| slot.take()) {
            stop_reason = StopReason::StreamFault(msg);
            break;
        }
        match receiver.recv_timeout(wait_time) {
            Ok(raw) => {
                let timestamp = raw.start_sample as f64 / f64::from(device_rate.max(1));
                let samples =
                    convert_block_to_rate(raw.samples, device_rate, cfg.sample_rate, cfg.block_size);
                let block = AudioBlock::new(samples, cfg.sample_rate, timestamp);
                if let Some(event) = tracker.on_block(&block) {
                    log_debug(&format!(
                        "clap accepted at {:.2}s (rms {:.4}, dominant {:.1} Hz)",
                        event.timestamp, event.rms, event.dominant_hz
                    ));
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                stop_reason = StopReason::StreamFault("capture stream disconnected".to_string());
                break;
            }
        }
    }

    if let Err(err) = stream.pause() {
        log_debug(&format!("failed to pause capture stream: {err}"));
    }
    drop(stream);

    if tracker.blocks_processed() == 0 && !stop_reason.is_fault() {
        log_debug(&format!(
            "window delivered no blocks from '{}'. {}",
            recorder.device_name(),
            mic_permission_hint()
        ));
    }

    tracker.record_dropped(dropped.load(Ordering::Relaxed));
    Ok(tracker.finish(stop_reason))
}
