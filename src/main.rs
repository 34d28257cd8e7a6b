//! clapctl entrypoint: listen for claps in fixed windows and drive the
//! desktop player with media keystrokes.
//!
//! # Architecture
//!
//! - CPAL callback thread: downmixes and chunks samples, never blocks
//! - Main thread: consumes blocks, runs the detection pipeline, and
//!   dispatches the per-window action
//! - Signal handlers: flip a shutdown flag so the in-flight window closes
//!   its stream before the process exits

use anyhow::Result;
use clapctl::actions::{action_for_count, ActionSink, DryRunSink, KeystrokeSink};
use clapctl::audio::{dbfs, Recorder};
use clapctl::config::AppConfig;
use clapctl::detect::{rms, SpectralAnalyzer, StopReason, WindowResult};
use clapctl::{init_logging, init_tracing, log_debug, log_file_path, log_panic};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
unsafe extern "C" fn handle_shutdown_signal(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[cfg(unix)]
fn install_shutdown_handlers() -> Result<()> {
    unsafe {
        for signal in [libc::SIGINT, libc::SIGTERM] {
            if libc::signal(signal, handle_shutdown_signal as libc::sighandler_t)
                == libc::SIG_ERR
            {
                anyhow::bail!("failed to install handler for signal {signal}");
            }
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn install_shutdown_handlers() -> Result<()> {
    Ok(())
}

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;

    if config.list_input_devices {
        list_input_devices();
        return Ok(());
    }

    init_logging(&config);
    init_tracing(&config);
    let previous_panic_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous_panic_hook(info);
    }));

    if config.logs {
        log_debug("=== clapctl started ===");
        log_debug(&format!("log file: {:?}", log_file_path()));
    }

    if config.calibrate {
        return run_calibration(&config);
    }

    install_shutdown_handlers()?;
    run_detection_loop(&config)
}

fn list_input_devices() {
    match Recorder::list_devices() {
        Ok(devices) if devices.is_empty() => {
            println!("No audio input devices detected.");
        }
        Ok(devices) => {
            println!("Detected audio input devices:");
            for (index, name) in devices.iter().enumerate() {
                println!("  {index}: {name}");
            }
        }
        Err(err) => {
            println!("Failed to list audio input devices: {err:#}");
        }
    }
}

/// The outer process loop: run a window, dispatch its action, idle, repeat
/// until a shutdown signal arrives. Window faults are reported and the next
/// window starts fresh; nothing here is fatal.
fn run_detection_loop(config: &AppConfig) -> Result<()> {
    let detector_cfg = config.detector_config();
    let mut sink: Box<dyn ActionSink> = if config.dry_run {
        Box::new(DryRunSink)
    } else {
        Box::new(KeystrokeSink::from_config(config))
    };

    println!(
        "Listening in {} ms windows (threshold {:.3}, band {:.0}-{:.0} Hz). Press Ctrl+C to stop.",
        config.window_ms, config.threshold, config.band_low_hz, config.band_high_hz
    );

    while !SHUTDOWN.load(Ordering::Relaxed) {
        // The device is re-opened per window, so an unplugged microphone
        // recovers by itself once it comes back.
        let result = match Recorder::new(config.input_device.as_deref()) {
            Ok(recorder) => recorder.listen_window(&detector_cfg, Some(&SHUTDOWN)),
            Err(err) => {
                log_debug(&format!("device unavailable: {err:#}"));
                WindowResult::faulted(StopReason::DeviceUnavailable(format!("{err:#}")))
            }
        };

        report_window(config, &result);

        if SHUTDOWN.load(Ordering::Relaxed) {
            break;
        }

        match action_for_count(result.count()) {
            Some(action) => {
                println!("{} clap(s) -> {}", result.count(), action.label());
                if let Err(err) = sink.dispatch(action) {
                    log_debug(&format!("action dispatch failed: {err:#}"));
                    eprintln!("Failed to dispatch {}: {err:#}", action.label());
                }
            }
            None => println!("{} clap(s) -> no action", result.count()),
        }

        if config.once {
            break;
        }
        idle_between_windows(config.idle_delay_ms);
    }

    println!("Clap detection stopped.");
    log_debug("=== clapctl exiting ===");
    Ok(())
}

fn report_window(config: &AppConfig, result: &WindowResult) {
    let metrics = &result.metrics;
    tracing::info!(
        claps = result.count(),
        stop_reason = metrics.stop_reason.label(),
        blocks = metrics.blocks_processed,
        dropped = metrics.blocks_dropped,
        "window finished"
    );
    match &metrics.stop_reason {
        StopReason::DeviceUnavailable(msg) => {
            eprintln!("Window aborted, device unavailable: {msg}");
        }
        StopReason::StreamFault(msg) => {
            eprintln!("Window aborted, stream fault: {msg}");
        }
        _ => {}
    }
    for event in &result.events {
        println!("  clap at {:.2}s ({:.0} Hz)", event.timestamp, event.dominant_hz);
    }
    if config.log_timings {
        log_debug(&format!(
            "timing|phase=window|claps={}|blocks={}|loud={}|in_band={}|skipped={}|dropped={}|stop={}",
            result.count(),
            metrics.blocks_processed,
            metrics.blocks_loud,
            metrics.blocks_in_band,
            metrics.blocks_skipped,
            metrics.blocks_dropped,
            metrics.stop_reason.label()
        ));
    }
}

/// Sleep between windows in short steps so Ctrl+C stays responsive.
fn idle_between_windows(delay_ms: u64) {
    let mut remaining = delay_ms;
    while remaining > 0 && !SHUTDOWN.load(Ordering::Relaxed) {
        let step = remaining.min(100);
        std::thread::sleep(Duration::from_millis(step));
        remaining -= step;
    }
}

/// Measure the room, then the user's claps, and suggest a gate threshold.
fn run_calibration(config: &AppConfig) -> Result<()> {
    let detector_cfg = config.detector_config();
    let recorder = Recorder::new(config.input_device.as_deref())?;
    println!("Calibrating on '{}'.", recorder.device_name());

    println!(
        "Sampling ambient noise for {} ms; keep quiet...",
        config.calibrate_ambient_ms
    );
    let ambient = recorder.record_for(
        Duration::from_millis(config.calibrate_ambient_ms),
        detector_cfg.sample_rate,
    )?;
    let ambient_rms = rms(&ambient);

    println!(
        "Now clap a few times ({} ms)...",
        config.calibrate_clap_ms
    );
    let sample = recorder.record_for(
        Duration::from_millis(config.calibrate_clap_ms),
        detector_cfg.sample_rate,
    )?;

    let mut analyzer = SpectralAnalyzer::new(detector_cfg.sample_rate, detector_cfg.block_size);
    let mut peak_rms = 0.0f32;
    let mut peak_hz = 0.0f32;
    for chunk in sample.chunks_exact(detector_cfg.block_size) {
        let level = rms(chunk);
        if level > peak_rms {
            peak_rms = level;
            peak_hz = analyzer.analyze(chunk).dominant_hz;
        }
    }

    println!(
        "Ambient RMS: {ambient_rms:.4} ({:.1} dBFS)",
        dbfs(ambient_rms)
    );
    println!("Clap peak RMS: {peak_rms:.4} ({:.1} dBFS)", dbfs(peak_rms));
    if peak_hz > 0.0 {
        println!("Loudest block dominant frequency: {peak_hz:.0} Hz");
    }
    if peak_rms <= ambient_rms {
        println!("No clap stood out above the ambient floor; try again closer to the microphone.");
        return Ok(());
    }

    // Geometric mean sits between floor and peak on the log scale.
    let recommended = (ambient_rms.max(1e-6) * peak_rms).sqrt();
    println!("Suggested gate: --threshold {recommended:.4}");
    Ok(())
}
