//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;

use crate::audio;
use crate::config::Config;
use crate::device;
use crate::diag;
use crate::error::Result;
use crate::processor::AudioProcessor;

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::new()),
    }
}

/// Run the diagnostic sequence; returns whether every non-skipped check passed
pub fn doctor(config: Option<&Path>, no_playback: bool) -> Result<bool> {
    let report = diag::run_diagnostics(config, !no_playback);
    Ok(report.all_passed())
}

/// List all audio devices of the default host
pub fn devices() -> Result<()> {
    let devices = device::list_devices()?;

    println!("Found {} audio devices:", devices.len());
    for (i, dev) in devices.iter().enumerate() {
        let mut flags = String::new();
        if dev.is_default_input {
            flags.push_str(" [default in]");
        }
        if dev.is_default_output {
            flags.push_str(" [default out]");
        }
        println!("  {}: {}{}", i, dev.name, flags);
        println!(
            "     inputs: {}, outputs: {}, default rate: {} Hz",
            dev.input_channels, dev.output_channels, dev.default_sample_rate
        );
    }

    let matched = device::find_interface(&devices);
    match (matched.input, matched.output) {
        (Some(input), Some(output)) if input == output => {
            println!("Interface detected: {}", input)
        }
        (Some(input), Some(output)) => {
            println!("Interface detected: {} (in), {} (out)", input, output)
        }
        (Some(input), None) => println!("Interface input only: {}", input),
        (None, Some(output)) => println!("Interface output only: {}", output),
        (None, None) => println!("No Scarlett/Focusrite interface found"),
    }

    Ok(())
}

/// Play a test tone, or export it as a WAV file
pub fn tone(
    config: Option<&Path>,
    freq: f32,
    duration: f32,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let samples = audio::render_tone(freq, 0.3, duration, config.sample_rate);

    match output {
        Some(path) => {
            audio::write_tone_wav(path, &samples, config.sample_rate)?;
            println!(
                "Wrote {:.1} Hz tone ({:.1}s) to {}",
                freq,
                duration,
                path.display()
            );
        }
        None => {
            let device = device::resolve_output(&config)?;
            println!("Playing {:.1} Hz tone for {:.1}s...", freq, duration);
            audio::play_samples(&device, samples, config.sample_rate)?;
            println!("Playback complete");
        }
    }

    Ok(())
}

/// Initialize the processor and print status and performance
pub fn status(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let processor = AudioProcessor::new(&config);

    let status = processor.status();
    println!("Processor status:");
    println!("  current effect : {}", status.current_effect);
    println!("  active effects : {:?}", status.active_effects);
    println!("  audio running  : {}", status.audio_running);
    println!("  buffer size    : {} frames", status.buffer_size);
    println!("  latency        : {:.1} ms", status.latency_ms);

    let perf = processor.performance();
    println!("Performance:");
    if perf.samples_measured == 0 {
        println!("  no blocks processed yet");
    } else {
        println!(
            "  processing time: avg {:.3} ms, max {:.3} ms, min {:.3} ms",
            perf.average_processing_time_ms,
            perf.max_processing_time_ms,
            perf.min_processing_time_ms
        );
        println!("  total latency  : {:.1} ms", perf.total_latency_ms);
    }
    println!("Registered effects: {:?}", processor.effect_names());

    Ok(())
}

/// Start live audio and hold it until the process is killed
pub fn run(config: Option<&Path>, effects: &[String]) -> Result<()> {
    let config = load_config(config)?;
    let processor = Arc::new(Mutex::new(AudioProcessor::new(&config)));

    {
        let mut proc = processor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for effect in effects {
            proc.start_effect(effect)?;
            println!("{} started", effect);
        }
    }

    let session = audio::run(Arc::clone(&processor), &config)?;
    info!(
        "live audio started at {} Hz, {} frame buffer",
        config.sample_rate,
        config.buffer_size()
    );
    println!(
        "Live audio running ({} Hz, {:.1} ms buffer). Press Ctrl-C to stop.",
        config.sample_rate,
        config.buffer_latency_ms()
    );

    // Hold the streams open; the process exits on signal
    loop {
        std::thread::sleep(Duration::from_millis(100));
        let _ = &session;
    }
}
