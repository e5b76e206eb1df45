//! Streams and tone playback
//!
//! All cpal stream construction lives here. Output and input callbacks are
//! built generically over the device's sample format, with the crate-internal
//! pipeline staying in f32 mono.
//!
//! cpal has no duplex streams, so live mode bridges a capture stream and a
//! playback stream with a bounded channel. The output side never blocks: an
//! empty channel produces silence (underrun) rather than a stall.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error};

use crate::config::Config;
use crate::device;
use crate::error::{Result, RigError};
use crate::processor::AudioProcessor;

/// Blocks buffered between the capture and playback callbacks
const CHANNEL_DEPTH: usize = 8;

/// Render a sine test tone
pub fn render_tone(freq_hz: f32, amplitude: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * freq_hz * t).sin()
        })
        .collect()
}

/// Write samples as a 16-bit mono WAV file
pub fn write_tone_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()?;
    Ok(())
}

fn stream_err(err: cpal::StreamError) {
    error!("stream error: {}", err);
}

fn build_output<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut next_sample: impl FnMut() -> f32 + Send + 'static,
    on_error: impl FnMut(cpal::StreamError) + Send + 'static,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            for frame in data.chunks_mut(channels) {
                let sample = T::from_sample(next_sample());
                for out in frame.iter_mut() {
                    *out = sample;
                }
            }
        },
        on_error,
        None,
    )?;
    Ok(stream)
}

/// Build an output stream for any supported sample format
fn build_output_any(
    device: &cpal::Device,
    format: SampleFormat,
    config: &StreamConfig,
    next_sample: impl FnMut() -> f32 + Send + 'static,
    on_error: impl FnMut(cpal::StreamError) + Send + 'static,
) -> Result<Stream> {
    match format {
        SampleFormat::F32 => build_output::<f32>(device, config, next_sample, on_error),
        SampleFormat::I16 => build_output::<i16>(device, config, next_sample, on_error),
        SampleFormat::U16 => build_output::<u16>(device, config, next_sample, on_error),
        other => Err(RigError::UnsupportedSampleFormat {
            format: format!("{:?}", other),
        }),
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut on_sample: impl FnMut(f32) + Send + 'static,
) -> Result<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _| {
            // Mono pipeline: channel 0 only
            for frame in data.chunks(channels) {
                on_sample(f32::from_sample(frame[0]));
            }
        },
        stream_err,
        None,
    )?;
    Ok(stream)
}

fn build_input_any(
    device: &cpal::Device,
    format: SampleFormat,
    config: &StreamConfig,
    on_sample: impl FnMut(f32) + Send + 'static,
) -> Result<Stream> {
    match format {
        SampleFormat::F32 => build_input::<f32>(device, config, on_sample),
        SampleFormat::I16 => build_input::<i16>(device, config, on_sample),
        SampleFormat::U16 => build_input::<u16>(device, config, on_sample),
        other => Err(RigError::UnsupportedSampleFormat {
            format: format!("{:?}", other),
        }),
    }
}

/// Poll until playback drains, the stream reports an error, or the deadline
/// passes
///
/// The error callback only sets a flag; this is where a dead stream turns
/// into a hard error instead of an endless wait.
fn wait_for_drain(
    position: &AtomicUsize,
    total: usize,
    failed: &AtomicBool,
    deadline: Instant,
) -> Result<()> {
    while position.load(Ordering::Relaxed) < total {
        if failed.load(Ordering::Relaxed) {
            return Err(RigError::StreamPlay(
                "output stream failed during playback".to_string(),
            ));
        }
        if Instant::now() >= deadline {
            return Err(RigError::StreamPlay(
                "playback did not complete in time".to_string(),
            ));
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    Ok(())
}

/// Play a mono sample buffer on a device, blocking until complete
pub fn play_samples(device: &cpal::Device, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
    let default_config = device.default_output_config()?;
    let config = StreamConfig {
        channels: default_config.channels(),
        sample_rate: SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let total = samples.len();
    let samples = Arc::new(samples);
    let position = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicBool::new(false));

    let cb_samples = Arc::clone(&samples);
    let cb_position = Arc::clone(&position);
    let cb_failed = Arc::clone(&failed);
    let stream = build_output_any(
        device,
        default_config.sample_format(),
        &config,
        move || {
            let pos = cb_position.fetch_add(1, Ordering::Relaxed);
            cb_samples.get(pos).copied().unwrap_or(0.0)
        },
        move |err| {
            error!("stream error: {}", err);
            cb_failed.store(true, Ordering::Relaxed);
        },
    )?;

    stream.play()?;

    // A dead stream stops advancing position, so the wait is bounded by the
    // tone length plus a generous startup margin
    let deadline = Instant::now()
        + Duration::from_secs_f64(total as f64 / sample_rate as f64)
        + Duration::from_secs(2);
    wait_for_drain(&position, total, &failed, deadline)?;

    // Let the device drain the last buffer before tearing the stream down
    std::thread::sleep(Duration::from_millis(50));
    drop(stream);

    Ok(())
}

/// What the stream probe managed to open
#[derive(Debug, Clone)]
pub struct StreamProbe {
    pub input_device: String,
    pub output_device: String,
    pub sample_rate: u32,
    pub buffer_size: usize,
}

/// Build and start an input and an output stream at the configured rate and
/// buffer size, then tear both down
///
/// No audio is routed between them; this only verifies that the devices
/// accept the configuration live mode will use.
pub fn build_probe_streams(config: &Config) -> Result<StreamProbe> {
    let input_device = device::resolve_input(config)?;
    let output_device = device::resolve_output(config)?;

    let input_name = input_device.name()?;
    let output_name = output_device.name()?;

    let stream_config = StreamConfig {
        channels: 1,
        sample_rate: SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(config.buffer_size() as u32),
    };

    let input_format = input_device.default_input_config()?.sample_format();
    let output_format = output_device.default_output_config()?.sample_format();

    let input_stream = build_input_any(&input_device, input_format, &stream_config, |_| {})?;
    let output_stream =
        build_output_any(&output_device, output_format, &stream_config, || 0.0, stream_err)?;

    input_stream.play()?;
    output_stream.play()?;

    debug!(
        "probe streams up: {} -> {} at {} Hz / {} frames",
        input_name,
        output_name,
        config.sample_rate,
        config.buffer_size()
    );

    drop(input_stream);
    drop(output_stream);

    Ok(StreamProbe {
        input_device: input_name,
        output_device: output_name,
        sample_rate: config.sample_rate,
        buffer_size: config.buffer_size(),
    })
}

/// Live audio session
///
/// Holds both streams; dropping the session stops audio. Not `Send` (cpal
/// streams are platform handles), so keep it on the thread that started it.
pub struct LiveAudio {
    processor: Arc<Mutex<AudioProcessor>>,
    _input: Stream,
    _output: Stream,
}

impl LiveAudio {
    /// Stop live audio
    pub fn stop(self) {
        // Streams close on drop
        if let Ok(mut proc) = self.processor.lock() {
            proc.set_running(false);
        }
    }
}

/// Start live mode: capture, process through the shared processor, play back
pub fn run(processor: Arc<Mutex<AudioProcessor>>, config: &Config) -> Result<LiveAudio> {
    let input_device = device::resolve_input(config)?;
    let output_device = device::resolve_output(config)?;

    let stream_config = StreamConfig {
        channels: 1,
        sample_rate: SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(config.buffer_size() as u32),
    };

    let input_format = input_device.default_input_config()?.sample_format();
    let output_format = output_device.default_output_config()?.sample_format();

    let chunk = config.buffer_size();
    let (tx, rx): (Sender<Vec<f32>>, Receiver<Vec<f32>>) = bounded(CHANNEL_DEPTH);

    // Capture side: accumulate chunk-sized blocks, drop blocks when the
    // output side falls behind rather than blocking the callback
    let mut pending = Vec::with_capacity(chunk);
    let input_stream = build_input_any(&input_device, input_format, &stream_config, move |sample| {
        pending.push(sample);
        if pending.len() == chunk {
            let block = std::mem::replace(&mut pending, Vec::with_capacity(chunk));
            if tx.try_send(block).is_err() {
                debug!("live audio overrun, block dropped");
            }
        }
    })?;

    // Playback side: pull blocks, run them through the processor, emit
    // silence on underrun
    let cb_processor = Arc::clone(&processor);
    let mut queue: VecDeque<f32> = VecDeque::new();
    let output_stream = build_output_any(
        &output_device,
        output_format,
        &stream_config,
        move || {
            if queue.is_empty() {
                if let Ok(mut block) = rx.try_recv() {
                    if let Ok(mut proc) = cb_processor.lock() {
                        proc.process_block(&mut block);
                    }
                    queue.extend(block);
                }
            }
            queue.pop_front().unwrap_or(0.0)
        },
        stream_err,
    )?;

    input_stream.play()?;
    output_stream.play()?;

    if let Ok(mut proc) = processor.lock() {
        proc.set_running(true);
    }

    Ok(LiveAudio {
        processor,
        _input: input_stream,
        _output: output_stream,
    })
}
