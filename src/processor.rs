//! Audio processor
//!
//! Owns the delay effect registry and the active-effect set, and processes
//! mono blocks through whatever is active. When nothing is active the block
//! passes through untouched, which keeps the guitar signal audible with zero
//! added latency beyond the buffer itself.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use log::warn;
use serde::Serialize;

use crate::config::Config;
use crate::dsp::{BasicDelay, Effect, StereoDelay, TempoSyncedDelay};
use crate::error::{Result, RigError};

/// Processing times kept for performance stats
const PERF_WINDOW: usize = 100;
/// Blocks slower than this are logged
const MAX_BLOCK_SECS: f64 = 0.010;

/// Snapshot of processor state
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorStatus {
    /// Effect targeted by parameter commands
    pub current_effect: String,
    /// Active effects, sorted by name
    pub active_effects: Vec<String>,
    /// Is live audio running?
    pub audio_running: bool,
    /// Processing buffer size in frames
    pub buffer_size: usize,
    /// Buffer latency in milliseconds
    pub latency_ms: f64,
}

/// Block-processing performance statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerfStats {
    pub average_processing_time_ms: f64,
    pub max_processing_time_ms: f64,
    pub min_processing_time_ms: f64,
    pub buffer_latency_ms: f64,
    pub total_latency_ms: f64,
    pub samples_measured: usize,
}

/// Mono effects processor
pub struct AudioProcessor {
    effects: Vec<Box<dyn Effect>>,
    active: HashSet<String>,
    current_effect: String,
    sample_rate: u32,
    buffer_size: usize,
    audio_running: bool,
    processing_times: VecDeque<f64>,
}

impl AudioProcessor {
    /// Create a processor from the runtime configuration
    pub fn new(config: &Config) -> Self {
        let mut effects: Vec<Box<dyn Effect>> = vec![
            Box::new(BasicDelay::default()),
            Box::new(TempoSyncedDelay::new(config.default_tempo)),
            Box::new(StereoDelay::default()),
        ];
        for effect in &mut effects {
            effect.prepare(config.sample_rate);
        }

        Self {
            effects,
            active: HashSet::new(),
            current_effect: "basic".to_string(),
            sample_rate: config.sample_rate,
            buffer_size: config.buffer_size(),
            audio_running: false,
            processing_times: VecDeque::with_capacity(PERF_WINDOW),
        }
    }

    /// Names of all registered effects, in processing order
    pub fn effect_names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    fn effect_mut(&mut self, name: &str) -> Result<&mut Box<dyn Effect>> {
        self.effects
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| RigError::UnknownEffect {
                name: name.to_string(),
            })
    }

    /// Set the effect targeted by parameter commands
    pub fn set_current_effect(&mut self, name: &str) -> Result<()> {
        self.effect_mut(name)?;
        self.current_effect = name.to_string();
        Ok(())
    }

    /// Activate an effect
    pub fn start_effect(&mut self, name: &str) -> Result<()> {
        self.effect_mut(name)?;
        self.active.insert(name.to_string());
        Ok(())
    }

    /// Deactivate an effect and clear its tail
    pub fn stop_effect(&mut self, name: &str) -> Result<()> {
        if !self.active.remove(name) {
            return Err(RigError::EffectNotActive {
                name: name.to_string(),
            });
        }
        self.effect_mut(name)?.reset();
        Ok(())
    }

    /// Route a named parameter to an effect
    pub fn set_delay_param(&mut self, effect: &str, param: &str, value: f32) -> Result<()> {
        let target = self.effect_mut(effect)?;
        if target.set_param(param, value) {
            Ok(())
        } else {
            Err(RigError::UnknownParameter {
                effect: effect.to_string(),
                param: param.to_string(),
            })
        }
    }

    /// Process one mono block through the active effects
    pub fn process_block(&mut self, block: &mut [f32]) {
        if block.is_empty() || self.active.is_empty() {
            // Passthrough
            return;
        }

        let start = Instant::now();

        for effect in &mut self.effects {
            if self.active.contains(effect.name()) {
                effect.process(block);
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        if self.processing_times.len() == PERF_WINDOW {
            self.processing_times.pop_front();
        }
        self.processing_times.push_back(elapsed);

        if elapsed > MAX_BLOCK_SECS {
            warn!("slow audio processing: {:.1}ms", elapsed * 1000.0);
        }
    }

    /// Mark live audio as running or stopped
    pub fn set_running(&mut self, running: bool) {
        self.audio_running = running;
    }

    /// Sample rate the effects were prepared for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Processing buffer size in frames
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Buffer latency in milliseconds
    pub fn buffer_latency_ms(&self) -> f64 {
        self.buffer_size as f64 / self.sample_rate as f64 * 1000.0
    }

    /// Snapshot of the processor state
    pub fn status(&self) -> ProcessorStatus {
        let mut active_effects: Vec<String> = self.active.iter().cloned().collect();
        active_effects.sort();
        ProcessorStatus {
            current_effect: self.current_effect.clone(),
            active_effects,
            audio_running: self.audio_running,
            buffer_size: self.buffer_size,
            latency_ms: self.buffer_latency_ms(),
        }
    }

    /// Block-processing performance statistics
    ///
    /// All-zero stats with `samples_measured == 0` mean nothing has been
    /// processed yet.
    pub fn performance(&self) -> PerfStats {
        if self.processing_times.is_empty() {
            return PerfStats {
                buffer_latency_ms: self.buffer_latency_ms(),
                ..PerfStats::default()
            };
        }

        let sum: f64 = self.processing_times.iter().sum();
        let avg = sum / self.processing_times.len() as f64;
        let max = self.processing_times.iter().cloned().fold(0.0, f64::max);
        let min = self
            .processing_times
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        let buffer_latency_ms = self.buffer_latency_ms();

        PerfStats {
            average_processing_time_ms: avg * 1000.0,
            max_processing_time_ms: max * 1000.0,
            min_processing_time_ms: min * 1000.0,
            buffer_latency_ms,
            total_latency_ms: buffer_latency_ms + avg * 1000.0,
            samples_measured: self.processing_times.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn processor() -> AudioProcessor {
        let mut config = Config::new();
        config.is_pi = false;
        AudioProcessor::new(&config)
    }

    #[test]
    fn test_registry_names() {
        let proc = processor();
        assert_eq!(proc.effect_names(), vec!["basic", "tempo", "stereo"]);
    }

    #[test]
    fn test_start_stop_effect() {
        let mut proc = processor();

        proc.start_effect("basic").unwrap();
        proc.start_effect("tempo").unwrap();
        assert_eq!(proc.status().active_effects, vec!["basic", "tempo"]);

        proc.stop_effect("tempo").unwrap();
        assert_eq!(proc.status().active_effects, vec!["basic"]);
    }

    #[test]
    fn test_unknown_effect_rejected() {
        let mut proc = processor();
        let err = proc.start_effect("flanger").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_EFFECT");
    }

    #[test]
    fn test_stop_inactive_effect_rejected() {
        let mut proc = processor();
        let err = proc.stop_effect("basic").unwrap_err();
        assert_eq!(err.error_code(), "EFFECT_NOT_ACTIVE");
    }

    #[test]
    fn test_passthrough_when_idle() {
        let mut proc = processor();
        let mut block: Vec<f32> = (0..256).map(|i| (i as f32 * 0.01).sin()).collect();
        let original = block.clone();

        proc.process_block(&mut block);

        assert_eq!(block, original);
        assert_eq!(proc.performance().samples_measured, 0);
    }

    #[test]
    fn test_active_effect_modifies_audio() {
        let mut proc = processor();
        proc.start_effect("basic").unwrap();
        proc.set_delay_param("basic", "wet_mix", 1.0).unwrap();

        let mut block = vec![0.0f32; 1024];
        block[0] = 1.0;
        proc.process_block(&mut block);

        // Fully wet delay removes the impulse from position 0
        assert_eq!(block[0], 0.0);
        assert_eq!(proc.performance().samples_measured, 1);
    }

    #[test]
    fn test_param_routing() {
        let mut proc = processor();
        proc.set_delay_param("tempo", "sync_tempo", 90.0).unwrap();
        proc.set_delay_param("stereo", "left_delay", 0.2).unwrap();

        let err = proc
            .set_delay_param("basic", "sync_tempo", 90.0)
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");

        let err = proc.set_delay_param("tape", "feedback", 0.4).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_EFFECT");
    }

    #[test]
    fn test_set_current_effect() {
        let mut proc = processor();
        assert_eq!(proc.status().current_effect, "basic");

        proc.set_current_effect("stereo").unwrap();
        assert_eq!(proc.status().current_effect, "stereo");

        assert!(proc.set_current_effect("tape").is_err());
    }

    #[test]
    fn test_status_reports_buffer() {
        let proc = processor();
        let status = proc.status();
        assert_eq!(status.buffer_size, 256);
        assert!((status.latency_ms - 256.0 / 48_000.0 * 1000.0).abs() < 1e-9);
        assert!(!status.audio_running);
    }

    #[test]
    fn test_perf_window_caps_at_100() {
        let mut proc = processor();
        proc.start_effect("basic").unwrap();

        let mut block = vec![0.1f32; 64];
        for _ in 0..150 {
            proc.process_block(&mut block);
        }
        assert_eq!(proc.performance().samples_measured, 100);
    }
}
