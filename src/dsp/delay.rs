//! Delay effects
//!
//! Three variants share one circular-buffer delay line:
//! - `BasicDelay`: single mono tap
//! - `TempoSyncedDelay`: mono tap whose time derives from BPM and a division
//! - `StereoDelay`: independent left/right taps fed from the mono input

use crate::dsp::effect::Effect;

/// Delay time bounds in seconds (1 ms to 2 s)
const MIN_DELAY_SECS: f32 = 0.001;
const MAX_DELAY_SECS: f32 = 2.0;
/// Feedback cap; never 1.0 to prevent runaway feedback
const MAX_FEEDBACK: f32 = 0.95;
/// Tempo bounds in BPM
const MIN_BPM: f32 = 40.0;
const MAX_BPM: f32 = 300.0;

/// Circular-buffer delay line with feedback
#[derive(Debug, Clone)]
struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    sample_rate: f32,
    delay_secs: f32,
}

impl DelayLine {
    fn new(delay_secs: f32) -> Self {
        let mut line = Self {
            buffer: Vec::new(),
            write_pos: 0,
            delay_samples: 0,
            sample_rate: 48_000.0,
            delay_secs: delay_secs.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS),
        };
        line.resize();
        line
    }

    fn set_delay_secs(&mut self, secs: f32) {
        self.delay_secs = secs.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS);
        self.resize();
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate as f32;
        self.resize();
    }

    fn resize(&mut self) {
        self.delay_samples = ((self.delay_secs * self.sample_rate) as usize).max(1);
        // Buffer sized for the maximum so a time change never reallocates
        let capacity = ((MAX_DELAY_SECS * self.sample_rate) as usize).max(1) + 1;
        if self.buffer.len() != capacity {
            self.buffer = vec![0.0; capacity];
            self.write_pos = 0;
        }
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Push one input sample, returning the delayed sample
    fn tick(&mut self, input: f32, feedback: f32) -> f32 {
        let read_pos =
            (self.write_pos + self.buffer.len() - self.delay_samples) % self.buffer.len();
        let delayed = self.buffer[read_pos];
        self.buffer[self.write_pos] = input + delayed * feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        delayed
    }
}

/// Single-tap mono delay
#[derive(Debug, Clone)]
pub struct BasicDelay {
    line: DelayLine,
    feedback: f32,
    wet_mix: f32,
}

impl BasicDelay {
    /// Create a delay with the given time in seconds
    pub fn new(delay_secs: f32) -> Self {
        Self {
            line: DelayLine::new(delay_secs),
            feedback: 0.3,
            wet_mix: 0.5,
        }
    }

    pub fn set_delay_time(&mut self, secs: f32) {
        self.line.set_delay_secs(secs);
    }

    pub fn delay_time(&self) -> f32 {
        self.line.delay_secs
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_wet_mix(&mut self, wet: f32) {
        self.wet_mix = wet.clamp(0.0, 1.0);
    }

    pub fn wet_mix(&self) -> f32 {
        self.wet_mix
    }
}

impl Default for BasicDelay {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl Effect for BasicDelay {
    fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let delayed = self.line.tick(*sample, self.feedback);
            *sample = *sample * (1.0 - self.wet_mix) + delayed * self.wet_mix;
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.line.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.line.clear();
    }

    fn name(&self) -> &'static str {
        "basic"
    }

    fn set_param(&mut self, param: &str, value: f32) -> bool {
        match param {
            "delay_time" => self.set_delay_time(value),
            "feedback" => self.set_feedback(value),
            "wet_mix" => self.set_wet_mix(value),
            _ => return false,
        }
        true
    }
}

/// Note division for tempo-synced delay times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteDivision {
    Quarter,
    Eighth,
    DottedEighth,
    Sixteenth,
}

impl NoteDivision {
    /// Length in beats
    fn beats(self) -> f32 {
        match self {
            NoteDivision::Quarter => 1.0,
            NoteDivision::Eighth => 0.5,
            NoteDivision::DottedEighth => 0.75,
            NoteDivision::Sixteenth => 0.25,
        }
    }
}

/// Mono delay whose time follows the song tempo
#[derive(Debug, Clone)]
pub struct TempoSyncedDelay {
    inner: BasicDelay,
    bpm: f32,
    division: NoteDivision,
}

impl TempoSyncedDelay {
    pub fn new(bpm: f32) -> Self {
        let mut delay = Self {
            inner: BasicDelay::new(0.5),
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            division: NoteDivision::Quarter,
        };
        delay.apply_tempo();
        delay
    }

    /// Recompute the delay time from a new tempo
    pub fn sync_to_tempo(&mut self, bpm: f32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.apply_tempo();
    }

    pub fn set_division(&mut self, division: NoteDivision) {
        self.division = division;
        self.apply_tempo();
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn delay_time(&self) -> f32 {
        self.inner.delay_time()
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.inner.set_feedback(feedback);
    }

    pub fn set_wet_mix(&mut self, wet: f32) {
        self.inner.set_wet_mix(wet);
    }

    fn apply_tempo(&mut self) {
        let secs = 60.0 / self.bpm * self.division.beats();
        self.inner.set_delay_time(secs);
    }
}

impl Default for TempoSyncedDelay {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl Effect for TempoSyncedDelay {
    fn process(&mut self, block: &mut [f32]) {
        self.inner.process(block);
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.inner.prepare(sample_rate);
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn name(&self) -> &'static str {
        "tempo"
    }

    fn set_param(&mut self, param: &str, value: f32) -> bool {
        match param {
            "sync_tempo" => self.sync_to_tempo(value),
            "feedback" => self.set_feedback(value),
            "wet_mix" => self.set_wet_mix(value),
            _ => return false,
        }
        true
    }
}

/// Stereo delay with independent left/right times, fed from a mono input
///
/// The runtime pipeline is mono, so `process` folds the stereo pair back down
/// at equal gain. `process_to_stereo` exposes the true pair for callers with
/// a stereo output path.
#[derive(Debug, Clone)]
pub struct StereoDelay {
    left: DelayLine,
    right: DelayLine,
    feedback: f32,
    wet_mix: f32,
}

impl StereoDelay {
    pub fn new(left_secs: f32, right_secs: f32) -> Self {
        Self {
            left: DelayLine::new(left_secs),
            right: DelayLine::new(right_secs),
            feedback: 0.3,
            wet_mix: 0.5,
        }
    }

    pub fn set_left_delay(&mut self, secs: f32) {
        self.left.set_delay_secs(secs);
    }

    pub fn set_right_delay(&mut self, secs: f32) {
        self.right.set_delay_secs(secs);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    pub fn set_wet_mix(&mut self, wet: f32) {
        self.wet_mix = wet.clamp(0.0, 1.0);
    }

    /// Process a mono block into separate left and right outputs
    pub fn process_to_stereo(&mut self, block: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let mut left_out = Vec::with_capacity(block.len());
        let mut right_out = Vec::with_capacity(block.len());
        for &sample in block {
            let (l, r) = self.tick(sample);
            left_out.push(l);
            right_out.push(r);
        }
        (left_out, right_out)
    }

    fn tick(&mut self, sample: f32) -> (f32, f32) {
        let delayed_l = self.left.tick(sample, self.feedback);
        let delayed_r = self.right.tick(sample, self.feedback);
        let dry = sample * (1.0 - self.wet_mix);
        (
            dry + delayed_l * self.wet_mix,
            dry + delayed_r * self.wet_mix,
        )
    }
}

impl Default for StereoDelay {
    fn default() -> Self {
        Self::new(0.3, 0.45)
    }
}

impl Effect for StereoDelay {
    fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let (l, r) = self.tick(*sample);
            *sample = (l + r) * 0.5;
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.left.set_sample_rate(sample_rate);
        self.right.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    fn name(&self) -> &'static str {
        "stereo"
    }

    fn set_param(&mut self, param: &str, value: f32) -> bool {
        match param {
            "left_delay" => self.set_left_delay(value),
            "right_delay" => self.set_right_delay(value),
            "feedback" => self.set_feedback(value),
            "wet_mix" => self.set_wet_mix(value),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delay_produces_echo() {
        let mut delay = BasicDelay::new(0.01);
        delay.prepare(1000);
        delay.set_wet_mix(1.0);
        delay.set_feedback(0.0);

        // Impulse, then silence past the 10-sample delay
        let mut block = vec![0.0f32; 32];
        block[0] = 1.0;
        delay.process(&mut block);

        assert_relative_eq!(block[0], 0.0);
        assert_relative_eq!(block[10], 1.0);
    }

    #[test]
    fn test_feedback_clamped() {
        let mut delay = BasicDelay::default();
        delay.set_feedback(2.0);
        assert_relative_eq!(delay.feedback(), 0.95);
        delay.set_feedback(-1.0);
        assert_relative_eq!(delay.feedback(), 0.0);
    }

    #[test]
    fn test_delay_time_clamped() {
        let mut delay = BasicDelay::default();
        delay.set_delay_time(10.0);
        assert_relative_eq!(delay.delay_time(), 2.0);
        delay.set_delay_time(0.0);
        assert_relative_eq!(delay.delay_time(), 0.001);
    }

    #[test]
    fn test_dry_only_passthrough() {
        let mut delay = BasicDelay::new(0.1);
        delay.prepare(48_000);
        delay.set_wet_mix(0.0);

        let mut block: Vec<f32> = (0..64).map(|i| (i as f32 / 64.0).sin()).collect();
        let original = block.clone();
        delay.process(&mut block);

        for (got, want) in block.iter().zip(original.iter()) {
            assert_relative_eq!(*got, *want);
        }
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut delay = BasicDelay::new(0.01);
        delay.prepare(1000);
        delay.set_wet_mix(1.0);

        let mut block = vec![1.0f32; 16];
        delay.process(&mut block);
        delay.reset();

        let mut silence = vec![0.0f32; 16];
        delay.process(&mut silence);
        assert!(silence.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_tempo_sync_quarter_note() {
        let mut delay = TempoSyncedDelay::new(120.0);
        // Quarter note at 120 BPM is 0.5 s
        assert_relative_eq!(delay.delay_time(), 0.5);

        delay.sync_to_tempo(60.0);
        assert_relative_eq!(delay.delay_time(), 1.0);

        delay.set_division(NoteDivision::Eighth);
        assert_relative_eq!(delay.delay_time(), 0.5);
    }

    #[test]
    fn test_tempo_clamped() {
        let delay = TempoSyncedDelay::new(1000.0);
        assert_relative_eq!(delay.bpm(), 300.0);
        let delay = TempoSyncedDelay::new(10.0);
        assert_relative_eq!(delay.bpm(), 40.0);
    }

    #[test]
    fn test_stereo_taps_land_at_different_times() {
        let mut delay = StereoDelay::new(0.01, 0.02);
        delay.prepare(1000);
        delay.set_wet_mix(1.0);
        delay.set_feedback(0.0);

        let mut impulse = vec![0.0f32; 32];
        impulse[0] = 1.0;
        let (left, right) = delay.process_to_stereo(&impulse);

        assert_relative_eq!(left[10], 1.0);
        assert_relative_eq!(right[10], 0.0);
        assert_relative_eq!(right[20], 1.0);
    }

    #[test]
    fn test_stereo_mono_fold_is_half_sum() {
        let mut stereo = StereoDelay::new(0.01, 0.02);
        stereo.prepare(1000);
        stereo.set_wet_mix(1.0);
        stereo.set_feedback(0.0);

        let mut block = vec![0.0f32; 32];
        block[0] = 1.0;
        stereo.process(&mut block);

        // Each tap arrives alone, folded at half gain
        assert_relative_eq!(block[10], 0.5);
        assert_relative_eq!(block[20], 0.5);
    }
}
