//! Effect trait definition
//!
//! Base trait for the mono effects pipeline. Effects process blocks in-place
//! so the audio callback never allocates.

/// Base trait for all effects
pub trait Effect: Send {
    /// Process a mono block of samples in-place
    fn process(&mut self, block: &mut [f32]);

    /// Prepare the effect for processing at the given sample rate
    ///
    /// Called before processing starts and whenever the sample rate changes.
    fn prepare(&mut self, sample_rate: u32);

    /// Clear internal state (delay lines, filter history)
    fn reset(&mut self);

    /// Effect type identifier, as used in the processor registry
    fn name(&self) -> &'static str;

    /// Apply a named parameter, returning false when the effect does not
    /// support it
    fn set_param(&mut self, param: &str, value: f32) -> bool {
        let _ = (param, value);
        false
    }
}
