//! DSP effects
//!
//! Mono in-place effects used by the processor's registry.

pub mod delay;
pub mod effect;

pub use delay::{BasicDelay, NoteDivision, StereoDelay, TempoSyncedDelay};
pub use effect::Effect;
