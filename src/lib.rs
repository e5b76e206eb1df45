//! rigcheck - Guitar Rig Diagnostics and Delay Effects
//!
//! Tooling for a USB guitar interface rig (a Raspberry Pi driving a
//! Focusrite Scarlett 2i2):
//! - a diagnostic harness that probes devices, configuration, the effects
//!   processor, stream creation, and playback, and prints pass/fail results
//! - a small delay-effects runtime that the harness exercises and that can
//!   run live over the interface
//!
//! The processing pipeline is mono f32 throughout; stereo effects fold back
//! down at the pipeline boundary.

pub mod audio;
pub mod cli;
pub mod config;
pub mod device;
pub mod diag;
pub mod dsp;
pub mod error;
pub mod processor;

pub use config::Config;
pub use diag::{CheckOutcome, DiagReport};
pub use error::{Result, RigError};
pub use processor::{AudioProcessor, PerfStats, ProcessorStatus};
