//! Runtime configuration
//!
//! Defaults mirror the hardware rig this crate targets: a Raspberry Pi with a
//! Focusrite Scarlett 2i2 on USB, running at 48 kHz. The Pi gets a larger
//! processing buffer because small buffers overflow under load there.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};

/// Path whose existence identifies a Raspberry Pi
const PI_MODEL_PATH: &str = "/sys/firmware/devicetree/base/model";

/// Runtime configuration for the audio rig
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Capture chunk size in frames
    pub chunk_size: usize,
    /// Explicit input device name (auto-detect when None)
    pub input_device: Option<String>,
    /// Explicit output device name (auto-detect when None)
    pub output_device: Option<String>,
    /// Minimum confidence before a chord detection is accepted
    pub min_chord_confidence: f32,
    /// Seconds a detected chord is held before re-triggering
    pub chord_hold_time_secs: f32,
    /// Default arpeggio tempo in BPM
    pub default_tempo: f32,
    /// Default arpeggio pattern name
    pub default_pattern: String,
    /// Default synth voice name
    pub default_synth: String,
    /// Running on a Raspberry Pi (detected, not configurable)
    #[serde(skip)]
    pub is_pi: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            chunk_size: 1024,
            input_device: None,
            output_device: None,
            min_chord_confidence: 0.6,
            chord_hold_time_secs: 0.5,
            default_tempo: 120.0,
            default_pattern: "up".to_string(),
            default_synth: "saw".to_string(),
            is_pi: Path::new(PI_MODEL_PATH).exists(),
        }
    }
}

impl Config {
    /// Create a configuration with built-in defaults and platform detection
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file, falling back to defaults for
    /// missing fields
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents)?;
        config.is_pi = Path::new(PI_MODEL_PATH).exists();
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values that would make stream setup nonsensical
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(RigError::InvalidConfig {
                reason: "sample_rate must be non-zero".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(RigError::InvalidConfig {
                reason: "chunk_size must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Processing buffer size in frames for this platform
    ///
    /// The Pi needs ~21 ms of buffer for stability; elsewhere 256 frames
    /// (~5.3 ms at 48 kHz) keeps latency low.
    pub fn buffer_size(&self) -> usize {
        if self.is_pi {
            1024
        } else {
            256
        }
    }

    /// Buffer latency in milliseconds implied by `buffer_size`
    pub fn buffer_latency_ms(&self) -> f64 {
        self.buffer_size() as f64 / self.sample_rate as f64 * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.default_tempo, 120.0);
        assert_eq!(config.default_pattern, "up");
        assert_eq!(config.default_synth, "saw");
        assert!(config.input_device.is_none());
    }

    #[test]
    fn test_buffer_size_per_platform() {
        let mut config = Config::new();
        config.is_pi = false;
        assert_eq!(config.buffer_size(), 256);
        config.is_pi = true;
        assert_eq!(config.buffer_size(), 1024);
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"sample_rate": 44100}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.sample_rate, 44_100);
        // Unspecified fields fall back to defaults
        assert_eq!(config.chunk_size, 1024);
    }

    #[test]
    fn test_load_rejects_zero_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"sample_rate": 0}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_load_rejects_zero_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"chunk_size": 0}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::new();
        config.default_tempo = 96.0;
        config.output_device = Some("Scarlett 2i2 USB".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.default_tempo, 96.0);
        assert_eq!(loaded.output_device.as_deref(), Some("Scarlett 2i2 USB"));
    }
}
