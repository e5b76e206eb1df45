//! Error handling for rigcheck
//!
//! Backend (cpal) errors are converted into string-carrying variants so the
//! rest of the crate never has to name cpal types in its signatures.

use thiserror::Error;

/// Result type alias for rigcheck operations
pub type Result<T> = std::result::Result<T, RigError>;

/// Main error type for rigcheck operations
#[derive(Error, Debug)]
pub enum RigError {
    // Device Errors
    #[error("No output device available")]
    NoOutputDevice,

    #[error("No input device available")]
    NoInputDevice,

    #[error("Audio device not found: {name}")]
    DeviceNotFound { name: String },

    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),

    // Stream Errors
    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    #[error("Failed to start audio stream: {0}")]
    StreamPlay(String),

    #[error("Failed to query stream config: {0}")]
    StreamConfig(String),

    #[error("Unsupported sample format: {format}")]
    UnsupportedSampleFormat { format: String },

    // Processor Errors
    #[error("Unknown effect: {name}")]
    UnknownEffect { name: String },

    #[error("Effect is not active: {name}")]
    EffectNotActive { name: String },

    #[error("Unknown parameter '{param}' for effect '{effect}'")]
    UnknownParameter { effect: String, param: String },

    // Config Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV write error: {0}")]
    Wav(String),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RigError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            RigError::NoOutputDevice => "NO_OUTPUT_DEVICE",
            RigError::NoInputDevice => "NO_INPUT_DEVICE",
            RigError::DeviceNotFound { .. } => "DEVICE_NOT_FOUND",
            RigError::EnumerationFailed(_) => "ENUMERATION_FAILED",
            RigError::StreamBuild(_) => "STREAM_BUILD",
            RigError::StreamPlay(_) => "STREAM_PLAY",
            RigError::StreamConfig(_) => "STREAM_CONFIG",
            RigError::UnsupportedSampleFormat { .. } => "UNSUPPORTED_SAMPLE_FORMAT",
            RigError::UnknownEffect { .. } => "UNKNOWN_EFFECT",
            RigError::EffectNotActive { .. } => "EFFECT_NOT_ACTIVE",
            RigError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            RigError::InvalidConfig { .. } => "INVALID_CONFIG",
            RigError::Io(_) => "IO_ERROR",
            RigError::Wav(_) => "WAV_ERROR",
            RigError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Recovery suggestions shown by the diagnostic harness on failure
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RigError::NoOutputDevice | RigError::NoInputDevice | RigError::DeviceNotFound { .. } => vec![
                "Check the USB connection to the audio interface",
                "Verify the device is powered on",
                "Make sure no other application is using the device",
            ],
            RigError::EnumerationFailed(_) => vec![
                "The audio backend could not list devices",
                "On Linux, check that ALSA is configured and the user is in the audio group",
            ],
            RigError::StreamBuild(_) | RigError::StreamConfig(_) => vec![
                "The device may not support the requested sample rate or buffer size",
                "On Linux, ALSA period/buffer settings may conflict with the request",
                "Try closing other audio applications and re-running",
            ],
            RigError::StreamPlay(_) => vec![
                "Check monitor output settings on the interface",
                "The device may have been disconnected mid-test",
            ],
            RigError::UnknownEffect { .. } => vec![
                "Known effects: basic, tempo, stereo",
            ],
            _ => vec![],
        }
    }
}

impl From<cpal::DevicesError> for RigError {
    fn from(err: cpal::DevicesError) -> Self {
        RigError::EnumerationFailed(err.to_string())
    }
}

impl From<cpal::DeviceNameError> for RigError {
    fn from(err: cpal::DeviceNameError) -> Self {
        RigError::EnumerationFailed(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for RigError {
    fn from(err: cpal::BuildStreamError) -> Self {
        RigError::StreamBuild(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for RigError {
    fn from(err: cpal::PlayStreamError) -> Self {
        RigError::StreamPlay(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for RigError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        RigError::StreamConfig(err.to_string())
    }
}

impl From<hound::Error> for RigError {
    fn from(err: hound::Error) -> Self {
        RigError::Wav(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = RigError::UnknownEffect {
            name: "flanger".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_EFFECT");
    }

    #[test]
    fn test_device_errors_carry_hints() {
        assert!(!RigError::NoOutputDevice.recovery_suggestions().is_empty());
        assert!(!RigError::StreamBuild("boom".into())
            .recovery_suggestions()
            .is_empty());
    }
}
