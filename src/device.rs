//! Audio device enumeration and interface detection
//!
//! Enumeration tolerates per-device probe failures: a device that refuses a
//! config query is still listed, with zeroed capabilities, so one broken ALSA
//! plugin does not hide the rest of the system.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, RigError};

/// Name fragments that identify the target USB interface
const INTERFACE_KEYWORDS: &[&str] = &["scarlett", "focusrite", "2i2"];

/// Information about one audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (human-readable)
    pub name: String,
    /// Number of input channels (0 if the device has no capture side)
    pub input_channels: u16,
    /// Number of output channels (0 if the device has no playback side)
    pub output_channels: u16,
    /// Default sample rate in Hz (0 if no config could be queried)
    pub default_sample_rate: u32,
    /// Is this the host's default input device?
    pub is_default_input: bool,
    /// Is this the host's default output device?
    pub is_default_output: bool,
}

impl DeviceInfo {
    /// Does the device name match the target interface?
    pub fn is_interface(&self) -> bool {
        let name = self.name.to_lowercase();
        INTERFACE_KEYWORDS.iter().any(|kw| name.contains(kw))
    }
}

/// The interface's input and output sides, matched independently
///
/// On ALSA the Scarlett often shows up as separate capture and playback
/// devices, so either side may be found without the other.
#[derive(Debug, Clone, Default)]
pub struct InterfaceMatch {
    /// Name of the input-capable interface device, if found
    pub input: Option<String>,
    /// Name of the output-capable interface device, if found
    pub output: Option<String>,
}

impl InterfaceMatch {
    /// Both sides of the interface were found
    pub fn is_complete(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }
}

/// Enumerate all devices of the default host
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let host = cpal::default_host();

    let default_input_name = host
        .default_input_device()
        .and_then(|d| d.name().ok());
    let default_output_name = host
        .default_output_device()
        .and_then(|d| d.name().ok());

    let mut device_list = Vec::new();

    for device in host.devices()? {
        let name = match device.name() {
            Ok(name) => name,
            Err(_) => continue,
        };

        let (input_channels, in_rate) = match device.default_input_config() {
            Ok(config) => (config.channels(), config.sample_rate().0),
            Err(_) => (0, 0),
        };
        let (output_channels, out_rate) = match device.default_output_config() {
            Ok(config) => (config.channels(), config.sample_rate().0),
            Err(_) => (0, 0),
        };

        device_list.push(DeviceInfo {
            is_default_input: Some(&name) == default_input_name.as_ref(),
            is_default_output: Some(&name) == default_output_name.as_ref(),
            name,
            input_channels,
            output_channels,
            default_sample_rate: out_rate.max(in_rate),
        });
    }

    Ok(device_list)
}

/// Scan an enumeration result for the target interface
pub fn find_interface(devices: &[DeviceInfo]) -> InterfaceMatch {
    let mut matched = InterfaceMatch::default();

    for device in devices {
        if !device.is_interface() {
            continue;
        }
        if device.input_channels > 0 && matched.input.is_none() {
            matched.input = Some(device.name.clone());
        }
        if device.output_channels > 0 && matched.output.is_none() {
            matched.output = Some(device.name.clone());
        }
    }

    matched
}

/// Find a host device by exact name
fn device_by_name(name: &str, output: bool) -> Result<cpal::Device> {
    let host = cpal::default_host();
    for device in host.devices()? {
        if device.name().map(|n| n == name).unwrap_or(false) {
            let usable = if output {
                device.default_output_config().is_ok()
            } else {
                device.default_input_config().is_ok()
            };
            if usable {
                return Ok(device);
            }
        }
    }
    Err(RigError::DeviceNotFound {
        name: name.to_string(),
    })
}

/// Resolve the output device: config override, then detected interface, then
/// the host default
pub fn resolve_output(config: &Config) -> Result<cpal::Device> {
    if let Some(name) = &config.output_device {
        return device_by_name(name, true);
    }

    let devices = list_devices()?;
    if let Some(name) = find_interface(&devices).output {
        return device_by_name(&name, true);
    }

    cpal::default_host()
        .default_output_device()
        .ok_or(RigError::NoOutputDevice)
}

/// Resolve the input device: config override, then detected interface, then
/// the host default
pub fn resolve_input(config: &Config) -> Result<cpal::Device> {
    if let Some(name) = &config.input_device {
        return device_by_name(name, false);
    }

    let devices = list_devices()?;
    if let Some(name) = find_interface(&devices).input {
        return device_by_name(&name, false);
    }

    cpal::default_host()
        .default_input_device()
        .ok_or(RigError::NoInputDevice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, inputs: u16, outputs: u16) -> DeviceInfo {
        DeviceInfo {
            name: name.to_string(),
            input_channels: inputs,
            output_channels: outputs,
            default_sample_rate: 48_000,
            is_default_input: false,
            is_default_output: false,
        }
    }

    #[test]
    fn test_interface_name_matching() {
        assert!(info("Scarlett 2i2 USB", 2, 2).is_interface());
        assert!(info("Focusrite USB Audio", 2, 2).is_interface());
        assert!(info("USB Audio 2i2", 2, 2).is_interface());
        assert!(!info("HDA Intel PCH", 2, 2).is_interface());
    }

    #[test]
    fn test_find_interface_split_devices() {
        // ALSA-style split: capture and playback are separate devices
        let devices = vec![
            info("HDA Intel PCH", 0, 2),
            info("Scarlett 2i2 USB (capture)", 2, 0),
            info("Scarlett 2i2 USB (playback)", 0, 2),
        ];
        let matched = find_interface(&devices);
        assert_eq!(matched.input.as_deref(), Some("Scarlett 2i2 USB (capture)"));
        assert_eq!(
            matched.output.as_deref(),
            Some("Scarlett 2i2 USB (playback)")
        );
        assert!(matched.is_complete());
    }

    #[test]
    fn test_find_interface_output_only() {
        let devices = vec![info("Focusrite USB", 0, 2), info("HDA Intel PCH", 2, 2)];
        let matched = find_interface(&devices);
        assert!(matched.input.is_none());
        assert_eq!(matched.output.as_deref(), Some("Focusrite USB"));
        assert!(!matched.is_complete());
    }

    #[test]
    fn test_find_interface_none() {
        let devices = vec![info("HDA Intel PCH", 2, 2)];
        let matched = find_interface(&devices);
        assert!(matched.input.is_none());
        assert!(matched.output.is_none());
    }
}
