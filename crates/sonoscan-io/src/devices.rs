//! Device discovery through the default cpal host.

use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::{Error, Result};

/// Fallback when a device does not report a default config.
const FALLBACK_SAMPLE_RATE: u32 = 48000;

/// Device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device accepts input.
    pub is_input: bool,
    /// Whether the device can play output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// List all devices. Devices offering both directions appear once.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDevice> = Vec::new();

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                let default_sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(FALLBACK_SAMPLE_RATE);
                devices.push(AudioDevice {
                    name,
                    is_input: device.default_input_config().is_ok(),
                    is_output: true,
                    default_sample_rate,
                });
            }
        }
    }

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                let default_sample_rate = device
                    .default_input_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(FALLBACK_SAMPLE_RATE);
                devices.push(AudioDevice {
                    name,
                    is_input: true,
                    is_output: false,
                    default_sample_rate,
                });
            }
        }
    }

    tracing::debug!(count = devices.len(), "enumerated audio devices");
    Ok(devices)
}

/// The system default output device.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host.default_output_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            is_input: false,
            is_output: true,
            default_sample_rate: d
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(FALLBACK_SAMPLE_RATE),
        })
    }))
}

/// First output device whose name contains `search` (case-insensitive).
pub fn find_output_device(search: &str) -> Result<AudioDevice> {
    pick_output(&list_devices()?, search)
}

/// Output device by zero-based index among output devices.
pub fn find_device_by_index(index: usize) -> Result<AudioDevice> {
    let devices = list_devices()?;
    let outputs: Vec<&AudioDevice> = devices.iter().filter(|d| d.is_output).collect();
    outputs.get(index).map(|d| (*d).clone()).ok_or_else(|| {
        Error::DeviceNotFound(format!(
            "output device index {} (only {} devices available)",
            index,
            outputs.len()
        ))
    })
}

fn pick_output(devices: &[AudioDevice], search: &str) -> Result<AudioDevice> {
    let search_lower = search.to_lowercase();
    devices
        .iter()
        .find(|d| d.is_output && d.name.to_lowercase().contains(&search_lower))
        .cloned()
        .ok_or_else(|| Error::DeviceNotFound(format!("no output device matching '{}'", search)))
}
