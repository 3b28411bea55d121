//! Physical input device acquisition

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use evdev::Device;

/// Information about an input device
#[derive(Debug)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub vendor: u16,
    pub product: u16,
}

impl DeviceInfo {
    pub fn from_device(path: &Path, device: &Device) -> Self {
        let id = device.input_id();
        Self {
            path: path.to_path_buf(),
            name: device.name().unwrap_or("Unknown").to_string(),
            vendor: id.vendor(),
            product: id.product(),
        }
    }

    /// Get vendor:product string (e.g., "3434:0361")
    pub fn vendor_product(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor, self.product)
    }
}

/// Open the evdev device at `path`.
pub fn open_device(path: &Path) -> Result<Device> {
    Device::open(path).with_context(|| format!("Failed to open device at {}", path.display()))
}

/// Check if a device is a keyboard
pub fn is_keyboard(device: &Device) -> bool {
    device
        .supported_events()
        .contains(evdev::EventType::KEY)
        && device
            .supported_keys()
            .map(|keys| keys.contains(evdev::Key::KEY_SPACE))
            .unwrap_or(false)
}

/// Grab a device for exclusive access
pub fn grab_device(device: &mut Device, info: &DeviceInfo) -> Result<()> {
    device.grab().with_context(|| {
        format!(
            "Failed to grab device '{}' for exclusive access. \
             Is another application using this device?",
            info.name
        )
    })?;

    tracing::debug!("Successfully grabbed device: {}", info.name);
    Ok(())
}
