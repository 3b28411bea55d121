//! Virtual device injection via uinput
//!
//! The virtual keyboard mirrors the key capabilities of the grabbed device,
//! plus every key the SpaceFN layer can produce, so that anything read from
//! the physical keyboard can be written back out unchanged.

use anyhow::{Context, Result};
use evdev::{uinput::VirtualDeviceBuilder, AttributeSet, Device, EventType, InputEvent, Key};
use spacefn_core::{output_keys, EventSink, KeyEvent, SinkError};

/// A virtual keyboard for injecting events
pub struct VirtualKeyboard {
    device: evdev::uinput::VirtualDevice,
}

impl VirtualKeyboard {
    /// Create a virtual keyboard able to emit every key `source` supports.
    pub fn from_device(name: &str, source: &Device) -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();

        if let Some(supported) = source.supported_keys() {
            for key in supported.iter() {
                keys.insert(key);
            }
        }
        for key in output_keys() {
            keys.insert(key);
        }

        let device = VirtualDeviceBuilder::new()
            .context("Failed to open /dev/uinput")?
            .name(name)
            .with_keys(&keys)
            .context("Failed to register keys on virtual device")?
            .build()
            .with_context(|| format!("Failed to create virtual device '{}'", name))?;

        tracing::info!("Created virtual device '{}'", name);

        Ok(Self { device })
    }

    /// Emit a batch of input events
    fn emit_raw(&mut self, events: &[InputEvent]) -> std::io::Result<()> {
        self.device.emit(events)
    }
}

impl EventSink for VirtualKeyboard {
    fn emit(&mut self, event: KeyEvent) -> Result<(), SinkError> {
        let key = event.to_input_event();
        let syn = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        self.emit_raw(&[key, syn])?;
        Ok(())
    }
}
