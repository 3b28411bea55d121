//! Reading key events from the grabbed device

use anyhow::{Context, Result};
use evdev::{Device, EventStream};
use spacefn_core::{EventSource, KeyEvent, Polled, SourceError};
use tokio::time::Instant;

/// An [`EventSource`] over an evdev device's async event stream.
pub struct EvdevSource {
    stream: EventStream,
}

impl EvdevSource {
    pub fn new(device: Device) -> Result<Self> {
        let stream = device
            .into_event_stream()
            .context("Failed to create event stream for input device")?;
        Ok(Self { stream })
    }
}

impl EventSource for EvdevSource {
    async fn next_event(&mut self, deadline: Option<Instant>) -> Result<Polled, SourceError> {
        loop {
            let raw = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.stream.next_event()).await {
                        Ok(raw) => raw?,
                        Err(_) => return Ok(Polled::Timeout),
                    }
                }
                None => self.stream.next_event().await?,
            };

            // SYN_REPORT, MSC_SCAN and LED events never reach the machine
            if let Some(event) = KeyEvent::from_input_event(&raw) {
                return Ok(Polled::Event(event));
            }
        }
    }
}
