//! SpaceFN daemon
//!
//! Grabs one keyboard and re-emits its events through a virtual keyboard,
//! turning the space bar into a navigation layer key.

mod device;
mod injector;
mod source;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use spacefn_core::{Session, SpaceFn, ESCAPE_KEY};
use tracing_subscriber::EnvFilter;

use crate::device::DeviceInfo;
use crate::injector::VirtualKeyboard;
use crate::source::EvdevSource;

#[derive(Parser, Debug)]
#[command(name = "spacefn")]
#[command(about = "Turn the space bar into a navigation layer key")]
#[command(version)]
struct Args {
    /// Path to the keyboard's input device (e.g., /dev/input/event3)
    device: PathBuf,

    /// How long to wait after space is pressed before treating held keys as shifted
    #[arg(short, long, default_value_t = 200)]
    timeout_ms: u64,

    /// Name of the virtual output device
    #[arg(short, long, default_value = "spacefn")]
    name: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut device = device::open_device(&args.device)?;
    let info = DeviceInfo::from_device(&args.device, &device);

    tracing::info!(
        "Opened '{}' [{}] at {}",
        info.name,
        info.vendor_product(),
        info.path.display()
    );

    if !device::is_keyboard(&device) {
        tracing::warn!("Device '{}' does not report a space key", info.name);
    }

    let virtual_keyboard = VirtualKeyboard::from_device(&args.name, &device)?;
    device::grab_device(&mut device, &info)?;

    let source = EvdevSource::new(device)?;
    let machine = SpaceFn::new(Duration::from_millis(args.timeout_ms));
    let mut session = Session::new(machine, source, virtual_keyboard);

    tracing::info!("Press {:?} to exit", ESCAPE_KEY);

    tokio::select! {
        result = session.run() => {
            result.context("SpaceFN session stopped")?;
            tracing::info!("Exiting");
            // Held keys are deliberately not released on the escape path
            std::process::exit(0);
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}
