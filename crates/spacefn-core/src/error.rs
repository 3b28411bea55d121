//! Error types for the event loop
//!
//! Both kinds of I/O failure are fatal: once a read or write is lost the
//! machine no longer agrees with the physical keyboard.

use thiserror::Error;

/// Failure reading from an event source.
#[derive(Error, Debug)]
#[error("Failed to read input event")]
pub struct SourceError(#[from] pub std::io::Error);

/// Failure writing to an event sink.
#[derive(Error, Debug)]
#[error("Failed to write output event")]
pub struct SinkError(#[from] pub std::io::Error);

/// Fatal errors that stop a running session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The input device could not be read (e.g., it was unplugged)
    #[error("Failed to read from input device")]
    SourceReadFailure(#[from] SourceError),

    /// The virtual device rejected an event
    #[error("Failed to write to virtual device")]
    SinkWriteFailure(#[from] SinkError),
}
