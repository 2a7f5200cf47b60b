//! Our error types for the Korad PSUs.

use thiserror::Error;

use crate::{response::DecodeError, types::Quantity};

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for Korad PSU communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error: {0:?}")]
    SerialError(I),
    /// The serial port could not be opened.
    #[cfg(feature = "serial")]
    #[error("Could not open serial port: {0}")]
    Connection(serialport::Error),
    /// The `*IDN?` reply did not look like a Korad model number.
    #[error("Unrecognized device: {0:?}")]
    UnrecognizedDevice(String),
    /// Set-point above the device maximum while clamping is disabled.
    #[error("{quantity} of {requested} is out of range (maximum {max})")]
    OutOfRange {
        quantity: Quantity,
        requested: f32,
        max: u32,
    },
    #[error("Channel {channel} does not exist on a {channels} channel device")]
    InvalidChannel { channel: u8, channels: u8 },
    /// Nothing was received before the read timeout elapsed.
    #[error("Communication timeout")]
    Timeout,
    /// Something was received, but it was not what we asked for.
    #[error("Invalid response received: {0}")]
    InvalidResponse(#[from] DecodeError),
    #[error("Buffer too small")]
    BufferError,
    #[error("Device handle is closed")]
    Closed,
}
