//! Korad ASCII command encoder.
//!
//! Commands are plain ASCII and are sent without any terminator:
//!
//! ```text
//! *IDN?          STATUS?
//! SAV<n>         RCL<n>
//! OUT<0|1>       OCP<0|1>
//! VSET<ch>:<v>   ISET<ch>:<a>
//! VSET<ch>?      ISET<ch>?
//! VOUT<ch>?      IOUT<ch>?
//! ```
//!
//! Encoding never validates values. Clamping and channel checks are done by
//! [`KoradPsu`](crate::psu::KoradPsu) before a command is built.

use core::fmt::Write;

use thiserror::Error;

use crate::types::State;

/// Longest frame we ever build. `VSET255:` plus an `f32::MAX` rendered with
/// two decimals still fits.
pub const MAX_COMMAND_LEN: usize = 64;

/// An encoded command, ready to be written to the port.
pub type Frame = heapless::String<MAX_COMMAND_LEN>;

/// Number of decimals the device accepts for voltage set-points.
pub const VOLTAGE_DECIMALS: usize = 2;
/// Number of decimals the device accepts for current set-points.
pub const CURRENT_DECIMALS: usize = 3;

/// A single command understood by the PSU.
///
/// Naming follows the rest of the crate: "set" writes a configuration value,
/// "get" reads a configuration value back and "read" returns a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Identify,
    Status,
    /// Store the current panel settings in a memory slot.
    Save(u8),
    /// Load panel settings from a memory slot.
    Recall(u8),
    SetOutput(State),
    SetOcp(State),
    SetVoltage { channel: u8, volts: f32 },
    SetCurrent { channel: u8, amps: f32 },
    GetVoltage(u8),
    GetCurrent(u8),
    ReadVoltage(u8),
    ReadCurrent(u8),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Command does not fit in the frame buffer")]
    Overflow,
}

impl From<core::fmt::Error> for EncodeError {
    fn from(_: core::fmt::Error) -> Self {
        EncodeError::Overflow
    }
}

impl Command {
    /// Render this command as the exact bytes the device expects.
    pub fn encode(&self) -> Result<Frame, EncodeError> {
        let mut frame = Frame::new();
        match *self {
            Command::Identify => frame.write_str("*IDN?")?,
            Command::Status => frame.write_str("STATUS?")?,
            Command::Save(slot) => write!(frame, "SAV{slot}")?,
            Command::Recall(slot) => write!(frame, "RCL{slot}")?,
            Command::SetOutput(state) => write!(frame, "OUT{}", state as u8)?,
            Command::SetOcp(state) => write!(frame, "OCP{}", state as u8)?,
            Command::SetVoltage { channel, volts } => {
                write!(frame, "VSET{channel}:{volts:.VOLTAGE_DECIMALS$}")?
            }
            Command::SetCurrent { channel, amps } => {
                write!(frame, "ISET{channel}:{amps:.CURRENT_DECIMALS$}")?
            }
            Command::GetVoltage(channel) => write!(frame, "VSET{channel}?")?,
            Command::GetCurrent(channel) => write!(frame, "ISET{channel}?")?,
            Command::ReadVoltage(channel) => write!(frame, "VOUT{channel}?")?,
            Command::ReadCurrent(channel) => write!(frame, "IOUT{channel}?")?,
        }
        Ok(frame)
    }
}
