//! This crate provides an interface for communicating and controlling Korad programmable bench power supplies.
//!
//! The same firmware is sold under a number of brands, e.g. Tenma, RND and Velleman. Anything which answers `*IDN?`
//! with a `K<A|D><V><C><II>P` model number should work with it.
//!
//! Example PSU model numbers which this should work with:
//! * KA3005P
//! * KD3005P
//! * KA3305P
//! * KA6003P
//! * KD6005P
//! * KA60010P
//!
//! It speaks the plain ASCII command set of these units (`VSET1:12.00`, `IOUT1?`, `STATUS?`, ...), over any transport
//! implementing [embedded_io::Read] & [embedded_io::Write]. With the `serial` feature (on by default) a
//! [`serialport`] backed transport is provided, see [`psu::KoradPsu::open`].
//!
//! The serial port used for PSU comms should be configured like so:
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//! * Flow control: None
//!
//! The library logs through the [`log`] facade and does not install a logger.

pub mod command;
pub mod config;
pub mod error;
pub mod identity;
pub mod psu;
pub mod response;
#[cfg(feature = "serial")]
pub mod serial;
pub mod types;

#[cfg(test)]
mod mock_serial;
