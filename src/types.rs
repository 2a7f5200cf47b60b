//! Value types shared between the protocol layer and the session.

use modular_bitfield::prelude::*;
use strum_macros::{Display, EnumIter};

/// Represents the two possible power supply regulation modes.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Constant voltage regulation mode.
    #[strum(serialize = "CV")]
    Cv,
    /// Constant current regulation mode.
    #[strum(serialize = "CC")]
    Cc,
}

/// Used to be less ambiguous and whether something is on or off.
#[repr(u8)]
#[derive(Debug, Display, EnumIter, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    #[default]
    Off = 0x00,
    /// Enabled.
    On = 0x01,
}

impl State {
    pub fn is_on(self) -> bool {
        self == State::On
    }
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Which set-point a value refers to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Voltage,
    Current,
}

/// Raw layout of the byte returned by `STATUS?`.
///
/// Bits 1-4 and 7 carry channel tracking and beeper state on some models and
/// are ignored here.
#[bitfield(bits = 8)]
#[derive(Debug, Clone, Copy)]
pub struct StatusByte {
    /// Bit 0: set = CV, clear = CC.
    pub constant_voltage: bool,
    #[skip]
    __: B4,
    /// Bit 5: over-current protection enabled.
    pub ocp: bool,
    /// Bit 6: output enabled.
    pub output: bool,
    #[skip]
    __: B1,
}

/// The flags decoded from a single status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFlags {
    pub output: State,
    pub mode: ControlMode,
    pub ocp: State,
}

impl From<u8> for StatusFlags {
    fn from(value: u8) -> Self {
        let raw = StatusByte::from_bytes([value]);
        StatusFlags {
            output: State::from(raw.output()),
            mode: if raw.constant_voltage() {
                ControlMode::Cv
            } else {
                ControlMode::Cc
            },
            ocp: State::from(raw.ocp()),
        }
    }
}

/// A point-in-time read of the device state.
///
/// This is built from five separate exchanges (status byte, then measured and
/// configured values), so it is not atomic. If the device changes state part
/// way through, the flags and the values may disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub output: State,
    pub mode: ControlMode,
    pub ocp: State,
    /// Measured output voltage in volts.
    pub output_voltage: f32,
    /// Measured output current in amps.
    pub output_current: f32,
    /// Configured voltage set-point in volts.
    pub set_voltage: f32,
    /// Configured current limit in amps.
    pub set_current: f32,
}

impl StatusSnapshot {
    pub(crate) fn from_parts(
        flags: StatusFlags,
        output_voltage: f32,
        output_current: f32,
        set_voltage: f32,
        set_current: f32,
    ) -> Self {
        StatusSnapshot {
            output: flags.output,
            mode: flags.mode,
            ocp: flags.ocp,
            output_voltage,
            output_current,
            set_voltage,
            set_current,
        }
    }
}
