//! Inference of device capabilities from the `*IDN?` reply.
//!
//! Korad (and rebadged RND, Tenma, Velleman) units report a model number of the
//! form `K<panel><V><C><II>P`, somewhere inside the identification string:
//!
//! * `panel` - `A` (analogue style) or `D` (digital) front panel.
//! * `V` - maximum voltage in tens of volts, `3` => 30V.
//! * `C` - channel layout, `0` is a single channel. Every other digit we have
//!   seen is a multi-channel unit with three outputs.
//! * `II` - maximum current in whole amps, `05` => 5A.
//!
//! E.g. `RND 320-KD3005P V2.0` is a single channel 30V/5A unit.
//!
//! If the string holds more than one model number, the last one wins.

use std::sync::LazyLock;

use regex::Regex;
use strum_macros::Display;

/// Model number pattern. Case insensitive, anything may come before or after.
/// The greedy prefix binds to the last model number in the string.
static MODEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^.*k(?P<panel>a|d)(?P<max_voltage>\d)(?P<channels>\d)(?P<max_current>\d+)p")
        .expect("Invalid model regex")
});

/// Front panel family letter from the model number.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PanelFamily {
    #[strum(serialize = "A")]
    A,
    #[strum(serialize = "D")]
    D,
}

/// Facts about the connected PSU, derived once when the session is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    raw: String,
    panel: PanelFamily,
    channels: u8,
    max_voltage: u32,
    max_current: u32,
}

impl DeviceIdentity {
    /// Parse an identification string. Returns `None` if no model number is
    /// found in it.
    pub fn parse(id: &str) -> Option<Self> {
        let captures = MODEL_REGEX.captures(id)?;

        let panel = if captures["panel"].eq_ignore_ascii_case("a") {
            PanelFamily::A
        } else {
            PanelFamily::D
        };
        let channels = if &captures["channels"] == "0" { 1 } else { 3 };
        let max_voltage = captures["max_voltage"].parse::<u32>().ok()? * 10;
        let max_current = captures["max_current"].parse::<u32>().ok()?;

        Some(DeviceIdentity {
            raw: id.to_owned(),
            panel,
            channels,
            max_voltage,
            max_current,
        })
    }

    /// The identification string exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn panel(&self) -> PanelFamily {
        self.panel
    }

    /// Number of output channels. Either 1 or 3.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Maximum settable voltage in volts.
    pub fn max_voltage(&self) -> u32 {
        self.max_voltage
    }

    /// Maximum settable current in amps.
    pub fn max_current(&self) -> u32 {
        self.max_current
    }
}
