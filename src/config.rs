//! Session options and bulk device configuration.

use fugit::MillisDurationU32;

use crate::types::State;

/// Default read timeout. Also the default settle delay after each command.
pub const DEFAULT_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(100);

/// How a [`KoradPsu`](crate::psu::KoradPsu) session talks to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Read timeout applied to the serial port.
    pub timeout: MillisDurationU32,
    /// Pause after every command before the next write or read.
    ///
    /// The PSU has no flow control and drops commands that arrive while it is
    /// still busy with the previous one.
    pub settle_delay: MillisDurationU32,
    /// When set, set-points above the device maximum are lowered to the
    /// maximum instead of being rejected.
    pub clamp: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_TIMEOUT,
            clamp: true,
        }
    }
}

impl SessionConfig {
    /// Settle delay follows the timeout, as the device expects.
    pub fn new(timeout: MillisDurationU32, clamp: bool) -> Self {
        SessionConfig {
            timeout,
            settle_delay: timeout,
            clamp,
        }
    }

    pub fn with_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: MillisDurationU32) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub(crate) fn settle_duration(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.settle_delay.to_millis() as u64)
    }
}

/// A set-point for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSetting {
    /// 1-based channel number.
    pub channel: u8,
    pub value: f32,
}

/// Order in which [`Configuration`] is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplyOrder {
    /// Voltages, currents, OCP, then output.
    ///
    /// The output is only switched once the new set-points are in place, so
    /// it never runs at a stale set-point.
    #[default]
    SetPointsFirst,
    /// Output, OCP, voltages, then currents.
    ///
    /// With the output being enabled this briefly drives the load with
    /// whatever set-points were active before.
    OutputFirst,
}

/// Everything [`KoradPsu::configure`](crate::psu::KoradPsu::configure) can set
/// in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    /// Output state to apply. Defaults to off.
    pub output: State,
    /// OCP state to apply. Defaults to off.
    pub ocp: State,
    /// Voltage set-points, written in order.
    pub voltage: Vec<ChannelSetting>,
    /// Current set-points, written in order.
    pub current: Vec<ChannelSetting>,
    pub order: ApplyOrder,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set output state.
    pub fn with_output(mut self, output: impl Into<State>) -> Self {
        self.output = output.into();
        self
    }

    /// Set over-current protection state.
    pub fn with_ocp(mut self, ocp: impl Into<State>) -> Self {
        self.ocp = ocp.into();
        self
    }

    /// Add a voltage set-point in volts.
    pub fn with_voltage(mut self, channel: u8, volts: f32) -> Self {
        self.voltage.push(ChannelSetting {
            channel,
            value: volts,
        });
        self
    }

    /// Add a current limit in amps.
    pub fn with_current(mut self, channel: u8, amps: f32) -> Self {
        self.current.push(ChannelSetting {
            channel,
            value: amps,
        });
        self
    }

    pub fn with_order(mut self, order: ApplyOrder) -> Self {
        self.order = order;
        self
    }
}
