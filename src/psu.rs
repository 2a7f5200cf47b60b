use embedded_io::Error as _;
use log::{debug, info, warn};

use crate::{
    command::{Command, Frame},
    config::{ApplyOrder, Configuration, SessionConfig},
    error::{Error, Result},
    identity::DeviceIdentity,
    response,
    types::{Quantity, State, StatusFlags, StatusSnapshot},
};

/// You can create a KoradPsu using any interface which implements [embedded_io::Read] & [embedded_io::Write].
///
/// Opening a session performs one `*IDN?` exchange and caches the resulting
/// [`DeviceIdentity`]. The session owns the interface; closing the session
/// (explicitly or by dropping it) drops the interface, which closes the port.
///
/// For it's methods, we use the nomenclature that "set" means to write a configuration value, "get" means to read
/// back a configuration value and "read" means to get a measured value. Channels are 1-based.
///
/// Every exchange is a blocking write, a fixed settle delay and, for queries,
/// a blocking read bounded by the port timeout. A session must only be used
/// from one thread at a time; interleaved commands corrupt each other's
/// replies.
pub struct KoradPsu<S: embedded_io::Read + embedded_io::Write, const L: usize = 64> {
    /// `None` once closed.
    interface: Option<S>,
    address: String,
    config: SessionConfig,
    identity: DeviceIdentity,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> KoradPsu<S, L> {
    /// Identify the device behind `interface` and create a session for it.
    ///
    /// `address` is only used for logging and [Self::address].
    ///
    /// If the device does not identify as a Korad PSU the interface is dropped
    /// before the error is returned.
    pub fn new(interface: S, address: impl Into<String>, config: SessionConfig) -> Result<Self, S::Error> {
        let address = address.into();
        let mut interface = Some(interface);

        let raw = query_line::<S, L>(&mut interface, &address, &config, &Command::Identify)?;
        let identity = response::decode_text(&raw).ok().and_then(DeviceIdentity::parse);
        let Some(identity) = identity else {
            let id = String::from_utf8_lossy(response::strip_terminator(&raw)).into_owned();
            warn!("{address}: unrecognized device {id:?}");
            drop(interface.take());
            return Err(Error::UnrecognizedDevice(id));
        };

        info!(
            "{address}: opened {} ({} channel, {}V, {}A)",
            identity.raw(),
            identity.channels(),
            identity.max_voltage(),
            identity.max_current()
        );

        Ok(Self {
            interface,
            address,
            config,
            identity,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The identity derived when the session was opened.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn channels(&self) -> u8 {
        self.identity.channels()
    }

    /// Maximum settable voltage in volts.
    pub fn max_voltage(&self) -> u32 {
        self.identity.max_voltage()
    }

    /// Maximum settable current in amps.
    pub fn max_current(&self) -> u32 {
        self.identity.max_current()
    }

    pub fn is_closed(&self) -> bool {
        self.interface.is_none()
    }

    /// Ask the device for its identification string again.
    ///
    /// The cached [`DeviceIdentity`] is not updated.
    pub fn identify(&mut self) -> Result<String, S::Error> {
        let raw = self.query_line(&Command::Identify)?;
        Ok(response::decode_text(&raw)?.to_owned())
    }

    /// Return the measured output voltage in volts.
    pub fn read_voltage(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.query_float(&Command::ReadVoltage(channel))
    }

    /// Return the measured output current in amps.
    pub fn read_current(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.query_float(&Command::ReadCurrent(channel))
    }

    /// Get the configured output voltage in volts.
    pub fn get_voltage(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.query_float(&Command::GetVoltage(channel))
    }

    /// Get the configured current limit in amps.
    pub fn get_current(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.query_float(&Command::GetCurrent(channel))
    }

    /// Set the output target voltage in volts.
    ///
    /// Negative values are sent as `0`. Values above [Self::max_voltage] are
    /// lowered to the maximum when clamping is enabled, otherwise rejected
    /// without writing anything.
    pub fn set_voltage(&mut self, channel: u8, volts: f32) -> Result<(), S::Error> {
        self.check_channel(channel)?;
        let volts = self.limit(Quantity::Voltage, volts, self.max_voltage())?;
        self.send(&Command::SetVoltage { channel, volts })
    }

    /// Set the output current limit in amps.
    ///
    /// Clamping works as for [Self::set_voltage], against [Self::max_current].
    pub fn set_current(&mut self, channel: u8, amps: f32) -> Result<(), S::Error> {
        self.check_channel(channel)?;
        let amps = self.limit(Quantity::Current, amps, self.max_current())?;
        self.send(&Command::SetCurrent { channel, amps })
    }

    /// Enable/disable the output.
    pub fn set_output(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.send(&Command::SetOutput(state.into()))
    }

    /// Enable/disable over-current protection.
    pub fn set_ocp(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.send(&Command::SetOcp(state.into()))
    }

    /// Store the current panel settings in memory slot `slot`.
    pub fn save(&mut self, slot: u8) -> Result<(), S::Error> {
        self.send(&Command::Save(slot))
    }

    /// Load the panel settings stored in memory slot `slot`.
    pub fn recall(&mut self, slot: u8) -> Result<(), S::Error> {
        self.send(&Command::Recall(slot))
    }

    /// Read the status byte followed by the measured and configured values of
    /// channel 1.
    ///
    /// These are five independent exchanges. The snapshot is not atomic: if the
    /// device changes state in between, the flags and values can disagree.
    pub fn status(&mut self) -> Result<StatusSnapshot, S::Error> {
        let flags = self.read_status_flags()?;
        let output_voltage = self.read_voltage(1)?;
        let output_current = self.read_current(1)?;
        let set_voltage = self.get_voltage(1)?;
        let set_current = self.get_current(1)?;
        Ok(StatusSnapshot::from_parts(
            flags,
            output_voltage,
            output_current,
            set_voltage,
            set_current,
        ))
    }

    /// Read and decode only the status byte.
    pub fn read_status_flags(&mut self) -> Result<StatusFlags, S::Error> {
        self.send(&Command::Status)?;
        let byte = self.read_byte()?;
        debug!("{} -> status {byte:#010b}", self.address);
        Ok(response::decode_status(byte))
    }

    /// Apply a [`Configuration`] in the order given by its [`ApplyOrder`].
    ///
    /// Stops at the first error. Anything written before that stays applied.
    pub fn configure(&mut self, configuration: &Configuration) -> Result<(), S::Error> {
        match configuration.order {
            ApplyOrder::SetPointsFirst => {
                self.apply_set_points(configuration)?;
                self.set_ocp(configuration.ocp)?;
                self.set_output(configuration.output)?;
            }
            ApplyOrder::OutputFirst => {
                self.set_output(configuration.output)?;
                self.set_ocp(configuration.ocp)?;
                self.apply_set_points(configuration)?;
            }
        }
        Ok(())
    }

    /// Close the port. Calling this again does nothing.
    ///
    /// Dropping the session closes it too, but long running programs should
    /// close explicitly so the port is released at a known point.
    pub fn close(&mut self) {
        if self.interface.take().is_some() {
            info!("{}: closed", self.address);
        }
    }

    /// Write a command and wait out the settle delay.
    pub fn send(&mut self, command: &Command) -> Result<(), S::Error> {
        send::<S>(&mut self.interface, &self.address, &self.config, command)
    }

    fn apply_set_points(&mut self, configuration: &Configuration) -> Result<(), S::Error> {
        for setting in &configuration.voltage {
            self.set_voltage(setting.channel, setting.value)?;
        }
        for setting in &configuration.current {
            self.set_current(setting.channel, setting.value)?;
        }
        Ok(())
    }

    fn query_line(&mut self, command: &Command) -> Result<heapless::Vec<u8, L>, S::Error> {
        query_line::<S, L>(&mut self.interface, &self.address, &self.config, command)
    }

    fn query_float(&mut self, command: &Command) -> Result<f32, S::Error> {
        let line = self.query_line(command)?;
        Ok(response::decode_float(&line)?)
    }

    fn read_byte(&mut self) -> Result<u8, S::Error> {
        let Some(interface) = self.interface.as_mut() else {
            return Err(Error::Closed);
        };
        let mut byte = [0u8; 1];
        match interface.read(&mut byte) {
            Ok(0) => Err(Error::Timeout),
            Ok(_) => Ok(byte[0]),
            Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => Err(Error::Timeout),
            Err(e) => Err(Error::SerialError(e)),
        }
    }

    fn check_channel(&self, channel: u8) -> Result<(), S::Error> {
        let channels = self.channels();
        if channel == 0 || channel > channels {
            return Err(Error::InvalidChannel { channel, channels });
        }
        Ok(())
    }

    fn limit(&self, quantity: Quantity, requested: f32, max: u32) -> Result<f32, S::Error> {
        let Some(limited) = clamp_set_point(requested, max, self.config.clamp) else {
            return Err(Error::OutOfRange {
                quantity,
                requested,
                max,
            });
        };
        if limited != requested {
            warn!("{}: {quantity} {requested} clamped to {limited}", self.address);
        }
        Ok(limited)
    }
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> Drop for KoradPsu<S, L> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Bound a requested set-point to `0..=max`.
///
/// Negative values, including `-0.0`, always become `0`. Values above `max` become `max` when
/// `clamp` is set and `None` otherwise. NaN is never accepted.
pub fn clamp_set_point(requested: f32, max: u32, clamp: bool) -> Option<f32> {
    let max = max as f32;
    if requested.is_nan() {
        None
    } else if requested <= 0.0 {
        // Also catches -0.0, which would be formatted as "-0.00".
        Some(0.0)
    } else if requested > max {
        clamp.then_some(max)
    } else {
        Some(requested)
    }
}

fn encode<I: embedded_io::Error>(command: &Command) -> Result<Frame, I> {
    command.encode().map_err(|_| Error::BufferError)
}

fn send<S: embedded_io::Read + embedded_io::Write>(
    interface: &mut Option<S>,
    address: &str,
    config: &SessionConfig,
    command: &Command,
) -> Result<(), S::Error> {
    let Some(interface) = interface.as_mut() else {
        return Err(Error::Closed);
    };
    let frame = encode::<S::Error>(command)?;
    debug!("{address} <- {frame}");

    interface
        .write_all(frame.as_bytes())
        .map_err(Error::SerialError)?;
    interface.flush().map_err(Error::SerialError)?;

    std::thread::sleep(config.settle_duration());
    Ok(())
}

/// Send a query and read one reply line.
///
/// The reply ends at `\n` or when the port times out. A timeout with nothing
/// received is [`Error::Timeout`]; a timeout after a partial line returns the
/// partial line, as some firmware never terminates its replies.
fn query_line<S: embedded_io::Read + embedded_io::Write, const L: usize>(
    interface: &mut Option<S>,
    address: &str,
    config: &SessionConfig,
    command: &Command,
) -> Result<heapless::Vec<u8, L>, S::Error> {
    send::<S>(interface, address, config, command)?;
    let Some(interface) = interface.as_mut() else {
        return Err(Error::Closed);
    };

    let mut line: heapless::Vec<u8, L> = heapless::Vec::new();
    // Read one byte at a time so we never consume part of the next reply.
    let mut byte = [0u8; 1];
    loop {
        match interface.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if line.push(byte[0]).is_err() {
                    return Err(Error::BufferError);
                }
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => break,
            Err(e) => return Err(Error::SerialError(e)),
        }
    }

    if line.is_empty() {
        debug!("{address} -> timeout");
        return Err(Error::Timeout);
    }
    debug!("{address} -> {:?}", String::from_utf8_lossy(&line));
    Ok(line)
}
