//! Serial port transport built on the [`serialport`] crate.
//!
//! Korad PSUs talk 9600 baud, 8 data bits, no parity, 1 stop bit and no flow
//! control, over RS-232 or a USB-CDC virtual port.

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::{
    config::SessionConfig,
    error::{Error, Result},
    psu::KoradPsu,
};

pub const BAUD_RATE: u32 = 9600;
pub const DATA_BITS: DataBits = DataBits::Eight;
pub const PARITY: Parity = Parity::None;
pub const STOP_BITS: StopBits = StopBits::One;
pub const FLOW_CONTROL: FlowControl = FlowControl::None;

/// Adapts a [`SerialPort`] to [embedded_io::Read] & [embedded_io::Write].
///
/// Dropping it closes the port.
pub struct SerialTransport(Box<dyn SerialPort>);

impl SerialTransport {
    /// Open `address` with the Korad port settings and the timeout from `config`.
    pub fn open(address: &str, config: &SessionConfig) -> core::result::Result<Self, serialport::Error> {
        let timeout = std::time::Duration::from_millis(config.timeout.to_millis() as u64);
        let port = serialport::new(address, BAUD_RATE)
            .data_bits(DATA_BITS)
            .parity(PARITY)
            .stop_bits(STOP_BITS)
            .flow_control(FLOW_CONTROL)
            .timeout(timeout)
            .open()?;
        Ok(SerialTransport(port))
    }
}

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        io_error_kind(self.0.kind())
    }
}

fn io_error_kind(kind: std::io::ErrorKind) -> embedded_io::ErrorKind {
    use embedded_io::ErrorKind as EK;
    use std::io::ErrorKind as IK;
    match kind {
        IK::NotFound => EK::NotFound,
        IK::PermissionDenied => EK::PermissionDenied,
        IK::ConnectionRefused => EK::ConnectionRefused,
        IK::ConnectionReset => EK::ConnectionReset,
        IK::ConnectionAborted => EK::ConnectionAborted,
        IK::NotConnected => EK::NotConnected,
        IK::AddrInUse => EK::AddrInUse,
        IK::AddrNotAvailable => EK::AddrNotAvailable,
        IK::BrokenPipe => EK::BrokenPipe,
        IK::AlreadyExists => EK::AlreadyExists,
        IK::InvalidInput => EK::InvalidInput,
        IK::InvalidData => EK::InvalidData,
        // The port timeout is how "no reply" shows up.
        IK::TimedOut | IK::WouldBlock => EK::TimedOut,
        IK::Interrupted => EK::Interrupted,
        IK::Unsupported => EK::Unsupported,
        IK::OutOfMemory => EK::OutOfMemory,
        _ => EK::Other,
    }
}

impl embedded_io::ErrorType for SerialTransport {
    type Error = IoError;
}

impl embedded_io::Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

impl<const L: usize> KoradPsu<SerialTransport, L> {
    /// Open the serial port at `address` and identify the PSU behind it.
    ///
    /// ```no_run
    /// use korad_psu::{config::SessionConfig, psu::KoradPsu};
    ///
    /// let mut psu: KoradPsu<_> = KoradPsu::open("/dev/ttyACM0", SessionConfig::default())?;
    /// psu.set_voltage(1, 3.3)?;
    /// psu.set_output(true)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(address: &str, config: SessionConfig) -> Result<Self, IoError> {
        let transport = SerialTransport::open(address, &config).map_err(Error::<IoError>::Connection)?;
        KoradPsu::new(transport, address, config)
    }
}
