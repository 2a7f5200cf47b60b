//! We use this mocking module in unit tests to emulate a serial port.

use std::{cell::Cell, rc::Rc};

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing pre-configured response data to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Incremented when the port is dropped, i.e. closed.
    closed: Rc<Cell<usize>>,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// No more response data, the read timed out
    Timeout,
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_position >= self.read_buffer.len() {
            return Err(MockSerialError::Timeout);
        }

        let available = &self.read_buffer[self.read_position..];
        let bytes_to_read = core::cmp::min(buf.len(), available.len());
        buf[..bytes_to_read].copy_from_slice(&available[..bytes_to_read]);

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl Drop for MockSerial {
    fn drop(&mut self) {
        self.closed.set(self.closed.get() + 1);
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            should_error_on_read: false,
            closed: Rc::new(Cell::new(0)),
        }
    }

    /// Create a mock which will answer with the given bytes.
    pub fn with_replies(data: &[u8]) -> Self {
        let mut mock = Self::new();
        mock.set_read_data(data).unwrap();
        mock
    }

    /// Set the data that will be returned when read() is called
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.push_read_data(data)
    }

    /// Queue more data behind whatever has not been read yet
    pub fn push_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Counter shared with this port, counts how often it was closed.
    pub fn close_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_multiple_times() {
        let mut mock = MockSerial::new();
        mock.write(b"VSET1:").unwrap();
        mock.write(b"3.30").unwrap();
        assert_eq!(mock.written_data(), b"VSET1:3.30");

        mock.clear_written_data();
        assert!(mock.written_data().is_empty());
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = vec![0u8; 300]; // Larger than 256 byte capacity

        let result = mock.write(&large_data);
        assert!(matches!(result, Err(MockSerialError::BufferOverflow)));
    }

    #[test]
    fn test_read_then_timeout() {
        let mut mock = MockSerial::with_replies(b"Hi");

        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer).unwrap(), 2);
        assert_eq!(&buffer[..2], b"Hi");

        let result = mock.read(&mut buffer);
        let err = result.unwrap_err();
        assert!(matches!(err, MockSerialError::Timeout));
        assert!(matches!(err.kind(), embedded_io::ErrorKind::TimedOut));
    }

    #[test]
    fn test_push_read_data_appends() {
        let mut mock = MockSerial::with_replies(b"first ");
        mock.push_read_data(b"second").unwrap();

        let mut buffer = [0u8; 20];
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b"first second");
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::with_replies(b"data");
        mock.set_write_error(true);
        mock.set_read_error(true);

        assert!(matches!(mock.write(b"test"), Err(MockSerialError::SimulatedError)));
        assert!(matches!(mock.flush(), Err(MockSerialError::SimulatedError)));
        assert!(mock.written_data().is_empty());

        let mut buffer = [0u8; 10];
        assert!(matches!(mock.read(&mut buffer), Err(MockSerialError::SimulatedError)));

        mock.set_read_error(false);
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
    }

    #[test]
    fn test_close_counter() {
        let mock = MockSerial::new();
        let closed = mock.close_counter();
        assert_eq!(closed.get(), 0);
        drop(mock);
        assert_eq!(closed.get(), 1);
    }
}
