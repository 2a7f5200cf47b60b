//! Decoding of the replies sent back by the PSU.
//!
//! Replies are ASCII lines. Trailing whitespace and the line terminator are
//! stripped before parsing, nothing else is normalized. The one exception is
//! the `STATUS?` reply, which is a single raw byte (see
//! [`StatusFlags`](crate::types::StatusFlags)).

use thiserror::Error;

use crate::types::StatusFlags;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("reply is not valid ASCII")]
    NotUtf8,
    #[error("reply {0:?} is not a number")]
    NotANumber(String),
    #[error("reply is empty")]
    Empty,
}

/// Remove the trailing terminator and any whitespace before it.
pub fn strip_terminator(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |last| last + 1);
    &line[..end]
}

/// Decode a reply as text, e.g. the `*IDN?` reply.
pub fn decode_text(line: &[u8]) -> Result<&str, DecodeError> {
    core::str::from_utf8(strip_terminator(line)).map_err(|_| DecodeError::NotUtf8)
}

/// Decode a numeric reply, e.g. `"05.00"` from `VOUT1?`.
pub fn decode_float(line: &[u8]) -> Result<f32, DecodeError> {
    let text = decode_text(line)?;
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    match text.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DecodeError::NotANumber(text.to_owned())),
    }
}

/// Decode the raw `STATUS?` byte.
pub fn decode_status(byte: u8) -> StatusFlags {
    StatusFlags::from(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::types::{ControlMode, State};

    #[test]
    fn strips_terminators() {
        assert_eq!(strip_terminator(b"3.30\n"), b"3.30");
        assert_eq!(strip_terminator(b"3.30\r\n"), b"3.30");
        assert_eq!(strip_terminator(b"3.30  \r\n"), b"3.30");
        assert_eq!(strip_terminator(b"3.30"), b"3.30");
        assert_eq!(strip_terminator(b"\r\n"), b"");
        assert_eq!(strip_terminator(b""), b"");
    }

    #[test]
    fn leading_whitespace_kept() {
        assert_eq!(decode_text(b" KORAD\n").unwrap(), " KORAD");
        assert!(matches!(
            decode_float(b" 1.00\n"),
            Err(DecodeError::NotANumber(_))
        ));
    }

    #[test]
    fn floats() {
        assert_eq!(decode_float(b"05.00\n").unwrap(), 5.0);
        assert_eq!(decode_float(b"0.010").unwrap(), 0.01);
        assert_eq!(decode_float(b"30\r\n").unwrap(), 30.0);
    }

    #[test]
    fn float_garbage() {
        assert_eq!(
            decode_float(b"abc\n"),
            Err(DecodeError::NotANumber("abc".to_owned()))
        );
        assert_eq!(decode_float(b"\n"), Err(DecodeError::Empty));
        assert!(matches!(decode_float(b"inf"), Err(DecodeError::NotANumber(_))));
        assert!(matches!(decode_float(b"NaN\n"), Err(DecodeError::NotANumber(_))));
        assert_eq!(decode_float(&[0xFF, 0xFE]), Err(DecodeError::NotUtf8));
    }

    #[test]
    fn voltage_round_trip() {
        let frame = Command::SetVoltage { channel: 1, volts: 3.3 }.encode().unwrap();
        assert_eq!(frame.as_str(), "VSET1:3.30");
        let value = decode_float(b"3.30\n").unwrap();
        assert!((value - 3.3).abs() < 0.005);
    }

    #[test]
    fn status_bytes() {
        let flags = decode_status(0b0110_0001);
        assert_eq!(flags.mode, ControlMode::Cv);
        assert_eq!(flags.ocp, State::On);
        assert_eq!(flags.output, State::On);

        let flags = decode_status(0);
        assert_eq!(flags.mode, ControlMode::Cc);
        assert_eq!(flags.ocp, State::Off);
        assert_eq!(flags.output, State::Off);
    }
}
