//! `protocol`
//!
//! The text protocol spoken by the plotter's controller.
//!
//! Every outbound command is a short ASCII string terminated by `;`:
//! * `s<pin>=<value>;` sets a shield servo's pulse width,
//! * `l<pin>=<value>;` sets a loose servo's pulse width,
//! * `t<index>=<value>;` sets a stepper's absolute target,
//! * `i<index>?;` asks for a sensor reading.
//!
//! The controller answers sensor queries with a line containing `i<index>=<value>`. It also
//! echoes commands and prints diagnostics, so anything else read back is noise. Only one query is
//! ever outstanding.

use std::fmt;

use ascii::AsciiStr;

use crate::actuator::ServoConnection;

/// A single instruction for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drive a servo with a pulse width, in microseconds. A width of 0 releases the servo.
    SetServo {
        /// How the servo is wired, which decides the command letter.
        connection: ServoConnection,
        /// Shield channel or board pin.
        pin: u8,
        /// Pulse width in microseconds.
        value: i64,
    },
    /// Move a stepper to an absolute position.
    SetStepper {
        /// Index in the controller's stepper table.
        index: u8,
        /// Target position in steps from the origin.
        value: i64,
    },
    /// Ask for the current value of a sensor.
    QuerySensor {
        /// Index in the controller's sensor table.
        index: u8,
    },
}

impl Command {
    /// The letter the command starts with.
    #[must_use]
    pub fn letter(&self) -> char {
        match self {
            Command::SetServo {
                connection: ServoConnection::Shield,
                ..
            } => 's',
            Command::SetServo {
                connection: ServoConnection::Loose,
                ..
            } => 'l',
            Command::SetStepper { .. } => 't',
            Command::QuerySensor { .. } => 'i',
        }
    }

    /// Encodes the command for the wire.
    ///
    /// # Returns
    /// The command text, including its terminating `;`.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = self.letter();
        match *self {
            Command::SetServo { pin, value, .. } => write!(f, "{letter}{pin}={value};"),
            Command::SetStepper { index, value } => write!(f, "{letter}{index}={value};"),
            Command::QuerySensor { index } => write!(f, "{letter}{index}?;"),
        }
    }
}

/// Looks for the answer to a sensor query in a line read from the controller.
///
/// # Arguments
/// * `line`: One line of raw bytes from the controller, with or without its line ending.
/// * `index`: The sensor that was queried.
///
/// # Returns
/// The reported value if the line answers the query for `index`, otherwise `None`.
#[must_use]
pub fn decode_sensor_response(line: &[u8], index: u8) -> Option<i64> {
    // The board prints garbage while it resets.
    let Ok(line) = AsciiStr::from_ascii(line) else {
        return None;
    };

    let line = line.as_str();
    let marker = format!("i{index}=");
    let start = line.find(&marker)? + marker.len();

    line[start..]
        .trim_end_matches(|c: char| c == ';' || c.is_ascii_whitespace())
        .trim_start()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let commands = [
            Command::SetServo {
                connection: ServoConnection::Shield,
                pin: 0,
                value: 1333,
            },
            Command::SetServo {
                connection: ServoConnection::Loose,
                pin: 9,
                value: 0,
            },
            Command::SetStepper {
                index: 0,
                value: 4_000,
            },
            Command::SetStepper {
                index: 1,
                value: -4_000,
            },
            Command::QuerySensor { index: 0 },
        ];

        let wire: String = commands.iter().map(Command::encode).collect();
        insta::assert_snapshot!(wire, @"s0=1333;l9=0;t0=4000;t1=-4000;i0?;");
    }

    #[test]
    fn test_decode_sensor_response() {
        assert_eq!(decode_sensor_response(b"i0=1\r\n", 0), Some(1));
        assert_eq!(decode_sensor_response(b"i0=0", 0), Some(0), "no line ending");
        assert_eq!(decode_sensor_response(b"i3=-42;\n", 3), Some(-42));
        assert_eq!(decode_sensor_response(b"i12=7\n", 12), Some(7));
        assert_eq!(decode_sensor_response(b"i0= 5 \n", 0), Some(5), "padded");
    }

    #[test]
    fn test_decode_ignores_noise() {
        assert_eq!(decode_sensor_response(b"Initializing...\r\n", 0), None);
        assert_eq!(decode_sensor_response(b"t0=4000\r\n", 0), None, "echoed command");
        assert_eq!(decode_sensor_response(b"i0?\r\n", 0), None, "echoed query");
        assert_eq!(decode_sensor_response(b"i1=1\r\n", 0), None, "other sensor");
        assert_eq!(decode_sensor_response(b"i10=1\r\n", 1), None, "other sensor");
        assert_eq!(decode_sensor_response(b"i0=yes\r\n", 0), None, "not a number");
        assert_eq!(decode_sensor_response(b"\xffi0=1\r\n", 0), None, "not ascii");
        assert_eq!(decode_sensor_response(b"", 0), None);
    }
}
