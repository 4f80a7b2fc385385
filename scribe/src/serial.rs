//! `serial`
//!
//! Opening the serial port the controller is plugged into.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{ClearBuffer, SerialPort};

use crate::error::DeviceError;

/// The default serial device on Linux.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// How to reach the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::module_name_repetitions)]
pub struct SerialSettings {
    /// Name of the serial port, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    /// Line speed.
    pub baud_rate: u32,
    /// The controller resets when the port opens, this is how long it takes to come back, in ms.
    pub init_delay_ms: u64,
    /// How long a single read waits for data, in ms.
    pub read_timeout_ms: u64,
    /// How many lines or read timeouts to wait through for a sensor response.
    pub max_read_attempts: u32,
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            port: DEFAULT_PORT.to_string(),
            baud_rate: 115_200,
            init_delay_ms: 2_000,
            read_timeout_ms: 100,
            max_read_attempts: 50,
        }
    }
}

/// Opens the controller's serial port and waits for the controller to start.
///
/// Anything the controller printed while starting up is thrown away.
///
/// # Arguments
/// * `settings`: Which port to open and how.
///
/// # Returns
/// The open port.
///
/// # Errors
/// [`DeviceError::Open`] if the port cannot be opened or its input cannot be cleared.
pub fn open(settings: &SerialSettings) -> Result<Box<dyn SerialPort>, DeviceError> {
    let open_error = |source| DeviceError::Open {
        port: settings.port.clone(),
        source,
    };

    let port = serialport::new(&settings.port, settings.baud_rate)
        .timeout(Duration::from_millis(settings.read_timeout_ms))
        .open()
        .map_err(open_error)?;

    log::info!(
        "opened {} at {} baud, waiting {}ms for the controller",
        settings.port,
        settings.baud_rate,
        settings.init_delay_ms
    );
    std::thread::sleep(Duration::from_millis(settings.init_delay_ms));
    port.clear(ClearBuffer::Input).map_err(open_error)?;

    Ok(port)
}

/// Lists the serial ports on this machine.
///
/// # Returns
/// The port names, with a description of the device behind each where one is known.
///
/// # Errors
/// [`DeviceError::Enumerate`] if the ports cannot be listed.
pub fn available_ports() -> Result<Vec<(String, Option<String>)>, DeviceError> {
    let ports = serialport::available_ports().map_err(DeviceError::Enumerate)?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let description = match port.port_type {
                serialport::SerialPortType::UsbPort(usb) => Some(
                    [usb.manufacturer, usb.product]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" "),
                )
                .filter(|description| !description.is_empty()),
                serialport::SerialPortType::BluetoothPort => Some("Bluetooth".to_string()),
                serialport::SerialPortType::PciPort | serialport::SerialPortType::Unknown => None,
            };
            (port.port_name, description)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_fill_in_missing_fields() {
        let settings: SerialSettings = serde_json::from_str(r#"{"port":"COM13"}"#).unwrap();
        assert_eq!(
            settings,
            SerialSettings {
                port: "COM13".to_string(),
                ..SerialSettings::default()
            }
        );
    }
}
