//! `device`
//!
//! The link to the plotter's controller. Owns the transport, sends commands and waits for
//! sensor readings.

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};

use crate::{
    actuator::{Sensor, Servo, Stepper},
    error::DeviceError,
    observation::Observations,
    protocol::{decode_sensor_response, Command},
};

/// The single connection to a controller.
///
/// `T` is usually a serial port, anything that can be read from and written to will do.
pub struct DeviceLink<T: Read + Write> {
    /// The transport, buffered for reading lines. Writes go straight through to the inner value.
    port: BufReader<T>,
    /// Bytes of a line that has not been completely received yet.
    pending: Vec<u8>,
    /// How many lines (or read timeouts) to wait through for a sensor response.
    max_read_attempts: u32,
    /// Last commanded and read values.
    observations: Observations,
}

impl<T: Read + Write> DeviceLink<T> {
    /// Creates a link over an already opened transport.
    ///
    /// # Arguments
    /// * `port`: The transport to the controller.
    /// * `max_read_attempts`: How many lines or read timeouts [`DeviceLink::poll`] will wait
    ///   through before deciding the controller is not going to answer.
    #[must_use]
    pub fn new(port: T, max_read_attempts: u32) -> Self {
        DeviceLink {
            port: BufReader::new(port),
            pending: Vec::new(),
            max_read_attempts,
            observations: Observations::new(),
        }
    }

    /// Gets the last values commanded of, or read from, each actuator.
    #[must_use]
    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    /// Gives back the transport, dropping anything that has been read but not consumed.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.port.into_inner()
    }

    /// Writes a command to the controller. The controller does not acknowledge commands.
    ///
    /// # Errors
    /// [`DeviceError::Io`] if the transport fails.
    pub fn send(&mut self, command: &Command) -> Result<(), DeviceError> {
        let encoded = command.encode();
        log::trace!("-> {encoded}");

        let port = self.port.get_mut();
        port.write_all(encoded.as_bytes())?;
        port.flush()?;

        Ok(())
    }

    /// Asks the controller for a sensor reading and waits for the answer.
    ///
    /// Lines that are not the answer are skipped. Every line read, and every read that times
    /// out, counts towards the attempt limit given to [`DeviceLink::new`].
    ///
    /// # Arguments
    /// * `sensor`: The sensor to read.
    ///
    /// # Returns
    /// The value the controller reported.
    ///
    /// # Errors
    /// [`DeviceError::Unresponsive`] if no answer arrives within the attempt limit,
    /// [`DeviceError::Io`] if the transport fails.
    pub fn poll(&mut self, sensor: &Sensor) -> Result<i64, DeviceError> {
        self.send(&Command::QuerySensor {
            index: sensor.index,
        })?;

        for _ in 0..self.max_read_attempts {
            let Some(line) = self.read_line()? else {
                continue;
            };

            log::trace!("<- {}", String::from_utf8_lossy(&line).trim_end());

            match decode_sensor_response(&line, sensor.index) {
                Some(value) => {
                    #[allow(clippy::cast_precision_loss)]
                    let reading = value as f64;
                    self.observations.commit(sensor.id(), reading);
                    return Ok(value);
                }
                None if !line.is_ascii() => {
                    log::warn!(
                        "discarding garbled line from the controller: {}",
                        String::from_utf8_lossy(&line).trim_end()
                    );
                }
                None => {}
            }
        }

        Err(DeviceError::Unresponsive {
            sensor: sensor.index,
            attempts: self.max_read_attempts,
        })
    }

    /// Reads each sensor in turn.
    ///
    /// # Returns
    /// The readings, in the same order as `sensors`.
    ///
    /// # Errors
    /// The first error from [`DeviceLink::poll`].
    pub fn poll_all(&mut self, sensors: &[Sensor]) -> Result<Vec<i64>, DeviceError> {
        sensors.iter().map(|sensor| self.poll(sensor)).collect()
    }

    /// Moves a servo.
    ///
    /// # Arguments
    /// * `servo`: The servo to move.
    /// * `value`: The actuation value, see [`Servo::actuation_to_microseconds`].
    ///
    /// # Returns
    /// The pulse width that was sent.
    ///
    /// # Errors
    /// [`DeviceError::Io`] if the transport fails.
    pub fn set_servo(&mut self, servo: &Servo, value: f64) -> Result<i64, DeviceError> {
        let microseconds = servo.actuation_to_microseconds(value);
        self.send(&Command::SetServo {
            connection: servo.connection(),
            pin: servo.pin(),
            value: microseconds,
        })?;
        self.observations.commit(servo.id(), value);

        Ok(microseconds)
    }

    /// Stops driving a servo so that it goes limp. A limp servo is recorded as being at 0.
    ///
    /// # Errors
    /// [`DeviceError::Io`] if the transport fails.
    pub fn turn_off_servo(&mut self, servo: &Servo) -> Result<(), DeviceError> {
        self.send(&Command::SetServo {
            connection: servo.connection(),
            pin: servo.pin(),
            value: 0,
        })?;
        self.observations.commit(servo.id(), 0.0);

        Ok(())
    }

    /// Sends a stepper to an absolute position.
    ///
    /// # Arguments
    /// * `stepper`: The stepper to move.
    /// * `steps`: Target position in steps from the origin, before any inversion.
    ///
    /// # Errors
    /// [`DeviceError::Io`] if the transport fails.
    pub fn set_stepper(&mut self, stepper: &Stepper, steps: i64) -> Result<(), DeviceError> {
        self.send(&Command::SetStepper {
            index: stepper.index,
            value: stepper.steps_to_device(steps),
        })?;
        #[allow(clippy::cast_precision_loss)]
        let target = steps as f64;
        self.observations.commit(stepper.id(), target);

        Ok(())
    }

    /// Reads the next line from the controller.
    ///
    /// # Returns
    /// `Some(line)` once a line has arrived, `None` if the read timed out or there is nothing
    /// to read. Partially received lines are kept for the next call.
    ///
    /// # Errors
    /// [`DeviceError::Io`] for transport failures other than timeouts.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, DeviceError> {
        match self.port.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Ok(None),
            Ok(_) => Ok(Some(std::mem::take(&mut self.pending))),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
