//! `actuator`
//!
//! Calibration for the servos, steppers and sensors attached to the controller, and the
//! conversion from the values we think in (degrees, steps) to the values the controller
//! is sent (pulse widths, signed steps).

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigurationError,
    range::{clamp, remap},
};

/// The highest channel on the servo shield.
pub const MAX_SHIELD_PIN: u8 = 15;

/// How a servo is wired to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServoConnection {
    /// Plugged into a channel of the PWM servo shield.
    Shield,
    /// Wired straight to a pin on the board.
    Loose,
}

/// What the servo's actuation value controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuationKind {
    /// Regular servo, the value is an angle.
    Position,
    /// Continuous rotation servo, the value is a speed.
    Velocity,
}

/// Whether an actuator turns the way its values suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Values are sent as-is.
    #[default]
    Normal,
    /// The actuator is mounted backwards.
    Inverted,
}

impl Direction {
    /// The factor that step counts are multiplied by.
    ///
    /// # Returns
    /// `1` for [`Direction::Normal`], `-1` for [`Direction::Inverted`].
    #[must_use]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Normal => 1,
            Direction::Inverted => -1,
        }
    }
}

/// Identifies a single actuator or sensor on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorId {
    /// A servo, shield channels and loose pins are separate namespaces.
    Servo {
        /// How the servo is wired.
        connection: ServoConnection,
        /// The shield channel or board pin.
        pin: u8,
    },
    /// A stepper, by index in the controller's stepper table.
    Stepper(u8),
    /// A sensor, by index in the controller's sensor table.
    Sensor(u8),
}

/// The serialised form of a [`Servo`], validated on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct ServoCalibration {
    /// Shield channel or board pin.
    pub pin: u8,
    /// How the servo is wired.
    pub connection: ServoConnection,
    /// What the actuation value controls.
    pub kind: ActuationKind,
    /// Pulse widths at either end of travel, `(lower, upper)`.
    pub microseconds: (i32, i32),
    /// Actuation values at either end of travel, `(lower, upper)`.
    pub actuation: (f64, f64),
    /// Whether the servo is mounted backwards.
    #[serde(default)]
    pub direction: Direction,
}

/// A servo and its calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ServoCalibration", into = "ServoCalibration")]
pub struct Servo {
    /// Shield channel or board pin.
    pin: u8,
    /// How the servo is wired.
    connection: ServoConnection,
    /// What the actuation value controls.
    kind: ActuationKind,
    /// Pulse widths at either end of travel.
    microseconds: (i32, i32),
    /// Actuation values at either end of travel.
    actuation: (f64, f64),
    /// Whether the servo is mounted backwards.
    direction: Direction,
}

impl Servo {
    /// Creates a new [`Servo`].
    ///
    /// # Arguments
    /// * `pin`: The shield channel (if `connection` is [`ServoConnection::Shield`]) or board pin.
    /// * `connection`: How the servo is wired.
    /// * `kind`: Whether the servo is positioned or speed-controlled.
    /// * `microseconds`: Pulse widths at either end of travel, `(lower, upper)`.
    /// * `actuation`: Actuation values at either end of travel, likely degrees, `(lower, upper)`.
    /// * `direction`: Whether the servo is mounted backwards.
    ///
    /// # Returns
    /// The servo if the calibration is usable.
    ///
    /// # Errors
    /// A [`ConfigurationError`] if a shield pin is above [`MAX_SHIELD_PIN`], either pulse width
    /// bound is negative, or the actuation range is empty.
    #[allow(clippy::float_cmp)]
    pub fn new(
        pin: u8,
        connection: ServoConnection,
        kind: ActuationKind,
        microseconds: (i32, i32),
        actuation: (f64, f64),
        direction: Direction,
    ) -> Result<Self, ConfigurationError> {
        if connection == ServoConnection::Shield && pin > MAX_SHIELD_PIN {
            return Err(ConfigurationError::ShieldPinOutOfRange { pin });
        }

        if microseconds.0 < 0 || microseconds.1 < 0 {
            return Err(ConfigurationError::NegativeMicroseconds {
                low: microseconds.0,
                high: microseconds.1,
            });
        }

        if actuation.0 == actuation.1 {
            return Err(ConfigurationError::EmptyActuationRange {
                low: actuation.0,
                high: actuation.1,
            });
        }

        Ok(Servo {
            pin,
            connection,
            kind,
            microseconds,
            actuation,
            direction,
        })
    }

    /// Gets the shield channel or board pin of the servo.
    #[must_use]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Gets how the servo is wired.
    #[must_use]
    pub fn connection(&self) -> ServoConnection {
        self.connection
    }

    /// Gets what the actuation value of this servo controls.
    #[must_use]
    pub fn kind(&self) -> ActuationKind {
        self.kind
    }

    /// Gets the range of actuation values the servo accepts, `(lower, upper)`.
    #[must_use]
    pub fn actuation_range(&self) -> (f64, f64) {
        self.actuation
    }

    /// Gets the identity of the servo.
    #[must_use]
    pub fn id(&self) -> ActuatorId {
        ActuatorId::Servo {
            connection: self.connection,
            pin: self.pin,
        }
    }

    /// Converts an actuation value into the pulse width that produces it.
    ///
    /// The value is clamped to the actuation range first. Inverted servos are then reflected
    /// about the *upper* end of the actuation range, so for a range of `(0, 180)` a value of
    /// 30 is treated as 150, and a range that is not symmetric about zero inverts unevenly.
    ///
    /// # Arguments
    /// * `value`: The actuation value, usually degrees.
    ///
    /// # Returns
    /// The pulse width in microseconds, truncated towards zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn actuation_to_microseconds(&self, value: f64) -> i64 {
        let (in_low, in_high) = self.actuation;
        let (out_low, out_high) = self.microseconds;

        let mut value = clamp(value, in_low, in_high);
        if self.direction == Direction::Inverted {
            value = in_high - value;
        }

        remap(
            value,
            in_low,
            in_high,
            f64::from(out_low),
            f64::from(out_high),
        ) as i64
    }
}

impl TryFrom<ServoCalibration> for Servo {
    type Error = ConfigurationError;

    fn try_from(calibration: ServoCalibration) -> Result<Self, Self::Error> {
        Servo::new(
            calibration.pin,
            calibration.connection,
            calibration.kind,
            calibration.microseconds,
            calibration.actuation,
            calibration.direction,
        )
    }
}

impl From<Servo> for ServoCalibration {
    fn from(servo: Servo) -> Self {
        ServoCalibration {
            pin: servo.pin,
            connection: servo.connection,
            kind: servo.kind,
            microseconds: servo.microseconds,
            actuation: servo.actuation,
            direction: servo.direction,
        }
    }
}

/// A stepper motor and the direction it is mounted in.
///
/// Step counts are not limited, the rig has no travel limit that is visible from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stepper {
    /// Index in the controller's stepper table.
    pub index: u8,
    /// Whether the motor is mounted backwards.
    #[serde(default)]
    pub direction: Direction,
}

impl Stepper {
    /// Creates a new [`Stepper`].
    #[must_use]
    pub fn new(index: u8, direction: Direction) -> Self {
        Stepper { index, direction }
    }

    /// Gets the identity of the stepper.
    #[must_use]
    pub fn id(&self) -> ActuatorId {
        ActuatorId::Stepper(self.index)
    }

    /// Converts a step target into the value sent to the controller.
    ///
    /// # Arguments
    /// * `steps`: The absolute step target.
    ///
    /// # Returns
    /// The step target, negated if the motor is inverted.
    #[must_use]
    pub fn steps_to_device(&self, steps: i64) -> i64 {
        steps * self.direction.sign()
    }
}

/// A sensor that the controller reports on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Index in the controller's sensor table.
    pub index: u8,
}

impl Sensor {
    /// Creates a new [`Sensor`].
    #[must_use]
    pub fn new(index: u8) -> Self {
        Sensor { index }
    }

    /// Gets the identity of the sensor.
    #[must_use]
    pub fn id(&self) -> ActuatorId {
        ActuatorId::Sensor(self.index)
    }
}
