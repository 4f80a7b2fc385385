//! `config`
//!
//! Everything about the rig and the job that is fixed before drawing starts, loaded from a JSON
//! file. Any field missing from the file takes the value for the reference rig.

use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    actuator::{ActuationKind, Direction, Sensor, Servo, ServoCalibration, ServoConnection, Stepper},
    canvas::{Canvas, Padding, RECOMMENDED_PADDING},
    checkpoint::{Checkpoint, DEFAULT_CHECKPOINT_PATH},
    error::ConfigurationError,
    geometry::Planner,
    kinematics::Rig,
    sequencer::{Actuators, PenSettings},
    serial::SerialSettings,
};

/// The full configuration of a plotter and its jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::module_name_repetitions)]
pub struct PlotterConfig {
    /// The surface being drawn on.
    pub canvas: Canvas,
    /// Padding below which a warning is given before drawing, raised to whatever the rig's pen
    /// holder needs.
    pub recommended_padding: Padding,
    /// Physical measurements of the plotter.
    pub rig: Rig,
    /// Motor winding the top-left belt.
    pub left_stepper: Stepper,
    /// Motor winding the top-right belt.
    pub right_stepper: Stepper,
    /// Servo that lifts the pen.
    pub pen_servo: ServoCalibration,
    /// Sensor that reads non-zero once the motors have stopped.
    pub completion_sensor: Sensor,
    /// How the pen is moved.
    pub pen: PenSettings,
    /// Time between completion polls, in ms.
    pub poll_interval_ms: u64,
    /// Largest gap between consecutive moves, in cm.
    pub max_cm_between_points: f64,
    /// How far, in SVG units, flattened curves may stray from the real ones.
    pub flatten_tolerance: f32,
    /// How to reach the controller.
    pub serial: SerialSettings,
    /// Where progress is recorded.
    pub checkpoint: PathBuf,
    /// How many instructions to skip at the start of a job.
    pub start_from: usize,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        PlotterConfig {
            canvas: Canvas::default(),
            recommended_padding: RECOMMENDED_PADDING,
            rig: Rig::default(),
            left_stepper: Stepper::new(0, Direction::Normal),
            right_stepper: Stepper::new(1, Direction::Inverted),
            pen_servo: ServoCalibration {
                pin: 0,
                connection: ServoConnection::Shield,
                kind: ActuationKind::Position,
                microseconds: (500, 1500),
                actuation: (0.0, 180.0),
                direction: Direction::Normal,
            },
            completion_sensor: Sensor::new(0),
            pen: PenSettings::default(),
            poll_interval_ms: 100,
            max_cm_between_points: 0.2,
            flatten_tolerance: 0.1,
            serial: SerialSettings::default(),
            checkpoint: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            start_from: 0,
        }
    }
}

impl PlotterConfig {
    /// Loads a configuration file.
    ///
    /// # Arguments
    /// * `path`: The JSON file to load.
    ///
    /// # Errors
    /// [`ConfigurationError::Unreadable`] if the file cannot be read,
    /// [`ConfigurationError::Invalid`] if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigurationError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let config = serde_json::from_str(&json).map_err(|source| ConfigurationError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded configuration from {}", path.display());

        Ok(config)
    }

    /// Builds the hardware the sequencer drives.
    ///
    /// # Errors
    /// A [`ConfigurationError`] if the pen servo's calibration is unusable.
    pub fn actuators(&self) -> Result<Actuators, ConfigurationError> {
        Ok(Actuators {
            left: self.left_stepper,
            right: self.right_stepper,
            pen: Servo::try_from(self.pen_servo.clone())?,
            completion: self.completion_sensor,
        })
    }

    /// Builds a planner for this canvas and rig.
    ///
    /// # Errors
    /// A [`ConfigurationError`] if the spacing between points is not positive or the rig cannot
    /// move.
    pub fn planner(&self) -> Result<Planner, ConfigurationError> {
        Planner::new(self.canvas, self.rig, self.max_cm_between_points)
    }

    /// Gets the padding a drawing should keep from each edge, the recommended padding or what the
    /// rig's pen holder needs, whichever is larger.
    #[must_use]
    pub fn minimum_padding(&self) -> Padding {
        self.recommended_padding.at_least(&self.rig.minimum_padding())
    }

    /// Gets the time between completion polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Gets the progress checkpoint.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(&self.checkpoint)
    }
}
