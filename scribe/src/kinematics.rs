//! `kinematics`
//!
//! Where the motors have to be for the pen to be at a point.
//!
//! The pen holder hangs from two belts, one wound onto a motor at each top corner of the canvas.
//! The length of belt between a motor and the holder is the straight-line distance from the
//! motor's anchor point to the pen, so each motor's position follows from that distance alone.

use serde::{Deserialize, Serialize};

use crate::{
    canvas::{Canvas, Padding},
    error::ConfigurationError,
    geometry::Point,
};

/// Physical measurements of the plotter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rig {
    /// Distance between the two belt ends on the pen holder, in cm.
    pub pen_holder_width: f64,
    /// How far the pen sits below the belt ends, in cm.
    pub pen_vertical_offset: f64,
    /// Steps for one full turn of a motor.
    pub steps_per_revolution: f64,
    /// Turns of a motor that move its belt by one cm.
    pub revolutions_per_cm: f64,
}

impl Default for Rig {
    fn default() -> Self {
        Rig {
            pen_holder_width: 2.5,
            pen_vertical_offset: 2.0,
            steps_per_revolution: 400.0,
            revolutions_per_cm: 0.25,
        }
    }
}

/// Absolute motor targets, in steps from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorPositions {
    /// Target for the top-left motor.
    pub left: i64,
    /// Target for the top-right motor.
    pub right: i64,
}

impl Rig {
    /// Checks that the rig can move at all.
    ///
    /// # Errors
    /// [`ConfigurationError::NonPositiveStepsPerCm`] if a cm of belt needs no steps.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let steps_per_cm = self.steps_per_cm();
        if steps_per_cm > 0.0 {
            Ok(())
        } else {
            Err(ConfigurationError::NonPositiveStepsPerCm(steps_per_cm))
        }
    }

    /// Gets how many motor steps move a belt by one cm.
    #[must_use]
    pub fn steps_per_cm(&self) -> f64 {
        self.steps_per_revolution * self.revolutions_per_cm
    }

    /// Works out the padding the pen holder needs to stay on the canvas.
    ///
    /// The holder sticks out sideways by half its width and rises above the pen by the pen's
    /// offset, so a drawing any closer to an edge than that drags the holder off the canvas.
    /// Nothing hangs below the pen.
    #[must_use]
    pub fn minimum_padding(&self) -> Padding {
        let half_holder = self.pen_holder_width / 2.0;
        Padding {
            top: self.pen_vertical_offset,
            left: half_holder,
            right: half_holder,
            bottom: 0.0,
        }
    }

    /// Works out the belt lengths that put the pen at a point.
    ///
    /// Each motor's anchor sits at its top corner, moved outwards by half the holder width and
    /// down by the pen's offset below the belts.
    ///
    /// # Arguments
    /// * `canvas`: The canvas the point is on.
    /// * `point`: Where the pen should be, in cm from the bottom-left corner.
    ///
    /// # Returns
    /// The `(left, right)` belt lengths in cm.
    #[must_use]
    pub fn belt_lengths(&self, canvas: &Canvas, point: Point) -> (f64, f64) {
        let half_holder = self.pen_holder_width / 2.0;
        let from_top = canvas.height() - point.y - self.pen_vertical_offset;
        let from_left = point.x + half_holder;
        let from_right = canvas.width() - point.x + half_holder;

        (from_left.hypot(from_top), from_right.hypot(from_top))
    }

    /// Works out the motor targets that put the pen at a point.
    ///
    /// # Arguments
    /// * `canvas`: The canvas the point is on.
    /// * `point`: Where the pen should be, in cm from the bottom-left corner.
    ///
    /// # Returns
    /// The motor targets, truncated to whole steps.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn motor_positions(&self, canvas: &Canvas, point: Point) -> MotorPositions {
        let steps_per_cm = self.steps_per_cm();
        let (left, right) = self.belt_lengths(canvas, point);

        MotorPositions {
            left: (left * steps_per_cm) as i64,
            right: (right * steps_per_cm) as i64,
        }
    }
}
