//! `observation`
//!
//! Remembers the last value commanded of, or read from, each actuator. Nothing in the control
//! path depends on these values, they exist so that the state of the rig can be inspected.

use std::{collections::HashMap, time::Instant};

use crate::actuator::ActuatorId;

/// The last value seen for an actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// The commanded or reported value, in the actuator's own terms.
    pub value: f64,
    /// When the value was committed.
    pub at: Instant,
}

/// Last known values, keyed by actuator.
#[derive(Debug, Default, Clone)]
pub struct Observations {
    /// The latest observation per actuator.
    latest: HashMap<ActuatorId, Observation>,
}

impl Observations {
    /// Creates an empty set of observations.
    #[must_use]
    pub fn new() -> Self {
        Observations::default()
    }

    /// Records a new value for an actuator, replacing any earlier one.
    ///
    /// # Arguments
    /// * `id`: The actuator the value belongs to.
    /// * `value`: The value that was commanded or read.
    pub fn commit(&mut self, id: ActuatorId, value: f64) {
        self.latest.insert(
            id,
            Observation {
                value,
                at: Instant::now(),
            },
        );
    }

    /// Gets the last observation for an actuator.
    ///
    /// # Returns
    /// `None` if nothing has been committed for `id` yet.
    #[must_use]
    pub fn last(&self, id: ActuatorId) -> Option<&Observation> {
        self.latest.get(&id)
    }

    /// Gets the last value for an actuator, without its timestamp.
    #[must_use]
    pub fn value(&self, id: ActuatorId) -> Option<f64> {
        self.last(id).map(|observation| observation.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::ServoConnection;

    #[test]
    fn test_commit_replaces_and_keeps_actuators_apart() {
        let mut observations = Observations::new();
        let stepper = ActuatorId::Stepper(0);
        let sensor = ActuatorId::Sensor(0);
        let shield = ActuatorId::Servo {
            connection: ServoConnection::Shield,
            pin: 0,
        };
        let loose = ActuatorId::Servo {
            connection: ServoConnection::Loose,
            pin: 0,
        };

        assert_eq!(observations.value(stepper), None);

        observations.commit(stepper, 100.0);
        observations.commit(sensor, 1.0);
        observations.commit(shield, 30.0);
        let first = *observations.last(stepper).unwrap();
        observations.commit(stepper, -250.0);

        assert_eq!(observations.value(stepper), Some(-250.0));
        assert!(observations.last(stepper).unwrap().at >= first.at);
        assert_eq!(observations.value(sensor), Some(1.0));
        assert_eq!(observations.value(shield), Some(30.0));
        assert_eq!(observations.value(loose), None, "loose pin 0 is not shield pin 0");
    }
}
