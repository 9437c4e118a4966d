use rand::Rng;

use crate::ctrnn::{Controller, Ctrnn, MotorOutputs};
use crate::error::Result;
use crate::kinematics::{drive, Pose, WheelNoise};
use crate::params::Parameters;
use crate::sensors::{BodyState, SensorReadings};

/// A robot in the arena: its body, its controller and what it last sensed
/// and did.
#[derive(Clone, Debug)]
pub struct Agent<C = Ctrnn> {
    pub id: usize,
    pub pose: Pose,
    pub radius: f64,
    pub controller: C,
    pub readings: SensorReadings,
    pub outputs: MotorOutputs,
}

impl<C: Controller> Agent<C> {
    pub fn new(id: usize, pose: Pose, radius: f64, controller: C) -> Agent<C> {
        Agent {
            id,
            pose,
            radius,
            controller,
            readings: SensorReadings::default(),
            outputs: MotorOutputs::default(),
        }
    }

    /// Moves the agent to `pose` and wipes all sensor, actuator and
    /// controller state.
    pub fn reset(&mut self, pose: Pose) {
        self.pose = pose;
        self.readings = SensorReadings::default();
        self.outputs = MotorOutputs::default();
        self.controller.reset();
    }

    pub fn body(&self) -> BodyState {
        BodyState {
            position: self.pose.position,
            heading: self.pose.heading,
            radius: self.radius,
            comm: self.outputs.comm,
        }
    }

    pub fn think(&mut self, readings: SensorReadings) -> Result<MotorOutputs> {
        self.readings = readings;
        self.outputs = self.controller.propagate(&readings.to_inputs())?;
        Ok(self.outputs)
    }

    /// Drives the wheels with the latest outputs, drawing fresh wheel noise.
    pub fn act<R: Rng>(&mut self, params: &Parameters, rng: &mut R) {
        let noise = WheelNoise::sample(params.wheel_noise, rng);
        self.pose = drive(self.pose, self.outputs, noise, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Clone)]
    struct Echo;

    impl Controller for Echo {
        fn reset(&mut self) {}

        fn propagate(&mut self, inputs: &[f64]) -> Result<MotorOutputs> {
            if inputs.len() != 13 {
                return Err(Error::InputShape {
                    expected: 13,
                    actual: inputs.len(),
                });
            }
            Ok(MotorOutputs {
                left: inputs[0],
                right: inputs[1],
                comm: inputs[12],
            })
        }
    }

    fn pose() -> Pose {
        Pose {
            position: (50.0, 50.0),
            heading: 0.0,
        }
    }

    #[test]
    fn think_stores_readings_and_outputs() {
        let mut agent = Agent::new(0, pose(), 2.6, Echo);
        let readings = SensorReadings {
            ir: [0.5, 0.25, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            comm: [0.0; 4],
            ground: 1.0,
        };
        let outputs = agent.think(readings).unwrap();
        assert_eq!(outputs.left, 0.5);
        assert_eq!(outputs.comm, 1.0);
        assert_eq!(agent.body().comm, 1.0);

        agent.think(SensorReadings::default()).unwrap();
        assert_eq!(agent.body().comm, 0.0);
        assert_eq!(agent.readings, SensorReadings::default());
    }

    #[test]
    fn reset_clears_state() {
        let mut agent = Agent::new(3, pose(), 2.6, Echo);
        agent.think(SensorReadings { ground: 1.0, ..Default::default() }).unwrap();
        let fresh = Pose {
            position: (10.0, 20.0),
            heading: 45.0,
        };
        agent.reset(fresh);
        assert_eq!(agent.pose, fresh);
        assert_eq!(agent.outputs, MotorOutputs::default());
        assert_eq!(agent.readings, SensorReadings::default());
    }
}
