//! One fixed-length run of a team of agents sharing a controller.

use rand::Rng;

use crate::agent::Agent;
use crate::ctrnn::{Controller, Ctrnn, MotorOutputs};
use crate::environment::Environment;
use crate::error::Result;
use crate::geometry::Point;
use crate::kinematics::Pose;
use crate::params::Parameters;
use crate::sensors::{sense, GeometryDiagnostics, SensorReadings};
use crate::topology::EXTERNAL_INPUTS;

/// Reward for `count` agents sharing one target zone: up to two is good,
/// more is penalized.
pub fn zone_score(count: usize) -> f64 {
    if count <= 2 {
        0.25 * count as f64
    } else {
        0.5 - (count - 2) as f64
    }
}

/// What a single agent did over a trial, one entry per step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentTrace {
    pub positions: Vec<Point>,
    pub headings: Vec<f64>,
    pub inputs: Vec<[f64; EXTERNAL_INPUTS]>,
    pub outputs: Vec<MotorOutputs>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrialOutcome {
    pub fitness: f64,
    pub step_fitness: Vec<f64>,
    pub diagnostics: GeometryDiagnostics,
    pub traces: Option<Vec<AgentTrace>>,
}

pub struct Trial<C = Ctrnn> {
    params: Parameters,
    env: Environment<C>,
    step: usize,
    step_fitness: Vec<f64>,
    diagnostics: GeometryDiagnostics,
    traces: Option<Vec<AgentTrace>>,
}

impl<C: Controller + Clone> Trial<C> {
    /// Sets up a trial with `agents_per_trial` copies of `controller`
    /// scattered at random over the arena.
    pub fn new<R: Rng>(params: &Parameters, controller: &C, rng: &mut R) -> Result<Trial<C>> {
        params.validate()?;
        let origin = Pose {
            position: (0.0, 0.0),
            heading: 0.0,
        };
        let mut trial = Trial::build(params, controller, &vec![origin; params.agents_per_trial]);
        trial.env.place_agents(rng)?;
        Ok(trial)
    }

    // one agent per pose, in that order
    pub fn with_poses(params: &Parameters, controller: &C, poses: &[Pose]) -> Trial<C> {
        Trial::build(params, controller, poses)
    }

    fn build(params: &Parameters, controller: &C, poses: &[Pose]) -> Trial<C> {
        let mut env = Environment::new(params);
        for (id, &pose) in poses.iter().enumerate() {
            let mut agent = Agent::new(id, pose, params.body_radius, controller.clone());
            agent.reset(pose);
            env.agents.push(agent);
        }

        let traces = params
            .record
            .then(|| vec![AgentTrace::default(); env.agents.len()]);

        Trial {
            params: params.clone(),
            env,
            step: 0,
            step_fitness: Vec::with_capacity(params.iterations),
            diagnostics: GeometryDiagnostics::default(),
            traces,
        }
    }

    pub fn environment(&self) -> &Environment<C> {
        &self.env
    }

    pub fn steps_taken(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.params.iterations
    }

    /// Advances every agent by one step and returns the fitness earned.
    ///
    /// All readings are taken from the arena as it stood at the start of the
    /// step, so no agent sees another's update for the same step.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Result<f64> {
        let bodies = self.env.bodies();

        let mut readings: Vec<SensorReadings> = Vec::with_capacity(bodies.len());
        for me in 0..bodies.len() {
            readings.push(sense(me, &bodies, &self.params, &mut self.diagnostics));
        }

        for (i, (agent, reading)) in self.env.agents.iter_mut().zip(readings).enumerate() {
            let before = agent.pose;
            let outputs = agent.think(reading)?;
            agent.act(&self.params, rng);

            if let Some(traces) = self.traces.as_mut() {
                let trace = &mut traces[i];
                trace.positions.push(before.position);
                trace.headings.push(before.heading);
                trace.inputs.push(reading.to_inputs());
                trace.outputs.push(outputs);
            }
        }

        let score = self.env.occupancy().into_iter().map(zone_score).sum();
        self.step_fitness.push(score);
        self.step += 1;
        Ok(score)
    }

    pub fn run<R: Rng>(mut self, rng: &mut R) -> Result<TrialOutcome> {
        while !self.is_finished() {
            self.step(rng)?;
        }
        Ok(self.finish())
    }

    pub fn finish(self) -> TrialOutcome {
        TrialOutcome {
            fitness: self.step_fitness.iter().sum(),
            step_fitness: self.step_fitness,
            diagnostics: self.diagnostics,
            traces: self.traces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use crate::genome::Genome;

    #[derive(Clone)]
    struct Still;

    impl Controller for Still {
        fn reset(&mut self) {}

        fn propagate(&mut self, _inputs: &[f64]) -> Result<MotorOutputs> {
            Ok(MotorOutputs::default())
        }
    }

    fn at(x: f64, y: f64) -> Pose {
        Pose {
            position: (x, y),
            heading: 0.0,
        }
    }

    #[test]
    fn zone_scores() {
        assert_eq!(zone_score(0), 0.0);
        assert_eq!(zone_score(1), 0.25);
        assert_eq!(zone_score(2), 0.5);
        assert_eq!(zone_score(3), -0.5);
        assert_eq!(zone_score(4), -1.5);
    }

    #[test]
    fn still_agents_score_every_step() {
        let params = Parameters {
            iterations: 10,
            ..Default::default()
        };
        let poses = [at(80.0, 80.0), at(90.0, 80.0), at(190.0, 190.0), at(20.0, 250.0)];
        let mut rng = SmallRng::seed_from_u64(3);
        let outcome = Trial::with_poses(&params, &Still, &poses)
            .run(&mut rng)
            .unwrap();
        assert_eq!(outcome.step_fitness, vec![0.75; 10]);
        assert!((outcome.fitness - 7.5).abs() < 1e-12);
        assert!(outcome.traces.is_none());
    }

    #[test]
    fn crowding_is_penalized() {
        let params = Parameters {
            iterations: 4,
            ..Default::default()
        };
        let poses = [at(70.0, 80.0), at(80.0, 80.0), at(90.0, 80.0)];
        let mut rng = SmallRng::seed_from_u64(3);
        let outcome = Trial::with_poses(&params, &Still, &poses)
            .run(&mut rng)
            .unwrap();
        assert_eq!(outcome.fitness, -2.0);
    }

    #[test]
    fn random_setup_rejects_an_arena_too_small_for_a_body() {
        let params = Parameters {
            arena_height: 5.0,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let err = Trial::new(&params, &Still, &mut rng).err().map(|e| e.code());
        assert_eq!(err, Some("settings.invalid"));
    }

    #[test]
    fn random_trial_runs_to_completion() {
        let params = Parameters {
            iterations: 50,
            record: true,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(11);
        let ctrnn = Ctrnn::decode(&Genome::random(69, &mut rng), true).unwrap();
        let mut trial = Trial::new(&params, &ctrnn, &mut rng).unwrap();
        assert_eq!(trial.environment().agents.len(), 4);
        trial.step(&mut rng).unwrap();
        assert_eq!(trial.steps_taken(), 1);

        let outcome = trial.run(&mut rng).unwrap();
        assert_eq!(outcome.step_fitness.len(), 50);
        let traces = outcome.traces.unwrap();
        assert_eq!(traces.len(), 4);
        for trace in &traces {
            assert_eq!(trace.positions.len(), 50);
            assert_eq!(trace.inputs.len(), 50);
            assert_eq!(trace.outputs.len(), 50);
            for &(x, y) in &trace.positions {
                assert!((2.6..=267.4).contains(&x));
                assert!((2.6..=267.4).contains(&y));
            }
        }
    }

    #[test]
    fn updates_are_simultaneous() {
        let params = Parameters {
            iterations: 30,
            wheel_noise: 0.0,
            record: true,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(21);
        let ctrnn = Ctrnn::decode(&Genome::random(69, &mut rng), true).unwrap();
        let a = Pose {
            position: (130.0, 40.0),
            heading: 0.0,
        };
        let b = Pose {
            position: (136.0, 40.0),
            heading: 180.0,
        };

        let forward = Trial::with_poses(&params, &ctrnn, &[a, b])
            .run(&mut rng)
            .unwrap()
            .traces
            .unwrap();
        let reversed = Trial::with_poses(&params, &ctrnn, &[b, a])
            .run(&mut rng)
            .unwrap()
            .traces
            .unwrap();

        assert_eq!(forward[0], reversed[1]);
        assert_eq!(forward[1], reversed[0]);
    }
}
