use rand::Rng;

use crate::agent::Agent;
use crate::ctrnn::{Controller, Ctrnn};
use crate::error::{Error, Result};
use crate::geometry::{distance, Point};
use crate::kinematics::Pose;
use crate::params::{Parameters, TargetZone, MAX_PLACEMENT_ATTEMPTS};
use crate::sensors::BodyState;

/// The arena, its target zones and the agents moving in it.
#[derive(Clone, Debug)]
pub struct Environment<C = Ctrnn> {
    pub width: f64,
    pub height: f64,
    pub targets: Vec<TargetZone>,
    pub agents: Vec<Agent<C>>,
}

impl<C: Controller> Environment<C> {
    pub fn new(params: &Parameters) -> Environment<C> {
        Environment {
            width: params.arena_width,
            height: params.arena_height,
            targets: params.targets.clone(),
            agents: Vec::new(),
        }
    }

    pub fn bodies(&self) -> Vec<BodyState> {
        self.agents.iter().map(Agent::body).collect()
    }

    /// The first target zone an agent of `radius` centered at `position`
    /// touches, if any.
    pub fn zone_of(&self, position: Point, radius: f64) -> Option<usize> {
        self.targets
            .iter()
            .position(|t| distance(t.center, position) <= t.radius + radius)
    }

    pub fn occupancy(&self) -> Vec<usize> {
        let mut counts = vec![0; self.targets.len()];
        for agent in &self.agents {
            if let Some(zone) = self.zone_of(agent.pose.position, agent.radius) {
                counts[zone] += 1;
            }
        }
        counts
    }

    /// Draws a random pose inside the walls, clear of every target zone and
    /// of the bodies already placed at `taken`.
    pub fn random_pose<R: Rng>(
        &self,
        radius: f64,
        taken: &[Point],
        agent: usize,
        rng: &mut R,
    ) -> Result<Pose> {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let position = (
                rng.gen_range(radius..=self.width - radius),
                rng.gen_range(radius..=self.height - radius),
            );
            let heading = rng.gen_range(0.0..360.0);

            let in_zone = self.zone_of(position, radius).is_some();
            let collides = taken.iter().any(|&p| distance(p, position) < 2.0 * radius);
            if !in_zone && !collides {
                return Ok(Pose { position, heading });
            }
        }
        Err(Error::Placement {
            agent,
            attempts: MAX_PLACEMENT_ATTEMPTS,
        })
    }

    /// Scatters all agents over the arena and resets their controllers.
    pub fn place_agents<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let mut taken = Vec::with_capacity(self.agents.len());
        for i in 0..self.agents.len() {
            let radius = self.agents[i].radius;
            let pose = self.random_pose(radius, &taken, self.agents[i].id, rng)?;
            taken.push(pose.position);
            self.agents[i].reset(pose);
        }
        Ok(())
    }
}
