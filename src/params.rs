use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const LOCUS_MIN: u8 = 0;
pub const LOCUS_MAX: u8 = 255;

pub const TIME_CONST_RANGE: (f64, f64) = (0.0, 1.0);
pub const BIAS_RANGE: (f64, f64) = (-5.0, 5.0);
pub const WEIGHT_RANGE: (f64, f64) = (-5.0, 5.0);

// IR sensors, relative to the heading: where each sits on the body and where it points
pub const IR_PLACEMENT: [f64; 8] = [60.0, 36.0, 12.0, -12.0, -36.0, -60.0, -156.0, 156.0];
pub const IR_ORIENTATION: [f64; 8] = [90.0, 45.0, 0.0, 0.0, -45.0, -90.0, -180.0, 180.0];
/// IR sensors sit this far inside the rim of the body.
pub const IR_INSET: f64 = 0.3;

// front, left, rear, right as [start, end) offsets from the heading
pub const COMM_SECTORS: [(f64, f64); 4] = [
    (315.0, 45.0),
    (45.0, 135.0),
    (135.0, 225.0),
    (225.0, 315.0),
];

pub const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// A circular region of the arena whose occupancy is rewarded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetZone {
    pub center: (f64, f64),
    pub radius: f64,
}

impl TargetZone {
    pub fn new(x: f64, y: f64, radius: f64) -> TargetZone {
        TargetZone {
            center: (x, y),
            radius,
        }
    }
}

/// Everything a single trial needs to know about the world and the robots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Simulation steps per trial.
    pub iterations: usize,
    pub arena_width: f64,
    pub arena_height: f64,
    pub targets: Vec<TargetZone>,
    pub agents_per_trial: usize,
    /// When false every communication reading is forced to zero.
    pub comm_enabled: bool,
    pub body_radius: f64,
    pub ir_range: f64,
    pub comm_radius: f64,
    pub max_wheel_speed: f64,
    pub wheel_separation: f64,
    /// Seconds of simulated time per step.
    pub iteration_time: f64,
    /// Each wheel's speed is scaled by a factor drawn from `1 ± wheel_noise`.
    pub wheel_noise: f64,
    /// Keep per-step traces of every agent.
    pub record: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            iterations: 1000,
            arena_width: 270.0,
            arena_height: 270.0,
            targets: vec![
                TargetZone::new(80.0, 80.0, 35.0),
                TargetZone::new(190.0, 190.0, 35.0),
            ],
            agents_per_trial: 4,
            comm_enabled: true,
            body_radius: 2.6,
            ir_range: 5.0,
            comm_radius: 100.0,
            max_wheel_speed: 8.0,
            wheel_separation: 5.2,
            iteration_time: 0.1,
            wheel_noise: 0.1,
            record: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub population_size: usize,
    pub generations: usize,
    pub trials_per_genome: usize,
    pub include_top: usize,
    pub mutation_rate: f64,
    /// Selects the 69-locus topology (comm unit wired back into a sensor)
    /// over the 65-locus one.
    pub self_feedback: bool,
    pub parameters: Parameters,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            population_size: 100,
            generations: 100,
            trials_per_genome: 20,
            include_top: 20,
            mutation_rate: 0.02,
            self_feedback: true,
            parameters: Parameters::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidSettings(msg.to_string()));

        if self.population_size == 0 {
            return invalid("population_size must be non-zero");
        }
        if self.trials_per_genome == 0 {
            return invalid("trials_per_genome must be non-zero");
        }
        if self.include_top == 0 || self.include_top > self.population_size {
            return invalid("include_top must be within 1..=population_size");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid("mutation_rate must be within [0, 1]");
        }
        self.parameters.validate()
    }

    /// Number of genomes the next generation falls short of `population_size`
    /// because the replication ratio is truncated.
    pub fn replication_shortfall(&self) -> usize {
        if self.include_top == 0 {
            return self.population_size;
        }
        self.population_size % self.include_top
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidSettings(msg.to_string()));

        if self.arena_width <= 0.0 || self.arena_height <= 0.0 {
            return invalid("arena dimensions must be positive");
        }
        if self.body_radius <= 0.0
            || 2.0 * self.body_radius >= self.arena_width.min(self.arena_height)
        {
            return invalid("body_radius must be positive and fit inside the arena");
        }
        if self.ir_range <= 0.0 {
            return invalid("ir_range must be positive");
        }
        if self.iteration_time <= 0.0 || self.wheel_separation <= 0.0 {
            return invalid("iteration_time and wheel_separation must be positive");
        }
        if !(0.0..1.0).contains(&self.wheel_noise) {
            return invalid("wheel_noise must be within [0, 1)");
        }
        if self.agents_per_trial == 0 {
            return invalid("agents_per_trial must be non-zero");
        }
        if self.targets.iter().any(|t| t.radius < 0.0) {
            return invalid("target radius must not be negative");
        }
        Ok(())
    }
}
