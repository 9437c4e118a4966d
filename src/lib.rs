//! Evolving CTRNN controllers for a foraging robot swarm.

pub mod agent;
pub mod ctrnn;
pub mod environment;
pub mod error;
pub mod experiment;
pub mod genome;
pub mod geometry;
pub mod kinematics;
pub mod params;
pub mod population;
pub mod sensors;
pub mod topology;
pub mod trial;

pub use ctrnn::{Controller, Ctrnn, MotorOutputs};
pub use error::{Error, Result};
pub use experiment::{evaluate_genome, replay, Evaluation, Experiment, GenerationReport};
pub use genome::Genome;
pub use params::{Parameters, Settings, TargetZone};
pub use trial::{Trial, TrialOutcome};
