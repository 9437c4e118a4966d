use rulinalg::matrix::{BaseMatrix, BaseMatrixMut, Matrix};
use tracing::warn;

use crate::error::{Error, Result};
use crate::genome::Genome;
use crate::geometry::{rescale, unscale};
use crate::params::{BIAS_RANGE, LOCUS_MAX, LOCUS_MIN, TIME_CONST_RANGE, WEIGHT_RANGE};
use crate::topology::{
    NodeKind, NodeRole, Topology, EXTERNAL_INPUTS, NODE_COUNT, SENSORY_COUNT,
};

/// Latest activations of the three motor nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorOutputs {
    pub left: f64,
    pub right: f64,
    pub comm: f64,
}

/// Anything that turns one step of sensor readings into motor activations.
pub trait Controller {
    /// Clears all per-trial state.
    fn reset(&mut self);

    /// Advances one timestep given the IR, comm and ground readings.
    fn propagate(&mut self, inputs: &[f64]) -> Result<MotorOutputs>;
}

/// Fixed-topology continuous-time recurrent network decoded from a genome.
#[derive(Clone, Debug)]
pub struct Ctrnn {
    topology: &'static Topology,
    // time constants, zero for motor nodes
    pub tau: Vec<f64>,
    // bias, zero for sensory nodes
    pub theta: Vec<f64>,
    // wji[(j, i)] is the weight of the connection from node i into node j
    pub wji: Matrix<f64>,
    history: Vec<Vec<f64>>,
}

impl Ctrnn {
    /// Decodes `genome` into a controller for the chosen topology variant.
    ///
    /// A 69-locus genome handed to the reduced topology is converted by
    /// dropping its self-feedback loci; any other length mismatch fails.
    pub fn decode(genome: &Genome, self_feedback: bool) -> Result<Ctrnn> {
        let topology = Topology::variant(self_feedback);
        let expected = topology.genome_len();

        let converted;
        let genome = if genome.len() == expected {
            genome
        } else if !self_feedback && genome.len() == Topology::with_self_feedback().genome_len() {
            warn!(
                actual = genome.len(),
                expected, "converting self-feedback genome for the reduced topology"
            );
            converted = genome.without_self_feedback()?;
            &converted
        } else {
            return Err(Error::GenomeLength {
                expected,
                actual: genome.len(),
            });
        };

        let locus = |i: usize, range: (f64, f64)| {
            rescale(
                genome.loci()[i] as f64,
                LOCUS_MIN as f64,
                LOCUS_MAX as f64,
                range.0,
                range.1,
            )
        };

        let mut tau = vec![0.0; NODE_COUNT];
        let mut theta = vec![0.0; NODE_COUNT];
        for (n, node) in topology.nodes.iter().enumerate() {
            if let Some(i) = node.time_const_locus {
                tau[n] = locus(i, TIME_CONST_RANGE)?;
            }
            if let Some(i) = node.bias_locus {
                theta[n] = locus(i, BIAS_RANGE)?;
            }
        }

        let mut wji = Matrix::zeros(NODE_COUNT, NODE_COUNT);
        for c in &topology.connections {
            wji.mut_data()[c.to * NODE_COUNT + c.from] = locus(c.weight_locus, WEIGHT_RANGE)?;
        }

        let mut ctrnn = Ctrnn {
            topology,
            tau,
            theta,
            wji,
            history: Vec::new(),
        };
        ctrnn.reset_history();
        Ok(ctrnn)
    }

    /// Maps the decoded parameters back onto genome loci.
    pub fn encode(&self) -> Result<Genome> {
        let to_locus = |value: f64, range: (f64, f64)| -> Result<u8> {
            let x = unscale(value, LOCUS_MIN as f64, LOCUS_MAX as f64, range.0, range.1)?;
            Ok(x.round() as u8)
        };

        let mut loci = vec![0u8; self.topology.genome_len()];
        for (n, node) in self.topology.nodes.iter().enumerate() {
            if let Some(i) = node.time_const_locus {
                loci[i] = to_locus(self.tau[n], TIME_CONST_RANGE)?;
            }
            if let Some(i) = node.bias_locus {
                loci[i] = to_locus(self.theta[n], BIAS_RANGE)?;
            }
        }
        for c in &self.topology.connections {
            loci[c.weight_locus] = to_locus(self.weight(c.from, c.to), WEIGHT_RANGE)?;
        }
        Ok(Genome::new(loci))
    }

    pub fn topology(&self) -> &'static Topology {
        self.topology
    }

    pub fn weight(&self, from: usize, to: usize) -> f64 {
        self.wji.data()[to * NODE_COUNT + from]
    }

    pub fn activation_history(&self, role: NodeRole) -> &[f64] {
        &self.history[role.index()]
    }

    pub fn latest(&self, role: NodeRole) -> f64 {
        self.last(role.index())
    }

    pub fn get_outputs(&self) -> MotorOutputs {
        MotorOutputs {
            left: self.latest(NodeRole::MotorLeft),
            right: self.latest(NodeRole::MotorRight),
            comm: self.latest(NodeRole::CommUnit),
        }
    }

    pub fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    // Internal and motor nodes start one value ahead of the sensors.
    fn reset_history(&mut self) {
        self.history = self
            .topology
            .nodes
            .iter()
            .map(|node| match node.kind() {
                NodeKind::Sensory => vec![0.0],
                NodeKind::Internal | NodeKind::Motor => vec![0.0, 0.0],
            })
            .collect();
    }

    fn last(&self, node: usize) -> f64 {
        self.history[node].last().copied().unwrap_or(0.0)
    }

    fn integrate_sensor(&mut self, node: usize, signal: f64) {
        let tau = self.tau[node];
        let activation = self.last(node) * tau + signal * (1.0 - tau);
        self.history[node].push(activation);
    }
}

impl Controller for Ctrnn {
    fn reset(&mut self) {
        self.reset_history();
    }

    fn propagate(&mut self, inputs: &[f64]) -> Result<MotorOutputs> {
        if inputs.len() != EXTERNAL_INPUTS {
            return Err(Error::InputShape {
                expected: EXTERNAL_INPUTS,
                actual: inputs.len(),
            });
        }

        for (node, &signal) in inputs.iter().enumerate() {
            self.integrate_sensor(node, signal);
        }

        // the comm unit's value from before its most recent update
        let comm_unit = &self.history[NodeRole::CommUnit.index()];
        let heard = comm_unit[comm_unit.len().saturating_sub(2)];
        self.integrate_sensor(NodeRole::CommSelf.index(), heard);

        // sensors are fresh here, internal and motor nodes still hold t-1
        let state = Matrix::new(
            NODE_COUNT,
            1,
            (0..NODE_COUNT).map(|n| self.last(n)).collect::<Vec<_>>(),
        );
        let net = &self.wji * state;

        let next: Vec<f64> = (SENSORY_COUNT..NODE_COUNT)
            .map(|n| {
                let squashed = Ctrnn::sigmoid(self.theta[n] + net.data()[n]);
                match self.topology.nodes[n].kind() {
                    NodeKind::Internal => {
                        self.last(n) * self.tau[n] + squashed * (1.0 - self.tau[n])
                    }
                    _ => squashed,
                }
            })
            .collect();

        for (offset, activation) in next.into_iter().enumerate() {
            self.history[SENSORY_COUNT + offset].push(activation);
        }

        Ok(self.get_outputs())
    }
}
