//! The fixed controller wiring. Both variants are built once and shared
//! read-only by every controller.

use std::sync::OnceLock;

pub const IR_COUNT: usize = 8;
pub const COMM_COUNT: usize = 4;
pub const SENSORY_COUNT: usize = IR_COUNT + COMM_COUNT + 2;
pub const INTERNAL_COUNT: usize = 2;
pub const MOTOR_COUNT: usize = 3;
pub const NODE_COUNT: usize = SENSORY_COUNT + INTERNAL_COUNT + MOTOR_COUNT;

/// Readings fed to the controller each step: IR, comm and ground.
pub const EXTERNAL_INPUTS: usize = IR_COUNT + COMM_COUNT + 1;

/// Time constants and biases come first in the genome, weights after.
pub const NODE_PARAMETER_LOCI: usize = SENSORY_COUNT + 2 * INTERNAL_COUNT + MOTOR_COUNT;

/// Weight loci that only exist when the comm unit is wired back into the
/// comm_self sensor.
pub const SELF_FEEDBACK_LOCI: [usize; 4] = [60, 61, 62, 68];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Sensory,
    Internal,
    Motor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Ir(usize),
    Comm(usize),
    Ground,
    CommSelf,
    Internal(usize),
    MotorLeft,
    MotorRight,
    CommUnit,
}

impl NodeRole {
    pub const fn index(self) -> usize {
        match self {
            NodeRole::Ir(i) => i,
            NodeRole::Comm(i) => IR_COUNT + i,
            NodeRole::Ground => IR_COUNT + COMM_COUNT,
            NodeRole::CommSelf => IR_COUNT + COMM_COUNT + 1,
            NodeRole::Internal(i) => SENSORY_COUNT + i,
            NodeRole::MotorLeft => SENSORY_COUNT + INTERNAL_COUNT,
            NodeRole::MotorRight => SENSORY_COUNT + INTERNAL_COUNT + 1,
            NodeRole::CommUnit => SENSORY_COUNT + INTERNAL_COUNT + 2,
        }
    }

    pub const fn kind(self) -> NodeKind {
        match self {
            NodeRole::Ir(_) | NodeRole::Comm(_) | NodeRole::Ground | NodeRole::CommSelf => {
                NodeKind::Sensory
            }
            NodeRole::Internal(_) => NodeKind::Internal,
            NodeRole::MotorLeft | NodeRole::MotorRight | NodeRole::CommUnit => NodeKind::Motor,
        }
    }

    pub fn name(self) -> String {
        match self {
            NodeRole::Ir(i) => format!("IR_{i}"),
            NodeRole::Comm(i) => format!("comm_{i}"),
            NodeRole::Ground => "ground".to_string(),
            NodeRole::CommSelf => "comm_self".to_string(),
            NodeRole::Internal(i) => format!("internal_{}", i + 1),
            NodeRole::MotorLeft => "motor_left".to_string(),
            NodeRole::MotorRight => "motor_right".to_string(),
            NodeRole::CommUnit => "comm_unit".to_string(),
        }
    }

    fn all() -> impl Iterator<Item = NodeRole> {
        (0..IR_COUNT)
            .map(NodeRole::Ir)
            .chain((0..COMM_COUNT).map(NodeRole::Comm))
            .chain([NodeRole::Ground, NodeRole::CommSelf])
            .chain((0..INTERNAL_COUNT).map(NodeRole::Internal))
            .chain([NodeRole::MotorLeft, NodeRole::MotorRight, NodeRole::CommUnit])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub role: NodeRole,
    pub name: String,
    pub time_const_locus: Option<usize>,
    pub bias_locus: Option<usize>,
}

impl NodeSpec {
    pub fn kind(&self) -> NodeKind {
        self.role.kind()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionMode {
    SensorToInternal,
    SensorToMotor,
    InternalToInternal,
    InternalToMotor,
    MotorToSensor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub from: usize,
    pub to: usize,
    pub mode: ConnectionMode,
    pub weight_locus: usize,
}

#[derive(Debug)]
pub struct Topology {
    pub self_feedback: bool,
    pub nodes: Vec<NodeSpec>,
    pub connections: Vec<ConnectionSpec>,
}

impl Topology {
    pub fn with_self_feedback() -> &'static Topology {
        static TOPOLOGY: OnceLock<Topology> = OnceLock::new();
        TOPOLOGY.get_or_init(|| Topology::build(true))
    }

    pub fn without_self_feedback() -> &'static Topology {
        static TOPOLOGY: OnceLock<Topology> = OnceLock::new();
        TOPOLOGY.get_or_init(|| Topology::build(false))
    }

    pub fn variant(self_feedback: bool) -> &'static Topology {
        if self_feedback {
            Topology::with_self_feedback()
        } else {
            Topology::without_self_feedback()
        }
    }

    pub fn genome_len(&self) -> usize {
        NODE_PARAMETER_LOCI + self.connections.len()
    }

    pub fn node(&self, role: NodeRole) -> &NodeSpec {
        &self.nodes[role.index()]
    }

    /// Connections feeding into `node`.
    pub fn incoming(&self, node: usize) -> impl Iterator<Item = &ConnectionSpec> {
        self.connections.iter().filter(move |c| c.to == node)
    }

    fn build(self_feedback: bool) -> Topology {
        let nodes = NodeRole::all()
            .map(|role| {
                let (time_const_locus, bias_locus) = match role {
                    NodeRole::Internal(i) => (
                        Some(role.index()),
                        Some(SENSORY_COUNT + INTERNAL_COUNT + i),
                    ),
                    NodeRole::MotorLeft | NodeRole::MotorRight | NodeRole::CommUnit => {
                        (None, Some(role.index() + INTERNAL_COUNT))
                    }
                    _ => (Some(role.index()), None),
                };
                NodeSpec {
                    role,
                    name: role.name(),
                    time_const_locus,
                    bias_locus,
                }
            })
            .collect::<Vec<_>>();

        let internal_1 = NodeRole::Internal(0).index();
        let internal_2 = NodeRole::Internal(1).index();
        let left = NodeRole::MotorLeft.index();
        let right = NodeRole::MotorRight.index();
        let comm_unit = NodeRole::CommUnit.index();
        let comm_self = NodeRole::CommSelf.index();

        // (from, to, mode) in genome order
        let mut wiring = Vec::new();
        for node in &nodes {
            let from = node.role.index();
            match node.role {
                NodeRole::CommSelf => {
                    if self_feedback {
                        for to in [left, right, comm_unit] {
                            wiring.push((from, to, ConnectionMode::SensorToMotor));
                        }
                    }
                }
                NodeRole::Ir(_) | NodeRole::Comm(_) | NodeRole::Ground => {
                    wiring.push((from, internal_1, ConnectionMode::SensorToInternal));
                    wiring.push((from, left, ConnectionMode::SensorToMotor));
                    wiring.push((from, right, ConnectionMode::SensorToMotor));
                }
                NodeRole::Internal(0) => {
                    wiring.push((from, internal_2, ConnectionMode::InternalToInternal));
                    for to in [left, right, comm_unit] {
                        wiring.push((from, to, ConnectionMode::InternalToMotor));
                    }
                }
                NodeRole::Internal(_) => {
                    wiring.push((from, internal_1, ConnectionMode::InternalToInternal));
                }
                NodeRole::CommUnit => {
                    if self_feedback {
                        wiring.push((from, comm_self, ConnectionMode::MotorToSensor));
                    }
                }
                NodeRole::MotorLeft | NodeRole::MotorRight => {}
            }
        }

        let connections = wiring
            .into_iter()
            .enumerate()
            .map(|(n, (from, to, mode))| ConnectionSpec {
                from,
                to,
                mode,
                weight_locus: NODE_PARAMETER_LOCI + n,
            })
            .collect();

        Topology {
            self_feedback,
            nodes,
            connections,
        }
    }
}
