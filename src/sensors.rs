//! Infra-red, communication and ground sensing against a snapshot of the arena.

use std::ops::AddAssign;

use tracing::debug;

use crate::geometry::{angle_between, bearing, distance, normalize_angle, project, Point};
use crate::params::{Parameters, TargetZone, COMM_SECTORS, IR_INSET, IR_ORIENTATION, IR_PLACEMENT};
use crate::topology::{COMM_COUNT, EXTERNAL_INPUTS, IR_COUNT};

/// Geometry inconsistencies met while sensing. They never abort a trial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometryDiagnostics {
    /// Bearings requested between two identical points.
    pub coincident_points: usize,
    /// IR sensors found inside another agent's body.
    pub ir_overlaps: usize,
}

impl GeometryDiagnostics {
    pub fn total(&self) -> usize {
        self.coincident_points + self.ir_overlaps
    }
}

impl AddAssign for GeometryDiagnostics {
    fn add_assign(&mut self, rhs: Self) {
        self.coincident_points += rhs.coincident_points;
        self.ir_overlaps += rhs.ir_overlaps;
    }
}

/// What other agents can observe of an agent at the start of a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Point,
    pub heading: f64,
    pub radius: f64,
    pub comm: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReadings {
    pub ir: [f64; IR_COUNT],
    pub comm: [f64; COMM_COUNT],
    pub ground: f64,
}

impl SensorReadings {
    /// Controller input order: IR, comm, ground.
    pub fn to_inputs(&self) -> [f64; EXTERNAL_INPUTS] {
        let mut inputs = [0.0; EXTERNAL_INPUTS];
        inputs[..IR_COUNT].copy_from_slice(&self.ir);
        inputs[IR_COUNT..IR_COUNT + COMM_COUNT].copy_from_slice(&self.comm);
        inputs[IR_COUNT + COMM_COUNT] = self.ground;
        inputs
    }
}

/// Reads every sensor of `bodies[me]`. Other bodies are told apart by index.
pub fn sense(
    me: usize,
    bodies: &[BodyState],
    params: &Parameters,
    diagnostics: &mut GeometryDiagnostics,
) -> SensorReadings {
    let body = &bodies[me];
    SensorReadings {
        ir: ir_readings(me, bodies, params, diagnostics),
        comm: if params.comm_enabled {
            comm_readings(me, bodies, params.comm_radius, diagnostics)
        } else {
            [0.0; COMM_COUNT]
        },
        ground: ground_reading(body.position, &params.targets),
    }
}

/// 1 when `position` lies inside any target zone, boundary included.
pub fn ground_reading(position: Point, targets: &[TargetZone]) -> f64 {
    let inside = targets.iter().any(|t| {
        let dx = position.0 - t.center.0;
        let dy = position.1 - t.center.1;
        dx * dx + dy * dy <= t.radius * t.radius
    });
    if inside {
        1.0
    } else {
        0.0
    }
}

/// Which comm sector a bearing offset (relative to the heading) falls into.
pub fn comm_sector(offset: f64) -> usize {
    let offset = normalize_angle(offset);
    COMM_SECTORS
        .iter()
        .position(|&(start, end)| {
            if start > end {
                offset >= start || offset < end
            } else {
                offset >= start && offset < end
            }
        })
        .unwrap_or(0)
}

/// Strongest broadcast heard in each sector, zero when silent.
pub fn comm_readings(
    me: usize,
    bodies: &[BodyState],
    radius: f64,
    diagnostics: &mut GeometryDiagnostics,
) -> [f64; COMM_COUNT] {
    let body = &bodies[me];
    let mut readings = [0.0f64; COMM_COUNT];

    for (other, peer) in bodies.iter().enumerate() {
        if other == me || distance(body.position, peer.position) > radius {
            continue;
        }
        let to_peer = match bearing(body.position, peer.position) {
            Ok(b) => b,
            Err(_) => {
                debug!(me, other, "peer shares our position; ignoring its broadcast");
                diagnostics.coincident_points += 1;
                continue;
            }
        };
        let sector = comm_sector(to_peer - body.heading);
        readings[sector] = readings[sector].max(peer.comm);
    }

    readings
}

pub fn ir_readings(
    me: usize,
    bodies: &[BodyState],
    params: &Parameters,
    diagnostics: &mut GeometryDiagnostics,
) -> [f64; IR_COUNT] {
    let body = &bodies[me];
    let mut readings = [0.0; IR_COUNT];
    for (i, reading) in readings.iter_mut().enumerate() {
        let origin = project(
            body.position,
            body.heading + IR_PLACEMENT[i],
            body.radius - IR_INSET,
        );
        let orientation = normalize_angle(body.heading + IR_ORIENTATION[i]);
        *reading = ir_reading(me, origin, orientation, bodies, params, diagnostics);
    }
    readings
}

/// Reading of a single IR sensor: `1 - d / range` for the nearest obstacle
/// within range, 0 otherwise.
pub fn ir_reading(
    me: usize,
    origin: Point,
    orientation: f64,
    bodies: &[BodyState],
    params: &Parameters,
    diagnostics: &mut GeometryDiagnostics,
) -> f64 {
    let range = params.ir_range;
    let walls = wall_distances(origin, orientation, range, params.arena_width, params.arena_height);
    let peers = bodies
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != me)
        .filter_map(|(_, peer)| {
            agent_distance(origin, orientation, range, peer.position, peer.radius, diagnostics)
        });

    walls
        .into_iter()
        .chain(peers)
        .reduce(f64::min)
        .map_or(0.0, |nearest| (1.0 - nearest / range).clamp(0.0, 1.0))
}

/// Distances along the beam to each wall its full-range tip would cross.
pub fn wall_distances(
    origin: Point,
    orientation: f64,
    range: f64,
    width: f64,
    height: f64,
) -> Vec<f64> {
    let tip = project(origin, orientation, range);
    let rad = orientation.to_radians();
    let (cos, sin) = (rad.cos(), rad.sin());

    let mut hits = Vec::new();
    if tip.0 > width {
        hits.push((width - origin.0) / cos);
    }
    if tip.0 < 0.0 {
        hits.push(origin.0 / -cos);
    }
    if tip.1 > height {
        hits.push((height - origin.1) / sin);
    }
    if tip.1 < 0.0 {
        hits.push(origin.1 / -sin);
    }
    hits.into_iter().map(|d| d.max(0.0)).collect()
}

/// Distance along the beam to the near side of a circular body, if the beam
/// meets it within `range`.
///
/// The sensor, the body's center and the hit point form a triangle with a
/// known side (sensor to center), the body radius, and the angle at the
/// sensor. The law of sines gives two candidate hit distances; negative ones
/// mean the sensor sits inside the body and are clamped to zero.
pub fn agent_distance(
    origin: Point,
    orientation: f64,
    range: f64,
    center: Point,
    radius: f64,
    diagnostics: &mut GeometryDiagnostics,
) -> Option<f64> {
    let side = distance(origin, center);
    if side >= range + radius {
        return None;
    }

    let to_center = match bearing(origin, center) {
        Ok(b) => b,
        Err(_) => {
            debug!(?origin, "IR sensor sits on another agent's center");
            diagnostics.coincident_points += 1;
            return None;
        }
    };

    let offset = angle_between(orientation, to_center);
    if offset >= 90.0 {
        return None;
    }
    let sin_offset = offset.to_radians().sin();
    if side * sin_offset >= radius {
        return None;
    }

    let candidates = if sin_offset < 1e-12 {
        [side - radius, side + radius]
    } else {
        let hit_angle = (side * sin_offset / radius).min(1.0).asin().to_degrees();
        [hit_angle - offset, 180.0 - hit_angle - offset]
            .map(|center_angle| radius * center_angle.to_radians().sin() / sin_offset)
    };

    candidates
        .into_iter()
        .map(|d| {
            if d < 0.0 {
                debug!(?origin, ?center, d, "IR sensor overlaps another agent");
                diagnostics.ir_overlaps += 1;
                0.0
            } else {
                d
            }
        })
        .filter(|&d| d < range)
        .reduce(f64::min)
}
