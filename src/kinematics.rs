use rand::Rng;

use crate::ctrnn::MotorOutputs;
use crate::geometry::{normalize_angle, project, Point};
use crate::params::Parameters;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Point,
    pub heading: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelNoise {
    pub left: f64,
    pub right: f64,
}

impl WheelNoise {
    pub const NONE: WheelNoise = WheelNoise {
        left: 1.0,
        right: 1.0,
    };

    pub fn sample<R: Rng>(amplitude: f64, rng: &mut R) -> WheelNoise {
        if amplitude <= 0.0 {
            return WheelNoise::NONE;
        }
        let range = 1.0 - amplitude..1.0 + amplitude;
        WheelNoise {
            left: rng.gen_range(range.clone()),
            right: rng.gen_range(range),
        }
    }
}

/// Moves a differential-drive body one step.
///
/// The heading turns first; the body then advances along the new heading
/// and is stopped by the walls.
pub fn drive(pose: Pose, outputs: MotorOutputs, noise: WheelNoise, params: &Parameters) -> Pose {
    let steps_per_second = 1.0 / params.iteration_time;
    let v_left = outputs.left * params.max_wheel_speed * noise.left;
    let v_right = outputs.right * params.max_wheel_speed * noise.right;

    let turn = ((v_right - v_left) / (params.wheel_separation * steps_per_second)).to_degrees();
    let displacement = (v_right + v_left) / (2.0 * steps_per_second);

    let heading = normalize_angle(pose.heading + turn);
    let raw = project(pose.position, heading, displacement);
    let r = params.body_radius;

    Pose {
        position: (
            raw.0.clamp(r, params.arena_width - r),
            raw.1.clamp(r, params.arena_height - r),
        ),
        heading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn outputs(left: f64, right: f64) -> MotorOutputs {
        MotorOutputs {
            left,
            right,
            comm: 0.0,
        }
    }

    #[test]
    fn equal_wheels_drive_straight() {
        let params = Parameters::default();
        let pose = Pose {
            position: (100.0, 100.0),
            heading: 90.0,
        };
        let next = drive(pose, outputs(1.0, 1.0), WheelNoise::NONE, &params);
        assert!((next.heading - 90.0).abs() < 1e-12);
        // full speed for a tenth of a second
        assert!((next.position.0 - 100.0).abs() < 1e-9);
        assert!((next.position.1 - 100.8).abs() < 1e-9);
    }

    #[test]
    fn opposite_wheels_spin_in_place() {
        let params = Parameters::default();
        let pose = Pose {
            position: (100.0, 100.0),
            heading: 10.0,
        };
        let next = drive(pose, outputs(0.0, 1.0), WheelNoise::NONE, &params);
        let turn = (8.0f64 / (5.2 * 10.0)).to_degrees();
        assert!((next.heading - (10.0 + turn)).abs() < 1e-9);

        let next = drive(pose, outputs(1.0, 0.0), WheelNoise::NONE, &params);
        assert!((next.heading - normalize_angle(10.0 - turn)).abs() < 1e-9);
    }

    #[test]
    fn body_moves_along_the_turned_heading() {
        let params = Parameters::default();
        let start = Pose {
            position: (100.0, 100.0),
            heading: 30.0,
        };
        let next = drive(start, outputs(0.25, 0.75), WheelNoise::NONE, &params);

        let turn = ((6.0f64 - 2.0) / (5.2 * 10.0)).to_degrees();
        let heading = 30.0 + turn;
        assert!((next.heading - heading).abs() < 1e-9);

        let along_new = project(start.position, heading, 0.4);
        let along_old = project(start.position, 30.0, 0.4);
        assert!((next.position.0 - along_new.0).abs() < 1e-9);
        assert!((next.position.1 - along_new.1).abs() < 1e-9);
        assert!((next.position.0 - along_old.0).abs() > 1e-3);
    }

    #[test]
    fn stopped_wheels_do_not_move() {
        let params = Parameters::default();
        let pose = Pose {
            position: (42.0, 17.5),
            heading: 123.0,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let noise = WheelNoise::sample(params.wheel_noise, &mut rng);
        assert_eq!(drive(pose, outputs(0.0, 0.0), noise, &params), pose);
    }

    #[test]
    fn walls_stop_the_body() {
        let params = Parameters::default();
        let pose = Pose {
            position: (269.0, 1.0),
            heading: 315.0,
        };
        let next = drive(pose, outputs(1.0, 1.0), WheelNoise::NONE, &params);
        assert_eq!(next.position, (270.0 - 2.6, 2.6));
    }

    #[test]
    fn noise_stays_within_amplitude() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..1000 {
            let noise = WheelNoise::sample(0.1, &mut rng);
            assert!((0.9..1.1).contains(&noise.left));
            assert!((0.9..1.1).contains(&noise.right));
        }
        assert_eq!(WheelNoise::sample(0.0, &mut rng), WheelNoise::NONE);
    }
}
