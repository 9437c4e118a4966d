//! Angles are in degrees, measured counter-clockwise from the positive x axis.

use crate::error::{Error, Result};

pub type Point = (f64, f64);

/// Orientation of the vector from `from` to `to`, in `[0, 360)`.
pub fn bearing(from: Point, to: Point) -> Result<f64> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if dx == 0.0 && dy == 0.0 {
        return Err(Error::CoincidentPoints);
    }
    Ok(normalize_angle(dy.atan2(dx).to_degrees()))
}

/// The point `distance` away from `p` in direction `angle`.
pub fn project(p: Point, angle: f64, distance: f64) -> Point {
    let rad = normalize_angle(angle).to_radians();
    (p.0 + distance * rad.cos(), p.1 + distance * rad.sin())
}

pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Absolute difference between two headings, folded into `[0, 180]`.
pub fn angle_between(a: f64, b: f64) -> f64 {
    let diff = (normalize_angle(a) - normalize_angle(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Affine map of `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
pub fn rescale(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> Result<f64> {
    if x < in_min || x > in_max || x.is_nan() {
        return Err(Error::Range {
            value: x,
            min: in_min,
            max: in_max,
        });
    }
    Ok((x - in_min) / (in_max - in_min) * (out_max - out_min) + out_min)
}

/// Inverse of [`rescale`].
pub fn unscale(y: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> Result<f64> {
    rescale(y, out_min, out_max, in_min, in_max)
}
