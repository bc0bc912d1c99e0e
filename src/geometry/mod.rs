//! 2D geometry primitives
//!
//! Points are plain `glam::DVec2` values. `Vector` carries a direction and
//! keeps whichever representation (cartesian or polar) it was built from, so
//! a zero-length vector still remembers where it was pointing.

pub mod polygon;
pub mod segment;
pub mod vector;

pub use polygon::{Pierce, Polygon};
pub use segment::{Line, Orientation, Ray, Segment, orientation};
pub use vector::Vector;

use std::f64::consts::{PI, TAU};

/// Default tolerance for [`is_zero`]
pub const ZERO_THRESHOLD: f64 = 0.0001;

/// One degree in radians, the default tolerance for [`angles_match`]
pub const ONE_DEGREE: f64 = PI / 180.0;

/// Map any angle into [0, 2π)
#[inline]
pub fn bound_angle(angle: f64) -> f64 {
    let bounded = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if bounded >= TAU { 0.0 } else { bounded }
}

/// Signed shortest rotation that takes `from` onto `to`, in (-π, π]
#[inline]
pub fn shortest_turn(from: f64, to: f64) -> f64 {
    let diff = bound_angle(to) - bound_angle(from);
    if diff > PI {
        diff - TAU
    } else if diff <= -PI {
        diff + TAU
    } else {
        diff
    }
}

/// Compare two headings within `threshold` radians
///
/// Returns `0` when they match, otherwise the direction (`1` counterclockwise,
/// `-1` clockwise) `from` must rotate to reach `to` along the shorter arc.
/// An exactly opposite heading turns counterclockwise.
pub fn angles_match(from: f64, to: f64, threshold: f64) -> i8 {
    let diff = shortest_turn(from, to);
    if diff.abs() <= threshold {
        0
    } else if diff > 0.0 {
        1
    } else {
        -1
    }
}

/// Check a value is zero within `threshold`
#[inline]
pub fn is_zero(value: f64, threshold: f64) -> bool {
    value.abs() <= threshold
}

/// Degrees to radians
#[inline]
pub fn radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}
