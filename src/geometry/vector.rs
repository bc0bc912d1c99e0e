//! Dual-representation 2D vector
//!
//! A `Vector` is an immutable value that stores either cartesian components or
//! a magnitude/angle pair, whichever it was constructed from. The other form is
//! derived on read. Keeping the polar form matters for motion: an acceleration
//! with magnitude 0 still has a heading that the turn limiter reads.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::bound_angle;
use crate::error::{GeometryError, VectorComponent};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Repr {
    Cartesian { x: f64, y: f64 },
    /// Magnitude is kept non-negative and angle in [0, 2π)
    Polar { magnitude: f64, angle: f64 },
}

/// A direction with a length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    repr: Repr,
}

impl Default for Vector {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Vector {
    pub const ZERO: Vector = Vector {
        repr: Repr::Cartesian { x: 0.0, y: 0.0 },
    };

    /// Build from cartesian components
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            repr: Repr::Cartesian { x, y },
        }
    }

    /// Build from a magnitude and angle without materialising components
    ///
    /// A negative magnitude is folded into the opposite heading.
    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        if magnitude < 0.0 {
            Self {
                repr: Repr::Polar {
                    magnitude: -magnitude,
                    angle: bound_angle(angle + PI),
                },
            }
        } else {
            Self {
                repr: Repr::Polar {
                    magnitude,
                    angle: bound_angle(angle),
                },
            }
        }
    }

    /// Vector pointing from `a` to `b`
    #[inline]
    pub fn between(a: DVec2, b: DVec2) -> Self {
        Self::new(b.x - a.x, b.y - a.y)
    }

    /// Checked cartesian constructor
    pub fn try_new(x: f64, y: f64) -> Result<Self, GeometryError> {
        Self::new(x, y).validate()
    }

    /// Checked polar constructor
    pub fn try_polar(magnitude: f64, angle: f64) -> Result<Self, GeometryError> {
        if !magnitude.is_finite() {
            return Err(GeometryError::InvalidVectorState {
                component: VectorComponent::Magnitude,
                value: magnitude,
            });
        }
        if !angle.is_finite() {
            return Err(GeometryError::InvalidVectorState {
                component: VectorComponent::Angle,
                value: angle,
            });
        }
        Ok(Self::from_polar(magnitude, angle))
    }

    /// Reject a vector whose stored representation is not finite
    pub fn validate(self) -> Result<Self, GeometryError> {
        let (first, second) = match self.repr {
            Repr::Cartesian { x, y } => ((VectorComponent::X, x), (VectorComponent::Y, y)),
            Repr::Polar { magnitude, angle } => (
                (VectorComponent::Magnitude, magnitude),
                (VectorComponent::Angle, angle),
            ),
        };
        for (component, value) in [first, second] {
            if !value.is_finite() {
                return Err(GeometryError::InvalidVectorState { component, value });
            }
        }
        Ok(self)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        match self.repr {
            Repr::Cartesian { x, .. } => x,
            Repr::Polar { magnitude, angle } => magnitude * angle.cos(),
        }
    }

    #[inline]
    pub fn y(&self) -> f64 {
        match self.repr {
            Repr::Cartesian { y, .. } => y,
            Repr::Polar { magnitude, angle } => magnitude * angle.sin(),
        }
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        match self.repr {
            Repr::Cartesian { x, y } => x.hypot(y),
            Repr::Polar { magnitude, .. } => magnitude,
        }
    }

    #[inline]
    pub fn magnitude_squared(&self) -> f64 {
        match self.repr {
            Repr::Cartesian { x, y } => x * x + y * y,
            Repr::Polar { magnitude, .. } => magnitude * magnitude,
        }
    }

    /// Heading in [0, 2π); the zero cartesian vector points along +x
    #[inline]
    pub fn angle(&self) -> f64 {
        match self.repr {
            Repr::Cartesian { x, y } => {
                if x == 0.0 && y == 0.0 {
                    0.0
                } else {
                    bound_angle(y.atan2(x))
                }
            }
            Repr::Polar { angle, .. } => angle,
        }
    }

    /// Same heading, new length
    pub fn with_magnitude(&self, magnitude: f64) -> Self {
        match self.repr {
            Repr::Cartesian { x, y } if magnitude > 0.0 => {
                let current = x.hypot(y);
                if current > 0.0 {
                    let scale = magnitude / current;
                    Self::new(x * scale, y * scale)
                } else {
                    Self::from_polar(magnitude, 0.0)
                }
            }
            _ => Self::from_polar(magnitude, self.angle()),
        }
    }

    /// Same length, new heading
    pub fn with_angle(&self, angle: f64) -> Self {
        Self::from_polar(self.magnitude(), angle)
    }

    pub fn plus(&self, other: Vector) -> Self {
        Self::new(self.x() + other.x(), self.y() + other.y())
    }

    pub fn minus(&self, other: Vector) -> Self {
        self.plus(other.flipped())
    }

    /// Opposite heading, same length
    pub fn flipped(&self) -> Self {
        match self.repr {
            Repr::Cartesian { x, y } => Self::new(-x, -y),
            Repr::Polar { magnitude, angle } => Self {
                repr: Repr::Polar {
                    magnitude,
                    angle: bound_angle(angle + PI),
                },
            },
        }
    }

    pub fn flip(&mut self) {
        *self = self.flipped();
    }

    pub fn multiplied_by(&self, factor: f64) -> Self {
        match self.repr {
            Repr::Cartesian { x, y } => Self::new(x * factor, y * factor),
            Repr::Polar { magnitude, angle } => Self::from_polar(magnitude * factor, angle),
        }
    }

    pub fn extended_by(&self, amount: f64) -> Self {
        self.with_magnitude(self.magnitude() + amount)
    }

    pub fn extend_by(&mut self, amount: f64) {
        *self = self.extended_by(amount);
    }

    pub fn dot(&self, other: Vector) -> f64 {
        self.x() * other.x() + self.y() * other.y()
    }

    /// z component of the 3D cross product
    pub fn cross(&self, other: Vector) -> f64 {
        self.x() * other.y() - self.y() * other.x()
    }

    /// Projection of this vector onto `onto`; zero when `onto` has no length
    pub fn projection(&self, onto: Vector) -> Self {
        let len_sq = onto.magnitude_squared();
        if len_sq == 0.0 {
            return Self::ZERO;
        }
        let scale = self.dot(onto) / len_sq;
        Self::new(onto.x() * scale, onto.y() * scale)
    }

    /// Quadrant 1-4 by component sign; axes and origin fall in the lower-numbered quadrant
    pub fn quadrant(&self) -> u8 {
        let (x, y) = (self.x(), self.y());
        match (x >= 0.0, y >= 0.0) {
            (true, true) => 1,
            (true, false) => 2,
            (false, false) => 3,
            (false, true) => 4,
        }
    }

    #[inline]
    pub fn as_dvec2(&self) -> DVec2 {
        DVec2::new(self.x(), self.y())
    }
}

impl From<DVec2> for Vector {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vector> for DVec2 {
    fn from(v: Vector) -> Self {
        v.as_dvec2()
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        self.plus(rhs)
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        self.minus(rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        self.flipped()
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        self.multiplied_by(rhs)
    }
}
