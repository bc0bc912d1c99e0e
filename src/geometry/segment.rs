//! Segments, lines and rays
//!
//! Intersection tests return `Option`: parallel, collinear and zero-length
//! inputs simply do not intersect.

use glam::DVec2;

use super::Vector;

/// Length used when a ray has to be treated as a finite segment
pub const RAY_REACH: f64 = 999_999.0;

/// Orientation of an ordered point triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Orientation of the triplet (p1, p2, p3) in screen space (y down)
pub fn orientation(p1: DVec2, p2: DVec2, p3: DVec2) -> Orientation {
    let val = (p2.y - p1.y) * (p3.x - p2.x) - (p2.x - p1.x) * (p3.y - p2.y);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

#[inline]
fn cross(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Axis-aligned bounding check: is `p` within the box spanned by `a` and `b`
fn within_box(p: DVec2, a: DVec2, b: DVec2) -> bool {
    p.x <= a.x.max(b.x) && p.x >= a.x.min(b.x) && p.y <= a.y.max(b.y) && p.y >= a.y.min(b.y)
}

/// A bounded segment between two vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
}

impl Segment {
    pub const fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    /// Point where the two segments cross
    ///
    /// Segments sharing an endpoint, parallel or collinear segments report no
    /// intersection.
    pub fn intersection_point(&self, other: &Segment) -> Option<DVec2> {
        if self.a == other.a || self.a == other.b || self.b == other.a || self.b == other.b {
            return None;
        }
        let r = self.b - self.a;
        let s = other.b - other.a;
        let rxs = cross(r, s);
        if rxs == 0.0 {
            return None;
        }
        let qp = other.a - self.a;
        let t = cross(qp, s) / rxs;
        let u = cross(qp, r) / rxs;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.a + r * t)
        } else {
            None
        }
    }

    /// Cheaper yes/no intersection test (touching endpoints count)
    pub fn intersects(&self, other: &Segment) -> bool {
        let o1 = orientation(self.a, self.b, other.a);
        let o2 = orientation(self.a, self.b, other.b);
        let o3 = orientation(other.a, other.b, self.a);
        let o4 = orientation(other.a, other.b, self.b);
        if o1 != o2 && o3 != o4 {
            return true;
        }
        (o1 == Orientation::Collinear && within_box(other.a, self.a, self.b))
            || (o2 == Orientation::Collinear && within_box(other.b, self.a, self.b))
            || (o3 == Orientation::Collinear && within_box(self.a, other.a, other.b))
            || (o4 == Orientation::Collinear && within_box(self.b, other.a, other.b))
    }

    pub fn vector(&self) -> Vector {
        Vector::between(self.a, self.b)
    }

    pub fn line(&self) -> Line {
        Line::new(self.a, self.b)
    }

    /// Angle from A to B (atan2 range)
    pub fn angle(&self) -> f64 {
        (self.b.y - self.a.y).atan2(self.b.x - self.a.x)
    }

    pub fn flipped(&self) -> Self {
        Self::new(self.b, self.a)
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.a + self.b) * 0.5
    }

    pub fn distance(&self) -> f64 {
        self.a.distance(self.b)
    }

    pub fn distance_squared(&self) -> f64 {
        self.a.distance_squared(self.b)
    }

    /// Side of the segment `point` lies on: positive left, negative right
    pub fn direction_to(&self, point: DVec2) -> f64 {
        -self.vector().cross(Vector::between(self.a, point))
    }

    /// Closest point on the segment to `point`
    pub fn closest_point_to(&self, point: DVec2) -> DVec2 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq == 0.0 {
            return self.a;
        }
        let t = ((point - self.a).dot(ab) / len_sq).clamp(0.0, 1.0);
        self.a + ab * t
    }
}

/// An unbounded line through two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub a: DVec2,
    pub b: DVec2,
}

impl Line {
    pub const fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    fn determinant(&self, other: &Line) -> f64 {
        let y1 = self.b.y - self.a.y;
        let x1 = self.b.x - self.a.x;
        let y2 = other.b.y - other.a.y;
        let x2 = other.b.x - other.a.x;
        y1 * x2 - y2 * x1
    }

    pub fn intersects(&self, other: &Line) -> bool {
        self.determinant(other) != 0.0
    }

    pub fn intersection_point(&self, other: &Line) -> Option<DVec2> {
        let det = self.determinant(other);
        if det == 0.0 {
            return None;
        }
        let y1 = self.b.y - self.a.y;
        let x1 = self.b.x - self.a.x;
        let y2 = other.b.y - other.a.y;
        let x2 = other.b.x - other.a.x;
        let c1 = y1 * self.a.x - x1 * self.a.y;
        let c2 = y2 * other.a.x - x2 * other.a.y;
        Some(DVec2::new((x2 * c1 - x1 * c2) / det, (y2 * c1 - y1 * c2) / det))
    }
}

/// A half-line from `origin` heading along `angle` (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec2,
    pub angle: f64,
}

impl Ray {
    pub const fn new(origin: DVec2, angle: f64) -> Self {
        Self { origin, angle }
    }

    /// Finite stand-in for the ray
    pub fn as_segment(&self) -> Segment {
        let tip = self.origin + DVec2::new(self.angle.cos(), self.angle.sin()) * RAY_REACH;
        Segment::new(self.origin, tip)
    }

    pub fn intersection_point(&self, segment: &Segment) -> Option<DVec2> {
        self.as_segment().intersection_point(segment)
    }
}
