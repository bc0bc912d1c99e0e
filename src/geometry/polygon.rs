//! Simple polygons
//!
//! Used for the viewport boundary: dispersal rays are cast against its edges
//! and spawn placement picks one of its sides.

use std::f64::consts::{PI, TAU};

use glam::DVec2;

use super::segment::{Orientation, Ray, Segment, orientation};
use super::{Vector, bound_angle};

/// Nearest crossing of a segment through a polygon edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pierce {
    pub edge_index: usize,
    pub edge: Segment,
    pub point: DVec2,
    /// Squared distance from the piercing segment's start to `point`
    pub distance_squared: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<DVec2>,
    circumcenter: DVec2,
    circumradius: f64,
    signed_area: f64,
}

impl Polygon {
    pub fn new(vertices: Vec<DVec2>) -> Self {
        let circumcenter = if vertices.is_empty() {
            DVec2::ZERO
        } else {
            vertices.iter().copied().sum::<DVec2>() / vertices.len() as f64
        };
        let circumradius = vertices
            .iter()
            .map(|v| v.distance_squared(circumcenter))
            .fold(0.0, f64::max)
            .sqrt();
        let n = vertices.len();
        let signed_area = (0..n)
            .map(|i| {
                let (a, b) = (vertices[i], vertices[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0;
        Self {
            vertices,
            circumcenter,
            circumradius,
            signed_area,
        }
    }

    /// Axis aligned rectangle with its top-left corner at `origin`
    ///
    /// Edges are ordered top, right, bottom, left (y grows downward).
    pub fn rect(origin: DVec2, width: f64, height: f64) -> Self {
        Self::new(vec![
            origin,
            origin + DVec2::new(width, 0.0),
            origin + DVec2::new(width, height),
            origin + DVec2::new(0.0, height),
        ])
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Average of the vertices
    pub fn circumcenter(&self) -> DVec2 {
        self.circumcenter
    }

    /// Radius of the circle around the circumcenter enclosing every vertex
    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }

    /// Edge `i` runs from vertex `i` to vertex `i + 1` (wrapping)
    pub fn edge(&self, i: usize) -> Segment {
        let n = self.vertices.len();
        Segment::new(self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.vertices.len()).map(move |i| self.edge(i))
    }

    /// Even-odd point containment; points on the boundary are outside
    pub fn contains_point(&self, p: DVec2) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let mut inside = false;
        for edge in self.edges() {
            if orientation(edge.a, p, edge.b) == Orientation::Collinear
                && p.x >= edge.a.x.min(edge.b.x)
                && p.x <= edge.a.x.max(edge.b.x)
                && p.y >= edge.a.y.min(edge.b.y)
                && p.y <= edge.a.y.max(edge.b.y)
            {
                return false;
            }
            let (a, b) = (edge.a, edge.b);
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Whether every vertex of `peer` lies inside this polygon
    pub fn contains(&self, peer: &Polygon) -> bool {
        peer.vertices.iter().all(|v| self.contains_point(*v))
    }

    /// Closest edge crossing along `segment`, measured from `segment.a`
    pub fn pierce(&self, segment: &Segment) -> Option<Pierce> {
        self.edges()
            .enumerate()
            .filter_map(|(edge_index, edge)| {
                segment.intersection_point(&edge).map(|point| Pierce {
                    edge_index,
                    edge,
                    point,
                    distance_squared: point.distance_squared(segment.a),
                })
            })
            .min_by(|l, r| l.distance_squared.total_cmp(&r.distance_squared))
    }

    pub fn pierce_ray(&self, ray: &Ray) -> Option<Pierce> {
        self.pierce(&ray.as_segment())
    }

    /// Edge-crossing overlap test with a circumcircle early-out
    pub fn overlaps(&self, peer: &Polygon) -> bool {
        let dist = self.circumcenter.distance(peer.circumcenter);
        if dist >= self.circumradius + peer.circumradius {
            return false;
        }
        self.edges()
            .any(|ours| peer.edges().any(|theirs| ours.intersection_point(&theirs).is_some()))
    }

    /// Point just outside the polygon nearest to `point`
    ///
    /// Returns `point` itself when it is already outside.
    pub fn closest_point_outside(&self, point: DVec2, extrude: f64) -> DVec2 {
        if !self.contains_point(point) {
            return point;
        }
        let nearest = self
            .edges()
            .map(|edge| edge.closest_point_to(point))
            .min_by(|l, r| l.distance_squared(point).total_cmp(&r.distance_squared(point)));
        match nearest {
            Some(edge_point) => {
                let exit = Vector::between(point, edge_point).extended_by(extrude);
                point + exit.as_dvec2()
            }
            None => point,
        }
    }

    /// Interior angle at vertex `index`, in radians
    pub fn interior_angle(&self, index: usize) -> f64 {
        let n = self.vertices.len();
        let vertex = self.vertices[index % n];
        let prev = self.vertices[(index + n - 1) % n];
        let next = self.vertices[(index + 1) % n];
        let to_prev = Vector::between(vertex, prev);
        let to_next = Vector::between(vertex, next);
        let a = bound_angle(to_prev.angle() - to_next.angle());
        if self.signed_area >= 0.0 { a } else { TAU - a }
    }

    pub fn concave(&self) -> bool {
        (0..self.vertices.len()).any(|i| self.interior_angle(i) > PI)
    }

    pub fn convex(&self) -> bool {
        !self.concave()
    }
}
