//! Trailing ribbon behind a goop
//!
//! The tail is a chain of `2 × size` joints. Each moving tick the oldest joint
//! is recycled to the head, so the chain records the recent path. Rendering
//! widens each joint along its perpendicular, tapering to a point.

use std::collections::VecDeque;
use std::f64::consts::FRAC_PI_2;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::radians;

/// Peak slither offset, in degrees
pub const SLITHER_MAX_DEG: f64 = 50.0;
/// Slither change per tick, in degrees
pub const SLITHER_RATE_DEG: f64 = 5.0;
/// The tail only records joints above this speed
pub const TAIL_MOTION_THRESHOLD: f64 = 0.1;

/// Side-to-side heading oscillation added to thrust
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Slither {
    angle: f64,
    up: bool,
}

impl Slither {
    /// Current offset in radians
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn rising(&self) -> bool {
        self.up
    }

    /// Recentre, next swinging toward `up`
    pub fn reset(&mut self, up: bool) {
        self.angle = 0.0;
        self.up = up;
    }

    pub fn advance(&mut self) {
        let sign = if self.up { 1.0 } else { -1.0 };
        let max = radians(SLITHER_MAX_DEG);
        self.angle += radians(SLITHER_RATE_DEG) * sign;
        if self.angle.abs() >= max {
            self.angle = max * sign;
            self.up = !self.up;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailJoint {
    /// Unit vector perpendicular to the travel direction when recorded
    pub perp: DVec2,
    pub position: DVec2,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tail {
    joints: VecDeque<TailJoint>,
    pub slither: Slither,
}

impl Tail {
    pub fn new(position: DVec2, size: f64) -> Self {
        let mut tail = Self::default();
        tail.sync(position, size);
        tail
    }

    /// Joint count for a goop of `size`
    pub fn length_for(size: f64) -> usize {
        (size * 2.0).round().max(1.0) as usize
    }

    /// Grow or shrink the chain at its tip to match `size`
    pub fn sync(&mut self, position: DVec2, size: f64) {
        let wanted = Self::length_for(size);
        if wanted < self.joints.len() {
            self.joints.truncate(wanted);
            return;
        }
        let seed = self.joints.back().map_or(position, |joint| joint.position);
        while self.joints.len() < wanted {
            self.joints.push_back(TailJoint {
                perp: DVec2::ZERO,
                position: seed,
            });
        }
    }

    /// Collapse the chain onto `position`
    pub fn reset(&mut self, position: DVec2, size: f64) {
        self.joints.clear();
        self.sync(position, size);
    }

    /// Recycle the oldest joint to the head
    pub fn update(&mut self, position: DVec2, velocity_angle: f64) {
        self.slither.advance();
        if let Some(mut joint) = self.joints.pop_back() {
            let perp = velocity_angle - FRAC_PI_2;
            joint.perp = DVec2::new(perp.cos(), perp.sin());
            joint.position = position;
            self.joints.push_front(joint);
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> impl Iterator<Item = &TailJoint> {
        self.joints.iter()
    }

    /// Oldest recorded position
    pub fn tip(&self) -> Option<DVec2> {
        self.joints.back().map(|joint| joint.position)
    }

    /// Left and right ribbon edges, head first
    ///
    /// Half-width runs from `size` (plus a tenth at the head) down to zero at
    /// the tip.
    pub fn ribbon(&self, size: f64) -> (Vec<DVec2>, Vec<DVec2>) {
        let len = self.joints.len();
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);
        for (i, joint) in self.joints.iter().enumerate() {
            let mut spread = if len > 1 {
                size * (len - 1 - i) as f64 / (len - 1) as f64
            } else {
                size
            };
            if i == 0 {
                spread += size / 10.0;
            }
            let offset = joint.perp * spread;
            left.push(joint.position + offset);
            right.push(joint.position - offset);
        }
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_tracks_size() {
        let mut tail = Tail::new(DVec2::new(5.0, 5.0), 4.0);
        assert_eq!(tail.len(), 8);
        assert!(tail.joints().all(|j| j.position == DVec2::new(5.0, 5.0)));

        // Growth seeds new joints at the current tip
        tail.update(DVec2::new(9.0, 5.0), 0.0);
        tail.sync(DVec2::new(9.0, 5.0), 5.0);
        assert_eq!(tail.len(), 10);
        assert_eq!(tail.tip(), Some(DVec2::new(5.0, 5.0)));

        tail.sync(DVec2::ZERO, 2.0);
        assert_eq!(tail.len(), 4);
    }

    #[test]
    fn test_update_recycles_oldest_joint() {
        let mut tail = Tail::new(DVec2::ZERO, 1.0);
        tail.update(DVec2::new(1.0, 0.0), 0.0);
        tail.update(DVec2::new(2.0, 0.0), 0.0);
        let positions: Vec<_> = tail.joints().map(|j| j.position).collect();
        assert_eq!(positions, vec![DVec2::new(2.0, 0.0), DVec2::new(1.0, 0.0)]);
        // Moving along +x, perpendicular points along -y
        let head = tail.joints().next().unwrap();
        assert!(head.perp.x.abs() < 1e-12);
        assert!((head.perp.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ribbon_tapers() {
        let mut tail = Tail::new(DVec2::ZERO, 2.0);
        for i in 1..=4 {
            tail.update(DVec2::new(i as f64, 0.0), std::f64::consts::FRAC_PI_2);
        }
        let (left, right) = tail.ribbon(2.0);
        assert_eq!(left.len(), 4);
        // Head: size + size / 10
        assert!((left[0].distance(right[0]) - 4.4).abs() < 1e-9);
        assert!((left[1].distance(right[1]) - 2.0 * 2.0 * 2.0 / 3.0).abs() < 1e-9);
        assert!(left[3].distance(right[3]) < 1e-9);
    }

    #[test]
    fn test_slither_swings_between_limits() {
        let mut s = Slither::default();
        let max = radians(SLITHER_MAX_DEG);
        let mut lowest = 0.0f64;
        let mut highest = 0.0f64;
        for _ in 0..100 {
            s.advance();
            lowest = lowest.min(s.angle());
            highest = highest.max(s.angle());
            assert!(s.angle().abs() <= max + 1e-12);
        }
        assert!((lowest + max).abs() < 1e-9);
        assert!((highest - max).abs() < 1e-9);

        s.reset(true);
        assert_eq!(s.angle(), 0.0);
        s.advance();
        assert!(s.angle() > 0.0);
    }
}
