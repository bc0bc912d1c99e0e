//! Collision detection between circular bodies
//!
//! Detection runs once per tick over every pair in the arena and only records
//! overlaps. Each entity resolves its own list later, during its update.

use super::body::Body;
use super::entity::Arena;
use crate::geometry::Vector;

/// Minimum explosion spread, in degrees
pub const MIN_CHOKE_DEG: f64 = 80.0;

/// Direction and width of an explosion caused by a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    /// Combined velocity of both parties, clamped to their average terminal
    pub velocity: Vector,
    pub choke_deg: f64,
}

/// Explosion spread for a pair with the given motion
///
/// The faster the pair approaches their average terminal velocity, the
/// narrower the spray, down to [`MIN_CHOKE_DEG`]. At rest it is a full circle.
pub fn explosion_spread(a: Vector, a_terminal: f64, b: Vector, b_terminal: f64) -> Spread {
    let combined = a.plus(b);
    let average = (a_terminal + b_terminal) / 2.0;
    if average <= 0.0 {
        return Spread {
            velocity: combined.with_magnitude(0.0),
            choke_deg: 360.0,
        };
    }
    let speed = combined.magnitude().min(average);
    Spread {
        velocity: combined.with_magnitude(speed),
        choke_deg: (360.0 - 360.0 * speed / average).max(MIN_CHOKE_DEG),
    }
}

/// Whether two bodies touch this tick
pub fn overlaps(a: &Body, b: &Body) -> bool {
    if a.removed || b.removed || !a.state.is_moving() || !b.state.is_moving() {
        return false;
    }
    if !a.collider.collides_with(b.collider) {
        return false;
    }
    let reach = a.size + b.size;
    a.position.distance_squared(b.position) < reach * reach
}

/// Rebuild every body's collision list; returns the number of overlapping pairs
pub fn refresh(arena: &mut Arena) -> usize {
    let entities = arena.entities_mut();
    for body in entities.iter_mut().filter_map(|e| e.body_mut()) {
        body.collisions.clear();
    }

    let mut pairs = 0;
    for i in 0..entities.len() {
        let (head, rest) = entities.split_at_mut(i + 1);
        let a_id = head[i].id;
        let Some(a) = head[i].body_mut() else {
            continue;
        };
        for other in rest.iter_mut() {
            let b_id = other.id;
            let Some(b) = other.body_mut() else {
                continue;
            };
            if overlaps(a, b) {
                a.collisions.push(b_id);
                b.collisions.push(a_id);
                pairs += 1;
            }
        }
    }
    pairs
}
