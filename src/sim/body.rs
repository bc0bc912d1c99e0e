//! Moving-object model
//!
//! A `Body` is the physical half of every simulated entity: position, velocity,
//! thrust, heading and a waypoint queue. Each tick [`Body::advance`] runs the
//! steering pipeline in a fixed order:
//!
//! 1. waypoint steering picks a thrust heading (braking on approach)
//! 2. heading turns toward it, limited by `turn_rate`
//! 3. thrust, friction or a full stop updates velocity
//! 4. explicit Euler integration moves the position

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::tail::Slither;
use crate::error::GeometryError;
use crate::geometry::{
    ONE_DEGREE, Vector, ZERO_THRESHOLD, angles_match, bound_angle, is_zero, radians, shortest_turn,
};

/// Default thrust per tick
pub const ACCELERATION_MAX: f64 = 0.4;
/// Default heading change per tick, in degrees
pub const TURN_RATE_DEG: f64 = 20.0;
pub const VELOCITY_TERMINAL: f64 = 5.0;
/// A waypoint closer than this is reached
pub const ARRIVAL_RADIUS: f64 = 1.0;
/// Speeds at or below this do not move the body
pub const INTEGRATION_THRESHOLD: f64 = 0.001;
/// Aim point along the waypoint vector, as a fraction of its length
const WAYPOINT_LEAD: f64 = 0.8;
/// On the last waypoint speed is also capped at this fraction of the distance
pub const FINAL_APPROACH_GAIN: f64 = 0.5;

/// Lifecycle state of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum State {
    #[default]
    None,
    Exploded,
    Reforming,
    Phased,
    Pergatory,
    Flee,
    Rage,
}

impl State {
    /// Physics and collisions only run in movement states
    #[inline]
    pub fn is_moving(self) -> bool {
        matches!(self, State::None | State::Phased | State::Flee | State::Rage)
    }
}

/// Collision filter tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Collider {
    #[default]
    None,
    Player,
    Bullet,
    Mob,
    Wall,
}

impl Collider {
    const PLAYER: u8 = 1;
    const BULLET: u8 = 2;
    const MOB: u8 = 4;
    const WALL: u8 = 8;

    fn bits(self) -> u8 {
        match self {
            Collider::None => 0,
            Collider::Player => Self::PLAYER,
            Collider::Bullet => Self::BULLET,
            Collider::Mob => Self::MOB,
            Collider::Wall => Self::WALL,
        }
    }

    fn mask(self) -> u8 {
        match self {
            Collider::None => 0,
            Collider::Player | Collider::Bullet => Self::MOB | Self::WALL,
            Collider::Mob => Self::PLAYER | Self::BULLET | Self::WALL,
            Collider::Wall => Self::PLAYER | Self::BULLET | Self::MOB | Self::WALL,
        }
    }

    /// Whether a pair with these tags is tested for overlap
    pub fn collides_with(self, other: Collider) -> bool {
        self.mask() & other.bits() != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub position: DVec2,
    pub velocity: Vector,
    /// Requested thrust; full thrust when its magnitude equals `acceleration_max`
    pub acceleration: Vector,
    pub acceleration_max: f64,
    /// Deceleration applied against velocity while not thrusting
    pub friction: f64,
    /// Facing, in [0, 2π)
    pub rotation: f64,
    /// Radians per tick; zero turns instantly
    pub turn_rate: f64,
    pub velocity_terminal: f64,
    pub collider: Collider,
    pub state: State,
    pub waypoints: VecDeque<DVec2>,
    /// Overlapping peers, rebuilt by the collision pass every tick
    #[serde(skip)]
    pub collisions: Vec<EntityId>,
    pub removed: bool,
    /// Collision radius
    pub size: f64,
}

impl Body {
    pub fn new(position: DVec2, size: f64, collider: Collider) -> Self {
        Self {
            position,
            velocity: Vector::ZERO,
            acceleration: Vector::ZERO,
            acceleration_max: ACCELERATION_MAX,
            friction: ACCELERATION_MAX,
            rotation: 0.0,
            turn_rate: radians(TURN_RATE_DEG),
            velocity_terminal: VELOCITY_TERMINAL,
            collider,
            state: State::None,
            waypoints: VecDeque::new(),
            collisions: Vec::new(),
            removed: false,
            size,
        }
    }

    /// Distance needed to stop at full deceleration: v² / (2·a)
    pub fn stopping_distance(&self) -> f64 {
        if self.acceleration_max <= 0.0 {
            return 0.0;
        }
        let speed_sq = self.velocity.magnitude_squared();
        if speed_sq == 0.0 {
            return 0.0;
        }
        speed_sq / (2.0 * self.acceleration_max)
    }

    /// Displacement covered while braking, along the current velocity
    pub fn stopping_vector(&self) -> Vector {
        self.velocity.with_magnitude(self.stopping_distance())
    }

    /// Replace the waypoint queue with a single target
    pub fn set_waypoint(&mut self, target: DVec2) {
        self.waypoints.clear();
        self.waypoints.push_back(target);
    }

    /// Full thrust along `heading`
    pub fn thrust_toward(&mut self, heading: f64) {
        self.acceleration = Vector::from_polar(self.acceleration_max, heading);
    }

    /// Drop thrust while keeping its heading
    pub fn coast(&mut self) {
        self.acceleration = self.acceleration.with_magnitude(0.0);
    }

    /// Point thrust at the first waypoint; returns this tick's speed cap
    pub fn steer(&mut self) -> f64 {
        let cap = self.velocity_terminal;
        let Some(&target) = self.waypoints.front() else {
            return cap;
        };
        let to_target = Vector::between(self.position, target);
        let distance = to_target.magnitude();
        if distance < ARRIVAL_RADIUS {
            self.waypoints.pop_front();
            self.coast();
            return cap;
        }

        if self.state == State::Rage {
            self.thrust_toward(to_target.angle());
            return cap;
        }

        let aim = to_target
            .multiplied_by(WAYPOINT_LEAD)
            .minus(self.stopping_vector());
        self.thrust_toward(aim.angle());

        if self.waypoints.len() == 1 {
            // Close in: the speed cap does the braking, so aim straight
            let approach = FINAL_APPROACH_GAIN * distance;
            if approach < cap {
                self.thrust_toward(to_target.angle());
                return approach;
            }
            return cap;
        }

        // Another waypoint follows: cut the corner once lined up
        if angles_match(self.velocity.angle(), to_target.angle(), ONE_DEGREE) == 0 {
            self.thrust_toward(to_target.angle());
            if distance <= self.stopping_distance() * 2.0 || distance <= self.acceleration_max {
                self.waypoints.pop_front();
            }
        }
        cap
    }

    /// Rotate toward the thrust heading by at most `turn_rate`
    ///
    /// A limited turn resets the slither so the wiggle restarts on the
    /// outside of the turn.
    pub fn turn(&mut self, slither: Option<&mut Slither>) {
        let desired = self.acceleration.angle();
        if is_zero(self.turn_rate, ZERO_THRESHOLD) {
            self.rotation = desired;
            return;
        }
        let delta = shortest_turn(self.rotation, desired);
        if delta.abs() > self.turn_rate {
            self.rotation = bound_angle(self.rotation + self.turn_rate.copysign(delta));
            if let Some(slither) = slither {
                slither.reset(delta > 0.0);
            }
        } else {
            self.rotation = desired;
        }
    }

    /// Thrust, friction or stop
    pub fn apply_thrust(&mut self, heading_offset: f64, cap: f64) {
        if is_zero(self.acceleration_max - self.acceleration.magnitude(), ZERO_THRESHOLD) {
            let push = Vector::from_polar(self.acceleration_max, self.rotation + heading_offset);
            self.velocity = self.velocity.plus(push);
            let speed = self.velocity.magnitude().min(cap);
            self.velocity = self.velocity.with_magnitude(speed);
        } else if self.velocity.magnitude_squared() > self.friction * self.friction {
            let drag = Vector::from_polar(self.friction, self.velocity.flipped().angle());
            self.velocity = self.velocity.plus(drag);
        } else {
            self.velocity = self.velocity.with_magnitude(0.0);
        }

        if self.velocity.magnitude() > self.velocity_terminal {
            self.velocity = self.velocity.with_magnitude(self.velocity_terminal);
        }
    }

    pub fn integrate(&mut self) {
        if self.velocity.magnitude() > INTEGRATION_THRESHOLD {
            self.position += self.velocity.as_dvec2();
        }
    }

    /// Run one tick of steering and integration
    ///
    /// Does nothing outside movement states. Fails if the motion state has
    /// become non-finite, before the bad velocity reaches the position.
    pub fn advance(&mut self, mut slither: Option<&mut Slither>) -> Result<(), GeometryError> {
        if !self.state.is_moving() {
            return Ok(());
        }
        let cap = self.steer();
        self.turn(slither.as_deref_mut());
        let offset = slither.map_or(0.0, |s| s.angle());
        self.apply_thrust(offset, cap);
        self.acceleration.validate()?;
        self.velocity.validate()?;
        self.integrate();
        Vector::from(self.position).validate()?;
        Ok(())
    }
}
