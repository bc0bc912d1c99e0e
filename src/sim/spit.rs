//! Player projectiles

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, Collider};
use super::entity::{Collidable, EntityId, EntityTag, PeerView, UpdateContext};
use crate::error::GeometryError;
use crate::geometry::Vector;
use crate::render::{Canvas, Color};

pub const SPIT_SPEED: f64 = 20.0;
pub const SPIT_SIZE: f64 = 4.0;
pub const SPIT_FRICTION: f64 = 0.2;
/// Spit below this speed is spent
pub const SPIT_STOP_SPEED: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spit {
    pub body: Body,
    pub color: Color,
}

impl Spit {
    /// Launch from `position` at full speed along `heading`
    pub fn new(position: DVec2, heading: f64, color: Color) -> Self {
        let mut body = Body::new(position, SPIT_SIZE, Collider::Bullet);
        body.velocity = Vector::from_polar(SPIT_SPEED, heading);
        body.velocity_terminal = SPIT_SPEED;
        body.friction = SPIT_FRICTION;
        body.acceleration = Vector::from_polar(0.0, heading);
        body.rotation = body.velocity.angle();
        body.turn_rate = 0.0;
        Self { body, color }
    }

    pub fn update(
        &mut self,
        id: EntityId,
        peers: &[PeerView],
        ctx: &mut UpdateContext,
    ) -> Result<(), GeometryError> {
        self.resolve_collisions(id, peers, ctx);
        if self.body.removed {
            return Ok(());
        }
        self.body.advance(None)?;
        if self.body.velocity.magnitude() < SPIT_STOP_SPEED {
            self.body.removed = true;
        }
        Ok(())
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        if self.body.removed {
            return;
        }
        canvas.set_stroke(self.color);
        canvas.begin_path();
        canvas.arc(self.body.position, self.body.size, 0.0, TAU);
        canvas.stroke();
        // Streak over the last tick of travel
        let back = self.body.position - self.body.velocity.as_dvec2();
        canvas.polyline(&[back, self.body.position]);
    }
}

impl Collidable for Spit {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn resolve_collisions(&mut self, _id: EntityId, peers: &[PeerView], _ctx: &mut UpdateContext) {
        if peers.iter().any(|p| p.tag == EntityTag::Goop) {
            self.body.removed = true;
        }
    }
}
