//! The player goop
//!
//! The player is a goop with no AI. It eats goops no bigger than itself
//! (growing by one on an even match), fires spit, phases in and out, and
//! reforms from converging particulates at rebirth.

use glam::DVec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, Collider, State};
use super::entity::{
    Collidable, EntityId, EntityTag, PeerView, SpitCapable, TailRenderable, UpdateContext,
};
use super::goop::Goop;
use super::particulate::{Burst, Emission, Particulate};
use super::spit::Spit;
use super::tail::Tail;
use crate::error::GeometryError;
use crate::geometry::{Vector, ZERO_THRESHOLD, is_zero, radians};
use crate::render::{Canvas, Color, palette};
use crate::settings::PlayerTuning;

/// Milliseconds between shots
pub const SPIT_RATE_MS: f64 = 80.0;
/// Speed lost entering the phase
pub const PHASE_OUT_DRAG: f64 = 1.0;
/// Speed gained leaving the phase
pub const PHASE_IN_BOOST: f64 = 1.5;
const REFORM_COUNT: usize = 20;
const REFORM_SPEED: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub goop: Goop,
    pub spit_cooldown_ms: f64,
}

impl Player {
    pub fn new(position: DVec2, size: f64) -> Self {
        let mut goop = Goop::new(position, size, palette::DOMINANT);
        goop.body.collider = Collider::Player;
        let mut player = Self {
            goop,
            spit_cooldown_ms: 0.0,
        };
        player.apply_tuning(&PlayerTuning::default());
        player
    }

    pub fn size(&self) -> f64 {
        self.goop.size()
    }

    pub fn state(&self) -> State {
        self.goop.body.state
    }

    pub fn apply_tuning(&mut self, tuning: &PlayerTuning) {
        let body = &mut self.goop.body;
        body.acceleration_max = tuning.acceleration_max;
        body.velocity_terminal = tuning.velocity_terminal;
        body.friction = tuning.friction;
        body.turn_rate = radians(tuning.turn_rate_deg);
    }

    /// Place the player at rest on `position`, facing `rotation`
    pub fn reset_motion(&mut self, position: DVec2, rotation: f64) {
        let body = &mut self.goop.body;
        body.position = position;
        body.velocity = Vector::from_polar(0.0, rotation);
        body.acceleration = Vector::from_polar(0.0, rotation);
        body.rotation = rotation;
        body.waypoints.clear();
        body.collisions.clear();
        self.goop.tail.reset(position, body.size);
        self.goop.tail.slither.reset(true);
        self.spit_cooldown_ms = 0.0;
    }

    pub fn explode(
        &mut self,
        velocity: Option<Vector>,
        choke_deg: f64,
        owner: EntityId,
        rng: &mut Pcg32,
    ) -> Vec<Particulate> {
        self.goop.explode(velocity, choke_deg, Some(owner), rng)
    }

    /// Slow down and shed a narrow spray
    pub fn phase_out(&mut self, rng: &mut Pcg32) -> Vec<Particulate> {
        let body = &mut self.goop.body;
        body.state = State::Phased;
        let speed = (body.velocity.magnitude() - PHASE_OUT_DRAG).max(0.0);
        body.velocity = body.velocity.with_magnitude(speed);
        Emission {
            count: 26,
            choke_deg: 30.0,
            position: body.position,
            velocity: body.velocity,
            size: 2.0,
            angle_variance: 5.0,
            speed_variance: 0.2,
            size_variance: 0.5,
            color: palette::DOMINANT,
            burst: Burst::Explode,
            owner: None,
        }
        .generate(rng)
    }

    /// Burst back in, kicking off against the spray
    pub fn phase_in(&mut self, rng: &mut Pcg32) -> Vec<Particulate> {
        let body = &mut self.goop.body;
        body.state = State::None;
        let debris = Emission {
            count: 10,
            choke_deg: 70.0,
            position: body.position,
            velocity: body.velocity.flipped(),
            size: 2.0,
            angle_variance: 5.0,
            speed_variance: 0.2,
            size_variance: 0.5,
            color: palette::DOMINANT,
            burst: Burst::Explode,
            owner: None,
        }
        .generate(rng);
        let speed = (body.velocity.magnitude() + PHASE_IN_BOOST).min(body.velocity_terminal);
        body.velocity = body.velocity.with_magnitude(speed);
        debris
    }

    /// Flip between [`State::None`] and [`State::Phased`]; other states ignore it
    pub fn toggle_phase(&mut self, rng: &mut Pcg32) -> Vec<Particulate> {
        match self.state() {
            State::None => self.phase_out(rng),
            State::Phased => self.phase_in(rng),
            _ => Vec::new(),
        }
    }

    /// Enter [`State::Reforming`] around the current position
    pub fn reform(&mut self, owner: EntityId, rng: &mut Pcg32) -> Vec<Particulate> {
        let body = &mut self.goop.body;
        body.state = State::Reforming;
        Emission {
            count: REFORM_COUNT,
            choke_deg: 360.0,
            position: body.position,
            velocity: Vector::from_polar(REFORM_SPEED, body.rotation),
            size: 0.5,
            angle_variance: 5.0,
            speed_variance: 0.5,
            size_variance: 0.4,
            color: palette::DOMINANT,
            burst: Burst::Reform,
            owner: Some(owner),
        }
        .generate(rng)
    }

    pub fn update(
        &mut self,
        id: EntityId,
        peers: &[PeerView],
        ctx: &mut UpdateContext,
    ) -> Result<(), GeometryError> {
        self.resolve_collisions(id, peers, ctx);
        self.goop.advance()?;
        self.goop.update_tail();
        self.try_spit(id, ctx);
        self.spit_cooldown_ms = (self.spit_cooldown_ms - ctx.delta_ms).max(0.0);
        Ok(())
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        if self.state().is_moving() {
            self.render_tail(canvas);
        }
    }
}

impl Collidable for Player {
    fn body(&self) -> &Body {
        &self.goop.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.goop.body
    }

    /// Eat goops no bigger than the player; anything bigger or enraged
    /// wins and the player explodes
    fn resolve_collisions(&mut self, id: EntityId, peers: &[PeerView], ctx: &mut UpdateContext) {
        if self.state() != State::None {
            return;
        }
        for peer in peers {
            if peer.tag != EntityTag::Goop || !peer.state.is_moving() {
                continue;
            }
            if self.size() >= peer.size && peer.state != State::Rage {
                if is_zero(self.size() - peer.size, ZERO_THRESHOLD) {
                    self.goop.set_size(self.size() + 1.0);
                    log::debug!("Player grew to {}", self.size());
                }
            } else {
                let debris = self.explode(Some(peer.velocity), 360.0, id, ctx.rng);
                ctx.emit(debris);
                log::debug!("Player eaten by goop {} (size {})", peer.id, peer.size);
                return;
            }
        }
    }
}

impl TailRenderable for Player {
    fn tail(&self) -> &Tail {
        &self.goop.tail
    }

    fn draw_color(&self) -> Color {
        self.goop.draw_color()
    }
}

impl SpitCapable for Player {
    fn try_spit(&mut self, id: EntityId, ctx: &mut UpdateContext) -> bool {
        let Some(target) = ctx.fire_at else {
            return false;
        };
        if !ctx.config.spit_enabled || self.state() != State::None || self.spit_cooldown_ms > 0.0 {
            return false;
        }
        let origin = self.goop.body.position;
        let heading = Vector::between(origin, target).angle();
        ctx.spawns.push(Spit::new(origin, heading, palette::TONIC).into());
        let muzzle = Emission {
            count: 10,
            choke_deg: 40.0,
            position: origin,
            velocity: Vector::from_polar(6.0, heading),
            size: 4.0,
            angle_variance: 1.0,
            speed_variance: 1.0,
            size_variance: 1.0,
            color: palette::ACCENT,
            burst: Burst::Explode,
            owner: None,
        }
        .generate(ctx.rng);
        ctx.emit(muzzle);
        self.spit_cooldown_ms = SPIT_RATE_MS;
        log::trace!("Player {} spat toward ({:.0}, {:.0})", id, target.x, target.y);
        true
    }
}
