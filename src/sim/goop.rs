//! AI-controlled goops
//!
//! A goop is a body with a tail, a colour and an AI mode. Every tick it
//! resolves its collisions, moves, checks whether it has left the arena for
//! good, then lets its AI mode pick the next course.

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, Collider, State};
use super::collision::explosion_spread;
use super::entity::{
    Collidable, EntityId, EntityTag, PeerView, TailRenderable, UpdateContext,
};
use super::particulate::{Burst, Emission, Particulate};
use super::tail::{TAIL_MOTION_THRESHOLD, Tail};
use super::world::View;
use crate::error::GeometryError;
use crate::geometry::Vector;
use crate::render::{Canvas, Color, palette};

pub const ROAM_SPACE_MIN: f64 = 200.0;
pub const ROAM_SPACE_RANGE: f64 = 800.0;

const EXPLODE_COUNT: usize = 10;
const EXPLODE_COUNT_AT_REST: usize = 20;
const EXPLODE_SPEED_MAX: f64 = 6.0;
const EXPLODE_SPEED_AT_REST: f64 = 5.0;
const PHASED_ALPHA: f64 = 0.3;

/// Behaviour applied after motion each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiMode {
    #[default]
    None,
    /// Chase the player's current position
    Follow,
    /// Drift toward the player without braking waypoints
    FollowPeaceful,
    /// Coast forever on the current velocity
    Mindless,
    /// Keep this many random points around the goop queued
    Roam(usize),
    /// Keep this many random points inside the view queued
    Approach(usize),
}

impl AiMode {
    pub fn run(self, body: &mut Body, roam_space: f64, ctx: &mut UpdateContext) {
        match self {
            AiMode::None => {}
            AiMode::Follow => {
                if let Some(player) = ctx.player {
                    body.set_waypoint(player.position);
                }
            }
            AiMode::FollowPeaceful => {
                if let Some(player) = ctx.player {
                    let aim = Vector::between(body.position, player.position)
                        .multiplied_by(body.turn_rate)
                        .minus(body.stopping_vector());
                    body.thrust_toward(aim.angle());
                }
            }
            AiMode::Mindless => {
                body.friction = 0.0;
            }
            AiMode::Roam(points) => {
                while body.waypoints.len() < points {
                    let offset = DVec2::new(
                        (ctx.rng.random::<f64>() - 0.5) * roam_space,
                        (ctx.rng.random::<f64>() - 0.5) * roam_space,
                    );
                    body.waypoints.push_back(body.position + offset);
                }
            }
            AiMode::Approach(points) => {
                while body.waypoints.len() < points {
                    body.waypoints.push_back(ctx.view.random_point(ctx.rng));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goop {
    pub body: Body,
    /// Current draw colour, alpha included
    pub color: Color,
    pub ai: AiMode,
    pub tail: Tail,
    /// Wander radius for [`AiMode::Roam`]
    pub roam_space: f64,
}

impl Goop {
    pub fn new(position: DVec2, size: f64, color: Color) -> Self {
        Self {
            body: Body::new(position, size, Collider::Mob),
            color,
            ai: AiMode::None,
            tail: Tail::new(position, size),
            roam_space: ROAM_SPACE_MIN,
        }
    }

    pub fn with_ai(mut self, ai: AiMode) -> Self {
        self.ai = ai;
        self
    }

    /// Pick a wander radius in [200, 1000)
    pub fn randomize_roam_space(&mut self, rng: &mut Pcg32) {
        self.roam_space = ROAM_SPACE_MIN + (rng.random::<f64>() * ROAM_SPACE_RANGE).floor();
    }

    pub fn size(&self) -> f64 {
        self.body.size
    }

    /// Change size and resync the tail
    pub fn set_size(&mut self, size: f64) {
        self.body.size = size;
        self.tail.sync(self.body.position, size);
    }

    /// Burst into particulates and enter [`State::Exploded`]
    ///
    /// Without a velocity the burst is denser and heads along +x.
    pub fn explode(
        &mut self,
        velocity: Option<Vector>,
        choke_deg: f64,
        owner: Option<EntityId>,
        rng: &mut Pcg32,
    ) -> Vec<Particulate> {
        let color = if self.body.state == State::Rage {
            palette::BLACK
        } else {
            self.color.with_alpha(1.0)
        };
        self.body.state = State::Exploded;
        self.body.velocity = self.body.velocity.with_magnitude(0.0);
        self.body.coast();
        self.body.waypoints.clear();

        let (count, velocity) = match velocity.filter(|v| v.magnitude() > 0.0) {
            Some(v) => (EXPLODE_COUNT, v.with_magnitude(v.magnitude().min(EXPLODE_SPEED_MAX))),
            None => (
                EXPLODE_COUNT_AT_REST,
                Vector::from_polar(EXPLODE_SPEED_AT_REST, 0.0),
            ),
        };
        Emission {
            count,
            choke_deg,
            position: self.body.position,
            velocity,
            size: self.body.size / 2.0,
            angle_variance: 5.0,
            speed_variance: 3.0,
            size_variance: 4.0,
            color,
            burst: Burst::Explode,
            owner,
        }
        .generate(rng)
    }

    pub(crate) fn advance(&mut self) -> Result<(), GeometryError> {
        self.body.advance(Some(&mut self.tail.slither))
    }

    pub(crate) fn update_tail(&mut self) {
        if self.body.state.is_moving() && self.body.velocity.magnitude() > TAIL_MOTION_THRESHOLD {
            self.tail
                .update(self.body.position, self.body.velocity.angle());
        }
    }

    /// Remove the goop once it is gone for good past one side of the view
    ///
    /// Fleeing goops go as soon as the whole ribbon is out; otherwise the
    /// mode's cull margin applies, if it has one.
    pub fn cull(&mut self, view: &View, margin: Option<f64>) {
        let margin = if self.body.state == State::Flee {
            Some(0.0)
        } else {
            margin
        };
        let Some(margin) = margin else {
            return;
        };
        let head = self.body.position;
        let tip = self.tail.tip().unwrap_or(head);
        let r = self.body.size;
        let left = view.x - margin;
        let right = view.x + view.width + margin;
        let top = view.y - margin;
        let bottom = view.y + view.height + margin;
        let gone = (head.x + r < left && tip.x < left)
            || (head.x - r > right && tip.x > right)
            || (head.y + r < top && tip.y < top)
            || (head.y - r > bottom && tip.y > bottom);
        if gone {
            self.body.removed = true;
        }
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
        self.advance()?;
        self.cull(&ctx.view, ctx.config.cull_margin);
        if self.body.removed {
            return Ok(());
        }
        if self.body.state.is_moving() && self.body.state != State::Flee {
            self.ai.run(&mut self.body, self.roam_space, ctx);
        }
        self.update_tail();
        Ok(())
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        if self.body.state.is_moving() {
            self.render_tail(canvas);
        }
    }
}

impl Collidable for Goop {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Spit always pops a goop. A live player pops it unless the goop is
    /// bigger or enraged.
    fn resolve_collisions(&mut self, id: EntityId, peers: &[PeerView], ctx: &mut UpdateContext) {
        if !self.body.state.is_moving() {
            return;
        }
        for peer in peers {
            let pops = match peer.tag {
                EntityTag::Spit => true,
                EntityTag::Player => {
                    peer.state == State::None
                        && self.body.state != State::Rage
                        && self.body.size <= peer.size
                }
                EntityTag::Goop | EntityTag::Particulate => false,
            };
            if pops {
                let spread = explosion_spread(
                    self.body.velocity,
                    self.body.velocity_terminal,
                    peer.velocity,
                    peer.velocity_terminal,
                );
                let debris = self.explode(Some(spread.velocity), spread.choke_deg, None, ctx.rng);
                ctx.emit(debris);
                self.body.removed = true;
                log::trace!("Goop {} popped by {:?} {}", id, peer.tag, peer.id);
                return;
            }
        }
    }
}

impl TailRenderable for Goop {
    fn tail(&self) -> &Tail {
        &self.tail
    }

    fn draw_color(&self) -> Color {
        if self.body.state == State::Phased {
            self.color.with_alpha(self.color.a * PHASED_ALPHA)
        } else if self.body.state == State::Rage {
            palette::BLACK.with_alpha(self.color.a)
        } else {
            self.color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingCanvas;
    use crate::settings::{GameMode, ModeTable};
    use crate::sim::entity::{EntityKind, PlayerSnapshot};
    use rand::SeedableRng;

    struct Harness {
        rng: Pcg32,
        spawns: Vec<EntityKind>,
        view: View,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                rng: Pcg32::seed_from_u64(7),
                spawns: Vec::new(),
                view: View::new(0.0, 0.0, 800.0, 600.0),
            }
        }

        fn ctx(&mut self, player: Option<PlayerSnapshot>) -> UpdateContext<'_> {
            UpdateContext {
                view: self.view,
                mode: GameMode::Roam,
                config: *ModeTable::default().get(GameMode::Roam),
                player,
                fire_at: None,
                delta_ms: 16.0,
                rng: &mut self.rng,
                spawns: &mut self.spawns,
            }
        }
    }

    fn player_at(position: DVec2, size: f64) -> PlayerSnapshot {
        PlayerSnapshot {
            id: EntityId(1),
            position,
            velocity: Vector::ZERO,
            rotation: 0.0,
            size,
            state: State::None,
        }
    }

    fn peer(tag: EntityTag, size: f64, state: State) -> PeerView {
        PeerView {
            id: EntityId(1),
            tag,
            state,
            size,
            velocity: Vector::new(2.0, 0.0),
            velocity_terminal: 7.0,
        }
    }

    #[test]
    fn test_smaller_goop_pops_on_player() {
        let mut h = Harness::new();
        let mut goop = Goop::new(DVec2::new(100.0, 100.0), 5.0, palette::MOB);
        let peers = [peer(EntityTag::Player, 10.0, State::None)];
        goop.update(EntityId(2), &peers, &mut h.ctx(None)).unwrap();
        assert_eq!(goop.body.state, State::Exploded);
        assert!(goop.body.removed);
        assert_eq!(h.spawns.len(), EXPLODE_COUNT);
    }

    #[test]
    fn test_bigger_or_enraged_goop_survives() {
        let mut h = Harness::new();
        let mut big = Goop::new(DVec2::new(100.0, 100.0), 12.0, palette::MOB);
        let peers = [peer(EntityTag::Player, 10.0, State::None)];
        big.update(EntityId(2), &peers, &mut h.ctx(None)).unwrap();
        assert_eq!(big.body.state, State::None);

        let mut rage = Goop::new(DVec2::new(100.0, 100.0), 3.0, palette::MOB);
        rage.body.state = State::Rage;
        rage.update(EntityId(3), &peers, &mut h.ctx(None)).unwrap();
        assert_eq!(rage.body.state, State::Rage);

        // A phased player eats nothing
        let mut small = Goop::new(DVec2::new(100.0, 100.0), 3.0, palette::MOB);
        let phased = [peer(EntityTag::Player, 10.0, State::Phased)];
        small.update(EntityId(4), &phased, &mut h.ctx(None)).unwrap();
        assert!(!small.body.removed);
        assert!(h.spawns.is_empty());
    }

    #[test]
    fn test_spit_pops_enraged_goop() {
        let mut h = Harness::new();
        let mut goop = Goop::new(DVec2::new(100.0, 100.0), 30.0, palette::MOB);
        goop.body.state = State::Rage;
        let peers = [peer(EntityTag::Spit, 4.0, State::None)];
        goop.update(EntityId(2), &peers, &mut h.ctx(None)).unwrap();
        assert!(goop.body.removed);
        assert!(h.spawns.iter().all(|k| matches!(
            k,
            EntityKind::Particulate(p) if p.color.r == 0 && p.color.g == 0 && p.color.b == 0
        )));
    }

    #[test]
    fn test_explode_at_rest_is_dense() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut goop = Goop::new(DVec2::ZERO, 6.0, palette::MOB);
        let debris = goop.explode(None, 360.0, None, &mut rng);
        assert_eq!(debris.len(), EXPLODE_COUNT_AT_REST);
        assert_eq!(goop.body.state, State::Exploded);

        let mut goop = Goop::new(DVec2::ZERO, 6.0, palette::MOB);
        let fast = goop.explode(Some(Vector::new(40.0, 0.0)), 80.0, None, &mut rng);
        assert_eq!(fast.len(), EXPLODE_COUNT);
        // Speed is capped before variance
        assert!(fast.iter().all(|p| p.velocity.magnitude() <= EXPLODE_SPEED_MAX + 1.5));
    }

    #[test]
    fn test_follow_targets_player() {
        let mut h = Harness::new();
        let mut goop = Goop::new(DVec2::new(100.0, 100.0), 5.0, palette::MOB).with_ai(AiMode::Follow);
        let target = DVec2::new(300.0, 250.0);
        goop.update(EntityId(2), &[], &mut h.ctx(Some(player_at(target, 8.0))))
            .unwrap();
        assert_eq!(goop.body.waypoints.front(), Some(&target));
        assert_eq!(goop.body.waypoints.len(), 1);
    }

    #[test]
    fn test_roam_queues_points_within_space() {
        let mut h = Harness::new();
        let start = DVec2::new(400.0, 300.0);
        let mut goop = Goop::new(start, 5.0, palette::MOB).with_ai(AiMode::Roam(2));
        goop.randomize_roam_space(&mut h.rng);
        assert!((ROAM_SPACE_MIN..ROAM_SPACE_MIN + ROAM_SPACE_RANGE).contains(&goop.roam_space));
        assert_eq!(goop.roam_space.fract(), 0.0);
        goop.update(EntityId(2), &[], &mut h.ctx(None)).unwrap();
        assert_eq!(goop.body.waypoints.len(), 2);
        for w in &goop.body.waypoints {
            assert!((w.x - start.x).abs() <= goop.roam_space / 2.0);
            assert!((w.y - start.y).abs() <= goop.roam_space / 2.0);
        }
    }

    #[test]
    fn test_roam_keeps_queue_topped_up() {
        let mut h = Harness::new();
        let mut goop = Goop::new(DVec2::new(400.0, 300.0), 5.0, palette::MOB).with_ai(AiMode::Roam(2));
        goop.randomize_roam_space(&mut h.rng);
        let mut legs = 0;
        for _ in 0..2000 {
            let before = goop.body.waypoints.front().copied();
            let mut ctx = h.ctx(None);
            ctx.config.cull_margin = None;
            goop.update(EntityId(2), &[], &mut ctx).unwrap();
            assert_eq!(goop.body.waypoints.len(), 2);
            if before.is_some() && goop.body.waypoints.front().copied() != before {
                legs += 1;
            }
        }
        assert!(legs > 0);
    }

    #[test]
    fn test_follow_peaceful_thrusts_without_waypoints() {
        let mut h = Harness::new();
        let start = DVec2::new(100.0, 300.0);
        let target = DVec2::new(400.0, 300.0);
        let mut goop = Goop::new(start, 5.0, palette::MOB).with_ai(AiMode::FollowPeaceful);
        goop.update(EntityId(2), &[], &mut h.ctx(Some(player_at(target, 8.0))))
            .unwrap();
        let body = &goop.body;
        let expected = Vector::between(body.position, target)
            .multiplied_by(body.turn_rate)
            .minus(body.stopping_vector());
        assert!((body.acceleration.magnitude() - body.acceleration_max).abs() < 1e-9);
        assert!((body.acceleration.angle() - expected.angle()).abs() < 1e-9);
        assert!(body.waypoints.is_empty());

        for _ in 0..20 {
            goop.update(EntityId(2), &[], &mut h.ctx(Some(player_at(target, 8.0))))
                .unwrap();
        }
        // Still under full thrust, never braked by a final-approach cap
        assert!(goop.body.waypoints.is_empty());
        assert!(goop.body.position.x > start.x + 10.0);
        assert!(goop.body.velocity.magnitude() > 1.0);
    }

    #[test]
    fn test_approach_queues_view_points() {
        let mut h = Harness::new();
        let mut goop = Goop::new(DVec2::new(-50.0, 300.0), 5.0, palette::MOB).with_ai(AiMode::Approach(3));
        goop.update(EntityId(2), &[], &mut h.ctx(None)).unwrap();
        assert_eq!(goop.body.waypoints.len(), 3);
        assert!(goop.body.waypoints.iter().all(|w| h.view.contains(*w)));
    }

    #[test]
    fn test_mindless_coasts() {
        let mut h = Harness::new();
        let mut goop = Goop::new(DVec2::new(100.0, 100.0), 5.0, palette::MOB).with_ai(AiMode::Mindless);
        goop.body.velocity = Vector::from_polar(3.0, 0.0);
        // The first tick still feels friction
        goop.update(EntityId(2), &[], &mut h.ctx(None)).unwrap();
        assert_eq!(goop.body.friction, 0.0);
        let speed = goop.body.velocity.magnitude();
        let x = goop.body.position.x;
        for _ in 0..10 {
            goop.update(EntityId(2), &[], &mut h.ctx(None)).unwrap();
        }
        assert!((goop.body.velocity.magnitude() - speed).abs() < 1e-9);
        assert!((goop.body.position.x - x - 10.0 * speed).abs() < 1e-6);
    }

    #[test]
    fn test_flee_goop_culled_once_ribbon_leaves() {
        let view = View::new(0.0, 0.0, 800.0, 600.0);
        let mut goop = Goop::new(DVec2::new(-20.0, 300.0), 5.0, palette::MOB);
        goop.body.state = State::Flee;
        // Tail tip still inside the view
        goop.tail.reset(DVec2::new(10.0, 300.0), 5.0);
        goop.cull(&view, None);
        assert!(!goop.body.removed);

        goop.tail.reset(DVec2::new(-10.0, 300.0), 5.0);
        goop.cull(&view, None);
        assert!(goop.body.removed);
    }

    #[test]
    fn test_cull_margin_applies_outside_flee() {
        let view = View::new(0.0, 0.0, 800.0, 600.0);
        let mut goop = Goop::new(DVec2::new(1200.0, 300.0), 5.0, palette::MOB);
        goop.cull(&view, None);
        assert!(!goop.body.removed);
        goop.cull(&view, Some(1000.0));
        assert!(!goop.body.removed);
        goop.cull(&view, Some(300.0));
        assert!(goop.body.removed);
    }

    #[test]
    fn test_set_size_resyncs_tail() {
        let mut goop = Goop::new(DVec2::ZERO, 4.0, palette::MOB);
        goop.set_size(6.0);
        assert_eq!(goop.tail.len(), 12);
    }

    #[test]
    fn test_render_skips_dead_goop() {
        let mut canvas = RecordingCanvas::new();
        let mut goop = Goop::new(DVec2::ZERO, 4.0, palette::MOB);
        goop.render(&mut canvas);
        assert_eq!(canvas.arc_count(), 1);

        canvas.reset();
        goop.body.state = State::Exploded;
        goop.render(&mut canvas);
        assert!(canvas.calls.is_empty());
    }
}
