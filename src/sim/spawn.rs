//! Spawn policies
//!
//! Each policy checks its own population cap and returns `None` when it
//! declines to spawn. A decline is routine and only logged at trace level.

use std::f64::consts::PI;

use glam::DVec2;
use rand::Rng;

use super::body::State;
use super::entity::{EntityId, EntityKind, EntityTag};
use super::goop::{AiMode, Goop};
use super::world::{FLEE_REACH, World};
use crate::geometry::{Ray, Vector, radians};
use crate::render::palette;
use crate::settings::{GameMode, ModeConfig, SpawnPolicy};

/// Chasers out-accelerate default goops by this factor
pub const CHASER_ACCELERATION_FACTOR: f64 = 4.0;
pub const CHASER_TERMINAL_FACTOR: f64 = 1.2;
pub const CHASER_TURN_RATE_DEG: f64 = 1.17;
/// Runners are placed this many sizes past the leading edge
pub const RUNNER_LEAD: f64 = 10.0;
pub const RUNNER_TERMINAL_MIN: f64 = 3.0;
pub const RUNNER_TERMINAL_RANGE: f64 = 1.5;
/// Blockers hold pace with the run camera
pub const BLOCKER_TERMINAL: f64 = 5.72;
pub const BLOCKER_SIZE: f64 = 8.0;
/// One blocker per this many pixels of view height
pub const BLOCKER_SPACING: f64 = 20.0;

impl World {
    /// Run the current mode's spawn policy once
    pub fn spawn_goop(&mut self) -> Option<EntityId> {
        let config = *self.config();
        let id = match config.spawn {
            SpawnPolicy::Roamer => self.spawn_roamer(&config),
            SpawnPolicy::Chaser => self.spawn_chaser(&config),
            SpawnPolicy::Horde => self.spawn_horde(&config),
            SpawnPolicy::Runner => self.spawn_runner(&config),
            SpawnPolicy::Disabled => None,
        };
        match id {
            Some(id) => log::debug!("Spawned {:?} goop {}", config.spawn, id),
            None => log::trace!("{:?} spawn skipped", config.spawn),
        }
        id
    }

    /// Size spawned goops are measured against
    fn spawn_base_size(&self, config: &ModeConfig) -> f64 {
        if self.mode == GameMode::None {
            return config.settings.start_size;
        }
        self.player()
            .map_or(config.settings.start_size, |player| player.size())
    }

    fn random_size(&mut self, base: f64, variance: f64) -> f64 {
        base + (self.rng.random::<f64>() * variance).floor()
    }

    /// Just outside the view, behind the player as seen from the view centre
    fn behind_player(&self, size: f64) -> Option<DVec2> {
        let player = self.player_snapshot()?;
        let ray = Ray::new(self.view.center(), player.rotation + PI);
        let hit = self.view.bounds().pierce_ray(&ray)?;
        Some(hit.point + DVec2::from_angle(ray.angle) * size)
    }

    fn spawn_roamer(&mut self, config: &ModeConfig) -> Option<EntityId> {
        let settings = config.settings;
        if self.goop_count() >= settings.max_goops {
            return None;
        }
        let base = self.spawn_base_size(config);
        let size = self.random_size(base, settings.size_variance);
        let view = self.view;
        let along = self.rng.random::<f64>();
        let position = match self.rng.random_range(0..4) {
            0 => DVec2::new(view.x + along * view.width, view.y - size),
            1 => DVec2::new(view.x + view.width + size, view.y + along * view.height),
            2 => DVec2::new(view.x + along * view.width, view.y + view.height + size),
            _ => DVec2::new(view.x - size, view.y + along * view.height),
        };

        let mut goop = Goop::new(position, size, palette::MOB).with_ai(AiMode::Roam(2));
        goop.randomize_roam_space(&mut self.rng);
        goop.body.set_waypoint(view.random_point(&mut self.rng));
        if self.mode == GameMode::None && settings.size_variance > 0.0 {
            let alpha = (1.0 + (size - settings.start_size) / settings.size_variance) / 3.0;
            goop.color = goop.color.with_alpha(alpha);
        }
        Some(self.arena.insert(goop))
    }

    fn spawn_chaser(&mut self, config: &ModeConfig) -> Option<EntityId> {
        if self.goop_count() >= config.settings.max_goops {
            return None;
        }
        let base = self.spawn_base_size(config);
        let size = (base - 1.0 - (self.rng.random::<f64>() * 3.0).floor()).max(1.0);
        let position = self.behind_player(size)?;
        let target = self.player_snapshot()?.position;

        let mut goop = Goop::new(position, size, palette::MOB).with_ai(AiMode::Follow);
        let body = &mut goop.body;
        body.state = State::Rage;
        body.acceleration_max *= CHASER_ACCELERATION_FACTOR;
        body.velocity_terminal *= CHASER_TERMINAL_FACTOR;
        body.turn_rate = radians(CHASER_TURN_RATE_DEG);
        body.rotation = Vector::between(position, target).angle();
        body.set_waypoint(target);
        Some(self.arena.insert(goop))
    }

    fn spawn_horde(&mut self, config: &ModeConfig) -> Option<EntityId> {
        let settings = config.settings;
        if self.goop_count() >= settings.max_goops {
            return None;
        }
        let base = self.spawn_base_size(config);
        let size = self.random_size(base, settings.size_variance);
        let position = self.behind_player(size)?;
        let target = self.player_snapshot()?.position;

        let mut goop = Goop::new(position, size, palette::MOB).with_ai(AiMode::Follow);
        goop.body.set_waypoint(target);
        Some(self.arena.insert(goop))
    }

    fn spawn_runner(&mut self, config: &ModeConfig) -> Option<EntityId> {
        let settings = config.settings;
        let runners = self
            .arena
            .iter()
            .filter(|e| e.tag() == EntityTag::Goop)
            .filter_map(|e| e.body())
            .filter(|b| b.state != State::Rage)
            .count();
        if runners >= settings.max_goops {
            return None;
        }
        let base = self.spawn_base_size(config);
        let size = (self.random_size(base, settings.size_variance)
            - (settings.size_variance / 2.0).floor())
        .max(1.0);
        let y = self.view.y + self.rng.random::<f64>() * self.view.height;
        // Stay inside the cull margin or the runner is dropped on its first update
        let lead = config
            .cull_margin
            .map_or(RUNNER_LEAD * size, |margin| (RUNNER_LEAD * size).min(margin - size));
        let position = DVec2::new(self.view.x - lead, y);
        let terminal = RUNNER_TERMINAL_MIN + self.rng.random::<f64>() * RUNNER_TERMINAL_RANGE;

        let mut goop = Goop::new(position, size, palette::MOB).with_ai(AiMode::Mindless);
        let body = &mut goop.body;
        body.friction = 0.0;
        body.velocity_terminal = terminal;
        body.velocity = Vector::from_polar(terminal, PI);
        body.rotation = PI;
        body.set_waypoint(DVec2::new(position.x - FLEE_REACH, y));
        Some(self.arena.insert(goop))
    }

    /// Column of enraged blockers along the trailing (right) edge
    pub fn spawn_blocker_wall(&mut self) -> usize {
        let view = self.view;
        let count = (view.height / BLOCKER_SPACING).floor() as usize;
        for i in 0..count {
            let size = BLOCKER_SIZE - 2.0 + (self.rng.random::<f64>() * 5.0).floor();
            let y = view.y + (i as f64 + 0.5) * view.height / count as f64;
            let position = DVec2::new(view.x + view.width - size, y);
            let mut goop = Goop::new(position, size, palette::BLACK).with_ai(AiMode::Mindless);
            let body = &mut goop.body;
            body.state = State::Rage;
            body.friction = 0.0;
            body.acceleration_max = 1.0;
            body.velocity_terminal = BLOCKER_TERMINAL;
            body.velocity = Vector::from_polar(BLOCKER_TERMINAL, PI);
            body.acceleration = Vector::from_polar(0.0, PI);
            body.rotation = PI;
            self.arena.insert(EntityKind::Goop(goop));
        }
        log::debug!("Seeded {} blockers", count);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Entity;

    fn world_in(mode: GameMode) -> World {
        let mut world = World::new(9, 800.0, 600.0);
        world.mode = mode;
        let center = world.view.center();
        let player = world.player_mut().unwrap();
        player.goop.body.state = State::None;
        player.reset_motion(center, 0.0);
        let size = world.config().settings.start_size;
        world.player_mut().unwrap().goop.set_size(size);
        world
    }

    fn spawned(world: &World, id: EntityId) -> &Goop {
        match world.arena.get(id).map(|e| &e.kind) {
            Some(EntityKind::Goop(g)) => g,
            other => panic!("expected goop, got {other:?}"),
        }
    }

    #[test]
    fn test_roamer_cap_and_placement() {
        let mut world = world_in(GameMode::Roam);
        let view = world.view;
        for _ in 0..20 {
            let id = world.spawn_goop().expect("under the cap");
            let goop = spawned(&world, id);
            assert!(!view.contains(goop.body.position));
            assert!((8.0..12.0).contains(&goop.size()));
            assert_eq!(goop.ai, AiMode::Roam(2));
            assert!(view.contains(*goop.body.waypoints.front().unwrap()));
        }
        assert_eq!(world.spawn_goop(), None);
        assert_eq!(world.goop_count(), 20);
    }

    #[test]
    fn test_attract_roamers_are_tinted() {
        let mut world = World::new(3, 800.0, 600.0);
        for _ in 0..10 {
            let id = world.spawn_goop().unwrap();
            let goop = spawned(&world, id);
            let expected = (1.0 + (goop.size() - 5.0) / 22.0) / 3.0;
            assert!((goop.color.a - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_chaser_comes_from_behind() {
        let mut world = world_in(GameMode::Chase);
        let id = world.spawn_goop().unwrap();
        let goop = spawned(&world, id);
        // Player faces +x: chasers enter past the left edge
        assert!(goop.body.position.x < 0.0);
        assert!((goop.body.position.y - 300.0).abs() < 1e-3);
        assert_eq!(goop.body.state, State::Rage);
        assert!(goop.size() <= 7.0 && goop.size() >= 5.0);
        assert!((goop.body.acceleration_max - 1.6).abs() < 1e-12);
        assert!((goop.body.velocity_terminal - 6.0).abs() < 1e-12);
        assert_eq!(goop.body.waypoints.front(), Some(&world.view.center()));
    }

    #[test]
    fn test_horde_sizes() {
        let mut world = world_in(GameMode::Horde);
        for _ in 0..40 {
            let id = world.spawn_goop().unwrap();
            let goop = spawned(&world, id);
            assert!(goop.size() >= 8.0 && goop.size() < 14.0);
            assert_eq!(goop.body.state, State::None);
            assert_eq!(goop.ai, AiMode::Follow);
        }
        assert_eq!(world.spawn_goop(), None);
    }

    #[test]
    fn test_runner_cap_ignores_blockers() {
        let mut world = world_in(GameMode::Run);
        let blockers = world.spawn_blocker_wall();
        assert_eq!(blockers, 30);
        let enraged = world
            .arena
            .iter()
            .filter_map(Entity::body)
            .filter(|b| b.state == State::Rage)
            .count();
        assert_eq!(enraged, 30);

        for _ in 0..30 {
            let id = world.spawn_goop().expect("blockers do not count");
            let goop = spawned(&world, id);
            assert!(goop.body.position.x < world.view.x);
            assert!(goop.size() >= 1.0);
            let speed = goop.body.velocity.magnitude();
            assert!((3.0..4.5).contains(&speed));
            assert!((goop.body.velocity.angle() - PI).abs() < 1e-12);
        }
        assert_eq!(world.spawn_goop(), None);
        assert_eq!(world.goop_count(), 60);
    }

    #[test]
    fn test_large_runner_spawns_inside_cull_margin() {
        let mut world = world_in(GameMode::Run);
        world.player_mut().unwrap().goop.set_size(60.0);
        let margin = world.config().cull_margin;
        assert_eq!(margin, Some(300.0));
        for _ in 0..10 {
            let id = world.spawn_goop().unwrap();
            let mut goop = spawned(&world, id).clone();
            assert!(goop.size() > 50.0);
            assert!(goop.body.position.x < world.view.x);
            goop.cull(&world.view, margin);
            assert!(!goop.body.removed);
        }
    }

    #[test]
    fn test_disabled_policy_never_spawns() {
        let mut world = world_in(GameMode::Dev);
        world.modes.get_mut(GameMode::Dev).spawn = SpawnPolicy::Disabled;
        assert_eq!(world.spawn_goop(), None);
    }
}
