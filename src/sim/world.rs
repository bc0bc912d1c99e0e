//! World context
//!
//! The world owns everything a tick touches: the entity arena, the mode table,
//! the viewport, the spawn timer and the seeded RNG. It runs the individual
//! tick stages (see [`crate::sim::tick`] for their order) and the lifecycle
//! that links them: game over, dispersal and rebirth.

use std::f64::consts::PI;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::State;
use super::collision;
use super::entity::{Arena, Entity, EntityId, EntityKind, EntityTag, PlayerSnapshot, UpdateContext};
use super::particulate::Particulate;
use super::player::Player;
use crate::error::{ConfigError, SimError};
use crate::geometry::{Polygon, Ray, Vector};
use crate::render::Canvas;
use crate::settings::{CameraPolicy, Dispersal, GameMode, ModeConfig, ModeTable};

/// How far past an edge a fleeing goop aims
pub const FLEE_REACH: f64 = 9999.0;
/// Reflected dispersal aims this many times past the boundary hit
pub const REFLECT_SCALE: f64 = 5.0;
/// Distance to the player's first waypoint after rebirth
pub const REBIRTH_LEAD: f64 = 100.0;

/// Camera-space rectangle; `x`/`y` is the top-left corner in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl View {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn bounds(&self) -> Polygon {
        Polygon::rect(self.origin(), self.width, self.height)
    }

    pub fn random_point(&self, rng: &mut Pcg32) -> DVec2 {
        DVec2::new(
            self.x + rng.random::<f64>() * self.width,
            self.y + rng.random::<f64>() * self.height,
        )
    }

    /// Inclusive of the edges
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center_on(&mut self, p: DVec2) {
        self.x = p.x - self.width / 2.0;
        self.y = p.y - self.height / 2.0;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Waypoint far beyond whichever edge `p` is closest to
    pub fn nearest_edge_exit(&self, p: DVec2) -> DVec2 {
        let left = p.x - self.x;
        let right = self.x + self.width - p.x;
        let top = p.y - self.y;
        let bottom = self.y + self.height - p.y;
        let nearest = left.min(right).min(top).min(bottom);
        if nearest == left {
            DVec2::new(p.x - FLEE_REACH, p.y)
        } else if nearest == right {
            DVec2::new(p.x + FLEE_REACH, p.y)
        } else if nearest == top {
            DVec2::new(p.x, p.y - FLEE_REACH)
        } else {
            DVec2::new(p.x, p.y + FLEE_REACH)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// The player is dead and the arena is emptying
    GameOver,
}

/// Countdown driving the spawn policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnTimer {
    pub remaining_ms: f64,
    pub active: bool,
}

impl SpawnTimer {
    pub fn start(&mut self, rate_ms: f64) {
        self.active = true;
        self.remaining_ms = rate_ms;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Count down by `delta_ms`; true when a spawn is due
    pub fn tick(&mut self, delta_ms: f64, rate_ms: f64) -> bool {
        if !self.active {
            return false;
        }
        self.remaining_ms -= delta_ms;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = rate_ms;
            return true;
        }
        false
    }
}

pub(crate) fn player_in(arena: &mut Arena, id: EntityId) -> Result<&mut Player, SimError> {
    match arena.get_mut(id).map(|e| &mut e.kind) {
        Some(EntityKind::Player(player)) => Ok(player),
        _ => Err(SimError::MissingPlayer(id.0)),
    }
}

pub struct World {
    pub arena: Arena,
    pub player_id: EntityId,
    pub mode: GameMode,
    pub modes: ModeTable,
    pub view: View,
    pub phase: GamePhase,
    pub paused: bool,
    /// Clear the view before each render
    pub canvas_flush: bool,
    pub spawner: SpawnTimer,
    pub(crate) rng: Pcg32,
    pub time_ticks: u64,
}

impl World {
    /// Attract-mode world with the default mode table
    pub fn new(seed: u64, width: f64, height: f64) -> Self {
        Self::build(seed, width, height, ModeTable::default())
    }

    /// World with an injected mode table
    pub fn with_modes(
        seed: u64,
        width: f64,
        height: f64,
        modes: ModeTable,
    ) -> Result<Self, ConfigError> {
        modes.validate()?;
        Ok(Self::build(seed, width, height, modes))
    }

    fn build(seed: u64, width: f64, height: f64, modes: ModeTable) -> Self {
        let view = View::new(0.0, 0.0, width, height);
        let settings = modes.get(GameMode::None).settings;
        let mut player = Player::new(view.center(), settings.start_size);
        player.goop.body.state = State::Pergatory;

        let mut arena = Arena::new();
        let player_id = arena.insert(EntityKind::Player(player));
        let mut spawner = SpawnTimer::default();
        spawner.start(settings.spawn_rate_ms);

        log::info!("World created: seed {}, view {}x{}", seed, width, height);
        Self {
            arena,
            player_id,
            mode: GameMode::None,
            modes,
            view,
            phase: GamePhase::Playing,
            paused: false,
            canvas_flush: true,
            spawner,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
        }
    }

    pub fn config(&self) -> &ModeConfig {
        self.modes.get(self.mode)
    }

    pub fn player(&self) -> Result<&Player, SimError> {
        match self.arena.get(self.player_id).map(|e| &e.kind) {
            Some(EntityKind::Player(player)) => Ok(player),
            _ => Err(SimError::MissingPlayer(self.player_id.0)),
        }
    }

    pub fn player_mut(&mut self) -> Result<&mut Player, SimError> {
        player_in(&mut self.arena, self.player_id)
    }

    pub fn player_snapshot(&self) -> Option<PlayerSnapshot> {
        let player = self.player().ok()?;
        let body = &player.goop.body;
        Some(PlayerSnapshot {
            id: self.player_id,
            position: body.position,
            velocity: body.velocity,
            rotation: body.rotation,
            size: body.size,
            state: body.state,
        })
    }

    pub fn goop_count(&self) -> usize {
        self.arena.count(EntityTag::Goop)
    }

    pub(crate) fn insert_all(&mut self, particulates: Vec<Particulate>) {
        for p in particulates {
            self.arena.insert(p);
        }
    }

    /// Whether any particulate the player owns is still alive
    pub fn player_debris_alive(&self) -> bool {
        self.arena.iter().any(|e| {
            matches!(&e.kind, EntityKind::Particulate(p) if p.owner == Some(self.player_id) && !p.removed)
        })
    }

    /// Steer the player: keyboard thrust wins over a mouse waypoint
    pub fn apply_player_input(
        &mut self,
        thrust: Option<f64>,
        waypoint: Option<DVec2>,
    ) -> Result<(), SimError> {
        let body = &mut self.player_mut()?.goop.body;
        if let Some(heading) = thrust {
            let push = Vector::try_polar(body.acceleration_max, heading)?;
            body.waypoints.clear();
            body.acceleration = push;
        } else if let Some(target) = waypoint {
            Vector::from(target).validate()?;
            body.set_waypoint(target);
        } else if body.waypoints.is_empty() {
            body.coast();
        }
        Ok(())
    }

    pub fn apply_camera(&mut self) {
        match self.config().camera {
            CameraPolicy::Static => {}
            CameraPolicy::Follow => {
                if let Some(player) = self.player_snapshot() {
                    self.view.center_on(player.position);
                }
            }
            CameraPolicy::Pan { dx, dy } => {
                if self.phase != GamePhase::GameOver || self.mode == GameMode::None {
                    self.view.pan(dx, dy);
                }
            }
        }
    }

    pub fn run_spawner(&mut self, delta_ms: f64) {
        let rate = self.config().settings.spawn_rate_ms;
        if self.spawner.tick(delta_ms, rate) {
            self.spawn_goop();
        }
    }

    pub fn collision_pass(&mut self) -> usize {
        collision::refresh(&mut self.arena)
    }

    /// Update every live entity in id order, then insert what they spawned
    pub fn update_entities(&mut self, fire_at: Option<DVec2>, delta_ms: f64) -> Result<(), SimError> {
        let config = *self.config();
        let mut spawns = Vec::new();
        for index in 0..self.arena.len() {
            if self.arena.entity_at(index).is_none_or(Entity::is_removed) {
                continue;
            }
            let peers = self.arena.peers_of(index);
            let player = self.player_snapshot();
            let mut ctx = UpdateContext {
                view: self.view,
                mode: self.mode,
                config,
                player,
                fire_at,
                delta_ms,
                rng: &mut self.rng,
                spawns: &mut spawns,
            };
            self.arena.entity_at_mut(index).update(&peers, &mut ctx)?;
        }
        for kind in spawns {
            self.arena.insert(kind);
        }
        Ok(())
    }

    pub fn dispose(&mut self) -> usize {
        let disposed = self.arena.dispose();
        if disposed > 0 {
            log::trace!("Disposed {} entities", disposed);
        }
        disposed
    }

    /// Advance the player through death and rebirth
    pub fn update_lifecycle(&mut self) -> Result<(), SimError> {
        let state = self.player()?.state();
        let debris = self.player_debris_alive();
        let goops = self.goop_count();
        match state {
            State::Exploded => {
                if self.phase == GamePhase::Playing {
                    self.game_over()?;
                }
                if !debris {
                    self.player_mut()?.goop.body.state = State::Pergatory;
                    log::debug!("Player entered pergatory");
                }
            }
            State::Reforming if !debris => {
                self.player_mut()?.goop.body.state = State::None;
                log::debug!("Player reformed");
            }
            State::Pergatory if self.mode != GameMode::None && goops == 0 => {
                self.rebirth()?;
            }
            _ => {}
        }

        if self.mode == GameMode::None && self.phase == GamePhase::GameOver && goops == 0 {
            self.phase = GamePhase::Playing;
            let rate = self.config().settings.spawn_rate_ms;
            self.spawner.start(rate);
            log::info!("Attract mode restarted");
        }
        Ok(())
    }

    /// End the round: the player bursts, spawning stops and goops flee
    pub fn game_over(&mut self) -> Result<(), SimError> {
        if self.phase == GamePhase::GameOver {
            return Ok(());
        }
        self.phase = GamePhase::GameOver;
        self.spawner.stop();

        let id = self.player_id;
        let player = player_in(&mut self.arena, id)?;
        if matches!(player.state(), State::None | State::Phased | State::Reforming) {
            let debris = player.explode(None, 360.0, id, &mut self.rng);
            self.insert_all(debris);
        }
        let fled = self.disperse();
        log::info!(
            "Game over in {} mode after {} ticks; {} goops fleeing",
            self.mode.as_str(),
            self.time_ticks,
            fled
        );
        Ok(())
    }

    /// Send every live goop into [`State::Flee`]; returns how many
    pub fn disperse(&mut self) -> usize {
        let dispersal = self.config().dispersal;
        let view = self.view;
        let reflected = match dispersal {
            Dispersal::Reflected => {
                let heading = self.player_snapshot().map_or(0.0, |p| p.rotation);
                let center = view.center();
                let ray = Ray::new(center, heading + PI);
                match view.bounds().pierce_ray(&ray) {
                    Some(hit) => Some(center + (hit.point - center) * REFLECT_SCALE),
                    None => {
                        log::warn!("Dispersal ray found no view edge; using nearest edges");
                        None
                    }
                }
            }
            _ => None,
        };

        let mut fled = 0;
        for entity in self.arena.iter_mut() {
            let EntityKind::Goop(goop) = &mut entity.kind else {
                continue;
            };
            let body = &mut goop.body;
            if body.removed || !body.state.is_moving() {
                continue;
            }
            body.state = State::Flee;
            match (dispersal, reflected) {
                (Dispersal::Reflected, Some(target)) => body.set_waypoint(target),
                (Dispersal::Hold, _)
                    if !body.waypoints.is_empty() || body.velocity.magnitude() > 0.1 => {}
                _ => {
                    let exit = view.nearest_edge_exit(body.position);
                    body.set_waypoint(exit);
                }
            }
            fled += 1;
        }
        log::debug!("Dispersed {} goops ({:?})", fled, dispersal);
        fled
    }

    /// Bring the player back for the current mode
    pub fn rebirth(&mut self) -> Result<(), SimError> {
        let config = *self.config();
        let center = self.view.center();
        let id = self.player_id;
        let player = player_in(&mut self.arena, id)?;
        player.goop.set_size(config.settings.start_size);
        player.apply_tuning(&config.player);
        player.reset_motion(center, PI);
        player
            .goop
            .body
            .set_waypoint(center - DVec2::new(REBIRTH_LEAD, 0.0));
        let debris = if config.reform {
            player.reform(id, &mut self.rng)
        } else {
            player.goop.body.state = State::None;
            Vec::new()
        };
        self.insert_all(debris);

        self.phase = GamePhase::Playing;
        self.spawner.start(config.settings.spawn_rate_ms);
        if config.blocker_wall {
            self.spawn_blocker_wall();
        }
        log::info!(
            "Player reborn in {} mode at size {}",
            self.mode.as_str(),
            config.settings.start_size
        );
        Ok(())
    }

    /// Switch modes; the new round starts once the arena clears
    pub fn set_game_mode(&mut self, mode: GameMode) -> Result<(), SimError> {
        self.game_over()?;
        self.mode = mode;
        let center = self.view.center();
        let player = self.player_mut()?;
        player.goop.body.position = center;
        player.goop.body.waypoints.clear();
        let size = player.size();
        player.goop.tail.reset(center, size);
        log::info!("Game mode set to {}", mode.as_str());
        Ok(())
    }

    /// Phase the player in or out, where the mode allows it
    pub fn toggle_phase(&mut self) -> Result<(), SimError> {
        if !self.config().phase_enabled {
            return Ok(());
        }
        let id = self.player_id;
        let player = player_in(&mut self.arena, id)?;
        let debris = player.toggle_phase(&mut self.rng);
        let state = player.state();
        if !debris.is_empty() {
            log::debug!("Player phase toggled to {:?}", state);
        }
        self.insert_all(debris);
        Ok(())
    }

    /// Fade goops by how they compare to the live player
    pub fn apply_vision_tint(&mut self) {
        if self.mode == GameMode::None {
            return;
        }
        let Some(player) = self.player_snapshot() else {
            return;
        };
        if !matches!(player.state, State::None | State::Phased) {
            return;
        }
        for entity in self.arena.iter_mut() {
            let EntityKind::Goop(goop) = &mut entity.kind else {
                continue;
            };
            if goop.body.state == State::Rage {
                continue;
            }
            let alpha = if goop.size() < player.size {
                0.2
            } else if goop.size() == player.size {
                0.5
            } else {
                1.0
            };
            goop.color = goop.color.with_alpha(alpha);
        }
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        if self.canvas_flush {
            canvas.clear(self.view.origin(), self.view.width, self.view.height);
        }
        for entity in self.arena.iter() {
            entity.render(canvas);
        }
    }
}
