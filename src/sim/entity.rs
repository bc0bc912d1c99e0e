//! Entity registry and the per-update context
//!
//! The world owns one [`Arena`] of entities kept sorted by id, so iteration
//! order is insertion order and stays deterministic. Entities never hold
//! references to each other; collisions are recorded as ids and resolved
//! against [`PeerView`] snapshots taken right before each entity updates.

use std::collections::HashMap;
use std::fmt;

use glam::DVec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, State};
use super::goop::Goop;
use super::particulate::Particulate;
use super::player::Player;
use super::spit::Spit;
use super::tail::Tail;
use super::world::View;
use crate::error::SimError;
use crate::geometry::Vector;
use crate::render::{Canvas, Color};
use crate::settings::{GameMode, ModeConfig};

/// Stable entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag used for per-type counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    Player,
    Goop,
    Spit,
    Particulate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Player(Player),
    Goop(Goop),
    Spit(Spit),
    Particulate(Particulate),
}

impl EntityKind {
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Player(_) => EntityTag::Player,
            EntityKind::Goop(_) => EntityTag::Goop,
            EntityKind::Spit(_) => EntityTag::Spit,
            EntityKind::Particulate(_) => EntityTag::Particulate,
        }
    }
}

impl From<Particulate> for EntityKind {
    fn from(p: Particulate) -> Self {
        EntityKind::Particulate(p)
    }
}

impl From<Goop> for EntityKind {
    fn from(g: Goop) -> Self {
        EntityKind::Goop(g)
    }
}

impl From<Spit> for EntityKind {
    fn from(s: Spit) -> Self {
        EntityKind::Spit(s)
    }
}

/// What an entity may know about a peer it overlaps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerView {
    pub id: EntityId,
    pub tag: EntityTag,
    pub state: State,
    pub size: f64,
    pub velocity: Vector,
    pub velocity_terminal: f64,
}

/// The player's pose as of the start of an entity's update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub position: DVec2,
    pub velocity: Vector,
    pub rotation: f64,
    pub size: f64,
    pub state: State,
}

/// Shared inputs and outputs of one entity update
pub struct UpdateContext<'a> {
    pub view: View,
    pub mode: GameMode,
    pub config: ModeConfig,
    pub player: Option<PlayerSnapshot>,
    /// World point the player is firing at this tick
    pub fire_at: Option<DVec2>,
    pub delta_ms: f64,
    pub rng: &'a mut Pcg32,
    /// New entities, inserted after the update pass
    pub spawns: &'a mut Vec<EntityKind>,
}

impl UpdateContext<'_> {
    pub fn emit(&mut self, particulates: Vec<Particulate>) {
        self.spawns
            .extend(particulates.into_iter().map(EntityKind::Particulate));
    }
}

/// Anything with a body that takes part in the collision pass
pub trait Collidable {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    /// React to this tick's overlaps
    fn resolve_collisions(&mut self, id: EntityId, peers: &[PeerView], ctx: &mut UpdateContext);
}

/// Bodies drawn with a trailing ribbon
pub trait TailRenderable: Collidable {
    fn tail(&self) -> &Tail;
    fn draw_color(&self) -> Color;

    fn render_tail(&self, canvas: &mut dyn Canvas) {
        let body = self.body();
        let color = self.draw_color();
        let (left, right) = self.tail().ribbon(body.size);
        canvas.fill_circle(body.position, body.size, color);
        if left.len() < 2 {
            return;
        }
        canvas.set_fill(color);
        canvas.begin_path();
        canvas.move_to(left[0]);
        for p in left.iter().skip(1).chain(right.iter().rev()) {
            canvas.line_to(*p);
        }
        canvas.fill();
    }
}

/// Entities that can fire spit
pub trait SpitCapable {
    /// Fire at `ctx.fire_at` if allowed; the spit is queued on `ctx`
    fn try_spit(&mut self, id: EntityId, ctx: &mut UpdateContext) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
}

impl Entity {
    pub fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    /// Particulates have no body
    pub fn body(&self) -> Option<&Body> {
        match &self.kind {
            EntityKind::Player(p) => Some(p.body()),
            EntityKind::Goop(g) => Some(g.body()),
            EntityKind::Spit(s) => Some(s.body()),
            EntityKind::Particulate(_) => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p.body_mut()),
            EntityKind::Goop(g) => Some(g.body_mut()),
            EntityKind::Spit(s) => Some(s.body_mut()),
            EntityKind::Particulate(_) => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        match &self.kind {
            EntityKind::Particulate(p) => p.removed,
            _ => self.body().is_some_and(|b| b.removed),
        }
    }

    pub fn peer_view(&self) -> Option<PeerView> {
        self.body().map(|body| PeerView {
            id: self.id,
            tag: self.tag(),
            state: body.state,
            size: body.size,
            velocity: body.velocity,
            velocity_terminal: body.velocity_terminal,
        })
    }

    /// Run this entity's tick: collisions, then motion
    pub fn update(&mut self, peers: &[PeerView], ctx: &mut UpdateContext) -> Result<(), SimError> {
        let id = self.id;
        let motion = match &mut self.kind {
            EntityKind::Player(p) => p.update(id, peers, ctx),
            EntityKind::Goop(g) => g.update(id, peers, ctx),
            EntityKind::Spit(s) => s.update(id, peers, ctx),
            EntityKind::Particulate(p) => {
                p.update();
                Ok(())
            }
        };
        motion.map_err(|source| SimError::Motion { id: id.0, source })
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        match &self.kind {
            EntityKind::Player(p) => p.render(canvas),
            EntityKind::Goop(g) => g.render(canvas),
            EntityKind::Spit(s) => s.render(canvas),
            EntityKind::Particulate(p) => p.render(canvas),
        }
    }
}

/// Live entities, sorted by id, with per-kind counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    entities: Vec<Entity>,
    next_id: u32,
    counts: HashMap<EntityTag, usize>,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, kind: impl Into<EntityKind>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let kind = kind.into();
        *self.counts.entry(kind.tag()).or_insert(0) += 1;
        // Ids only grow, so pushing keeps the vec sorted
        self.entities.push(Entity { id, kind });
        id
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    /// Live count of one kind, including entities flagged but not yet disposed
    pub fn count(&self, tag: EntityTag) -> usize {
        self.counts.get(&tag).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn entity_at(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub(crate) fn entity_at_mut(&mut self, index: usize) -> &mut Entity {
        &mut self.entities[index]
    }

    /// Snapshots of every peer recorded against the entity at `index`
    pub fn peers_of(&self, index: usize) -> Vec<PeerView> {
        let Some(body) = self.entities[index].body() else {
            return Vec::new();
        };
        body.collisions
            .iter()
            .filter_map(|id| self.get(*id))
            .filter_map(Entity::peer_view)
            .collect()
    }

    /// Drop every entity flagged as removed; returns how many went
    pub fn dispose(&mut self) -> usize {
        let before = self.entities.len();
        let counts = &mut self.counts;
        self.entities.retain(|e| {
            if e.is_removed() {
                if let Some(n) = counts.get_mut(&e.tag()) {
                    *n = n.saturating_sub(1);
                }
                false
            } else {
                true
            }
        });
        before - self.entities.len()
    }
}
