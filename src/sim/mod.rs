//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Per-tick integration only (no wall-clock reads)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - Rendering only through the [`crate::render::Canvas`] trait

pub mod body;
pub mod collision;
pub mod entity;
pub mod goop;
pub mod particulate;
pub mod player;
pub mod spawn;
pub mod spit;
pub mod tail;
pub mod tick;
pub mod world;

pub use body::{Body, Collider, State};
pub use entity::{Arena, Entity, EntityId, EntityKind, EntityTag};
pub use goop::{AiMode, Goop};
pub use particulate::{Burst, Emission, Particulate};
pub use player::Player;
pub use spit::Spit;
pub use tail::{Slither, Tail};
pub use tick::{Action, MouseInput, TickInput, tick};
pub use world::{GamePhase, SpawnTimer, View, World};
