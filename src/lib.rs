//! Goop Arena - A 2D blob arena where you grow by eating smaller goops
//!
//! Core modules:
//! - `geometry`: Dual-representation vectors, segments, rays and polygons
//! - `sim`: Deterministic simulation (steering, collisions, world lifecycle)
//! - `settings`: Data-driven game mode table
//! - `input`: Polled keyboard/mouse state
//! - `engine`: Frame scheduler with throttled rendering
//! - `render`: Drawing surface abstraction

pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod render;
pub mod settings;
pub mod sim;

pub use engine::Engine;
pub use error::{ConfigError, GeometryError, SimError};
pub use input::{InputProvider, InputState, Key};
pub use settings::{GameMode, ModeTable};
pub use sim::{TickInput, World, tick};

/// Game configuration constants
pub mod consts {
    /// Render callbacks fire at most this often (60 Hz)
    pub const RENDER_INTERVAL_MS: f64 = 1000.0 / 60.0;
    /// Nominal frame length used by headless runs and tests
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Default viewport
    pub const VIEW_WIDTH: f64 = 800.0;
    pub const VIEW_HEIGHT: f64 = 600.0;
}
