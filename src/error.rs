//! Error taxonomy
//!
//! Geometry degeneracies (parallel segments, rays that miss) and spawn policy
//! misses are not errors: they surface as `None`. Only states that would feed
//! NaN into the simulation, and broken configuration, are reported here.

use thiserror::Error;

/// Which representation of a vector was found to be unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorComponent {
    X,
    Y,
    Magnitude,
    Angle,
}

impl std::fmt::Display for VectorComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VectorComponent::X => "x",
            VectorComponent::Y => "y",
            VectorComponent::Magnitude => "magnitude",
            VectorComponent::Angle => "angle",
        };
        f.write_str(name)
    }
}

/// Errors raised by the geometry layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A vector component is NaN or infinite and cannot be derived
    #[error("invalid vector state: {component} is {value}")]
    InvalidVectorState {
        component: VectorComponent,
        value: f64,
    },
}

/// Errors raised while advancing the simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Vector(#[from] GeometryError),
    /// Entity `id` failed its motion update
    #[error("entity {id} produced an invalid motion state: {source}")]
    Motion {
        id: u32,
        #[source]
        source: GeometryError,
    },
    #[error("player entity {0} is missing from the world")]
    MissingPlayer(u32),
}

/// Errors raised while loading or validating a game mode table
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse mode table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mode {mode:?}: {reason}")]
    InvalidMode {
        mode: crate::settings::GameMode,
        reason: &'static str,
    },
}
