//! Game mode table
//!
//! Each mode is plain data: population settings plus a camera, spawn and
//! dispersal policy. The world reads the entry for its current mode every tick
//! and never mutates it. Tables can be swapped in from JSON.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Game mode identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Attract screen: the arena runs without a player
    #[default]
    None,
    Roam,
    Run,
    Chase,
    Horde,
    Dev,
}

impl GameMode {
    pub const ALL: [GameMode; 6] = [
        GameMode::None,
        GameMode::Roam,
        GameMode::Run,
        GameMode::Chase,
        GameMode::Horde,
        GameMode::Dev,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::None => "None",
            GameMode::Roam => "Roam",
            GameMode::Run => "Run",
            GameMode::Chase => "Chase",
            GameMode::Horde => "Horde",
            GameMode::Dev => "Dev",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "attract" => Some(GameMode::None),
            "roam" => Some(GameMode::Roam),
            "run" => Some(GameMode::Run),
            "chase" => Some(GameMode::Chase),
            "horde" => Some(GameMode::Horde),
            "dev" => Some(GameMode::Dev),
            _ => None,
        }
    }
}

/// Population settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
    /// Population cap checked by the spawn policy
    pub max_goops: usize,
    /// Player size at rebirth
    pub start_size: f64,
    /// Milliseconds between spawn attempts
    pub spawn_rate_ms: f64,
    /// Spread of spawned goop sizes around the player's size
    pub size_variance: f64,
}

/// How the viewport origin moves each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraPolicy {
    Static,
    /// Keep the player centred
    Follow,
    /// Scroll by a fixed amount per tick while the game is not over
    Pan { dx: f64, dy: f64 },
}

/// Where and how new goops enter the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPolicy {
    /// Off a random view edge, heading into view then wandering
    Roamer,
    /// Behind the player, small, enraged and following
    Chaser,
    /// Behind the player, player-sized or bigger, following
    Horde,
    /// Off the leading (left) edge, drifting against the scroll
    Runner,
    Disabled,
}

/// What live goops do when the game ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dispersal {
    /// Flee through the closest view edge
    NearestEdge,
    /// Flee away from the player's heading
    Reflected,
    /// Keep current course; culling clears them
    Hold,
}

/// Player stats restored at rebirth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerTuning {
    pub acceleration_max: f64,
    pub velocity_terminal: f64,
    pub friction: f64,
    /// Zero turns instantly
    pub turn_rate_deg: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            acceleration_max: 2.0,
            velocity_terminal: 7.0,
            friction: 0.5,
            turn_rate_deg: 20.0,
        }
    }
}

/// One row of the mode table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub settings: ModeSettings,
    pub camera: CameraPolicy,
    pub spawn: SpawnPolicy,
    pub dispersal: Dispersal,
    #[serde(default)]
    pub player: PlayerTuning,
    /// Goops farther than this outside the view are removed
    #[serde(default)]
    pub cull_margin: Option<f64>,
    #[serde(default)]
    pub spit_enabled: bool,
    #[serde(default)]
    pub phase_enabled: bool,
    /// Play the reform burst at rebirth; otherwise the player is live at once
    #[serde(default = "default_true")]
    pub reform: bool,
    /// Seed a wall of enraged blockers at rebirth
    #[serde(default)]
    pub blocker_wall: bool,
}

fn default_true() -> bool {
    true
}

impl ModeConfig {
    fn new(
        (max_goops, start_size, spawn_rate_ms, size_variance): (usize, f64, f64, f64),
        camera: CameraPolicy,
        spawn: SpawnPolicy,
        dispersal: Dispersal,
    ) -> Self {
        Self {
            settings: ModeSettings {
                max_goops,
                start_size,
                spawn_rate_ms,
                size_variance,
            },
            camera,
            spawn,
            dispersal,
            player: PlayerTuning::default(),
            cull_margin: None,
            spit_enabled: false,
            phase_enabled: false,
            reform: true,
            blocker_wall: false,
        }
    }

    fn validate(&self, mode: GameMode) -> Result<(), ConfigError> {
        let invalid = |reason| Err(ConfigError::InvalidMode { mode, reason });
        let s = &self.settings;
        if !(s.spawn_rate_ms.is_finite() && s.spawn_rate_ms > 0.0) {
            return invalid("spawn_rate_ms must be positive");
        }
        if !(s.start_size.is_finite() && s.start_size >= 1.0) {
            return invalid("start_size must be at least 1");
        }
        if !(s.size_variance.is_finite() && s.size_variance >= 0.0) {
            return invalid("size_variance must not be negative");
        }
        let p = &self.player;
        if !(p.acceleration_max > 0.0 && p.velocity_terminal > 0.0) {
            return invalid("player acceleration and terminal velocity must be positive");
        }
        if !(p.friction >= 0.0 && p.turn_rate_deg >= 0.0) {
            return invalid("player friction and turn rate must not be negative");
        }
        if let Some(margin) = self.cull_margin {
            if !(margin.is_finite() && margin >= 0.0) {
                return invalid("cull_margin must not be negative");
            }
        }
        if let CameraPolicy::Pan { dx, dy } = self.camera {
            if !(dx.is_finite() && dy.is_finite()) {
                return invalid("camera pan must be finite");
            }
        }
        Ok(())
    }
}

/// Every mode's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeTable {
    pub none: ModeConfig,
    pub roam: ModeConfig,
    pub run: ModeConfig,
    pub chase: ModeConfig,
    pub horde: ModeConfig,
    pub dev: ModeConfig,
}

impl Default for ModeTable {
    fn default() -> Self {
        use CameraPolicy::*;

        let none = ModeConfig::new(
            (50, 5.0, 100.0, 22.0),
            Pan { dx: -1.1, dy: 0.0 },
            SpawnPolicy::Roamer,
            Dispersal::NearestEdge,
        );

        let mut roam = ModeConfig::new(
            (20, 8.0, 250.0, 4.0),
            Follow,
            SpawnPolicy::Roamer,
            Dispersal::NearestEdge,
        );
        roam.cull_margin = Some(1000.0);

        let mut run = ModeConfig::new(
            (30, 9.0, 1000.0, 13.0),
            Pan { dx: -5.72, dy: 0.0 },
            SpawnPolicy::Runner,
            Dispersal::Hold,
        );
        run.cull_margin = Some(300.0);
        run.reform = false;
        run.blocker_wall = true;

        let chase = ModeConfig::new(
            (60, 8.0, 1000.0, 5.0),
            Follow,
            SpawnPolicy::Chaser,
            Dispersal::Reflected,
        );

        let mut horde = ModeConfig::new(
            (40, 8.0, 600.0, 6.0),
            Follow,
            SpawnPolicy::Horde,
            Dispersal::Reflected,
        );
        horde.spit_enabled = true;

        let mut dev = ModeConfig::new(
            (10, 10.0, 500.0, 10.0),
            Static,
            SpawnPolicy::Roamer,
            Dispersal::NearestEdge,
        );
        dev.spit_enabled = true;
        dev.phase_enabled = true;

        Self {
            none,
            roam,
            run,
            chase,
            horde,
            dev,
        }
    }
}

impl ModeTable {
    pub fn get(&self, mode: GameMode) -> &ModeConfig {
        match mode {
            GameMode::None => &self.none,
            GameMode::Roam => &self.roam,
            GameMode::Run => &self.run,
            GameMode::Chase => &self.chase,
            GameMode::Horde => &self.horde,
            GameMode::Dev => &self.dev,
        }
    }

    pub fn get_mut(&mut self, mode: GameMode) -> &mut ModeConfig {
        match mode {
            GameMode::None => &mut self.none,
            GameMode::Roam => &mut self.roam,
            GameMode::Run => &mut self.run,
            GameMode::Chase => &mut self.chase,
            GameMode::Horde => &mut self.horde,
            GameMode::Dev => &mut self.dev,
        }
    }

    /// Check every row for values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for mode in GameMode::ALL {
            self.get(mode).validate(mode)?;
        }
        Ok(())
    }

    /// Parse and validate a table
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: ModeTable = serde_json::from_str(json)?;
        table.validate()?;
        log::info!("Loaded mode table");
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
