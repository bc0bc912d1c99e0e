//! Polled input
//!
//! Hosts feed raw key and mouse events into [`InputState`]; the simulation
//! never sees them directly. Once per tick [`InputState::poll`] turns the
//! held keys and the queued key-down edges into a [`TickInput`] snapshot.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::DVec2;

use crate::geometry::bound_angle;
use crate::sim::{Action, MouseInput, TickInput};

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Up,
    Right,
    Down,
    LeftAlt,
    UpAlt,
    RightAlt,
    DownAlt,
    Space,
    I,
    P,
    R,
    Escape,
}

impl Key {
    /// Map a DOM-style key code; unknown codes are ignored
    pub fn from_key_code(code: u32) -> Option<Self> {
        Some(match code {
            65 => Key::Left,
            87 => Key::Up,
            68 => Key::Right,
            83 => Key::Down,
            37 => Key::LeftAlt,
            38 => Key::UpAlt,
            39 => Key::RightAlt,
            40 => Key::DownAlt,
            32 => Key::Space,
            110 => Key::I,
            80 => Key::P,
            82 => Key::R,
            27 => Key::Escape,
            _ => return None,
        })
    }

    /// Unit step this key contributes to keyboard thrust
    fn direction(self) -> Option<DVec2> {
        match self {
            Key::Left | Key::LeftAlt => Some(DVec2::NEG_X),
            Key::Right | Key::RightAlt => Some(DVec2::X),
            // Screen space: +y points down
            Key::Up | Key::UpAlt => Some(DVec2::NEG_Y),
            Key::Down | Key::DownAlt => Some(DVec2::Y),
            _ => None,
        }
    }
}

/// What the core reads from the host each tick
pub trait InputProvider {
    fn is_key_pressed(&self, key: Key) -> bool;
    fn is_mouse_down(&self) -> bool;
    /// Shift held on the last mouse event
    fn is_shift_down(&self) -> bool;
    /// Mouse position in view coordinates
    fn mouse_location(&self) -> DVec2;
}

#[derive(Debug, Clone)]
pub struct InputState {
    held: HashSet<Key>,
    bindings: HashMap<Key, Action>,
    pending: VecDeque<Action>,
    mouse_down: bool,
    shift: bool,
    mouse: DVec2,
}

impl Default for InputState {
    fn default() -> Self {
        let bindings = HashMap::from([
            (Key::P, Action::TogglePhase),
            (Key::Escape, Action::TogglePause),
            (Key::I, Action::ToggleFlush),
            (Key::R, Action::Restart),
        ]);
        Self {
            held: HashSet::new(),
            bindings,
            pending: VecDeque::new(),
            mouse_down: false,
            shift: false,
            mouse: DVec2::ZERO,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to a discrete action, replacing any earlier binding
    pub fn set_key_action(&mut self, key: Key, action: Action) {
        self.bindings.insert(key, action);
    }

    /// Key-down event; a bound action is queued only on the press edge
    pub fn key_down(&mut self, key: Key) {
        if !self.held.insert(key) {
            return;
        }
        if let Some(&action) = self.bindings.get(&key) {
            self.pending.push_back(action);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn mouse_move(&mut self, position: DVec2) {
        self.mouse = position;
    }

    pub fn mouse_button(&mut self, down: bool, shift: bool) {
        self.mouse_down = down;
        self.shift = shift;
    }

    /// Heading of the combined direction keys, if they do not cancel out
    pub fn thrust_heading(&self) -> Option<f64> {
        let sum: DVec2 = [
            Key::Left,
            Key::Up,
            Key::Right,
            Key::Down,
            Key::LeftAlt,
            Key::UpAlt,
            Key::RightAlt,
            Key::DownAlt,
        ]
        .into_iter()
        .filter(|&k| self.is_key_pressed(k))
        .filter_map(Key::direction)
        .sum();
        // Alt keys double up with their primaries
        let step = sum.clamp(DVec2::NEG_ONE, DVec2::ONE);
        if step == DVec2::ZERO {
            return None;
        }
        Some(bound_angle(step.y.atan2(step.x)))
    }

    /// Snapshot for one tick; drains queued actions
    pub fn poll(&mut self) -> TickInput {
        let mouse = self.is_mouse_down().then(|| MouseInput {
            position: self.mouse_location(),
            shift: self.is_shift_down(),
        });
        TickInput {
            thrust: self.thrust_heading(),
            mouse,
            actions: self.pending.drain(..).collect(),
        }
    }
}

impl InputProvider for InputState {
    fn is_key_pressed(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    fn is_shift_down(&self) -> bool {
        self.shift
    }

    fn mouse_location(&self) -> DVec2 {
        self.mouse
    }
}
