//! Per-frame simulation tick
//!
//! One call advances the world by one frame in a fixed order:
//!
//! 1. discrete actions (phase, pause, flush, restart)
//! 2. player input
//! 3. camera policy
//! 4. spawn timer
//! 5. collision pass
//! 6. entity updates
//! 7. disposal
//! 8. lifecycle (game over, pergatory, rebirth)
//! 9. vision tint

use glam::DVec2;

use super::world::World;
use crate::error::SimError;
use crate::settings::GameMode;

/// Discrete, edge-triggered commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    TogglePhase,
    TogglePause,
    ToggleFlush,
    /// End the round; a new one starts once the arena clears
    Restart,
}

/// Mouse state for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseInput {
    /// Position in view (screen) coordinates
    pub position: DVec2,
    /// Shift held: steer instead of firing
    pub shift: bool,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Keyboard thrust heading in radians
    pub thrust: Option<f64>,
    /// Mouse button held
    pub mouse: Option<MouseInput>,
    pub actions: Vec<Action>,
}

impl TickInput {
    /// Mouse point in world space, split into (waypoint, fire target)
    fn mouse_targets(&self, world: &World) -> (Option<DVec2>, Option<DVec2>) {
        match self.mouse {
            Some(mouse) => {
                let point = world.view.origin() + mouse.position;
                if mouse.shift {
                    (Some(point), None)
                } else {
                    (None, Some(point))
                }
            }
            None => (None, None),
        }
    }
}

fn apply_action(world: &mut World, action: Action) -> Result<(), SimError> {
    match action {
        Action::TogglePhase => world.toggle_phase()?,
        Action::TogglePause => {
            if world.mode != GameMode::None {
                world.paused = !world.paused;
                log::debug!("Paused: {}", world.paused);
            }
        }
        Action::ToggleFlush => {
            world.canvas_flush = !world.canvas_flush;
            log::debug!("Canvas flush: {}", world.canvas_flush);
        }
        Action::Restart => {
            if world.mode != GameMode::None {
                log::info!("Restart requested");
                world.game_over()?;
            }
        }
    }
    Ok(())
}

/// Advance the world by one frame of `delta_ms`
pub fn tick(world: &mut World, input: &TickInput, delta_ms: f64) -> Result<(), SimError> {
    for action in &input.actions {
        if world.paused && *action != Action::TogglePause {
            continue;
        }
        apply_action(world, *action)?;
    }
    if world.paused {
        return Ok(());
    }

    let (waypoint, fire_at) = input.mouse_targets(world);
    world.apply_player_input(input.thrust, waypoint)?;
    world.apply_camera();
    world.run_spawner(delta_ms);
    world.collision_pass();
    world.update_entities(fire_at, delta_ms)?;
    world.dispose();
    world.update_lifecycle()?;
    world.apply_vision_tint();
    world.time_ticks += 1;
    Ok(())
}

impl World {
    pub fn tick(&mut self, input: &TickInput, delta_ms: f64) -> Result<(), SimError> {
        tick(self, input, delta_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::render::{RecordingCanvas, palette};
    use crate::sim::body::State;
    use crate::sim::entity::{Entity, EntityKind, EntityTag};
    use crate::sim::goop::Goop;
    use crate::sim::world::GamePhase;

    fn roam_world(seed: u64) -> World {
        let mut world = World::new(seed, 800.0, 600.0);
        world.set_game_mode(GameMode::Roam).unwrap();
        world.update_lifecycle().unwrap();
        world.spawner.stop();
        world
    }

    fn run_ticks(world: &mut World, input: &TickInput, n: usize) {
        for _ in 0..n {
            tick(world, input, FRAME_MS).unwrap();
        }
    }

    #[test]
    fn test_attract_mode_populates() {
        let mut world = World::new(1, 800.0, 600.0);
        run_ticks(&mut world, &TickInput::default(), 120);
        assert_eq!(world.time_ticks, 120);
        assert!(world.goop_count() > 0);
        assert!(world.goop_count() <= 50);
        assert!(world.view.x < 0.0);
        assert_eq!(world.player().unwrap().state(), State::Pergatory);
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut world = roam_world(2);
        run_ticks(&mut world, &TickInput::default(), 5);
        let pause = TickInput {
            actions: vec![Action::TogglePause],
            ..Default::default()
        };
        tick(&mut world, &pause, FRAME_MS).unwrap();
        assert!(world.paused);
        let frozen = world.time_ticks;
        let count = world.arena.len();
        let thrust = TickInput {
            thrust: Some(0.0),
            actions: vec![Action::ToggleFlush],
            ..Default::default()
        };
        run_ticks(&mut world, &thrust, 10);
        assert_eq!(world.time_ticks, frozen);
        assert_eq!(world.arena.len(), count);
        // Other actions are ignored while paused
        assert!(world.canvas_flush);

        tick(&mut world, &pause, FRAME_MS).unwrap();
        assert!(!world.paused);
        assert_eq!(world.time_ticks, frozen + 1);
    }

    #[test]
    fn test_attract_mode_cannot_pause() {
        let mut world = World::new(3, 800.0, 600.0);
        let pause = TickInput {
            actions: vec![Action::TogglePause],
            ..Default::default()
        };
        tick(&mut world, &pause, FRAME_MS).unwrap();
        assert!(!world.paused);
        assert_eq!(world.time_ticks, 1);
    }

    #[test]
    fn test_flush_toggle() {
        let mut world = World::new(3, 800.0, 600.0);
        let flush = TickInput {
            actions: vec![Action::ToggleFlush],
            ..Default::default()
        };
        tick(&mut world, &flush, FRAME_MS).unwrap();
        let mut canvas = RecordingCanvas::new();
        world.render(&mut canvas);
        assert!(!canvas.cleared());
    }

    #[test]
    fn test_keyboard_thrust_clears_waypoints() {
        let mut world = roam_world(4);
        // Rebirth queued a waypoint to the left
        assert_eq!(world.player().unwrap().goop.body.waypoints.len(), 1);
        run_ticks(&mut world, &TickInput::default(), 40);
        assert_eq!(world.player().unwrap().state(), State::None);
        let thrust = TickInput {
            thrust: Some(std::f64::consts::FRAC_PI_2),
            ..Default::default()
        };
        let start = world.player().unwrap().goop.body.position;
        run_ticks(&mut world, &thrust, 20);
        let body = &world.player().unwrap().goop.body;
        assert!(body.waypoints.is_empty());
        // +y is down the screen
        assert!(body.position.y > start.y + 50.0);
        assert!(body.velocity.magnitude() <= body.velocity_terminal + 1e-9);
    }

    #[test]
    fn test_shift_mouse_sets_world_waypoint() {
        let mut world = roam_world(5);
        let origin = world.view.origin();
        let steer = TickInput {
            mouse: Some(MouseInput {
                position: DVec2::new(10.0, 20.0),
                shift: true,
            }),
            ..Default::default()
        };
        tick(&mut world, &steer, FRAME_MS).unwrap();
        let body = &world.player().unwrap().goop.body;
        assert_eq!(body.waypoints.front(), Some(&(origin + DVec2::new(10.0, 20.0))));
    }

    #[test]
    fn test_mouse_fires_spit_in_horde() {
        let mut world = World::new(6, 800.0, 600.0);
        world.set_game_mode(GameMode::Horde).unwrap();
        world.update_lifecycle().unwrap();
        world.spawner.stop();
        // Wait out the reform
        run_ticks(&mut world, &TickInput::default(), 40);
        assert_eq!(world.player().unwrap().state(), State::None);

        let fire = TickInput {
            mouse: Some(MouseInput {
                position: DVec2::new(700.0, 300.0),
                shift: false,
            }),
            ..Default::default()
        };
        run_ticks(&mut world, &fire, 1);
        assert_eq!(world.arena.count(EntityTag::Spit), 1);
    }

    #[test]
    fn test_restart_disperses_and_rebirths() {
        let mut world = roam_world(7);
        world.spawner.stop();
        let center = world.view.center();
        world.arena.insert(Goop::new(center + DVec2::new(150.0, 0.0), 3.0, palette::MOB));
        let restart = TickInput {
            actions: vec![Action::Restart],
            ..Default::default()
        };
        tick(&mut world, &restart, FRAME_MS).unwrap();
        assert_eq!(world.phase, GamePhase::GameOver);
        let fleeing = world
            .arena
            .iter()
            .filter_map(Entity::body)
            .filter(|b| b.state == State::Flee)
            .count();
        assert_eq!(fleeing, 1);

        let mut ticks = 0;
        while world.phase == GamePhase::GameOver {
            tick(&mut world, &TickInput::default(), FRAME_MS).unwrap();
            ticks += 1;
            assert!(ticks < 3000, "never reborn");
        }
        assert_eq!(world.goop_count(), 0);
        assert_eq!(world.player().unwrap().state(), State::Reforming);
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = World::new(99, 800.0, 600.0);
        let mut b = World::new(99, 800.0, 600.0);
        a.set_game_mode(GameMode::Chase).unwrap();
        b.set_game_mode(GameMode::Chase).unwrap();
        let inputs = [
            TickInput::default(),
            TickInput {
                thrust: Some(0.3),
                ..Default::default()
            },
            TickInput {
                mouse: Some(MouseInput {
                    position: DVec2::new(100.0, 100.0),
                    shift: true,
                }),
                ..Default::default()
            },
        ];
        for i in 0..300 {
            let input = &inputs[i % inputs.len()];
            tick(&mut a, input, FRAME_MS).unwrap();
            tick(&mut b, input, FRAME_MS).unwrap();
        }
        assert_eq!(a.arena.len(), b.arena.len());
        assert_eq!(a.view, b.view);
        for (ea, eb) in a.arena.iter().zip(b.arena.iter()) {
            assert_eq!(ea.id, eb.id);
            match (&ea.kind, &eb.kind) {
                (EntityKind::Particulate(pa), EntityKind::Particulate(pb)) => {
                    assert_eq!(pa.position, pb.position);
                }
                _ => {
                    let (ba, bb) = (ea.body().unwrap(), eb.body().unwrap());
                    assert_eq!(ba.position, bb.position);
                    assert_eq!(ba.state, bb.state);
                }
            }
        }
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mut world = roam_world(9);
        let ticks = world.time_ticks;
        let bad = TickInput {
            thrust: Some(f64::NAN),
            ..Default::default()
        };
        let err = tick(&mut world, &bad, FRAME_MS).unwrap_err();
        assert!(matches!(err, SimError::Vector(_)));
        assert_eq!(world.time_ticks, ticks);
        // The rebirth waypoint survives the rejected input
        assert_eq!(world.player().unwrap().goop.body.waypoints.len(), 1);

        let steer = TickInput {
            mouse: Some(MouseInput {
                position: DVec2::new(f64::INFINITY, 0.0),
                shift: true,
            }),
            ..Default::default()
        };
        let err = tick(&mut world, &steer, FRAME_MS).unwrap_err();
        assert!(matches!(err, SimError::Vector(_)));
    }

    #[test]
    fn test_invalid_motion_halts_tick() {
        let mut world = roam_world(8);
        run_ticks(&mut world, &TickInput::default(), 40);
        let id = world.arena.insert(Goop::new(DVec2::new(100.0, 100.0), 5.0, palette::MOB));
        if let Some(body) = world.arena.get_mut(id).and_then(Entity::body_mut) {
            body.velocity = crate::geometry::Vector::new(f64::INFINITY, 0.0);
        }
        let ticks = world.time_ticks;
        let err = tick(&mut world, &TickInput::default(), FRAME_MS).unwrap_err();
        assert!(matches!(err, SimError::Motion { id: bad, .. } if bad == id.0));
        assert_eq!(world.time_ticks, ticks);
    }
}
