//! Goop Arena headless runner
//!
//! Drives a world through the frame scheduler with a scripted bot at the
//! keyboard and mouse, painting into a recording canvas. Useful for soak
//! runs and for eyeballing mode balance through the logs:
//!
//!   RUST_LOG=debug cargo run -- --mode horde --frames 3600

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;

    use anyhow::{Context, Result};
    use clap::Parser;
    use glam::DVec2;

    use goop_arena::consts::{FRAME_MS, VIEW_HEIGHT, VIEW_WIDTH};
    use goop_arena::render::RecordingCanvas;
    use goop_arena::sim::{EntityTag, State};
    use goop_arena::{Engine, GameMode, InputState, Key, ModeTable, World};

    #[derive(Parser)]
    #[command(name = "goop-arena")]
    #[command(about = "Run a goop arena session headless with a scripted player")]
    pub struct Args {
        /// Game mode: none, roam, run, chase, horde or dev
        #[arg(long, default_value = "roam", value_parser = parse_mode)]
        mode: GameMode,
        /// Frames to simulate at 60 Hz
        #[arg(long, default_value_t = 3600)]
        frames: u64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// JSON mode table replacing the built-in one
        #[arg(long)]
        modes: Option<PathBuf>,
        #[arg(long, default_value_t = VIEW_WIDTH)]
        width: f64,
        #[arg(long, default_value_t = VIEW_HEIGHT)]
        height: f64,
    }

    fn parse_mode(s: &str) -> Result<GameMode, String> {
        GameMode::parse(s).ok_or_else(|| format!("unknown game mode '{s}'"))
    }

    const STEER_KEYS: [Key; 4] = [Key::Right, Key::Down, Key::Left, Key::Up];
    /// Frames spent holding each steering key
    const STEER_FRAMES: u64 = 90;

    /// Scripted player: sweeps the arena on the arrow keys and spits at the
    /// nearest goop where the mode allows it
    #[derive(Default)]
    struct Bot {
        frame: u64,
    }

    impl Bot {
        fn drive(&mut self, world: &World, input: &mut InputState) {
            let leg = (self.frame / STEER_FRAMES) as usize;
            if self.frame % STEER_FRAMES == 0 {
                input.key_up(STEER_KEYS[(leg + STEER_KEYS.len() - 1) % STEER_KEYS.len()]);
                input.key_down(STEER_KEYS[leg % STEER_KEYS.len()]);
            }
            self.frame += 1;

            let target = world
                .config()
                .spit_enabled
                .then(|| Self::nearest_goop(world))
                .flatten();
            match target {
                Some(point) => {
                    input.mouse_move(point - world.view.origin());
                    input.mouse_button(true, false);
                }
                None => input.mouse_button(false, false),
            }
        }

        fn nearest_goop(world: &World) -> Option<DVec2> {
            let player = world.player_snapshot()?;
            if player.state != State::None {
                return None;
            }
            world
                .arena
                .iter()
                .filter(|e| e.tag() == EntityTag::Goop)
                .filter_map(|e| e.body())
                .filter(|b| !b.removed)
                .map(|b| b.position)
                .min_by(|a, b| {
                    a.distance_squared(player.position)
                        .total_cmp(&b.distance_squared(player.position))
                })
        }
    }

    struct Session {
        world: World,
        input: InputState,
        bot: Bot,
        deaths: u32,
    }

    #[derive(Default)]
    struct PaintStats {
        frames: Cell<u64>,
        calls: Cell<u64>,
    }

    pub fn run(args: Args) -> Result<()> {
        let modes = match &args.modes {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                ModeTable::from_json(&json)?
            }
            None => ModeTable::default(),
        };
        let mut world = World::with_modes(args.seed, args.width, args.height, modes)?;
        if args.mode != GameMode::None {
            world.set_game_mode(args.mode)?;
        }
        let mut session = Session {
            world,
            input: InputState::new(),
            bot: Bot::default(),
            deaths: 0,
        };

        let mut engine: Engine<Session> = Engine::new();
        engine.add_tick(|s: &mut Session, delta_ms| {
            s.bot.drive(&s.world, &mut s.input);
            let input = s.input.poll();
            let alive = s.world.player()?.state() != State::Exploded;
            s.world.tick(&input, delta_ms)?;
            if alive && s.world.player()?.state() == State::Exploded {
                s.deaths += 1;
            }
            Ok(())
        });

        let stats = Rc::new(PaintStats::default());
        {
            let canvas = RefCell::new(RecordingCanvas::new());
            let stats = Rc::clone(&stats);
            engine.add_render(move |s: &Session| {
                let mut canvas = canvas.borrow_mut();
                canvas.reset();
                s.world.render(&mut *canvas);
                stats.frames.set(stats.frames.get() + 1);
                stats.calls.set(stats.calls.get() + canvas.calls.len() as u64);
            });
        }

        engine.start();
        for frame in 0..args.frames {
            engine.update(&mut session, frame as f64 * FRAME_MS)?;
        }
        engine.stop();

        let world = &session.world;
        let particulates = world.arena.count(EntityTag::Particulate);
        let spits = world.arena.count(EntityTag::Spit);
        log::info!(
            "Finished {} ticks in {} mode: {} goops, {} particulates, {} spits live",
            world.time_ticks,
            world.mode.as_str(),
            world.goop_count(),
            particulates,
            spits
        );
        println!("mode:        {}", world.mode.as_str());
        println!("ticks:       {}", world.time_ticks);
        println!("deaths:      {}", session.deaths);
        println!("player size: {}", world.player()?.size());
        println!("phase:       {:?}", world.phase);
        println!("goops:       {}", world.goop_count());
        println!(
            "painted:     {} frames, {} draw calls",
            stats.frames.get(),
            stats.calls.get()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::init();
    log::info!("Goop Arena (headless) starting...");
    headless::run(headless::Args::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library; there is no wasm entry point here
}
