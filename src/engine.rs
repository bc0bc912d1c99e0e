//! Frame scheduler
//!
//! The host calls [`Engine::update`] once per animation frame with its clock.
//! Tick callbacks run every frame with the elapsed delta; render callbacks are
//! throttled to [`RENDER_INTERVAL_MS`] so painting can run slower than the
//! simulation.

use crate::consts::RENDER_INTERVAL_MS;
use crate::error::SimError;

pub type TickFn<S> = Box<dyn FnMut(&mut S, f64) -> Result<(), SimError>>;
pub type RenderFn<S> = Box<dyn FnMut(&S)>;

/// What one [`Engine::update`] call ran
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub delta_ms: f64,
    pub rendered: bool,
}

pub struct Engine<S> {
    ticks: Vec<TickFn<S>>,
    renders: Vec<RenderFn<S>>,
    running: bool,
    last_update_ms: Option<f64>,
    render_remaining_ms: f64,
}

impl<S> Default for Engine<S> {
    fn default() -> Self {
        Self {
            ticks: Vec::new(),
            renders: Vec::new(),
            running: false,
            last_update_ms: None,
            render_remaining_ms: 0.0,
        }
    }
}

impl<S> Engine<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tick(&mut self, callback: impl FnMut(&mut S, f64) -> Result<(), SimError> + 'static) {
        self.ticks.push(Box::new(callback));
    }

    pub fn add_render(&mut self, callback: impl FnMut(&S) + 'static) {
        self.renders.push(Box::new(callback));
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Resume updates; the first frame after a start has zero delta
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_update_ms = None;
        log::debug!("Engine started");
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            log::debug!("Engine stopped");
        }
    }

    /// Run one frame at host time `now_ms`
    ///
    /// Returns `None` while stopped. A failing tick callback aborts the
    /// frame before any render callback runs.
    pub fn update(&mut self, state: &mut S, now_ms: f64) -> Result<Option<FrameReport>, SimError> {
        if !self.running {
            return Ok(None);
        }
        let delta_ms = self.last_update_ms.map_or(0.0, |last| now_ms - last);
        self.last_update_ms = Some(now_ms);

        for tick in &mut self.ticks {
            tick(state, delta_ms)?;
        }

        let rendered = self.render_remaining_ms <= 0.0;
        if rendered {
            self.render_remaining_ms = RENDER_INTERVAL_MS;
            for render in &mut self.renders {
                render(state);
            }
        }
        self.render_remaining_ms -= delta_ms;
        Ok(Some(FrameReport { delta_ms, rendered }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter {
        ticks: u32,
        elapsed: f64,
    }

    fn counting_engine(renders: Rc<Cell<u32>>) -> Engine<Counter> {
        let mut engine = Engine::new();
        engine.add_tick(|s: &mut Counter, dt| {
            s.ticks += 1;
            s.elapsed += dt;
            Ok(())
        });
        engine.add_render(move |_: &Counter| renders.set(renders.get() + 1));
        engine
    }

    #[test]
    fn test_stopped_engine_does_nothing() {
        let renders = Rc::new(Cell::new(0));
        let mut engine = counting_engine(renders.clone());
        let mut state = Counter::default();
        assert_eq!(engine.update(&mut state, 100.0).unwrap(), None);
        assert_eq!(state.ticks, 0);
        assert_eq!(renders.get(), 0);
    }

    #[test]
    fn test_ticks_get_elapsed_delta() {
        let renders = Rc::new(Cell::new(0));
        let mut engine = counting_engine(renders);
        let mut state = Counter::default();
        engine.start();
        let first = engine.update(&mut state, 1000.0).unwrap().unwrap();
        assert_eq!(first.delta_ms, 0.0);
        let second = engine.update(&mut state, 1010.0).unwrap().unwrap();
        assert_eq!(second.delta_ms, 10.0);
        assert_eq!(state.ticks, 2);
        assert_eq!(state.elapsed, 10.0);
    }

    #[test]
    fn test_render_throttled() {
        let renders = Rc::new(Cell::new(0));
        let mut engine = counting_engine(renders.clone());
        let mut state = Counter::default();
        engine.start();
        // 100 Hz host clock for one second
        for i in 0..100 {
            engine.update(&mut state, i as f64 * 10.0).unwrap();
        }
        assert_eq!(state.ticks, 100);
        // Every second frame overruns the render interval
        assert_eq!(renders.get(), 50);
    }

    #[test]
    fn test_restart_resets_delta() {
        let renders = Rc::new(Cell::new(0));
        let mut engine = counting_engine(renders);
        let mut state = Counter::default();
        engine.start();
        engine.update(&mut state, 0.0).unwrap();
        engine.stop();
        assert!(!engine.is_running());
        engine.start();
        let report = engine.update(&mut state, 5000.0).unwrap().unwrap();
        assert_eq!(report.delta_ms, 0.0);
    }

    #[test]
    fn test_tick_error_skips_render() {
        let renders = Rc::new(Cell::new(0));
        let mut engine: Engine<Counter> = Engine::new();
        engine.add_tick(|_, _| Err(SimError::MissingPlayer(1)));
        let counter = renders.clone();
        engine.add_render(move |_| counter.set(counter.get() + 1));
        engine.start();
        let mut state = Counter::default();
        assert!(engine.update(&mut state, 0.0).is_err());
        assert_eq!(renders.get(), 0);
    }
}
