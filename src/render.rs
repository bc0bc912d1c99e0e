//! Drawing surface abstraction
//!
//! The simulation never talks to a real graphics backend. Entities emit
//! primitive draw calls (paths, arcs, fills, strokes) against a [`Canvas`];
//! the host supplies the implementation.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// RGBA colour with a fractional alpha
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS style string, e.g. `rgba(0, 102, 153, 1)`
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Palette
pub mod palette {
    use super::Color;

    pub const TONIC: Color = Color::rgb(0, 102, 153);
    pub const DOMINANT: Color = Color::rgb(51, 153, 204);
    pub const ACCENT: Color = Color::rgb(255, 204, 51);
    pub const MOB: Color = Color::rgb(50, 200, 100);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
}

/// Primitive drawing operations the simulation needs
pub trait Canvas {
    /// Clear a world-space rectangle
    fn clear(&mut self, origin: DVec2, width: f64, height: f64);
    fn set_stroke(&mut self, color: Color);
    fn set_fill(&mut self, color: Color);
    fn begin_path(&mut self);
    fn move_to(&mut self, point: DVec2);
    fn line_to(&mut self, point: DVec2);
    /// Arc around `center` from `start` to `end` radians
    fn arc(&mut self, center: DVec2, radius: f64, start: f64, end: f64);
    fn fill(&mut self);
    fn stroke(&mut self);

    /// Convenience: filled disc
    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Color) {
        self.set_fill(color);
        self.begin_path();
        self.arc(center, radius, 0.0, std::f64::consts::TAU);
        self.fill();
    }

    /// Convenience: stroked polyline
    fn polyline(&mut self, points: &[DVec2]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.begin_path();
        self.move_to(*first);
        for p in rest {
            self.line_to(*p);
        }
        self.stroke();
    }
}

/// One recorded call on a [`RecordingCanvas`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear { origin: DVec2, width: f64, height: f64 },
    Stroke(Color),
    Fill(Color),
    BeginPath,
    MoveTo(DVec2),
    LineTo(DVec2),
    Arc { center: DVec2, radius: f64, start: f64, end: f64 },
    FillPath,
    StrokePath,
}

/// Canvas that just records what it was asked to draw
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub calls: Vec<DrawCall>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.calls.clear();
    }

    /// Number of arcs drawn, a rough entity count for tests
    pub fn arc_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Arc { .. }))
            .count()
    }

    pub fn cleared(&self) -> bool {
        self.calls.iter().any(|c| matches!(c, DrawCall::Clear { .. }))
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, origin: DVec2, width: f64, height: f64) {
        self.calls.push(DrawCall::Clear {
            origin,
            width,
            height,
        });
    }
    fn set_stroke(&mut self, color: Color) {
        self.calls.push(DrawCall::Stroke(color));
    }
    fn set_fill(&mut self, color: Color) {
        self.calls.push(DrawCall::Fill(color));
    }
    fn begin_path(&mut self) {
        self.calls.push(DrawCall::BeginPath);
    }
    fn move_to(&mut self, point: DVec2) {
        self.calls.push(DrawCall::MoveTo(point));
    }
    fn line_to(&mut self, point: DVec2) {
        self.calls.push(DrawCall::LineTo(point));
    }
    fn arc(&mut self, center: DVec2, radius: f64, start: f64, end: f64) {
        self.calls.push(DrawCall::Arc {
            center,
            radius,
            start,
            end,
        });
    }
    fn fill(&mut self) {
        self.calls.push(DrawCall::FillPath);
    }
    fn stroke(&mut self) {
        self.calls.push(DrawCall::StrokePath);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_and_alpha_clamp() {
        assert_eq!(palette::TONIC.css(), "rgba(0, 102, 153, 1)");
        assert_eq!(palette::MOB.with_alpha(3.0).a, 1.0);
        assert_eq!(palette::MOB.with_alpha(-1.0).a, 0.0);
    }

    #[test]
    fn test_recording_canvas() {
        let mut canvas = RecordingCanvas::new();
        canvas.fill_circle(DVec2::new(1.0, 2.0), 3.0, palette::ACCENT);
        canvas.polyline(&[DVec2::ZERO, DVec2::X, DVec2::Y]);
        canvas.polyline(&[]);
        assert_eq!(canvas.arc_count(), 1);
        assert_eq!(
            canvas
                .calls
                .iter()
                .filter(|c| matches!(c, DrawCall::LineTo(_)))
                .count(),
            2
        );
        assert!(!canvas.cleared());
    }
}
