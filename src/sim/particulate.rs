//! Explosion and reform debris
//!
//! Particulates are purely visual except for one thing: the player's
//! lifecycle waits for the particulates it owns to finish before leaving the
//! exploded or reforming state.

use std::f64::consts::PI;

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use crate::geometry::{Vector, radians};
use crate::render::{Canvas, Color};

/// Speed change per tick
pub const ACCELERATION: f64 = 0.07;
/// Radius growth per tick while reforming
pub const REFORM_GROWTH: f64 = 0.1;
/// Reforming particulates vanish at this radius
pub const REFORM_RADIUS: f64 = 3.0;
const MIN_RADIUS: f64 = 0.25;

/// Decay variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Burst {
    /// Fly outward, slow down and shrink
    Explode,
    /// Converge inward, speed up and grow
    Reform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particulate {
    pub position: DVec2,
    pub velocity: Vector,
    start_speed: f64,
    pub radius: f64,
    start_radius: f64,
    pub color: Color,
    pub burst: Burst,
    pub owner: Option<EntityId>,
    pub removed: bool,
}

impl Particulate {
    pub fn new(
        position: DVec2,
        velocity: Vector,
        radius: f64,
        color: Color,
        burst: Burst,
        owner: Option<EntityId>,
    ) -> Self {
        Self {
            position,
            velocity,
            start_speed: velocity.magnitude(),
            radius,
            start_radius: radius,
            color,
            burst,
            owner,
            removed: false,
        }
    }

    pub fn update(&mut self) {
        if self.removed {
            return;
        }
        self.position += self.velocity.as_dvec2();
        match self.burst {
            Burst::Reform => {
                self.velocity = self.velocity.extended_by(ACCELERATION);
                self.radius += REFORM_GROWTH;
                if self.radius >= REFORM_RADIUS {
                    self.removed = true;
                }
            }
            Burst::Explode => {
                let speed = self.velocity.magnitude() - ACCELERATION;
                if speed <= 0.0 {
                    self.velocity = self.velocity.with_magnitude(0.0);
                    self.removed = true;
                } else {
                    self.velocity = self.velocity.with_magnitude(speed);
                    self.radius = speed / self.start_speed * self.start_radius;
                }
            }
        }
    }

    /// Opacity in [0, 1], fading with remaining life
    pub fn alpha(&self) -> f64 {
        match self.burst {
            Burst::Explode if self.start_speed > 0.0 => {
                (self.velocity.magnitude() / self.start_speed).clamp(0.0, 1.0)
            }
            Burst::Explode => 0.0,
            Burst::Reform => (self.radius / REFORM_RADIUS).clamp(0.0, 1.0),
        }
    }

    /// Distance a reforming particulate covers before it vanishes
    fn reform_travel(speed: f64, radius: f64) -> f64 {
        let (mut speed, mut radius, mut travel) = (speed, radius, 0.0);
        while radius < REFORM_RADIUS {
            travel += speed;
            speed += ACCELERATION;
            radius += REFORM_GROWTH;
        }
        travel
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        if self.removed {
            return;
        }
        let color = self.color.with_alpha(self.color.a * self.alpha());
        canvas.fill_circle(self.position, self.radius / 2.0, color);
        canvas.set_stroke(color);
        canvas.begin_path();
        canvas.arc(self.position, self.radius, 0.0, 2.0 * PI);
        canvas.stroke();
    }
}

/// Parameters for a burst of particulates
#[derive(Debug, Clone, Copy)]
pub struct Emission {
    pub count: usize,
    /// Angular spread in degrees, centred on the velocity heading
    pub choke_deg: f64,
    pub position: DVec2,
    pub velocity: Vector,
    pub size: f64,
    /// Per-particulate jitter, in degrees
    pub angle_variance: f64,
    pub speed_variance: f64,
    pub size_variance: f64,
    pub color: Color,
    pub burst: Burst,
    pub owner: Option<EntityId>,
}

fn jitter(rng: &mut Pcg32, variance: f64) -> f64 {
    if variance <= 0.0 {
        0.0
    } else {
        (rng.random::<f64>() - 0.5) * variance
    }
}

impl Emission {
    /// Spread `count` particulates evenly across the choke
    ///
    /// Reform bursts start on a ring and converge so each one vanishes on
    /// `position`.
    pub fn generate(&self, rng: &mut Pcg32) -> Vec<Particulate> {
        if self.count == 0 {
            return Vec::new();
        }
        let choke = radians(self.choke_deg.clamp(0.0, 360.0));
        let step = choke / self.count as f64;
        let first = self.velocity.angle() - choke / 2.0 + step / 2.0;
        let base_speed = self.velocity.magnitude();

        (0..self.count)
            .map(|i| {
                let angle = first + step * i as f64 + radians(jitter(rng, self.angle_variance));
                let speed = (base_speed + jitter(rng, self.speed_variance)).max(0.0);
                let radius = (self.size + jitter(rng, self.size_variance)).max(MIN_RADIUS);
                match self.burst {
                    Burst::Explode => Particulate::new(
                        self.position,
                        Vector::from_polar(speed, angle),
                        radius,
                        self.color,
                        self.burst,
                        self.owner,
                    ),
                    Burst::Reform => {
                        let travel = Particulate::reform_travel(speed, radius);
                        Particulate::new(
                            self.position + DVec2::from_angle(angle) * travel,
                            Vector::from_polar(speed, angle + PI),
                            radius,
                            self.color,
                            self.burst,
                            self.owner,
                        )
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bound_angle;
    use crate::render::palette;
    use rand::SeedableRng;

    fn emission(count: usize, choke_deg: f64, burst: Burst) -> Emission {
        Emission {
            count,
            choke_deg,
            position: DVec2::new(10.0, 10.0),
            velocity: Vector::from_polar(4.0, 0.0),
            size: 2.0,
            angle_variance: 0.0,
            speed_variance: 0.0,
            size_variance: 0.0,
            color: palette::MOB,
            burst,
            owner: None,
        }
    }

    #[test]
    fn test_explode_fades_within_expected_ticks() {
        let mut p = Particulate::new(
            DVec2::ZERO,
            Vector::from_polar(5.0, 1.0),
            3.0,
            palette::ACCENT,
            Burst::Explode,
            None,
        );
        let limit = (5.0f64 / ACCELERATION).ceil() as usize;
        let mut ticks = 0;
        while !p.removed {
            p.update();
            ticks += 1;
            assert!(ticks <= limit, "still alive after {ticks} ticks");
            assert!(p.radius <= 3.0 + 1e-9);
        }
        assert_eq!(ticks, limit);
        assert_eq!(p.alpha(), 0.0);
    }

    #[test]
    fn test_stationary_particulate_is_removed_at_once() {
        let mut p = Particulate::new(
            DVec2::ZERO,
            Vector::ZERO,
            1.0,
            palette::ACCENT,
            Burst::Explode,
            None,
        );
        p.update();
        assert!(p.removed);
        assert_eq!(p.position, DVec2::ZERO);
    }

    #[test]
    fn test_choke_spreads_evenly() {
        let mut rng = Pcg32::seed_from_u64(1);
        let parts = emission(4, 90.0, Burst::Explode).generate(&mut rng);
        let angles: Vec<f64> = parts.iter().map(|p| p.velocity.angle()).collect();
        let expected = [-33.75, -11.25, 11.25, 33.75];
        for (a, e) in angles.iter().zip(expected) {
            assert!((a - bound_angle(radians(e))).abs() < 1e-9);
        }
        assert!(parts.iter().all(|p| (p.velocity.magnitude() - 4.0).abs() < 1e-12));
    }

    #[test]
    fn test_full_circle_has_no_overlap() {
        let mut rng = Pcg32::seed_from_u64(2);
        let parts = emission(8, 360.0, Burst::Explode).generate(&mut rng);
        let mut angles: Vec<f64> = parts.iter().map(|p| p.velocity.angle()).collect();
        angles.sort_by(f64::total_cmp);
        for pair in angles.windows(2) {
            assert!((pair[1] - pair[0] - radians(45.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reform_converges_on_origin() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut e = emission(6, 360.0, Burst::Reform);
        e.size = 0.5;
        e.speed_variance = 0.5;
        e.size_variance = 0.4;
        let mut parts = e.generate(&mut rng);
        assert!(parts.iter().all(|p| p.position.distance(e.position) > 1.0));
        for p in parts.iter_mut() {
            while !p.removed {
                p.update();
            }
            assert!(p.position.distance(e.position) < 1e-6);
        }
    }

    #[test]
    fn test_variance_is_deterministic_per_seed() {
        let mut e = emission(5, 360.0, Burst::Explode);
        e.angle_variance = 5.0;
        e.speed_variance = 3.0;
        e.size_variance = 4.0;
        let a = e.generate(&mut Pcg32::seed_from_u64(9));
        let b = e.generate(&mut Pcg32::seed_from_u64(9));
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.velocity, pb.velocity);
            assert_eq!(pa.radius, pb.radius);
            assert!(pa.radius >= MIN_RADIUS);
        }
    }
}
