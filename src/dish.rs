//! Geometry of the petri dish.

use crate::model::Position;
use crate::params::Params;
use rand::prelude::*;
use rand_distr::UnitCircle;
use std::f64::consts::PI;

/// Bacteria sustained per unit of dish area.
const DENSITY_FACTOR: f64 = 0.001;

/// Offspring land between these distances from their parent.
const OFFSPRING_MIN_DIST: f64 = 5.0;
const OFFSPRING_MAX_DIST: f64 = 25.0;

const MAX_PLACEMENT_ATTEMPTS: usize = 10;

/// Circular dish centered at `(radius, radius)`.
#[derive(Debug, Clone, Copy)]
pub struct Dish {
    center: Position,
    radius: f64,
}

impl Dish {
    pub fn new(radius: f64) -> Self {
        Self {
            center: Position {
                x: radius,
                y: radius,
            },
            radius,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(params.dish_radius())
    }

    pub fn contains(&self, pos: Position) -> bool {
        (pos.x - self.center.x).hypot(pos.y - self.center.y) <= self.radius
    }

    /// Maximum population the dish area can sustain.
    pub fn carrying_capacity(&self) -> usize {
        (PI * self.radius.powi(2) * DENSITY_FACTOR).floor() as usize
    }

    /// Draw a position uniformly over the dish area.
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        // sqrt of the radial draw keeps the density uniform over area.
        let [dx, dy]: [f64; 2] = UnitCircle.sample(rng);
        let r = self.radius * rng.random::<f64>().sqrt();
        Position {
            x: self.center.x + r * dx,
            y: self.center.y + r * dy,
        }
    }

    /// Draw an offspring position near `parent`.
    ///
    /// Falls back to a uniform position when no nearby attempt lands inside
    /// the dish.
    pub fn sample_near<R: Rng + ?Sized>(&self, parent: Position, rng: &mut R) -> Position {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let [dx, dy]: [f64; 2] = UnitCircle.sample(rng);
            let dist = rng.random_range(OFFSPRING_MIN_DIST..=OFFSPRING_MAX_DIST);
            let pos = Position {
                x: parent.x + dist * dx,
                y: parent.y + dist * dy,
            };
            if self.contains(pos) {
                return pos;
            }
        }
        self.sample_uniform(rng)
    }
}
