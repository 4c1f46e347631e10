//! Density-limited reproduction.

use crate::dish::Dish;
use crate::model::{Bacterium, BacteriumId, shift_fitness, shift_size};
use crate::rng::symmetric;
use rand::prelude::*;

const YOUNG_AGE: u32 = 5;
const OLD_AGE: u32 = 30;
const YOUNG_MULTIPLIER: f64 = 0.5;
const OLD_MULTIPLIER: f64 = 0.8;

const OFFSPRING_FITNESS_DRIFT: f64 = 0.05;
const OFFSPRING_SIZE_DRIFT: f64 = 0.25;

/// Population pressure shared by every reproduction test of one step.
///
/// `current_population` is taken once before any bacterium is tested, so
/// offspring produced earlier in the pass do not lower the odds of later
/// parents.
#[derive(Debug, Clone, Copy)]
pub struct Pressure {
    pub growth_rate: f64,
    pub current_population: usize,
    pub carrying_capacity: usize,
}

impl Pressure {
    /// Whether the dish still has room for any reproduction at all.
    pub fn allows_growth(&self) -> bool {
        self.current_population < self.carrying_capacity
    }

    fn base_prob(&self) -> f64 {
        let pressure = self.current_population as f64 / self.carrying_capacity as f64;
        self.growth_rate * (1.0 - pressure)
    }
}

fn age_multiplier(age: u32) -> f64 {
    if age < YOUNG_AGE {
        YOUNG_MULTIPLIER
    } else if age > OLD_AGE {
        OLD_MULTIPLIER
    } else {
        1.0
    }
}

/// Probability that `bac` divides this step.
pub fn reproduction_prob(bac: &Bacterium, pressure: &Pressure) -> f64 {
    pressure.base_prob() * bac.fitness * age_multiplier(bac.age)
}

/// Reproduction test.
pub fn should_reproduce<R: Rng + ?Sized>(
    bac: &Bacterium,
    pressure: &Pressure,
    rng: &mut R,
) -> bool {
    rng.random::<f64>() < reproduction_prob(bac, pressure)
}

/// Build the offspring of `parent`.
///
/// The offspring keeps the parent's resistance and color and inherits
/// slightly perturbed fitness and size.
pub fn spawn_offspring<R: Rng + ?Sized>(
    parent: &Bacterium,
    id: BacteriumId,
    dish: &Dish,
    rng: &mut R,
) -> Bacterium {
    let position = dish.sample_near(parent.position, rng);
    let fitness = shift_fitness(parent.fitness, symmetric(rng, OFFSPRING_FITNESS_DRIFT));
    let size = shift_size(parent.size, symmetric(rng, OFFSPRING_SIZE_DRIFT));
    Bacterium {
        id,
        position,
        is_resistant: parent.is_resistant,
        fitness,
        age: 0,
        generation: parent.generation + 1,
        parent_id: Some(parent.id),
        color: parent.color,
        size,
    }
}
