//! Trait mutation.

use crate::model::{Bacterium, Color, shift_fitness, shift_size};
use crate::rng::symmetric;
use rand::prelude::*;

/// Share of mutation events that flip resistance.
const PROB_RESISTANCE_FLIP: f64 = 0.1;
/// Share of mutation events that shift fitness.
const PROB_FITNESS_DRIFT: f64 = 0.7;
/// Share of mutation events that shift size.
const PROB_SIZE_DRIFT: f64 = 0.5;

/// Fitness paid for gaining resistance, or recovered when losing it.
const RESISTANCE_COST: f64 = 0.1;
const FITNESS_DRIFT: f64 = 0.1;
const SIZE_DRIFT: f64 = 0.25;

/// Apply a possible mutation to `bac`.
///
/// Returns `true` if any trait changed. Each sub-effect is drawn
/// independently, and a single event is reported however many fire.
pub fn mutate<R: Rng + ?Sized>(bac: &mut Bacterium, mutation_rate: f64, rng: &mut R) -> bool {
    if rng.random::<f64>() >= mutation_rate {
        return false;
    }

    let mut mutated = false;

    if rng.random::<f64>() < PROB_RESISTANCE_FLIP {
        bac.is_resistant = !bac.is_resistant;
        bac.color = Color::for_resistance(bac.is_resistant);
        let cost = if bac.is_resistant {
            -RESISTANCE_COST
        } else {
            RESISTANCE_COST
        };
        bac.fitness = shift_fitness(bac.fitness, cost);
        mutated = true;
    }

    if rng.random::<f64>() < PROB_FITNESS_DRIFT {
        bac.fitness = shift_fitness(bac.fitness, symmetric(rng, FITNESS_DRIFT));
        mutated = true;
    }

    if rng.random::<f64>() < PROB_SIZE_DRIFT {
        bac.size = shift_size(bac.size, symmetric(rng, SIZE_DRIFT));
        mutated = true;
    }

    mutated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use crate::rng::item_rng;

    fn bacterium() -> Bacterium {
        Bacterium {
            id: 1,
            position: Position { x: 10.0, y: 10.0 },
            is_resistant: false,
            fitness: 0.5,
            age: 2,
            generation: 1,
            parent_id: Some(0),
            color: Color::Green,
            size: 3.0,
        }
    }

    #[test]
    fn zero_rate_never_mutates() {
        let mut rng = item_rng(12);
        for _ in 0..1_000 {
            let mut bac = bacterium();
            assert!(!mutate(&mut bac, 0.0, &mut rng));
            assert_eq!(bac, bacterium());
        }
    }

    #[test]
    fn unit_rate_mutates_most_bacteria() {
        let mut rng = item_rng(13);
        let n_trials = 10_000;
        let n_mutated = (0..n_trials)
            .filter(|_| mutate(&mut bacterium(), 1.0, &mut rng))
            .count();
        // No sub-effect fires with probability 0.9 * 0.3 * 0.5 = 0.135.
        let frac = n_mutated as f64 / n_trials as f64;
        assert!((frac - 0.865).abs() < 0.02, "mutated fraction {frac}");
    }

    #[test]
    fn resistance_flip_recolors_and_costs_fitness() {
        let mut rng = item_rng(14);
        let mut n_flips = 0;
        for _ in 0..5_000 {
            let mut bac = bacterium();
            mutate(&mut bac, 1.0, &mut rng);
            assert_eq!(bac.color, Color::for_resistance(bac.is_resistant));
            if bac.is_resistant {
                n_flips += 1;
                // Cost of 0.1 plus at most 0.1 of drift.
                assert!(bac.fitness <= 0.5 + 1e-12);
            }
        }
        assert!(n_flips > 0);
    }

    #[test]
    fn traits_stay_in_range() {
        let mut rng = item_rng(15);
        let mut bac = Bacterium {
            fitness: 0.99,
            size: 9.95,
            ..bacterium()
        };
        for _ in 0..10_000 {
            mutate(&mut bac, 1.0, &mut rng);
            assert!((0.0..=1.0).contains(&bac.fitness));
            assert!((1.0..=10.0).contains(&bac.size));
        }
    }
}
