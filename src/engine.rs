//! Population transition engine.
//!
//! [`initialize_population`] builds the founders and [`advance_generation`]
//! moves a population forward by one generation. Both are pure: the only
//! state they touch is the generator passed in by the caller.

use crate::dish::Dish;
use crate::model::{Bacterium, BacteriumId, Color, Population};
use crate::mutation::mutate;
use crate::params::Params;
use crate::reproduction::{Pressure, should_reproduce, spawn_offspring};
use crate::rng::{SimRng, item_rng, item_seeds, symmetric};
use crate::stats::{StepStatistics, calculate_statistics};
use crate::survival::{survives_antibiotic, survives_natural_death};
use rand::prelude::*;
use rayon::prelude::*;

const INITIAL_RESISTANT_FRACTION: f64 = 0.1;
const RESISTANT_BASE_FITNESS: f64 = 0.4;
const SENSITIVE_BASE_FITNESS: f64 = 0.6;
const INITIAL_FITNESS_NOISE: f64 = 0.1;
const INITIAL_FITNESS_MIN: f64 = 0.1;
const INITIAL_FITNESS_MAX: f64 = 1.0;
const INITIAL_SIZE_MIN: f64 = 2.0;
const INITIAL_SIZE_MAX: f64 = 5.0;

/// Result of one generation transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub population: Population,
    pub stats: StepStatistics,
}

/// Create the founder population.
///
/// Founders are spread uniformly over the dish. Resistance carries a fitness
/// cost: resistant founders start around 0.4, sensitive ones around 0.6.
pub fn initialize_population<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Population {
    let dish = Dish::from_params(params);
    let mut bac_vec = Vec::with_capacity(params.initial_population);
    for id in 0..params.initial_population as BacteriumId {
        let position = dish.sample_uniform(rng);
        let is_resistant = rng.random::<f64>() < INITIAL_RESISTANT_FRACTION;
        let base_fitness = if is_resistant {
            RESISTANT_BASE_FITNESS
        } else {
            SENSITIVE_BASE_FITNESS
        };
        let fitness = (base_fitness + symmetric(rng, INITIAL_FITNESS_NOISE))
            .clamp(INITIAL_FITNESS_MIN, INITIAL_FITNESS_MAX);
        let size = rng.random_range(INITIAL_SIZE_MIN..INITIAL_SIZE_MAX);
        bac_vec.push(Bacterium {
            id,
            position,
            is_resistant,
            fitness,
            age: 0,
            generation: 0,
            parent_id: None,
            color: Color::for_resistance(is_resistant),
            size,
        });
    }
    bac_vec
}

/// Advance `population` by one generation.
///
/// Stages run in order over the whole population: aging, antibiotic
/// killing, natural death, reproduction, mutation. Offspring are appended
/// after their parents and are mutated but never reproduce in the step they
/// are born.
pub fn advance_generation<R: Rng + ?Sized>(
    population: Population,
    params: &Params,
    rng: &mut R,
) -> StepOutcome {
    let dish = Dish::from_params(params);
    let next_id = population.iter().map(|bac| bac.id + 1).max().unwrap_or(0);

    // Age every bacterium before any of them can die.
    let aged: Population = population
        .into_iter()
        .map(|mut bac| {
            bac.age += 1;
            bac
        })
        .collect();
    let n_aged = aged.len();

    let concentration = params.antibiotic_concentration;
    let survivors = retain_par(aged, rng, |bac, rng| {
        survives_antibiotic(bac, concentration, rng)
    });
    let antibiotic_deaths = n_aged - survivors.len();
    let n_survivors = survivors.len();

    let living = retain_par(survivors, rng, |bac, rng| survives_natural_death(bac, rng));
    let natural_deaths = n_survivors - living.len();

    let pressure = Pressure {
        growth_rate: params.growth_rate,
        current_population: living.len(),
        carrying_capacity: dish.carrying_capacity(),
    };
    let offspring = if pressure.allows_growth() {
        reproduce_par(&living, &pressure, &dish, next_id, rng)
    } else {
        Vec::new()
    };
    let reproductions = offspring.len();

    let mut bac_vec = living;
    bac_vec.extend(offspring);

    let mutation_events = mutate_par(&mut bac_vec, params.mutation_rate, rng);

    let stats = StepStatistics {
        mutation_events,
        antibiotic_deaths,
        natural_deaths,
        reproductions,
        ..calculate_statistics(&bac_vec)
    };
    log::debug!("{stats:?}");

    StepOutcome {
        population: bac_vec,
        stats,
    }
}

/// Keep the bacteria passing `test`, preserving order.
fn retain_par<R, F>(bac_vec: Population, rng: &mut R, test: F) -> Population
where
    R: Rng + ?Sized,
    F: Fn(&Bacterium, &mut SimRng) -> bool + Sync,
{
    let seeds = item_seeds(rng, bac_vec.len());
    bac_vec
        .into_par_iter()
        .zip(seeds.into_par_iter())
        .filter_map(|(bac, seed)| test(&bac, &mut item_rng(seed)).then_some(bac))
        .collect()
}

/// Offspring of the parent at index `i` gets id `next_id + i`.
fn reproduce_par<R: Rng + ?Sized>(
    parents: &[Bacterium],
    pressure: &Pressure,
    dish: &Dish,
    next_id: BacteriumId,
    rng: &mut R,
) -> Population {
    let seeds = item_seeds(rng, parents.len());
    parents
        .par_iter()
        .zip(seeds.par_iter())
        .enumerate()
        .filter_map(|(i_par, (parent, &seed))| {
            let mut rng = item_rng(seed);
            should_reproduce(parent, pressure, &mut rng)
                .then(|| spawn_offspring(parent, next_id + i_par as BacteriumId, dish, &mut rng))
        })
        .collect()
}

/// Returns the number of bacteria that mutated.
fn mutate_par<R: Rng + ?Sized>(
    bac_vec: &mut [Bacterium],
    mutation_rate: f64,
    rng: &mut R,
) -> usize {
    let seeds = item_seeds(rng, bac_vec.len());
    bac_vec
        .par_iter_mut()
        .zip(seeds.par_iter())
        .map(|(bac, &seed)| mutate(bac, mutation_rate, &mut item_rng(seed)))
        .filter(|&mutated| mutated)
        .count()
}
