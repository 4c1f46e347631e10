//! Death tests: antibiotic killing and natural mortality.

use crate::model::Bacterium;
use rand::prelude::*;

/// Kill constant of the exponential dose-response curve.
const KILL_CONSTANT: f64 = 3.0;

const RESISTANT_FACTOR: f64 = 0.9;
const SENSITIVE_FACTOR: f64 = 0.1;

const AGE_DEATH_RATE_PER_STEP: f64 = 0.001;
const AGE_DEATH_RATE_MAX: f64 = 0.1;
const FITNESS_DEATH_RATE: f64 = 0.02;

/// Probability of surviving one step at the given antibiotic concentration.
///
/// The resistance factor scales the effective dose down instead of gating
/// survival, so resistant bacteria still die at high concentrations.
pub fn antibiotic_survival_prob(bac: &Bacterium, concentration: f64) -> f64 {
    let resistance_factor = if bac.is_resistant {
        RESISTANT_FACTOR
    } else {
        SENSITIVE_FACTOR
    };
    let effective_concentration = concentration * (1.0 - resistance_factor);
    (-KILL_CONSTANT * effective_concentration).exp()
}

/// Antibiotic survival test.
pub fn survives_antibiotic<R: Rng + ?Sized>(
    bac: &Bacterium,
    concentration: f64,
    rng: &mut R,
) -> bool {
    if concentration == 0.0 {
        return true;
    }
    rng.random::<f64>() < antibiotic_survival_prob(bac, concentration)
}

/// Probability of dying of natural causes in one step.
pub fn natural_death_rate(bac: &Bacterium) -> f64 {
    let age_death_rate = (bac.age as f64 * AGE_DEATH_RATE_PER_STEP).min(AGE_DEATH_RATE_MAX);
    let fitness_death_rate = (1.0 - bac.fitness) * FITNESS_DEATH_RATE;
    age_death_rate + fitness_death_rate
}

/// Natural mortality test.
pub fn survives_natural_death<R: Rng + ?Sized>(bac: &Bacterium, rng: &mut R) -> bool {
    rng.random::<f64>() > natural_death_rate(bac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Position};
    use crate::rng::item_rng;

    fn bacterium(is_resistant: bool, fitness: f64, age: u32) -> Bacterium {
        Bacterium {
            id: 0,
            position: Position { x: 0.0, y: 0.0 },
            is_resistant,
            fitness,
            age,
            generation: 0,
            parent_id: None,
            color: Color::for_resistance(is_resistant),
            size: 3.0,
        }
    }

    #[test]
    fn zero_concentration_never_kills() {
        let mut rng = item_rng(1);
        let bac = bacterium(false, 0.0, 100);
        assert!((0..1_000).all(|_| survives_antibiotic(&bac, 0.0, &mut rng)));
    }

    #[test]
    fn survival_prob_follows_dose_response() {
        let sensitive = bacterium(false, 0.5, 0);
        let resistant = bacterium(true, 0.5, 0);
        let expected_sensitive = (-3.0_f64 * 0.9).exp();
        let expected_resistant = (-3.0_f64 * 0.1).exp();
        assert!((antibiotic_survival_prob(&sensitive, 1.0) - expected_sensitive).abs() < 1e-12);
        assert!((antibiotic_survival_prob(&resistant, 1.0) - expected_resistant).abs() < 1e-12);
    }

    #[test]
    fn resistant_bacteria_survive_more_often() {
        let mut rng = item_rng(4);
        let n_trials = 10_000;
        let sensitive = bacterium(false, 0.5, 0);
        let resistant = bacterium(true, 0.5, 0);
        let n_sensitive = (0..n_trials)
            .filter(|_| survives_antibiotic(&sensitive, 1.0, &mut rng))
            .count();
        let n_resistant = (0..n_trials)
            .filter(|_| survives_antibiotic(&resistant, 1.0, &mut rng))
            .count();
        assert!(n_resistant > n_sensitive);
        // Resistant bacteria still die sometimes at full dose.
        assert!(n_resistant < n_trials);
    }

    #[test]
    fn age_death_rate_saturates() {
        let young = bacterium(false, 1.0, 10);
        let old = bacterium(false, 1.0, 500);
        let ancient = bacterium(false, 1.0, 5_000);
        assert!((natural_death_rate(&young) - 0.01).abs() < 1e-12);
        assert!((natural_death_rate(&old) - 0.1).abs() < 1e-12);
        assert!((natural_death_rate(&ancient) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn low_fitness_raises_death_rate() {
        let fit = bacterium(false, 1.0, 0);
        let unfit = bacterium(false, 0.0, 0);
        assert_eq!(natural_death_rate(&fit), 0.0);
        assert!((natural_death_rate(&unfit) - 0.02).abs() < 1e-12);
    }
}
