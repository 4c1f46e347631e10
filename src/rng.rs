//! Random number sources.
//!
//! Every stochastic decision in the engine draws from a generator passed in
//! by the caller. Parallel stages never share a generator: the caller's
//! generator produces one seed per bacterium, sequentially, and each
//! bacterium is then evaluated with its own [`SimRng`] built from that seed.
//! The result does not depend on how rayon schedules the work.

use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Generator used for all simulation randomness.
pub type SimRng = ChaCha12Rng;

/// Create a generator from a fixed seed, or from OS entropy if `seed` is `None`.
pub fn new_rng(seed: Option<u64>) -> Result<SimRng> {
    match seed {
        Some(seed) => Ok(SimRng::seed_from_u64(seed)),
        None => SimRng::try_from_os_rng().context("failed to seed rng from os"),
    }
}

/// Draw one seed per item from `rng`.
pub fn item_seeds<R: Rng + ?Sized>(rng: &mut R, n_items: usize) -> Vec<u64> {
    (0..n_items).map(|_| rng.random()).collect()
}

/// Generator for a single item of a parallel stage.
pub fn item_rng(seed: u64) -> SimRng {
    SimRng::seed_from_u64(seed)
}

/// Uniform draw in `[-half_width, half_width)`.
pub fn symmetric<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    (rng.random::<f64>() - 0.5) * 2.0 * half_width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rngs_agree() {
        let mut rng_a = new_rng(Some(7)).unwrap();
        let mut rng_b = new_rng(Some(7)).unwrap();
        assert_eq!(item_seeds(&mut rng_a, 16), item_seeds(&mut rng_b, 16));
    }

    #[test]
    fn symmetric_stays_in_range() {
        let mut rng = item_rng(3);
        for _ in 0..10_000 {
            let val = symmetric(&mut rng, 0.25);
            assert!((-0.25..0.25).contains(&val));
        }
    }
}
