use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, ops::RangeBounds};

/// Parameters of one simulation run.
///
/// The engine assumes these are valid; [`Params::validate`] is the check
/// callers run before handing them over.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Number of founder bacteria.
    pub initial_population: usize,
    /// Per-step reproduction rate.
    pub growth_rate: f64,
    /// Antibiotic concentration in the dish.
    pub antibiotic_concentration: f64,
    /// Per-step mutation probability.
    pub mutation_rate: f64,
    /// Number of generations to simulate.
    pub duration: usize,
    /// Dish diameter.
    pub petri_dish_size: u32,
}

impl Params {
    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        check_num(self.initial_population, 1..=10_000)
            .context("invalid initial population")?;
        check_num(self.growth_rate, 0.0..=1.0).context("invalid growth rate")?;
        check_num(self.antibiotic_concentration, 0.0..=1.0)
            .context("invalid antibiotic concentration")?;
        check_num(self.mutation_rate, 0.0..=1.0).context("invalid mutation rate")?;
        check_num(self.duration, 1..=1_000).context("invalid duration")?;
        check_num(self.petri_dish_size, 100..=2_000).context("invalid petri dish size")?;

        Ok(())
    }

    /// Radius of the dish.
    pub fn dish_radius(&self) -> f64 {
        self.petri_dish_size as f64 / 2.0
    }
}

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    // NaN fails every comparison and is rejected here too.
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
