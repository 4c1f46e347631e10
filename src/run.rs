use crate::engine::{advance_generation, initialize_population};
use crate::model::Population;
use crate::params::Params;
use crate::rng::{SimRng, new_rng};
use crate::stats::StepStatistics;
use anyhow::{Context, Result, bail};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    NotStarted,
    Running,
    Paused,
    Completed,
}

/// Statistics of the step that produced `generation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub generation: usize,
    pub stats: StepStatistics,
}

/// Population saved at a given generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: usize,
    pub population: Population,
}

/// Simulation run.
///
/// Holds the parameters, current population, statistics history, and random
/// number generator, and enforces the run-state transitions around the
/// engine. Only whole steps are ever visible or saved.
#[derive(Serialize, Deserialize)]
pub struct SimulationRun {
    params: Params,
    generation: usize,
    state: RunState,
    population: Population,
    history: Vec<StepRecord>,
    rng: SimRng,
}

impl SimulationRun {
    /// Create a new run with a freshly initialized population.
    ///
    /// A fixed `seed` makes the whole run reproducible.
    pub fn new(params: Params, seed: Option<u64>) -> Result<Self> {
        let mut rng = new_rng(seed)?;
        let population = initialize_population(&params, &mut rng);
        Ok(Self {
            params,
            generation: 0,
            state: RunState::NotStarted,
            population,
            history: Vec::new(),
            rng,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            population: self.population.clone(),
        }
    }

    /// Start or resume the run.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            RunState::NotStarted | RunState::Paused => {
                self.state = RunState::Running;
                Ok(())
            }
            RunState::Running => Ok(()),
            RunState::Completed => bail!("run has already reached its maximum duration"),
        }
    }

    /// Pause a running run.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != RunState::Running {
            bail!("only a running run can be paused, but run is {:?}", self.state);
        }
        self.state = RunState::Paused;
        Ok(())
    }

    /// Advance the run by one generation.
    ///
    /// Marks the run completed once the configured duration is reached.
    pub fn step(&mut self) -> Result<&StepRecord> {
        if self.is_completed() {
            bail!("run has already reached its maximum duration");
        }

        let population = std::mem::take(&mut self.population);
        let outcome = advance_generation(population, &self.params, &mut self.rng);
        self.population = outcome.population;
        self.generation += 1;

        if self.generation >= self.params.duration {
            self.state = RunState::Completed;
            log::info!("run completed at generation {}", self.generation);
        }

        self.history.push(StepRecord {
            generation: self.generation,
            stats: outcome.stats,
        });
        self.history.last().context("history is empty")
    }

    /// Save a checkpoint of the entire run.
    ///
    /// Includes the generator state, so a loaded run continues the same
    /// random sequence.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize run")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved run checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let run = decode::from_read(&mut reader).context("failed to deserialize run")?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        Params {
            initial_population: 50,
            growth_rate: 0.4,
            antibiotic_concentration: 0.1,
            mutation_rate: 0.02,
            duration: 3,
            petri_dish_size: 300,
        }
    }

    #[test]
    fn state_transitions() {
        let mut run = SimulationRun::new(params(), Some(1)).unwrap();
        assert_eq!(run.state(), RunState::NotStarted);
        assert!(run.pause().is_err());

        run.start().unwrap();
        assert_eq!(run.state(), RunState::Running);
        run.pause().unwrap();
        assert_eq!(run.state(), RunState::Paused);
        run.start().unwrap();

        for generation in 1..=3 {
            let record = run.step().unwrap();
            assert_eq!(record.generation, generation);
        }
        assert!(run.is_completed());
        assert!(run.step().is_err());
        assert!(run.start().is_err());
        assert_eq!(run.history().len(), 3);
    }

    #[test]
    fn history_matches_population() {
        let mut run = SimulationRun::new(params(), Some(2)).unwrap();
        run.step().unwrap();
        let record = &run.history()[0];
        assert_eq!(record.stats.total_population, run.population().len());
    }

    #[test]
    fn checkpoint_resumes_same_sequence() {
        let dir = std::env::temp_dir().join("petrisim_run_checkpoint");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("checkpoint.msgpack");

        let mut run_a = SimulationRun::new(params(), Some(3)).unwrap();
        run_a.step().unwrap();
        run_a.save_checkpoint(&file).unwrap();
        let mut run_b = SimulationRun::load_checkpoint(&file).unwrap();

        run_a.step().unwrap();
        run_b.step().unwrap();
        assert_eq!(run_a.population(), run_b.population());
        assert_eq!(run_a.history(), run_b.history());

        std::fs::remove_dir_all(&dir).ok();
    }
}
