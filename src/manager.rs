use crate::analysis::{Analyzer, save_csv};
use crate::config::Config;
use crate::run::SimulationRun;
use anyhow::{Context, Result, bail};
use glob::glob;
use rmp_serde::encode;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let run = SimulationRun::new(self.cfg.params.clone(), self.cfg.seed)
            .context("failed to create run")?;
        log::info!("initialized {} bacteria", run.population().len());

        run.save_checkpoint(self.checkpoint_file(run_idx))
            .context("failed to save checkpoint")?;

        Ok(())
    }

    /// Step a run until it completes or `max_steps` steps have been taken.
    ///
    /// A run stopped early is saved as running; `pause_run` pauses it.
    pub fn run_sim(&self, run_idx: usize, max_steps: Option<usize>) -> Result<()> {
        let mut run = self.load_run(run_idx)?;
        run.start().context("failed to start run")?;

        let file_idx = self
            .count_trajectory_files(run_idx)
            .context("failed to count trajectory files")?;
        let file = self.trajectory_file(run_idx, file_idx);
        let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let steps_per_save = self.cfg.output.steps_per_save;
        let mut n_steps = 0;
        while !run.is_completed() && max_steps.is_none_or(|max_steps| n_steps < max_steps) {
            let record = run.step().context("failed to perform step")?;
            n_steps += 1;
            log::info!(
                "generation {:04}: population {}, resistant {}",
                record.generation,
                record.stats.total_population,
                record.stats.resistant_count
            );

            if run.generation() % steps_per_save == 0 || run.is_completed() {
                encode::write(&mut writer, &run.snapshot())
                    .context("failed to serialize snapshot")?;
            }
        }

        writer.flush().context("failed to flush writer stream")?;

        if !run.is_completed() {
            log::info!("stopped at generation {}", run.generation());
        }

        run.save_checkpoint(self.checkpoint_file(run_idx))
            .context("failed to save checkpoint")?;

        Ok(())
    }

    pub fn pause_run(&self, run_idx: usize) -> Result<()> {
        let mut run = self.load_run(run_idx)?;
        run.pause().context("failed to pause run")?;
        run.save_checkpoint(self.checkpoint_file(run_idx))
            .context("failed to save checkpoint")?;
        log::info!("paused at generation {}", run.generation());
        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run = self.load_run(run_idx)?;

            let mut analyzer = Analyzer::new();
            let n_files = self
                .count_trajectory_files(run_idx)
                .context("failed to count trajectory files")?;
            for file_idx in 0..n_files {
                analyzer
                    .add_file(self.trajectory_file(run_idx, file_idx))
                    .context("failed to add file")?;
            }

            save_csv(run.history(), self.statistics_file(run_idx))
                .context("failed to save statistics")?;
            analyzer
                .save_results(&run, self.results_file(run_idx))
                .context("failed to save results")?;
            log::info!("analyzed {:?}", self.run_dir(run_idx));
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs()? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn load_run(&self, run_idx: usize) -> Result<SimulationRun> {
        let checkpoint_file = self.checkpoint_file(run_idx);
        let run = SimulationRun::load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        if run.params() != &self.cfg.params {
            bail!("checkpoint params differ from the current config");
        }
        log::info!("loaded {checkpoint_file:?}");
        Ok(run)
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn count_trajectory_files(&self, run_idx: usize) -> Result<usize> {
        let pattern = self.run_dir(run_idx).join("trajectory-*.msgpack");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob trajectory files")?
            .filter_map(Result::ok)
            .count();
        Ok(count)
    }

    fn checkpoint_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("checkpoint.msgpack")
    }

    fn trajectory_file(&self, run_idx: usize, file_idx: usize) -> PathBuf {
        self.run_dir(run_idx)
            .join(format!("trajectory-{file_idx:04}.msgpack"))
    }

    fn statistics_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("statistics.csv")
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.json")
    }
}
