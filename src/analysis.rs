use crate::run::{SimulationRun, Snapshot, StepRecord};
use crate::stats::{Accumulator, TimeSeries};
use anyhow::{Context, Result};
use rmp_serde::decode;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

/// Observable accumulated over population snapshots.
pub trait Obs {
    fn update(&mut self, snapshot: &Snapshot);
    fn report(&self) -> serde_json::Value;
}

pub struct MeanAge {
    acc: Accumulator,
}

impl MeanAge {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
        }
    }
}

impl Obs for MeanAge {
    fn update(&mut self, snapshot: &Snapshot) {
        let bac_vec = &snapshot.population;
        if bac_vec.is_empty() {
            return;
        }
        let age_sum: f64 = bac_vec.iter().map(|bac| bac.age as f64).sum();
        self.acc.add(age_sum / bac_vec.len() as f64);
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "mean_age": self.acc.report() })
    }
}

/// Lineage depth, measured by the generation index of each bacterium.
pub struct LineageDepth {
    acc: Accumulator,
    max_depth: u32,
}

impl LineageDepth {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
            max_depth: 0,
        }
    }
}

impl Obs for LineageDepth {
    fn update(&mut self, snapshot: &Snapshot) {
        let bac_vec = &snapshot.population;
        if bac_vec.is_empty() {
            return;
        }
        let depth_sum: f64 = bac_vec.iter().map(|bac| bac.generation as f64).sum();
        self.acc.add(depth_sum / bac_vec.len() as f64);
        let max_depth = bac_vec.iter().map(|bac| bac.generation).max().unwrap_or(0);
        self.max_depth = self.max_depth.max(max_depth);
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "lineage_depth": self.acc.report(),
            "max_lineage_depth": self.max_depth,
        })
    }
}

pub struct ResistantFraction {
    time_series: TimeSeries,
}

impl ResistantFraction {
    pub fn new() -> Self {
        Self {
            time_series: TimeSeries::new(),
        }
    }
}

impl Obs for ResistantFraction {
    fn update(&mut self, snapshot: &Snapshot) {
        let bac_vec = &snapshot.population;
        if bac_vec.is_empty() {
            return;
        }
        let n_resistant = bac_vec.iter().filter(|bac| bac.is_resistant).count();
        self.time_series.push(n_resistant as f64 / bac_vec.len() as f64);
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "snapshot_resistant_fraction": self.time_series.report() })
    }
}

pub struct Analyzer {
    obs_ptr_vec: Vec<Box<dyn Obs>>,
    n_snapshots: usize,
}

impl Analyzer {
    pub fn new() -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(MeanAge::new()),
            Box::new(LineageDepth::new()),
            Box::new(ResistantFraction::new()),
        ];
        Self {
            obs_ptr_vec,
            n_snapshots: 0,
        }
    }

    pub fn add_snapshot(&mut self, snapshot: &Snapshot) {
        for obs in &mut self.obs_ptr_vec {
            obs.update(snapshot);
        }
        self.n_snapshots += 1;
    }

    /// Feed every snapshot frame stored in a trajectory file.
    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        while !reader
            .fill_buf()
            .context("failed to read trajectory")?
            .is_empty()
        {
            let snapshot: Snapshot =
                decode::from_read(&mut reader).context("failed to deserialize snapshot")?;
            self.add_snapshot(&snapshot);
        }

        Ok(())
    }

    pub fn report(&self, run: &SimulationRun) -> serde_json::Value {
        let history = run.history();

        let mut total_population = TimeSeries::new();
        let mut resistant_fraction = TimeSeries::new();
        let mut average_fitness = TimeSeries::new();
        for record in history {
            total_population.push(record.stats.total_population as f64);
            resistant_fraction.push(record.stats.resistant_fraction());
            average_fitness.push(record.stats.average_fitness);
        }

        let population = run.population();
        let n_resistant = population.iter().filter(|bac| bac.is_resistant).count();
        let mut color_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for bac in population {
            *color_counts.entry(bac.color.hex()).or_default() += 1;
        }

        let obs_reports: Vec<_> = self.obs_ptr_vec.iter().map(|obs| obs.report()).collect();

        serde_json::json!({
            "final_state": {
                "generation": run.generation(),
                "state": run.state(),
                "total_population": population.len(),
                "resistant_count": n_resistant,
                "sensitive_count": population.len() - n_resistant,
                "color_counts": color_counts,
            },
            "time_series": {
                "total_population": total_population.report(),
                "resistant_fraction": resistant_fraction.report(),
                "average_fitness": average_fitness.report(),
            },
            "n_snapshots": self.n_snapshots,
            "snapshots": obs_reports,
        })
    }

    pub fn save_results<P: AsRef<Path>>(&self, run: &SimulationRun, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &self.report(run))
            .context("failed to serialize results")?;
        Ok(())
    }
}

const CSV_HEADER: &str = "Generation,Total Population,Resistant,Sensitive,Average Fitness,\
                          Mutations,Antibiotic Deaths,Natural Deaths,Reproductions";

/// Write the statistics history as CSV, one row per step.
pub fn write_csv<W: Write>(history: &[StepRecord], writer: &mut W) -> Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    for record in history {
        let stats = &record.stats;
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            record.generation,
            stats.total_population,
            stats.resistant_count,
            stats.sensitive_count,
            stats.average_fitness,
            stats.mutation_events,
            stats.antibiotic_deaths,
            stats.natural_deaths,
            stats.reproductions,
        )?;
    }
    Ok(())
}

pub fn save_csv<P: AsRef<Path>>(history: &[StepRecord], file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    write_csv(history, &mut writer).context("failed to write csv")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;

    fn run() -> SimulationRun {
        let params = Params {
            initial_population: 30,
            growth_rate: 0.5,
            antibiotic_concentration: 0.0,
            mutation_rate: 0.0,
            duration: 4,
            petri_dish_size: 200,
        };
        let mut run = SimulationRun::new(params, Some(9)).unwrap();
        while !run.is_completed() {
            run.step().unwrap();
        }
        run
    }

    #[test]
    fn csv_has_header_and_one_row_per_step() {
        let run = run();
        let mut buf = Vec::new();
        write_csv(run.history(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Generation,Total Population,Resistant"));
        assert!(lines[1].starts_with("1,"));
        assert!(lines[4].starts_with("4,"));
        assert_eq!(lines[1].split(',').count(), 9);
    }

    #[test]
    fn report_summarizes_run() {
        let run = run();
        let mut analyzer = Analyzer::new();
        analyzer.add_snapshot(&run.snapshot());
        let report = analyzer.report(&run);
        assert_eq!(report["final_state"]["generation"], 4);
        assert_eq!(report["final_state"]["state"], "Completed");
        assert_eq!(
            report["final_state"]["total_population"],
            run.population().len()
        );
        assert_eq!(report["n_snapshots"], 1);

        let color_counts = &report["final_state"]["color_counts"];
        let count = |hex: &str| color_counts[hex].as_u64().unwrap_or(0) as usize;
        let n_resistant = run.population().iter().filter(|bac| bac.is_resistant).count();
        assert_eq!(count("#ff4444"), n_resistant);
        assert_eq!(count("#44ff44"), run.population().len() - n_resistant);
    }
}
