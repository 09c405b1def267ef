//! Timed repeated execution of a single query

use crate::error::{LakebenchError, Result};
use crate::output::PreviewFormatter;
use crate::session::SqlEngine;
use std::io::Write;
use std::time::Instant;
use tracing::info;

/// Timings of one benchmark case
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub name: String,
    /// Elapsed seconds of each run, rounded to 2 decimals
    pub run_secs: Vec<f64>,
    /// Mean of `run_secs`, rounded to a whole second
    pub average_secs: f64,
}

impl BenchmarkReport {
    /// Build a report from per-run timings
    pub fn from_runs(name: impl Into<String>, run_secs: Vec<f64>) -> Result<Self> {
        if run_secs.is_empty() {
            return Err(LakebenchError::InvalidArgument(
                "a benchmark needs at least one run".to_string(),
            ));
        }
        let average_secs = mean_rounded(&run_secs);
        Ok(Self {
            name: name.into(),
            run_secs,
            average_secs,
        })
    }

    pub fn retries(&self) -> usize {
        self.run_secs.len()
    }

    pub fn total_secs(&self) -> f64 {
        self.run_secs.iter().sum()
    }
}

/// Round to `digits` decimals, ties to even
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round_ties_even() / factor
}

/// Render seconds the way the report lines show them: integral values keep
/// one decimal place (`1.0`, `0.0`)
pub fn format_secs(secs: f64) -> String {
    format!("{:?}", secs)
}

/// Report line of one timed run
pub fn run_line(attempt: usize, name: &str, secs: f64) -> String {
    format!(
        "Retry times : {}, {} microbenchmark takes {} seconds",
        attempt,
        name,
        format_secs(secs)
    )
}

/// Mean rounded to a whole number, ties to even
pub fn mean_rounded(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    (total / values.len() as f64).round_ties_even()
}

/// Runs a query a fixed number of times and reports its timings
#[derive(Debug)]
pub struct MicroBenchmarkRunner {
    retries: usize,
    preview: PreviewFormatter,
}

impl MicroBenchmarkRunner {
    pub fn new(retries: usize, preview: PreviewFormatter) -> Result<Self> {
        if retries == 0 {
            return Err(LakebenchError::InvalidArgument(
                "retry count must be at least 1".to_string(),
            ));
        }
        Ok(Self { retries, preview })
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    /// Execute `sql` `retries` times, printing a preview and the timing of
    /// each run, then the average
    ///
    /// The first engine error aborts the remaining runs.
    pub async fn run<E, W>(
        &self,
        engine: &E,
        name: &str,
        sql: &str,
        out: &mut W,
    ) -> Result<BenchmarkReport>
    where
        E: SqlEngine + ?Sized,
        W: Write,
    {
        let mut run_secs = Vec::with_capacity(self.retries);
        // One extra row tells the preview whether rows were cut.
        let fetch = self.preview.max_rows().saturating_add(1);

        for attempt in 1..=self.retries {
            let start = Instant::now();
            let batches = engine.preview(sql, fetch).await?;
            self.preview.write(out, &batches)?;
            let secs = round_to(start.elapsed().as_secs_f64(), 2);

            run_secs.push(secs);
            writeln!(out, "{}", run_line(attempt, name, secs))?;
            info!(query = name, attempt, secs, "benchmark run finished");
        }

        let report = BenchmarkReport::from_runs(name, run_secs)?;
        writeln!(
            out,
            "{} microbenchmark takes average {} seconds after {} retries",
            name, report.average_secs, self.retries
        )?;
        Ok(report)
    }
}
