//! The fixed micro-benchmark suite over the TPC-DS views

use crate::bench::queries::{
    case_names, CROSS_JOIN, NDS_Q14A_SUBQUERY, SAMPLE_VIEW, TPCDS_VIEWS, VIEW_QUERIES,
};
use crate::bench::runner::{format_secs, round_to, BenchmarkReport, MicroBenchmarkRunner};
use crate::config::BenchConfig;
use crate::error::{LakebenchError, Result};
use crate::output::PreviewFormatter;
use crate::session::ComputeSession;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Printed between benchmark cases
pub const SEPARATOR: &str = "--------------------------------------------------";

/// Results of a suite run
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub cases: Vec<BenchmarkReport>,
    /// Seconds spent by the scan-and-write step, when it ran
    pub copy_secs: Option<f64>,
}

impl SuiteReport {
    pub fn case(&self, name: &str) -> Option<&BenchmarkReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Write a closing summary of every case's average
    pub fn write_summary<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "=== Summary ===")?;
        for case in &self.cases {
            writeln!(
                out,
                "{:<24} average {:>6} s  runs {:?}",
                case.name, case.average_secs, case.run_secs
            )?;
        }
        if let Some(secs) = self.copy_secs {
            writeln!(out, "{:<24} {:>14} s", "Parquet scan+write", format_secs(secs))?;
        }
        Ok(())
    }
}

/// Report line of the scan-and-write step
pub fn copy_line(secs: f64) -> String {
    format!(
        "scanning and writing parquet cost : {} seconds",
        format_secs(secs)
    )
}

/// Whether a separator line goes before this case; Q14a follows the skew
/// case directly
fn separated(case_name: &str) -> bool {
    case_name != NDS_Q14A_SUBQUERY.name
}

/// Register every TPC-DS view from `tpcds_dir/<view>`
pub async fn register_tpcds_views(session: &ComputeSession, tpcds_dir: &Path) -> Result<()> {
    for view in TPCDS_VIEWS {
        session
            .register_parquet_view(view, &tpcds_dir.join(view))
            .await?;
    }
    info!(views = TPCDS_VIEWS.len(), dir = %tpcds_dir.display(), "registered tpcds views");
    Ok(())
}

/// Run the suite: the view queries, then the Parquet copy and the cross
/// join over the copy
pub async fn run_suite<W: Write>(
    session: &ComputeSession,
    config: &BenchConfig,
    out: &mut W,
) -> Result<SuiteReport> {
    validate_selection(config)?;
    let runner = MicroBenchmarkRunner::new(
        config.retries,
        PreviewFormatter::new(config.format, config.preview_rows),
    )?;

    register_tpcds_views(session, &config.tpcds_dir()).await?;

    let mut report = SuiteReport::default();
    for query in VIEW_QUERIES.iter().filter(|q| config.selects(q.name)) {
        if separated(query.name) {
            writeln!(out, "{}", SEPARATOR)?;
        }
        let case = runner.run(session, query.name, query.sql, out).await?;
        report.cases.push(case);
    }

    if config.selects(CROSS_JOIN.name) {
        let start = Instant::now();
        session
            .copy_parquet(
                &config.tpcds_dir().join("customer"),
                &config.sample_dir(),
                config.sample_rows,
            )
            .await?;
        let secs = round_to(start.elapsed().as_secs_f64(), 2);
        writeln!(out, "{}", copy_line(secs))?;
        report.copy_secs = Some(secs);

        session
            .register_repartitioned_view(SAMPLE_VIEW, &config.sample_dir(), config.sample_partitions)
            .await?;

        writeln!(out, "{}", SEPARATOR)?;
        let case = runner
            .run(session, CROSS_JOIN.name, CROSS_JOIN.sql, out)
            .await?;
        report.cases.push(case);
    }

    Ok(report)
}

fn validate_selection(config: &BenchConfig) -> Result<()> {
    let known = case_names();
    for name in &config.only {
        if !known.iter().any(|k| k.eq_ignore_ascii_case(name)) {
            return Err(LakebenchError::InvalidArgument(format!(
                "unknown benchmark {:?}, expected one of {:?}",
                name, known
            )));
        }
    }
    Ok(())
}
