//! Write-then-read smoke test of the table format

use crate::config::TableSmokeConfig;
use crate::error::Result;
use crate::session::ComputeSession;
use crate::table::catalog::WarehouseCatalog;
use crate::table::ident::TableIdent;
use crate::table::rows::{generate_rows, synthetic_schema};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::time::Instant;
use tracing::info;

/// Outcome of one smoke test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSmokeReport {
    pub table: TableIdent,
    /// Rows generated and written by this run
    pub rows_written: usize,
    /// Rows the engine counted when reading the table back
    pub rows_read: usize,
    /// Row count recorded in the table metadata
    pub recorded_rows: i64,
    pub snapshot_id: Option<i64>,
}

/// Generate rows, write them to the configured table, read the table back
/// through the session and print the row count
pub async fn run_table_smoke<W: Write>(
    session: &ComputeSession,
    catalog: &WarehouseCatalog,
    config: &TableSmokeConfig,
    out: &mut W,
) -> Result<TableSmokeReport> {
    let ident = TableIdent::parse(&config.table)?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    let batches = generate_rows(config.num_rows, config.batch_size, &mut rng)?;
    let written = catalog.write(&ident, synthetic_schema(), &batches, config.mode)?;
    info!(
        table = %ident,
        rows = config.num_rows,
        mode = %config.mode,
        version = written.version(),
        "wrote rows"
    );

    let table = catalog.load_table(&ident)?;
    let count = session.count_rows(table.schema()?, table.scan()?).await?;
    writeln!(out, "Number of rows inserted: {}", count)?;
    info!(
        table = %ident,
        count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "read table back"
    );

    Ok(TableSmokeReport {
        rows_written: config.num_rows,
        rows_read: count,
        recorded_rows: table.record_count(),
        snapshot_id: table.metadata().current_snapshot_id,
        table: ident,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LakebenchError;
    use crate::table::WriteMode;

    #[tokio::test]
    async fn test_smoke_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = WarehouseCatalog::new(dir.path());
        let config = TableSmokeConfig::new(1000)
            .with_warehouse(dir.path())
            .with_batch_size(300)
            .with_seed(1);

        let mut out = Vec::new();
        let report = run_table_smoke(&ComputeSession::new(), &catalog, &config, &mut out)
            .await
            .unwrap();
        assert_eq!(report.rows_read, 1000);
        assert_eq!(report.recorded_rows, 1000);
        assert!(report.snapshot_id.is_some());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Number of rows inserted: 1000\n"
        );
    }

    #[tokio::test]
    async fn test_smoke_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = WarehouseCatalog::new(dir.path());
        let config = TableSmokeConfig::new(0).with_seed(1);
        let mut out = Vec::new();
        let report = run_table_smoke(&ComputeSession::new(), &catalog, &config, &mut out)
            .await
            .unwrap();
        assert_eq!(report.rows_read, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Number of rows inserted: 0\n"
        );
    }

    #[tokio::test]
    async fn test_smoke_create_twice_fails_append_sums() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = WarehouseCatalog::new(dir.path());
        let session = ComputeSession::new();
        let config = TableSmokeConfig::new(10).with_seed(1);
        let mut out = Vec::new();

        run_table_smoke(&session, &catalog, &config, &mut out)
            .await
            .unwrap();
        let err = run_table_smoke(&session, &catalog, &config, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, LakebenchError::TableAlreadyExists(_)));

        let append = config.clone().with_mode(WriteMode::Append);
        let report = run_table_smoke(&session, &catalog, &append, &mut out)
            .await
            .unwrap();
        assert_eq!(report.rows_written, 10);
        assert_eq!(report.rows_read, 20);
    }

    #[tokio::test]
    async fn test_smoke_rejects_bad_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = WarehouseCatalog::new(dir.path());
        let config = TableSmokeConfig::new(1).with_table("demo..bar");
        let mut out = Vec::new();
        let err = run_table_smoke(&ComputeSession::new(), &catalog, &config, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, LakebenchError::InvalidIdentifier(_)));
        assert!(out.is_empty());
    }
}
