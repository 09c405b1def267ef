//! Run configuration for the benchmark driver and the table smoke test

use crate::output::OutputFormat;
use crate::table::WriteMode;
use std::path::PathBuf;

/// Default data root holding `tpcds/<table>` Parquet datasets
pub const DEFAULT_DATA_ROOT: &str = "data";

/// Default warehouse directory for managed tables
pub const DEFAULT_WAREHOUSE: &str = "warehouse";

/// Default managed table written by the smoke test
pub const DEFAULT_TABLE: &str = "demo.foo.bar";

/// Configuration for a benchmark suite run
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Root directory containing `tpcds/` and receiving `tmp/`
    pub data_root: PathBuf,
    /// Number of timed executions per query
    pub retries: usize,
    /// Rows shown from each execution
    pub preview_rows: usize,
    /// Preview rendering
    pub format: OutputFormat,
    /// DataFusion target partitions (None = CPU count)
    pub target_partitions: Option<usize>,
    /// Rows copied by the scan-and-write step
    pub sample_rows: usize,
    /// Partitions of the copied dataset used by the cross join
    pub sample_partitions: usize,
    /// Case names to run; empty runs everything
    pub only: Vec<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            retries: 2,
            preview_rows: 5,
            format: OutputFormat::Table,
            target_partitions: None,
            sample_rows: 1_000_000,
            sample_partitions: 200,
            only: Vec::new(),
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.data_root = data_root.into();
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_target_partitions(mut self, partitions: usize) -> Self {
        self.target_partitions = Some(partitions.max(1));
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn with_sample_partitions(mut self, partitions: usize) -> Self {
        self.sample_partitions = partitions.max(1);
        self
    }

    pub fn with_only(mut self, names: Vec<String>) -> Self {
        self.only = names;
        self
    }

    /// Directory of the TPC-DS datasets
    pub fn tpcds_dir(&self) -> PathBuf {
        self.data_root.join("tpcds")
    }

    /// Destination of the scan-and-write step
    pub fn sample_dir(&self) -> PathBuf {
        self.data_root.join("tmp").join("customer1m")
    }

    /// Whether a case should run under the `only` filter
    pub fn selects(&self, case_name: &str) -> bool {
        self.only.is_empty()
            || self
                .only
                .iter()
                .any(|name| name.eq_ignore_ascii_case(case_name))
    }
}

/// Configuration for the table-format smoke test
#[derive(Debug, Clone)]
pub struct TableSmokeConfig {
    /// Warehouse root of the filesystem catalog
    pub warehouse: PathBuf,
    /// Dotted table identifier
    pub table: String,
    /// Number of synthetic rows to write
    pub num_rows: usize,
    pub mode: WriteMode,
    /// Rows per generated record batch
    pub batch_size: usize,
    /// RNG seed; None draws from entropy
    pub seed: Option<u64>,
}

impl Default for TableSmokeConfig {
    fn default() -> Self {
        Self {
            warehouse: PathBuf::from(DEFAULT_WAREHOUSE),
            table: DEFAULT_TABLE.to_string(),
            num_rows: 0,
            mode: WriteMode::Create,
            batch_size: 8192,
            seed: None,
        }
    }
}

impl TableSmokeConfig {
    pub fn new(num_rows: usize) -> Self {
        Self {
            num_rows,
            ..Self::default()
        }
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<PathBuf>) -> Self {
        self.warehouse = warehouse.into();
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.retries, 2);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.sample_rows, 1_000_000);
        assert_eq!(config.sample_partitions, 200);
        assert_eq!(config.tpcds_dir(), PathBuf::from("data/tpcds"));
        assert_eq!(config.sample_dir(), PathBuf::from("data/tmp/customer1m"));
    }

    #[test]
    fn test_only_filter_is_case_insensitive() {
        let config = BenchConfig::new().with_only(vec!["crossjoin".to_string()]);
        assert!(config.selects("Crossjoin"));
        assert!(!config.selects("Windowing with skew"));
        assert!(BenchConfig::new().selects("anything"));
    }

    #[test]
    fn test_smoke_builder() {
        let config = TableSmokeConfig::new(10)
            .with_table("a.b")
            .with_batch_size(0)
            .with_seed(7);
        assert_eq!(config.num_rows, 10);
        assert_eq!(config.table, "a.b");
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.mode, WriteMode::Create);
    }
}
