//! SQL micro-benchmark driver and table-format smoke test
//!
//! Runs a fixed set of timed SQL micro-benchmarks against TPC-DS style
//! Parquet views through an embedded DataFusion session, and exercises a
//! small Iceberg-style table format by writing synthetic rows and counting
//! them back.

pub mod bench;
pub mod config;
pub mod error;
pub mod output;
pub mod session;
pub mod table;
pub mod tpcds;

// Re-export main types
pub use bench::{run_suite, BenchmarkReport, MicroBenchmarkRunner, SuiteReport};
pub use config::{BenchConfig, TableSmokeConfig};
pub use error::{LakebenchError, Result};
pub use output::{OutputFormat, PreviewFormatter};
pub use session::{ComputeSession, SqlEngine};
pub use table::{run_table_smoke, ManagedTable, TableIdent, WarehouseCatalog, WriteMode};
pub use tpcds::TpcdsGenerator;
