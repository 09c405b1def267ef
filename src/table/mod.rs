//! Managed tables in a filesystem warehouse
//!
//! A small Iceberg-style table format: versioned JSON metadata, snapshots
//! listing their Parquet data files, and a catalog that creates, appends to,
//! replaces and loads tables.

mod catalog;
mod ident;
mod metadata;
mod rows;
mod smoke;

pub use catalog::{ManagedTable, WarehouseCatalog, WriteMode};
pub use ident::{validate_namespace, TableIdent};
pub use metadata::{DataFile, Operation, SchemaField, Snapshot, TableMetadata, TableSchema};
pub use rows::{generate_rows, synthetic_schema};
pub use smoke::{run_table_smoke, TableSmokeReport};
