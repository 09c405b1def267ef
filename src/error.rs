//! Error types for the benchmark driver and table catalog

use thiserror::Error;

/// Result type alias for lakebench operations
pub type Result<T> = std::result::Result<T, LakebenchError>;

/// Main error type
#[derive(Error, Debug)]
pub enum LakebenchError {
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid table identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Commit conflict: {0}")]
    CommitConflict(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}
