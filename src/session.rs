//! Compute session - the SQL engine handle the driver submits work to
//!
//! Wraps a DataFusion `SessionContext`. Everything here is a call into the
//! engine's public API: view registration, query submission, a Parquet
//! copy, and row counting.

use crate::error::{LakebenchError, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::datasource::MemTable;
use datafusion::logical_expr::Partitioning;
use datafusion::prelude::{DataFrame, ParquetReadOptions, SessionConfig, SessionContext};
use futures::TryStreamExt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Minimal query surface the benchmark runner needs
#[async_trait]
pub trait SqlEngine: Send + Sync {
    /// Execute `sql` and return at most `limit` rows of its result
    async fn preview(&self, sql: &str, limit: usize) -> Result<Vec<RecordBatch>>;
}

/// Handle to the SQL execution engine
pub struct ComputeSession {
    ctx: SessionContext,
}

impl Default for ComputeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeSession {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
        }
    }

    /// Create a session with a fixed number of target partitions
    pub fn with_target_partitions(partitions: usize) -> Self {
        let config = SessionConfig::new().with_target_partitions(partitions.max(1));
        Self {
            ctx: SessionContext::new_with_config(config),
        }
    }

    /// Underlying DataFusion context
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Register (or replace) a view over a Parquet file or directory
    pub async fn register_parquet_view(&self, name: &str, path: &Path) -> Result<()> {
        let location = path_str(path)?;
        self.ctx.deregister_table(name)?;
        self.ctx
            .register_parquet(name, location, ParquetReadOptions::default())
            .await?;
        debug!(view = name, path = location, "registered parquet view");
        Ok(())
    }

    /// Register (or replace) a view over a Parquet dataset, repartitioned
    /// round-robin into `partitions` partitions
    pub async fn register_repartitioned_view(
        &self,
        name: &str,
        path: &Path,
        partitions: usize,
    ) -> Result<()> {
        let df = self
            .ctx
            .read_parquet(path_str(path)?, ParquetReadOptions::default())
            .await?
            .repartition(Partitioning::RoundRobinBatch(partitions.max(1)))?;
        self.register_dataframe_view(name, df)?;
        debug!(view = name, partitions, "registered repartitioned view");
        Ok(())
    }

    /// Register (or replace) a view defined by a DataFrame
    pub fn register_dataframe_view(&self, name: &str, df: DataFrame) -> Result<()> {
        self.ctx.deregister_table(name)?;
        self.ctx.register_table(name, df.into_view())?;
        Ok(())
    }

    /// Whether a view or table with this name is registered
    pub fn has_view(&self, name: &str) -> Result<bool> {
        Ok(self.ctx.table_exist(name)?)
    }

    /// Submit a query and return its lazy result
    pub async fn sql(&self, sql: &str) -> Result<DataFrame> {
        Ok(self.ctx.sql(sql).await?)
    }

    /// Execute a query to completion and collect every batch
    pub async fn collect(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        let stream = self.sql(sql).await?.execute_stream().await?;
        Ok(stream.try_collect().await?)
    }

    /// Copy at most `limit` rows of a Parquet dataset to `dest`, replacing
    /// whatever was there
    pub async fn copy_parquet(&self, src: &Path, dest: &Path, limit: usize) -> Result<()> {
        let df = self
            .ctx
            .read_parquet(path_str(src)?, ParquetReadOptions::default())
            .await?
            .limit(0, Some(limit))?;

        if dest.exists() {
            fs::remove_dir_all(dest)?;
        }
        fs::create_dir_all(dest)?;

        // Trailing separator makes the engine write a directory of part files.
        let target = format!("{}/", path_str(dest)?.trim_end_matches('/'));
        df.write_parquet(&target, DataFrameWriteOptions::new(), None)
            .await?;
        debug!(src = %src.display(), dest = %dest.display(), limit, "copied parquet sample");
        Ok(())
    }

    /// Count rows of an in-memory dataset through the engine
    pub async fn count_rows(&self, schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<usize> {
        let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);
        let table = MemTable::try_new(schema, vec![batches])?;
        let count = self.ctx.read_table(Arc::new(table))?.count().await?;
        Ok(count)
    }
}

#[async_trait]
impl SqlEngine for ComputeSession {
    async fn preview(&self, sql: &str, limit: usize) -> Result<Vec<RecordBatch>> {
        let stream = self
            .sql(sql)
            .await?
            .limit(0, Some(limit))?
            .execute_stream()
            .await?;
        Ok(stream.try_collect().await?)
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        LakebenchError::InvalidArgument(format!("path is not valid UTF-8: {}", path.display()))
    })
}
