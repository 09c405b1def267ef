//! Filesystem catalog client for managed tables
//!
//! Layout per table, rooted at `<warehouse>/<namespace...>/<name>/`:
//! - `data/<snapshot-id>-<uuid>.parquet` data files
//! - `metadata/v<N>.metadata.json` one file per committed version
//! - `metadata/version-hint.text` the current version number
//!
//! A version is published by hard-linking a fully written temp file to its
//! final name, which fails when the name is taken, so two writers racing on
//! the same version cannot both commit. The hint is replaced by rename.
//! Data files of a failed commit are removed again.

use crate::error::{LakebenchError, Result};
use crate::table::ident::{validate_namespace, TableIdent};
use crate::table::metadata::{DataFile, Operation, Snapshot, TableMetadata, TableSchema};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rand::Rng;
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

const DATA_DIR: &str = "data";
const METADATA_DIR: &str = "metadata";
const VERSION_HINT: &str = "version-hint.text";

/// How a write treats an existing table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Create a new table; fail if it exists
    #[default]
    Create,
    /// Add rows to an existing table
    Append,
    /// Create the table, or replace its schema and contents if it exists
    CreateOrReplace,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "append" => Ok(Self::Append),
            "replace" | "create-or-replace" => Ok(Self::CreateOrReplace),
            other => Err(format!(
                "unknown write mode {:?}, expected create, append or replace",
                other
            )),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Append => write!(f, "append"),
            Self::CreateOrReplace => write!(f, "replace"),
        }
    }
}

/// Catalog of managed tables under one warehouse directory
#[derive(Debug, Clone)]
pub struct WarehouseCatalog {
    root: PathBuf,
}

impl WarehouseCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_dir(&self, ident: &TableIdent) -> PathBuf {
        self.root.join(ident.relative_path())
    }

    pub fn table_exists(&self, ident: &TableIdent) -> bool {
        self.table_dir(ident)
            .join(METADATA_DIR)
            .join(VERSION_HINT)
            .is_file()
    }

    /// Tables directly under a namespace, sorted by name
    pub fn list_tables(&self, namespace: &[String]) -> Result<Vec<TableIdent>> {
        validate_namespace(namespace)?;
        let dir: PathBuf = namespace.iter().fold(self.root.clone(), |p, ns| p.join(ns));
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut tables = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Ok(ident) = TableIdent::new(namespace.to_vec(), name) else {
                continue;
            };
            if self.table_exists(&ident) {
                tables.push(ident);
            }
        }
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(tables)
    }

    /// Write `batches` with the given mode
    pub fn write(
        &self,
        ident: &TableIdent,
        schema: SchemaRef,
        batches: &[RecordBatch],
        mode: WriteMode,
    ) -> Result<ManagedTable> {
        match mode {
            WriteMode::Create => self.create_table(ident, schema, batches),
            WriteMode::Append => self.append(ident, schema, batches),
            WriteMode::CreateOrReplace => self.create_or_replace(ident, schema, batches),
        }
    }

    /// Create a table holding `batches`
    pub fn create_table(
        &self,
        ident: &TableIdent,
        schema: SchemaRef,
        batches: &[RecordBatch],
    ) -> Result<ManagedTable> {
        if self.table_exists(ident) {
            return Err(LakebenchError::TableAlreadyExists(ident.to_string()));
        }
        let table_schema = TableSchema::from_arrow(&schema)?;
        check_batches(&table_schema, batches)?;

        let dir = self.table_dir(ident);
        let now = now_ms();
        let mut metadata = TableMetadata::new(
            uuid::Uuid::new_v4().to_string(),
            dir.display().to_string(),
            table_schema,
            now,
        );
        let snapshot_id = new_snapshot_id();
        let added = write_data_file(&dir, snapshot_id, &schema, batches)?;
        metadata.add_snapshot(snapshot_id, Operation::Append, added.clone(), now);

        commit_or_discard(&dir, 1, &metadata, &added)?;
        info!(table = %ident, snapshot_id, "created table");
        Ok(ManagedTable::new(ident.clone(), dir, 1, metadata))
    }

    /// Append `batches` to an existing table with a compatible schema
    pub fn append(
        &self,
        ident: &TableIdent,
        schema: SchemaRef,
        batches: &[RecordBatch],
    ) -> Result<ManagedTable> {
        let table = self.load_table(ident)?;
        let incoming = TableSchema::from_arrow(&schema)?;
        if !table.metadata.schema.is_compatible(&incoming) {
            return Err(LakebenchError::SchemaMismatch(format!(
                "cannot append to {}: table columns {:?}, incoming {:?}",
                ident,
                field_summary(&table.metadata.schema),
                field_summary(&incoming)
            )));
        }
        check_batches(&incoming, batches)?;

        let ManagedTable {
            dir,
            version,
            mut metadata,
            ..
        } = table;
        let snapshot_id = new_snapshot_id();
        let added = write_data_file(&dir, snapshot_id, &schema, batches)?;
        metadata.add_snapshot(snapshot_id, Operation::Append, added.clone(), now_ms());

        let version = version + 1;
        commit_or_discard(&dir, version, &metadata, &added)?;
        info!(table = %ident, snapshot_id, version, "appended to table");
        Ok(ManagedTable::new(ident.clone(), dir, version, metadata))
    }

    /// Create the table, or replace the schema and contents of an existing
    /// one while keeping its snapshot history
    pub fn create_or_replace(
        &self,
        ident: &TableIdent,
        schema: SchemaRef,
        batches: &[RecordBatch],
    ) -> Result<ManagedTable> {
        if !self.table_exists(ident) {
            return self.create_table(ident, schema, batches);
        }
        let table_schema = TableSchema::from_arrow(&schema)?;
        check_batches(&table_schema, batches)?;

        let ManagedTable {
            dir,
            version,
            mut metadata,
            ..
        } = self.load_table(ident)?;
        metadata.schema = table_schema;
        let snapshot_id = new_snapshot_id();
        let added = write_data_file(&dir, snapshot_id, &schema, batches)?;
        metadata.add_snapshot(snapshot_id, Operation::Overwrite, added.clone(), now_ms());

        let version = version + 1;
        commit_or_discard(&dir, version, &metadata, &added)?;
        info!(table = %ident, snapshot_id, version, "replaced table");
        Ok(ManagedTable::new(ident.clone(), dir, version, metadata))
    }

    /// Load the current version of a table
    pub fn load_table(&self, ident: &TableIdent) -> Result<ManagedTable> {
        if !self.table_exists(ident) {
            return Err(LakebenchError::TableNotFound(ident.to_string()));
        }
        let dir = self.table_dir(ident);
        let metadata_dir = dir.join(METADATA_DIR);

        let hint = fs::read_to_string(metadata_dir.join(VERSION_HINT))?;
        let version: u64 = hint.trim().parse().map_err(|_| {
            LakebenchError::Catalog(format!("corrupt version hint for {}: {:?}", ident, hint))
        })?;
        let file = File::open(metadata_dir.join(metadata_file_name(version)))?;
        let metadata: TableMetadata = serde_json::from_reader(std::io::BufReader::new(file))?;

        debug!(table = %ident, version, "loaded table metadata");
        Ok(ManagedTable::new(ident.clone(), dir, version, metadata))
    }

    /// Remove a table with all of its data and metadata
    ///
    /// Also clears a table directory left without a version hint by an
    /// interrupted commit, so the name can be created again.
    pub fn drop_table(&self, ident: &TableIdent) -> Result<()> {
        let dir = self.table_dir(ident);
        let committed = self.table_exists(ident);
        if !committed && !dir.join(METADATA_DIR).is_dir() && !dir.join(DATA_DIR).is_dir() {
            return Err(LakebenchError::TableNotFound(ident.to_string()));
        }
        fs::remove_dir_all(&dir)?;
        info!(table = %ident, committed, "dropped table");
        Ok(())
    }
}

/// A loaded table version
#[derive(Debug, Clone)]
pub struct ManagedTable {
    ident: TableIdent,
    dir: PathBuf,
    version: u64,
    metadata: TableMetadata,
}

impl ManagedTable {
    fn new(ident: TableIdent, dir: PathBuf, version: u64, metadata: TableMetadata) -> Self {
        Self {
            ident,
            dir,
            version,
            metadata,
        }
    }

    pub fn ident(&self) -> &TableIdent {
        &self.ident
    }

    pub fn location(&self) -> &Path {
        &self.dir
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> Result<SchemaRef> {
        self.metadata.schema.to_arrow()
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.metadata.current_snapshot()
    }

    /// Row count recorded in the data file list, without reading data
    pub fn record_count(&self) -> i64 {
        self.metadata
            .live_files()
            .iter()
            .map(|f| f.record_count)
            .sum()
    }

    /// Read every live data file
    pub fn scan(&self) -> Result<Vec<RecordBatch>> {
        let mut batches = Vec::new();
        for data_file in self.metadata.live_files() {
            let path = self.dir.join(&data_file.file_path);
            let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
            for batch in reader {
                batches.push(batch?);
            }
        }
        Ok(batches)
    }

    /// Write schema and snapshot history in a human-readable form
    pub fn write_description<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Table: {}", self.ident)?;
        writeln!(out, "Location: {}", self.dir.display())?;
        writeln!(out, "UUID: {}", self.metadata.table_uuid)?;
        writeln!(out, "Version: {}", self.version)?;
        writeln!(out, "Schema:")?;
        for field in &self.metadata.schema.fields {
            let null = if field.required { "required" } else { "optional" };
            writeln!(out, "  {:>3}: {} {} ({})", field.id, field.name, field.field_type, null)?;
        }
        writeln!(out, "Snapshots:")?;
        for snapshot in &self.metadata.snapshots {
            let marker = if Some(snapshot.snapshot_id) == self.metadata.current_snapshot_id {
                "*"
            } else {
                " "
            };
            writeln!(
                out,
                " {} {} seq={} op={} files={} total-records={}",
                marker,
                snapshot.snapshot_id,
                snapshot.sequence_number,
                snapshot.operation,
                snapshot.data_files.len(),
                snapshot
                    .total_records()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string())
            )?;
        }
        Ok(())
    }
}

/// Every batch must carry the table's columns
fn check_batches(schema: &TableSchema, batches: &[RecordBatch]) -> Result<()> {
    for batch in batches {
        let batch_schema = TableSchema::from_arrow(&batch.schema())?;
        if !schema.is_compatible(&batch_schema) {
            return Err(LakebenchError::SchemaMismatch(format!(
                "batch columns {:?} do not match {:?}",
                field_summary(&batch_schema),
                field_summary(schema)
            )));
        }
    }
    Ok(())
}

fn field_summary(schema: &TableSchema) -> Vec<String> {
    schema
        .fields
        .iter()
        .map(|f| format!("{}:{}", f.name, f.field_type))
        .collect()
}

/// Write all rows into one Parquet file; no file when there are no rows
fn write_data_file(
    table_dir: &Path,
    snapshot_id: i64,
    schema: &SchemaRef,
    batches: &[RecordBatch],
) -> Result<Vec<DataFile>> {
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    if rows == 0 {
        return Ok(Vec::new());
    }

    let data_dir = table_dir.join(DATA_DIR);
    fs::create_dir_all(&data_dir)?;
    let file_name = format!("{}-{}.parquet", snapshot_id, uuid::Uuid::new_v4());
    let path = data_dir.join(&file_name);

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(File::create(&path)?, schema.clone(), Some(props))?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;

    let size = fs::metadata(&path)?.len();
    debug!(path = %path.display(), rows, bytes = size, "wrote data file");
    Ok(vec![DataFile {
        file_path: format!("{}/{}", DATA_DIR, file_name),
        file_format: "PARQUET".to_string(),
        record_count: rows as i64,
        file_size_in_bytes: size as i64,
    }])
}

fn metadata_file_name(version: u64) -> String {
    format!("v{}.metadata.json", version)
}

/// Commit, removing the data files this commit added when it fails
fn commit_or_discard(
    table_dir: &Path,
    version: u64,
    metadata: &TableMetadata,
    added: &[DataFile],
) -> Result<()> {
    let result = commit(table_dir, version, metadata);
    if result.is_err() {
        for file in added {
            let path = table_dir.join(&file.file_path);
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove uncommitted data file");
            }
        }
    }
    result
}

/// Publish `metadata` as `version`, then point the hint at it
fn commit(table_dir: &Path, version: u64, metadata: &TableMetadata) -> Result<()> {
    let metadata_dir = table_dir.join(METADATA_DIR);
    fs::create_dir_all(&metadata_dir)?;

    let staged = metadata_dir.join(temp_file_name(&metadata_file_name(version)));
    let published = write_staged(&staged, |w| Ok(serde_json::to_writer_pretty(w, metadata)?))
        .and_then(|()| {
            fs::hard_link(&staged, metadata_dir.join(metadata_file_name(version))).map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    LakebenchError::CommitConflict(format!(
                        "version {} of {} was committed concurrently",
                        version,
                        table_dir.display()
                    ))
                } else {
                    e.into()
                }
            })
        });
    let _ = fs::remove_file(&staged);
    published?;

    let hint = metadata_dir.join(temp_file_name(VERSION_HINT));
    write_staged(&hint, |w| Ok(write!(w, "{}", version)?))?;
    fs::rename(&hint, metadata_dir.join(VERSION_HINT))?;
    Ok(())
}

/// Hidden, unique sibling name for staging `name`
fn temp_file_name(name: &str) -> String {
    format!(".{}.{}.tmp", name, uuid::Uuid::new_v4())
}

/// Write and sync a staging file; removed again on failure
fn write_staged<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut std::io::BufWriter<File>) -> Result<()>,
{
    let result = (|| -> Result<()> {
        let mut writer = std::io::BufWriter::new(File::create(path)?);
        fill(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    })();
    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result
}

fn new_snapshot_id() -> i64 {
    rand::thread_rng().gen_range(1..i64::MAX)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
