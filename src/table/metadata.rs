//! Table metadata files
//!
//! One JSON document per table version, in the Iceberg naming: kebab-case
//! keys, a snapshot list and the current snapshot id. Each snapshot lists
//! its full set of live data files instead of pointing at manifests.

use crate::error::{LakebenchError, Result};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const FORMAT_VERSION: i32 = 2;

/// Summary keys recorded on every snapshot
pub const ADDED_RECORDS: &str = "added-records";
pub const ADDED_DATA_FILES: &str = "added-data-files";
pub const TOTAL_RECORDS: &str = "total-records";
pub const TOTAL_DATA_FILES: &str = "total-data-files";

/// A table version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableMetadata {
    pub format_version: i32,
    pub table_uuid: String,
    pub location: String,
    pub last_sequence_number: i64,
    pub last_updated_ms: i64,
    pub schema: TableSchema,
    pub current_snapshot_id: Option<i64>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl TableMetadata {
    /// Metadata of a table with no snapshots yet
    pub fn new(table_uuid: String, location: String, schema: TableSchema, now_ms: i64) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            table_uuid,
            location,
            last_sequence_number: 0,
            last_updated_ms: now_ms,
            schema,
            current_snapshot_id: None,
            snapshots: Vec::new(),
        }
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        let id = self.current_snapshot_id?;
        self.snapshots.iter().find(|s| s.snapshot_id == id)
    }

    /// Live data files of the current snapshot
    pub fn live_files(&self) -> &[DataFile] {
        self.current_snapshot()
            .map(|s| s.data_files.as_slice())
            .unwrap_or(&[])
    }

    /// Add a snapshot on top of the current one and make it current
    ///
    /// `Append` keeps the current live files, `Overwrite` drops them.
    pub fn add_snapshot(
        &mut self,
        snapshot_id: i64,
        operation: Operation,
        added: Vec<DataFile>,
        now_ms: i64,
    ) -> &Snapshot {
        let mut data_files = match operation {
            Operation::Append => self.live_files().to_vec(),
            Operation::Overwrite => Vec::new(),
        };
        let added_records: i64 = added.iter().map(|f| f.record_count).sum();
        let added_files = added.len();
        data_files.extend(added);

        let total_records: i64 = data_files.iter().map(|f| f.record_count).sum();
        let mut summary = BTreeMap::new();
        summary.insert(ADDED_RECORDS.to_string(), added_records.to_string());
        summary.insert(ADDED_DATA_FILES.to_string(), added_files.to_string());
        summary.insert(TOTAL_RECORDS.to_string(), total_records.to_string());
        summary.insert(TOTAL_DATA_FILES.to_string(), data_files.len().to_string());

        self.last_sequence_number += 1;
        self.last_updated_ms = now_ms;
        let snapshot = Snapshot {
            snapshot_id,
            parent_snapshot_id: self.current_snapshot_id,
            sequence_number: self.last_sequence_number,
            timestamp_ms: now_ms,
            operation,
            summary,
            data_files,
        };
        self.current_snapshot_id = Some(snapshot_id);
        self.snapshots.push(snapshot);
        &self.snapshots[self.snapshots.len() - 1]
    }
}

/// Table schema with stable field ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableSchema {
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

impl TableSchema {
    /// Convert an Arrow schema, numbering fields from 1
    pub fn from_arrow(schema: &Schema) -> Result<Self> {
        let fields = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| {
                Ok(SchemaField {
                    id: i as i32 + 1,
                    name: f.name().clone(),
                    field_type: type_name(f.data_type())?.to_string(),
                    required: !f.is_nullable(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn to_arrow(&self) -> Result<SchemaRef> {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                Ok(Field::new(
                    f.name.clone(),
                    parse_data_type(&f.field_type)?,
                    !f.required,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Arc::new(Schema::new(fields)))
    }

    /// Same column names and types in the same order; ids and
    /// nullability are not compared
    pub fn is_compatible(&self, other: &TableSchema) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name == b.name && a.field_type == b.field_type)
    }
}

/// Arrow type to table type name
fn type_name(data_type: &DataType) -> Result<&'static str> {
    match data_type {
        DataType::Boolean => Ok("boolean"),
        DataType::Int32 => Ok("int"),
        DataType::Int64 => Ok("long"),
        DataType::Float32 => Ok("float"),
        DataType::Float64 => Ok("double"),
        DataType::Utf8 => Ok("string"),
        DataType::Date32 => Ok("date"),
        DataType::Timestamp(TimeUnit::Microsecond, None) => Ok("timestamp"),
        other => Err(LakebenchError::SchemaMismatch(format!(
            "unsupported column type {}",
            other
        ))),
    }
}

/// Table type name to Arrow type
fn parse_data_type(data_type: &str) -> Result<DataType> {
    match data_type.to_lowercase().as_str() {
        "boolean" | "bool" => Ok(DataType::Boolean),
        "int" | "integer" => Ok(DataType::Int32),
        "long" | "bigint" => Ok(DataType::Int64),
        "float" => Ok(DataType::Float32),
        "double" => Ok(DataType::Float64),
        "string" => Ok(DataType::Utf8),
        "date" => Ok(DataType::Date32),
        "timestamp" => Ok(DataType::Timestamp(TimeUnit::Microsecond, None)),
        other => Err(LakebenchError::Catalog(format!(
            "unknown column type in metadata: {}",
            other
        ))),
    }
}

/// Snapshot operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Append,
    Overwrite,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// A committed table state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Snapshot {
    pub snapshot_id: i64,
    pub parent_snapshot_id: Option<i64>,
    pub sequence_number: i64,
    pub timestamp_ms: i64,
    pub operation: Operation,
    pub summary: BTreeMap<String, String>,
    pub data_files: Vec<DataFile>,
}

impl Snapshot {
    /// Total rows as recorded in the summary
    pub fn total_records(&self) -> Option<i64> {
        self.summary.get(TOTAL_RECORDS)?.parse().ok()
    }
}

/// A Parquet data file of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataFile {
    /// Path relative to the table location
    pub file_path: String,
    pub file_format: String,
    pub record_count: i64,
    pub file_size_in_bytes: i64,
}
