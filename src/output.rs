//! Rendering of query result previews
//!
//! Supports the formats the benchmark driver can print per execution:
//! - Table: Pretty-printed ASCII table (default)
//! - CSV: Comma-separated values with a header line
//! - JSON: One JSON object per line
//! - Vertical: One column per line (useful for the wide aggregate queries)

use crate::error::Result;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::io::Write;

/// Output format for result previews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Vertical,
}

impl OutputFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" | "t" => Some(Self::Table),
            "csv" | "c" => Some(Self::Csv),
            "json" | "j" => Some(Self::Json),
            "vertical" | "v" => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Vertical => "vertical",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "unknown output format {:?}, expected table, csv, json or vertical",
                s
            )
        })
    }
}

/// Writes at most `max_rows` rows of a result, noting when rows were cut
#[derive(Debug, Clone)]
pub struct PreviewFormatter {
    format: OutputFormat,
    max_rows: usize,
}

impl PreviewFormatter {
    pub fn new(format: OutputFormat, max_rows: usize) -> Self {
        Self { format, max_rows }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Write the preview of `batches` to `writer`
    ///
    /// `batches` may hold more rows than the preview shows; the surplus only
    /// triggers the "only showing" footer.
    pub fn write<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> Result<()> {
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        let shown = truncate(batches, self.max_rows);

        match self.format {
            OutputFormat::Table => write_table(writer, &shown)?,
            OutputFormat::Csv => write_csv(writer, &shown)?,
            OutputFormat::Json => write_json(writer, &shown)?,
            OutputFormat::Vertical => write_vertical(writer, &shown)?,
        }

        if total > self.max_rows {
            let noun = if self.max_rows == 1 { "row" } else { "rows" };
            writeln!(writer, "only showing top {} {}", self.max_rows, noun)?;
        }
        Ok(())
    }

    pub fn format_to_string(&self, batches: &[RecordBatch]) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(&mut buffer, batches)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Keep the first `max_rows` rows across batches
fn truncate(batches: &[RecordBatch], max_rows: usize) -> Vec<RecordBatch> {
    let mut remaining = max_rows;
    let mut out = Vec::new();
    for batch in batches {
        if remaining == 0 {
            break;
        }
        let take = batch.num_rows().min(remaining);
        out.push(batch.slice(0, take));
        remaining -= take;
    }
    out
}

fn write_table<W: Write>(writer: &mut W, batches: &[RecordBatch]) -> Result<()> {
    if batches.is_empty() {
        writeln!(writer, "(no rows)")?;
        return Ok(());
    }
    let display = arrow::util::pretty::pretty_format_batches(batches)?;
    writeln!(writer, "{}", display)?;
    Ok(())
}

fn write_csv<W: Write>(writer: &mut W, batches: &[RecordBatch]) -> Result<()> {
    let mut csv = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(writer);
    for batch in batches {
        csv.write(batch)?;
    }
    Ok(())
}

fn write_json<W: Write>(writer: &mut W, batches: &[RecordBatch]) -> Result<()> {
    let mut json = arrow::json::LineDelimitedWriter::new(writer);
    let refs: Vec<&RecordBatch> = batches.iter().collect();
    json.write_batches(&refs)?;
    json.finish()?;
    Ok(())
}

fn write_vertical<W: Write>(writer: &mut W, batches: &[RecordBatch]) -> Result<()> {
    let options = FormatOptions::default().with_null("NULL");
    let mut row_number = 0;

    for batch in batches {
        let schema = batch.schema();
        let width = schema
            .fields()
            .iter()
            .map(|f| f.name().len())
            .max()
            .unwrap_or(0);
        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            row_number += 1;
            writeln!(writer, "-RECORD {}-", row_number)?;
            for (field, formatter) in schema.fields().iter().zip(&formatters) {
                writeln!(
                    writer,
                    "{:>width$} | {}",
                    field.name(),
                    formatter.value(row),
                    width = width
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn sample_batch(rows: i64) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        let ids: Vec<i64> = (1..=rows).collect();
        let names: Vec<Option<String>> = (1..=rows)
            .map(|i| if i % 2 == 0 { None } else { Some(format!("n{}", i)) })
            .collect();
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::parse("c"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("v"), Some(OutputFormat::Vertical));
        assert_eq!(OutputFormat::parse("xml"), None);
        assert_eq!(OutputFormat::Vertical.name(), "vertical");
    }

    #[test]
    fn test_table_preview_truncates_with_footer() {
        let formatter = PreviewFormatter::new(OutputFormat::Table, 5);
        let out = formatter.format_to_string(&[sample_batch(6)]).unwrap();
        assert!(out.contains("| 5  |"));
        assert!(!out.contains("| 6  |"));
        assert!(out.ends_with("only showing top 5 rows\n"));
    }

    #[test]
    fn test_no_footer_when_everything_fits() {
        let formatter = PreviewFormatter::new(OutputFormat::Table, 5);
        let out = formatter.format_to_string(&[sample_batch(3)]).unwrap();
        assert!(!out.contains("only showing"));
    }

    #[test]
    fn test_truncate_spans_batches() {
        let shown = truncate(&[sample_batch(2), sample_batch(2), sample_batch(2)], 3);
        assert_eq!(shown.len(), 2);
        assert_eq!(shown.iter().map(|b| b.num_rows()).sum::<usize>(), 3);
    }

    #[test]
    fn test_csv_preview() {
        let formatter = PreviewFormatter::new(OutputFormat::Csv, 2);
        let out = formatter.format_to_string(&[sample_batch(2)]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["id,name", "1,n1", "2,"]);
    }

    #[test]
    fn test_json_preview() {
        let formatter = PreviewFormatter::new(OutputFormat::Json, 1);
        let out = formatter.format_to_string(&[sample_batch(2)]).unwrap();
        assert!(out.starts_with("{\"id\":1,\"name\":\"n1\"}"));
        assert!(out.ends_with("only showing top 1 row\n"));
    }

    #[test]
    fn test_vertical_preview() {
        let formatter = PreviewFormatter::new(OutputFormat::Vertical, 5);
        let out = formatter.format_to_string(&[sample_batch(2)]).unwrap();
        assert!(out.contains("-RECORD 1-"));
        assert!(out.contains("  id | 2"));
        assert!(out.contains("name | NULL"));
    }

    #[test]
    fn test_empty_table_preview() {
        let formatter = PreviewFormatter::new(OutputFormat::Table, 5);
        assert_eq!(formatter.format_to_string(&[]).unwrap(), "(no rows)\n");
    }
}
