//! TPC-DS subset data generator
//!
//! Produces small, deterministic versions of the six tables the
//! micro-benchmarks read, laid out as `<tpcds_dir>/<table>/part-0.parquet`.

use crate::error::{LakebenchError, Result};
use crate::tpcds::schema::*;
use arrow::array::{Date32Array, Float64Array, Int32Array, Int64Array, StringBuilder};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rand::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Surrogate key of 1998-01-01 in TPC-DS `date_dim`
const FIRST_DATE_SK: i64 = 2_450_815;

const SALUTATIONS: [&str; 6] = ["Mr.", "Mrs.", "Ms.", "Dr.", "Miss.", "Sir."];
const FIRST_NAMES: [&str; 8] = [
    "James", "Mary", "Robert", "Linda", "David", "Susan", "Carlos", "Yuki",
];
const LAST_NAMES: [&str; 8] = [
    "Smith", "Garcia", "Chen", "Miller", "Okafor", "Novak", "Silva", "Brown",
];
const COUNTRIES: [&str; 6] = ["CANADA", "CHILE", "FRANCE", "JAPAN", "KENYA", "NORWAY"];

/// A table written by the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTable {
    pub name: &'static str,
    pub rows: usize,
    pub path: PathBuf,
}

/// TPC-DS subset generator
pub struct TpcdsGenerator {
    scale_factor: f64,
    rng: StdRng,
}

impl TpcdsGenerator {
    pub fn new(scale_factor: f64) -> Self {
        Self::with_seed(scale_factor, 42)
    }

    pub fn with_seed(scale_factor: f64, seed: u64) -> Self {
        Self {
            scale_factor,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate every table and write it under `tpcds_dir`
    pub fn generate_to_parquet(&mut self, tpcds_dir: &Path) -> Result<Vec<GeneratedTable>> {
        if !self.scale_factor.is_finite()
            || self.scale_factor <= 0.0
            || self.scale_factor > MAX_SCALE_FACTOR
        {
            return Err(LakebenchError::InvalidArgument(format!(
                "scale factor must be in (0, {}], got {}",
                MAX_SCALE_FACTOR, self.scale_factor
            )));
        }
        let counts = TpcdsRowCounts::for_scale_factor(self.scale_factor);
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let date_dim = self.generate_date_dim()?;
        let date_count = date_dim.num_rows();
        let customer = self.generate_customer(counts.customer)?;
        let item = self.generate_item(counts.item)?;
        let store_sales =
            self.generate_store_sales(counts.store_sales, counts.customer, counts.item, date_count)?;
        let catalog_sales = self.generate_channel_sales(
            catalog_sales_schema(),
            counts.catalog_sales,
            counts.item,
            date_count,
        )?;
        let web_sales = self.generate_channel_sales(
            web_sales_schema(),
            counts.web_sales,
            counts.item,
            date_count,
        )?;

        let tables = [
            ("customer", customer),
            ("item", item),
            ("date_dim", date_dim),
            ("store_sales", store_sales),
            ("catalog_sales", catalog_sales),
            ("web_sales", web_sales),
        ];

        let mut written = Vec::with_capacity(tables.len());
        for (name, batch) in tables {
            let path = Self::write_table(tpcds_dir, name, &batch, &props)?;
            info!(table = name, rows = batch.num_rows(), path = %path.display(), "generated table");
            written.push(GeneratedTable {
                name,
                rows: batch.num_rows(),
                path,
            });
        }
        Ok(written)
    }

    fn write_table(
        tpcds_dir: &Path,
        name: &str,
        batch: &RecordBatch,
        props: &WriterProperties,
    ) -> Result<PathBuf> {
        let table_dir = tpcds_dir.join(name);
        if table_dir.exists() {
            fs::remove_dir_all(&table_dir)?;
        }
        fs::create_dir_all(&table_dir)?;

        let path = table_dir.join("part-0.parquet");
        let file = File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props.clone()))?;
        writer.write(batch)?;
        writer.close()?;
        Ok(path)
    }

    fn generate_customer(&mut self, count: usize) -> Result<RecordBatch> {
        let mut c_customer_sk = Vec::with_capacity(count);
        let mut c_current_hdemo_sk = Vec::with_capacity(count);
        let mut c_salutation = StringBuilder::new();
        let mut c_first_name = StringBuilder::new();
        let mut c_last_name = StringBuilder::new();
        let mut c_preferred_cust_flag = StringBuilder::new();
        let mut c_birth_month = Vec::with_capacity(count);
        let mut c_birth_year = Vec::with_capacity(count);
        let mut c_birth_country = StringBuilder::new();
        let mut c_login = StringBuilder::new();
        let mut c_email_address = StringBuilder::new();

        for i in 0..count {
            let first = FIRST_NAMES[self.rng.gen_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[self.rng.gen_range(0..LAST_NAMES.len())];

            c_customer_sk.push((i + 1) as i64);
            c_current_hdemo_sk.push(if self.rng.gen_bool(0.05) {
                None
            } else {
                Some(self.rng.gen_range(1..=72) as i64)
            });
            c_salutation.append_value(SALUTATIONS[self.rng.gen_range(0..SALUTATIONS.len())]);
            c_first_name.append_value(first);
            c_last_name.append_value(last);
            c_preferred_cust_flag.append_value(if self.rng.gen_bool(0.5) { "Y" } else { "N" });
            c_birth_month.push(Some(self.rng.gen_range(1..=12i32)));
            c_birth_year.push(Some(self.rng.gen_range(1924..=1992i32)));
            c_birth_country.append_value(COUNTRIES[self.rng.gen_range(0..COUNTRIES.len())]);
            c_login.append_value(format!("login{}", i + 1));
            c_email_address.append_value(format!("{}.{}{}@example.com", first, last, i + 1));
        }

        Ok(RecordBatch::try_new(
            customer_schema(),
            vec![
                Arc::new(Int64Array::from(c_customer_sk)),
                Arc::new(Int64Array::from(c_current_hdemo_sk)),
                Arc::new(c_salutation.finish()),
                Arc::new(c_first_name.finish()),
                Arc::new(c_last_name.finish()),
                Arc::new(c_preferred_cust_flag.finish()),
                Arc::new(Int32Array::from(c_birth_month)),
                Arc::new(Int32Array::from(c_birth_year)),
                Arc::new(c_birth_country.finish()),
                Arc::new(c_login.finish()),
                Arc::new(c_email_address.finish()),
            ],
        )?)
    }

    fn generate_item(&mut self, count: usize) -> Result<RecordBatch> {
        let mut i_item_sk = Vec::with_capacity(count);
        let mut i_brand_id = Vec::with_capacity(count);
        let mut i_class_id = Vec::with_capacity(count);
        let mut i_category_id = Vec::with_capacity(count);

        for i in 0..count {
            i_item_sk.push((i + 1) as i64);
            i_brand_id.push(Some(self.rng.gen_range(1..=5i32)));
            i_class_id.push(Some(self.rng.gen_range(1..=4i32)));
            i_category_id.push(Some(self.rng.gen_range(1..=3i32)));
        }

        Ok(RecordBatch::try_new(
            item_schema(),
            vec![
                Arc::new(Int64Array::from(i_item_sk)),
                Arc::new(Int32Array::from(i_brand_id)),
                Arc::new(Int32Array::from(i_class_id)),
                Arc::new(Int32Array::from(i_category_id)),
            ],
        )?)
    }

    /// Calendar days from 1998-01-01 through 2002-12-31
    fn generate_date_dim(&mut self) -> Result<RecordBatch> {
        let invalid = || LakebenchError::InvalidArgument("invalid calendar date".to_string());
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(invalid)?;
        let first = NaiveDate::from_ymd_opt(1998, 1, 1).ok_or_else(invalid)?;
        let last = NaiveDate::from_ymd_opt(2002, 12, 31).ok_or_else(invalid)?;

        let mut d_date_sk = Vec::new();
        let mut d_date = Vec::new();
        let mut d_year = Vec::new();
        let mut d_moy = Vec::new();

        for (offset, date) in first.iter_days().take_while(|d| *d <= last).enumerate() {
            d_date_sk.push(FIRST_DATE_SK + offset as i64);
            d_date.push(Some((date - epoch).num_days() as i32));
            d_year.push(Some(date.year()));
            d_moy.push(Some(date.month() as i32));
        }

        Ok(RecordBatch::try_new(
            date_dim_schema(),
            vec![
                Arc::new(Int64Array::from(d_date_sk)),
                Arc::new(Date32Array::from(d_date)),
                Arc::new(Int32Array::from(d_year)),
                Arc::new(Int32Array::from(d_moy)),
            ],
        )?)
    }

    fn generate_store_sales(
        &mut self,
        count: usize,
        customers: usize,
        items: usize,
        dates: usize,
    ) -> Result<RecordBatch> {
        let mut ss_sold_date_sk = Vec::with_capacity(count);
        let mut ss_item_sk = Vec::with_capacity(count);
        let mut ss_customer_sk = Vec::with_capacity(count);
        let mut ss_sales_price = Vec::with_capacity(count);

        for _ in 0..count {
            ss_sold_date_sk.push(self.sold_date_sk(dates));
            ss_item_sk.push(self.rng.gen_range(1..=items) as i64);
            // Null customers all share one window partition (the skew).
            ss_customer_sk.push(if self.rng.gen_bool(0.1) {
                None
            } else {
                Some(self.rng.gen_range(1..=customers) as i64)
            });
            ss_sales_price.push(Some(self.sales_price()));
        }

        Ok(RecordBatch::try_new(
            store_sales_schema(),
            vec![
                Arc::new(Int64Array::from(ss_sold_date_sk)),
                Arc::new(Int64Array::from(ss_item_sk)),
                Arc::new(Int64Array::from(ss_customer_sk)),
                Arc::new(Float64Array::from(ss_sales_price)),
            ],
        )?)
    }

    /// Catalog and web sales share a layout: sold date, item, price
    fn generate_channel_sales(
        &mut self,
        schema: arrow::datatypes::SchemaRef,
        count: usize,
        items: usize,
        dates: usize,
    ) -> Result<RecordBatch> {
        let mut sold_date_sk = Vec::with_capacity(count);
        let mut item_sk = Vec::with_capacity(count);
        let mut sales_price = Vec::with_capacity(count);

        for _ in 0..count {
            sold_date_sk.push(self.sold_date_sk(dates));
            item_sk.push(self.rng.gen_range(1..=items) as i64);
            sales_price.push(Some(self.sales_price()));
        }

        Ok(RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(sold_date_sk)),
                Arc::new(Int64Array::from(item_sk)),
                Arc::new(Float64Array::from(sales_price)),
            ],
        )?)
    }

    fn sold_date_sk(&mut self, dates: usize) -> Option<i64> {
        if self.rng.gen_bool(0.02) {
            None
        } else {
            Some(FIRST_DATE_SK + self.rng.gen_range(0..dates) as i64)
        }
    }

    fn sales_price(&mut self) -> f64 {
        (self.rng.gen_range(1.0..200.0_f64) * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    #[test]
    fn test_generate_small() {
        let dir = tempfile::tempdir().unwrap();
        let tables = TpcdsGenerator::new(0.05)
            .generate_to_parquet(dir.path())
            .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["customer", "item", "date_dim", "store_sales", "catalog_sales", "web_sales"]
        );
        for table in &tables {
            assert_eq!(table.path, dir.path().join(table.name).join("part-0.parquet"));
            let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&table.path).unwrap())
                .unwrap()
                .build()
                .unwrap();
            let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
            assert_eq!(rows, table.rows);
        }
        assert_eq!(tables[0].rows, 50);
    }

    #[test]
    fn test_date_dim_spans_five_years() {
        let batch = TpcdsGenerator::new(1.0).generate_date_dim().unwrap();
        assert_eq!(batch.num_rows(), 1826);
        let years = batch
            .column(2)
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap();
        assert_eq!(years.value(0), 1998);
        assert_eq!(years.value(batch.num_rows() - 1), 2002);
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = TpcdsGenerator::with_seed(0.01, 7).generate_item(20).unwrap();
        let b = TpcdsGenerator::with_seed(0.01, 7).generate_item(20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let dir = tempfile::tempdir().unwrap();
        for sf in [0.0, -1.0, f64::NAN, f64::INFINITY, MAX_SCALE_FACTOR * 2.0] {
            assert!(
                matches!(
                    TpcdsGenerator::new(sf).generate_to_parquet(dir.path()),
                    Err(LakebenchError::InvalidArgument(_))
                ),
                "scale {} should be rejected",
                sf
            );
        }
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
