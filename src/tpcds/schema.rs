//! TPC-DS table schemas
//!
//! Only the columns the micro-benchmark queries read are modelled.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// Get schema for CUSTOMER table
pub fn customer_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("c_customer_sk", DataType::Int64, false),
        Field::new("c_current_hdemo_sk", DataType::Int64, true),
        Field::new("c_salutation", DataType::Utf8, true),
        Field::new("c_first_name", DataType::Utf8, true),
        Field::new("c_last_name", DataType::Utf8, true),
        Field::new("c_preferred_cust_flag", DataType::Utf8, true),
        Field::new("c_birth_month", DataType::Int32, true),
        Field::new("c_birth_year", DataType::Int32, true),
        Field::new("c_birth_country", DataType::Utf8, true),
        Field::new("c_login", DataType::Utf8, true),
        Field::new("c_email_address", DataType::Utf8, true),
    ]))
}

/// Get schema for ITEM table
pub fn item_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("i_item_sk", DataType::Int64, false),
        Field::new("i_brand_id", DataType::Int32, true),
        Field::new("i_class_id", DataType::Int32, true),
        Field::new("i_category_id", DataType::Int32, true),
    ]))
}

/// Get schema for DATE_DIM table
pub fn date_dim_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("d_date_sk", DataType::Int64, false),
        Field::new("d_date", DataType::Date32, true),
        Field::new("d_year", DataType::Int32, true),
        Field::new("d_moy", DataType::Int32, true),
    ]))
}

/// Get schema for STORE_SALES table
pub fn store_sales_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("ss_sold_date_sk", DataType::Int64, true),
        Field::new("ss_item_sk", DataType::Int64, false),
        Field::new("ss_customer_sk", DataType::Int64, true),
        Field::new("ss_sales_price", DataType::Float64, true),
    ]))
}

/// Get schema for CATALOG_SALES table
pub fn catalog_sales_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("cs_sold_date_sk", DataType::Int64, true),
        Field::new("cs_item_sk", DataType::Int64, false),
        Field::new("cs_sales_price", DataType::Float64, true),
    ]))
}

/// Get schema for WEB_SALES table
pub fn web_sales_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("ws_sold_date_sk", DataType::Int64, true),
        Field::new("ws_item_sk", DataType::Int64, false),
        Field::new("ws_sales_price", DataType::Float64, true),
    ]))
}

/// Largest scale factor the generator accepts; everything is built in memory
pub const MAX_SCALE_FACTOR: f64 = 1_000.0;

/// Row counts for the generated tables at a given scale factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TpcdsRowCounts {
    pub customer: usize,
    pub item: usize,
    pub store_sales: usize,
    pub catalog_sales: usize,
    pub web_sales: usize,
}

impl TpcdsRowCounts {
    pub fn for_scale_factor(sf: f64) -> Self {
        let sf = if sf.is_finite() {
            sf.clamp(0.0, MAX_SCALE_FACTOR)
        } else {
            0.0
        };
        let scaled = |base: f64| ((base * sf) as usize).max(1);
        Self {
            customer: scaled(1_000.0),
            item: scaled(200.0),
            store_sales: scaled(20_000.0),
            catalog_sales: scaled(10_000.0),
            web_sales: scaled(10_000.0),
        }
    }
}
