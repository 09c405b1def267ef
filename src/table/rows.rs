//! Synthetic rows for the table smoke test

use crate::error::Result;
use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use rand::Rng;
use std::sync::Arc;

/// `row_id` and `row_val`, both nullable 64-bit integers
pub fn synthetic_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("row_id", DataType::Int64, true),
        Field::new("row_val", DataType::Int64, true),
    ]))
}

/// Generate `num_rows` rows in batches of at most `batch_size`
///
/// `row_id` runs from 1 to `num_rows`; `row_val` is uniform in 1..=100.
pub fn generate_rows<R: Rng>(
    num_rows: usize,
    batch_size: usize,
    rng: &mut R,
) -> Result<Vec<RecordBatch>> {
    let schema = synthetic_schema();
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(num_rows.div_ceil(batch_size));

    let mut start = 0;
    while start < num_rows {
        let end = (start + batch_size).min(num_rows);
        let ids: Vec<i64> = (start as i64 + 1..=end as i64).collect();
        let vals: Vec<i64> = (start..end).map(|_| rng.gen_range(1..=100i64)).collect();
        batches.push(RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(Int64Array::from(vals)),
            ],
        )?);
        start = end;
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn column(batch: &RecordBatch, i: usize) -> &Int64Array {
        batch.column(i).as_any().downcast_ref::<Int64Array>().unwrap()
    }

    #[test]
    fn test_row_ids_are_sequential_across_batches() {
        let mut rng = StdRng::seed_from_u64(1);
        let batches = generate_rows(25, 10, &mut rng).unwrap();
        assert_eq!(
            batches.iter().map(|b| b.num_rows()).collect::<Vec<_>>(),
            vec![10, 10, 5]
        );
        let ids: Vec<i64> = batches
            .iter()
            .flat_map(|b| column(b, 0).values().to_vec())
            .collect();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_values_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        for batch in generate_rows(5000, 1024, &mut rng).unwrap() {
            assert!(column(&batch, 1).values().iter().all(|v| (1..=100).contains(v)));
        }
    }

    #[test]
    fn test_zero_rows() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(generate_rows(0, 10, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_seed_is_deterministic() {
        let a = generate_rows(100, 64, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = generate_rows(100, 64, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
