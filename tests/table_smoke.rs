//! Table-format catalog and smoke test end to end

use lakebench::table::{generate_rows, synthetic_schema, Operation};
use lakebench::{
    run_table_smoke, ComputeSession, LakebenchError, TableIdent, TableSmokeConfig,
    WarehouseCatalog, WriteMode,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn smoke_config(warehouse: &std::path::Path, rows: usize) -> TableSmokeConfig {
    TableSmokeConfig::new(rows)
        .with_warehouse(warehouse)
        .with_batch_size(512)
        .with_seed(42)
}

async fn count_via_sql(session: &ComputeSession, catalog: &WarehouseCatalog, table: &str) -> i64 {
    let table = catalog.load_table(&TableIdent::parse(table).unwrap()).unwrap();
    let df = session
        .context()
        .read_batches(table.scan().unwrap())
        .unwrap();
    session.register_dataframe_view("t", df).unwrap();
    let batches = session
        .collect("SELECT COUNT(*) FROM t WHERE row_val BETWEEN 1 AND 100")
        .await
        .unwrap();
    batches[0]
        .column(0)
        .as_any()
        .downcast_ref::<arrow::array::Int64Array>()
        .unwrap()
        .value(0)
}

#[tokio::test]
async fn write_then_read_reports_row_count() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = WarehouseCatalog::new(dir.path());
    let session = ComputeSession::new();
    let config = smoke_config(dir.path(), 2500);

    let mut out = Vec::new();
    let report = run_table_smoke(&session, &catalog, &config, &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Number of rows inserted: 2500\n");
    assert_eq!(report.rows_read, 2500);
    assert_eq!(report.table.to_string(), "demo.foo.bar");

    // every generated value is in range and every id is present
    assert_eq!(count_via_sql(&session, &catalog, "demo.foo.bar").await, 2500);
    let ids = session
        .collect("SELECT MIN(row_id), MAX(row_id), COUNT(DISTINCT row_id) FROM t")
        .await
        .unwrap();
    let col = |i: usize| {
        ids[0]
            .column(i)
            .as_any()
            .downcast_ref::<arrow::array::Int64Array>()
            .unwrap()
            .value(0)
    };
    assert_eq!((col(0), col(1), col(2)), (1, 2500, 2500));

    let files = std::fs::read_dir(dir.path().join("demo/foo/bar/metadata"))
        .unwrap()
        .count();
    assert_eq!(files, 2, "v1.metadata.json and version-hint.text");
}

#[tokio::test]
async fn modes_create_append_replace() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = WarehouseCatalog::new(dir.path());
    let session = ComputeSession::new();
    let mut out = Vec::new();

    run_table_smoke(&session, &catalog, &smoke_config(dir.path(), 100), &mut out)
        .await
        .unwrap();
    let err = run_table_smoke(&session, &catalog, &smoke_config(dir.path(), 100), &mut out)
        .await
        .unwrap_err();
    assert!(matches!(err, LakebenchError::TableAlreadyExists(_)));
    assert_eq!(err.to_string(), "Table already exists: demo.foo.bar");

    let append = smoke_config(dir.path(), 40).with_mode(WriteMode::Append);
    let report = run_table_smoke(&session, &catalog, &append, &mut out)
        .await
        .unwrap();
    assert_eq!(report.rows_read, 140);
    assert_eq!(report.recorded_rows, 140);

    let replace = smoke_config(dir.path(), 7).with_mode(WriteMode::CreateOrReplace);
    let report = run_table_smoke(&session, &catalog, &replace, &mut out)
        .await
        .unwrap();
    assert_eq!(report.rows_read, 7);

    let table = catalog.load_table(&report.table).unwrap();
    assert_eq!(table.version(), 3);
    let ops: Vec<Operation> = table
        .metadata()
        .snapshots
        .iter()
        .map(|s| s.operation)
        .collect();
    assert_eq!(
        ops,
        vec![Operation::Append, Operation::Append, Operation::Overwrite]
    );
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Number of rows inserted: 100\nNumber of rows inserted: 140\nNumber of rows inserted: 7\n"
    );
}

#[tokio::test]
async fn append_to_missing_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = WarehouseCatalog::new(dir.path());
    let config = smoke_config(dir.path(), 5)
        .with_table("demo.missing")
        .with_mode(WriteMode::Append);
    let mut out = Vec::new();
    let err = run_table_smoke(&ComputeSession::new(), &catalog, &config, &mut out)
        .await
        .unwrap_err();
    assert!(matches!(err, LakebenchError::TableNotFound(_)));
    assert!(out.is_empty());
}

#[test]
fn append_with_other_schema_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = WarehouseCatalog::new(dir.path());
    let ident = TableIdent::parse("demo.foo.bar").unwrap();
    let rows = generate_rows(10, 10, &mut StdRng::seed_from_u64(1)).unwrap();
    catalog
        .create_table(&ident, synthetic_schema(), &rows)
        .unwrap();

    let narrow = std::sync::Arc::new(synthetic_schema().project(&[0]).unwrap());
    let projected: Vec<_> = rows.iter().map(|b| b.project(&[0]).unwrap()).collect();
    let err = catalog.append(&ident, narrow, &projected).unwrap_err();
    assert!(matches!(err, LakebenchError::SchemaMismatch(_)));
    assert_eq!(catalog.load_table(&ident).unwrap().record_count(), 10);
}

#[test]
fn list_inspect_and_drop() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = WarehouseCatalog::new(dir.path());
    let rows = generate_rows(3, 10, &mut StdRng::seed_from_u64(1)).unwrap();
    for name in ["demo.foo.bar", "demo.foo.baz", "demo.other"] {
        let ident = TableIdent::parse(name).unwrap();
        catalog.create_table(&ident, synthetic_schema(), &rows).unwrap();
    }

    let ns = vec!["demo".to_string(), "foo".to_string()];
    let listed: Vec<String> = catalog
        .list_tables(&ns)
        .unwrap()
        .iter()
        .map(|t| t.to_string())
        .collect();
    assert_eq!(listed, vec!["demo.foo.bar", "demo.foo.baz"]);

    let bar = TableIdent::parse("demo.foo.bar").unwrap();
    let mut out = Vec::new();
    catalog
        .load_table(&bar)
        .unwrap()
        .write_description(&mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("2: row_val long (optional)"));

    catalog.drop_table(&bar).unwrap();
    assert_eq!(catalog.list_tables(&ns).unwrap().len(), 1);
    assert!(matches!(
        catalog.load_table(&bar),
        Err(LakebenchError::TableNotFound(_))
    ));
}

#[test]
fn invalid_identifiers_rejected() {
    for bad in ["", "demo..bar", "demo.", ".bar", "a/b.c", "demo. bar"] {
        assert!(
            matches!(TableIdent::parse(bad), Err(LakebenchError::InvalidIdentifier(_))),
            "{:?} should be rejected",
            bad
        );
    }
}
