use std::fs;

use etl_ingest::{InputFormat, load_table};
use etl_model::Value;

#[test]
fn csv_load_infers_types_and_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.csv");
    fs::write(&path, "name,age,score\nAnn,34,1.5\nBob,,2.0\n").unwrap();

    let table = load_table(&path).unwrap();
    assert_eq!(table.height(), 2);
    assert_eq!(table.value("name", 0), Some(&Value::Str("Ann".into())));
    assert_eq!(table.value("age", 0), Some(&Value::Int(34)));
    assert_eq!(table.value("age", 1), Some(&Value::Null));
    assert_eq!(table.value("score", 1), Some(&Value::Float(2.0)));
}

#[test]
fn format_detection_by_extension() {
    use std::path::Path;
    assert_eq!(
        InputFormat::from_path(Path::new("data/in.CSV")),
        Some(InputFormat::Csv)
    );
    assert_eq!(
        InputFormat::from_path(Path::new("in.parquet")),
        Some(InputFormat::Parquet)
    );
    assert_eq!(InputFormat::from_path(Path::new("in.xlsx")), None);
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.tsv");
    fs::write(&path, "a\tb\n").unwrap();

    let err = load_table(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported input format"));
}
