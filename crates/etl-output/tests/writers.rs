use std::fs;

use chrono::NaiveDate;
use etl_model::{Column, MappingDocument, Table, Value};
use etl_output::{WriterOptions, write_table};

fn doc(json: &str) -> MappingDocument {
    MappingDocument::parse(json).unwrap()
}

fn sample_table() -> Table {
    Table::from_columns(vec![
        Column::new(
            "name",
            vec![
                Value::Str("Ann".into()),
                Value::Str("Bob".into()),
                Value::Null,
            ],
        ),
        Column::new(
            "age",
            vec![Value::Int(34), Value::Null, Value::Int(61)],
        ),
    ])
}

#[test]
fn csv_has_header_and_empty_null_fields() {
    let dir = tempfile::tempdir().unwrap();
    let document = doc(r#"{
        "output_path": "people",
        "output_format": "csv",
        "mappings": [
            {"source": "name", "target": "name"},
            {"source": "age", "target": "age"}
        ]
    }"#);

    let result = write_table(&sample_table(), &document, dir.path(), &WriterOptions::default())
        .unwrap();
    assert!(result.path.ends_with("people.csv"));

    let text = fs::read_to_string(&result.path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "name,age");
    assert_eq!(lines[1], "Ann,34");
    assert_eq!(lines[2], "Bob,");
    assert_eq!(lines[3], ",61");
}

#[test]
fn jsonl_round_trips_all_value_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::from_columns(vec![
        Column::new("s", vec![Value::Str("x".into())]),
        Column::new("i", vec![Value::Int(-7)]),
        Column::new("f", vec![Value::Float(1.5)]),
        Column::new("b", vec![Value::Bool(true)]),
        Column::new(
            "d",
            vec![Value::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())],
        ),
        Column::new(
            "a",
            vec![Value::Array(vec![Value::Int(1), Value::Int(2)])],
        ),
        Column::new("n", vec![Value::Null]),
    ]);
    let document = doc(r#"{
        "output_path": "kinds",
        "output_format": "json",
        "mappings": [{"source": "s", "target": "s"}]
    }"#);

    let result = write_table(&table, &document, dir.path(), &WriterOptions::default()).unwrap();
    let text = fs::read_to_string(&result.path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);

    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(Value::from_json(&parsed["s"]), Value::Str("x".into()));
    assert_eq!(Value::from_json(&parsed["i"]), Value::Int(-7));
    assert_eq!(Value::from_json(&parsed["f"]), Value::Float(1.5));
    assert_eq!(Value::from_json(&parsed["b"]), Value::Bool(true));
    // Dates come back as their rendered string; JSON has no date type.
    assert_eq!(Value::from_json(&parsed["d"]), Value::Str("2024-03-09".into()));
    assert_eq!(
        Value::from_json(&parsed["a"]),
        Value::Array(vec![Value::Int(1), Value::Int(2)])
    );
    assert_eq!(Value::from_json(&parsed["n"]), Value::Null);
}

#[test]
fn jsonl_preserves_column_order() {
    let dir = tempfile::tempdir().unwrap();
    let document = doc(r#"{
        "output_path": "ordered",
        "output_format": "json",
        "mappings": [{"source": "name", "target": "name"}]
    }"#);

    let result = write_table(&sample_table(), &document, dir.path(), &WriterOptions::default())
        .unwrap();
    let text = fs::read_to_string(&result.path).unwrap();
    for line in text.lines() {
        assert!(line.starts_with("{\"name\":"), "{line}");
    }
}

#[test]
fn xml_wraps_rows_and_escapes_text() {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::from_columns(vec![Column::new(
        "note",
        vec![Value::Str("a < b & c".into())],
    )]);
    let document = doc(r#"{
        "output_path": "notes",
        "output_format": "xml",
        "xml_config": {"root_tag": "records", "row_tag": "record"},
        "mappings": [{"source": "note", "target": "note"}]
    }"#);

    let result = write_table(&table, &document, dir.path(), &WriterOptions::default()).unwrap();
    let text = fs::read_to_string(&result.path).unwrap();
    assert!(text.contains("<records>"));
    assert!(text.contains("</records>"));
    assert!(text.contains("<record>"));
    assert!(text.contains("a &lt; b &amp; c"));
}

#[test]
fn positional_uses_declared_widths_and_alignment() {
    let dir = tempfile::tempdir().unwrap();
    let document = doc(r#"{
        "output_path": "fixed",
        "output_format": "positional",
        "mappings": [
            {"source": "name", "target": "name", "length": 6},
            {"source": "age", "target": "age", "length": 4}
        ]
    }"#);

    let result = write_table(&sample_table(), &document, dir.path(), &WriterOptions::default())
        .unwrap();
    let text = fs::read_to_string(&result.path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Ann     34");
    assert_eq!(lines[1], "Bob       ");
    assert_eq!(lines[2], "        61");
}

#[test]
fn spreadsheet_chunks_into_ceil_n_over_t_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::from_columns(vec![Column::new(
        "n",
        (0..10).map(Value::Int).collect(),
    )]);
    let document = doc(r#"{
        "output_path": "big",
        "output_format": "xlsx",
        "mappings": [{"source": "n", "target": "n"}]
    }"#);
    let options = WriterOptions { sheet_row_limit: 4 };

    let result = write_table(&table, &document, dir.path(), &options).unwrap();
    assert_eq!(result.sheets, 3);
    assert!(result.path.ends_with("big.xlsx"));
    assert!(result.path.exists());
}

#[test]
fn zero_sheet_row_limit_is_an_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::from_columns(vec![Column::new("n", vec![Value::Int(1)])]);
    let document = doc(r#"{
        "output_path": "broken",
        "output_format": "xlsx",
        "mappings": [{"source": "n", "target": "n"}]
    }"#);
    let options = WriterOptions { sheet_row_limit: 0 };

    let err = write_table(&table, &document, dir.path(), &options).unwrap_err();
    assert!(matches!(err, etl_output::WriteError::ZeroSheetRowLimit { .. }));
    assert!(!dir.path().join("broken.xlsx").exists());
}

#[test]
fn empty_table_still_writes_one_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::from_columns(vec![Column::new("n", Vec::new())]);
    let document = doc(r#"{
        "output_path": "empty",
        "output_format": "xlsx",
        "mappings": [{"source": "n", "target": "n"}]
    }"#);

    let result = write_table(&table, &document, dir.path(), &WriterOptions::default()).unwrap();
    assert_eq!(result.sheets, 1);
}

#[test]
fn nested_output_path_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let document = doc(r#"{
        "output_path": "nested/deeper/people",
        "output_format": "csv",
        "mappings": [{"source": "name", "target": "name"}]
    }"#);

    let result = write_table(&sample_table(), &document, dir.path(), &WriterOptions::default())
        .unwrap();
    assert!(result.path.exists());
    assert!(result.path.parent().unwrap().ends_with("nested/deeper"));
}
