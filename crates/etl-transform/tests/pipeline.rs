use chrono::NaiveDate;
use etl_model::{Column, MappingDocument, Table, Value};
use etl_transform::{PipelineOptions, run_pipeline};
use etl_validate::ValidationPolicy;

fn options() -> PipelineOptions {
    PipelineOptions {
        current_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        policy: ValidationPolicy::default(),
    }
}

fn people() -> Table {
    Table::from_columns(vec![
        Column::new(
            "firstName",
            vec![
                Value::Str("Ann".into()),
                Value::Str("Bob".into()),
                Value::Str("Cid".into()),
            ],
        ),
        Column::new(
            "lastName",
            vec![
                Value::Str("Lee".into()),
                Value::Str("Ray".into()),
                Value::Str("Fox".into()),
            ],
        ),
        Column::new(
            "age",
            vec![Value::Int(34), Value::Int(150), Value::Int(61)],
        ),
    ])
}

fn doc(json: &str) -> MappingDocument {
    MappingDocument::parse(json).unwrap()
}

#[test]
fn concat_and_validation_end_to_end() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {
                "target": "full_name",
                "transform": "trns: STRING[CONCAT(attr('firstName'), ' ', attr('lastName'))]"
            },
            {"source": "age", "target": "age", "validation": ">=0 and <=120"}
        ]
    }"#);

    let output = run_pipeline(&people(), &document, &options()).unwrap();
    assert_eq!(output.total_rows, 3);
    assert_eq!(output.accepted_rows, 2);
    assert_eq!(output.rejected_rows, 1);
    assert_eq!(output.table.value("full_name", 0), Some(&Value::Str("Ann Lee".into())));
    assert_eq!(output.table.value("full_name", 1), Some(&Value::Str("Cid Fox".into())));
    assert_eq!(output.issues.len(), 1);
    assert_eq!(output.issues[0].row, 1);
    assert_eq!(output.issues[0].field, "age");
}

#[test]
fn without_errors_every_row_is_accepted() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "firstName", "target": "first_name"},
            {"source": "age", "target": "age"}
        ]
    }"#);

    let output = run_pipeline(&people(), &document, &options()).unwrap();
    assert_eq!(output.accepted_rows, output.total_rows);
    assert_eq!(output.rejected_rows, 0);
    assert!(output.issues.is_empty());
    assert_eq!(output.table.height(), 3);
    assert_eq!(output.table.width(), 2);
}

#[test]
fn shorthand_upper_applies_to_source() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "firstName", "target": "name", "transform": "upper"}
        ]
    }"#);

    let output = run_pipeline(&people(), &document, &options()).unwrap();
    assert_eq!(output.table.value("name", 0), Some(&Value::Str("ANN".into())));
}

#[test]
fn missing_source_falls_back_to_default() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "country", "target": "country", "default": "NL"}
        ]
    }"#);

    let output = run_pipeline(&people(), &document, &options()).unwrap();
    assert_eq!(output.accepted_rows, 3);
    assert_eq!(output.table.value("country", 2), Some(&Value::Str("NL".into())));
}

#[test]
fn missing_source_without_default_is_fatal() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "country", "target": "country"}
        ]
    }"#);

    let err = run_pipeline(&people(), &document, &options()).unwrap_err();
    assert!(err.to_string().contains("mappings[0].source"));
}

#[test]
fn malformed_transform_fails_before_any_row() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"target": "bad", "transform": "trns: STRING[NOPE(attr('firstName'))]"}
        ]
    }"#);

    let err = run_pipeline(&people(), &document, &options()).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("mappings[0].transform"), "{chain}");
    assert!(chain.contains("NOPE"), "{chain}");
}

#[test]
fn filters_apply_to_transformed_rows() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "firstName", "target": "name", "transform": "upper"},
            {"source": "age", "target": "age"},
            {"target": "_f1", "transform": "trns: FILTERS[INCLUDE_IF(attr('age') < 100)]"},
            {"target": "_f2", "transform": "trns: FILTERS[LIMIT(1)]"}
        ]
    }"#);

    let output = run_pipeline(&people(), &document, &options()).unwrap();
    // Filter mappings produce no columns.
    assert_eq!(output.table.width(), 2);
    // INCLUDE_IF keeps rows 0 and 2, LIMIT keeps the first of those.
    assert_eq!(output.table.height(), 1);
    assert_eq!(output.table.value("name", 0), Some(&Value::Str("ANN".into())));
    // Filter removals are not rejections.
    assert_eq!(output.rejected_rows, 0);
    assert_eq!(output.accepted_rows, 1);
}

#[test]
fn evaluation_error_rejects_only_the_offending_row() {
    let table = Table::from_columns(vec![Column::new(
        "d",
        vec![Value::Int(2), Value::Int(0), Value::Int(5)],
    )]);
    let document = doc(r#"{
        "output_path": "out/ratios",
        "output_format": "csv",
        "mappings": [
            {"target": "ratio", "transform": "trns: MATH[DIV(10, attr('d'))]"}
        ]
    }"#);

    let output = run_pipeline(&table, &document, &options()).unwrap();
    assert_eq!(output.accepted_rows, 2);
    assert_eq!(output.rejected_rows, 1);
    assert_eq!(output.issues.len(), 1);
    assert_eq!(output.issues[0].row, 1);
    assert!(output.issues[0].reason.contains("division by zero"));
    assert_eq!(output.table.value("ratio", 0), Some(&Value::Float(5.0)));
}

#[test]
fn flag_and_keep_reports_but_retains_invalid_rows() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "age", "target": "age", "validation": ">=0 and <=120"}
        ]
    }"#);
    let opts = PipelineOptions {
        policy: ValidationPolicy::FlagAndKeep,
        ..options()
    };

    let output = run_pipeline(&people(), &document, &opts).unwrap();
    assert_eq!(output.accepted_rows, 3);
    assert_eq!(output.rejected_rows, 0);
    assert_eq!(output.issues.len(), 1);
    assert_eq!(output.issues[0].row, 1);
}

#[test]
fn validation_rule_may_reference_other_target_columns() {
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "age", "target": "age"},
            {
                "target": "age_plus",
                "transform": "trns: MATH[ADD(attr('age'), 1)]",
                "validation": "> attr('age')"
            }
        ]
    }"#);

    let output = run_pipeline(&people(), &document, &options()).unwrap();
    assert_eq!(output.accepted_rows, 3);
    assert!(output.issues.is_empty());
}

#[test]
fn empty_input_produces_empty_output_with_all_columns() {
    let table = Table::from_columns(vec![Column::new("firstName", Vec::new())]);
    let document = doc(r#"{
        "output_path": "out/people",
        "output_format": "csv",
        "mappings": [
            {"source": "firstName", "target": "name", "transform": "upper"}
        ]
    }"#);

    let output = run_pipeline(&table, &document, &options()).unwrap();
    assert_eq!(output.total_rows, 0);
    assert_eq!(output.accepted_rows, 0);
    assert_eq!(output.table.width(), 1);
    assert!(output.table.has_column("name"));
}
