//! End-to-end expression tests: compile a raw string, evaluate it against
//! a row, check the value or error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use etl_expr::{
    CompiledTransform, EvalError, EvaluationContext, compile_transform, compile_validation,
    evaluate,
};
use etl_model::Value;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn row(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn eval_transform(raw: &str, attrs: &BTreeMap<String, Value>) -> Result<Value, EvalError> {
    let CompiledTransform::Value(expr) = compile_transform(raw).expect("compile") else {
        panic!("expected a value transform");
    };
    let ctx = EvaluationContext::new(attrs, today());
    evaluate(&expr, &ctx)
}

#[test]
fn concat_full_name() {
    let attrs = row(&[
        ("firstName", Value::Str("Ann".into())),
        ("lastName", Value::Str("Lee".into())),
    ]);
    let out = eval_transform(
        "trns: STRING[CONCAT(attr('firstName'), ' ', attr('lastName'))]",
        &attrs,
    )
    .unwrap();
    assert_eq!(out, Value::Str("Ann Lee".into()));
}

#[test]
fn missing_attribute_is_row_scoped() {
    let attrs = row(&[]);
    let err = eval_transform("trns: STRING[UPPER(attr('name'))]", &attrs).unwrap_err();
    assert_eq!(err, EvalError::MissingAttribute("name".into()));
}

#[test]
fn if_does_not_evaluate_untaken_branch() {
    // The untaken branch divides by zero; the expression must still
    // succeed because IF never touches it.
    let attrs = row(&[]);
    let out = eval_transform(
        "trns: LOGICAL[IF(false, MATH[DIV(1, 0)], 'ok')]",
        &attrs,
    )
    .unwrap();
    assert_eq!(out, Value::Str("ok".into()));
}

#[test]
fn and_short_circuits_second_operand() {
    let attrs = row(&[]);
    let out = eval_transform(
        "trns: LOGICAL[AND(false, LOGICAL[NOT(attr('missing'))])]",
        &attrs,
    )
    .unwrap();
    assert_eq!(out, Value::Bool(false));
}

#[test]
fn or_short_circuits_second_operand() {
    let attrs = row(&[]);
    let out = eval_transform(
        "trns: LOGICAL[OR(true, MATH[DIV(1, 0)])]",
        &attrs,
    )
    .unwrap();
    assert_eq!(out, Value::Bool(true));
}

#[test]
fn nested_div_by_zero_degrades_to_eval_error() {
    let attrs = row(&[("x", Value::Int(5))]);
    let err = eval_transform(
        "trns: MATH[ADD(attr('x'), MATH[DIV(attr('x'), 0)])]",
        &attrs,
    )
    .unwrap_err();
    assert_eq!(err, EvalError::DivisionByZero);
}

#[test]
fn negating_min_int_promotes_to_float() {
    // An ingested Int64 column can hold i64::MIN even though no literal can.
    let attrs = row(&[("n", Value::Int(i64::MIN))]);
    let out = eval_transform("trns: MATH[ADD(-attr('n'), 0)]", &attrs).unwrap();
    assert_eq!(out, Value::Float(-(i64::MIN as f64)));
}

#[test]
fn if_condition_must_be_boolean() {
    let attrs = row(&[("x", Value::Int(1))]);
    let err = eval_transform("trns: LOGICAL[IF(attr('x'), 'a', 'b')]", &attrs).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch { .. }));
}

#[test]
fn current_date_is_deterministic_within_a_request() {
    let attrs = row(&[]);
    let out = eval_transform(
        "trns: DATE[FORMAT(DATE[CURRENT_DATE()], '%Y-%m-%d')]",
        &attrs,
    )
    .unwrap();
    assert_eq!(out, Value::Str("2024-06-15".into()));
}

#[test]
fn validation_range_rule() {
    let rule = compile_validation(">=0 and <=120").unwrap();
    let attrs = row(&[]);
    for (value, expected) in [
        (Value::Int(-1), false),
        (Value::Int(0), true),
        (Value::Int(120), true),
        (Value::Int(121), false),
    ] {
        let ctx = EvaluationContext::new(&attrs, today()).with_subject(&value);
        let out = evaluate(&rule, &ctx).unwrap();
        assert_eq!(out, Value::Bool(expected), "value {value:?}");
    }
}

#[test]
fn validation_can_reference_other_attributes() {
    let rule = compile_validation("attr('age') >= 18 or attr('consent') == 'parent'").unwrap();
    let attrs = row(&[
        ("age", Value::Int(16)),
        ("consent", Value::Str("parent".into())),
    ]);
    let subject = Value::Null;
    let ctx = EvaluationContext::new(&attrs, today()).with_subject(&subject);
    assert_eq!(evaluate(&rule, &ctx).unwrap(), Value::Bool(true));
}

#[test]
fn split_get_join_chain() {
    let attrs = row(&[("tags", Value::Str("red;green;blue".into()))]);
    let out = eval_transform(
        "trns: ARRAY[GET(ARRAY[SPLIT(attr('tags'), ';')], 1)]",
        &attrs,
    )
    .unwrap();
    assert_eq!(out, Value::Str("green".into()));
}

#[test]
fn date_pipeline_with_arithmetic() {
    let attrs = row(&[("start", Value::Str("2024-01-01".into()))]);
    let out = eval_transform(
        "trns: DATE[DIFF_DAYS(DATE[CURRENT_DATE()], DATE[PARSE(attr('start'), '%Y-%m-%d')])]",
        &attrs,
    )
    .unwrap();
    assert_eq!(out, Value::Int(166));
}
