//! DataFrame to table conversion.

use chrono::NaiveDate;
use etl_model::{Column, Table, Value};
use polars::error::PolarsResult;
use polars::prelude::{AnyValue, DataFrame, Series};

/// Convert a polars frame into the pipeline's own table model.
///
/// The evaluator needs typed per-cell access with row-scoped error
/// handling, which the columnar frame cannot give us directly, so cells
/// are materialized once here.
pub fn dataframe_to_table(df: &DataFrame) -> PolarsResult<Table> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let mut values = Vec::with_capacity(series.len());
        for row in 0..series.len() {
            values.push(any_to_value(series.get(row)?));
        }
        columns.push(Column::new(column.name().to_string(), values));
    }
    Ok(Table::from_columns(columns))
}

/// Map one polars cell to a typed value. Unrepresentable cells degrade to
/// their string rendering rather than failing the load.
fn any_to_value(any: AnyValue<'_>) -> Value {
    match any {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int8(v) => Value::Int(i64::from(v)),
        AnyValue::Int16(v) => Value::Int(i64::from(v)),
        AnyValue::Int32(v) => Value::Int(i64::from(v)),
        AnyValue::Int64(v) => Value::Int(v),
        AnyValue::UInt8(v) => Value::Int(i64::from(v)),
        AnyValue::UInt16(v) => Value::Int(i64::from(v)),
        AnyValue::UInt32(v) => Value::Int(i64::from(v)),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Float(v as f64),
        },
        AnyValue::Float32(v) => Value::Float(f64::from(v)),
        AnyValue::Float64(v) => Value::Float(v),
        AnyValue::String(s) => Value::Str(s.to_string()),
        AnyValue::StringOwned(s) => Value::Str(s.to_string()),
        AnyValue::Date(days) => date_from_epoch_days(days),
        AnyValue::List(series) => Value::Array(series_to_values(&series)),
        other => Value::Str(other.to_string()),
    }
}

fn series_to_values(series: &Series) -> Vec<Value> {
    (0..series.len())
        .map(|row| match series.get(row) {
            Ok(any) => any_to_value(any),
            Err(_) => Value::Null,
        })
        .collect()
}

/// Polars stores dates as days since the Unix epoch.
fn date_from_epoch_days(days: i32) -> Value {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(days))))
        .map_or(Value::Null, Value::Date)
}
