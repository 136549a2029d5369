//! Array builders for converting row values to Arrow arrays.
//!
//! Each builder walks one column of a row set and appends values with proper
//! NULL handling.

use crate::error::ConversionError;
use crate::types::{DataType, Row, Value, ValueCodec};
use arrow::array::{
    ArrayRef, BooleanBuilder, Date32Builder, Float64Builder, Int64Builder,
    IntervalMonthDayNanoBuilder, NullArray, StringBuilder, Time64MicrosecondBuilder,
    TimestampNanosecondBuilder, UInt64Builder,
};
use arrow::datatypes::IntervalMonthDayNano;
use chrono::{Datelike, Timelike};
use std::sync::Arc;

/// Days from 0001-01-01 (CE) to 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Build an Arrow array from one column of `rows`.
///
/// # Arguments
/// * `data_type` - Declared type of the column
/// * `rows` - All rows of the result
/// * `column` - Column index
///
/// # Errors
/// Returns `ConversionError` if a value does not match the declared type or
/// does not fit its Arrow representation.
pub fn build_array(
    data_type: DataType,
    rows: &[Row],
    column: usize,
) -> Result<ArrayRef, ConversionError> {
    let values = column_values(rows, column)?;

    match data_type {
        DataType::Null => build_null_array(&values, column),
        DataType::Bool => build_boolean_array(&values, column),
        DataType::Int => build_int64_array(&values, column),
        DataType::UInt => build_uint64_array(&values, column),
        DataType::Double => build_double_array(&values, column),
        // Decimals keep their exact text; Arrow decimals would cap precision.
        DataType::Decimal | DataType::String => build_string_array(&values, data_type, column),
        DataType::DateTime => build_timestamp_array(&values, column),
        DataType::Date => build_date_array(&values, column),
        DataType::Time => build_time_array(&values, column),
        DataType::Interval => build_interval_array(&values, column),
    }
}

fn column_values(rows: &[Row], column: usize) -> Result<Vec<&Value>, ConversionError> {
    rows.iter()
        .enumerate()
        .map(|(row, r)| {
            r.get(column)
                .ok_or(ConversionError::MissingValue { row, column })
        })
        .collect()
}

fn mismatch(row: usize, column: usize, expected: DataType, value: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        row,
        column,
        expected: expected.name(),
        actual: value.data_type().name(),
    }
}

fn build_null_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    if let Some((row, value)) = values.iter().enumerate().find(|(_, v)| !v.is_null()) {
        return Err(mismatch(row, column, DataType::Null, value));
    }
    Ok(Arc::new(NullArray::new(values.len())))
}

/// Build a Boolean array.
fn build_boolean_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = BooleanBuilder::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::Bool(b) => builder.append_value(*b),
            other => return Err(mismatch(row, column, DataType::Bool, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

fn build_int64_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = Int64Builder::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::Int(i) => builder.append_value(*i),
            other => return Err(mismatch(row, column, DataType::Int, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

fn build_uint64_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = UInt64Builder::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::UInt(u) => builder.append_value(*u),
            other => return Err(mismatch(row, column, DataType::UInt, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

fn build_double_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = Float64Builder::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::Double(d) => builder.append_value(*d),
            other => return Err(mismatch(row, column, DataType::Double, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

/// Estimate total string bytes for capacity pre-allocation.
/// Uses a sample of the first few non-null values.
fn estimate_string_capacity(values: &[&Value]) -> usize {
    const SAMPLE_SIZE: usize = 10;
    const DEFAULT_AVG_LEN: usize = 32;

    let sample: Vec<usize> = values
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.len()),
            Value::Decimal(d) => Some(d.as_str().len()),
            _ => None,
        })
        .take(SAMPLE_SIZE)
        .collect();

    if sample.is_empty() {
        DEFAULT_AVG_LEN * values.len()
    } else {
        let avg_len = sample.iter().sum::<usize>() / sample.len();
        (avg_len + 8) * values.len()
    }
}

/// Build a Utf8 array from string or decimal values.
fn build_string_array(
    values: &[&Value],
    data_type: DataType,
    column: usize,
) -> Result<ArrayRef, ConversionError> {
    let mut builder = StringBuilder::with_capacity(values.len(), estimate_string_capacity(values));

    for (row, value) in values.iter().enumerate() {
        match (data_type, value) {
            (_, Value::Null) => builder.append_null(),
            (DataType::String, Value::String(s)) => builder.append_value(s),
            (DataType::Decimal, Value::Decimal(d)) => builder.append_value(d.as_str()),
            (_, other) => return Err(mismatch(row, column, data_type, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

/// Build a UTC nanosecond timestamp array.
fn build_timestamp_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = TimestampNanosecondBuilder::with_capacity(values.len()).with_timezone("UTC");

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::DateTime(dt) => {
                let nanos = dt
                    .timestamp_nanos_opt()
                    .ok_or_else(|| ConversionError::OutOfRange {
                        row,
                        column,
                        message: format!("{} is outside the nanosecond timestamp range", dt),
                    })?;
                builder.append_value(nanos);
            }
            other => return Err(mismatch(row, column, DataType::DateTime, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

/// Build a Date32 array (days since the Unix epoch).
fn build_date_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = Date32Builder::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::Date(d) => builder.append_value(d.num_days_from_ce() - EPOCH_DAYS_FROM_CE),
            other => return Err(mismatch(row, column, DataType::Date, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

/// Build a Time64 array (microseconds since midnight).
fn build_time_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = Time64MicrosecondBuilder::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::Time(t) => {
                let micros = i64::from(t.num_seconds_from_midnight()) * 1_000_000
                    + i64::from(t.nanosecond() / 1_000);
                builder.append_value(micros);
            }
            other => return Err(mismatch(row, column, DataType::Time, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}

/// Build a MonthDayNano interval array, using the wire layout of the interval.
fn build_interval_array(values: &[&Value], column: usize) -> Result<ArrayRef, ConversionError> {
    let mut builder = IntervalMonthDayNanoBuilder::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Value::Null => builder.append_null(),
            Value::Interval(i) => {
                let wire = ValueCodec::encode_interval(i).map_err(|e| {
                    ConversionError::OutOfRange {
                        row,
                        column,
                        message: e.to_string(),
                    }
                })?;
                builder.append_value(IntervalMonthDayNano::new(wire.months, wire.days, wire.nanos));
            }
            other => return Err(mismatch(row, column, DataType::Interval, other)),
        }
    }

    Ok(Arc::new(builder.finish()))
}
