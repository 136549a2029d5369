//! Converter from row sets to Arrow record batches.
//!
//! Row-major values are transposed column by column into Arrow arrays; the
//! declared gduck type of each column is kept in the field metadata.

use crate::error::ConversionError;
use crate::types::{DataType, Rows, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType as ArrowType, Field, IntervalUnit, TimeUnit};
use std::collections::HashMap;
use std::sync::Arc;

use super::builders::build_array;

/// Field metadata key holding the gduck column type.
pub const TYPE_METADATA_KEY: &str = "gduck:type";

/// Converter for transforming row sets to Arrow.
pub struct ArrowConverter;

impl ArrowConverter {
    /// Arrow type used for a gduck column type.
    pub fn arrow_type(data_type: DataType) -> ArrowType {
        match data_type {
            DataType::Null => ArrowType::Null,
            DataType::Bool => ArrowType::Boolean,
            DataType::Int => ArrowType::Int64,
            DataType::UInt => ArrowType::UInt64,
            DataType::Double => ArrowType::Float64,
            DataType::Decimal | DataType::String => ArrowType::Utf8,
            DataType::DateTime => ArrowType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
            DataType::Date => ArrowType::Date32,
            DataType::Time => ArrowType::Time64(TimeUnit::Microsecond),
            DataType::Interval => ArrowType::Interval(IntervalUnit::MonthDayNano),
        }
    }

    /// Build the Arrow schema for a row set schema.
    ///
    /// Every field is nullable.
    pub fn arrow_schema(schema: &Schema) -> arrow_schema::Schema {
        let fields: Vec<Field> = schema
            .columns()
            .iter()
            .map(|c| {
                let metadata =
                    HashMap::from([(TYPE_METADATA_KEY.to_string(), c.data_type.name().to_string())]);
                Field::new(&c.name, Self::arrow_type(c.data_type), true).with_metadata(metadata)
            })
            .collect();

        arrow_schema::Schema::new(fields)
    }

    /// Convert a row set to an Arrow `RecordBatch`.
    ///
    /// # Errors
    /// Returns `ConversionError` if a value does not match its column type,
    /// does not fit the Arrow type, or Arrow rejects the batch.
    pub fn rows_to_record_batch(rows: &Rows) -> Result<RecordBatch, ConversionError> {
        let schema = Arc::new(Self::arrow_schema(rows.schema()));

        let arrays = rows
            .schema()
            .columns()
            .iter()
            .enumerate()
            .map(|(index, c)| build_array(c.data_type, rows.rows(), index))
            .collect::<Result<Vec<_>, _>>()?;

        // Explicit row count keeps zero-column results valid.
        let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
        Ok(RecordBatch::try_new_with_options(schema, arrays, &options)?)
    }
}

impl Rows {
    /// Convert to an Arrow `RecordBatch`.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ConversionError> {
        ArrowConverter::rows_to_record_batch(self)
    }
}
