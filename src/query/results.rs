//! Result parsing.
//!
//! Turns the raw success payload of a response into native values. The
//! `expect_*` checks verify the payload kind matches the operation that was
//! submitted; the `parse_*` functions decode the payload itself.

use crate::error::ProtocolViolation;
use crate::transport::messages::{self as proto, location, response::query_result::Kind};
use crate::transport::messages::response::QueryResult;
use crate::types::{ColumnDecoder, ParquetLocation, Row, Rows, Schema, Value, ValueCodec};
use std::path::PathBuf;

/// Decode a scalar result.
pub fn parse_value(scalar: &proto::ScalarValue) -> Result<Value, ProtocolViolation> {
    ValueCodec::decode(scalar)
}

/// Decode a row set.
///
/// The schema is read first and one decoder is built per column; each row is
/// then decoded positionally. Null is accepted in any column.
pub fn parse_rows(rows: &proto::Rows) -> Result<Rows, ProtocolViolation> {
    let schema = rows
        .schema
        .as_ref()
        .ok_or(ProtocolViolation::MissingSchema)?;
    let schema = Schema::try_from(schema)?;
    let decoders = ColumnDecoder::for_schema(&schema);

    let parsed = rows
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            if row.values.len() != decoders.len() {
                return Err(ProtocolViolation::RowArity {
                    row: row_index,
                    expected: decoders.len(),
                    actual: row.values.len(),
                });
            }
            decoders
                .iter()
                .zip(&row.values)
                .map(|(decoder, scalar)| decoder.decode(row_index, scalar))
                .collect::<Result<Vec<_>, _>>()
                .map(Row::new)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rows::new(schema, parsed))
}

/// Decode a parquet file location.
pub fn parse_location(loc: &proto::Location) -> Result<ParquetLocation, ProtocolViolation> {
    match &loc.kind {
        Some(location::Kind::Local(file)) => Ok(ParquetLocation::Local(PathBuf::from(&file.path))),
        None => Err(ProtocolViolation::MissingLocation),
    }
}

/// Check an acknowledgement-only result.
pub fn expect_ok(result: QueryResult) -> Result<(), ProtocolViolation> {
    match result.kind {
        Some(Kind::Ok(())) => Ok(()),
        _ => Err(unexpected("ok", &result)),
    }
}

/// Extract the scalar payload.
pub fn expect_value(result: QueryResult) -> Result<proto::ScalarValue, ProtocolViolation> {
    match result.kind {
        Some(Kind::Value(value)) => Ok(value),
        kind => Err(unexpected("value", &QueryResult { kind })),
    }
}

/// Extract the row set payload.
pub fn expect_rows(result: QueryResult) -> Result<proto::Rows, ProtocolViolation> {
    match result.kind {
        Some(Kind::Rows(rows)) => Ok(rows),
        kind => Err(unexpected("rows", &QueryResult { kind })),
    }
}

/// Extract the parquet location payload.
pub fn expect_location(result: QueryResult) -> Result<proto::Location, ProtocolViolation> {
    match result.kind {
        Some(Kind::ParquetFile(location)) => Ok(location),
        None => Err(ProtocolViolation::MissingLocation),
        kind => Err(unexpected("parquet file", &QueryResult { kind })),
    }
}

fn unexpected(expected: &'static str, actual: &QueryResult) -> ProtocolViolation {
    if actual.kind.is_none() {
        return ProtocolViolation::MissingPayload;
    }
    ProtocolViolation::UnexpectedPayload {
        expected,
        actual: actual.kind_name(),
    }
}
