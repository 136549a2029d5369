//! Request construction.
//!
//! Builds the wire messages for the connect handshake and for each kind of
//! operation. Parameters are encoded here, so a bad parameter fails before
//! the request reaches a session.

use crate::connection::params::ConnectionMode;
use crate::error::EncodingError;
use crate::transport::messages::{self as proto, location, query};
use crate::types::{ToScalar, ValueCodec};
use std::path::Path;

/// Build the connect handshake for `database_file`.
///
/// `":memory:"` selects an in-memory database on the server.
pub fn connect(database_file: &str, mode: ConnectionMode) -> proto::Request {
    proto::Request::from(proto::Connect {
        file_name: database_file.to_string(),
        mode: proto::connect::Mode::from(mode) as i32,
    })
}

/// Statement executed for its side effects.
pub fn execute(sql: &str, params: &[&dyn ToScalar]) -> Result<proto::Query, EncodingError> {
    Ok(with_kind(query::Kind::Execute(query::Execute {
        query: sql.to_string(),
        params: Some(ValueCodec::encode_params(params)?),
    })))
}

/// Query returning a single scalar.
pub fn value(sql: &str, params: &[&dyn ToScalar]) -> Result<proto::Query, EncodingError> {
    Ok(with_kind(query::Kind::Value(query::QueryValue {
        query: sql.to_string(),
        params: Some(ValueCodec::encode_params(params)?),
    })))
}

/// Query returning a row set.
pub fn rows(sql: &str, params: &[&dyn ToScalar]) -> Result<proto::Query, EncodingError> {
    Ok(with_kind(query::Kind::Rows(query::QueryRows {
        query: sql.to_string(),
        params: Some(ValueCodec::encode_params(params)?),
    })))
}

/// Create `table_name` from the result of `sql`.
pub fn ctas(
    table_name: &str,
    sql: &str,
    params: &[&dyn ToScalar],
) -> Result<proto::Query, EncodingError> {
    Ok(with_kind(query::Kind::Ctas(query::CreateTableAsQuery {
        table_name: table_name.to_string(),
        query: sql.to_string(),
        params: Some(ValueCodec::encode_params(params)?),
    })))
}

/// Export the result of `sql` as parquet to `location`.
pub fn parquet(
    location: proto::Location,
    sql: &str,
    params: &[&dyn ToScalar],
) -> Result<proto::Query, EncodingError> {
    Ok(with_kind(query::Kind::Parquet(query::ParquetQuery {
        location: Some(location),
        query: sql.to_string(),
        params: Some(ValueCodec::encode_params(params)?),
    })))
}

/// A location on the server's local filesystem.
pub fn local_file(path: impl AsRef<Path>) -> proto::Location {
    proto::Location {
        kind: Some(location::Kind::Local(location::LocalFile {
            path: path.as_ref().to_string_lossy().into_owned(),
        })),
    }
}

fn with_kind(kind: query::Kind) -> proto::Query {
    proto::Query { kind: Some(kind) }
}

impl proto::Query {
    /// Short name of the operation, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            Some(query::Kind::Execute(_)) => "execute",
            Some(query::Kind::Value(_)) => "value",
            Some(query::Kind::Rows(_)) => "rows",
            Some(query::Kind::Ctas(_)) => "ctas",
            Some(query::Kind::Parquet(_)) => "parquet",
            None => "empty",
        }
    }

    /// SQL text of the operation.
    pub fn sql(&self) -> &str {
        match &self.kind {
            Some(query::Kind::Execute(q)) => &q.query,
            Some(query::Kind::Value(q)) => &q.query,
            Some(query::Kind::Rows(q)) => &q.query,
            Some(query::Kind::Ctas(q)) => &q.query,
            Some(query::Kind::Parquet(q)) => &q.query,
            None => "",
        }
    }
}
