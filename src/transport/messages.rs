//! Protocol message types for the gduck transaction service.
//!
//! The `prost` types and the `DbService` client and server stubs are
//! generated from `proto/gduck.proto` by `build.rs`; this module adds
//! constructors and diagnostics on top.

tonic::include_proto!("gduck");

impl From<Connect> for Request {
    fn from(connect: Connect) -> Self {
        Request {
            message: Some(request::Message::Connect(connect)),
        }
    }
}

impl From<Query> for Request {
    fn from(query: Query) -> Self {
        Request {
            message: Some(request::Message::Query(query)),
        }
    }
}

impl Response {
    /// A success response carrying `result`.
    pub fn success(result: response::QueryResult) -> Self {
        Response {
            result: Some(response::Result::Success(result)),
        }
    }

    /// An error response.
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Response {
            result: Some(response::Result::Error(Error {
                code,
                message: message.into(),
            })),
        }
    }
}

impl response::QueryResult {
    /// Acknowledgement without payload (execute, ctas).
    pub fn ok() -> Self {
        Self {
            kind: Some(response::query_result::Kind::Ok(())),
        }
    }

    /// Short name of the payload kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            Some(response::query_result::Kind::Ok(())) => "ok",
            Some(response::query_result::Kind::Value(_)) => "value",
            Some(response::query_result::Kind::Rows(_)) => "rows",
            Some(response::query_result::Kind::ParquetFile(_)) => "parquet file",
            None => "empty",
        }
    }
}
