//! Error types for gduck-client.
//!
//! Errors are organized by where they originate: local value encoding, the
//! remote service, the RPC channel, malformed responses, misuse of the
//! session lifecycle, and Arrow export.

use std::fmt;
use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GduckError>;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum GduckError {
    /// A parameter has no wire representation
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The remote service rejected an operation
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The RPC channel failed outside of a deliberate close
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A response did not have the expected shape
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    /// The session was used in the wrong lifecycle state
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid `host:port` address
    #[error(transparent)]
    Addr(#[from] AddrParseError),

    /// Row set could not be converted to Arrow
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// A native value that cannot be sent to the server.
///
/// Always raised before any network I/O takes place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The native type has no wire representation at all
    #[error("Invalid type of value: {value} ({type_name})")]
    UnsupportedType {
        value: String,
        type_name: &'static str,
    },

    /// The native type is supported but this particular value does not fit
    #[error("Value {value} ({type_name}) is out of range: {message}")]
    OutOfRange {
        value: String,
        type_name: &'static str,
        message: String,
    },

    /// A decimal string is not a plain decimal number
    #[error("Invalid decimal literal '{0}'")]
    InvalidDecimal(String),
}

impl EncodingError {
    pub(crate) fn unsupported<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        EncodingError::UnsupportedType {
            value: format!("{:?}", value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn out_of_range<T: fmt::Debug + ?Sized>(value: &T, message: impl Into<String>) -> Self {
        EncodingError::OutOfRange {
            value: format!("{:?}", value),
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

/// An error reported by the remote service for one operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Server error {code}: {message}")]
pub struct ServerError {
    /// Server-assigned error code
    pub code: i32,
    /// Human readable message
    pub message: String,
}

impl ServerError {
    /// Create a new server error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors related to the RPC channel carrying a transaction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// The endpoint URI could not be built
    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// Failed to establish the channel
    #[error("Failed to connect to {addr}: {message}")]
    ConnectFailed { addr: String, message: String },

    /// Channel establishment did not complete in time
    #[error("Connection timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The RPC terminated with a non-cancellation status
    #[error("RPC failed with status {code:?}: {message}")]
    Status { code: tonic::Code, message: String },

    /// The response stream finished while a response was still expected
    #[error("Response stream ended before the response was received")]
    StreamEnded,

    /// An earlier channel failure left the transaction unusable
    #[error("Transaction channel failed earlier and can no longer be used")]
    Poisoned,

    /// Tearing down the channel failed
    #[error("Failed to shut down the transaction channel: {0}")]
    Shutdown(String),
}

/// A response whose shape violates the request/response protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Response carried neither a success payload nor an error
    #[error("Response carries neither a result nor an error")]
    MissingResult,

    /// Success payload had no kind set
    #[error("Query result has no payload")]
    MissingPayload,

    /// Success payload was of a different kind than the operation produces
    #[error("Expected {expected} result but received {actual}")]
    UnexpectedPayload {
        expected: &'static str,
        actual: &'static str,
    },

    /// Scalar value had no tag set
    #[error("Scalar value has no type tag set")]
    UnsetValue,

    /// Schema declared a data type this client does not know
    #[error("Unknown data type {0} in result schema")]
    UnknownDataType(i32),

    /// Row set arrived without a schema
    #[error("Row set has no schema")]
    MissingSchema,

    /// Row has a different number of values than the schema has columns
    #[error("Row {row} has {actual} values but the schema has {expected} columns")]
    RowArity {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A value's tag does not match its column's declared type
    #[error("Column {column} is declared {expected} but row {row} holds a {actual} value")]
    TypeMismatch {
        row: usize,
        column: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// A value's payload is not valid for its tag
    #[error("Invalid {tag} value: {message}")]
    InvalidValue { tag: &'static str, message: String },

    /// Parquet result had no location
    #[error("Parquet file location is missing")]
    MissingLocation,
}

/// Errors related to the transaction lifecycle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Operation issued before `open()`
    #[error("Transaction is not open")]
    NotOpen,

    /// `open()` called on an already open transaction
    #[error("Transaction is already open")]
    AlreadyOpen,

    /// Operation issued after `close()`
    #[error("Transaction is closed")]
    Closed,
}

/// Errors parsing a `host:port` address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddrParseError {
    /// No `:port` suffix
    #[error("Address '{0}' has no port")]
    MissingPort(String),

    /// Port is not a number in 0..=65535
    #[error("Invalid port in address '{0}'")]
    InvalidPort(String),

    /// Host part is empty
    #[error("Address '{0}' has no host")]
    EmptyHost(String),

    /// Host part contains a colon
    #[error("Ambiguous host in address '{0}': host must not contain ':'")]
    AmbiguousHost(String),
}

/// Errors converting a row set to Arrow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// A value does not match its column's declared type
    #[error("Column {column} is declared {expected} but row {row} holds a {actual} value")]
    TypeMismatch {
        row: usize,
        column: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// A row is shorter than the schema
    #[error("Row {row} has no value for column {column}")]
    MissingValue { row: usize, column: usize },

    /// A value is outside the range of its Arrow type
    #[error("Value at row {row}, column {column} does not fit in Arrow: {message}")]
    OutOfRange {
        row: usize,
        column: usize,
        message: String,
    },

    /// Arrow rejected the batch
    #[error("Arrow error: {0}")]
    ArrowError(String),
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local encoding failure
    Encoding,
    /// Remote service error
    Server,
    /// Transport failure
    Channel,
    /// Malformed response
    Protocol,
    /// Lifecycle misuse
    Session,
    /// Invalid argument
    InvalidArgument,
    /// Arrow conversion failure
    Conversion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Encoding => write!(f, "ENCODING"),
            ErrorKind::Server => write!(f, "SERVER"),
            ErrorKind::Channel => write!(f, "CHANNEL"),
            ErrorKind::Protocol => write!(f, "PROTOCOL"),
            ErrorKind::Session => write!(f, "SESSION"),
            ErrorKind::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            ErrorKind::Conversion => write!(f, "CONVERSION"),
        }
    }
}

impl GduckError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GduckError::Encoding(_) => ErrorKind::Encoding,
            GduckError::Server(_) => ErrorKind::Server,
            GduckError::Channel(_) => ErrorKind::Channel,
            GduckError::Protocol(_) => ErrorKind::Protocol,
            GduckError::Session(_) => ErrorKind::Session,
            GduckError::Addr(_) => ErrorKind::InvalidArgument,
            GduckError::Conversion(_) => ErrorKind::Conversion,
        }
    }

    /// The server error, if this is one.
    pub fn as_server_error(&self) -> Option<&ServerError> {
        match self {
            GduckError::Server(e) => Some(e),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<tonic::Status> for ChannelError {
    fn from(status: tonic::Status) -> Self {
        ChannelError::Status {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

impl From<arrow_schema::ArrowError> for ConversionError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        ConversionError::ArrowError(err.to_string())
    }
}

impl From<tonic::Status> for GduckError {
    fn from(status: tonic::Status) -> Self {
        GduckError::Channel(status.into())
    }
}
