//! # gduck-client
//!
//! Transactional client for the gduck DuckDB service.
//!
//! Each transaction is one bidirectional gRPC stream. The client sends a
//! connect handshake naming the database file, then an ordered sequence of
//! operations; the server answers every operation exactly once, in order. A
//! background task drains the response stream while the caller awaits each
//! result in turn.
//!
//! ## Example
//!
//! ```no_run
//! use gduck_client::{params, Connection, ConnectionMode};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = Connection::new("localhost:50051")?;
//! let mut txn = connection
//!     .begin("example.duckdb", ConnectionMode::ReadWrite)
//!     .await?;
//!
//! txn.execute("CREATE TABLE users (id INTEGER, name VARCHAR)", params![])
//!     .await?;
//! txn.execute("INSERT INTO users VALUES (?, ?)", params![1, "ada"])
//!     .await?;
//!
//! let rows = txn.query_rows("SELECT * FROM users", params![]).await?;
//! for row in &rows {
//!     println!("{:?}", row.values());
//! }
//!
//! // Arrow export of a row set
//! let batch = rows.to_record_batch()?;
//! println!("Rows: {}", batch.num_rows());
//!
//! txn.close().await?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod arrow_conversion;
pub mod connection;
pub mod error;
pub mod query;
pub mod transport;
pub mod types;

// Re-export public API
pub use arrow_conversion::ArrowConverter;
pub use connection::{Addr, Connection, ConnectionMode, Transaction, TransactionState};
pub use error::{
    ChannelError, ConversionError, EncodingError, ErrorKind, GduckError, ProtocolViolation,
    Result, ServerError, SessionError,
};
pub use transport::ChannelConfig;
pub use types::{
    CalendarInterval, Column, DataType, Decimal, ParquetLocation, Row, Rows, Schema, ToScalar,
    Value,
};
