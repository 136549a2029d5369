//! Request building and result parsing.
//!
//! # Overview
//!
//! The query module is organized into:
//! - `request` - Wire requests for the connect handshake and each operation
//! - `results` - Payload checks and decoding of values, row sets and locations
//!
//! # Example
//!
//! ```
//! use gduck_client::params;
//! use gduck_client::query::{request, results};
//! use gduck_client::transport::messages::response::QueryResult;
//!
//! let query = request::rows("SELECT * FROM t WHERE id = ?", params![42]).unwrap();
//! assert_eq!(query.kind_name(), "rows");
//!
//! assert!(results::expect_ok(QueryResult::ok()).is_ok());
//! ```

pub mod request;
pub mod results;

// Re-export commonly used types
pub use request::local_file;
pub use results::{parse_location, parse_rows, parse_value};
