//! Common test utilities for gduck-client integration tests.
//!
//! # Integration Test Prerequisites
//!
//! Live tests require a running gduck server. Build and start it from the
//! gduck repository:
//!
//! ```bash
//! cargo run --release -- --address 0.0.0.0:50051
//! ```
//!
//! Tests that only need a well-behaved peer use the in-process
//! [`stub::StubTransport`] or [`server::TestServer`] instead and run
//! everywhere.
//!
//! # Configuration
//!
//! Live tests use the following defaults which can be overridden via
//! environment variables:
//!
//! | Default Constant | Environment Variable | Default Value |
//! |------------------|----------------------|---------------|
//! | `DEFAULT_HOST`   | `GDUCK_HOST`         | "localhost"   |
//! | `DEFAULT_PORT`   | `GDUCK_PORT`         | 50051         |
//!
//! # Running Integration Tests
//!
//! ```bash
//! # Stub-backed session tests
//! cargo test --test session_tests
//!
//! # gRPC transport against an in-process server
//! cargo test --test grpc_tests
//!
//! # Live tests (skip if gduck is unavailable)
//! cargo test --test integration_tests -- --include-ignored
//!
//! # Run with custom configuration
//! GDUCK_HOST=myhost GDUCK_PORT=6000 cargo test --test integration_tests -- --include-ignored
//! ```
//!
//! # Test Cleanup
//!
//! Live tests use `:memory:` databases or unique table names so parallel runs
//! never share state.

#![allow(dead_code)]

pub mod server;
pub mod stub;

use gduck_client::{Connection, ConnectionMode, GduckError, Transaction};
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

// ============================================================================
// Connection Constants with Default Values
// ============================================================================

/// Default host for the gduck server.
pub const DEFAULT_HOST: &str = "localhost";

/// Default port for the gduck server.
pub const DEFAULT_PORT: u16 = 50051;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable name for overriding the gduck host.
const ENV_GDUCK_HOST: &str = "GDUCK_HOST";

/// Environment variable name for overriding the gduck port.
const ENV_GDUCK_PORT: &str = "GDUCK_PORT";

// ============================================================================
// Configuration Helpers
// ============================================================================

/// Get the gduck host from environment or use default.
pub fn get_host() -> String {
    env::var(ENV_GDUCK_HOST).unwrap_or_else(|_| DEFAULT_HOST.to_string())
}

/// Get the gduck port from environment or use default.
///
/// An unparsable `GDUCK_PORT` falls back to the default.
pub fn get_port() -> u16 {
    env::var(ENV_GDUCK_PORT)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// `host:port` of the configured server.
pub fn get_test_addr() -> String {
    format!("{}:{}", get_host(), get_port())
}

/// Open a read-write transaction on an in-memory database of the
/// configured server.
pub async fn get_test_transaction() -> Result<Transaction, GduckError> {
    let connection = Connection::new(&get_test_addr())?;
    connection.begin(":memory:", ConnectionMode::ReadWrite).await
}

// ============================================================================
// gduck Availability Check
// ============================================================================

/// Check if a gduck server is reachable at the configured host and port.
///
/// Only TCP connectivity is checked.
pub fn is_gduck_available() -> bool {
    let socket_addrs: Vec<_> = match get_test_addr().to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        Err(_) => return false,
    };

    socket_addrs
        .iter()
        .any(|addr| TcpStream::connect_timeout(addr, Duration::from_secs(2)).is_ok())
}

/// Skip a test if no gduck server is available.
///
/// # Example
///
/// ```ignore
/// #[tokio::test]
/// #[ignore]
/// async fn test_query() {
///     skip_if_no_gduck!();
///     // Test code here...
/// }
/// ```
#[macro_export]
macro_rules! skip_if_no_gduck {
    () => {
        if !$crate::common::is_gduck_available() {
            eprintln!(
                "Skipping test: gduck not available at {}:{}",
                $crate::common::get_host(),
                $crate::common::get_port()
            );
            return;
        }
    };
}

/// Generate a unique table name.
///
/// # Example
///
/// ```ignore
/// let table = generate_test_table_name();
/// // Returns something like: "test_integration_1700000000123"
/// ```
pub fn generate_test_table_name() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis();

    format!("test_integration_{}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_HOST, "localhost");
        assert_eq!(DEFAULT_PORT, 50051);
    }

    #[test]
    fn test_generate_test_table_name() {
        let table = generate_test_table_name();
        assert!(table.starts_with("test_integration_"));
        assert!(table.len() > 17);
    }
}
