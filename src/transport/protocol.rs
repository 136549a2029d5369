//! Transport protocol abstraction trait.
//!
//! This module defines the `Transport` trait that opens one bidirectional
//! transaction stream to the gduck service. The gRPC implementation lives in
//! `grpc`; tests plug in an in-process stub.

use crate::connection::params::Addr;
use crate::error::ChannelError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::messages::{Request, Response};

/// Outbound half of a transaction: every request, connect first.
pub type RequestStream = BoxStream<'static, Request>;

/// Inbound half of a transaction: one item per response, or the status the
/// RPC terminated with.
pub type ResponseStream = BoxStream<'static, Result<Response, tonic::Status>>;

/// Channel-level settings for establishing a transaction stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel establishment timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// TCP keepalive in milliseconds (disabled if None)
    pub tcp_keepalive_ms: Option<u64>,
    /// Disable Nagle's algorithm
    pub tcp_nodelay: bool,
    /// HTTP/2 keepalive ping interval in milliseconds (disabled if None)
    pub http2_keepalive_interval_ms: Option<u64>,
    /// How long to wait for a keepalive ping ack in milliseconds
    pub http2_keepalive_timeout_ms: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000, // 10 seconds default
            tcp_keepalive_ms: Some(60_000),
            tcp_nodelay: true,
            http2_keepalive_interval_ms: None,
            http2_keepalive_timeout_ms: None,
        }
    }
}

impl ChannelConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = millis(timeout);
        self
    }

    /// Set or disable TCP keepalive.
    pub fn with_tcp_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.tcp_keepalive_ms = keepalive.map(millis);
        self
    }

    /// Set whether TCP_NODELAY is enabled.
    pub fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }

    /// Enable HTTP/2 keepalive pings at the given interval.
    pub fn with_http2_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.http2_keepalive_interval_ms = Some(millis(interval));
        self.http2_keepalive_timeout_ms = Some(millis(timeout));
        self
    }

    /// Connect timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Build the endpoint URI for an address.
    pub fn endpoint_uri(&self, addr: &Addr) -> String {
        format!("http://{}", addr)
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Transport that can open a transaction stream.
///
/// The returned stream must yield responses in the order the requests were
/// sent and end (or yield a `Cancelled` status) once the request stream
/// finishes or the response stream is dropped. Channel establishment happens
/// in `open_transaction`; a rejected call may surface as the first item of
/// the response stream instead.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a bidirectional transaction stream to `addr`.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if the channel cannot be established or the
    /// service rejects the stream.
    async fn open_transaction(
        &self,
        addr: &Addr,
        requests: RequestStream,
    ) -> Result<ResponseStream, ChannelError>;
}
