//! gRPC transport implementation for gduck.
//!
//! This module opens the `gduck.DbService/Transaction` bidirectional stream
//! over a `tonic` channel.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;
use tracing::{debug, warn};

use crate::connection::params::Addr;
use crate::error::ChannelError;

use super::messages::db_service_client::DbServiceClient;
use super::messages::Response;
use super::protocol::{ChannelConfig, RequestStream, ResponseStream, Transport};

/// gRPC transport.
///
/// Each transaction gets its own channel, owned by a task that drives the
/// call and stops when the returned response stream is dropped.
#[derive(Debug, Clone, Default)]
pub struct GrpcTransport {
    config: ChannelConfig,
}

impl GrpcTransport {
    /// Create a new gRPC transport.
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    /// Channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    fn endpoint(&self, addr: &Addr) -> Result<Endpoint, ChannelError> {
        let uri = self.config.endpoint_uri(addr);
        let mut endpoint =
            Endpoint::from_shared(uri.clone()).map_err(|e| ChannelError::InvalidEndpoint {
                endpoint: uri,
                message: e.to_string(),
            })?;

        endpoint = endpoint
            .connect_timeout(self.config.connect_timeout())
            .tcp_nodelay(self.config.tcp_nodelay)
            .tcp_keepalive(
                self.config
                    .tcp_keepalive_ms
                    .map(std::time::Duration::from_millis),
            );

        if let Some(interval_ms) = self.config.http2_keepalive_interval_ms {
            endpoint = endpoint
                .http2_keep_alive_interval(std::time::Duration::from_millis(interval_ms))
                .keep_alive_while_idle(true);
        }
        if let Some(timeout_ms) = self.config.http2_keepalive_timeout_ms {
            endpoint = endpoint.keep_alive_timeout(std::time::Duration::from_millis(timeout_ms));
        }

        Ok(endpoint)
    }

    async fn connect(&self, addr: &Addr) -> Result<Channel, ChannelError> {
        let endpoint = self.endpoint(addr)?;
        let timeout = self.config.connect_timeout();

        tokio::time::timeout(timeout, endpoint.connect())
            .await
            .map_err(|_| ChannelError::Timeout {
                timeout_ms: self.config.connect_timeout_ms,
            })?
            .map_err(|e| ChannelError::ConnectFailed {
                addr: addr.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    async fn open_transaction(
        &self,
        addr: &Addr,
        requests: RequestStream,
    ) -> Result<ResponseStream, ChannelError> {
        debug!(%addr, "connecting transaction channel");
        let channel = self.connect(addr).await?;

        // The call runs in its own task. Servers may hold back response
        // headers until the first query has been answered, so the caller
        // must not wait for them here.
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(forward(
            DbServiceClient::new(channel),
            requests,
            tx,
            addr.clone(),
        ));

        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

/// Drive one `Transaction` call, forwarding every response item to `tx`.
///
/// The client (and with it the channel) lives until the call ends or the
/// receiving side is dropped; the latter cancels the call.
async fn forward(
    mut client: DbServiceClient<Channel>,
    requests: RequestStream,
    tx: mpsc::UnboundedSender<Result<Response, Status>>,
    addr: Addr,
) {
    let mut responses = tokio::select! {
        started = client.transaction(requests) => match started {
            Ok(response) => response.into_inner(),
            Err(status) => {
                warn!(%addr, code = ?status.code(), "transaction stream rejected");
                let _ = tx.send(Err(status));
                return;
            }
        },
        _ = tx.closed() => {
            debug!(%addr, "response stream dropped before the call started");
            return;
        }
    };

    loop {
        tokio::select! {
            next = responses.message() => match next {
                Ok(Some(response)) => {
                    if tx.send(Ok(response)).is_err() {
                        return;
                    }
                }
                Ok(None) => {
                    debug!(%addr, "transaction stream finished");
                    return;
                }
                Err(status) => {
                    let _ = tx.send(Err(status));
                    return;
                }
            },
            _ = tx.closed() => {
                debug!(%addr, "response stream dropped, cancelling call");
                return;
            }
        }
    }
}
