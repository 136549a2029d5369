//! Transaction session over one bidirectional stream.
//!
//! A `Transaction` owns one streaming call to the server. The connect
//! handshake goes out first; after that every request gets exactly one
//! response, in order, so a response is matched to its request by position
//! alone. `submit` takes `&mut self`, which keeps at most one request
//! outstanding per transaction.

use crate::connection::params::{Addr, ConnectionMode};
use crate::connection::pump::{self, HandoffEntry};
use crate::error::{ChannelError, GduckError, Result, SessionError};
use crate::query::{request, results};
use crate::transport::messages::{self as proto, response::QueryResult};
use crate::transport::Transport;
use crate::types::{ParquetLocation, Rows, ToScalar, Value};
use futures_util::{future, stream, StreamExt};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, info_span, warn, Instrument};

/// Transaction lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Created but `open()` has not succeeded yet
    Unopened,

    /// Stream is established and accepts requests
    Open,

    /// Closed; terminal
    Closed,
}

impl TransactionState {
    /// Check if the transaction accepts requests.
    pub fn is_open(&self) -> bool {
        matches!(self, TransactionState::Open)
    }
}

/// Outbound queue item.
#[derive(Debug)]
enum Outbound {
    Request(proto::Request),
    /// Ends the request stream
    EndStream,
}

/// A transaction on a gduck server.
///
/// Created unopened by [`Connection::transaction`](crate::Connection::transaction).
/// Dropping an open transaction tears the stream down; call [`close`](Self::close)
/// to wait for the teardown to finish.
pub struct Transaction {
    addr: Addr,
    database_file: String,
    mode: ConnectionMode,
    transport: Arc<dyn Transport>,
    state: TransactionState,

    /// Outbound request queue (sender side)
    outbound: Option<mpsc::UnboundedSender<Outbound>>,

    /// Handoff queue filled by the response pump
    handoff: Option<mpsc::UnboundedReceiver<HandoffEntry>>,

    pump: Option<JoinHandle<()>>,

    /// A request was sent and its response not yet taken off the handoff queue
    in_flight: bool,

    /// The channel failed; no further requests are possible
    poisoned: bool,

    query_count: u64,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("addr", &self.addr)
            .field("database_file", &self.database_file)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("poisoned", &self.poisoned)
            .field("query_count", &self.query_count)
            .finish()
    }
}

impl Transaction {
    pub(crate) fn new(
        addr: Addr,
        database_file: String,
        mode: ConnectionMode,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            addr,
            database_file,
            mode,
            transport,
            state: TransactionState::Unopened,
            outbound: None,
            handoff: None,
            pump: None,
            in_flight: false,
            poisoned: false,
            query_count: 0,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn addr(&self) -> &Addr {
        &self.addr
    }

    pub fn database_file(&self) -> &str {
        &self.database_file
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Number of submitted requests that have received their response.
    pub fn query_count(&self) -> u64 {
        self.query_count
    }

    /// Open the stream and send the connect handshake.
    ///
    /// # Errors
    /// `SessionError::AlreadyOpen` or `SessionError::Closed` if not unopened;
    /// `ChannelError` if the channel cannot be established, in which case the
    /// transaction is closed.
    pub async fn open(&mut self) -> Result<()> {
        match self.state {
            TransactionState::Unopened => {}
            TransactionState::Open => return Err(SessionError::AlreadyOpen.into()),
            TransactionState::Closed => return Err(SessionError::Closed.into()),
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let connect = request::connect(&self.database_file, self.mode);
        let queued = UnboundedReceiverStream::new(outbound_rx).scan((), |_, item| {
            future::ready(match item {
                Outbound::Request(request) => Some(request),
                Outbound::EndStream => None,
            })
        });
        let requests = stream::once(future::ready(connect)).chain(queued).boxed();

        let responses = match self.transport.open_transaction(&self.addr, requests).await {
            Ok(responses) => responses,
            Err(e) => {
                warn!(addr = %self.addr, database_file = %self.database_file, error = %e, "failed to open transaction");
                self.state = TransactionState::Closed;
                return Err(e.into());
            }
        };

        let (handoff_tx, handoff_rx) = mpsc::unbounded_channel();
        let span = info_span!(
            "response_pump",
            addr = %self.addr,
            database_file = %self.database_file
        );
        self.pump = Some(tokio::spawn(
            pump::run(responses, handoff_tx).instrument(span),
        ));
        self.outbound = Some(outbound_tx);
        self.handoff = Some(handoff_rx);
        self.state = TransactionState::Open;

        info!(
            addr = %self.addr,
            database_file = %self.database_file,
            mode = %self.mode,
            "transaction opened"
        );
        Ok(())
    }

    /// Send one request and wait for its response.
    ///
    /// Returns the raw success payload. A future dropped before completion
    /// leaves its response in flight; the next call discards it first.
    ///
    /// # Errors
    /// `SessionError` if not open; `ServerError` if the server rejected the
    /// request; `ChannelError` if the channel failed, after which the
    /// transaction is poisoned; `ProtocolViolation` for a malformed response.
    pub async fn submit(&mut self, query: proto::Query) -> Result<QueryResult> {
        match self.state {
            TransactionState::Unopened => return Err(SessionError::NotOpen.into()),
            TransactionState::Closed => return Err(SessionError::Closed.into()),
            TransactionState::Open => {}
        }
        if self.poisoned {
            return Err(ChannelError::Poisoned.into());
        }

        if self.in_flight {
            match self.receive().await {
                Ok(_) | Err(GduckError::Server(_)) | Err(GduckError::Protocol(_)) => {
                    debug!(query_count = self.query_count, "discarded orphaned response");
                }
                Err(e) => return Err(e),
            }
        }

        let kind = query.kind_name();
        let outbound = self.outbound.as_ref().ok_or(SessionError::Closed)?;
        if outbound.send(Outbound::Request(query.into())).is_err() {
            return Err(self.request_stream_gone());
        }
        self.in_flight = true;

        let result = self.receive().await;
        self.query_count += 1;
        debug!(
            kind,
            query_count = self.query_count,
            ok = result.is_ok(),
            "request completed"
        );
        result
    }

    /// Run a statement for its side effects.
    pub fn execute<'a>(
        &'a mut self,
        sql: &str,
        params: &[&dyn ToScalar],
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        let query = request::execute(sql, params);
        async move {
            let result = self.submit(query?).await?;
            Ok(results::expect_ok(result)?)
        }
    }

    /// Run a query returning a single value.
    pub fn query_value<'a>(
        &'a mut self,
        sql: &str,
        params: &[&dyn ToScalar],
    ) -> impl Future<Output = Result<Value>> + Send + 'a {
        let query = request::value(sql, params);
        async move {
            let result = self.submit(query?).await?;
            let scalar = results::expect_value(result)?;
            Ok(results::parse_value(&scalar)?)
        }
    }

    /// Run a query returning rows.
    pub fn query_rows<'a>(
        &'a mut self,
        sql: &str,
        params: &[&dyn ToScalar],
    ) -> impl Future<Output = Result<Rows>> + Send + 'a {
        let query = request::rows(sql, params);
        async move {
            let result = self.submit(query?).await?;
            let rows = results::expect_rows(result)?;
            Ok(results::parse_rows(&rows)?)
        }
    }

    /// Create `table_name` from the result of a query.
    pub fn ctas<'a>(
        &'a mut self,
        table_name: &str,
        sql: &str,
        params: &[&dyn ToScalar],
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        let query = request::ctas(table_name, sql, params);
        async move {
            let result = self.submit(query?).await?;
            Ok(results::expect_ok(result)?)
        }
    }

    /// Export the result of a query to a parquet file on the server.
    pub fn local_parquet<'a>(
        &'a mut self,
        path: impl AsRef<Path>,
        sql: &str,
        params: &[&dyn ToScalar],
    ) -> impl Future<Output = Result<ParquetLocation>> + Send + 'a {
        let query = request::parquet(request::local_file(path), sql, params);
        async move {
            let result = self.submit(query?).await?;
            let location = results::expect_location(result)?;
            Ok(results::parse_location(&location)?)
        }
    }

    /// Close the transaction.
    ///
    /// Ends the request stream, cancels the call and waits for the response
    /// pump to stop. Safe to call in any state and more than once.
    ///
    /// # Errors
    /// `ChannelError::Shutdown` if the response pump failed while stopping.
    pub async fn close(&mut self) -> Result<()> {
        let was_open = self.state.is_open();
        self.state = TransactionState::Closed;

        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::EndStream);
        }
        self.handoff = None;

        if let Some(pump) = self.pump.take() {
            pump.abort();
            match pump.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(ChannelError::Shutdown(e.to_string()).into()),
            }
        }

        if was_open {
            info!(
                addr = %self.addr,
                database_file = %self.database_file,
                query_count = self.query_count,
                "transaction closed"
            );
        }
        Ok(())
    }

    /// Take the next entry off the handoff queue.
    async fn receive(&mut self) -> Result<QueryResult> {
        let handoff = self.handoff.as_mut().ok_or(SessionError::Closed)?;
        let entry = handoff.recv().await;
        self.in_flight = false;

        match entry {
            Some(Ok(result)) => Ok(result),
            Some(Err(e)) => {
                if matches!(e, GduckError::Channel(_)) {
                    self.poisoned = true;
                }
                Err(e)
            }
            None => {
                self.poisoned = true;
                Err(ChannelError::StreamEnded.into())
            }
        }
    }

    /// The transport dropped the request stream: report whatever the pump
    /// already saw, or a generic stream end.
    fn request_stream_gone(&mut self) -> GduckError {
        self.poisoned = true;
        match self.handoff.as_mut().map(|h| h.try_recv()) {
            Some(Ok(Err(e))) => e,
            _ => ChannelError::StreamEnded.into(),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::EndStream);
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}
