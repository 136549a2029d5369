//! Connections and transactions.
//!
//! A `Connection` is a cheap, cloneable factory for transactions against one
//! server. Each `Transaction` owns its own stream.
//!
//! # Example
//!
//! ```no_run
//! use gduck_client::connection::{Connection, ConnectionMode};
//! use gduck_client::params;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = Connection::new("localhost:50051")?;
//!
//! let mut txn = connection.begin(":memory:", ConnectionMode::ReadWrite).await?;
//! txn.execute("CREATE TABLE t (id INTEGER)", params![]).await?;
//! txn.execute("INSERT INTO t VALUES (?)", params![42]).await?;
//! let count = txn.query_value("SELECT count(*) FROM t", params![]).await?;
//! txn.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod params;
mod pump;
pub mod session;

pub use params::{Addr, ConnectionMode};
pub use session::{Transaction, TransactionState};

use crate::error::Result;
use crate::transport::{ChannelConfig, GrpcTransport, Transport};
use std::sync::Arc;

/// Factory for transactions against one gduck server.
#[derive(Clone)]
pub struct Connection {
    addr: Addr,
    config: ChannelConfig,
    transport: Arc<dyn Transport>,
    custom_transport: bool,
}

impl Connection {
    /// Create a connection to `addr` (`host:port`) with default settings.
    ///
    /// No I/O happens until a transaction is opened.
    pub fn new(addr: &str) -> Result<Self> {
        Ok(Self::from_addr(addr.parse()?))
    }

    /// Create a connection to a parsed address.
    pub fn from_addr(addr: Addr) -> Self {
        let config = ChannelConfig::default();
        Self {
            addr,
            transport: Arc::new(GrpcTransport::new(config.clone())),
            config,
            custom_transport: false,
        }
    }

    /// Use custom channel settings.
    ///
    /// The settings apply to the built-in gRPC transport. A transport set
    /// with [`with_transport`](Self::with_transport) is kept as is, in
    /// either order.
    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        if !self.custom_transport {
            self.transport = Arc::new(GrpcTransport::new(config.clone()));
        }
        self.config = config;
        self
    }

    /// Use a custom transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self.custom_transport = true;
        self
    }

    pub fn addr(&self) -> &Addr {
        &self.addr
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Create an unopened transaction on `database_file`.
    ///
    /// `":memory:"` selects an in-memory database.
    pub fn transaction(&self, database_file: &str, mode: ConnectionMode) -> Transaction {
        Transaction::new(
            self.addr.clone(),
            database_file.to_string(),
            mode,
            Arc::clone(&self.transport),
        )
    }

    /// Create and open a transaction on `database_file`.
    pub async fn begin(&self, database_file: &str, mode: ConnectionMode) -> Result<Transaction> {
        let mut txn = self.transaction(database_file, mode);
        txn.open().await?;
        Ok(txn)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("addr", &self.addr)
            .field("config", &self.config)
            .field("transport", &"<Transport>")
            .field("custom_transport", &self.custom_transport)
            .finish()
    }
}
