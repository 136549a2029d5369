//! In-process gduck gRPC server.
//!
//! `TestServer` binds `127.0.0.1:0` and serves `gduck.DbService` with the
//! same handler closures as [`StubTransport`](super::stub::StubTransport),
//! so tests can run the real `GrpcTransport` end to end. Like gduck it reads
//! the `Connect` message before sending response headers, reports a failed
//! handshake as the call's status and ends a finished stream with an OK
//! status.

use super::stub::{fake_database, send_reply, Handler, Reply};
use futures_util::Stream;
use gduck_client::transport::messages::db_service_server::{DbService, DbServiceServer};
use gduck_client::transport::messages::{self as proto, request};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{TcpListenerStream, UnboundedReceiverStream};
use tonic::transport::Server;
use tonic::{Status, Streaming};

/// Database file the server refuses to open.
pub const FORBIDDEN_DATABASE: &str = "forbidden.duckdb";

#[derive(Clone)]
struct Service {
    handler: Handler,
    hold_headers: bool,
    connects: Arc<Mutex<Vec<proto::Connect>>>,
    queries: Arc<Mutex<Vec<proto::Query>>>,
    finished: Arc<AtomicUsize>,
}

type ResponseStream = Pin<Box<dyn Stream<Item = Result<proto::Response, Status>> + Send>>;

#[tonic::async_trait]
impl DbService for Service {
    type TransactionStream = ResponseStream;

    async fn transaction(
        &self,
        request: tonic::Request<Streaming<proto::Request>>,
    ) -> Result<tonic::Response<Self::TransactionStream>, Status> {
        let mut requests = request.into_inner();

        let connect = match requests.message().await? {
            Some(proto::Request {
                message: Some(request::Message::Connect(connect)),
            }) => connect,
            _ => {
                return Err(Status::internal(
                    "Transaction must begin with Connect message.",
                ))
            }
        };
        if connect.file_name == FORBIDDEN_DATABASE {
            return Err(Status::internal(format!(
                "Cannot open database file {}",
                connect.file_name
            )));
        }
        self.connects.lock().unwrap().push(connect);

        let (tx, rx) = mpsc::unbounded_channel();

        // Answer the first query before the headers go out.
        if self.hold_headers {
            match requests.message().await? {
                Some(proto::Request {
                    message: Some(request::Message::Query(query)),
                }) => {
                    self.queries.lock().unwrap().push(query.clone());
                    send_reply((self.handler)(&query), &tx).await;
                }
                _ => return Err(Status::internal("Expected a query.")),
            }
        }

        let service = self.clone();
        tokio::spawn(async move {
            service.serve(requests, tx).await;
            service.finished.fetch_add(1, Ordering::SeqCst);
        });

        Ok(tonic::Response::new(
            Box::pin(UnboundedReceiverStream::new(rx)) as Self::TransactionStream
        ))
    }
}

impl Service {
    async fn serve(
        &self,
        mut requests: Streaming<proto::Request>,
        responses: mpsc::UnboundedSender<Result<proto::Response, Status>>,
    ) {
        loop {
            let next = tokio::select! {
                next = requests.message() => next,
                _ = responses.closed() => return,
            };

            let query = match next {
                Ok(Some(proto::Request {
                    message: Some(request::Message::Query(query)),
                })) => query,
                Ok(Some(_)) => {
                    let _ = responses.send(Err(Status::internal(
                        "Unknown type of request received.",
                    )));
                    return;
                }
                Ok(None) => {
                    let _ = responses.send(Err(Status::ok("Completed successfully.")));
                    return;
                }
                // Client went away
                Err(_) => return,
            };
            self.queries.lock().unwrap().push(query.clone());

            if !send_reply((self.handler)(&query), &responses).await {
                return;
            }
        }
    }
}

/// A running in-process server.
pub struct TestServer {
    addr: SocketAddr,
    service: Service,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Serve every query with `handler`.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&proto::Query) -> Reply + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(handler), false).await
    }

    /// A server backed by [`fake_database`].
    pub async fn database() -> Self {
        Self::start(fake_database).await
    }

    /// A [`fake_database`] server that sends response headers only after
    /// answering the first query.
    pub async fn holding_headers() -> Self {
        Self::spawn(Arc::new(fake_database), true).await
    }

    async fn spawn(handler: Handler, hold_headers: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("test server address");

        let service = Service {
            handler,
            hold_headers,
            connects: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
            finished: Arc::new(AtomicUsize::new(0)),
        };
        let router = Server::builder().add_service(DbServiceServer::new(service.clone()));
        let task = tokio::spawn(async move {
            router
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .expect("test server failed");
        });

        Self {
            addr,
            service,
            task,
        }
    }

    /// `host:port` of the listening socket.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Handshakes accepted so far.
    pub fn connects(&self) -> Vec<proto::Connect> {
        self.service.connects.lock().unwrap().clone()
    }

    /// Queries received so far, in arrival order.
    pub fn queries(&self) -> Vec<proto::Query> {
        self.service.queries.lock().unwrap().clone()
    }

    /// Number of accepted transaction streams that have finished.
    pub fn finished(&self) -> usize {
        self.service.finished.load(Ordering::SeqCst)
    }

    /// Wait until `count` streams have finished, or panic after `timeout`.
    pub async fn wait_finished(&self, count: usize, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            while self.finished() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("server-side transaction stream was not torn down");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
