//! In-process stand-in for the gduck service.
//!
//! `StubTransport` answers each query through a handler closure, records
//! everything it receives, and counts the transaction streams it has served
//! to completion. `fake_database` is a handler that behaves like a small
//! gduck instance holding a `videos` table.

use async_trait::async_trait;
use futures_util::StreamExt;
use gduck_client::transport::messages::{self as proto, request, response, scalar_value};
use gduck_client::transport::{RequestStream, ResponseStream, Transport};
use gduck_client::{Addr, ChannelError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// What the stub does with one query.
pub enum Reply {
    /// Send one response
    Respond(proto::Response),
    /// Send one response after a pause
    Delayed(Duration, proto::Response),
    /// Send several responses for a single query
    Burst(Vec<proto::Response>),
    /// Terminate the call with a status
    Fail(tonic::Status),
    /// End the response stream without a status
    Hangup,
    /// Never answer, keep the stream open
    Silent,
}

pub type Handler = Arc<dyn Fn(&proto::Query) -> Reply + Send + Sync>;

pub type Outbound = mpsc::UnboundedSender<Result<proto::Response, tonic::Status>>;

/// Scripted transport serving transactions in-process.
#[derive(Clone)]
pub struct StubTransport {
    handler: Handler,
    refuse: bool,
    drop_requests: bool,
    connects: Arc<Mutex<Vec<proto::Connect>>>,
    queries: Arc<Mutex<Vec<proto::Query>>>,
    finished: Arc<AtomicUsize>,
}

impl StubTransport {
    /// Answer every query with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&proto::Query) -> Reply + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            refuse: false,
            drop_requests: false,
            connects: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
            finished: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A stub backed by [`fake_database`].
    pub fn database() -> Self {
        Self::new(fake_database)
    }

    /// Reject every `open_transaction` call.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::database()
        }
    }

    /// Accept the handshake, then drop both halves of the stream.
    pub fn dropping_requests() -> Self {
        Self {
            drop_requests: true,
            ..Self::database()
        }
    }

    /// Handshakes received so far.
    pub fn connects(&self) -> Vec<proto::Connect> {
        self.connects.lock().unwrap().clone()
    }

    /// Queries received so far, in arrival order.
    pub fn queries(&self) -> Vec<proto::Query> {
        self.queries.lock().unwrap().clone()
    }

    /// Number of transaction streams that have finished.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Wait until `count` streams have finished, or panic after `timeout`.
    pub async fn wait_finished(&self, count: usize, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            while self.finished() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("transaction stream was not torn down");
    }

    async fn serve(&self, mut requests: RequestStream, responses: Outbound) {
        match requests.next().await {
            Some(proto::Request {
                message: Some(request::Message::Connect(connect)),
            }) => self.connects.lock().unwrap().push(connect),
            _ => {
                let _ = responses.send(Err(tonic::Status::invalid_argument(
                    "first message must be connect",
                )));
                return;
            }
        }

        if self.drop_requests {
            return;
        }

        loop {
            let next = tokio::select! {
                next = requests.next() => next,
                _ = responses.closed() => return,
            };

            let query = match next {
                Some(proto::Request {
                    message: Some(request::Message::Query(query)),
                }) => query,
                Some(_) => {
                    let _ = responses.send(Err(tonic::Status::invalid_argument(
                        "expected a query",
                    )));
                    return;
                }
                None => return,
            };
            self.queries.lock().unwrap().push(query.clone());

            if !send_reply((self.handler)(&query), &responses).await {
                return;
            }
        }
    }
}

/// Carry out one [`Reply`] on `responses`. Returns `false` once the stream
/// should stop.
pub async fn send_reply(reply: Reply, responses: &Outbound) -> bool {
    match reply {
        Reply::Respond(response) => responses.send(Ok(response)).is_ok(),
        Reply::Delayed(pause, response) => {
            tokio::time::sleep(pause).await;
            responses.send(Ok(response)).is_ok()
        }
        Reply::Burst(batch) => batch
            .into_iter()
            .all(|response| responses.send(Ok(response)).is_ok()),
        Reply::Fail(status) => {
            let _ = responses.send(Err(status));
            false
        }
        Reply::Hangup => false,
        Reply::Silent => true,
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn open_transaction(
        &self,
        addr: &Addr,
        requests: RequestStream,
    ) -> Result<ResponseStream, ChannelError> {
        if self.refuse {
            return Err(ChannelError::ConnectFailed {
                addr: addr.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let stub = self.clone();
        tokio::spawn(async move {
            stub.serve(requests, tx).await;
            stub.finished.fetch_add(1, Ordering::SeqCst);
        });
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

// ============================================================================
// Response builders
// ============================================================================

pub fn ok() -> proto::Response {
    proto::Response::success(response::QueryResult::ok())
}

pub fn value(kind: scalar_value::Kind) -> proto::Response {
    proto::Response::success(response::QueryResult {
        kind: Some(response::query_result::Kind::Value(scalar(kind))),
    })
}

pub fn rows(
    columns: &[(&str, proto::DataType)],
    rows: Vec<Vec<scalar_value::Kind>>,
) -> proto::Response {
    let schema = proto::Schema {
        columns: columns
            .iter()
            .map(|(name, data_type)| proto::Column {
                name: name.to_string(),
                data_type: *data_type as i32,
            })
            .collect(),
    };
    let rows = rows
        .into_iter()
        .map(|values| proto::Row {
            values: values.into_iter().map(scalar).collect(),
        })
        .collect();

    proto::Response::success(response::QueryResult {
        kind: Some(response::query_result::Kind::Rows(proto::Rows {
            schema: Some(schema),
            rows,
        })),
    })
}

pub fn parquet_file(location: proto::Location) -> proto::Response {
    proto::Response::success(response::QueryResult {
        kind: Some(response::query_result::Kind::ParquetFile(location)),
    })
}

pub fn scalar(kind: scalar_value::Kind) -> proto::ScalarValue {
    proto::ScalarValue { kind: Some(kind) }
}

pub fn int(value: i64) -> scalar_value::Kind {
    scalar_value::Kind::IntValue(value)
}

pub fn string(value: &str) -> scalar_value::Kind {
    scalar_value::Kind::StrValue(value.to_string())
}

pub fn decimal(value: &str) -> scalar_value::Kind {
    scalar_value::Kind::DecimalValue(proto::Decimal {
        value: value.to_string(),
    })
}

pub fn date(year: i32, month: u32, day: u32) -> scalar_value::Kind {
    scalar_value::Kind::DateValue(proto::Date { year, month, day })
}

// ============================================================================
// Fake database
// ============================================================================

/// Error code the fake database reports for statements it does not know.
pub const SYNTAX_ERROR: i32 = 42;

const VIDEOS: [(i64, &str, i64, (i32, u32, u32)); 4] = [
    (1, "intro", 0, (2023, 1, 5)),
    (2, "setup", 3, (2023, 2, 11)),
    (3, "deep dive", 7, (2023, 3, 20)),
    (4, "outro", 2, (2023, 4, 1)),
];

/// Handler behaving like a small gduck instance.
///
/// Statements containing `syntax error` or starting with `SELEC ` are
/// rejected with [`SYNTAX_ERROR`].
pub fn fake_database(query: &proto::Query) -> Reply {
    let sql = query.sql();
    if sql.contains("syntax error") || sql.starts_with("SELEC ") {
        return Reply::Respond(proto::Response::error(SYNTAX_ERROR, "syntax error"));
    }

    let params = query_params(query);
    match &query.kind {
        Some(proto::query::Kind::Execute(_)) | Some(proto::query::Kind::Ctas(_)) => {
            Reply::Respond(ok())
        }
        Some(proto::query::Kind::Value(_)) => match sql {
            "SELECT 1" => Reply::Respond(value(int(1))),
            "SELECT 1.1" => Reply::Respond(value(decimal("1.1"))),
            "SELECT ?" => match params.first().and_then(|p| p.kind.clone()) {
                Some(kind) => Reply::Respond(value(kind)),
                None => Reply::Respond(proto::Response::error(SYNTAX_ERROR, "missing parameter")),
            },
            "SELECT count(*) FROM videos" => Reply::Respond(value(int(VIDEOS.len() as i64))),
            _ => Reply::Respond(value(scalar_value::Kind::NullValue(0))),
        },
        Some(proto::query::Kind::Rows(_)) if sql.starts_with("SELECT * FROM videos") => {
            let min_comments = match params.first().and_then(|p| p.kind.as_ref()) {
                Some(scalar_value::Kind::IntValue(n)) => *n,
                _ => i64::MIN,
            };
            Reply::Respond(videos_where_comments_above(min_comments))
        }
        Some(proto::query::Kind::Rows(_)) => Reply::Respond(rows(&[], Vec::new())),
        Some(proto::query::Kind::Parquet(parquet)) => match &parquet.location {
            Some(location) => Reply::Respond(parquet_file(location.clone())),
            None => Reply::Respond(proto::Response::error(SYNTAX_ERROR, "missing location")),
        },
        None => Reply::Respond(proto::Response::error(SYNTAX_ERROR, "empty query")),
    }
}

fn query_params(query: &proto::Query) -> Vec<proto::ScalarValue> {
    let params = match &query.kind {
        Some(proto::query::Kind::Execute(q)) => &q.params,
        Some(proto::query::Kind::Value(q)) => &q.params,
        Some(proto::query::Kind::Rows(q)) => &q.params,
        Some(proto::query::Kind::Ctas(q)) => &q.params,
        Some(proto::query::Kind::Parquet(q)) => &q.params,
        None => return Vec::new(),
    };
    params.as_ref().map(|p| p.params.clone()).unwrap_or_default()
}

fn videos_where_comments_above(min_comments: i64) -> proto::Response {
    rows(
        &[
            ("id", proto::DataType::DatatypeInt),
            ("title", proto::DataType::DatatypeString),
            ("comment_count", proto::DataType::DatatypeInt),
            ("published", proto::DataType::DatatypeDate),
        ],
        VIDEOS
            .iter()
            .filter(|(_, _, comments, _)| *comments > min_comments)
            .map(|(id, title, comments, (y, m, d))| {
                vec![int(*id), string(title), int(*comments), date(*y, *m, *d)]
            })
            .collect(),
    )
}
