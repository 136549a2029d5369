//! Response pump.
//!
//! A background task that drains a transaction's inbound stream into the
//! handoff queue, one entry per response, in arrival order. It never looks at
//! which operation a response answers; correlation is by order alone.

use crate::error::{ChannelError, GduckError, ProtocolViolation, ServerError};
use crate::transport::messages::response::{self, QueryResult};
use crate::transport::ResponseStream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tonic::Code;
use tracing::{debug, warn};

/// One handoff queue entry: the success payload or the failure for one
/// request.
pub(crate) type HandoffEntry = Result<QueryResult, GduckError>;

/// Drain `responses` into `handoff` until the stream ends, fails, or the
/// receiving session goes away.
pub(crate) async fn run(
    mut responses: ResponseStream,
    handoff: mpsc::UnboundedSender<HandoffEntry>,
) {
    let mut forwarded: u64 = 0;

    loop {
        let item = tokio::select! {
            item = responses.next() => item,
            _ = handoff.closed() => {
                debug!(forwarded, "handoff queue closed, stopping pump");
                return;
            }
        };

        let entry = match item {
            Some(Ok(response)) => match response.result {
                Some(response::Result::Success(result)) => Ok(result),
                Some(response::Result::Error(error)) => {
                    debug!(code = error.code, "server reported an error");
                    Err(ServerError::new(error.code, error.message).into())
                }
                None => Err(ProtocolViolation::MissingResult.into()),
            },
            Some(Err(status)) => match status.code() {
                Code::Cancelled | Code::Ok => {
                    debug!(forwarded, code = ?status.code(), "transaction stream closed");
                    return;
                }
                code => {
                    warn!(forwarded, ?code, message = status.message(), "transaction stream failed");
                    let _ = handoff.send(Err(ChannelError::from(status).into()));
                    return;
                }
            },
            None => {
                debug!(forwarded, "transaction stream finished");
                return;
            }
        };

        if handoff.send(entry).is_err() {
            debug!(forwarded, "handoff queue closed, stopping pump");
            return;
        }
        forwarded += 1;
    }
}
