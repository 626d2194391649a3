//! Live log streaming out of the control surface's log sink.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use p2p_http_core::log_sink::LineForwarder;

/// Forward sink lines into a bounded channel (SSE/WebSocket pumps, shippers).
///
/// Uses `try_send`: a full or closed channel drops the line and the pushing
/// thread never waits on the consumer.
pub fn channel_forwarder(tx: mpsc::Sender<String>) -> LineForwarder {
    Arc::new(move |line: &str| match tx.try_send(line.to_string()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::debug!("live log consumer lagging, line dropped");
        }
        Err(TrySendError::Closed(_)) => {}
    })
}
