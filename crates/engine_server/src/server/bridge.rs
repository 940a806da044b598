//! Engine output fan-out.
//!
//! One task drains the engine output queue and hands every line to the
//! connection manager, in the order the engine printed them.

use crate::connection::ConnectionManager;
use crate::intelligence::IntelligenceBridge;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Forwards engine output to subscribers until the output queue closes.
///
/// Every line is broadcast verbatim. With intelligence enabled, a line that
/// closes a search is followed by one extra re-ranking summary line.
pub async fn run_output_bridge(
    mut output: mpsc::Receiver<String>,
    connections: Arc<ConnectionManager>,
    intelligence: Option<Arc<IntelligenceBridge>>,
) {
    while let Some(line) = output.recv().await {
        let delivered = connections.broadcast_to_subscribers(&line).await;
        trace!("Engine line delivered to {} subscribers", delivered);

        if let Some(intelligence) = &intelligence {
            if let Some(extra) = intelligence.observe_output(&line).await {
                connections.broadcast_to_subscribers(&extra).await;
            }
        }
    }
    debug!("Engine output bridge finished");
}
