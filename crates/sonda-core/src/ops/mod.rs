//! Externally invokable operations. `Inspector` runs the read-side lookups
//! (find, list, dead-letter requeue) on top of the scan engine; `Publisher`
//! runs the send-side operations.

use std::sync::Arc;

use crate::config::{ScanConfig, SondaConfig};
use crate::metrics::Metrics;
use crate::scan::QueueScanner;
use crate::transport::QueueTransport;

mod find;
mod list;
mod publish;
mod requeue;
mod session;

#[cfg(test)]
mod tests;

pub use find::{FindOutcome, FoundMessage};
pub use list::{ListRequest, ListedMessage, MessagePage};
pub use publish::{ScheduleReceipt, SendOptions, SendReceipt};
pub use requeue::{RequeueOutcome, RequeueReceipt};
pub use session::SessionReceipt;

/// Returns the configured queue name, or the message for a configuration error.
fn configured<'a>(name: &'a str, key: &str) -> Result<&'a str, String> {
    if name.trim().is_empty() {
        return Err(format!("transport.{key} is not configured"));
    }
    Ok(name)
}

/// Read-side operations over the configured queue and its dead-letter
/// sub-queue. Holds no per-request state; one instance serves every request.
pub struct Inspector {
    transport: Arc<dyn QueueTransport>,
    queue_name: String,
    scan: ScanConfig,
    metrics: Metrics,
}

impl Inspector {
    pub fn new(transport: Arc<dyn QueueTransport>, config: &SondaConfig) -> Self {
        Self {
            transport,
            queue_name: config.transport.queue_name.clone(),
            scan: config.scan.clone(),
            metrics: Metrics::new(),
        }
    }

    /// Replace the instruments, e.g. with ones bound to a test meter.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    fn queue(&self) -> Result<&str, String> {
        configured(&self.queue_name, "queue_name")
    }

    fn scanner(&self) -> QueueScanner<'_> {
        QueueScanner::new(self.transport.as_ref(), &self.metrics)
    }
}

/// Send-side operations: order publishing, scheduling and sessions.
pub struct Publisher {
    transport: Arc<dyn QueueTransport>,
    queue_name: String,
    session_queue_name: String,
    order_path: String,
    order_attribute: String,
    metrics: Metrics,
}

impl Publisher {
    pub fn new(transport: Arc<dyn QueueTransport>, config: &SondaConfig) -> Self {
        Self {
            transport,
            queue_name: config.transport.queue_name.clone(),
            session_queue_name: config.transport.session_queue_name.clone(),
            order_path: config.scan.order_body_path.clone(),
            order_attribute: config.scan.order_attribute.clone(),
            metrics: Metrics::new(),
        }
    }

    /// Replace the instruments, e.g. with ones bound to a test meter.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    fn queue(&self) -> Result<&str, String> {
        configured(&self.queue_name, "queue_name")
    }

    fn session_queue(&self) -> Result<&str, String> {
        configured(&self.session_queue_name, "session_queue_name")
    }
}
