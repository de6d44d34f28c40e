use uuid::Uuid;

use crate::error::TransportResult;
use crate::message::{OutboundMessage, PeekedMessage, SequenceNumber};
use crate::queue::QueueView;

/// Exclusive hold on one session of a session-enabled queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: Uuid,
    pub queue: String,
    pub session_id: String,
}

/// Queue transport consumed by the scan engine and the publish operations.
/// Implementations must be thread-safe.
pub trait QueueTransport: Send + Sync {
    // --- Read operations ---

    /// Return up to `max` messages of `view` in ascending sequence order,
    /// starting at `from_sequence` (inclusive) or at the head of the view.
    /// Never acquires a lock or changes delivery state.
    fn peek(
        &self,
        view: &QueueView,
        max: usize,
        from_sequence: Option<SequenceNumber>,
    ) -> TransportResult<Vec<PeekedMessage>>;

    // --- Publish operations ---

    /// Publish onto the active sub-queue of `queue`. Returns the assigned
    /// sequence number.
    fn publish(&self, queue: &str, message: OutboundMessage) -> TransportResult<SequenceNumber>;

    /// Publish a message that becomes deliverable at `enqueue_at_ms`.
    fn schedule(
        &self,
        queue: &str,
        message: OutboundMessage,
        enqueue_at_ms: u64,
    ) -> TransportResult<SequenceNumber>;

    // --- Session operations ---

    /// Take the lock on `session_id`. Fails while another handle holds it.
    fn accept_session(&self, queue: &str, session_id: &str) -> TransportResult<SessionHandle>;

    /// Release a session lock taken by `accept_session`.
    fn close_session(&self, handle: SessionHandle) -> TransportResult<()>;
}
