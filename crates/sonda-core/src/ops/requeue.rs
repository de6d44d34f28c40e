use tracing::{debug, info, instrument};

use super::Inspector;
use crate::error::RequeueError;
use crate::message::{OutboundMessage, SequenceNumber};
use crate::queue::QueueView;
use crate::scan::{LookupQuery, MatchPredicate, ScanOutcome};

/// Confirmation of a redrive. The dead-lettered original is left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequeueReceipt {
    pub message_id: String,
    pub original_sequence: SequenceNumber,
    pub session_id: Option<String>,
    /// Sequence number the copy received on the active queue.
    pub new_sequence: SequenceNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequeueOutcome {
    Requeued(RequeueReceipt),
    NotFound { max_to_scan: usize },
}

impl Inspector {
    /// Find a dead-lettered message and publish a copy of it onto the active
    /// queue. The copy is published at most once per call; the original is
    /// never removed from the dead-letter sub-queue.
    #[instrument(skip_all, fields(max_to_scan = max_to_scan))]
    pub fn requeue_from_dead_letter(
        &self,
        query: &LookupQuery,
        max_to_scan: i64,
    ) -> Result<RequeueOutcome, RequeueError> {
        let predicate = MatchPredicate::from_query(query, &self.scan.order_field())?;
        let queue = self.queue().map_err(RequeueError::Configuration)?;
        let view = QueueView::dead_letter(queue);
        let limits = self.scan.limits(max_to_scan);

        let message = match self.scanner().scan(&view, &predicate, limits)? {
            ScanOutcome::Matched { message, .. } => message,
            ScanOutcome::Exhausted | ScanOutcome::Empty => {
                debug!(%view, max = limits.max_to_scan(), "no dead-lettered message to requeue");
                return Ok(RequeueOutcome::NotFound {
                    max_to_scan: limits.max_to_scan(),
                });
            }
        };

        let new_sequence = self
            .transport
            .publish(queue, OutboundMessage::requeue_of(&message))?;
        self.metrics.record_requeue(queue);

        info!(
            %queue,
            message_id = %message.message_id,
            original_sequence = message.sequence_number,
            new_sequence,
            "dead-lettered message requeued"
        );

        Ok(RequeueOutcome::Requeued(RequeueReceipt {
            message_id: message.message_id,
            original_sequence: message.sequence_number,
            session_id: message.session_id,
            new_sequence,
        }))
    }
}
