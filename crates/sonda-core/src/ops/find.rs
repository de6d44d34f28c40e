use tracing::{debug, instrument};

use super::Inspector;
use crate::error::FindError;
use crate::message::PeekedMessage;
use crate::queue::{QueueView, SubQueue};
use crate::scan::{LookupQuery, Match, MatchPredicate, ScanOutcome};

/// A located message with its full metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundMessage {
    pub location: SubQueue,
    pub message: PeekedMessage,
    /// Re-serialized JSON when the match came from the structured body,
    /// otherwise the raw body text.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FindOutcome {
    Found(FoundMessage),
    NotFound { view: QueueView, max_to_scan: usize },
}

impl Inspector {
    /// Locate the first message of `sub_queue` matching `query`, scanning at
    /// most `max_to_scan` messages (non-positive means the configured default).
    #[instrument(skip_all, fields(sub_queue = %sub_queue, max_to_scan = max_to_scan))]
    pub fn find_message(
        &self,
        sub_queue: SubQueue,
        query: &LookupQuery,
        max_to_scan: i64,
    ) -> Result<FindOutcome, FindError> {
        let predicate = MatchPredicate::from_query(query, &self.scan.order_field())?;
        let queue = self.queue().map_err(FindError::Configuration)?;
        let view = QueueView::new(queue, sub_queue);
        let limits = self.scan.limits(max_to_scan);

        match self.scanner().scan(&view, &predicate, limits)? {
            ScanOutcome::Matched { message, hit } => {
                debug!(%view, seq = message.sequence_number, ?hit, "message found");
                let body = match hit {
                    Match::Body(document) => serde_json::to_string_pretty(&document)
                        .unwrap_or_else(|_| message.body_text().into_owned()),
                    Match::Identifier | Match::Attribute => message.body_text().into_owned(),
                };
                Ok(FindOutcome::Found(FoundMessage {
                    location: sub_queue,
                    message,
                    body,
                }))
            }
            ScanOutcome::Exhausted | ScanOutcome::Empty => {
                debug!(%view, max = limits.max_to_scan(), "message not found");
                Ok(FindOutcome::NotFound {
                    view,
                    max_to_scan: limits.max_to_scan(),
                })
            }
        }
    }
}
