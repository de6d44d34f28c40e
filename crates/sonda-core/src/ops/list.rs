use tracing::{debug, instrument};

use super::Inspector;
use crate::error::ListError;
use crate::message::{PeekedMessage, SequenceNumber};
use crate::queue::{QueueView, SubQueue};

/// Parameters of a single page fetch. Values are normalized, never rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub sub_queue: Option<SubQueue>,
    /// Page size; `<= 0` means the default, values above the cap are clamped.
    pub top: i64,
    pub from_sequence: Option<SequenceNumber>,
    /// Body character limit; `None` or negative means the default, `0`
    /// disables truncation.
    pub max_body: Option<i64>,
}

impl ListRequest {
    pub const DEFAULT_TOP: usize = 50;
    pub const MAX_TOP: usize = 200;
    pub const DEFAULT_MAX_BODY: usize = 2048;

    pub fn page_size(&self) -> usize {
        match usize::try_from(self.top) {
            Ok(0) | Err(_) => Self::DEFAULT_TOP,
            Ok(top) => top.min(Self::MAX_TOP),
        }
    }

    pub fn body_limit(&self) -> usize {
        self.max_body
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(Self::DEFAULT_MAX_BODY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListedMessage {
    pub message: PeekedMessage,
    /// Body text, possibly truncated.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessagePage {
    pub sub_queue: SubQueue,
    pub count: usize,
    /// Watermark for the next page: last item + 1, or the request's
    /// `from_sequence` when the page is empty.
    pub next_sequence_number: Option<SequenceNumber>,
    pub items: Vec<ListedMessage>,
}

/// Appended to bodies cut at the character limit.
pub const TRUNCATION_MARKER: &str = "...";

/// Keep the first `max_chars` characters of `text`, followed by the marker.
/// `max_chars == 0` disables truncation.
pub fn truncate_body(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

impl Inspector {
    /// Fetch one bounded page of messages. No matching and no looping: the
    /// caller drives pagination with `next_sequence_number`.
    #[instrument(skip_all, fields(top = request.top, from = ?request.from_sequence))]
    pub fn list_messages(&self, request: &ListRequest) -> Result<MessagePage, ListError> {
        let sub_queue = request.sub_queue.unwrap_or(SubQueue::Active);
        let queue = self.queue().map_err(ListError::Configuration)?;
        let view = QueueView::new(queue, sub_queue);
        let body_limit = request.body_limit();

        let batch = self
            .scanner()
            .page(&view, request.page_size(), request.from_sequence)?;

        let next_sequence_number = batch
            .last()
            .map(|m| m.sequence_number.saturating_add(1))
            .or(request.from_sequence);

        let items: Vec<ListedMessage> = batch
            .into_iter()
            .map(|message| {
                let body = truncate_body(&message.body_text(), body_limit);
                ListedMessage { message, body }
            })
            .collect();

        debug!(%view, count = items.len(), ?next_sequence_number, "page fetched");
        Ok(MessagePage {
            sub_queue,
            count: items.len(),
            next_sequence_number,
            items,
        })
    }
}
