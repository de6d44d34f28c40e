use sonda_core::{PeekedMessage, SubQueue};
use sonda_proto::MessageInfo;

pub fn sub_queue_from_proto(value: sonda_proto::SubQueue) -> SubQueue {
    match value {
        sonda_proto::SubQueue::Active => SubQueue::Active,
        sonda_proto::SubQueue::DeadLetter => SubQueue::DeadLetter,
    }
}

pub fn sub_queue_to_proto(value: SubQueue) -> i32 {
    match value {
        SubQueue::Active => sonda_proto::SubQueue::Active as i32,
        SubQueue::DeadLetter => sonda_proto::SubQueue::DeadLetter as i32,
    }
}

/// Build the wire snapshot of `message`, carrying `body` as rendered by the
/// operation (pretty JSON, raw text or truncated text).
pub fn message_info(message: PeekedMessage, body: String) -> MessageInfo {
    MessageInfo {
        sequence_number: message.sequence_number,
        message_id: message.message_id,
        correlation_id: message.correlation_id.unwrap_or_default(),
        session_id: message.session_id.unwrap_or_default(),
        content_type: message.content_type.unwrap_or_default(),
        subject: message.subject.unwrap_or_default(),
        properties: message
            .properties
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect(),
        enqueued_at_ms: message.enqueued_at,
        locked_until_ms: message.locked_until.unwrap_or_default(),
        expires_at_ms: message.expires_at.unwrap_or_default(),
        scheduled_enqueue_at_ms: message.scheduled_enqueue_at.unwrap_or_default(),
        delivery_count: message.delivery_count,
        dead_letter_reason: message.dead_letter_reason.unwrap_or_default(),
        dead_letter_description: message.dead_letter_description.unwrap_or_default(),
        body,
    }
}
