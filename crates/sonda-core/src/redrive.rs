use crate::message::{OutboundMessage, PeekedMessage};

impl OutboundMessage {
    /// Build a new outbound message duplicating `message` for redelivery.
    ///
    /// Body bytes and every custom property are copied verbatim, together
    /// with content type, correlation id, message id, subject and session id.
    /// Sequence number, timestamps, lock state, delivery count and
    /// dead-letter details are transport-assigned and are not carried over.
    pub fn requeue_of(message: &PeekedMessage) -> Self {
        Self {
            body: message.body.clone(),
            content_type: message.content_type.clone(),
            correlation_id: message.correlation_id.clone(),
            message_id: Some(message.message_id.clone()),
            subject: message.subject.clone(),
            session_id: message.session_id.clone(),
            properties: message.properties.clone(),
            time_to_live_ms: None,
        }
    }
}
