use tracing::{info, instrument};

use super::Publisher;
use crate::error::SessionError;
use crate::message::{OutboundMessage, SequenceNumber};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReceipt {
    pub session_id: String,
    pub sequence_number: SequenceNumber,
}

fn require(value: &str, what: &str) -> Result<(), SessionError> {
    if value.trim().is_empty() {
        return Err(SessionError::Validation(format!("{what} is required")));
    }
    Ok(())
}

impl Publisher {
    /// Publish `body` onto the session queue, tagged with `session_id`.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub fn send_session_message(
        &self,
        session_id: &str,
        body: &str,
    ) -> Result<SessionReceipt, SessionError> {
        require(session_id, "session id")?;
        require(body, "body")?;
        let queue = self.session_queue().map_err(SessionError::Configuration)?;

        let mut message = OutboundMessage::new(body).with_content_type("application/json");
        message.session_id = Some(session_id.to_string());
        let sequence_number = self.transport.publish(queue, message)?;
        self.metrics.record_publish(queue);

        info!(%queue, seq = sequence_number, "session message sent");
        Ok(SessionReceipt {
            session_id: session_id.to_string(),
            sequence_number,
        })
    }

    /// Take the lock on `session_id` and release it straight away. Fails
    /// while another receiver holds the session.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub fn close_session(&self, session_id: &str) -> Result<(), SessionError> {
        require(session_id, "session id")?;
        let queue = self.session_queue().map_err(SessionError::Configuration)?;

        let handle = self.transport.accept_session(queue, session_id)?;
        self.transport.close_session(handle)?;

        info!(%queue, "session closed");
        Ok(())
    }
}
