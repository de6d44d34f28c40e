use chrono::{Local, SecondsFormat, Utc};
use tracing::{info, instrument};

use super::Publisher;
use crate::error::PublishError;
use crate::message::{now_ms, OutboundMessage, SequenceNumber};
use crate::scan::try_extract_field;

const JSON_CONTENT_TYPE: &str = "application/json";
const ORDER_SUBJECT: &str = "Order";

/// Optional knobs of an enriched send. Non-positive values mean "unset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub ttl_seconds: i64,
    pub schedule_in_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendReceipt {
    Sent {
        message_id: String,
        sequence_number: SequenceNumber,
        ttl_seconds: Option<u64>,
    },
    Scheduled {
        message_id: String,
        sequence_number: SequenceNumber,
        /// Unix-epoch milliseconds.
        scheduled_enqueue_at: u64,
        ttl_seconds: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleReceipt {
    pub sequence_number: SequenceNumber,
    pub scheduled_enqueue_at: u64,
}

fn require_body(body: &str) -> Result<(), PublishError> {
    if body.trim().is_empty() {
        return Err(PublishError::Validation("a JSON body is required".to_string()));
    }
    Ok(())
}

fn parse_json(body: &str) -> Result<serde_json::Value, PublishError> {
    require_body(body)?;
    serde_json::from_str(body)
        .map_err(|e| PublishError::Validation(format!("body is not valid JSON: {e}")))
}

fn positive(value: i64) -> Option<u64> {
    u64::try_from(value).ok().filter(|v| *v > 0)
}

impl Publisher {
    /// Publish a JSON order body unchanged onto the active queue.
    #[instrument(skip_all)]
    pub fn send_order(&self, body: &str) -> Result<SequenceNumber, PublishError> {
        parse_json(body)?;
        let queue = self.queue().map_err(PublishError::Configuration)?;

        let seq = self.transport.publish(queue, OutboundMessage::new(body))?;
        self.metrics.record_publish(queue);
        info!(%queue, seq, "order sent");
        Ok(seq)
    }

    /// Publish an order stamped with its order number as message id,
    /// correlation id and property, plus creation timestamps. A positive
    /// `schedule_in_seconds` schedules the message instead of sending it.
    #[instrument(skip_all, fields(ttl = options.ttl_seconds, delay = options.schedule_in_seconds))]
    pub fn send_enriched_order(
        &self,
        body: &str,
        options: SendOptions,
    ) -> Result<SendReceipt, PublishError> {
        parse_json(body)?;
        let order_number = try_extract_field(body.as_bytes(), &self.order_path)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                PublishError::Validation(format!("body must include {}", self.order_path))
            })?;
        let queue = self.queue().map_err(PublishError::Configuration)?;

        let ttl_seconds = positive(options.ttl_seconds);
        let mut message = OutboundMessage::new(body).with_content_type(JSON_CONTENT_TYPE);
        message.subject = Some(ORDER_SUBJECT.to_string());
        message.message_id = Some(order_number.clone());
        message.correlation_id = Some(order_number.clone());
        message.time_to_live_ms = ttl_seconds.map(|s| s.saturating_mul(1000));
        message
            .properties
            .insert(self.order_attribute.clone(), order_number.clone().into());
        message.properties.insert(
            "createdAtUtc".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true).into(),
        );
        message.properties.insert(
            "createdAtLocal".to_string(),
            Local::now().to_rfc3339_opts(SecondsFormat::Micros, false).into(),
        );

        let receipt = match positive(options.schedule_in_seconds) {
            Some(delay) => {
                let scheduled_enqueue_at = now_ms().saturating_add(delay.saturating_mul(1000));
                let sequence_number =
                    self.transport
                        .schedule(queue, message, scheduled_enqueue_at)?;
                info!(%queue, order = %order_number, seq = sequence_number, scheduled_enqueue_at, "enriched order scheduled");
                SendReceipt::Scheduled {
                    message_id: order_number,
                    sequence_number,
                    scheduled_enqueue_at,
                    ttl_seconds,
                }
            }
            None => {
                let sequence_number = self.transport.publish(queue, message)?;
                info!(%queue, order = %order_number, seq = sequence_number, "enriched order sent");
                SendReceipt::Sent {
                    message_id: order_number,
                    sequence_number,
                    ttl_seconds,
                }
            }
        };
        self.metrics.record_publish(queue);
        Ok(receipt)
    }

    /// Publish `body` so that it becomes deliverable `schedule_in_seconds`
    /// from now.
    #[instrument(skip_all, fields(delay = schedule_in_seconds))]
    pub fn schedule_send(
        &self,
        body: &str,
        schedule_in_seconds: i64,
    ) -> Result<ScheduleReceipt, PublishError> {
        require_body(body)?;
        let delay = positive(schedule_in_seconds).ok_or_else(|| {
            PublishError::Validation("schedule_in_seconds must be greater than zero".to_string())
        })?;
        let queue = self.queue().map_err(PublishError::Configuration)?;

        let scheduled_enqueue_at = now_ms().saturating_add(delay.saturating_mul(1000));
        let message = OutboundMessage::new(body).with_content_type(JSON_CONTENT_TYPE);
        let sequence_number = self.transport.schedule(queue, message, scheduled_enqueue_at)?;
        self.metrics.record_publish(queue);

        info!(%queue, seq = sequence_number, scheduled_enqueue_at, "message scheduled");
        Ok(ScheduleReceipt {
            sequence_number,
            scheduled_enqueue_at,
        })
    }
}
