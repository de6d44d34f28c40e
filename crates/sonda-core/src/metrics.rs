use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;

use crate::queue::QueueView;

/// OTel instruments for scans and publishes. Created once per `Inspector` /
/// `Publisher` and shared by every operation they run.
pub struct Metrics {
    pub messages_peeked: Counter<u64>,
    pub scans: Counter<u64>,
    pub messages_requeued: Counter<u64>,
    pub messages_published: Counter<u64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create metrics from the global meter provider. If no meter provider
    /// is configured, the instruments are no-op.
    pub fn new() -> Self {
        let meter = opentelemetry::global::meter("sonda");
        Self::from_meter(&meter)
    }

    /// Create metrics from a specific meter (used in tests with in-memory exporter).
    pub fn from_meter(meter: &Meter) -> Self {
        Self {
            messages_peeked: meter
                .u64_counter("sonda.messages.peeked")
                .with_description("Messages returned by peek calls")
                .build(),
            scans: meter
                .u64_counter("sonda.scans")
                .with_description("Completed scans by terminal outcome")
                .build(),
            messages_requeued: meter
                .u64_counter("sonda.messages.requeued")
                .with_description("Dead-lettered messages copied back onto the active queue")
                .build(),
            messages_published: meter
                .u64_counter("sonda.messages.published")
                .with_description("Messages published or scheduled")
                .build(),
        }
    }

    fn view_attrs(view: &QueueView) -> [KeyValue; 2] {
        [
            KeyValue::new("queue", view.queue.clone()),
            KeyValue::new("sub_queue", view.sub_queue.label()),
        ]
    }

    pub fn record_peek(&self, view: &QueueView, count: usize) {
        self.messages_peeked
            .add(u64::try_from(count).unwrap_or(u64::MAX), &Self::view_attrs(view));
    }

    pub fn record_scan(&self, view: &QueueView, outcome: &'static str) {
        let [queue, sub_queue] = Self::view_attrs(view);
        self.scans
            .add(1, &[queue, sub_queue, KeyValue::new("outcome", outcome)]);
    }

    pub fn record_requeue(&self, queue: &str) {
        self.messages_requeued
            .add(1, &[KeyValue::new("queue", queue.to_string())]);
    }

    pub fn record_publish(&self, queue: &str) {
        self.messages_published
            .add(1, &[KeyValue::new("queue", queue.to_string())]);
    }
}
