use super::*;
use crate::config::SondaConfig;
use crate::metrics::test_harness::MetricTestHarness;

pub(super) const QUEUE: &str = "orders";
pub(super) const SESSION_QUEUE: &str = "orders-sessions";

pub(super) fn test_config() -> SondaConfig {
    let mut config = SondaConfig::default();
    config.transport.queue_name = QUEUE.to_string();
    config.transport.session_queue_name = SESSION_QUEUE.to_string();
    config
}

pub(super) fn test_setup() -> (Arc<RocksDbTransport>, Inspector, Publisher, tempfile::TempDir) {
    test_setup_with_config(test_config())
}

pub(super) fn test_setup_with_config(
    config: SondaConfig,
) -> (Arc<RocksDbTransport>, Inspector, Publisher, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RocksDbTransport::open(dir.path()).unwrap());
    let inspector = Inspector::new(transport.clone(), &config);
    let publisher = Publisher::new(transport.clone(), &config);
    (transport, inspector, publisher, dir)
}

/// Same as `test_setup` with an inspector bound to a test meter.
pub(super) fn test_setup_with_metrics() -> (
    Arc<RocksDbTransport>,
    Inspector,
    MetricTestHarness,
    tempfile::TempDir,
) {
    let harness = MetricTestHarness::new();
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RocksDbTransport::open(dir.path()).unwrap());
    let meter = opentelemetry::metrics::MeterProvider::meter(&harness.meter_provider, "ops-test");
    let inspector = Inspector::new(transport.clone(), &test_config())
        .with_metrics(crate::metrics::Metrics::from_meter(&meter));
    (transport, inspector, harness, dir)
}

pub(super) fn order_body(order_number: &str) -> String {
    format!(r#"{{"header":{{"orderNumber":"{order_number}"}},"lines":[{{"sku":"A-1","qty":2}}]}}"#)
}

/// Publish `count` plain messages and return their sequence numbers.
pub(super) fn publish_filler(transport: &RocksDbTransport, count: usize) -> Vec<u64> {
    (0..count)
        .map(|i| {
            transport
                .publish(QUEUE, OutboundMessage::new(format!("filler-{i}")))
                .unwrap()
        })
        .collect()
}
