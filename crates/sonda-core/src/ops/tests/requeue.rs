use super::*;
use crate::error::RequeueError;
use crate::queue::QueueView;
use opentelemetry::KeyValue;

/// Dead-letters sequences 10, 11 and 12; sequence 11 carries `ORD-7`.
fn dead_letter_three(transport: &RocksDbTransport) {
    publish_filler(transport, 10);
    let mut order = OutboundMessage::new(order_body("ORD-7")).with_content_type("application/json");
    order.message_id = Some("ORD-7".to_string());
    order.correlation_id = Some("corr-7".to_string());
    order.subject = Some("Order".to_string());
    order
        .properties
        .insert("orderNumber".to_string(), "ORD-7".into());
    assert_eq!(transport.publish(QUEUE, order).unwrap(), 11);
    assert_eq!(
        transport.publish(QUEUE, OutboundMessage::new("tail")).unwrap(),
        12
    );
    for seq in [10, 11, 12] {
        assert!(transport
            .dead_letter(QUEUE, seq, "ProcessingFailed", "handler error")
            .unwrap());
    }
}

#[test]
fn requeue_copies_message_and_keeps_original() {
    let (transport, inspector, _publisher, _dir) = test_setup();
    dead_letter_three(&transport);

    let outcome = inspector
        .requeue_from_dead_letter(&LookupQuery::by_message_id("ORD-7"), 500)
        .unwrap();

    let RequeueOutcome::Requeued(receipt) = outcome else {
        panic!("expected Requeued, got {outcome:?}");
    };
    assert_eq!(receipt.message_id, "ORD-7");
    assert_eq!(receipt.original_sequence, 11);
    assert_eq!(receipt.session_id, None);
    assert_eq!(receipt.new_sequence, 13);

    let active = transport
        .peek(&QueueView::active(QUEUE), 50, Some(receipt.new_sequence))
        .unwrap();
    assert_eq!(active.len(), 1);
    let copy = &active[0];
    let dead = transport
        .peek(&QueueView::dead_letter(QUEUE), 50, None)
        .unwrap();
    let original = dead.iter().find(|m| m.sequence_number == 11).unwrap();

    assert_eq!(dead.len(), 3);
    assert_eq!(copy.body, original.body);
    assert_eq!(copy.message_id, original.message_id);
    assert_eq!(copy.correlation_id, original.correlation_id);
    assert_eq!(copy.content_type, original.content_type);
    assert_eq!(copy.subject, original.subject);
    assert_eq!(copy.properties, original.properties);
    assert_eq!(copy.delivery_count, 0);
    assert_eq!(copy.dead_letter_reason, None);
}

#[test]
fn requeue_by_order_number() {
    let (transport, inspector, _publisher, _dir) = test_setup();
    dead_letter_three(&transport);

    let outcome = inspector
        .requeue_from_dead_letter(&LookupQuery::by_field("ORD-7"), 0)
        .unwrap();
    assert!(
        matches!(outcome, RequeueOutcome::Requeued(ref r) if r.original_sequence == 11),
        "got {outcome:?}"
    );
}

#[test]
fn requeue_preserves_session_id() {
    let (transport, inspector, _publisher, _dir) = test_setup();
    let mut message = OutboundMessage::new(order_body("ORD-2"));
    message.session_id = Some("customer-1".to_string());
    let seq = transport.publish(QUEUE, message).unwrap();
    transport.dead_letter(QUEUE, seq, "r", "d").unwrap();

    let outcome = inspector
        .requeue_from_dead_letter(&LookupQuery::by_field("ORD-2"), 0)
        .unwrap();
    let RequeueOutcome::Requeued(receipt) = outcome else {
        panic!("expected Requeued, got {outcome:?}");
    };
    assert_eq!(receipt.session_id.as_deref(), Some("customer-1"));
}

#[test]
fn not_found_publishes_nothing() {
    let (transport, inspector, _publisher, _dir) = test_setup();
    dead_letter_three(&transport);

    let outcome = inspector
        .requeue_from_dead_letter(&LookupQuery::by_message_id("ORD-404"), 0)
        .unwrap();
    assert_eq!(outcome, RequeueOutcome::NotFound { max_to_scan: 500 });

    let active = transport
        .peek(&QueueView::active(QUEUE), 50, None)
        .unwrap();
    assert_eq!(active.len(), 9, "only the undead-lettered fillers remain");
}

#[test]
fn active_messages_are_never_requeued() {
    let (transport, inspector, _publisher, _dir) = test_setup();
    let mut message = OutboundMessage::new(order_body("ORD-1"));
    message.message_id = Some("ORD-1".to_string());
    transport.publish(QUEUE, message).unwrap();

    let outcome = inspector
        .requeue_from_dead_letter(&LookupQuery::by_message_id("ORD-1"), 0)
        .unwrap();
    assert!(matches!(outcome, RequeueOutcome::NotFound { .. }));
}

#[test]
fn blank_lookup_is_validation_error() {
    let (_transport, inspector, _publisher, _dir) = test_setup();

    let err = inspector
        .requeue_from_dead_letter(&LookupQuery::by_message_id("   "), 0)
        .unwrap_err();
    assert!(matches!(err, RequeueError::Validation(_)), "got {err:?}");
}

#[test]
fn requeue_records_metric() {
    let (transport, inspector, harness, _dir) = test_setup_with_metrics();
    dead_letter_three(&transport);

    inspector
        .requeue_from_dead_letter(&LookupQuery::by_message_id("ORD-7"), 0)
        .unwrap();

    harness.assert_counter(
        "sonda.messages.requeued",
        &[KeyValue::new("queue", QUEUE)],
        1,
    );
    harness.assert_counter(
        "sonda.scans",
        &[
            KeyValue::new("sub_queue", "deadletter"),
            KeyValue::new("outcome", "matched"),
        ],
        1,
    );
}
