use super::*;
use crate::error::{SessionError, TransportError};
use crate::queue::QueueView;

#[test]
fn session_message_goes_to_session_queue() {
    let (transport, _inspector, publisher, _dir) = test_setup();

    let receipt = publisher
        .send_session_message("customer-9", r#"{"step":1}"#)
        .unwrap();
    assert_eq!(receipt.session_id, "customer-9");

    let stored = transport
        .peek(&QueueView::active(SESSION_QUEUE), 10, None)
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sequence_number, receipt.sequence_number);
    assert_eq!(stored[0].session_id.as_deref(), Some("customer-9"));

    let main = transport.peek(&QueueView::active(QUEUE), 10, None).unwrap();
    assert!(main.is_empty());
}

#[test]
fn session_message_requires_id_and_body() {
    let (_transport, _inspector, publisher, _dir) = test_setup();

    let err = publisher.send_session_message("", "{}").unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)), "got {err:?}");
    let err = publisher.send_session_message("s-1", " ").unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)), "got {err:?}");
}

#[test]
fn close_session_releases_lock() {
    let (transport, _inspector, publisher, _dir) = test_setup();

    publisher.close_session("s-1").unwrap();
    // Nothing left holding the session
    let handle = transport.accept_session(SESSION_QUEUE, "s-1").unwrap();
    transport.close_session(handle).unwrap();
}

#[test]
fn close_session_fails_while_held_elsewhere() {
    let (transport, _inspector, publisher, _dir) = test_setup();
    let handle = transport.accept_session(SESSION_QUEUE, "s-2").unwrap();

    let err = publisher.close_session("s-2").unwrap_err();
    assert!(
        matches!(err, SessionError::Transport(TransportError::SessionLocked(_))),
        "got {err:?}"
    );

    transport.close_session(handle).unwrap();
    publisher.close_session("s-2").unwrap();
}

#[test]
fn missing_session_queue_is_configuration_error() {
    let mut config = test_config();
    config.transport.session_queue_name.clear();
    let (_transport, _inspector, publisher, _dir) = test_setup_with_config(config);

    let err = publisher.close_session("s-1").unwrap_err();
    assert!(matches!(err, SessionError::Configuration(_)), "got {err:?}");
}
