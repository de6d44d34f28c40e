use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::{TransportError, TransportResult};
use crate::message::{now_ms, OutboundMessage, PeekedMessage, SequenceNumber};
use crate::queue::QueueView;
use crate::transport::keys;
use crate::transport::traits::{QueueTransport, SessionHandle};

const CF_MESSAGES: &str = "messages";
const CF_STATE: &str = "state";

/// All column family names (excluding `default` which RocksDB creates automatically).
const COLUMN_FAMILIES: &[&str] = &[CF_MESSAGES, CF_STATE];

type DB = DBWithThreadMode<MultiThreaded>;

/// Embedded queue transport backed by RocksDB.
///
/// Messages of a view are stored under `{queue}:{sub_queue}:{sequence}`, so a
/// forward iterator yields them in sequence order. Session locks live in
/// memory only and are released when the process exits.
pub struct RocksDbTransport {
    db: DB,
    /// Serializes sequence assignment across concurrent publishers.
    sequence_lock: Mutex<()>,
    sessions: Mutex<HashMap<(String, String), Uuid>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RocksDbTransport {
    /// Open or create a RocksDB database at the given path with all column families.
    pub fn open(path: impl AsRef<Path>) -> TransportResult<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        Ok(Self {
            db,
            sequence_lock: Mutex::new(()),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    fn cf(&self, name: &str) -> TransportResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| TransportError::RocksDb(format!("column family not found: {name}")))
    }

    fn check_queue_name(queue: &str) -> TransportResult<()> {
        if queue.len() > keys::MAX_QUEUE_NAME_LEN {
            return Err(TransportError::CorruptData(format!(
                "queue name exceeds {} bytes",
                keys::MAX_QUEUE_NAME_LEN
            )));
        }
        Ok(())
    }

    /// Read the last assigned sequence of `queue` and return the next one.
    /// Must be called with `sequence_lock` held.
    fn next_sequence(&self, queue: &str) -> TransportResult<SequenceNumber> {
        let cf = self.cf(CF_STATE)?;
        let last = match self.db.get_cf(&cf, keys::sequence_state_key(queue))? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    TransportError::CorruptData(format!("bad sequence state for queue {queue}"))
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        Ok(last + 1)
    }

    /// Assign a sequence number and store `message` in the active view.
    fn enqueue(
        &self,
        queue: &str,
        message: OutboundMessage,
        scheduled_at: Option<u64>,
    ) -> TransportResult<SequenceNumber> {
        Self::check_queue_name(queue)?;
        let messages_cf = self.cf(CF_MESSAGES)?;
        let state_cf = self.cf(CF_STATE)?;

        let _guard = lock(&self.sequence_lock);
        let sequence = self.next_sequence(queue)?;
        let enqueued_at = scheduled_at.unwrap_or_else(now_ms);

        let stored = PeekedMessage {
            sequence_number: sequence,
            message_id: message
                .message_id
                .unwrap_or_else(|| Uuid::now_v7().simple().to_string()),
            correlation_id: message.correlation_id,
            session_id: message.session_id,
            content_type: message.content_type,
            subject: message.subject,
            properties: message.properties,
            enqueued_at,
            locked_until: None,
            expires_at: message
                .time_to_live_ms
                .map(|ttl| enqueued_at.saturating_add(ttl)),
            scheduled_enqueue_at: scheduled_at,
            delivery_count: 0,
            dead_letter_reason: None,
            dead_letter_description: None,
            body: message.body,
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &messages_cf,
            keys::message_key(&QueueView::active(queue), sequence),
            serde_json::to_vec(&stored)?,
        );
        batch.put_cf(
            &state_cf,
            keys::sequence_state_key(queue),
            sequence.to_be_bytes(),
        );
        self.db.write(batch)?;

        debug!(%queue, sequence, message_id = %stored.message_id, "message stored");
        Ok(sequence)
    }

    /// Move an active entry into the dead-letter sub-queue, keeping its
    /// sequence number. Returns `false` when no active entry has `sequence`.
    pub fn dead_letter(
        &self,
        queue: &str,
        sequence: SequenceNumber,
        reason: &str,
        description: &str,
    ) -> TransportResult<bool> {
        Self::check_queue_name(queue)?;
        let cf = self.cf(CF_MESSAGES)?;
        let active_key = keys::message_key(&QueueView::active(queue), sequence);

        let Some(bytes) = self.db.get_cf(&cf, &active_key)? else {
            return Ok(false);
        };
        let mut message: PeekedMessage = serde_json::from_slice(&bytes)?;
        message.delivery_count = message.delivery_count.saturating_add(1);
        message.dead_letter_reason = Some(reason.to_string());
        message.dead_letter_description = Some(description.to_string());

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf, &active_key);
        batch.put_cf(
            &cf,
            keys::message_key(&QueueView::dead_letter(queue), sequence),
            serde_json::to_vec(&message)?,
        );
        self.db.write(batch)?;

        debug!(%queue, sequence, %reason, "message dead-lettered");
        Ok(true)
    }
}

impl QueueTransport for RocksDbTransport {
    fn peek(
        &self,
        view: &QueueView,
        max: usize,
        from_sequence: Option<SequenceNumber>,
    ) -> TransportResult<Vec<PeekedMessage>> {
        if max == 0 {
            return Ok(Vec::new());
        }
        Self::check_queue_name(&view.queue)?;
        let cf = self.cf(CF_MESSAGES)?;
        let prefix = keys::view_prefix(view);
        let start = match from_sequence {
            Some(sequence) => keys::message_key(view, sequence),
            None => prefix.clone(),
        };

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&start, Direction::Forward));
        let mut results = Vec::with_capacity(max.min(64));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let message: PeekedMessage = serde_json::from_slice(&value)?;
            if keys::sequence_from_key(&key) != Some(message.sequence_number) {
                return Err(TransportError::CorruptData(format!(
                    "sequence mismatch for message {} in {view}",
                    message.message_id
                )));
            }
            results.push(message);
            if results.len() == max {
                break;
            }
        }
        Ok(results)
    }

    fn publish(&self, queue: &str, message: OutboundMessage) -> TransportResult<SequenceNumber> {
        self.enqueue(queue, message, None)
    }

    fn schedule(
        &self,
        queue: &str,
        message: OutboundMessage,
        enqueue_at_ms: u64,
    ) -> TransportResult<SequenceNumber> {
        self.enqueue(queue, message, Some(enqueue_at_ms))
    }

    fn accept_session(&self, queue: &str, session_id: &str) -> TransportResult<SessionHandle> {
        let mut sessions = lock(&self.sessions);
        let key = (queue.to_string(), session_id.to_string());
        if sessions.contains_key(&key) {
            return Err(TransportError::SessionLocked(session_id.to_string()));
        }
        let id = Uuid::now_v7();
        sessions.insert(key, id);
        Ok(SessionHandle {
            id,
            queue: queue.to_string(),
            session_id: session_id.to_string(),
        })
    }

    fn close_session(&self, handle: SessionHandle) -> TransportResult<()> {
        let mut sessions = lock(&self.sessions);
        let key = (handle.queue, handle.session_id);
        if sessions.get(&key) != Some(&handle.id) {
            return Err(TransportError::SessionNotFound(key.1));
        }
        sessions.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PropertyValue;

    fn open() -> (RocksDbTransport, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let transport = RocksDbTransport::open(dir.path()).unwrap();
        (transport, dir)
    }

    fn publish_n(transport: &RocksDbTransport, queue: &str, n: usize) -> Vec<u64> {
        (0..n)
            .map(|i| {
                transport
                    .publish(queue, OutboundMessage::new(format!("body-{i}")))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn sequences_increase_per_queue() {
        let (transport, _dir) = open();
        assert_eq!(publish_n(&transport, "orders", 3), vec![1, 2, 3]);
        assert_eq!(publish_n(&transport, "invoices", 2), vec![1, 2]);
    }

    #[test]
    fn sequences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let transport = RocksDbTransport::open(dir.path()).unwrap();
            publish_n(&transport, "orders", 2);
        }
        let transport = RocksDbTransport::open(dir.path()).unwrap();
        assert_eq!(publish_n(&transport, "orders", 1), vec![3]);
    }

    #[test]
    fn peek_pages_from_watermark() {
        let (transport, _dir) = open();
        publish_n(&transport, "orders", 5);
        let view = QueueView::active("orders");

        let first = transport.peek(&view, 2, None).unwrap();
        let seqs: Vec<u64> = first.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2]);

        let rest = transport.peek(&view, 10, Some(3)).unwrap();
        let seqs: Vec<u64> = rest.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, vec![3, 4, 5]);

        assert!(transport.peek(&view, 10, Some(6)).unwrap().is_empty());
        assert!(transport.peek(&view, 0, None).unwrap().is_empty());
    }

    #[test]
    fn peek_does_not_change_stored_messages() {
        let (transport, _dir) = open();
        publish_n(&transport, "orders", 2);
        let view = QueueView::active("orders");

        let before = transport.peek(&view, 10, None).unwrap();
        let after = transport.peek(&view, 10, None).unwrap();
        assert_eq!(before, after);
        assert!(after.iter().all(|m| m.delivery_count == 0 && m.locked_until.is_none()));
    }

    #[test]
    fn publish_keeps_envelope_and_generates_missing_id() {
        let (transport, _dir) = open();
        let mut msg = OutboundMessage::new(b"{}".to_vec()).with_content_type("application/json");
        msg.properties
            .insert("orderNumber".to_string(), PropertyValue::from("A-1"));
        msg.time_to_live_ms = Some(60_000);
        transport.publish("orders", msg).unwrap();

        let peeked = transport
            .peek(&QueueView::active("orders"), 1, None)
            .unwrap()
            .remove(0);
        assert!(!peeked.message_id.is_empty());
        assert_eq!(peeked.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            peeked.properties.get("orderNumber"),
            Some(&PropertyValue::from("A-1"))
        );
        assert_eq!(peeked.expires_at, Some(peeked.enqueued_at + 60_000));
    }

    #[test]
    fn publish_stamps_wall_clock_enqueue_time() {
        let (transport, _dir) = open();
        let before = now_ms();
        let seq = transport.publish("orders", OutboundMessage::new("now")).unwrap();
        let after = now_ms();

        let peeked = transport
            .peek(&QueueView::active("orders"), 1, Some(seq))
            .unwrap()
            .remove(0);
        assert!(peeked.enqueued_at >= before && peeked.enqueued_at <= after);
        assert_eq!(peeked.scheduled_enqueue_at, None);
    }

    #[test]
    fn scheduled_message_carries_enqueue_time() {
        let (transport, _dir) = open();
        let seq = transport
            .schedule("orders", OutboundMessage::new("later"), 4_102_444_800_000)
            .unwrap();
        let peeked = transport
            .peek(&QueueView::active("orders"), 1, Some(seq))
            .unwrap()
            .remove(0);
        assert_eq!(peeked.scheduled_enqueue_at, Some(4_102_444_800_000));
        assert_eq!(peeked.enqueued_at, 4_102_444_800_000);
    }

    #[test]
    fn dead_letter_moves_entry_and_keeps_sequence() {
        let (transport, _dir) = open();
        publish_n(&transport, "orders", 3);

        assert!(transport
            .dead_letter("orders", 2, "MaxDeliveryCountExceeded", "failed 10 times")
            .unwrap());
        assert!(!transport.dead_letter("orders", 2, "again", "").unwrap());

        let active = transport.peek(&QueueView::active("orders"), 10, None).unwrap();
        let active_seqs: Vec<u64> = active.iter().map(|m| m.sequence_number).collect();
        assert_eq!(active_seqs, vec![1, 3]);

        let dead = transport
            .peek(&QueueView::dead_letter("orders"), 10, None)
            .unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].sequence_number, 2);
        assert_eq!(
            dead[0].dead_letter_reason.as_deref(),
            Some("MaxDeliveryCountExceeded")
        );

        // New publishes never reuse a dead-lettered sequence.
        assert_eq!(publish_n(&transport, "orders", 1), vec![4]);
    }

    #[test]
    fn session_lock_is_exclusive_until_closed() {
        let (transport, _dir) = open();
        let handle = transport.accept_session("sessions", "s-1").unwrap();
        assert!(matches!(
            transport.accept_session("sessions", "s-1"),
            Err(TransportError::SessionLocked(_))
        ));
        // Other sessions are independent.
        let other = transport.accept_session("sessions", "s-2").unwrap();

        transport.close_session(handle.clone()).unwrap();
        assert!(matches!(
            transport.close_session(handle),
            Err(TransportError::SessionNotFound(_))
        ));
        transport.close_session(other).unwrap();
        transport.accept_session("sessions", "s-1").unwrap();
    }
}
