//! Key encoding for RocksDB column families.
//!
//! Sequence numbers use big-endian encoding so that lexicographic key order
//! equals sequence order within a view. Composite keys use `:` (0x3A) as
//! separator. Queue names are length-prefixed with a big-endian u16.

use crate::message::SequenceNumber;
use crate::queue::{QueueView, SubQueue};

const SEPARATOR: u8 = b':';

/// Longest queue name the key layout can hold.
pub const MAX_QUEUE_NAME_LEN: usize = u16::MAX as usize;

fn sub_queue_tag(sub_queue: SubQueue) -> u8 {
    match sub_queue {
        SubQueue::Active => b'a',
        SubQueue::DeadLetter => b'd',
    }
}

/// Encode a queue name with a 2-byte big-endian length prefix. Callers
/// validate the length against `MAX_QUEUE_NAME_LEN` first.
fn encode_string(s: &str) -> Vec<u8> {
    let len = u16::try_from(s.len()).unwrap_or(u16::MAX);
    let mut buf = Vec::with_capacity(2 + s.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf
}

/// Build a prefix for iterating every message of one view.
///
/// Layout: length-prefixed queue name, separator, sub-queue tag, separator.
pub fn view_prefix(view: &QueueView) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(8 + view.queue.len());
    prefix.extend_from_slice(&encode_string(&view.queue));
    prefix.push(SEPARATOR);
    prefix.push(sub_queue_tag(view.sub_queue));
    prefix.push(SEPARATOR);
    prefix
}

/// Build a message key: `{queue}:{sub_queue}:{sequence}`.
pub fn message_key(view: &QueueView, sequence: SequenceNumber) -> Vec<u8> {
    let mut key = view_prefix(view);
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

/// Decode the sequence number at the tail of a message key.
pub fn sequence_from_key(key: &[u8]) -> Option<SequenceNumber> {
    let tail: [u8; 8] = key.get(key.len().checked_sub(8)?..)?.try_into().ok()?;
    Some(SequenceNumber::from_be_bytes(tail))
}

/// State key holding the last sequence number assigned in a queue. Shared by
/// both sub-queues, so dead-lettered entries keep unique sequence numbers.
pub fn sequence_state_key(queue: &str) -> String {
    format!("seq.{queue}")
}
