//! Key encoding for RocksDB column families.
//!
//! All numeric values use big-endian encoding for correct lexicographic
//! ordering. Composite keys use `:` (0x3A) as separator. Variable-length
//! strings are length-prefixed with a big-endian u16.

use crate::message::MessageId;

const SEPARATOR: u8 = b':';

/// Encode a u64 as 8 big-endian bytes.
fn encode_u64(val: u64) -> [u8; 8] {
    val.to_be_bytes()
}

/// Encode a variable-length string with a 2-byte big-endian length prefix.
fn encode_string(s: &str) -> Vec<u8> {
    let len = u16::try_from(s.len()).expect("key string exceeds 64 KiB");
    let mut buf = Vec::with_capacity(2 + s.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf
}

/// Build a message key: `{holding_destination}:{message_id}`.
///
/// The holding destination is the destination whose store currently holds the
/// row: the dead-letter destination for dead-lettered messages, the live
/// destination otherwise. Identifiers are big-endian so iteration within a
/// destination yields ascending identifier order.
pub fn message_key(holding_destination: &str, id: MessageId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&encode_string(holding_destination));
    key.push(SEPARATOR);
    key.extend_from_slice(&encode_u64(id.0));
    key
}

/// Build a prefix for iterating all messages held by a destination.
pub fn message_prefix(holding_destination: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(24);
    prefix.extend_from_slice(&encode_string(holding_destination));
    prefix.push(SEPARATOR);
    prefix
}

/// Build a content-part key: `{message_id}:{part_index}`.
pub fn content_key(id: MessageId, part_index: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&encode_u64(id.0));
    key.push(SEPARATOR);
    key.extend_from_slice(&part_index.to_be_bytes());
    key
}

/// Build a prefix for iterating all content parts of one message.
pub fn content_prefix(id: MessageId) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(12);
    prefix.extend_from_slice(&encode_u64(id.0));
    prefix.push(SEPARATOR);
    prefix
}

/// Build an identifier-index key: 8-byte big-endian identifier. The value is
/// the message row key the identifier currently points at.
pub fn id_index_key(id: MessageId) -> Vec<u8> {
    encode_u64(id.0).to_vec()
}

/// State key under which the identifier counter is persisted.
pub const LAST_MESSAGE_ID: &str = "last_message_id";
