//! TTL policy for persisted answers.
//!
//! The shared store expires entries on its own; this module decides the
//! lifetime written at publish time and corrects record TTLs on re-read.

use std::time::Duration;

use hickory_proto::op::Message;

use crate::DEFAULT_STORE_TTL;

/// Derive the store TTL for an answer.
///
/// Takes the maximum answer-record TTL in seconds. Falls back to
/// [`DEFAULT_STORE_TTL`] when no record carries a positive TTL: a store
/// TTL of zero would mean "no expiry" or "already expired" depending on
/// the backend, both wrong here.
pub fn derive_store_ttl(message: &Message) -> Duration {
    let max_ttl = message
        .answers()
        .iter()
        .map(|record| record.ttl())
        .max()
        .unwrap_or(0);

    if max_ttl == 0 {
        DEFAULT_STORE_TTL
    } else {
        Duration::from_secs(u64::from(max_ttl))
    }
}

/// Overwrite every answer record's TTL with the remaining store lifetime.
///
/// Entries re-read from the store still carry the TTLs recorded at
/// publish time; a consumer computing expiry from record TTLs needs the
/// remaining value instead. A zero remaining TTL leaves records untouched.
pub fn restamp_on_read(message: &mut Message, remaining: Duration) {
    if remaining.is_zero() {
        return;
    }
    let ttl = remaining.as_secs().min(u64::from(u32::MAX)) as u32;
    let mut answers = message.take_answers();
    for record in &mut answers {
        record.set_ttl(ttl);
    }
    message.insert_answers(answers);
}
