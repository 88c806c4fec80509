//! Deduplicated queue of unresolved tokens awaiting submission

use langsys_common::MissingTokenRecord;
use parking_lot::Mutex;
use tracing::debug;

/// Queue of missing-token records, deduplicated on insert by
/// (category, token).
///
/// Mutation is guarded by a sync lock so the resolver can enqueue without
/// suspending. Flushes snapshot the queue and later remove only the
/// snapshotted records, so records enqueued during an in-flight submission
/// survive for the next tick.
#[derive(Debug, Default)]
pub struct MissingTokenQueue {
    records: Mutex<Vec<MissingTokenRecord>>,
}

impl MissingTokenQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless an equal (category, token) pair is already
    /// queued. Returns true when the record was actually added.
    pub fn enqueue(&self, record: MissingTokenRecord) -> bool {
        let mut records = self.records.lock();
        if records.iter().any(|queued| queued.key() == record.key()) {
            return false;
        }
        debug!(
            "Queued missing token '{}' (category '{}')",
            record.token, record.category
        );
        records.push(record);
        true
    }

    /// Copy of the current queue contents
    pub fn snapshot(&self) -> Vec<MissingTokenRecord> {
        self.records.lock().clone()
    }

    /// Remove exactly the given records, leaving anything enqueued since the
    /// snapshot in place
    pub fn remove(&self, flushed: &[MissingTokenRecord]) {
        let mut records = self.records.lock();
        records.retain(|queued| !flushed.iter().any(|done| done.key() == queued.key()));
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
