//! In-memory record store.

use crate::error::Result;
use crate::types::{Record, RecordId, RecordInput};
use parking_lot::RwLock;

struct StoreInner {
    /// Records in insertion (= id) order.
    records: Vec<Record>,
    /// Id for the next append. Never reused.
    next_id: RecordId,
}

/// Ordered, append-only collection of records.
///
/// Ids come from an explicit counter rather than the collection size, so
/// they stay unique even if entries could ever be removed.
pub struct RecordStore {
    inner: RwLock<StoreInner>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Vec::new(),
                next_id: RecordId::FIRST,
            }),
        }
    }

    /// Validate and append a record, assigning the next id.
    pub fn append(&self, input: RecordInput) -> Result<Record> {
        input.validate()?;

        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id = id.next();

        let record = input.into_record(id);
        inner.records.push(record.clone());

        Ok(record)
    }

    /// Snapshot of every record in insertion order.
    pub fn list_all(&self) -> Vec<Record> {
        self.inner.read().records.clone()
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Option<Record> {
        let inner = self.inner.read();
        inner
            .records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|pos| inner.records[pos].clone())
    }

    /// Id of the most recent record.
    pub fn last_id(&self) -> Option<RecordId> {
        self.inner.read().records.last().map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
