//! Write and read paths over the record store.

use crate::error::Result;
use crate::records::RecordStore;
use crate::subscriptions::TopicBus;
use crate::types::{Record, RecordInput};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// The single write path: append to the store, then publish.
///
/// Writers are serialized so that each append and its publish form one
/// unit; subscribers therefore see records in id order, and every record
/// is already readable from the store when its event goes out.
pub struct MutationGateway {
    store: Arc<RecordStore>,
    bus: Arc<TopicBus<Record>>,
    topic: String,
    /// Lock for write operations to ensure atomicity.
    write_lock: Mutex<()>,
}

impl MutationGateway {
    pub fn new(
        store: Arc<RecordStore>,
        bus: Arc<TopicBus<Record>>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bus,
            topic: topic.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Validate, append, and broadcast a new record.
    ///
    /// Only validation can fail; slow or vanished subscribers never fail
    /// the write.
    pub fn add_record(&self, input: RecordInput) -> Result<Record> {
        input.validate()?;

        let _lock = self.write_lock.lock();

        let record = self.store.append(input)?;
        let report = self.bus.publish(&self.topic, record.clone());

        debug!(
            id = %record.id,
            delivered = report.delivered,
            dropped = report.dropped,
            "record added"
        );

        Ok(record)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Read-only access to the store.
pub struct QueryGateway {
    store: Arc<RecordStore>,
}

impl QueryGateway {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Every record in id order.
    pub fn get_all(&self) -> Vec<Record> {
        self.store.list_all()
    }
}
