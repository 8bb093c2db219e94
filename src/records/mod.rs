//! Record storage.
//!
//! Records live in memory for the lifetime of the owning store and are
//! kept in id order.

mod store;

pub use store::RecordStore;
