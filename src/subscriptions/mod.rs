//! Topic bus for live updates.
//!
//! This module provides in-process publish/subscribe keyed by topic name:
//! - Every subscriber gets its own copy of each value (fan-out)
//! - Values published after registration only, no replay
//! - Bounded buffers with slow-subscriber dropping
//!
//! # Example
//!
//! ```ignore
//! let bus: TopicBus<Record> = TopicBus::new();
//!
//! let subscription = bus.subscribe("OPERATION_FINISHED")?;
//! bus.publish("OPERATION_FINISHED", record);
//!
//! // Blocks until the next value; ends when the subscriber is removed
//! for record in subscription {
//!     println!("Got record: {:?}", record);
//! }
//! ```

mod manager;
mod types;

pub use manager::TopicBus;
pub use types::{DropReason, PublishReport, SubscriberId, Subscription, SubscriptionConfig};
