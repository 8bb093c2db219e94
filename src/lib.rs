//! # Blogcast
//!
//! An in-memory record feed where every write is broadcast live to the
//! subscribers connected at the time of the write.
//!
//! ## Core Concepts
//!
//! - **Records**: Append-only entries with store-assigned, 1-based ids
//! - **Topics**: Named publish/subscribe channels with per-subscriber buffers
//! - **Sessions**: One delivery worker per subscriber connection, with a
//!   joining drain on shutdown
//! - **Gateways**: A serialized write path (append, then publish) and a
//!   read path over store snapshots
//!
//! ## Example
//!
//! ```ignore
//! use blogcast::{BlogService, ChannelSink, ServiceConfig};
//!
//! let service = BlogService::new(ServiceConfig::default());
//!
//! // Subscribe a connection
//! let (tx, rx) = crossbeam_channel::bounded(64);
//! let session = service.new_blog(ChannelSink::new(tx))?;
//!
//! // Write; the subscriber receives the same record
//! let record = service.add_new_blog("hello", "alice")?;
//! assert_eq!(rx.recv()?, record);
//!
//! service.disconnect(session)?;
//! service.shutdown();
//! ```

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod records;
pub mod service;
pub mod sessions;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{FeedError, Result};
pub use gateway::{MutationGateway, QueryGateway};
pub use protocol::{ErrorKind, JsonSink, NewBlogEvent, Request, Response};
pub use records::RecordStore;
pub use service::{BlogService, ServiceConfig, ServiceStats, NEW_BLOG_TOPIC};
pub use sessions::{
    ChannelSink, DrainReport, EventSink, SessionEnd, SessionId, SessionManager, SessionSummary,
    SubscriptionSession,
};
pub use subscriptions::{
    DropReason, PublishReport, SubscriberId, Subscription, SubscriptionConfig, TopicBus,
};
pub use types::*;
