//! Subscriber sessions.
//!
//! A session binds one transport connection to one topic subscription for
//! the connection's lifetime:
//! - A worker thread drains the subscription into an [`EventSink`]
//! - Disconnect, sink failure, or bus shutdown end the worker, which then
//!   unsubscribes exactly once
//! - [`SessionManager::drain`] cancels every session and joins them all

mod manager;
mod session;
mod sink;

pub use manager::{DrainReport, SessionManager};
pub use session::{SessionEnd, SessionId, SessionSummary, SubscriptionSession};
pub use sink::{ChannelSink, EventSink};
