//! Subscription types for live topic delivery.

use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

use super::manager::Registry;

/// Configuration for subscriptions created by a bus.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1000
    pub buffer_size: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self { buffer_size: 1000 }
    }
}

/// Why a subscriber was removed from the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiving side went away.
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
    /// Bus was closed.
    Shutdown,
}

/// Unique identifier for a subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Outcome of one fan-out pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that accepted the value.
    pub delivered: usize,
    /// Subscribers removed because they could not accept it.
    pub dropped: usize,
}

/// Receiving end of one topic registration.
///
/// Yields every value published on the topic after registration, in
/// publish order. The sequence ends once the bus removes the subscriber
/// and the buffered values are drained; it cannot be resumed. Dropping it
/// removes the registration.
pub struct Subscription<T> {
    pub(crate) id: SubscriberId,
    pub(crate) topic: String,
    pub(crate) receiver: Receiver<T>,
    pub(crate) live: Arc<AtomicBool>,
    pub(crate) ended: bool,
    pub(super) registry: Weak<RwLock<Registry<T>>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether the bus still dispatches to this subscription.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Receive the next value (blocking).
    pub fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a value (non-blocking).
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Channel end for use in `select!`.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }
}

impl<T> Iterator for Subscription<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.ended {
            return None;
        }
        match self.receiver.recv() {
            Ok(value) => Some(value),
            Err(RecvError) => {
                self.ended = true;
                None
            }
        }
    }
}

impl<T> FusedIterator for Subscription<T> {}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if !self.is_live() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            if registry.write().remove(self.id).is_some() {
                debug!(
                    subscriber = %self.id,
                    reason = ?DropReason::Disconnected,
                    "subscription dropped"
                );
            }
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("live", &self.is_live())
            .finish()
    }
}
