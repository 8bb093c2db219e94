//! Topic bus for broadcasting values to subscribers.

use crate::error::{FeedError, Result};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::types::{DropReason, PublishReport, SubscriberId, Subscription, SubscriptionConfig};

/// Internal subscriber state (the dispatch side of a registration).
pub(super) struct Subscriber<T> {
    id: SubscriberId,
    sender: Sender<T>,
    live: Arc<AtomicBool>,
}

impl<T> Subscriber<T> {
    /// Try to send a value without blocking.
    fn try_send(&self, value: T) -> std::result::Result<(), DropReason> {
        match self.sender.try_send(value) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DropReason::BufferOverflow),
            Err(TrySendError::Disconnected(_)) => Err(DropReason::Disconnected),
        }
    }

    fn retire(&self) {
        self.live.store(false, Ordering::Release);
    }
}

/// Subscribers of one topic, in registration order.
struct Topic<T> {
    subscribers: Vec<Subscriber<T>>,
}

pub(super) struct Registry<T> {
    topics: HashMap<String, Topic<T>>,
    /// Subscriber to topic name, for removal by id.
    owners: HashMap<SubscriberId, String>,
    closed: bool,
}

impl<T> Registry<T> {
    pub(super) fn remove(&mut self, id: SubscriberId) -> Option<Subscriber<T>> {
        let name = self.owners.remove(&id)?;
        let topic = self.topics.get_mut(&name)?;
        let pos = topic.subscribers.iter().position(|s| s.id == id)?;
        let subscriber = topic.subscribers.remove(pos);
        if topic.subscribers.is_empty() {
            self.topics.remove(&name);
        }
        subscriber.retire();
        Some(subscriber)
    }
}

/// Named-topic publish/subscribe bus.
///
/// Dispatch runs under the registry read lock and removal under the write
/// lock, so a subscriber is never sent to once its removal has returned.
pub struct TopicBus<T> {
    registry: Arc<RwLock<Registry<T>>>,
    /// Counter for generating subscriber IDs.
    next_id: AtomicU64,
    config: SubscriptionConfig,
}

impl<T: Clone + Send> TopicBus<T> {
    /// Create a new bus with default subscription settings.
    pub fn new() -> Self {
        Self::with_config(SubscriptionConfig::default())
    }

    /// Create a new bus with custom subscription settings.
    pub fn with_config(config: SubscriptionConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry {
                topics: HashMap::new(),
                owners: HashMap::new(),
                closed: false,
            })),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Register interest in a topic.
    ///
    /// The registration is visible to every `publish` that starts after
    /// this returns.
    pub fn subscribe(&self, topic: &str) -> Result<Subscription<T>> {
        let mut registry = self.registry.write();
        if registry.closed {
            return Err(FeedError::ShutdownInProgress);
        }

        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.config.buffer_size.max(1));
        let live = Arc::new(AtomicBool::new(true));

        registry
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic {
                subscribers: Vec::new(),
            })
            .subscribers
            .push(Subscriber {
                id,
                sender,
                live: Arc::clone(&live),
            });
        registry.owners.insert(id, topic.to_string());

        debug!(subscriber = %id, topic, "subscribed");

        Ok(Subscription {
            id,
            topic: topic.to_string(),
            receiver,
            live,
            ended: false,
            registry: Arc::downgrade(&self.registry),
        })
    }

    /// Unsubscribe and clean up. Returns false if already removed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.registry.write().remove(id);
        match removed {
            Some(_) => {
                debug!(subscriber = %id, reason = ?DropReason::Unsubscribed, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Deliver a value to every subscriber currently on `topic`.
    ///
    /// Never blocks on a subscriber. Subscribers whose buffer is full or
    /// whose receiver is gone are removed after the pass.
    pub fn publish(&self, topic: &str, value: T) -> PublishReport {
        let mut report = PublishReport::default();
        let mut to_remove = Vec::new();

        {
            let registry = self.registry.read();
            let Some(subscribers) = registry.topics.get(topic) else {
                trace!(topic, "no subscribers, discarding");
                return report;
            };

            for sub in &subscribers.subscribers {
                match sub.try_send(value.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(reason) => to_remove.push((sub.id, reason)),
                }
            }
        }

        // Remove dropped subscribers
        if !to_remove.is_empty() {
            let mut registry = self.registry.write();
            for (id, reason) in to_remove {
                if registry.remove(id).is_some() {
                    report.dropped += 1;
                    warn!(subscriber = %id, topic, ?reason, "dropping subscriber");
                }
            }
        }

        trace!(topic, delivered = report.delivered, dropped = report.dropped, "published");
        report
    }

    /// Close the bus: remove every subscriber and refuse new ones.
    ///
    /// Returns the number of subscribers removed. Their sequences end once
    /// drained.
    pub fn close(&self) -> usize {
        let mut registry = self.registry.write();
        registry.closed = true;
        registry.owners.clear();

        let mut removed = 0;
        for (_, topic) in registry.topics.drain() {
            for sub in topic.subscribers {
                sub.retire();
                removed += 1;
            }
        }

        debug!(removed, reason = ?DropReason::Shutdown, "bus closed");
        removed
    }

    pub fn is_closed(&self) -> bool {
        self.registry.read().closed
    }

    /// Number of subscribers on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry
            .read()
            .topics
            .get(topic)
            .map_or(0, |t| t.subscribers.len())
    }

    /// Number of subscribers across all topics.
    pub fn total_subscribers(&self) -> usize {
        self.registry.read().owners.len()
    }

    /// Number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.registry.read().topics.len()
    }
}

impl<T: Clone + Send> Default for TopicBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
