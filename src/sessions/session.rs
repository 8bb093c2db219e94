//! One subscriber connection and its delivery worker.

use crate::error::Result;
use crate::subscriptions::{SubscriberId, Subscription, TopicBus};
use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

use super::sink::EventSink;

/// Unique identifier for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Why a session stopped delivering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Disconnect or drain was requested.
    Cancelled,
    /// The sink refused a value.
    DeliveryFailed,
    /// The bus removed the subscriber (overflow or bus shutdown).
    StreamClosed,
    /// The worker thread panicked.
    Aborted,
}

/// Final accounting for a finished session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    /// Values handed to the sink successfully.
    pub delivered: u64,
    pub end: SessionEnd,
}

/// A live subscription bound to one transport connection.
///
/// Owns a worker thread that drains the topic subscription into the sink.
/// However the session ends, the worker unsubscribes from the bus exactly
/// once before it exits.
pub struct SubscriptionSession {
    id: SessionId,
    subscriber: SubscriberId,
    topic: String,
    cancel: Sender<()>,
    worker: Option<JoinHandle<SessionSummary>>,
}

impl SubscriptionSession {
    /// Subscribe to `topic` and start delivering into `sink`.
    pub fn start<T, S>(bus: Arc<TopicBus<T>>, topic: &str, sink: S, id: SessionId) -> Result<Self>
    where
        T: Clone + Send + 'static,
        S: EventSink<T>,
    {
        let subscription = bus.subscribe(topic)?;
        let subscriber = subscription.id();
        let (cancel, cancelled) = bounded(1);

        let worker_bus = Arc::clone(&bus);
        let worker = thread::Builder::new()
            .name(id.to_string())
            .spawn(move || run(id, worker_bus, subscription, sink, cancelled));

        let worker = match worker {
            Ok(handle) => handle,
            Err(e) => {
                bus.unsubscribe(subscriber);
                return Err(e.into());
            }
        };

        debug!(session = %id, subscriber = %subscriber, topic, "session started");

        Ok(Self {
            id,
            subscriber,
            topic: topic.to_string(),
            cancel,
            worker: Some(worker),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Ask the worker to stop. Does not wait.
    pub fn cancel(&self) {
        // Full means a cancel is already pending; disconnected means the
        // worker is gone. Both are fine.
        let _ = self.cancel.try_send(());
    }

    /// Wait for the worker to exit.
    pub fn join(mut self) -> SessionSummary {
        self.join_worker()
    }

    /// Cancel and wait for the worker to exit.
    pub fn close(self) -> SessionSummary {
        self.cancel();
        self.join()
    }

    fn join_worker(&mut self) -> SessionSummary {
        let id = self.id;
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(summary)) => summary,
            Some(Err(_)) | None => {
                warn!(session = %id, "session worker aborted");
                SessionSummary {
                    id,
                    delivered: 0,
                    end: SessionEnd::Aborted,
                }
            }
        }
    }
}

impl Drop for SubscriptionSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.cancel();
            let _ = self.join_worker();
        }
    }
}

impl fmt::Debug for SubscriptionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSession")
            .field("id", &self.id)
            .field("subscriber", &self.subscriber)
            .field("topic", &self.topic)
            .finish()
    }
}

fn cancel_requested(cancelled: &Receiver<()>) -> bool {
    !matches!(cancelled.try_recv(), Err(TryRecvError::Empty))
}

/// Worker loop. Cancellation takes priority over pending values.
fn run<T, S>(
    id: SessionId,
    bus: Arc<TopicBus<T>>,
    subscription: Subscription<T>,
    mut sink: S,
    cancelled: Receiver<()>,
) -> SessionSummary
where
    T: Clone + Send,
    S: EventSink<T>,
{
    let mut delivered = 0u64;

    let end = loop {
        if cancel_requested(&cancelled) {
            break SessionEnd::Cancelled;
        }

        let next = select! {
            recv(cancelled) -> _ => None,
            recv(subscription.receiver()) -> msg => Some(msg),
        };

        let event = match next {
            None => break SessionEnd::Cancelled,
            Some(Err(_)) => break SessionEnd::StreamClosed,
            Some(Ok(event)) => event,
        };

        if cancel_requested(&cancelled) {
            break SessionEnd::Cancelled;
        }

        match sink.deliver(&event) {
            Ok(()) => {
                delivered += 1;
                trace!(session = %id, delivered, "delivered");
            }
            Err(e) => {
                warn!(session = %id, error = %e, "delivery failed, ending session");
                break SessionEnd::DeliveryFailed;
            }
        }
    };

    bus.unsubscribe(subscription.id());
    drop(subscription);
    sink.close();

    debug!(session = %id, delivered, end = ?end, "session ended");

    SessionSummary { id, delivered, end }
}
