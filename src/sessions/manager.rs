//! Registry of live sessions with a joining drain.

use crate::error::{FeedError, Result};
use crate::subscriptions::TopicBus;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::session::{SessionId, SessionSummary, SubscriptionSession};
use super::sink::EventSink;

/// Result of draining every session.
#[derive(Clone, Debug, Default)]
pub struct DrainReport {
    /// One summary per session that was still registered.
    pub sessions: Vec<SessionSummary>,
}

impl DrainReport {
    /// Total values delivered by the drained sessions.
    pub fn delivered(&self) -> u64 {
        self.sessions.iter().map(|s| s.delivered).sum()
    }
}

struct Sessions {
    active: HashMap<SessionId, SubscriptionSession>,
    draining: bool,
}

/// Tracks every session opened against one bus.
///
/// `open` and `drain` are serialized on the registry lock, so once a drain
/// has started no new session can be registered behind it.
pub struct SessionManager<T> {
    bus: Arc<TopicBus<T>>,
    sessions: Mutex<Sessions>,
    /// Counter for generating session IDs.
    next_id: AtomicU64,
}

impl<T: Clone + Send + 'static> SessionManager<T> {
    pub fn new(bus: Arc<TopicBus<T>>) -> Self {
        Self {
            bus,
            sessions: Mutex::new(Sessions {
                active: HashMap::new(),
                draining: false,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a session delivering `topic` into `sink`.
    pub fn open<S: EventSink<T>>(&self, topic: &str, sink: S) -> Result<SessionId> {
        let mut sessions = self.sessions.lock();
        if sessions.draining {
            return Err(FeedError::ShutdownInProgress);
        }

        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let session = SubscriptionSession::start(Arc::clone(&self.bus), topic, sink, id)?;
        sessions.active.insert(id, session);

        Ok(id)
    }

    /// Transport disconnect: stop the session and wait for it to unregister.
    pub fn disconnect(&self, id: SessionId) -> Result<SessionSummary> {
        let session = self
            .sessions
            .lock()
            .active
            .remove(&id)
            .ok_or(FeedError::SessionNotFound(id))?;

        Ok(session.close())
    }

    /// Join sessions whose worker already ended on its own.
    ///
    /// Such sessions stay registered until reaped, disconnected, or
    /// drained, so their summaries always reach one of those callers.
    pub fn reap(&self) -> Vec<SessionSummary> {
        let finished = Self::take_finished(&mut self.sessions.lock());
        finished.into_iter().map(SubscriptionSession::join).collect()
    }

    /// Refuse new sessions, cancel every live one, and wait until all of
    /// them have unregistered from the bus.
    pub fn drain(&self) -> DrainReport {
        let sessions: Vec<SubscriptionSession> = {
            let mut sessions = self.sessions.lock();
            sessions.draining = true;
            sessions.active.drain().map(|(_, s)| s).collect()
        };

        info!(count = sessions.len(), "draining sessions");

        // Signal all first so workers wind down in parallel
        for session in &sessions {
            session.cancel();
        }

        let mut report = DrainReport {
            sessions: sessions.into_iter().map(SubscriptionSession::join).collect(),
        };
        report.sessions.sort_by_key(|s| s.id);

        debug!(
            sessions = report.sessions.len(),
            delivered = report.delivered(),
            "drain complete"
        );
        report
    }

    /// Number of registered sessions (including any not yet reaped).
    pub fn active_count(&self) -> usize {
        self.sessions.lock().active.len()
    }

    pub fn is_draining(&self) -> bool {
        self.sessions.lock().draining
    }

    fn take_finished(sessions: &mut Sessions) -> Vec<SubscriptionSession> {
        let done: Vec<SessionId> = sessions
            .active
            .iter()
            .filter(|(_, s)| s.is_finished())
            .map(|(id, _)| *id)
            .collect();

        done.into_iter()
            .filter_map(|id| sessions.active.remove(&id))
            .collect()
    }
}
