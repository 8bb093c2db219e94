//! Service facade tying the store, bus, gateways, and sessions together.

use crate::error::{FeedError, Result};
use crate::gateway::{MutationGateway, QueryGateway};
use crate::protocol::{Request, Response};
use crate::records::RecordStore;
use crate::sessions::{DrainReport, EventSink, SessionId, SessionManager, SessionSummary};
use crate::subscriptions::{SubscriptionConfig, TopicBus};
use crate::types::{Record, RecordInput};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Topic carrying "a new record was added" events.
pub const NEW_BLOG_TOPIC: &str = "OPERATION_FINISHED";

/// Service configuration.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Topic new records are published on.
    pub topic: String,

    /// Buffering for each subscriber.
    pub subscription: SubscriptionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            topic: NEW_BLOG_TOPIC.to_string(),
            subscription: SubscriptionConfig::default(),
        }
    }
}

/// Point-in-time counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub records: usize,
    pub active_sessions: usize,
    pub subscribers: usize,
}

/// The feed service.
///
/// Provides the three operations a transport exposes:
/// - `getBlogs`: read every record
/// - `addNewBlog`: append a record and broadcast it
/// - `newBlog`: open a live session receiving each later record
pub struct BlogService {
    /// Service configuration.
    config: ServiceConfig,

    store: Arc<RecordStore>,

    bus: Arc<TopicBus<Record>>,

    mutations: MutationGateway,

    queries: QueryGateway,

    sessions: SessionManager<Record>,

    /// Report of the first completed shutdown.
    drained: Mutex<Option<DrainReport>>,
}

impl BlogService {
    /// Create a service with an empty store.
    pub fn new(config: ServiceConfig) -> Self {
        let store = Arc::new(RecordStore::new());
        let bus = Arc::new(TopicBus::with_config(config.subscription.clone()));

        let mutations =
            MutationGateway::new(Arc::clone(&store), Arc::clone(&bus), config.topic.clone());
        let queries = QueryGateway::new(Arc::clone(&store));
        let sessions = SessionManager::new(Arc::clone(&bus));

        debug!(topic = %config.topic, "service created");

        Self {
            config,
            store,
            bus,
            mutations,
            queries,
            sessions,
            drained: Mutex::new(None),
        }
    }

    // --- Operations ---

    /// `getBlogs`
    pub fn get_blogs(&self) -> Vec<Record> {
        self.queries.get_all()
    }

    /// `addNewBlog`
    pub fn add_new_blog(&self, content: &str, author: &str) -> Result<Record> {
        self.mutations.add_record(RecordInput::new(content, author))
    }

    /// `newBlog`: start delivering every later record into `sink`.
    pub fn new_blog<S: EventSink<Record>>(&self, sink: S) -> Result<SessionId> {
        self.sessions.open(&self.config.topic, sink)
    }

    /// The transport reports that a subscriber connection went away.
    pub fn disconnect(&self, id: SessionId) -> Result<SessionSummary> {
        self.sessions.disconnect(id)
    }

    /// Join sessions that ended on their own (failed sinks, overflow).
    pub fn reap_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.reap()
    }

    // --- Request Envelope ---

    /// Run one request/response operation.
    pub fn execute(&self, request: Request) -> Response {
        match request {
            Request::GetBlogs => Response::Blogs {
                blogs: self.get_blogs(),
            },
            Request::AddNewBlog { content, author } => {
                match self.add_new_blog(&content, &author) {
                    Ok(blog) => Response::Blog { blog },
                    Err(e) => Response::error(&e),
                }
            }
        }
    }

    /// Decode a JSON request, run it, and encode the response.
    pub fn handle_json(&self, request: &str) -> String {
        let response = match serde_json::from_str::<Request>(request) {
            Ok(request) => self.execute(request),
            Err(e) => Response::error(&FeedError::Deserialization(e.to_string())),
        };

        match serde_json::to_string(&response) {
            Ok(text) => text,
            Err(e) => {
                let fallback = Response::error(&FeedError::from(e));
                serde_json::to_string(&fallback)
                    .unwrap_or_else(|_| r#"{"type":"error","kind":"internal","message":""}"#.into())
            }
        }
    }

    // --- Lifecycle ---

    /// Graceful drain: refuse new subscriptions, end every session, and
    /// wait until each has unregistered. Later calls return the same
    /// report.
    pub fn shutdown(&self) -> DrainReport {
        let mut drained = self.drained.lock();
        if let Some(report) = drained.as_ref() {
            return report.clone();
        }

        let report = self.sessions.drain();
        let leftover = self.bus.close();

        info!(
            sessions = report.sessions.len(),
            leftover_subscribers = leftover,
            "service drained"
        );

        *drained = Some(report.clone());
        report
    }

    pub fn is_shut_down(&self) -> bool {
        self.drained.lock().is_some()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            records: self.store.len(),
            active_sessions: self.sessions.active_count(),
            subscribers: self.bus.total_subscribers(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

impl Default for BlogService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl Drop for BlogService {
    fn drop(&mut self) {
        // Best-effort drain on drop
        let _ = self.shutdown();
    }
}
