//! JSON envelopes exchanged with the transport layer.
//!
//! Requests name one of the feed operations; responses carry either the
//! result or an error kind the transport can map to its own status codes.
//! Subscription events use the `{"newBlog": {...}}` payload shape.

use crate::error::{FeedError, Result};
use crate::sessions::EventSink;
use crate::types::Record;
use serde::{Deserialize, Serialize};

/// A request/response operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    /// Every record in id order.
    GetBlogs,
    /// Create a record and broadcast it.
    AddNewBlog { content: String, author: String },
}

/// Result of a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Blogs { blogs: Vec<Record> },
    Blog { blog: Record },
    Error { kind: ErrorKind, message: String },
}

/// Coarse error classes surfaced to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    ShutdownInProgress,
    BadRequest,
    Internal,
}

impl From<&FeedError> for ErrorKind {
    fn from(e: &FeedError) -> Self {
        match e {
            FeedError::Validation(_) => ErrorKind::Validation,
            FeedError::ShutdownInProgress => ErrorKind::ShutdownInProgress,
            FeedError::Deserialization(_) => ErrorKind::BadRequest,
            _ => ErrorKind::Internal,
        }
    }
}

impl Response {
    pub fn error(e: &FeedError) -> Self {
        Response::Error {
            kind: e.into(),
            message: e.to_string(),
        }
    }
}

/// Payload pushed to subscribers of `newBlog`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlogEvent {
    #[serde(rename = "newBlog")]
    pub new_blog: Record,
}

/// Sink that writes each record as a `NewBlogEvent` JSON text.
pub struct JsonSink<W> {
    writer: W,
}

impl<W> JsonSink<W>
where
    W: FnMut(String) -> Result<()> + Send + 'static,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W> EventSink<Record> for JsonSink<W>
where
    W: FnMut(String) -> Result<()> + Send + 'static,
{
    fn deliver(&mut self, event: &Record) -> Result<()> {
        let text = serde_json::to_string(&NewBlogEvent {
            new_blog: event.clone(),
        })?;
        (self.writer)(text)
    }
}
