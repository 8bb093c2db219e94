//! Core types for the feed.

use crate::error::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// The id handed to the first record of a store.
    pub const FIRST: RecordId = RecordId(1);

    pub fn next(self) -> Self {
        RecordId(self.0 + 1)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single published record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier (assigned by store).
    pub id: RecordId,

    /// Body text.
    pub content: String,

    /// Who wrote it.
    pub author: String,
}

/// Input for creating a new record (before id assigned).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInput {
    pub content: String,
    pub author: String,
}

impl RecordInput {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
        }
    }

    /// Reject blank content or author.
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(FeedError::Validation("content must not be empty".into()));
        }
        if self.author.trim().is_empty() {
            return Err(FeedError::Validation("author must not be empty".into()));
        }
        Ok(())
    }

    /// Attach an id, producing the stored record.
    pub(crate) fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            content: self.content,
            author: self.author,
        }
    }
}
