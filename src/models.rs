//! Data models for fetched stories and published snapshots.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ItemPayload`]: the item object exactly as the upstream API returns it
//! - [`StoryRecord`]: a validated item enriched with its derived domain
//! - [`ItemFailure`]: one identifier that did not make it into a batch
//! - [`Snapshot`]: the ranked output of one full refresh cycle

use crate::error::{FailureKind, FetchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item as decoded from the item endpoint.
///
/// Every field except `id` is optional upstream: text posts carry no `url`,
/// jobs carry no `score`, and so on.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
}

impl ItemPayload {
    /// The item's URL, or `None` if it is absent or blank.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// A single story that survived validation.
///
/// Built once by the item fetcher and never mutated afterwards. `domain` is
/// empty when the URL could not be reduced to a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub score: i64,
    pub domain: String,
    /// Upstream item type ("story", "job", "poll", ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// Creation time, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl StoryRecord {
    /// Assemble a record from a payload whose URL has already been checked.
    pub fn from_payload(payload: ItemPayload, url: String, domain: String) -> Self {
        Self {
            id: payload.id,
            title: payload.title.unwrap_or_default(),
            url,
            score: payload.score.unwrap_or_default(),
            domain,
            kind: payload.kind,
            by: payload.by,
            time: payload.time,
        }
    }
}

/// An identifier that was requested but excluded from the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: u64,
    pub kind: FailureKind,
    pub message: String,
}

impl ItemFailure {
    pub fn new(id: u64, error: &FetchError) -> Self {
        Self {
            id,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// The ranked result of one complete refresh cycle.
///
/// `stories` is ordered by descending score. Every requested identifier
/// ends up either in `stories` or in `failures`, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    /// Wall-clock time the batch took, in milliseconds.
    pub elapsed_ms: u64,
    /// Number of identifiers the batch was asked to resolve.
    pub requested: usize,
    pub stories: Vec<StoryRecord>,
    pub failures: Vec<ItemFailure>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.failures.len()
    }
}
