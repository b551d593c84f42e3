//! Error taxonomy for the fetch pipeline.
//!
//! Errors are split by the granularity at which they are fatal:
//!
//! - [`TransportError`]: the raw `GET` failed (connection, status, ...).
//! - [`FetchError`]: anything that prevents one identifier list or one item
//!   from being resolved. At item granularity these are absorbed by the batch
//!   coordinator and reported; at identifier-source granularity they fail the
//!   whole refresh cycle.
//! - [`DomainError`]: a present URL could not be reduced to a host. Never
//!   drops a record.
//! - [`ConfigError`]: startup configuration problems.

use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Boxed cause of a transport failure, independent of the HTTP stack.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure of the transport capability itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS, body read or client-side timeout failure.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("could not build transport: {0}")]
    Client(#[source] BoxError),

    /// The endpoint answered with a non-success status.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },
}

impl TransportError {
    pub fn request(url: &str, source: impl Into<BoxError>) -> Self {
        TransportError::Request {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

/// Failure to resolve the identifier list or a single item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("item {id} has no URL (body: {preview})")]
    MissingUrl { id: u64, preview: String },

    #[error("upstream returned {available} identifiers but {requested} were requested")]
    InsufficientData { requested: usize, available: usize },

    #[error("item {id} did not resolve within {after:?}")]
    Timeout { id: u64, after: Duration },

    #[error("worker for item {id} aborted: {reason}")]
    WorkerAborted { id: u64, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transport(_) => FailureKind::Transport,
            FetchError::Decode { .. } => FailureKind::Decode,
            FetchError::MissingUrl { .. } => FailureKind::MissingUrl,
            FetchError::InsufficientData { .. } => FailureKind::InsufficientData,
            FetchError::Timeout { .. } => FailureKind::Timeout,
            FetchError::WorkerAborted { .. } => FailureKind::WorkerAborted,
        }
    }
}

/// Coarse classification of a [`FetchError`], suitable for reports and
/// serialized snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Decode,
    MissingUrl,
    InsufficientData,
    Timeout,
    WorkerAborted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Transport => "transport",
            FailureKind::Decode => "decode",
            FailureKind::MissingUrl => "missing_url",
            FailureKind::InsufficientData => "insufficient_data",
            FailureKind::Timeout => "timeout",
            FailureKind::WorkerAborted => "worker_aborted",
        };
        f.write_str(s)
    }
}

/// A URL was present but no host could be derived from it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("could not parse URL {url:?}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL {url:?} has no host")]
    MissingHost { url: String },
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
