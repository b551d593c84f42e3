//! Batch coordination: fan out one fetch per identifier, join them all,
//! rank what succeeded.
//!
//! # Concurrency model
//!
//! Every identifier gets its own task in a [`JoinSet`], so the batch size is
//! the concurrency bound. Workers share nothing mutable: each one owns its
//! identifier, an `Arc` of the transport and a copy of the endpoints. The
//! coordinator is the only consumer of results and drains the set with
//! `join_next_with_id` until it is empty, so the collection is complete
//! before it is ranked and no worker is ever left running.
//!
//! # Failure policy
//!
//! | Failure | Effect |
//! |---------|--------|
//! | identifier source fails | whole refresh fails, caller keeps old snapshot |
//! | item transport/decode error | item dropped and reported |
//! | item has no URL | item dropped and reported |
//! | item exceeds the per-worker timeout | item dropped and reported |
//! | worker panics | item dropped and reported |
//! | URL has no derivable host | item kept with empty domain |

use crate::api::{Endpoints, Transport, fetch_item, fetch_top_identifiers};
use crate::error::FetchError;
use crate::models::{ItemFailure, Snapshot, StoryRecord};
use crate::rank::{is_ranked, rank};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{self, JoinSet};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Tunables for one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// How many top identifiers to resolve; also the fan-out width.
    pub batch_size: usize,
    /// Upper bound for a single item fetch, decode included.
    pub item_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 30,
            item_timeout: Duration::from_secs(10),
        }
    }
}

/// Ranked stories plus the identifiers that did not make it.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub stories: Vec<StoryRecord>,
    pub failures: Vec<ItemFailure>,
}

/// Resolve every identifier concurrently and rank the results.
///
/// Never fails as a whole: each identifier ends up exactly once in either
/// `stories` or `failures`. Failures are sorted by id.
#[instrument(level = "info", skip_all, fields(requested = ids.len()))]
pub async fn run_batch<T>(
    transport: Arc<T>,
    endpoints: &Endpoints,
    ids: Vec<u64>,
    item_timeout: Duration,
) -> BatchOutcome
where
    T: Transport + 'static,
{
    let mut workers = JoinSet::new();
    let mut owners: HashMap<task::Id, u64> = HashMap::with_capacity(ids.len());

    for id in ids {
        let transport = Arc::clone(&transport);
        let endpoints = endpoints.clone();
        let handle = workers.spawn(async move {
            let fetch = fetch_item(transport.as_ref(), &endpoints, id);
            let result = match timeout(item_timeout, fetch).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout {
                    id,
                    after: item_timeout,
                }),
            };
            (id, result)
        });
        owners.insert(handle.id(), id);
    }

    let mut stories = Vec::with_capacity(owners.len());
    let mut failures = Vec::new();

    while let Some(joined) = workers.join_next_with_id().await {
        match joined {
            Ok((_, (id, Ok(record)))) => {
                debug!(id, score = record.score, "Worker finished");
                stories.push(record);
            }
            Ok((_, (id, Err(e)))) => {
                warn!(id, kind = %e.kind(), error = %e, "Dropping item from batch");
                failures.push(ItemFailure::new(id, &e));
            }
            Err(join_err) => {
                let Some(&id) = owners.get(&join_err.id()) else {
                    error!(error = %join_err, "Worker with unknown task id aborted");
                    continue;
                };
                let reason = if join_err.is_panic() {
                    "worker panicked".to_string()
                } else {
                    join_err.to_string()
                };
                let e = FetchError::WorkerAborted { id, reason };
                error!(id, error = %e, "Dropping item from batch");
                failures.push(ItemFailure::new(id, &e));
            }
        }
    }

    failures.sort_by_key(|f| f.id);
    let stories = rank(stories);
    debug_assert!(is_ranked(&stories));
    BatchOutcome { stories, failures }
}

/// One full refresh: identifier source, batch fan-out, ranking.
///
/// # Errors
///
/// Only identifier-source failures are returned; item failures are part of
/// the snapshot.
#[instrument(level = "info", skip_all, fields(batch_size = config.batch_size))]
pub async fn refresh<T>(
    transport: &Arc<T>,
    endpoints: &Endpoints,
    config: BatchConfig,
) -> Result<Snapshot, FetchError>
where
    T: Transport + 'static,
{
    let t0 = Instant::now();
    let ids = fetch_top_identifiers(transport.as_ref(), endpoints, config.batch_size).await?;
    let requested = ids.len();

    let outcome = run_batch(Arc::clone(transport), endpoints, ids, config.item_timeout).await;
    let elapsed = t0.elapsed();

    info!(
        requested,
        fetched = outcome.stories.len(),
        dropped = outcome.failures.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Batch complete"
    );

    Ok(Snapshot {
        fetched_at: Utc::now(),
        elapsed_ms: elapsed.as_millis() as u64,
        requested,
        stories: outcome.stories,
        failures: outcome.failures,
    })
}
