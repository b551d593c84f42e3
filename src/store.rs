//! The published snapshot.
//!
//! Readers get an `Arc<Snapshot>` and keep it for as long as they like; a
//! refresh swaps in a new `Arc` under a short write lock. A batch is only
//! published once it is complete, and a failed refresh leaves the previous
//! snapshot in place.

use crate::api::{Endpoints, Transport};
use crate::batch::{BatchConfig, refresh};
use crate::error::FetchError;
use crate::models::Snapshot;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last published snapshot, if any refresh has succeeded yet.
    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    /// Replace the published snapshot and return the new one.
    pub async fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().await = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Run one refresh cycle and publish it if it succeeded.
    ///
    /// On error the previously published snapshot, if any, stays current.
    #[instrument(level = "info", skip_all)]
    pub async fn refresh_and_publish<T>(
        &self,
        transport: &Arc<T>,
        endpoints: &Endpoints,
        config: BatchConfig,
    ) -> Result<Arc<Snapshot>, FetchError>
    where
        T: Transport + 'static,
    {
        match refresh(transport, endpoints, config).await {
            Ok(snapshot) => {
                let published = self.publish(snapshot).await;
                info!(
                    stories = published.len(),
                    dropped = published.dropped(),
                    "Published new snapshot"
                );
                Ok(published)
            }
            Err(e) => {
                let stale = self.current().await;
                warn!(
                    error = %e,
                    keeping_previous = stale.is_some(),
                    "Refresh failed; published snapshot unchanged"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::error::FailureKind;
    use std::time::Duration;

    fn config(batch_size: usize) -> BatchConfig {
        BatchConfig {
            batch_size,
            item_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = SnapshotStore::new();
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_on_success() {
        let store = SnapshotStore::new();
        let transport = Arc::new(
            MockTransport::new()
                .with_top(&[1, 2])
                .with_story(1, 3, "https://a.com")
                .with_story(2, 4, "https://b.com"),
        );

        let published = store
            .refresh_and_publish(&transport, &MockTransport::endpoints(), config(2))
            .await
            .unwrap();

        let current = store.current().await.unwrap();
        assert!(Arc::ptr_eq(&published, &current));
        assert_eq!(current.len(), 2);
        assert_eq!(current.stories[0].id, 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let store = SnapshotStore::new();
        let good = Arc::new(
            MockTransport::new()
                .with_top(&[1])
                .with_story(1, 3, "https://a.com"),
        );
        let first = store
            .refresh_and_publish(&good, &MockTransport::endpoints(), config(1))
            .await
            .unwrap();

        // Upstream now returns too few identifiers.
        let short = Arc::new(MockTransport::new().with_top(&[]));
        let err = store
            .refresh_and_publish(&short, &MockTransport::endpoints(), config(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InsufficientData);

        let current = store.current().await.unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }

    #[tokio::test]
    async fn test_failed_first_refresh_leaves_store_empty() {
        let store = SnapshotStore::new();
        let transport = Arc::new(MockTransport::new());
        assert!(
            store
                .refresh_and_publish(&transport, &MockTransport::endpoints(), config(1))
                .await
                .is_err()
        );
        assert!(store.current().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_batch() {
        const N: u64 = 20;
        let mut transport = MockTransport::new()
            .with_top(&(1..=N).collect::<Vec<_>>())
            .with_latency(4);
        for id in 1..=N {
            transport = transport.with_story(id, id as i64, "https://example.com");
        }
        let transport = Arc::new(transport);
        let store = Arc::new(SnapshotStore::new());

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for _ in 0..200 {
                        if let Some(snapshot) = store.current().await {
                            assert_eq!(snapshot.len(), N as usize);
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            store
                .refresh_and_publish(&transport, &MockTransport::endpoints(), config(N as usize))
                .await
                .unwrap();
        }

        for result in futures::future::join_all(readers).await {
            result.unwrap();
        }
    }
}
