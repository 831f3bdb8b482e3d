use std::sync::Arc;

use tinylink_core::storage::Storage;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Tuning knobs for the deletion pipeline.
///
/// These trade throughput against backend load; none of them is a
/// correctness boundary. Zero values are clamped up to one.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct DeleterSettings {
    /// Ids handed to the backend in one `delete_batch` call.
    #[builder(default = 32)]
    pub chunk_size: usize,
    /// How many chunk deletions may run against the backend at once.
    /// This is the admission pool width shared by all submissions.
    #[builder(default = 4)]
    pub max_in_flight: usize,
    /// Inputs shorter than this skip fan-out and delete in a single call;
    /// chunking overhead is not worth it for a handful of ids.
    #[builder(default = 4)]
    pub direct_threshold: usize,
}

impl Default for DeleterSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Fire-and-forget deletion front end over a storage backend.
///
/// [`submit`](UrlDeleter::submit) returns before any tombstone is written;
/// the originating request has already been answered, so nothing here
/// reports back to it. For the same reason the spawned work is detached:
/// cancelling the request that triggered a deletion must not cancel the
/// deletion itself. Worker errors are logged and dropped.
///
/// A relational backend pays real per-statement latency, so the input id
/// list is split into chunks and at most
/// [`max_in_flight`](DeleterSettings::max_in_flight) chunks run
/// concurrently. When the admission pool is full the dispatch loop waits
/// for a slot; that backpressure holds up the loop only, never the
/// submitter.
#[derive(Debug)]
pub struct UrlDeleter<S: Storage> {
    storage: Arc<S>,
    permits: Arc<Semaphore>,
    settings: DeleterSettings,
}

impl<S: Storage> Clone for UrlDeleter<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            permits: Arc::clone(&self.permits),
            settings: self.settings,
        }
    }
}

impl<S: Storage> UrlDeleter<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_settings(storage, DeleterSettings::default())
    }

    pub fn with_settings(storage: Arc<S>, settings: DeleterSettings) -> Self {
        let settings = DeleterSettings {
            chunk_size: settings.chunk_size.max(1),
            max_in_flight: settings.max_in_flight.max(1),
            direct_threshold: settings.direct_threshold,
        };
        Self {
            storage,
            permits: Arc::new(Semaphore::new(settings.max_in_flight)),
            settings,
        }
    }

    /// Accepts ids owned by `owner_id` for deletion and returns immediately.
    ///
    /// Deletion is eventually attempted, with no deadline and no
    /// caller-visible result; ids the owner does not own are silently
    /// skipped by the backend.
    pub fn submit(&self, ids: Vec<String>, owner_id: impl Into<String>) {
        if ids.is_empty() {
            return;
        }
        let deleter = self.clone();
        let owner_id = owner_id.into();
        tokio::spawn(async move {
            deleter.delete(ids, &owner_id).await;
        });
    }

    /// The dispatch loop behind [`submit`](UrlDeleter::submit): chunks the
    /// input, runs every chunk under the admission pool, and returns once
    /// all of them have completed. Exposed for callers that do want to wait
    /// (tests, shutdown paths).
    pub async fn delete(&self, ids: Vec<String>, owner_id: &str) {
        if ids.is_empty() {
            return;
        }

        if ids.len() < self.settings.direct_threshold {
            if let Err(err) = self.storage.delete_batch(&ids, owner_id).await {
                warn!(%err, ids = ids.len(), "batch delete failed");
            }
            return;
        }

        let mut workers = JoinSet::new();
        for chunk in ids.chunks(self.settings.chunk_size) {
            // Waits here when max_in_flight chunks are already running.
            // The semaphore is never closed, so acquire cannot fail.
            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                return;
            };

            let storage = Arc::clone(&self.storage);
            let chunk = chunk.to_vec();
            let owner_id = owner_id.to_string();
            debug!(ids = chunk.len(), "dispatching delete chunk");
            workers.spawn(async move {
                if let Err(err) = storage.delete_batch(&chunk, &owner_id).await {
                    warn!(%err, ids = chunk.len(), "delete chunk failed");
                }
                drop(permit);
            });
        }

        // No ordering guarantee between chunks; just drain them all.
        while workers.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tinylink_core::error::{Result, StorageError};
    use tinylink_core::record::UrlEntry;
    use tinylink_storage::MemoryStorage;

    async fn populated_store(count: usize, owner: &str) -> (Arc<MemoryStorage>, Vec<String>) {
        let store = Arc::new(MemoryStorage::new());
        let entries: Vec<UrlEntry> = (0..count)
            .map(|i| UrlEntry::new(format!("id-{i:04}"), format!("http://example.com/{i}")))
            .collect();
        store.add_batch_url(&entries, owner).await.unwrap();
        let ids = entries.into_iter().map(|e| e.short_id).collect();
        (store, ids)
    }

    async fn assert_all_deleted(store: &MemoryStorage, ids: &[String]) {
        for id in ids {
            let err = store.get_url(id).await.unwrap_err();
            assert!(err.is_deleted(), "{id} should be tombstoned");
        }
    }

    #[tokio::test]
    async fn deletes_every_id_across_pool_widths() {
        for width in [2, 3, 4] {
            let (store, ids) = populated_store(1000, "u1").await;
            let settings = DeleterSettings::builder()
                .chunk_size(32)
                .max_in_flight(width)
                .build();
            let deleter = UrlDeleter::with_settings(Arc::clone(&store), settings);

            deleter.delete(ids.clone(), "u1").await;

            assert_all_deleted(&store, &ids).await;
        }
    }

    #[tokio::test]
    async fn chunk_size_does_not_affect_completeness() {
        for chunk_size in [1, 7, 100, 5000] {
            let (store, ids) = populated_store(200, "u1").await;
            let settings = DeleterSettings::builder().chunk_size(chunk_size).build();
            let deleter = UrlDeleter::with_settings(Arc::clone(&store), settings);

            deleter.delete(ids.clone(), "u1").await;

            assert_all_deleted(&store, &ids).await;
        }
    }

    #[tokio::test]
    async fn small_input_takes_the_direct_path() {
        let (store, ids) = populated_store(3, "u1").await;
        let deleter = UrlDeleter::new(Arc::clone(&store));

        // Below direct_threshold (default 4): one delete_batch call, same
        // observable outcome.
        deleter.delete(ids.clone(), "u1").await;

        assert_all_deleted(&store, &ids).await;
    }

    #[tokio::test]
    async fn foreign_owner_ids_stay_live() {
        let (store, ids) = populated_store(50, "ownerA").await;
        let deleter = UrlDeleter::new(Arc::clone(&store));

        deleter.delete(ids.clone(), "ownerB").await;

        for id in &ids {
            let url = store.get_url(id).await.unwrap();
            assert!(url.is_some(), "{id} should still resolve");
        }
    }

    #[tokio::test]
    async fn submit_returns_immediately_and_quiesces() {
        let (store, ids) = populated_store(500, "u1").await;
        let deleter = UrlDeleter::new(Arc::clone(&store));

        deleter.submit(ids.clone(), "u1");

        // Poll until quiescent; the pipeline makes no deadline promise, so
        // give it generous headroom.
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if all_tombstoned(&store, &ids).await {
                return;
            }
        }
        panic!("pipeline did not quiesce");
    }

    async fn all_tombstoned(store: &MemoryStorage, ids: &[String]) -> bool {
        for id in ids {
            match store.get_url(id).await {
                Err(err) if err.is_deleted() => continue,
                _ => return false,
            }
        }
        true
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let (store, _) = populated_store(1, "u1").await;
        let deleter = UrlDeleter::new(Arc::clone(&store));

        deleter.submit(Vec::new(), "u1");
        deleter.delete(Vec::new(), "u1").await;
    }

    /// Backend that fails every delete; the pipeline must swallow the
    /// errors and still drain all chunks.
    #[derive(Debug, Default)]
    struct FailingStorage {
        delete_calls: AtomicUsize,
    }

    #[async_trait]
    impl tinylink_core::Storage for FailingStorage {
        async fn add_url(&self, _: &UrlEntry, _: &str) -> Result<()> {
            Ok(())
        }
        async fn add_batch_url(&self, _: &[UrlEntry], _: &str) -> Result<()> {
            Ok(())
        }
        async fn get_url(&self, _: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn get_user_urls(&self, _: &str) -> Result<Vec<UrlEntry>> {
            Ok(Vec::new())
        }
        async fn delete_batch(&self, _: &[String], _: &str) -> Result<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Unavailable("backend down".to_string()))
        }
        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn worker_errors_are_swallowed_not_propagated() {
        let store = Arc::new(FailingStorage::default());
        let settings = DeleterSettings::builder()
            .chunk_size(10)
            .max_in_flight(2)
            .build();
        let deleter = UrlDeleter::with_settings(Arc::clone(&store), settings);

        let ids: Vec<String> = (0..100).map(|i| format!("id-{i}")).collect();
        deleter.delete(ids, "u1").await;

        // 100 ids / 10 per chunk: every chunk was attempted despite the
        // failures.
        assert_eq!(store.delete_calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn zero_settings_are_clamped() {
        let (store, ids) = populated_store(20, "u1").await;
        let settings = DeleterSettings::builder()
            .chunk_size(0)
            .max_in_flight(0)
            .build();
        let deleter = UrlDeleter::with_settings(Arc::clone(&store), settings);

        deleter.delete(ids.clone(), "u1").await;

        assert_all_deleted(&store, &ids).await;
    }
}
