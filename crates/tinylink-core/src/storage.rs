use crate::error::Result;
use crate::record::UrlEntry;
use async_trait::async_trait;

/// The contract every storage backend implements.
///
/// Callers are backend-agnostic: the in-memory map, the file-snapshot
/// wrapper, and the relational backend all expose these operations with
/// identical externally observable semantics. Backends may diverge only in
/// error wording, performance, and how long `delete_batch` takes under
/// real I/O.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Creates a new record owned by `owner_id`.
    ///
    /// This is create-only: if the id already exists — live or tombstoned —
    /// the call returns [`StorageError::Conflict`] naming that id and the
    /// store is left unchanged. An id, once assigned, is never reassigned.
    /// An entry whose URL fails [`validate_url`](crate::record::validate_url)
    /// is rejected with `InvalidData` before anything is stored.
    ///
    /// [`StorageError::Conflict`]: crate::error::StorageError::Conflict
    async fn add_url(&self, entry: &UrlEntry, owner_id: &str) -> Result<()>;

    /// Bulk-inserts a pre-validated batch under one owner.
    ///
    /// Unlike [`add_url`](Storage::add_url), this path does not enforce
    /// per-element uniqueness: a duplicate id within the batch or against
    /// an existing record never fails the call (map backends overwrite it,
    /// the relational backend skips it). Batch import callers pre-filter
    /// conflicts. The batch is validated up front, though: any entry whose
    /// URL fails [`validate_url`](crate::record::validate_url) rejects the
    /// whole batch with `InvalidData` and nothing is stored.
    async fn add_batch_url(&self, entries: &[UrlEntry], owner_id: &str) -> Result<()>;

    /// Looks up the original URL for a short id.
    ///
    /// Returns `Ok(None)` for an id that was never assigned, and
    /// [`StorageError::Deleted`] for an id that exists but is tombstoned —
    /// the two outcomes are deliberately distinguishable.
    ///
    /// [`StorageError::Deleted`]: crate::error::StorageError::Deleted
    async fn get_url(&self, id: &str) -> Result<Option<String>>;

    /// Lists every live record owned by `owner_id`, in no particular order.
    ///
    /// Tombstoned records are excluded. The empty owner id matches records
    /// created anonymously.
    async fn get_user_urls(&self, owner_id: &str) -> Result<Vec<UrlEntry>>;

    /// Tombstones every id in `ids` that exists, is live, and is owned by
    /// `owner_id`; all other ids are silently skipped.
    ///
    /// Best-effort per id, not transactional across the batch, and
    /// idempotent: re-deleting a tombstoned id is a no-op.
    async fn delete_batch(&self, ids: &[String], owner_id: &str) -> Result<()>;

    /// Releases backend resources. Snapshot-backed stores persist here, so
    /// callers must let `close` finish before exiting.
    async fn close(&self) -> Result<()>;
}
