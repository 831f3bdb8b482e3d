use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tinylink_core::error::{Result, StorageError};
use tinylink_core::record::{validate_url, UrlEntry, UrlRecord};
use tinylink_core::storage::Storage;

/// Map value for one short id.
///
/// A named struct rather than a packed string, so owner and tombstone state
/// stay queryable without re-parsing.
#[derive(Debug, Clone)]
pub(crate) struct StoredUrl {
    pub(crate) owner_id: String,
    pub(crate) original_url: String,
    pub(crate) deleted: bool,
}

/// In-memory implementation of the [`Storage`] contract.
///
/// One coarse reader/writer lock guards the whole map: reads share, writes
/// exclude. Scans are O(n) regardless, so finer-grained locking would not
/// change the complexity here. The lock is never held across I/O.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, StoredUrl>>,
}

type Records<'a> = RwLockReadGuard<'a, HashMap<String, StoredUrl>>;
type RecordsMut<'a> = RwLockWriteGuard<'a, HashMap<String, StoredUrl>>;

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<Records<'_>> {
        self.records
            .read()
            .map_err(|_| StorageError::Operation("storage lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RecordsMut<'_>> {
        self.records
            .write()
            .map_err(|_| StorageError::Operation("storage lock poisoned".to_string()))
    }

    /// Replays one persisted record, tombstone state included.
    ///
    /// Used by the snapshot-backed wrapper while loading; deliberately
    /// bypasses the conflict check, since the snapshot is the authority.
    pub(crate) fn load_record(&self, record: UrlRecord) -> Result<()> {
        let mut records = self.write()?;
        records.insert(
            record.short_id,
            StoredUrl {
                owner_id: record.owner_id,
                original_url: record.original_url,
                deleted: record.deleted,
            },
        );
        Ok(())
    }

    /// Copies out every record, tombstones included, for snapshotting.
    pub(crate) fn dump_records(&self) -> Result<Vec<UrlRecord>> {
        let records = self.read()?;
        Ok(records
            .iter()
            .map(|(short_id, stored)| UrlRecord {
                short_id: short_id.clone(),
                original_url: stored.original_url.clone(),
                owner_id: stored.owner_id.clone(),
                deleted: stored.deleted,
            })
            .collect())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn add_url(&self, entry: &UrlEntry, owner_id: &str) -> Result<()> {
        validate_url(&entry.original_url)?;

        let mut records = self.write()?;
        if records.contains_key(&entry.short_id) {
            return Err(StorageError::Conflict(entry.short_id.clone()));
        }
        records.insert(
            entry.short_id.clone(),
            StoredUrl {
                owner_id: owner_id.to_string(),
                original_url: entry.original_url.clone(),
                deleted: false,
            },
        );
        Ok(())
    }

    async fn add_batch_url(&self, entries: &[UrlEntry], owner_id: &str) -> Result<()> {
        // Whole batch validated before anything is stored.
        for entry in entries {
            validate_url(&entry.original_url)?;
        }

        // One lock acquisition for the whole batch; duplicates overwrite
        // last-write-wins (bulk-import semantics, conflicts pre-filtered
        // by the caller).
        let mut records = self.write()?;
        for entry in entries {
            records.insert(
                entry.short_id.clone(),
                StoredUrl {
                    owner_id: owner_id.to_string(),
                    original_url: entry.original_url.clone(),
                    deleted: false,
                },
            );
        }
        Ok(())
    }

    async fn get_url(&self, id: &str) -> Result<Option<String>> {
        let records = self.read()?;
        match records.get(id) {
            None => Ok(None),
            Some(stored) if stored.deleted => Err(StorageError::Deleted(id.to_string())),
            Some(stored) => Ok(Some(stored.original_url.clone())),
        }
    }

    async fn get_user_urls(&self, owner_id: &str) -> Result<Vec<UrlEntry>> {
        let records = self.read()?;
        Ok(records
            .iter()
            .filter(|(_, stored)| !stored.deleted && stored.owner_id == owner_id)
            .map(|(short_id, stored)| UrlEntry::new(short_id, &stored.original_url))
            .collect())
    }

    async fn delete_batch(&self, ids: &[String], owner_id: &str) -> Result<()> {
        let mut records = self.write()?;
        for id in ids {
            if let Some(stored) = records.get_mut(id) {
                if !stored.deleted && stored.owner_id == owner_id {
                    stored.deleted = true;
                }
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
