use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use tinylink_core::error::{Result, StorageError};
use tinylink_core::record::{UrlEntry, UrlRecord};
use tinylink_core::storage::Storage;
use tracing::{info, warn};

use crate::memory::MemoryStorage;

/// Snapshot line field separator. Tab never appears in a well-formed URL,
/// so fields need no escaping.
const FIELD_SEP: char = '\t';
const FIELDS_PER_LINE: usize = 4;

/// [`MemoryStorage`] with a file snapshot bolted on.
///
/// Construction replays the snapshot into the map before serving traffic;
/// `close` rewrites the whole file from the current map contents (truncate,
/// seek, write every record, flush). This is a full-snapshot rewrite, not an
/// append log, so `close` must run to completion before the process exits.
/// Disk I/O happens only at these two boundaries, never under the map lock
/// of a live request.
///
/// An empty path disables persistence entirely.
#[derive(Debug)]
pub struct FileStorage {
    inner: MemoryStorage,
    file: Mutex<Option<File>>,
}

impl FileStorage {
    /// Opens (creating if missing) the snapshot at `path` and loads it.
    pub fn open(path: &str) -> Result<Self> {
        let inner = MemoryStorage::new();
        if path.is_empty() {
            return Ok(Self {
                inner,
                file: Mutex::new(None),
            });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| StorageError::Io(format!("open {path}: {e}")))?;

        let storage = Self {
            inner,
            file: Mutex::new(Some(file)),
        };
        let loaded = storage.load()?;
        info!(path, records = loaded, "file storage opened");

        Ok(storage)
    }

    fn file(&self) -> Result<std::sync::MutexGuard<'_, Option<File>>> {
        self.file
            .lock()
            .map_err(|_| StorageError::Operation("snapshot file lock poisoned".to_string()))
    }

    /// Replays the snapshot into the map. Malformed lines are skipped, not
    /// fatal: a partially readable snapshot still serves what it can.
    fn load(&self) -> Result<usize> {
        let mut guard = self.file()?;
        let Some(file) = guard.as_mut() else {
            return Ok(0);
        };

        let mut loaded = 0;
        let reader = BufReader::new(&mut *file);
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| StorageError::Io(format!("read snapshot: {e}")))?;
            match parse_line(&line) {
                Some(record) => {
                    self.inner.load_record(record)?;
                    loaded += 1;
                }
                None if line.is_empty() => {}
                None => warn!(line = lineno + 1, "skipping malformed snapshot line"),
            }
        }

        Ok(loaded)
    }

    /// Rewrites the whole snapshot from the current map contents.
    fn save(&self, file: &File) -> Result<()> {
        let records = self.inner.dump_records()?;

        file.set_len(0)
            .map_err(|e| StorageError::Io(format!("truncate snapshot: {e}")))?;
        (&*file)
            .seek(SeekFrom::Start(0))
            .map_err(|e| StorageError::Io(format!("rewind snapshot: {e}")))?;

        let mut writer = BufWriter::new(file);
        for record in &records {
            writeln!(writer, "{}", format_line(record))
                .map_err(|e| StorageError::Io(format!("write snapshot: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| StorageError::Io(format!("flush snapshot: {e}")))?;
        file.sync_all()
            .map_err(|e| StorageError::Io(format!("sync snapshot: {e}")))?;

        info!(records = records.len(), "file storage snapshot written");
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<UrlRecord> {
    let fields: Vec<&str> = line.split(FIELD_SEP).collect();
    if fields.len() != FIELDS_PER_LINE {
        return None;
    }
    let deleted = match fields[2] {
        "true" => true,
        "false" => false,
        _ => return None,
    };
    Some(UrlRecord {
        short_id: fields[0].to_string(),
        owner_id: fields[1].to_string(),
        deleted,
        original_url: fields[3].to_string(),
    })
}

fn format_line(record: &UrlRecord) -> String {
    format!(
        "{sid}{sep}{owner}{sep}{deleted}{sep}{url}",
        sid = record.short_id,
        owner = record.owner_id,
        deleted = record.deleted,
        url = record.original_url,
        sep = FIELD_SEP,
    )
}

#[async_trait]
impl Storage for FileStorage {
    async fn add_url(&self, entry: &UrlEntry, owner_id: &str) -> Result<()> {
        self.inner.add_url(entry, owner_id).await
    }

    async fn add_batch_url(&self, entries: &[UrlEntry], owner_id: &str) -> Result<()> {
        self.inner.add_batch_url(entries, owner_id).await
    }

    async fn get_url(&self, id: &str) -> Result<Option<String>> {
        self.inner.get_url(id).await
    }

    async fn get_user_urls(&self, owner_id: &str) -> Result<Vec<UrlEntry>> {
        self.inner.get_user_urls(owner_id).await
    }

    async fn delete_batch(&self, ids: &[String], owner_id: &str) -> Result<()> {
        self.inner.delete_batch(ids, owner_id).await
    }

    /// Persists the snapshot and releases the file. Errors are surfaced —
    /// swallowing them here would silently lose data. Idempotent: a second
    /// close is a no-op.
    async fn close(&self) -> Result<()> {
        let mut guard = self.file()?;
        let Some(file) = guard.take() else {
            return Ok(());
        };
        self.save(&file)?;
        Ok(())
    }
}
