use crate::error::{Result, StorageError};
use crate::short_id::short_id;
use serde::{Deserialize, Serialize};

/// Non-alphanumeric characters a URL may contain per RFC3986.
const ALLOWED_URL_PUNCTUATION: &str = ":/?#[]@!$&'()*+,;=-_.~%";
const MAX_URL_LENGTH: usize = 2048;

/// Checks that the user input at least resembles a URL: non-empty, within
/// reasonable length, and free of characters a URL cannot contain. No
/// parsing beyond that — callers may shorten whatever they want within
/// those limits.
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(StorageError::InvalidData(
            "original url is empty".to_string(),
        ));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(StorageError::InvalidData(format!(
            "original url exceeds {MAX_URL_LENGTH} characters"
        )));
    }
    if let Some(c) = url
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !ALLOWED_URL_PUNCTUATION.contains(*c))
    {
        return Err(StorageError::InvalidData(format!(
            "original url contains invalid character {c:?}"
        )));
    }
    Ok(())
}

/// A short id paired with the URL it redirects to.
///
/// This is the caller-facing shape: create operations take it, and
/// per-user listings return it. The owner and tombstone state are
/// backend-internal (see [`UrlRecord`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntry {
    pub short_id: String,
    pub original_url: String,
}

impl UrlEntry {
    pub fn new(short_id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            short_id: short_id.into(),
            original_url: original_url.into(),
        }
    }

    /// Builds an entry whose id is derived from the URL itself.
    pub fn from_original(original_url: impl Into<String>) -> Self {
        let original_url = original_url.into();
        Self {
            short_id: short_id(&original_url),
            original_url,
        }
    }
}

/// The full stored form of one shortened URL.
///
/// Snapshot files and relational rows mirror these fields exactly.
/// An empty `owner_id` is the valid anonymous owner, not a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub short_id: String,
    pub original_url: String,
    pub owner_id: String,
    pub deleted: bool,
}

impl UrlRecord {
    /// A freshly created, live record.
    pub fn new(entry: &UrlEntry, owner_id: impl Into<String>) -> Self {
        Self {
            short_id: entry.short_id.clone(),
            original_url: entry.original_url.clone(),
            owner_id: owner_id.into(),
            deleted: false,
        }
    }
}
