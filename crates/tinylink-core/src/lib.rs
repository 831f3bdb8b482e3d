//! Core types and traits for the tinylink URL shortener.
//!
//! This crate defines the record model, the storage contract every backend
//! implements, and the error taxonomy shared across backends. Concrete
//! backends live in `tinylink-storage`; the asynchronous soft-delete
//! pipeline lives in `tinylink-deleter`.

pub mod error;
pub mod record;
pub mod short_id;
pub mod storage;

pub use error::{Result, StorageError};
pub use record::{validate_url, UrlEntry, UrlRecord};
pub use short_id::short_id;
pub use storage::Storage;
