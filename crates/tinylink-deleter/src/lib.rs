//! Asynchronous soft-delete pipeline for the tinylink URL shortener.
//!
//! Delete requests are fire-and-forget: the HTTP layer answers "accepted"
//! before any tombstone is written, then this pipeline applies the ids
//! against the active storage backend with bounded fan-out. See
//! [`UrlDeleter`].

pub mod deleter;

pub use deleter::{DeleterSettings, UrlDeleter};
