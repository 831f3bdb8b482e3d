//! Storage backends for the tinylink URL shortener.
//!
//! Three interchangeable implementations of the [`Storage`] contract:
//!
//! - [`MemoryStorage`] — ephemeral in-process map.
//! - [`FileStorage`] — the map, snapshotted to a file at open/close.
//! - [`PgStorage`] — Postgres, for deployments that need durability and
//!   shared state across instances.
//!
//! [`Storage`]: tinylink_core::Storage

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use postgres::PgStorage;
