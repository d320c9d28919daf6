//! pollx store - SQLite persistence for the poll aggregate
//!
//! Provides:
//! - Connection management and embedded, checksummed migrations
//! - Flat persistence records mirroring each domain entity
//! - Generic storage primitives over those records
//! - The reconciler that makes storage structurally equal to a poll tree
//! - Read reconstruction of whole trees, access grants and a SQLite-backed
//!   user directory

pub mod db;
pub mod errors;
pub mod migrations;
pub mod records;
pub mod repo;

pub use errors::Result;
pub use repo::reconcile::{ChangeCounts, ReconcileReport};
pub use repo::SqliteUserDirectory;
