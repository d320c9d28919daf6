//! Repository layer over SQLite
//!
//! `sqlite_repo` holds the table-generic primitives; `reconcile` writes poll
//! trees, `hydration` reads them back. Access grants and the local user
//! directory live beside the tree.

pub mod access;
pub mod hydration;
pub mod reconcile;
pub mod sqlite_repo;
pub mod users;

pub use sqlite_repo::SqliteRepo;
pub use users::SqliteUserDirectory;
