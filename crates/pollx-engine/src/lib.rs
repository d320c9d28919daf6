//! pollx engine - the repository façade
//!
//! Whole-tree reads and reconciling writes over an explicitly passed storage
//! handle, with boundary logging and per-poll write serialization.

pub mod commands;
pub mod locks;
pub mod repository;

pub use locks::PollLocks;
pub use repository::PollRepository;
