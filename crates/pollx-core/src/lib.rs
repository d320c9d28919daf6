//! pollx core - the in-memory poll aggregate
//!
//! This crate provides:
//! - Poll → SubPoll → PollOption domain model with derived back-references
//! - JSON encoding of a whole poll tree
//! - Tree validation run before persistence
//! - The user directory seam
//! - The error facility and the structured logging facility

pub mod directory;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod rules;

// Re-exported for the logging macros
#[doc(hidden)]
pub use pollx_core_types as core_types;
#[doc(hidden)]
pub use tracing;

pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use errors::{ExError, ExErrorKind, PollError, Result};
pub use model::{Access, Poll, PollOption, Role, SubPoll, User};
