//! Subcommand implementations
//!
//! Each command opens the repository once, runs, and closes it before
//! returning.

use std::error::Error;
use std::sync::Arc;

use pollx_engine::PollRepository;
use pollx_store::SqliteUserDirectory;

use crate::config::Config;

pub mod access;
pub mod poll;
pub mod user;

pub type CommandResult = Result<(), Box<dyn Error>>;

fn ensure_parent_dir(config: &Config) -> CommandResult {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// The user directory over the configured database
pub(crate) fn open_directory(config: &Config) -> Result<SqliteUserDirectory, Box<dyn Error>> {
    ensure_parent_dir(config)?;
    Ok(SqliteUserDirectory::open(&config.db_path)?)
}

/// The façade over the configured database, resolving users locally
pub(crate) fn open_repository(config: &Config) -> Result<PollRepository, Box<dyn Error>> {
    let directory = Arc::new(open_directory(config)?);
    Ok(PollRepository::open(&config.db_path, directory)?)
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn parse_id(text: &str, what: &str) -> Result<uuid::Uuid, Box<dyn Error>> {
    uuid::Uuid::parse_str(text).map_err(|e| format!("invalid {} id '{}': {}", what, text, e).into())
}

pub fn init(config: &Config) -> CommandResult {
    open_repository(config)?.close()?;
    println!("Initialized {}", config.db_path.display());
    Ok(())
}
