//! Schema migrations
//!
//! The SQL files under `migrations/` are embedded at compile time and applied
//! oldest first. `schema_version` records each applied id with a SHA-256 of
//! its SQL; an applied migration whose SQL has since changed is refused.

use std::collections::HashMap;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};

struct Migration {
    id: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "001_poll_schema",
        sql: include_str!("../migrations/001_poll_schema.sql"),
    },
    Migration {
        id: "002_access_grants",
        sql: include_str!("../migrations/002_access_grants.sql"),
    },
    Migration {
        id: "003_users",
        sql: include_str!("../migrations/003_users.sql"),
    },
];

const CREATE_SCHEMA_VERSION: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    migration_id TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL
)";

fn checksum(sql: &str) -> String {
    hex::encode(Sha256::digest(sql.as_bytes()))
}

/// Bring the schema up to date; safe to call on every open
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute(CREATE_SCHEMA_VERSION, [])
        .map_err(from_rusqlite)?;
    let recorded = recorded_checksums(conn)?;

    for migration in MIGRATIONS {
        let expected = checksum(migration.sql);
        match recorded.get(migration.id) {
            Some(stored) if *stored != expected => {
                return Err(checksum_mismatch(migration.id, stored, &expected));
            }
            Some(_) => continue,
            None => apply_one(conn, migration, &expected)?,
        }
    }
    Ok(())
}

/// Ids of every applied migration, oldest first
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY migration_id")
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<rusqlite::Result<Vec<String>>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}

fn recorded_checksums(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(from_rusqlite)?
        .collect::<rusqlite::Result<HashMap<String, String>>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

fn apply_one(conn: &mut Connection, migration: &Migration, checksum: &str) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![migration.id, chrono::Utc::now().timestamp_millis(), checksum],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id = migration.id, "applied migration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_gets_every_migration() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let applied = applied_migrations(&conn).unwrap();
        let expected: Vec<_> = MIGRATIONS.iter().map(|m| m.id.to_string()).collect();
        assert_eq!(applied, expected);
    }

    #[test]
    fn test_second_run_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        apply_migrations(&mut conn).unwrap();

        assert_eq!(applied_migrations(&conn).unwrap().len(), MIGRATIONS.len());
    }

    #[test]
    fn test_checksum_is_hex_sha256() {
        let sum = checksum("CREATE TABLE t (id TEXT)");
        assert_eq!(sum.len(), 64);
        assert!(sum.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(checksum("SELECT 1"), checksum("SELECT 2"));
    }
}
