//! Access grant persistence
//!
//! Grants sit beside the poll tree: one opaque token per (user, poll). Only
//! the user id is stored; the user is resolved through the directory on read.

#![allow(clippy::result_large_err)]

use chrono::Utc;
use pollx_core::{Access, PollError, User, UserDirectory};
use pollx_core_types::Sensitive;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::errors::{from_rusqlite, Result};
use crate::records::{uuid_at, PollRecord};
use crate::repo::SqliteRepo;

struct GrantRow {
    token: String,
    user_id: Uuid,
    poll_id: Uuid,
}

fn grant_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GrantRow> {
    Ok(GrantRow {
        token: row.get(0)?,
        user_id: uuid_at(row, 1)?,
        poll_id: uuid_at(row, 2)?,
    })
}

fn resolve(directory: &dyn UserDirectory, row: GrantRow) -> Result<Access> {
    let user = directory.require_user(row.user_id)?;
    Ok(Access {
        token: Sensitive::new(row.token),
        user,
        poll_id: row.poll_id,
    })
}

/// Grant `user` access to a stored poll
///
/// Granting twice returns the existing grant unchanged.
pub fn grant(conn: &Connection, user: &User, poll_id: Uuid) -> Result<Access> {
    if SqliteRepo::find_by_id::<PollRecord>(conn, poll_id)?.is_none() {
        return Err(PollError::PollNotFound { poll_id }.into());
    }

    let existing: Option<String> = conn
        .query_row(
            "SELECT token FROM access_grants WHERE user_id = ?1 AND poll_id = ?2",
            [user.id.to_string(), poll_id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    if let Some(token) = existing {
        return Ok(Access {
            token: Sensitive::new(token),
            user: user.clone(),
            poll_id,
        });
    }

    let access = Access::issue(user.clone(), poll_id);
    let now = Utc::now().timestamp();
    conn.execute(
        "INSERT INTO access_grants (token, created_at, updated_at, user_id, poll_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            access.token.expose(),
            now,
            now,
            user.id.to_string(),
            poll_id.to_string(),
        ],
    )
    .map_err(from_rusqlite)?;

    tracing::debug!(poll_id = %poll_id, user_id = %user.id, "granted access");
    Ok(access)
}

/// Resolve a token to its grant; an unknown token is `AccessNotFound`
pub fn get_by_token(
    conn: &Connection,
    directory: &dyn UserDirectory,
    token: &str,
) -> Result<Access> {
    let row = conn
        .query_row(
            "SELECT token, user_id, poll_id FROM access_grants WHERE token = ?1",
            [token],
            grant_row,
        )
        .optional()
        .map_err(from_rusqlite)?
        .ok_or(PollError::AccessNotFound)?;

    resolve(directory, row)
}

/// All grants on one poll, oldest first
pub fn list(
    conn: &Connection,
    directory: &dyn UserDirectory,
    poll_id: Uuid,
) -> Result<Vec<Access>> {
    query_grants(
        conn,
        directory,
        "SELECT token, user_id, poll_id FROM access_grants
         WHERE poll_id = ?1 ORDER BY created_at, token",
        poll_id,
    )
}

/// All grants on polls administered by `admin_id`
pub fn list_as_admin(
    conn: &Connection,
    directory: &dyn UserDirectory,
    admin_id: Uuid,
) -> Result<Vec<Access>> {
    query_grants(
        conn,
        directory,
        "SELECT g.token, g.user_id, g.poll_id FROM access_grants g
         JOIN polls p ON p.id = g.poll_id
         WHERE p.admin_id = ?1 ORDER BY g.created_at, g.token",
        admin_id,
    )
}

fn query_grants(
    conn: &Connection,
    directory: &dyn UserDirectory,
    sql: &str,
    key: Uuid,
) -> Result<Vec<Access>> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([key.to_string()], grant_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter().map(|row| resolve(directory, row)).collect()
}

/// Remove the grant of `user_id` on `poll_id`
pub fn revoke(conn: &Connection, user_id: Uuid, poll_id: Uuid) -> Result<()> {
    let removed = conn
        .execute(
            "DELETE FROM access_grants WHERE user_id = ?1 AND poll_id = ?2",
            [user_id.to_string(), poll_id.to_string()],
        )
        .map_err(from_rusqlite)?;

    if removed == 0 {
        return Err(PollError::AccessNotFound.into());
    }
    tracing::debug!(poll_id = %poll_id, user_id = %user_id, "revoked access");
    Ok(())
}

/// Drop every grant on a poll; part of the poll's cascading delete
pub fn delete_for_poll(conn: &Connection, poll_id: Uuid) -> Result<usize> {
    conn.execute(
        "DELETE FROM access_grants WHERE poll_id = ?1",
        [poll_id.to_string()],
    )
    .map_err(from_rusqlite)
}
