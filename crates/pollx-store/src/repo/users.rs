//! Local user directory backed by the `users` table

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use pollx_core::{PollError, Role, User, UserDirectory};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use crate::records::uuid_at;

const SELECT_USER: &str = "SELECT id, name, email, role FROM users";

fn user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
    })?;
    Ok(User {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role,
    })
}

/// Insert a user; a duplicate id or email is a persistence error
pub fn create_user(conn: &Connection, user: &User) -> Result<()> {
    let now = Utc::now().timestamp();
    conn.execute(
        "INSERT INTO users (id, created_at, updated_at, name, email, role)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            user.id.to_string(),
            now,
            now,
            user.name,
            user.email,
            user.role.as_str(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_USER),
        [id.to_string()],
        user_row,
    )
    .optional()
    .map_err(from_rusqlite)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("{} WHERE email = ?1", SELECT_USER),
        [email],
        user_row,
    )
    .optional()
    .map_err(from_rusqlite)
}

/// Every user ordered by name, then id
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn
        .prepare(&format!("{} ORDER BY name, id", SELECT_USER))
        .map_err(from_rusqlite)?;
    let users = stmt
        .query_map([], user_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(users)
}

pub fn delete_user(conn: &Connection, id: Uuid) -> Result<()> {
    let removed = conn
        .execute("DELETE FROM users WHERE id = ?1", [id.to_string()])
        .map_err(from_rusqlite)?;
    if removed == 0 {
        return Err(PollError::UserNotFound { user_id: id }.into());
    }
    Ok(())
}

/// `UserDirectory` over its own SQLite connection
///
/// Holds a separate handle from the poll repository so the two can be used
/// independently; both point at the same database file.
pub struct SqliteUserDirectory {
    conn: Mutex<Connection>,
}

impl SqliteUserDirectory {
    /// Open (and migrate) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut conn = db::open(path)?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| PollError::LockPoisoned {
            resource: "user_directory".to_string(),
        })?;
        f(&*conn)
    }

    pub fn create(&self, user: &User) -> Result<()> {
        self.with_conn(|conn| create_user(conn, user))
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_by_email(conn, email))
    }

    pub fn list(&self) -> Result<Vec<User>> {
        self.with_conn(list_users)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.with_conn(|conn| delete_user(conn, id))
    }
}

impl UserDirectory for SqliteUserDirectory {
    fn get_user(&self, id: Uuid) -> pollx_core::Result<Option<User>> {
        let conn = self.conn.lock().map_err(|_| PollError::LockPoisoned {
            resource: "user_directory".to_string(),
        })?;
        get_user(&conn, id).map_err(|e| PollError::DirectoryUnavailable {
            message: e.to_string(),
        })
    }
}
