//! Storage primitives
//!
//! Table-generic reads and writes over `Record` types. The reconciler and the
//! read path are written entirely in terms of these.

#![allow(clippy::result_large_err)]

use crate::errors::{corrupt_row, from_rusqlite, Result};
use crate::records::{uuid_value, Record};
use pollx_core::ExError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

/// SQLite storage primitives
pub struct SqliteRepo;

impl SqliteRepo {
    /// Look up one record by identifier
    ///
    /// Absence is `Ok(None)`; callers decide whether that is an error.
    pub fn find_by_id<R: Record>(conn: &Connection, id: Uuid) -> Result<Option<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            R::select_columns(),
            R::TABLE
        );
        conn.query_row(&sql, [id.to_string()], R::from_row)
            .optional()
            .map_err(decode_error::<R>)
    }

    /// Every record of a table in its natural order
    pub fn find_all<R: Record>(conn: &Connection) -> Result<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            R::select_columns(),
            R::TABLE,
            R::ORDER_BY
        );
        Self::query(conn, &sql, Vec::new())
    }

    pub fn insert<R: Record>(conn: &Connection, record: &R) -> Result<()> {
        let columns = R::select_columns();
        let placeholders = (1..=R::MUTABLE_COLUMNS.len() + 3)
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            columns,
            placeholders
        );

        let mut values = vec![
            uuid_value(record.id()),
            Value::Integer(record.created_at().timestamp()),
            Value::Integer(record.updated_at().timestamp()),
        ];
        values.extend(record.mutable_values());

        conn.execute(&sql, params_from_iter(values))
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Overwrite the mutable columns of an existing record in place
    ///
    /// `id` and `created_at` are never touched. Returns the number of rows
    /// changed (0 when the id is unknown).
    pub fn update_fields<R: Record>(conn: &Connection, record: &R) -> Result<usize> {
        let assignments = R::MUTABLE_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET updated_at = ?1, {} WHERE id = ?{}",
            R::TABLE,
            assignments,
            R::MUTABLE_COLUMNS.len() + 2
        );

        let mut values = vec![Value::Integer(record.updated_at().timestamp())];
        values.extend(record.mutable_values());
        values.push(uuid_value(record.id()));

        conn.execute(&sql, params_from_iter(values))
            .map_err(from_rusqlite)
    }

    /// Records whose parent column equals `parent_id`
    pub fn find_children<R: Record>(conn: &Connection, parent_id: Uuid) -> Result<Vec<R>> {
        Self::find_where_not_in(conn, parent_id, &[])
    }

    /// Records under `parent_id` whose identifier is not in `keep`
    ///
    /// An empty keep-set selects every child of the parent.
    pub fn find_where_not_in<R: Record>(
        conn: &Connection,
        parent_id: Uuid,
        keep: &[Uuid],
    ) -> Result<Vec<R>> {
        let Some(parent_column) = R::PARENT_COLUMN else {
            return Self::find_all(conn);
        };

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            R::select_columns(),
            R::TABLE,
            parent_column
        );
        if !keep.is_empty() {
            let placeholders = (2..=keep.len() + 1)
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" AND id NOT IN ({})", placeholders));
        }
        sql.push_str(&format!(" ORDER BY {}", R::ORDER_BY));

        let mut values = vec![uuid_value(parent_id)];
        values.extend(keep.iter().map(|id| uuid_value(*id)));
        Self::query(conn, &sql, values)
    }

    /// Delete one record; returns whether a row was removed
    pub fn delete_by_id<R: Record>(conn: &Connection, id: Uuid) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
        let removed = conn
            .execute(&sql, [id.to_string()])
            .map_err(from_rusqlite)?;
        Ok(removed > 0)
    }

    /// Delete every record whose `column` equals `id`
    pub fn delete_where<R: Record>(conn: &Connection, column: &str, id: Uuid) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", R::TABLE, column);
        conn.execute(&sql, [id.to_string()]).map_err(from_rusqlite)
    }

    fn query<R: Record>(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<Vec<R>> {
        let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params_from_iter(values), R::from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error::<R>)?;
        Ok(rows)
    }
}

/// A row that exists but cannot become an `R` is corrupt, not missing
fn decode_error<R: Record>(err: rusqlite::Error) -> ExError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => corrupt_row(R::TABLE, err),
        other => from_rusqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use crate::records::{PollRecord, SubPollRecord};
    use chrono::Utc;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    fn poll_record(name: &str) -> PollRecord {
        let now = Utc::now();
        PollRecord {
            id: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
            admin_id: Uuid::now_v7(),
            name: name.to_string(),
        }
    }

    fn sub_poll_record(poll_id: Uuid, position: i64) -> SubPollRecord {
        let now = Utc::now();
        SubPollRecord {
            id: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
            poll_id,
            position,
            title: format!("Q{}", position),
            description: String::new(),
            open: false,
        }
    }

    #[test]
    fn test_out_of_range_timestamp_is_corrupt_row() {
        let conn = setup();
        let id = Uuid::now_v7();
        conn.execute(
            "INSERT INTO polls (id, created_at, updated_at, admin_id, name)
             VALUES (?1, ?2, ?2, ?3, 'Broken')",
            rusqlite::params![id.to_string(), i64::MAX, Uuid::now_v7().to_string()],
        )
        .unwrap();

        let err = SqliteRepo::find_by_id::<PollRecord>(&conn, id).unwrap_err();
        assert_eq!(err.op(), Some("decode_row"));
        assert!(err.message().contains("polls"));

        let err = SqliteRepo::find_all::<PollRecord>(&conn).unwrap_err();
        assert_eq!(err.op(), Some("decode_row"));
    }

    #[test]
    fn test_find_by_id_absent_is_none() {
        let conn = setup();
        let found: Option<PollRecord> = SqliteRepo::find_by_id(&conn, Uuid::now_v7()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_insert_then_update_keeps_identity() {
        let conn = setup();
        let mut record = poll_record("Lunch");
        SqliteRepo::insert(&conn, &record).unwrap();

        record.name = "Dinner".to_string();
        assert_eq!(SqliteRepo::update_fields(&conn, &record).unwrap(), 1);

        let stored: PollRecord = SqliteRepo::find_by_id(&conn, record.id).unwrap().unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(stored.name, "Dinner");
        assert_eq!(SqliteRepo::find_all::<PollRecord>(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_find_where_not_in_scopes_by_parent() {
        let conn = setup();
        let a = poll_record("A");
        let b = poll_record("B");
        SqliteRepo::insert(&conn, &a).unwrap();
        SqliteRepo::insert(&conn, &b).unwrap();

        let keep = sub_poll_record(a.id, 0);
        let drop = sub_poll_record(a.id, 1);
        let other = sub_poll_record(b.id, 0);
        for s in [&keep, &drop, &other] {
            SqliteRepo::insert(&conn, s).unwrap();
        }

        let stale: Vec<SubPollRecord> =
            SqliteRepo::find_where_not_in(&conn, a.id, &[keep.id]).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, drop.id);

        let all_of_a: Vec<SubPollRecord> = SqliteRepo::find_children(&conn, a.id).unwrap();
        assert_eq!(
            all_of_a.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![keep.id, drop.id]
        );
    }

    #[test]
    fn test_delete_by_id_reports_absence() {
        let conn = setup();
        let record = poll_record("Lunch");
        SqliteRepo::insert(&conn, &record).unwrap();

        assert!(SqliteRepo::delete_by_id::<PollRecord>(&conn, record.id).unwrap());
        assert!(!SqliteRepo::delete_by_id::<PollRecord>(&conn, record.id).unwrap());
    }
}
