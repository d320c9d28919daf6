//! Persistence records
//!
//! One flat, relationally-shaped record per domain entity. Every record has
//! `id`, `created_at` and `updated_at` plus its own columns, and at most one
//! foreign key to its immediate parent. A vote carries both its option and
//! the option's SubPoll.

use chrono::{DateTime, Utc};
use pollx_core::{Poll, PollOption, SubPoll};
use rusqlite::types::{Type, Value};
use rusqlite::Row;
use uuid::Uuid;

/// A row type the storage primitives can read and write
///
/// Columns are always selected as `id, created_at, updated_at` followed by
/// `MUTABLE_COLUMNS` in declaration order; `from_row` and `mutable_values`
/// must agree with that order.
pub trait Record: Sized {
    const TABLE: &'static str;
    /// Foreign key to the immediate parent (`None` for the root)
    const PARENT_COLUMN: Option<&'static str>;
    /// Columns an upsert may overwrite
    const MUTABLE_COLUMNS: &'static [&'static str];
    const ORDER_BY: &'static str;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn mutable_values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Comma-separated column list matching `from_row`
    fn select_columns() -> String {
        let mut columns = vec!["id", "created_at", "updated_at"];
        columns.extend_from_slice(Self::MUTABLE_COLUMNS);
        columns.join(", ")
    }
}

pub(crate) fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {} out of range", secs).into(),
        )
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub admin_id: Uuid,
    pub name: String,
}

impl PollRecord {
    pub fn from_domain(poll: &Poll, now: DateTime<Utc>) -> Self {
        Self {
            id: poll.id(),
            created_at: now,
            updated_at: now,
            admin_id: poll.admin.id,
            name: poll.name.clone(),
        }
    }
}

impl Record for PollRecord {
    const TABLE: &'static str = "polls";
    const PARENT_COLUMN: Option<&'static str> = None;
    const MUTABLE_COLUMNS: &'static [&'static str] = &["admin_id", "name"];
    const ORDER_BY: &'static str = "created_at, rowid";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn mutable_values(&self) -> Vec<Value> {
        vec![uuid_value(self.admin_id), Value::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_at(row, 0)?,
            created_at: timestamp_at(row, 1)?,
            updated_at: timestamp_at(row, 2)?,
            admin_id: uuid_at(row, 3)?,
            name: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubPollRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub poll_id: Uuid,
    /// Index within the parent poll's sequence
    pub position: i64,
    pub title: String,
    pub description: String,
    pub open: bool,
}

impl SubPollRecord {
    pub fn from_domain(
        sub_poll: &SubPoll,
        parent: &PollRecord,
        position: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: sub_poll.id(),
            created_at: now,
            updated_at: now,
            poll_id: parent.id,
            position: position as i64,
            title: sub_poll.title.clone(),
            description: sub_poll.description.clone(),
            open: sub_poll.open,
        }
    }
}

impl Record for SubPollRecord {
    const TABLE: &'static str = "sub_polls";
    const PARENT_COLUMN: Option<&'static str> = Some("poll_id");
    const MUTABLE_COLUMNS: &'static [&'static str] =
        &["poll_id", "position", "title", "description", "open"];
    const ORDER_BY: &'static str = "position, id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn mutable_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.poll_id),
            Value::Integer(self.position),
            Value::Text(self.title.clone()),
            Value::Text(self.description.clone()),
            Value::Integer(i64::from(self.open)),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_at(row, 0)?,
            created_at: timestamp_at(row, 1)?,
            updated_at: timestamp_at(row, 2)?,
            poll_id: uuid_at(row, 3)?,
            position: row.get(4)?,
            title: row.get(5)?,
            description: row.get(6)?,
            open: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sub_poll_id: Uuid,
    pub position: i64,
    pub title: String,
    pub description: String,
}

impl OptionRecord {
    pub fn from_domain(
        option: &PollOption,
        parent: &SubPollRecord,
        position: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: option.id(),
            created_at: now,
            updated_at: now,
            sub_poll_id: parent.id,
            position: position as i64,
            title: option.title.clone(),
            description: option.description.clone(),
        }
    }
}

impl Record for OptionRecord {
    const TABLE: &'static str = "options";
    const PARENT_COLUMN: Option<&'static str> = Some("sub_poll_id");
    const MUTABLE_COLUMNS: &'static [&'static str] =
        &["sub_poll_id", "position", "title", "description"];
    const ORDER_BY: &'static str = "position, id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn mutable_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.sub_poll_id),
            Value::Integer(self.position),
            Value::Text(self.title.clone()),
            Value::Text(self.description.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_at(row, 0)?,
            created_at: timestamp_at(row, 1)?,
            updated_at: timestamp_at(row, 2)?,
            sub_poll_id: uuid_at(row, 3)?,
            position: row.get(4)?,
            title: row.get(5)?,
            description: row.get(6)?,
        })
    }
}

/// One user's vote for one option
#[derive(Debug, Clone, PartialEq)]
pub struct VoteRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub option_id: Uuid,
    pub sub_poll_id: Uuid,
    pub user_id: Uuid,
}

impl VoteRecord {
    pub fn new(user_id: Uuid, parent: &OptionRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
            option_id: parent.id,
            sub_poll_id: parent.sub_poll_id,
            user_id,
        }
    }
}

impl Record for VoteRecord {
    const TABLE: &'static str = "votes";
    const PARENT_COLUMN: Option<&'static str> = Some("option_id");
    const MUTABLE_COLUMNS: &'static [&'static str] = &["option_id", "sub_poll_id", "user_id"];
    const ORDER_BY: &'static str = "created_at, rowid";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn mutable_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.option_id),
            uuid_value(self.sub_poll_id),
            uuid_value(self.user_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_at(row, 0)?,
            created_at: timestamp_at(row, 1)?,
            updated_at: timestamp_at(row, 2)?,
            option_id: uuid_at(row, 3)?,
            sub_poll_id: uuid_at(row, 4)?,
            user_id: uuid_at(row, 5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollx_core::{Role, User};

    #[test]
    fn test_select_columns_follow_mutable_order() {
        assert_eq!(
            SubPollRecord::select_columns(),
            "id, created_at, updated_at, poll_id, position, title, description, open"
        );
        assert_eq!(
            PollRecord::select_columns(),
            "id, created_at, updated_at, admin_id, name"
        );
    }

    #[test]
    fn test_mutable_values_match_column_count() {
        let admin = User::new("A", "a@example.com", Role::PollAdmin);
        let mut poll = Poll::new(admin, "Lunch");
        poll.add_sub_poll("Where", "").add_option("Pizza", "");
        let now = Utc::now();

        let p = PollRecord::from_domain(&poll, now);
        let s = SubPollRecord::from_domain(&poll.sub_polls()[0], &p, 0, now);
        let o = OptionRecord::from_domain(&poll.sub_polls()[0].options()[0], &s, 0, now);
        let v = VoteRecord::new(Uuid::now_v7(), &o, now);

        assert_eq!(p.mutable_values().len(), PollRecord::MUTABLE_COLUMNS.len());
        assert_eq!(s.mutable_values().len(), SubPollRecord::MUTABLE_COLUMNS.len());
        assert_eq!(o.mutable_values().len(), OptionRecord::MUTABLE_COLUMNS.len());
        assert_eq!(v.mutable_values().len(), VoteRecord::MUTABLE_COLUMNS.len());
        assert_eq!(v.sub_poll_id, s.id);
    }
}
