//! Reconciler - makes storage structurally equal to an in-memory poll tree
//!
//! Walks the tree top-down. At each level the node's own record is upserted,
//! stored children absent from the in-memory keep-set are cascade-deleted,
//! and every surviving or new child is reconciled one level down. Votes are
//! the leaf level, keyed by user.
//!
//! Deletes always run children before parents. The public entry points wrap
//! the whole walk in one immediate transaction.

#![allow(clippy::result_large_err)]

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pollx_core::rules::validate_poll;
use pollx_core::{Poll, PollError, PollOption, SubPoll};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::errors::{from_rusqlite, Result};
use crate::records::{OptionRecord, PollRecord, Record, SubPollRecord, VoteRecord};
use crate::repo::access;
use crate::repo::SqliteRepo;

/// What a single-record upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Row changes for one entity kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChangeCounts {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl ChangeCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Rows inserted, updated or deleted
    pub fn changed(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Per-entity summary of one reconciliation or cascading delete
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub polls: ChangeCounts,
    pub sub_polls: ChangeCounts,
    pub options: ChangeCounts,
    pub votes: ChangeCounts,
}

impl ReconcileReport {
    /// Counts summed over every entity kind
    pub fn total(&self) -> ChangeCounts {
        [self.polls, self.sub_polls, self.options, self.votes]
            .iter()
            .fold(ChangeCounts::default(), |acc, c| ChangeCounts {
                inserted: acc.inserted + c.inserted,
                updated: acc.updated + c.updated,
                deleted: acc.deleted + c.deleted,
                unchanged: acc.unchanged + c.unchanged,
            })
    }

    /// True when storage was left exactly as it was
    pub fn is_noop(&self) -> bool {
        self.polls.changed() == 0
            && self.sub_polls.changed() == 0
            && self.options.changed() == 0
            && self.votes.changed() == 0
    }
}

/// Insert `record` if its id is unknown, otherwise overwrite its mutable
/// columns when any of them differ
pub fn upsert_record<R: Record>(conn: &Connection, record: &R) -> Result<Outcome> {
    match SqliteRepo::find_by_id::<R>(conn, record.id())? {
        None => {
            SqliteRepo::insert(conn, record)?;
            Ok(Outcome::Inserted)
        }
        Some(existing) if existing.mutable_values() == record.mutable_values() => {
            Ok(Outcome::Unchanged)
        }
        Some(_) => {
            SqliteRepo::update_fields(conn, record)?;
            Ok(Outcome::Updated)
        }
    }
}

/// Reconcile a whole poll tree in one transaction
///
/// The tree is validated first; an invalid tree leaves storage untouched.
pub fn upsert_poll(conn: &mut Connection, poll: &Poll) -> Result<ReconcileReport> {
    validate_poll(poll)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;
    let report = upsert_poll_tx(&tx, poll)?;
    tx.commit().map_err(from_rusqlite)?;

    Ok(report)
}

/// Reconcile a poll tree on a connection that is already inside a transaction
pub fn upsert_poll_tx(conn: &Connection, poll: &Poll) -> Result<ReconcileReport> {
    let now = Utc::now();
    let mut report = ReconcileReport::default();

    let record = PollRecord::from_domain(poll, now);
    let outcome = upsert_record(conn, &record)?;
    tracing::debug!(poll_id = %record.id, ?outcome, "reconciled poll");
    report.polls.record(outcome);

    let keep: Vec<Uuid> = poll.sub_polls().iter().map(SubPoll::id).collect();
    let stale: Vec<SubPollRecord> = SqliteRepo::find_where_not_in(conn, record.id, &keep)?;
    for sub_poll in stale {
        delete_sub_poll_cascade(conn, sub_poll.id, &mut report)?;
    }

    for (position, sub_poll) in poll.sub_polls().iter().enumerate() {
        upsert_sub_poll(conn, sub_poll, &record, position, now, &mut report)?;
    }

    Ok(report)
}

fn upsert_sub_poll(
    conn: &Connection,
    sub_poll: &SubPoll,
    parent: &PollRecord,
    position: usize,
    now: DateTime<Utc>,
    report: &mut ReconcileReport,
) -> Result<()> {
    let record = SubPollRecord::from_domain(sub_poll, parent, position, now);
    let outcome = upsert_record(conn, &record)?;
    tracing::debug!(sub_poll_id = %record.id, ?outcome, "reconciled sub-poll");
    report.sub_polls.record(outcome);

    let keep: Vec<Uuid> = sub_poll.options().iter().map(PollOption::id).collect();
    let stale: Vec<OptionRecord> = SqliteRepo::find_where_not_in(conn, record.id, &keep)?;
    for option in stale {
        delete_option_cascade(conn, option.id, report)?;
    }

    for (position, option) in sub_poll.options().iter().enumerate() {
        upsert_option(conn, option, &record, position, now, report)?;
    }

    Ok(())
}

fn upsert_option(
    conn: &Connection,
    option: &PollOption,
    parent: &SubPollRecord,
    position: usize,
    now: DateTime<Utc>,
    report: &mut ReconcileReport,
) -> Result<()> {
    let record = OptionRecord::from_domain(option, parent, position, now);
    let outcome = upsert_record(conn, &record)?;
    tracing::debug!(option_id = %record.id, ?outcome, "reconciled option");
    report.options.record(outcome);

    reconcile_votes(conn, option, &record, now, report)
}

/// Votes are keyed by user: one row per (option, user)
fn reconcile_votes(
    conn: &Connection,
    option: &PollOption,
    parent: &OptionRecord,
    now: DateTime<Utc>,
    report: &mut ReconcileReport,
) -> Result<()> {
    let voters: HashSet<Uuid> = option.votes().iter().map(|u| u.id).collect();
    let stored: Vec<VoteRecord> = SqliteRepo::find_children(conn, parent.id)?;
    let mut present = HashSet::new();

    for mut vote in stored {
        if !voters.contains(&vote.user_id) {
            SqliteRepo::delete_by_id::<VoteRecord>(conn, vote.id)?;
            tracing::debug!(option_id = %parent.id, user_id = %vote.user_id, "removed vote");
            report.votes.deleted += 1;
            continue;
        }

        present.insert(vote.user_id);
        if vote.sub_poll_id == parent.sub_poll_id {
            report.votes.unchanged += 1;
        } else {
            // Option moved to another SubPoll
            vote.sub_poll_id = parent.sub_poll_id;
            vote.updated_at = now;
            SqliteRepo::update_fields(conn, &vote)?;
            report.votes.updated += 1;
        }
    }

    for voter in option.votes() {
        if !present.insert(voter.id) {
            continue;
        }
        SqliteRepo::insert(conn, &VoteRecord::new(voter.id, parent, now))?;
        tracing::debug!(option_id = %parent.id, user_id = %voter.id, "recorded vote");
        report.votes.inserted += 1;
    }

    Ok(())
}

/// Delete a poll, its grants and everything it owns
///
/// An unknown id is `PollNotFound`.
pub fn delete_poll(conn: &mut Connection, poll_id: Uuid) -> Result<ReconcileReport> {
    in_immediate_tx(conn, |tx| {
        if SqliteRepo::find_by_id::<PollRecord>(tx, poll_id)?.is_none() {
            return Err(PollError::PollNotFound { poll_id }.into());
        }
        let mut report = ReconcileReport::default();
        delete_poll_cascade(tx, poll_id, &mut report)?;
        Ok(report)
    })
}

/// Delete one SubPoll with its options and votes
pub fn delete_sub_poll(conn: &mut Connection, sub_poll_id: Uuid) -> Result<ReconcileReport> {
    in_immediate_tx(conn, |tx| {
        if SqliteRepo::find_by_id::<SubPollRecord>(tx, sub_poll_id)?.is_none() {
            return Err(PollError::SubPollNotFound { sub_poll_id }.into());
        }
        let mut report = ReconcileReport::default();
        delete_sub_poll_cascade(tx, sub_poll_id, &mut report)?;
        Ok(report)
    })
}

/// Delete one option with its votes
pub fn delete_option(conn: &mut Connection, option_id: Uuid) -> Result<ReconcileReport> {
    in_immediate_tx(conn, |tx| {
        if SqliteRepo::find_by_id::<OptionRecord>(tx, option_id)?.is_none() {
            return Err(PollError::OptionNotFound { option_id }.into());
        }
        let mut report = ReconcileReport::default();
        delete_option_cascade(tx, option_id, &mut report)?;
        Ok(report)
    })
}

fn in_immediate_tx<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;
    let value = f(&*tx)?;
    tx.commit().map_err(from_rusqlite)?;
    Ok(value)
}

fn delete_poll_cascade(
    conn: &Connection,
    poll_id: Uuid,
    report: &mut ReconcileReport,
) -> Result<()> {
    let sub_polls: Vec<SubPollRecord> = SqliteRepo::find_children(conn, poll_id)?;
    for sub_poll in sub_polls {
        delete_sub_poll_cascade(conn, sub_poll.id, report)?;
    }

    let grants = access::delete_for_poll(conn, poll_id)?;
    if SqliteRepo::delete_by_id::<PollRecord>(conn, poll_id)? {
        report.polls.deleted += 1;
    }
    tracing::debug!(poll_id = %poll_id, grants, "deleted poll");
    Ok(())
}

fn delete_sub_poll_cascade(
    conn: &Connection,
    sub_poll_id: Uuid,
    report: &mut ReconcileReport,
) -> Result<()> {
    let options: Vec<OptionRecord> = SqliteRepo::find_children(conn, sub_poll_id)?;
    for option in options {
        delete_option_cascade(conn, option.id, report)?;
    }

    if SqliteRepo::delete_by_id::<SubPollRecord>(conn, sub_poll_id)? {
        report.sub_polls.deleted += 1;
    }
    tracing::debug!(sub_poll_id = %sub_poll_id, "deleted sub-poll");
    Ok(())
}

fn delete_option_cascade(
    conn: &Connection,
    option_id: Uuid,
    report: &mut ReconcileReport,
) -> Result<()> {
    report.votes.deleted += SqliteRepo::delete_where::<VoteRecord>(conn, "option_id", option_id)?;

    if SqliteRepo::delete_by_id::<OptionRecord>(conn, option_id)? {
        report.options.deleted += 1;
    }
    tracing::debug!(option_id = %option_id, "deleted option");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use pollx_core::{Role, User};

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_upsert_record_discriminates_outcomes() {
        let conn = setup();
        let admin = User::new("A", "a@example.com", Role::PollAdmin);
        let mut poll = Poll::new(admin, "Lunch");
        let now = Utc::now();

        let record = PollRecord::from_domain(&poll, now);
        assert_eq!(upsert_record(&conn, &record).unwrap(), Outcome::Inserted);
        assert_eq!(upsert_record(&conn, &record).unwrap(), Outcome::Unchanged);

        poll.name = "Brunch".to_string();
        let record = PollRecord::from_domain(&poll, now);
        assert_eq!(upsert_record(&conn, &record).unwrap(), Outcome::Updated);
        assert_eq!(count(&conn, "polls"), 1);
    }

    #[test]
    fn test_invalid_tree_leaves_storage_untouched() {
        let mut conn = setup();
        let admin = User::new("A", "a@example.com", Role::PollAdmin);
        let mut poll = Poll::new(admin, "Lunch");
        let sub_poll = poll.add_sub_poll("Where", "");
        let duplicate = PollOption::restore(sub_poll.id(), "Clash", "");
        sub_poll.attach_option(duplicate);

        let err = upsert_poll(&mut conn, &poll).unwrap_err();
        assert_eq!(err.kind(), pollx_core::ExErrorKind::Validation);
        assert_eq!(count(&conn, "polls"), 0);
    }

    #[test]
    fn test_delete_unknown_ids_are_not_found() {
        let mut conn = setup();
        assert!(delete_poll(&mut conn, Uuid::now_v7())
            .unwrap_err()
            .is_not_found());
        assert!(delete_sub_poll(&mut conn, Uuid::now_v7())
            .unwrap_err()
            .is_not_found());
        assert!(delete_option(&mut conn, Uuid::now_v7())
            .unwrap_err()
            .is_not_found());
    }
}
