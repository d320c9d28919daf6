//! Hydration layer - rebuilds poll trees from SQLite
//!
//! Every child fetch is scoped to its immediate parent and ordered by
//! `position`, so a tree never picks up another poll's rows and sibling order
//! survives a round trip. Users are resolved through the directory.

#![allow(clippy::result_large_err)]

use std::collections::HashMap;

use pollx_core::{Poll, PollError, PollOption, SubPoll, User, UserDirectory};
use rusqlite::Connection;
use uuid::Uuid;

use crate::errors::Result;
use crate::records::{OptionRecord, PollRecord, SubPollRecord, VoteRecord};
use crate::repo::SqliteRepo;

/// Memoizes directory lookups for the duration of one load
struct Users<'a> {
    directory: &'a dyn UserDirectory,
    seen: HashMap<Uuid, User>,
}

impl<'a> Users<'a> {
    fn new(directory: &'a dyn UserDirectory) -> Self {
        Self {
            directory,
            seen: HashMap::new(),
        }
    }

    fn get(&mut self, id: Uuid) -> Result<User> {
        if let Some(user) = self.seen.get(&id) {
            return Ok(user.clone());
        }
        let user = self.directory.require_user(id)?;
        self.seen.insert(id, user.clone());
        Ok(user)
    }
}

/// Load one poll with its full SubPoll/option/vote tree
///
/// # Errors
/// * `PollNotFound` - no poll row has this id
/// * `UserNotFound` - the admin or a voter is unknown to the directory
pub fn load_poll(
    conn: &Connection,
    directory: &dyn UserDirectory,
    poll_id: Uuid,
) -> Result<Poll> {
    let record = SqliteRepo::find_by_id::<PollRecord>(conn, poll_id)?
        .ok_or(PollError::PollNotFound { poll_id })?;

    build_poll(conn, &mut Users::new(directory), record)
}

/// Load every poll, each with its full tree, oldest first
pub fn load_polls(conn: &Connection, directory: &dyn UserDirectory) -> Result<Vec<Poll>> {
    let mut users = Users::new(directory);
    SqliteRepo::find_all::<PollRecord>(conn)?
        .into_iter()
        .map(|record| build_poll(conn, &mut users, record))
        .collect()
}

fn build_poll(conn: &Connection, users: &mut Users<'_>, record: PollRecord) -> Result<Poll> {
    let admin = users.get(record.admin_id)?;
    let mut poll = Poll::restore(record.id, admin, record.name);

    for sub_poll in SqliteRepo::find_children::<SubPollRecord>(conn, record.id)? {
        let sub_poll = build_sub_poll(conn, users, sub_poll)?;
        poll.attach_sub_poll(sub_poll);
    }

    Ok(poll)
}

fn build_sub_poll(
    conn: &Connection,
    users: &mut Users<'_>,
    record: SubPollRecord,
) -> Result<SubPoll> {
    let mut sub_poll = SubPoll::restore(record.id, record.title, record.description, record.open);

    for option in SqliteRepo::find_children::<OptionRecord>(conn, record.id)? {
        let option = build_option(conn, users, option)?;
        sub_poll.attach_option(option);
    }

    Ok(sub_poll)
}

fn build_option(
    conn: &Connection,
    users: &mut Users<'_>,
    record: OptionRecord,
) -> Result<PollOption> {
    let mut option = PollOption::restore(record.id, record.title, record.description);

    for vote in SqliteRepo::find_children::<VoteRecord>(conn, record.id)? {
        option.add_vote(users.get(vote.user_id)?);
    }

    Ok(option)
}
