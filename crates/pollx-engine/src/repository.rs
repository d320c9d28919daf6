//! Repository façade
//!
//! Owns one storage handle and the user directory, both passed in explicitly.
//! Reads rebuild full trees; writes go through the reconciler under the
//! poll's lock. Every call runs under a fresh `RequestContext`.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::Arc;

use pollx_core::{Access, Poll, UserDirectory};
use pollx_core_types::RequestContext;
use pollx_store::errors::{from_rusqlite, Result};
use pollx_store::migrations::apply_migrations;
use pollx_store::records::{OptionRecord, SubPollRecord};
use pollx_store::repo::SqliteRepo;
use pollx_store::{db, ReconcileReport};
use rusqlite::Connection;
use uuid::Uuid;

use crate::commands::{access, poll};
use crate::locks::PollLocks;

pub struct PollRepository {
    conn: Connection,
    directory: Arc<dyn UserDirectory>,
    locks: PollLocks,
}

impl PollRepository {
    /// Open (and migrate) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P, directory: Arc<dyn UserDirectory>) -> Result<Self> {
        let mut conn = db::open(path)?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn, directory))
    }

    pub fn open_in_memory(directory: Arc<dyn UserDirectory>) -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn, directory))
    }

    /// Wrap an already-migrated connection
    pub fn new(conn: Connection, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            conn,
            directory,
            locks: PollLocks::new(),
        }
    }

    /// Share a lock registry with other façades over the same database
    pub fn with_locks(mut self, locks: PollLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &PollLocks {
        &self.locks
    }

    pub fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    /// Reconcile storage with `tree`
    ///
    /// Fails with `UserNotFound` before writing anything when the admin or a
    /// voter is unknown to the directory.
    pub fn upsert_poll(&mut self, tree: &Poll) -> Result<ReconcileReport> {
        let ctx = RequestContext::new();
        let conn = &mut self.conn;
        let directory = self.directory.as_ref();
        self.locks
            .with_poll(tree.id(), || poll::poll_upsert(&ctx, conn, directory, tree))
    }

    /// Every poll with its full tree
    pub fn get_polls(&self) -> Result<Vec<Poll>> {
        poll::poll_list(&RequestContext::new(), &self.conn, self.directory())
    }

    /// One poll with its full tree; an unknown id is `NotFound`
    pub fn get_poll(&self, poll_id: Uuid) -> Result<Poll> {
        poll::poll_get(&RequestContext::new(), &self.conn, self.directory(), poll_id)
    }

    pub fn delete_poll(&mut self, poll_id: Uuid) -> Result<ReconcileReport> {
        let ctx = RequestContext::new();
        let conn = &mut self.conn;
        let report = self
            .locks
            .with_poll(poll_id, || poll::poll_delete(&ctx, conn, poll_id))?;
        self.locks.release(poll_id)?;
        Ok(report)
    }

    pub fn delete_sub_poll(&mut self, sub_poll_id: Uuid) -> Result<ReconcileReport> {
        let ctx = RequestContext::new();
        let owner = SqliteRepo::find_by_id::<SubPollRecord>(&self.conn, sub_poll_id)?
            .map(|s| s.poll_id);
        let conn = &mut self.conn;
        match owner {
            Some(poll_id) => self
                .locks
                .with_poll(poll_id, || poll::sub_poll_delete(&ctx, conn, sub_poll_id)),
            None => poll::sub_poll_delete(&ctx, conn, sub_poll_id),
        }
    }

    pub fn delete_option(&mut self, option_id: Uuid) -> Result<ReconcileReport> {
        let ctx = RequestContext::new();
        let owner = match SqliteRepo::find_by_id::<OptionRecord>(&self.conn, option_id)? {
            Some(option) => {
                SqliteRepo::find_by_id::<SubPollRecord>(&self.conn, option.sub_poll_id)?
                    .map(|s| s.poll_id)
            }
            None => None,
        };
        let conn = &mut self.conn;
        match owner {
            Some(poll_id) => self
                .locks
                .with_poll(poll_id, || poll::option_delete(&ctx, conn, option_id)),
            None => poll::option_delete(&ctx, conn, option_id),
        }
    }

    pub fn grant_access(&self, user_id: Uuid, poll_id: Uuid) -> Result<Access> {
        access::access_grant(
            &RequestContext::new(),
            &self.conn,
            self.directory(),
            user_id,
            poll_id,
        )
    }

    pub fn get_access_by_token(&self, token: &str) -> Result<Access> {
        access::access_get_by_token(&RequestContext::new(), &self.conn, self.directory(), token)
    }

    pub fn list_access(&self, poll_id: Uuid) -> Result<Vec<Access>> {
        access::access_list(&RequestContext::new(), &self.conn, self.directory(), poll_id)
    }

    pub fn list_access_as_admin(&self, admin_id: Uuid) -> Result<Vec<Access>> {
        access::access_list_as_admin(
            &RequestContext::new(),
            &self.conn,
            self.directory(),
            admin_id,
        )
    }

    pub fn revoke_access(&self, user_id: Uuid, poll_id: Uuid) -> Result<()> {
        access::access_revoke(&RequestContext::new(), &self.conn, user_id, poll_id)
    }

    /// Close the storage handle
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| from_rusqlite(e))
    }
}
