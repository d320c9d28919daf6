//! Poll commands and queries
//!
//! Boundary functions over the store. Each emits exactly one start event and
//! one end (or end_error) event carrying the request id:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure

#![allow(clippy::result_large_err)]

use std::collections::HashSet;

use pollx_core::rules::validate_poll;
use pollx_core::{log_op_end, log_op_start, ExError, Poll, UserDirectory};
use pollx_core_types::RequestContext;
use pollx_store::errors::Result;
use pollx_store::repo::{hydration, reconcile};
use pollx_store::ReconcileReport;
use rusqlite::Connection;
use uuid::Uuid;

use super::fail;

/// Every user the tree references must be known to the directory; reads
/// resolve them all, so a stored stranger would make the poll unreadable
fn require_members(directory: &dyn UserDirectory, poll: &Poll) -> pollx_core::Result<()> {
    directory.require_user(poll.admin.id)?;
    let mut checked = HashSet::from([poll.admin.id]);
    let voters = poll
        .sub_polls()
        .iter()
        .flat_map(|s| s.options())
        .flat_map(|o| o.votes());
    for voter in voters {
        if checked.insert(voter.id) {
            directory.require_user(voter.id)?;
        }
    }
    Ok(())
}

/// Make storage structurally equal to `poll`
///
/// The tree is validated and its admin and voters resolved before any row is
/// touched.
pub fn poll_upsert(
    ctx: &RequestContext,
    conn: &mut Connection,
    directory: &dyn UserDirectory,
    poll: &Poll,
) -> Result<ReconcileReport> {
    log_op_start!(
        "poll_upsert",
        request_id = %ctx.request_id,
        poll_id = %poll.id()
    );

    let report = validate_poll(poll)
        .and_then(|()| require_members(directory, poll))
        .map_err(ExError::from)
        .and_then(|()| reconcile::upsert_poll(conn, poll))
        .map_err(|e| fail("poll_upsert", ctx, e))?;

    let total = report.total();
    log_op_end!(
        "poll_upsert",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        poll_id = %poll.id(),
        inserted = total.inserted as u64,
        updated = total.updated as u64,
        deleted = total.deleted as u64
    );

    Ok(report)
}

/// Fetch one poll with its full tree
pub fn poll_get(
    ctx: &RequestContext,
    conn: &Connection,
    directory: &dyn UserDirectory,
    poll_id: Uuid,
) -> Result<Poll> {
    log_op_start!(
        "poll_get",
        request_id = %ctx.request_id,
        poll_id = %poll_id
    );

    let poll = hydration::load_poll(conn, directory, poll_id)
        .map_err(|e| fail("poll_get", ctx, e))?;

    log_op_end!(
        "poll_get",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        poll_id = %poll_id
    );

    Ok(poll)
}

/// Fetch every poll with its full tree
pub fn poll_list(
    ctx: &RequestContext,
    conn: &Connection,
    directory: &dyn UserDirectory,
) -> Result<Vec<Poll>> {
    log_op_start!("poll_list", request_id = %ctx.request_id);

    let polls = hydration::load_polls(conn, directory)
        .map_err(|e| fail("poll_list", ctx, e))?;

    log_op_end!(
        "poll_list",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        count = polls.len() as u64
    );

    Ok(polls)
}

/// Cascade-delete a poll and its grants
pub fn poll_delete(
    ctx: &RequestContext,
    conn: &mut Connection,
    poll_id: Uuid,
) -> Result<ReconcileReport> {
    log_op_start!(
        "poll_delete",
        request_id = %ctx.request_id,
        poll_id = %poll_id
    );

    let report = reconcile::delete_poll(conn, poll_id).map_err(|e| fail("poll_delete", ctx, e))?;

    log_op_end!(
        "poll_delete",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        poll_id = %poll_id
    );

    Ok(report)
}

pub fn sub_poll_delete(
    ctx: &RequestContext,
    conn: &mut Connection,
    sub_poll_id: Uuid,
) -> Result<ReconcileReport> {
    log_op_start!(
        "sub_poll_delete",
        request_id = %ctx.request_id,
        sub_poll_id = %sub_poll_id
    );

    let report = reconcile::delete_sub_poll(conn, sub_poll_id)
        .map_err(|e| fail("sub_poll_delete", ctx, e))?;

    log_op_end!(
        "sub_poll_delete",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        sub_poll_id = %sub_poll_id
    );

    Ok(report)
}

pub fn option_delete(
    ctx: &RequestContext,
    conn: &mut Connection,
    option_id: Uuid,
) -> Result<ReconcileReport> {
    log_op_start!(
        "option_delete",
        request_id = %ctx.request_id,
        option_id = %option_id
    );

    let report = reconcile::delete_option(conn, option_id)
        .map_err(|e| fail("option_delete", ctx, e))?;

    log_op_end!(
        "option_delete",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        option_id = %option_id
    );

    Ok(report)
}
