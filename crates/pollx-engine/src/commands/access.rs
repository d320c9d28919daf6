//! Access grant commands and queries
//!
//! Tokens are never logged; events carry the poll and user ids only.

#![allow(clippy::result_large_err)]

use pollx_core::{log_op_end, log_op_start, Access, ExError, UserDirectory};
use pollx_core_types::RequestContext;
use pollx_store::errors::Result;
use pollx_store::repo::access;
use rusqlite::Connection;
use uuid::Uuid;

use super::fail;

/// Grant `user_id` access to `poll_id`; the user must be known to the directory
pub fn access_grant(
    ctx: &RequestContext,
    conn: &Connection,
    directory: &dyn UserDirectory,
    user_id: Uuid,
    poll_id: Uuid,
) -> Result<Access> {
    log_op_start!(
        "access_grant",
        request_id = %ctx.request_id,
        poll_id = %poll_id,
        user_id = %user_id
    );

    let granted = directory
        .require_user(user_id)
        .map_err(ExError::from)
        .and_then(|user| access::grant(conn, &user, poll_id))
        .map_err(|e| fail("access_grant", ctx, e))?;

    log_op_end!(
        "access_grant",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        poll_id = %poll_id,
        user_id = %user_id
    );

    Ok(granted)
}

pub fn access_get_by_token(
    ctx: &RequestContext,
    conn: &Connection,
    directory: &dyn UserDirectory,
    token: &str,
) -> Result<Access> {
    log_op_start!("access_get_by_token", request_id = %ctx.request_id);

    let grant = access::get_by_token(conn, directory, token)
        .map_err(|e| fail("access_get_by_token", ctx, e))?;

    log_op_end!(
        "access_get_by_token",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        poll_id = %grant.poll_id,
        user_id = %grant.user.id
    );

    Ok(grant)
}

pub fn access_list(
    ctx: &RequestContext,
    conn: &Connection,
    directory: &dyn UserDirectory,
    poll_id: Uuid,
) -> Result<Vec<Access>> {
    log_op_start!(
        "access_list",
        request_id = %ctx.request_id,
        poll_id = %poll_id
    );

    let grants = access::list(conn, directory, poll_id)
        .map_err(|e| fail("access_list", ctx, e))?;

    log_op_end!(
        "access_list",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        count = grants.len() as u64
    );

    Ok(grants)
}

/// Grants on every poll `admin_id` administers
pub fn access_list_as_admin(
    ctx: &RequestContext,
    conn: &Connection,
    directory: &dyn UserDirectory,
    admin_id: Uuid,
) -> Result<Vec<Access>> {
    log_op_start!(
        "access_list_as_admin",
        request_id = %ctx.request_id,
        user_id = %admin_id
    );

    let grants = access::list_as_admin(conn, directory, admin_id)
        .map_err(|e| fail("access_list_as_admin", ctx, e))?;

    log_op_end!(
        "access_list_as_admin",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        count = grants.len() as u64
    );

    Ok(grants)
}

pub fn access_revoke(
    ctx: &RequestContext,
    conn: &Connection,
    user_id: Uuid,
    poll_id: Uuid,
) -> Result<()> {
    log_op_start!(
        "access_revoke",
        request_id = %ctx.request_id,
        poll_id = %poll_id,
        user_id = %user_id
    );

    access::revoke(conn, user_id, poll_id).map_err(|e| fail("access_revoke", ctx, e))?;

    log_op_end!(
        "access_revoke",
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id,
        poll_id = %poll_id,
        user_id = %user_id
    );

    Ok(())
}
