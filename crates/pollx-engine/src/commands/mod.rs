//! Boundary commands and queries over the store

#![allow(clippy::result_large_err)]

pub mod access;
pub mod poll;

use pollx_core::{log_op_error, ExError};
use pollx_core_types::RequestContext;

/// Tag `err` with the operation and request id, and emit the end_error event
pub(crate) fn fail(op: &str, ctx: &RequestContext, err: ExError) -> ExError {
    let err = err.with_op(op).with_request_id(ctx.request_id);
    log_op_error!(
        op,
        err.clone(),
        duration_ms = ctx.elapsed_ms(),
        request_id = %ctx.request_id
    );
    err
}
