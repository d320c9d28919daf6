//! Boundary event macros
//!
//! Every event carries `component`, `op` and `event`; callers append their
//! own fields (ids, counts) after the required ones.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_boundary {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::$event,
            $($($field)*)?
        )
    };
}

/// Entry into an operation
///
/// ```
/// # use pollx_core::log_op_start;
/// log_op_start!("poll_upsert");
/// log_op_start!("poll_upsert", poll_id = "p1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_boundary!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Successful exit; `duration_ms` is required
///
/// ```
/// # use pollx_core::log_op_end;
/// log_op_end!("poll_upsert", duration_ms = 3);
/// log_op_end!("poll_upsert", duration_ms = 3, inserted = 4u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_boundary!(info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?)
    };
}

/// Failed exit
///
/// `$err` is anything convertible into `ExError`; its kind and code are
/// recorded as `err_kind` and `err_code`.
///
/// ```
/// # use pollx_core::log_op_error;
/// # use pollx_core::errors::PollError;
/// log_op_error!("access_get", PollError::AccessNotFound, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_boundary!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
