//! Operation logging macros
//!
//! `FrolfContext` brackets `ensure_schema`, `save` and `query` with these:
//! one `start` event when the operation begins, then exactly one `end`
//! (with `duration_ms` and the row counts it touched) or `end_error` (with
//! the error's kind, code and message). Field names and event names come
//! from `frolf_core_types::schema`, so callers must depend on that crate.
//!
//! Extra fields are passed through to `tracing` as written, e.g.
//! `entity_kind = "round"` or `inserted = summary.inserted`.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:expr, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::event!(
            $level,
            component = module_path!(),
            op = $op,
            event = $event
            $(, $($field)*)?
        )
    };
}

/// Emit the `start` event of a context operation
///
/// ```
/// # use frolf_core::log_op_start;
/// log_op_start!("ensure_schema");
/// log_op_start!("query", entity_kind = "hole_score");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            tracing::Level::INFO,
            $op,
            frolf_core_types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Emit the `end` event of a context operation
///
/// `duration_ms` comes first; row counts follow.
///
/// ```
/// # use frolf_core::log_op_end;
/// log_op_end!("save", duration_ms = 4, inserted = 12, updated = 0, deleted = 1);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            tracing::Level::INFO,
            $op,
            frolf_core_types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Emit the `end_error` event of a failed context operation
///
/// Takes the error by reference; anything convertible into `ExError` is
/// accepted, so a domain `FrolfError` logs with its mapped code.
///
/// ```
/// # use frolf_core::{log_op_error, errors::{ExError, ExErrorKind}};
/// let err = ExError::new(ExErrorKind::Schema).with_message("checksum mismatch");
/// log_op_error!("ensure_schema", &err, duration_ms = 2);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = ::std::clone::Clone::clone($err).into();
        $crate::__log_op_event!(
            tracing::Level::ERROR,
            $op,
            frolf_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message()
            $(, $($field)*)?
        )
    }};
}
