//! Conversion of middleware/handler faults into 500 responses.
//!
//! Errors and panics are both caught here; nothing raised by application
//! code travels past the dispatcher.

use crate::response::{Response, GENERIC_FAULT_MESSAGE};
use hyper::StatusCode;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Run `f`, turning an `Err` or a panic into its message
pub(crate) fn catch_fault<F, T>(f: F) -> Result<T, String>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Force a 500 and write either the generic message or the fault detail
pub(crate) fn write_fault(res: &mut Response, detail: &str, is_production: bool) {
    error!(error = %detail, "Unhandled fault while executing request");

    res.set_status(StatusCode::INTERNAL_SERVER_ERROR)
        .wipe_content()
        .write_line(
            if is_production {
                GENERIC_FAULT_MESSAGE
            } else {
                detail
            },
            false,
        );
}
