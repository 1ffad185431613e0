#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! Passive tracing sink.
//!
//! The framework calls a [`TraceHook`] at its key transition points (post,
//! publish, dispatch, pool traffic, scheduler switches). Hooks are
//! fire-and-forget: a failing sink is logged and otherwise ignored, it never
//! feeds back into scheduling.
//!
//! Record identifiers follow the QS numbering so existing host tools can
//! decode the stream produced by [`HdlcFramer`].

extern crate alloc;

use alloc::sync::Arc;

use thiserror::Error;

mod frame;
mod log_sink;
pub mod records;
#[cfg(any(test, feature = "std"))]
mod writer;

pub use frame::HdlcFramer;
pub use log_sink::{RecordLog, TraceRecord};
#[cfg(any(test, feature = "std"))]
pub use writer::WriterSink;

/// Maximum payload length accepted by the framed sinks.
pub const MAX_RECORD_LEN: usize = 64;

/// Errors raised by trace sinks.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("trace sink unavailable")]
    SinkUnavailable,
    #[cfg(any(test, feature = "std"))]
    #[error("backend error: {0}")]
    Backend(#[from] std::io::Error),
}

/// Callback receiving `(record id, payload, wants timestamp)`.
pub type TraceHook = Arc<dyn Fn(u8, &[u8], bool) -> Result<(), TraceError> + Send + Sync>;

/// Sends one record to the hook, if any.
pub fn emit(hook: Option<&TraceHook>, record: u8, payload: &[u8]) {
    if let Some(hook) = hook {
        if let Err(err) = hook(record, payload, true) {
            log::warn!("trace record {record} dropped: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_hook_is_a_no_op() {
        emit(None, records::qf::PUBLISH, &[1, 2, 3]);
    }

    #[test]
    fn failing_hook_does_not_propagate() {
        let hook: TraceHook = Arc::new(|_, _, _| Err(TraceError::SinkUnavailable));
        emit(Some(&hook), records::sched::LOCK, &[]);
    }
}
