//! Developer traces of model operations, with a per-thread capture buffer.
//!
//! Query benchmarks and write audits are mirrored into the buffer of the
//! calling thread while a [`CaptureGuard`] is alive, so tests can assert on
//! them without installing a global logger.

use std::cell::RefCell;

thread_local! {
    static CAPTURE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Stops capturing on the current thread when dropped.
#[must_use = "capture stops as soon as the guard is dropped"]
pub struct CaptureGuard(());

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURE.with(|c| *c.borrow_mut() = None);
    }
}

/// Start capturing trace lines emitted on this thread.
pub fn capture() -> CaptureGuard {
    CAPTURE.with(|c| *c.borrow_mut() = Some(Vec::new()));
    CaptureGuard(())
}

/// Append a line to this thread's buffer, if capturing.
pub fn record(line: &str) {
    CAPTURE.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut() {
            buf.push(line.to_owned());
        }
    });
}

/// Remove and return everything captured so far on this thread.
#[must_use]
pub fn take() -> Vec<String> {
    CAPTURE.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

/// Captured lines whose JSON `op` field equals `op`.
#[must_use]
pub fn lines_for_op(op: &str) -> Vec<serde_json::Value> {
    CAPTURE.with(|c| {
        c.borrow()
            .iter()
            .flatten()
            .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
            .filter(|v| v["op"] == op)
            .collect()
    })
}

/// Emit a developer trace: captured per thread and logged at TRACE on
/// [`TRACE_TARGET`](crate::utils::logger::TRACE_TARGET).
#[macro_export]
macro_rules! model_trace {
    ($($arg:tt)*) => {{
        let __line = format!($($arg)*);
        $crate::utils::devlog::record(&__line);
        log::log!(target: $crate::utils::logger::TRACE_TARGET, log::Level::Trace, "{}", __line);
    }};
}
