//! Captured error chains
//!
//! Rust errors carry no runtime type or stack, so `ExceptionInfo` snapshots
//! what is available at capture time: the display message, the static type
//! name of the outermost error, an optional backtrace, and the `source()`
//! chain as nested inner exceptions.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Type label used for errors reached through `source()`
const SOURCE_TYPE_NAME: &str = "source";

/// Snapshot of an error attached to an event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Display message of the error
    pub message: String,

    /// Full type name of the error
    pub type_name: String,

    /// Captured stack trace, if backtraces are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    /// Error that caused this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    /// Create an exception snapshot from explicit parts
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            type_name: type_name.into(),
            stack_trace: None,
            inner: None,
        }
    }

    /// Attach a stack trace
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Attach an inner exception
    #[must_use]
    pub fn with_inner(mut self, inner: ExceptionInfo) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    /// Capture a typed error, its source chain and (if enabled) a backtrace
    ///
    /// Backtraces follow the usual `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`
    /// switches; with them unset no stack trace is recorded.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let backtrace = Backtrace::capture();
        let stack_trace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            message: err.to_string(),
            type_name: std::any::type_name::<E>().to_string(),
            stack_trace,
            inner: err.source().map(|source| Box::new(Self::from_source(source))),
        }
    }

    /// Capture an error reached through `source()` (type not known statically)
    pub fn from_source(err: &(dyn Error + 'static)) -> Self {
        Self {
            message: err.to_string(),
            type_name: SOURCE_TYPE_NAME.to_string(),
            stack_trace: None,
            inner: err.source().map(|source| Box::new(Self::from_source(source))),
        }
    }

    /// Render message, type and stack trace of the whole chain
    ///
    /// Output is deterministic for a given snapshot, which lets enrichment
    /// detect an already-appended rendering by suffix comparison.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        if depth > 0 {
            out.push_str("\n\nInner exception:\n");
        }
        let _ = write!(out, "Message: {}\nException type: {}", self.message, self.type_name);
        if let Some(ref trace) = self.stack_trace {
            let _ = write!(out, "\nStack trace:\n{}", trace.trim_end());
        }
        if let Some(ref inner) = self.inner {
            inner.render_into(out, depth + 1);
        }
    }

    /// Number of errors in the chain, including this one
    pub fn depth(&self) -> usize {
        1 + self.inner.as_ref().map_or(0, |inner| inner.depth())
    }
}
