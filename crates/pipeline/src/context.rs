//! Ambient scopes for the current thread
//!
//! - `DisabledLoggingScope` forces logging off while alive.
//! - `QueueScope` routes queued writes to a different worker while alive.
//!
//! Both are RAII guards: the previous state is restored on drop, including
//! during unwinding. Scopes nest and are bound to the creating thread.
//!
//! # Example
//!
//! ```
//! use eventlog_pipeline::{DisabledLoggingScope, logging_disabled};
//!
//! assert!(!logging_disabled());
//! {
//!     let _quiet = DisabledLoggingScope::new();
//!     assert!(logging_disabled());
//! }
//! assert!(!logging_disabled());
//! ```

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use crate::queue::QueueHandle;

thread_local! {
    static DISABLED: Cell<usize> = const { Cell::new(0) };
    static QUEUES: RefCell<Vec<QueueHandle>> = const { RefCell::new(Vec::new()) };
}

/// Whether logging is forced off for the current thread
#[inline]
pub fn logging_disabled() -> bool {
    DISABLED.with(Cell::get) > 0
}

/// Innermost queue override for the current thread
pub fn current_queue() -> Option<QueueHandle> {
    QUEUES.with(|queues| queues.borrow().last().cloned())
}

/// Forces logging off for the current thread while alive
#[must_use = "logging is re-enabled as soon as the scope is dropped"]
pub struct DisabledLoggingScope {
    _not_send: PhantomData<*const ()>,
}

impl DisabledLoggingScope {
    pub fn new() -> Self {
        DISABLED.with(|count| count.set(count.get() + 1));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Default for DisabledLoggingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DisabledLoggingScope {
    fn drop(&mut self) {
        DISABLED.with(|count| count.set(count.get().saturating_sub(1)));
    }
}

/// Substitutes a queue worker for queued writes on the current thread
#[must_use = "the override ends as soon as the scope is dropped"]
pub struct QueueScope {
    _not_send: PhantomData<*const ()>,
}

impl QueueScope {
    pub fn new(handle: QueueHandle) -> Self {
        QUEUES.with(|queues| queues.borrow_mut().push(handle));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for QueueScope {
    fn drop(&mut self) {
        QUEUES.with(|queues| {
            queues.borrow_mut().pop();
        });
    }
}
