//! Recursion guard - breaks re-entrant logging calls
//!
//! Every logging call on a thread enters a scope keyed by the record's
//! `EventKey`. While that scope is alive, entering again with an equal key on
//! the same thread is refused. Unrelated keys, and any key on another thread,
//! are unaffected.
//!
//! The guard also tracks nesting depth, which decides the failure policy: a
//! nested call propagates errors to its caller, the outermost call swallows
//! them into the fallback writer.
//!
//! # Example
//!
//! ```
//! use eventlog_pipeline::RecursionGuard;
//! use eventlog_protocol::{EventKey, EventType};
//!
//! let key = EventKey::new(EventType::Error, "DB", "TIMEOUT");
//!
//! let outer = RecursionGuard::enter(key.clone()).unwrap();
//! assert!(RecursionGuard::is_nested());
//! assert!(RecursionGuard::enter(key.clone()).is_none());
//!
//! drop(outer);
//! assert!(!RecursionGuard::is_nested());
//! assert!(RecursionGuard::enter(key).is_some());
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::marker::PhantomData;

use eventlog_protocol::EventKey;

thread_local! {
    /// Keys of the logging calls in progress on this thread
    static ACTIVE: RefCell<HashSet<EventKey>> = RefCell::new(HashSet::new());

    /// Number of logging calls in progress on this thread
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Entry point for scoped recursion tracking
pub struct RecursionGuard;

impl RecursionGuard {
    /// Enter a logging scope for `key`
    ///
    /// Returns `None` if a scope with an equal key is already active on this
    /// thread. The returned token releases the scope when dropped, including
    /// during unwinding.
    pub fn enter(key: EventKey) -> Option<ScopeToken> {
        let inserted = ACTIVE.with(|active| active.borrow_mut().insert(key.clone()));
        if !inserted {
            return None;
        }
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        Some(ScopeToken {
            key,
            _not_send: PhantomData,
        })
    }

    /// Whether a logging call is already in progress on this thread
    #[inline]
    pub fn is_nested() -> bool {
        Self::depth() > 0
    }

    /// Current nesting depth on this thread
    #[inline]
    pub fn depth() -> usize {
        DEPTH.with(Cell::get)
    }

    /// Whether `key` is currently active on this thread
    pub fn is_active(key: &EventKey) -> bool {
        ACTIVE.with(|active| active.borrow().contains(key))
    }
}

/// Active logging scope; releases its key on drop
///
/// Bound to the thread that created it.
#[must_use = "the scope is released as soon as the token is dropped"]
pub struct ScopeToken {
    key: EventKey,
    _not_send: PhantomData<*const ()>,
}

impl ScopeToken {
    pub fn key(&self) -> &EventKey {
        &self.key
    }
}

impl Drop for ScopeToken {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().remove(&self.key);
        });
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

impl std::fmt::Debug for ScopeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeToken").field("key", &self.key).finish()
    }
}
