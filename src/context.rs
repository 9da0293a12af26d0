//! Cooperative cancellation contexts.
//!
//! A [`Context`] carries an optional deadline, a cancellation signal and a
//! set of string values down a call chain. Nothing is ever interrupted by
//! force: callees poll [`Context::is_done`] or block in
//! [`Context::wait_timeout`], which returns as soon as the context is
//! cancelled or its deadline passes.
//!
//! # Examples
//!
//! ```
//! use purefunc::context::Context;
//! use std::time::Duration;
//!
//! let (ctx, cancel) = Context::background().with_timeout(Duration::from_secs(5));
//! assert!(!ctx.is_done());
//! cancel.cancel();
//! assert!(ctx.is_done());
//! ```

use crate::error::ContextError;
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Shared cancellation context.
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    parent: Option<Context>,
    deadline: Option<Instant>,
    value: Option<(String, String)>,
    state: Mutex<State>,
    signal: Condvar,
}

#[derive(Default)]
struct State {
    err: Option<ContextError>,
    children: Vec<Weak<Inner>>,
}

/// Handle that cancels the context it was created with.
///
/// Dropping the handle does not cancel anything.
#[must_use = "the context is only cancelled through `cancel`"]
pub struct CancelHandle {
    target: Weak<Inner>,
}

impl CancelHandle {
    /// Cancels the context and all contexts derived from it.
    pub fn cancel(&self) {
        if let Some(inner) = self.target.upgrade() {
            inner.finish(ContextError::Canceled);
        }
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}

impl Inner {
    fn finish(&self, err: ContextError) {
        let children = {
            let mut state = self.state.lock();
            if state.err.is_some() {
                return;
            }
            state.err = Some(err);
            self.signal.notify_all();
            std::mem::take(&mut state.children)
        };
        for child in children.iter().filter_map(Weak::upgrade) {
            child.finish(err);
        }
    }

    fn current_err(&self, state: &State) -> Option<ContextError> {
        if state.err.is_some() {
            return state.err;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }
}

impl Context {
    /// Returns the root context: never cancelled, no deadline, no values.
    #[must_use]
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                parent: None,
                deadline: None,
                value: None,
                state: Mutex::new(State::default()),
                signal: Condvar::new(),
            }),
        }
    }

    fn derive(&self, deadline: Option<Instant>, value: Option<(String, String)>) -> Self {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let child = Arc::new(Inner {
            parent: Some(self.clone()),
            deadline,
            value,
            state: Mutex::new(State::default()),
            signal: Condvar::new(),
        });

        let inherited = {
            let mut state = self.inner.state.lock();
            if state.err.is_none() {
                state.children.retain(|c| c.strong_count() > 0);
                state.children.push(Arc::downgrade(&child));
            }
            state.err
        };
        if let Some(err) = inherited {
            child.finish(err);
        }

        Self { inner: child }
    }

    /// Derives a context that can be cancelled through the returned handle.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let ctx = self.derive(None, None);
        let handle = CancelHandle {
            target: Arc::downgrade(&ctx.inner),
        };
        (ctx, handle)
    }

    /// Derives a context that expires at `deadline` (or earlier if the parent does).
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelHandle) {
        let ctx = self.derive(Some(deadline), None);
        let handle = CancelHandle {
            target: Arc::downgrade(&ctx.inner),
        };
        (ctx, handle)
    }

    /// Derives a context that expires after `timeout`.
    ///
    /// A timeout too large to represent as an [`Instant`] sets no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelHandle) {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.with_cancel(),
        }
    }

    /// Derives a context carrying `key = value`.
    #[must_use]
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.derive(None, Some((key.into(), value.into())))
    }

    /// Looks up a value, searching from this context towards the root.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some((k, v)) = &ctx.inner.value
                && k == key
            {
                return Some(v.clone());
            }
            current = ctx.inner.parent.as_ref();
        }
        None
    }

    /// Returns the effective deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns why the context is done, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        let state = self.inner.state.lock();
        self.inner.current_err(&state)
    }

    /// Returns `true` once the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Blocks until the context is done or `timeout` elapses.
    ///
    /// Returns `true` if the context is done.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(give_up) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut state = self.inner.state.lock();
        loop {
            if self.inner.current_err(&state).is_some() {
                return true;
            }
            let wake = self.inner.deadline.map_or(give_up, |d| d.min(give_up));
            if Instant::now() >= give_up {
                return false;
            }
            let _ = self.inner.signal.wait_until(&mut state, wake);
        }
    }

    /// Blocks until the context is done.
    ///
    /// Never returns for a context that has neither a deadline nor a cancel path.
    pub fn wait(&self) -> ContextError {
        let mut state = self.inner.state.lock();
        loop {
            if let Some(err) = self.inner.current_err(&state) {
                return err;
            }
            match self.inner.deadline {
                Some(deadline) => {
                    let _ = self.inner.signal.wait_until(&mut state, deadline);
                }
                None => self.inner.signal.wait(&mut state),
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish_non_exhaustive()
    }
}
