//! Deferred-free tracker for dynamically built escape strings.
//!
//! Every string produced by [`crate::escape`] is handed to a [`Tracker`],
//! which owns it from then on. The tracker keeps two generations:
//!
//! | Generation | Holds | Dropped by |
//! |------------|-------|------------|
//! | `active` | strings built since the last rotation | the rotation after next, or [`Tracker::release_all`] |
//! | `trash` | strings that were active before the last rotation | the next [`Tracker::rotate`] or [`Tracker::release_all`] |
//!
//! # Soft reset
//!
//! [`Tracker::rotate`] is what a "soft reset" does: it frees the trash,
//! demotes the active generation to trash and returns the SGR reset code.
//! Strings built in the same statement as the reset are therefore still
//! alive while that statement prints them:
//!
//! ```
//! use termtint::gc::Tracker;
//! use termtint::escape::Escapes;
//!
//! let mut tracker = Tracker::new();
//! let red = Escapes::new("\x1b", &mut tracker).fore_color24(255, 0, 0)?;
//! let reset = tracker.rotate();
//! assert_eq!(format!("{red}text{reset}"), "\x1b[38;2;255;0;0mtext\x1b[0m");
//!
//! // A second rotation drops it; the handle is now expired.
//! tracker.rotate();
//! assert!(red.is_expired());
//! # Ok::<(), termtint::escape::EscapeError>(())
//! ```
//!
//! # Caller contract
//!
//! A [`TrackedStr`] must not be relied on across two rotations. Holding one
//! longer never dangles (it is a weak reference), but it silently expires and
//! renders as the empty string.

use std::fmt;
use std::sync::{Arc, Weak};

#[cfg(feature = "tracing")]
use crate::logging::trace;
#[cfg(not(feature = "tracing"))]
use crate::trace;

/// SGR "reset all attributes" returned by every rotation.
pub const RESET: &str = "\x1b[0m";

/// Which generation a tracked allocation currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Built since the most recent rotation.
    Active,
    /// Built before the most recent rotation, freed by the next one.
    Trash,
}

/// Two-generation owner of dynamically built escape strings.
#[derive(Debug, Default)]
pub struct Tracker {
    active: Vec<Arc<str>>,
    trash: Vec<Arc<str>>,
}

impl Tracker {
    /// Create an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: Vec::new(),
            trash: Vec::new(),
        }
    }

    /// Take ownership of `buffer` and add it to the active generation.
    ///
    /// Returns `None` if the bookkeeping slot cannot be reserved; the buffer
    /// is dropped before returning so nothing leaks. The content is copied
    /// into a shared allocation, which aborts on exhaustion like any other
    /// infallible allocation.
    pub fn register(&mut self, buffer: String) -> Option<TrackedStr> {
        if self.active.try_reserve(1).is_err() {
            trace!(len = buffer.len(), "tracker bookkeeping allocation failed");
            drop(buffer);
            return None;
        }
        let owned: Arc<str> = Arc::from(buffer);
        let handle = TrackedStr {
            inner: Arc::downgrade(&owned),
        };
        self.active.push(owned);
        Some(handle)
    }

    /// Soft reset: free the trash, demote active to trash, return [`RESET`].
    pub fn rotate(&mut self) -> &'static str {
        trace!(
            freed = self.trash.len(),
            pending = self.active.len(),
            "tracker rotating"
        );
        self.trash = std::mem::take(&mut self.active);
        RESET
    }

    /// Free every tracked allocation in both generations.
    ///
    /// Calling this on an empty tracker is a no-op.
    pub fn release_all(&mut self) {
        if self.is_empty() {
            return;
        }
        trace!(
            active = self.active.len(),
            trash = self.trash.len(),
            "tracker released"
        );
        self.active.clear();
        self.trash.clear();
    }

    /// Number of allocations in the active generation.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of allocations waiting in the trash generation.
    #[must_use]
    pub fn trash_len(&self) -> usize {
        self.trash.len()
    }

    /// Total number of tracked allocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len() + self.trash.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.trash.is_empty()
    }

    /// Report which generation currently owns `handle`, if any.
    #[must_use]
    pub fn generation_of(&self, handle: &TrackedStr) -> Option<Generation> {
        let target = handle.inner.as_ptr();
        let owns = |list: &[Arc<str>]| list.iter().any(|s| std::ptr::eq(Arc::as_ptr(s), target));
        if owns(&self.active) {
            Some(Generation::Active)
        } else if owns(&self.trash) {
            Some(Generation::Trash)
        } else {
            None
        }
    }
}

/// Caller-side view of a string owned by a [`Tracker`].
///
/// Cheap to clone. Displays the escape sequence while the tracker still owns
/// it and the empty string once it has been freed.
#[derive(Clone)]
pub struct TrackedStr {
    inner: Weak<str>,
}

impl TrackedStr {
    /// Run `f` on the string while the tracker still owns it.
    ///
    /// The string is only borrowed for the duration of `f`, so the tracker
    /// stays its sole owner. Returns `None` once it has been freed.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> Option<R> {
        self.inner.upgrade().map(|s| f(&s))
    }

    /// Whether the tracker has already freed this string.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.inner.strong_count() == 0
    }

    /// Copy the content out, or `None` once expired.
    #[must_use]
    pub fn content(&self) -> Option<String> {
        self.with_str(str::to_owned)
    }
}

impl fmt::Display for TrackedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.upgrade() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TrackedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.upgrade() {
            Some(s) => f.debug_tuple("TrackedStr").field(&&*s).finish(),
            None => f.write_str("TrackedStr(<expired>)"),
        }
    }
}

impl PartialEq for TrackedStr {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for TrackedStr {}
