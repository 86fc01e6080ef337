//! Context resolver: the hierarchical position of a component in the tree.
//!
//! A [`ContextPath`] is an ordered list of segments such as
//! `["main", "list", "ItemCard"]`. Segments are scoped to a subtree: they are
//! introduced by wrapping the construction of that subtree in a closure and
//! disappear when the closure returns, so a sibling subtree never sees them.
//!
//! Two styles are supported:
//!
//! - ambient: [`push_named`] / [`with_screen`] / [`current_path`], backed by a
//!   per-thread stack restored by a drop guard;
//! - explicit: [`ContextPath::child`] returns a new path value that can be
//!   threaded through construction code by hand.

use std::cell::RefCell;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered segment stack for a subtree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextPath {
    segments: Vec<String>,
}

impl ContextPath {
    /// The empty (root-level) path
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A path rooted at a screen name
    #[must_use]
    pub fn screen(name: &str) -> Self {
        Self::new().child(name)
    }

    /// Build a path from segments, skipping blank ones
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .fold(Self::new(), |path, segment| path.child(segment.as_ref()))
    }

    /// A new path with `segment` appended; blank segments are ignored
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut next = self.clone();
        let trimmed = segment.trim();
        if !trimmed.is_empty() {
            next.segments.push(trimmed.to_string());
        }
        next
    }

    /// The segments, outermost first
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is a root-level path
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Innermost segment
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

thread_local! {
    static ACTIVE: RefCell<ContextPath> = RefCell::new(ContextPath::new());
}

struct RestorePath {
    previous: Option<ContextPath>,
}

impl Drop for RestorePath {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            ACTIVE.with(|active| *active.borrow_mut() = previous);
        }
    }
}

/// The path active for the calling subtree
#[must_use]
pub fn current_path() -> ContextPath {
    ACTIVE.with(|active| active.borrow().clone())
}

/// Run `body` with `path` installed as the active path
pub fn with_path<R>(path: ContextPath, body: impl FnOnce() -> R) -> R {
    let previous = ACTIVE.with(|active| std::mem::replace(&mut *active.borrow_mut(), path));
    let _restore = RestorePath {
        previous: Some(previous),
    };
    body()
}

/// Run `body` with `segment` appended to the active path
pub fn push_named<R>(segment: impl AsRef<str>, body: impl FnOnce() -> R) -> R {
    let next = current_path().child(segment.as_ref());
    with_path(next, body)
}

/// Run `body` under a fresh path rooted at the screen `name`
pub fn with_screen<R>(name: impl AsRef<str>, body: impl FnOnce() -> R) -> R {
    with_path(ContextPath::screen(name.as_ref()), body)
}
