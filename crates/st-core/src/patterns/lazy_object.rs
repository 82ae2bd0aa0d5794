//! Lazy re-pricing of derivatives against an upstream lattice.
//!
//! An asset lattice carries a [`Revision`] that is bumped each time it is
//! re-propagated. A derivative priced on that lattice caches its result in
//! a [`LazyState`] tagged with the revision it was computed against; a read
//! with any other revision recomputes.
//!
//! Revisions are drawn from one process-wide counter, so two lattices never
//! share a revision and a cache filled on one lattice is stale on another.
//!
//! Nothing here pushes notifications: the caller asks for a value and hands
//! over the upstream revision, and recomputation happens inside that call.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::Result;

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Identifies one state of one upstream object.
///
/// Every call to [`Revision::new`] or [`Revision::bump`] yields a value no
/// other object has seen; values only increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    /// A revision distinct from every revision issued so far.
    pub fn new() -> Self {
        Self(NEXT_REVISION.fetch_add(1, Ordering::Relaxed))
    }

    /// Advance to a new revision.
    pub fn bump(&mut self) {
        *self = Self::new();
    }

    /// The raw counter value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::new()
    }
}

/// A cached value together with the upstream revision it was computed at.
///
/// # Example
/// ```
/// use st_core::{LazyState, Revision};
///
/// let mut upstream = Revision::new();
/// let mut cache: LazyState<f64> = LazyState::new();
/// let mut calls = 0;
///
/// let v = cache.get_or_calculate(upstream, || { calls += 1; Ok(42.0) }).unwrap();
/// assert_eq!(v, 42.0);
/// assert!(!cache.is_stale(upstream));
///
/// upstream.bump();
/// assert!(cache.is_stale(upstream));
/// ```
#[derive(Debug, Clone)]
pub struct LazyState<T> {
    cached: Option<(Revision, T)>,
}

impl<T> Default for LazyState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazyState<T> {
    /// Create a new `LazyState` where the cache is initially stale.
    pub fn new() -> Self {
        Self { cached: None }
    }

    /// Return `true` if the cache is empty or was computed against another
    /// upstream revision.
    pub fn is_stale(&self, upstream: Revision) -> bool {
        match &self.cached {
            Some((rev, _)) => *rev != upstream,
            None => true,
        }
    }

    /// The cached value regardless of staleness.
    pub fn cached(&self) -> Option<&T> {
        self.cached.as_ref().map(|(_, v)| v)
    }

    /// Drop the cached value.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

impl<T: Clone> LazyState<T> {
    /// Return the cached value if it is current, otherwise run `calculate`,
    /// store its result against `upstream` and return it.
    pub fn get_or_calculate<F>(&mut self, upstream: Revision, calculate: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some((rev, value)) = &self.cached {
            if *rev == upstream {
                return Ok(value.clone());
            }
        }
        let value = calculate()?;
        self.cached = Some((upstream, value.clone()));
        Ok(value)
    }
}
