//! Explicit tracking of engine resources that must be released deterministically.

use core::hash::Hash;
use std::collections::HashSet;

/// Ordered set of resource handles tracked by a node for bulk release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposableSet<R> {
    items: Vec<R>,
}

impl<R> Default for DisposableSet<R> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<R: Copy + Eq> DisposableSet<R> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Tracks every resource in `resources`, ignoring ones already tracked.
    pub fn track_all(&mut self, resources: &[R]) {
        for &resource in resources {
            if !self.items.contains(&resource) {
                self.items.push(resource);
            }
        }
    }

    /// Stops tracking every resource in `resources`.
    pub fn untrack_all(&mut self, resources: &[R]) {
        self.items.retain(|item| !resources.contains(item));
    }

    /// Returns `true` if `resource` is tracked.
    #[must_use]
    pub fn contains(&self, resource: &R) -> bool {
        self.items.contains(resource)
    }

    /// Tracked resources in tracking order.
    #[must_use]
    pub fn as_slice(&self) -> &[R] {
        &self.items
    }

    /// Number of tracked resources.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when nothing is tracked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes and returns every tracked resource.
    pub fn drain(&mut self) -> Vec<R> {
        core::mem::take(&mut self.items)
    }
}

/// Remembers which resources were released so a second release is a no-op.
#[derive(Debug, Clone)]
pub struct ReleaseLedger<R> {
    released: HashSet<R>,
}

impl<R> Default for ReleaseLedger<R> {
    fn default() -> Self {
        Self {
            released: HashSet::new(),
        }
    }
}

impl<R: Copy + Eq + Hash> ReleaseLedger<R> {
    /// Runs `release` for `resource` unless it was released before.
    ///
    /// Returns `true` when `release` ran.
    pub fn release(&mut self, resource: R, release: impl FnOnce(R)) -> bool {
        if self.released.insert(resource) {
            release(resource);
            true
        } else {
            false
        }
    }

    /// Drops the record for `resource`, so a handle the engine hands out
    /// again can be released again.
    pub fn forget(&mut self, resource: &R) -> bool {
        self.released.remove(resource)
    }

    /// Returns `true` if `resource` has been released.
    #[must_use]
    pub fn is_released(&self, resource: &R) -> bool {
        self.released.contains(resource)
    }

    /// Number of distinct resources released.
    #[must_use]
    pub fn len(&self) -> usize {
        self.released.len()
    }

    /// Returns `true` when nothing has been released yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.released.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_deduplicates_and_untracks() {
        let mut set = DisposableSet::new();
        set.track_all(&[1, 2, 2, 3]);
        assert_eq!(set.as_slice(), &[1, 2, 3]);

        set.untrack_all(&[2]);
        assert!(!set.contains(&2));
        assert_eq!(set.drain(), vec![1, 3]);
        assert!(set.is_empty());
    }

    #[test]
    fn ledger_releases_once() {
        let mut ledger = ReleaseLedger::default();
        let mut calls = Vec::new();

        assert!(ledger.release(7, |r| calls.push(r)));
        assert!(!ledger.release(7, |r| calls.push(r)));
        assert!(ledger.release(8, |r| calls.push(r)));

        assert_eq!(calls, vec![7, 8]);
        assert!(ledger.is_released(&7));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn forgotten_handles_release_again() {
        let mut ledger = ReleaseLedger::default();
        let mut calls = 0;

        ledger.release(3, |_| calls += 1);
        assert!(ledger.forget(&3));
        assert!(!ledger.forget(&3));
        assert!(ledger.is_empty());
        assert!(ledger.release(3, |_| calls += 1));
        assert_eq!(calls, 2);
    }
}
