//! Per mount hydration state and its persisted marker.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

/// Lifecycle of one mount point on the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HydrationState {
    /// Nothing has been built for the mount.
    #[default]
    NotHydrated,
    /// A rebuild is running.
    Hydrating,
    /// The live scene matches the server payload.
    Hydrated,
    /// Torn down; only a forced hydration revives it.
    Disposed,
}

/// Persisted "already hydrated" flag, surviving the in-memory state.
///
/// In the browser this is the `data-sigil-hydrated` attribute on the mount
/// element, which outlives a reloaded script bundle.
pub trait MarkerStore {
    /// Returns `true` if `mount_id` carries the marker.
    fn is_marked(&self, mount_id: &str) -> bool;
    /// Sets the marker.
    fn mark(&mut self, mount_id: &str);
    /// Removes the marker. Removing a missing marker is a no-op.
    fn clear(&mut self, mount_id: &str);
}

/// [`MarkerStore`] kept in memory, for tests and non-DOM hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarkers {
    marked: HashSet<String>,
}

impl MemoryMarkers {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkerStore for MemoryMarkers {
    fn is_marked(&self, mount_id: &str) -> bool {
        self.marked.contains(mount_id)
    }

    fn mark(&mut self, mount_id: &str) {
        self.marked.insert(mount_id.to_owned());
    }

    fn clear(&mut self, mount_id: &str) {
        self.marked.remove(mount_id);
    }
}

/// In-memory state machine per mount id.
///
/// `NotHydrated -> Hydrating -> Hydrated`, with `Disposed` reachable from
/// anywhere. A failed rebuild goes back to `NotHydrated`.
#[derive(Debug, Clone, Default)]
pub struct HydrationGuard {
    states: HashMap<String, HydrationState>,
}

impl HydrationGuard {
    /// Creates a guard where every mount is `NotHydrated`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `mount_id`.
    #[must_use]
    pub fn state(&self, mount_id: &str) -> HydrationState {
        self.states.get(mount_id).copied().unwrap_or_default()
    }

    /// Returns `true` only in [`HydrationState::Hydrated`].
    #[must_use]
    pub fn is_hydrated(&self, mount_id: &str) -> bool {
        self.state(mount_id) == HydrationState::Hydrated
    }

    /// Moves `NotHydrated` to `Hydrating`. Returns `false` from any other state.
    pub fn begin(&mut self, mount_id: &str) -> bool {
        if self.state(mount_id) != HydrationState::NotHydrated {
            return false;
        }
        self.set(mount_id, HydrationState::Hydrating);
        true
    }

    /// Moves `Hydrating` to `Hydrated`.
    pub fn complete(&mut self, mount_id: &str) {
        let state = self.state(mount_id);
        if state != HydrationState::Hydrating {
            warn!(mount = mount_id, ?state, "completing a hydration that was not started");
        }
        self.set(mount_id, HydrationState::Hydrated);
    }

    /// Marks a rebuild as failed, back to `NotHydrated`.
    pub fn fail(&mut self, mount_id: &str) {
        self.states.remove(mount_id);
        debug!(mount = mount_id, "hydration state reset after failure");
    }

    /// Adopts a persisted marker without rebuilding.
    pub fn resynchronize(&mut self, mount_id: &str) {
        self.set(mount_id, HydrationState::Hydrated);
    }

    /// Moves to the terminal `Disposed` state.
    pub fn dispose(&mut self, mount_id: &str) {
        self.set(mount_id, HydrationState::Disposed);
    }

    /// Forgets the mount, back to `NotHydrated`.
    pub fn reset(&mut self, mount_id: &str) {
        self.states.remove(mount_id);
    }

    fn set(&mut self, mount_id: &str, state: HydrationState) {
        debug!(mount = mount_id, ?state, "hydration state");
        self.states.insert(mount_id.to_owned(), state);
    }
}
