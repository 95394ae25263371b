//! Committed route maps and the planner that keeps them in sync with a
//! layout.

use std::fmt;
use std::sync::Arc;

use aislepath_core::Layout;
use aislepath_grid::{GridConfig, GridError, build_grid};
use parking_lot::RwLock;

use crate::maps::PathMaps;
use crate::precompute::{CancelToken, PrecomputeConfig, PrecomputeError, precompute};
use crate::resolve::{ResolveError, Route, resolve_path};

// ---------------------------------------------------------------------------
// MapStore
// ---------------------------------------------------------------------------

/// Holds the last committed [`PathMaps`].
///
/// Readers clone the `Arc` and keep using it while a newer run is being
/// computed; a commit replaces it in one step.
#[derive(Debug, Default)]
pub struct MapStore {
    maps: RwLock<Option<Arc<PathMaps>>>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed maps, if any.
    pub fn current(&self) -> Option<Arc<PathMaps>> {
        self.maps.read().clone()
    }

    /// Replace the committed maps, returning the previous ones.
    pub fn commit(&self, maps: Arc<PathMaps>) -> Option<Arc<PathMaps>> {
        log::debug!("committing route maps for layout {}", maps.version());
        self.maps.write().replace(maps)
    }

    pub fn clear(&self) -> Option<Arc<PathMaps>> {
        self.maps.write().take()
    }
}

// ---------------------------------------------------------------------------
// RoutePlanner
// ---------------------------------------------------------------------------

/// Errors from [`RoutePlanner::rebuild`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerError {
    Grid(GridError),
    Precompute(PrecomputeError),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "grid construction failed: {e}"),
            Self::Precompute(e) => write!(f, "precompute failed: {e}"),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Precompute(e) => Some(e),
        }
    }
}

impl From<GridError> for PlannerError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<PrecomputeError> for PlannerError {
    fn from(e: PrecomputeError) -> Self {
        Self::Precompute(e)
    }
}

/// A layout together with the route maps computed from it.
///
/// Edits go through [`layout_mut`](Self::layout_mut) and bump the layout
/// version; routes are refused as stale until [`rebuild`](Self::rebuild)
/// commits maps for the new version.
#[derive(Debug)]
pub struct RoutePlanner {
    layout: Layout,
    pub grid_config: GridConfig,
    pub precompute_config: PrecomputeConfig,
    store: Arc<MapStore>,
}

impl RoutePlanner {
    pub fn new(layout: Layout) -> Self {
        Self::with_config(layout, GridConfig::default(), PrecomputeConfig::default())
    }

    pub fn with_config(
        layout: Layout,
        grid_config: GridConfig,
        precompute_config: PrecomputeConfig,
    ) -> Self {
        Self {
            layout,
            grid_config,
            precompute_config,
            store: Arc::new(MapStore::new()),
        }
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    /// Shared handle to the committed maps, for readers on other threads.
    pub fn store(&self) -> Arc<MapStore> {
        Arc::clone(&self.store)
    }

    /// Whether the committed maps match the current layout.
    pub fn is_fresh(&self) -> bool {
        self.store
            .current()
            .is_some_and(|m| self.layout.tracker().is_current(m.version()))
    }

    /// Rebuild the grid and route maps for the current layout and commit
    /// them. On failure the previously committed maps stay in place.
    pub fn rebuild(
        &self,
        progress: impl Fn(usize, usize) + Sync,
        cancel: &CancelToken,
    ) -> Result<Arc<PathMaps>, PlannerError> {
        let snapshot = self.layout.snapshot();
        let grid = Arc::new(build_grid(&snapshot, &self.grid_config)?);
        let maps = Arc::new(precompute(
            grid,
            &snapshot.points,
            &self.precompute_config,
            progress,
            cancel,
        )?);
        self.store.commit(Arc::clone(&maps));
        Ok(maps)
    }

    /// Route between two named points using the committed maps.
    pub fn resolve(&self, source: &str, destination: &str) -> Result<Route, ResolveError> {
        let maps = self.store.current().ok_or(ResolveError::NotComputed)?;
        resolve_path(source, destination, &maps, self.layout.current_version())
    }
}
