//! Results of shortest-path searches.

use std::collections::BTreeMap;
use std::sync::Arc;

use aislepath_core::{LayoutVersion, Point};
use aislepath_grid::{CostGrid, PointUnplaceable, ResolvedPoint};
use hashbrown::HashMap;

/// Cumulative real-world cost from one source to every reached cell.
/// Unreachable cells are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceMap {
    costs: HashMap<Point, f64>,
}

impl DistanceMap {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            costs: HashMap::with_capacity(n),
        }
    }

    pub(crate) fn insert(&mut self, p: Point, cost: f64) {
        self.costs.insert(p, cost);
    }

    #[inline]
    pub fn get(&self, p: Point) -> Option<f64> {
        self.costs.get(&p).copied()
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.costs.contains_key(&p)
    }

    /// Number of reached cells, the source included.
    #[inline]
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Reached cells and their costs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        self.costs.iter().map(|(&p, &c)| (p, c))
    }
}

/// The cell each reached cell was entered from. The source has no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredecessorMap {
    parents: HashMap<Point, Point>,
}

impl PredecessorMap {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            parents: HashMap::with_capacity(n),
        }
    }

    pub(crate) fn insert(&mut self, p: Point, parent: Point) {
        self.parents.insert(p, parent);
    }

    #[inline]
    pub fn get(&self, p: Point) -> Option<Point> {
        self.parents.get(&p).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Distance and predecessor maps of a single-source search.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMaps {
    pub source: Point,
    pub distances: DistanceMap,
    pub predecessors: PredecessorMap,
}

impl SourceMaps {
    /// Cells from the source to `dest`, both included, or `None` if `dest`
    /// was not reached.
    pub fn path_to(&self, dest: Point) -> Option<Vec<Point>> {
        if !self.distances.contains(dest) {
            return None;
        }
        let mut cells = vec![dest];
        let mut cur = dest;
        while cur != self.source {
            cur = self.predecessors.get(cur)?;
            cells.push(cur);
            if cells.len() > self.distances.len() {
                log::error!("predecessor cycle reached from {dest}");
                return None;
            }
        }
        cells.reverse();
        Some(cells)
    }
}

/// Everything one precompute run produced, stamped with the layout version
/// of the grid it ran on.
#[derive(Debug, Clone)]
pub struct PathMaps {
    pub(crate) grid: Arc<CostGrid>,
    pub(crate) sources: BTreeMap<String, SourceMaps>,
    pub(crate) entries: BTreeMap<String, ResolvedPoint>,
    pub(crate) exits: BTreeMap<String, ResolvedPoint>,
    pub(crate) unplaceable: Vec<PointUnplaceable>,
}

impl PathMaps {
    #[inline]
    pub fn version(&self) -> LayoutVersion {
        self.grid.version()
    }

    #[inline]
    pub fn grid(&self) -> &Arc<CostGrid> {
        &self.grid
    }

    /// Search results for the entry point `name`.
    pub fn source(&self, name: &str) -> Option<&SourceMaps> {
        self.sources.get(name)
    }

    /// Names of the entry points with search results, sorted.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn entry(&self, name: &str) -> Option<&ResolvedPoint> {
        self.entries.get(name)
    }

    pub fn exit(&self, name: &str) -> Option<&ResolvedPoint> {
        self.exits.get(name)
    }

    pub fn exits(&self) -> impl Iterator<Item = &ResolvedPoint> {
        self.exits.values()
    }

    /// Points that could not be placed on the grid.
    pub fn unplaceable(&self) -> &[PointUnplaceable] {
        &self.unplaceable
    }
}
