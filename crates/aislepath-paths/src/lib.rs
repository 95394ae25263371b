//! Shortest-route precomputation for warehouse cost grids.
//!
//! For every entry point of a layout, one Dijkstra search over the
//! 8-connected [`CostGrid`](aislepath_grid::CostGrid) yields the real-world
//! distance to, and the predecessor of, each reachable cell. Searches run in
//! parallel on a rayon pool; the results are bundled into [`PathMaps`]
//! stamped with the layout version they were computed from, and any
//! entry → exit route is then a walk over the predecessor map.
//!
//! - [`precompute`] runs the searches ([`PrecomputeConfig`], [`CancelToken`])
//! - [`resolve_path`] turns committed maps into a [`Route`]
//! - [`RoutePlanner`] ties a [`Layout`](aislepath_core::Layout), grid
//!   construction and a [`MapStore`] together
//!
//! # Trait hierarchy
//!
//! | Trait | Required for |
//! |---|---|
//! | [`Pather`] | neighbour enumeration |
//! | [`WeightedPather`] : [`Pather`] | Dijkstra |

mod dijkstra;
mod maps;
mod neighbors;
mod planner;
mod precompute;
mod resolve;
mod search;
mod traits;

pub use maps::{DistanceMap, PathMaps, PredecessorMap, SourceMaps};
pub use neighbors::Neighbors;
pub use planner::{MapStore, PlannerError, RoutePlanner};
pub use precompute::{CancelToken, PrecomputeConfig, PrecomputeError, precompute};
pub use resolve::{ResolveError, Route, resolve_path};
pub use search::SearchRange;
pub use traits::{Pather, WeightedPather};
