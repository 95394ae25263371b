//! Rasterization of warehouse layouts into traversal cost grids.
//!
//! [`build_grid`] turns a [`LayoutSnapshot`](aislepath_core::LayoutSnapshot)
//! into a [`CostGrid`] whose cells are free, blocked or penalized. The
//! [`snap`] module then places named points on that grid, moving points that
//! land on a blocked cell to the nearest free one.

mod builder;
mod grid;
pub mod snap;

pub use builder::{GeometryIssue, GridConfig, GridError, build_grid};
pub use grid::{CellState, CostGrid, GridFrame};
pub use snap::{
    PointUnplaceable, ResolvedPoint, UnplaceableReason, resolve_named, resolve_point,
    resolve_points,
};
