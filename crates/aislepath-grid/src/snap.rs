//! Placing named points on a grid.
//!
//! A point lands on the cell containing it. When that cell is blocked, the
//! closest passable cell within a small square neighbourhood is used
//! instead.

use std::fmt;

use aislepath_core::{NamedPoint, Point, PointKind, PointSet, Pos};

use crate::grid::CostGrid;

/// A named point placed on a grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedPoint {
    pub name: String,
    pub kind: PointKind,
    pub cell: Point,
    /// Whether the point was moved off a blocked cell.
    pub snapped: bool,
}

/// Why a point could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnplaceableReason {
    /// The point lies outside the grid.
    OutsideGrid,
    /// Every cell within `radius` cells is blocked.
    NoFreeCell { radius: i32 },
}

/// A named point that has no usable cell on the grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointUnplaceable {
    pub name: String,
    pub kind: PointKind,
    pub pos: Pos,
    pub reason: UnplaceableReason,
}

impl fmt::Display for PointUnplaceable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \u{201c}{}\u{201d} at {} cannot be placed: ",
            self.kind, self.name, self.pos
        )?;
        match self.reason {
            UnplaceableReason::OutsideGrid => f.write_str("outside the grid"),
            UnplaceableReason::NoFreeCell { radius } => {
                write!(f, "no free cell within {radius} cells")
            }
        }
    }
}

impl std::error::Error for PointUnplaceable {}

/// Find the cell for a layout position.
///
/// Returns the containing cell when it is passable. Otherwise every cell
/// within `radius` (Chebyshev distance) is considered and the passable one
/// whose centre is nearest to `pos` wins; equal distances keep the first
/// cell in row-major order.
///
/// Positions on the far edges of the grid's extent belong to the last row
/// or column.
pub fn resolve_point(
    grid: &CostGrid,
    pos: Pos,
    radius: i32,
) -> Result<(Point, bool), UnplaceableReason> {
    if !grid.frame().extent().contains(pos) {
        return Err(UnplaceableReason::OutsideGrid);
    }
    let cell = grid.layout_to_cell(pos);
    let home = Point::new(
        cell.x.clamp(0, grid.width() - 1),
        cell.y.clamp(0, grid.height() - 1),
    );
    if grid.is_passable(home) {
        return Ok((home, false));
    }

    let mut best: Option<(f64, Point)> = None;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let p = home.shift(dx, dy);
            if !grid.is_passable(p) {
                continue;
            }
            let d = grid.cell_center_layout(p).distance(pos);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, p));
            }
        }
    }
    best.map(|(_, p)| (p, true))
        .ok_or(UnplaceableReason::NoFreeCell { radius })
}

/// Resolve a single named point.
pub fn resolve_named(
    grid: &CostGrid,
    kind: PointKind,
    point: &NamedPoint,
    radius: i32,
) -> Result<ResolvedPoint, PointUnplaceable> {
    match resolve_point(grid, point.pos, radius) {
        Ok((cell, snapped)) => {
            if snapped {
                log::debug!("{kind} {} snapped to free cell {cell}", point.name);
            }
            Ok(ResolvedPoint {
                name: point.name.clone(),
                kind,
                cell,
                snapped,
            })
        }
        Err(reason) => Err(PointUnplaceable {
            name: point.name.clone(),
            kind,
            pos: point.pos,
            reason,
        }),
    }
}

/// Resolve every point of a set. Points that cannot be placed are
/// collected separately and logged; they never abort the others.
pub fn resolve_points(
    grid: &CostGrid,
    points: &PointSet,
    radius: i32,
) -> (Vec<ResolvedPoint>, Vec<PointUnplaceable>) {
    let mut placed = Vec::with_capacity(points.len());
    let mut failed = Vec::new();
    for (kind, point) in points.iter() {
        match resolve_named(grid, kind, point, radius) {
            Ok(r) => placed.push(r),
            Err(e) => {
                log::warn!("{e}");
                failed.push(e);
            }
        }
    }
    (placed, failed)
}
