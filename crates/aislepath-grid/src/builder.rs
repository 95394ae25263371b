//! Grid construction from a layout snapshot.

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use aislepath_core::{LayoutSnapshot, PenaltyZone, Polygon, Rect};

use crate::grid::{CellState, CostGrid, GridFrame};

/// Slack for centres lying exactly on the dilation radius.
const EDGE_EPSILON: f64 = 1e-9;

/// Parameters controlling rasterization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridConfig {
    /// Extra space, in cells, around the layout content when no boundary
    /// polygon is given.
    pub margin_cells: f64,
    /// Obstacle inflation, in cells. Cells whose centre lies within this
    /// distance of an obstacle outline are blocked. The default of half a
    /// cell diagonal blocks every cell an outline passes through.
    pub dilation_cells: f64,
    /// Upper bound on the number of cells in a grid.
    pub max_cells: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            margin_cells: 5.0,
            dilation_cells: FRAC_1_SQRT_2,
            max_cells: 25_000_000,
        }
    }
}

/// What makes a layout impossible to rasterize.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryIssue {
    /// Effective bounding box has no area.
    EmptyBounds(Rect),
    /// Resolution factor is not a positive number.
    Resolution(f64),
    /// Scale is not a positive number.
    Scale(f64),
    /// Penalty zone `index` has a factor below 1 or not finite.
    PenaltyFactor { index: usize, factor: f64 },
    /// Boundary polygon has fewer than three vertices.
    DegenerateBoundary,
    /// A shape or point has a non-finite coordinate.
    NonFinite,
    /// The grid would exceed [`GridConfig::max_cells`].
    TooManyCells { width: i64, height: i64 },
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBounds(r) => write!(f, "bounding box {r} has no area"),
            Self::Resolution(v) => write!(f, "resolution factor must be positive, got {v}"),
            Self::Scale(v) => write!(f, "scale must be positive, got {v}"),
            Self::PenaltyFactor { index, factor } => {
                write!(f, "penalty zone {index} has factor {factor}, expected >= 1")
            }
            Self::DegenerateBoundary => f.write_str("boundary polygon needs at least 3 vertices"),
            Self::NonFinite => f.write_str("layout contains a non-finite coordinate"),
            Self::TooManyCells { width, height } => {
                write!(f, "grid of {width}x{height} cells is too large")
            }
        }
    }
}

/// Errors from [`build_grid`].
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    InvalidGeometry(GeometryIssue),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry(issue) => write!(f, "invalid geometry: {issue}"),
        }
    }
}

impl std::error::Error for GridError {}

impl From<GeometryIssue> for GridError {
    fn from(issue: GeometryIssue) -> Self {
        Self::InvalidGeometry(issue)
    }
}

/// Rasterize a layout snapshot into a [`CostGrid`] stamped with the
/// snapshot's version.
pub fn build_grid(snapshot: &LayoutSnapshot, config: &GridConfig) -> Result<CostGrid, GridError> {
    validate(snapshot)?;
    let res = snapshot.resolution;
    let bounds = effective_bounds(snapshot, config)?;

    let width = (bounds.width() / res).ceil().max(1.0) as i64;
    let height = (bounds.height() / res).ceil().max(1.0) as i64;
    let too_big = width > i32::MAX as i64
        || height > i32::MAX as i64
        || width as u128 * height as u128 > config.max_cells as u128;
    if too_big {
        return Err(GeometryIssue::TooManyCells { width, height }.into());
    }

    let frame = GridFrame {
        origin: bounds.min,
        cell_size: res,
        units_per_pixel: snapshot.units_per_pixel,
        unit: snapshot.unit,
        width: width as i32,
        height: height as i32,
    };
    let mut raster = Raster::new(frame);

    for zone in &snapshot.penalty_zones {
        raster.apply_penalty(zone);
    }
    let radius = config.dilation_cells.max(0.0) * res;
    for obstacle in &snapshot.obstacles {
        raster.apply_obstacle(obstacle, radius);
    }
    if let Some(boundary) = &snapshot.boundary {
        raster.apply_boundary(boundary, radius);
    }

    let grid = CostGrid::new(snapshot.version, frame, raster.cells);
    log::info!(
        "built {}x{} grid for layout {} ({} blocked, {} penalized)",
        grid.width(),
        grid.height(),
        snapshot.version,
        grid.count(CellState::is_blocked),
        grid.count(|c| matches!(c, CellState::Penalized(_))),
    );
    Ok(grid)
}

fn validate(snapshot: &LayoutSnapshot) -> Result<(), GeometryIssue> {
    let res = snapshot.resolution;
    if !(res.is_finite() && res > 0.0) {
        return Err(GeometryIssue::Resolution(res));
    }
    let scale = snapshot.units_per_pixel;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(GeometryIssue::Scale(scale));
    }
    for (index, zone) in snapshot.penalty_zones.iter().enumerate() {
        if !PenaltyZone::is_valid_factor(zone.factor) {
            return Err(GeometryIssue::PenaltyFactor {
                index,
                factor: zone.factor,
            });
        }
    }
    let finite = snapshot.floor_plan.min.is_finite()
        && snapshot.floor_plan.max.is_finite()
        && snapshot.obstacles.iter().all(Polygon::is_finite)
        && snapshot.penalty_zones.iter().all(|z| z.polygon.is_finite())
        && snapshot.boundary.as_ref().is_none_or(Polygon::is_finite)
        && snapshot.points.iter().all(|(_, p)| p.pos.is_finite());
    if !finite {
        return Err(GeometryIssue::NonFinite);
    }
    if snapshot.boundary.as_ref().is_some_and(Polygon::is_degenerate) {
        return Err(GeometryIssue::DegenerateBoundary);
    }
    Ok(())
}

/// Region the grid has to cover.
///
/// The boundary's bounding box wins when present. Otherwise the content of
/// the layout, padded by the configured margin, is used; an empty layout
/// covers the whole floor plan. The result is always clipped to the floor
/// plan.
fn effective_bounds(snapshot: &LayoutSnapshot, config: &GridConfig) -> Result<Rect, GeometryIssue> {
    let floor = snapshot.floor_plan;
    let bounds = if let Some(boundary) = &snapshot.boundary {
        log::debug!("grid bounds taken from boundary polygon");
        boundary
            .bbox()
            .map(|bb| bb.intersect(floor))
            .ok_or(GeometryIssue::DegenerateBoundary)?
    } else {
        let content = snapshot
            .obstacles
            .iter()
            .filter_map(Polygon::bbox)
            .chain(snapshot.penalty_zones.iter().filter_map(|z| z.polygon.bbox()))
            .chain(snapshot.points.iter().map(|(_, p)| Rect::at(p.pos)))
            .reduce(Rect::union);
        match content {
            Some(c) => {
                log::debug!("grid bounds taken from layout content {c}");
                c.inflate(config.margin_cells.max(0.0) * snapshot.resolution)
                    .intersect(floor)
            }
            None => {
                log::debug!("empty layout, grid covers the floor plan");
                floor
            }
        }
    };
    if !bounds.has_area() {
        return Err(GeometryIssue::EmptyBounds(bounds));
    }
    Ok(bounds)
}

/// Mutable cell buffer used while rasterizing.
struct Raster {
    frame: GridFrame,
    cells: Vec<CellState>,
}

impl Raster {
    fn new(frame: GridFrame) -> Self {
        Self {
            cells: vec![CellState::Free; frame.range().len()],
            frame,
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.frame.width as usize + x as usize
    }

    /// Overlapping zones keep the largest factor.
    fn apply_penalty(&mut self, zone: &PenaltyZone) {
        let Some(bb) = zone.polygon.bbox() else {
            return;
        };
        for p in self.frame.cells_covering(bb) {
            if !zone.polygon.contains(self.frame.cell_center_layout(p)) {
                continue;
            }
            let i = self.index(p.x, p.y);
            self.cells[i] = match self.cells[i] {
                CellState::Penalized(f) => CellState::Penalized(f.max(zone.factor)),
                CellState::Free => CellState::Penalized(zone.factor),
                CellState::Blocked => CellState::Blocked,
            };
        }
    }

    /// Block the interior of `polygon` and every cell within `radius` of its
    /// outline.
    fn apply_obstacle(&mut self, polygon: &Polygon, radius: f64) {
        let Some(bb) = polygon.bbox() else {
            return;
        };
        for p in self.frame.cells_covering(bb.inflate(radius)) {
            let c = self.frame.cell_center_layout(p);
            if polygon.contains(c) || polygon.distance_to_edge(c) <= radius + EDGE_EPSILON {
                let i = self.index(p.x, p.y);
                self.cells[i] = CellState::Blocked;
            }
        }
    }

    /// Block everything outside `boundary`, dilated by `radius` like an
    /// obstacle.
    fn apply_boundary(&mut self, boundary: &Polygon, radius: f64) {
        for p in self.frame.range() {
            let c = self.frame.cell_center_layout(p);
            if !boundary.contains(c) || boundary.distance_to_edge(c) <= radius + EDGE_EPSILON {
                let i = self.index(p.x, p.y);
                self.cells[i] = CellState::Blocked;
            }
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn config_round_trip() {
        let config = GridConfig {
            margin_cells: 2.5,
            ..GridConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: GridConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
