//! The traversal cost grid.
//!
//! [`CostGrid`] is an immutable 2D array of [`CellState`] values together
//! with the [`GridFrame`] that maps cells to layout pixels and world units.
//! Unlike an editable map, a cost grid is never patched: a layout change
//! produces a new grid.

use aislepath_core::{LayoutVersion, LengthUnit, Point, Pos, Range, Rect};

/// Traversal state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellState {
    #[default]
    Free,
    Blocked,
    /// Traversable at `factor` (≥ 1) times the base cost.
    Penalized(f64),
}

impl CellState {
    /// Cost multiplier of the cell, or `None` if it cannot be entered.
    #[inline]
    pub fn multiplier(self) -> Option<f64> {
        match self {
            Self::Free => Some(1.0),
            Self::Blocked => None,
            Self::Penalized(f) => Some(f),
        }
    }

    #[inline]
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
}

// ---------------------------------------------------------------------------
// GridFrame
// ---------------------------------------------------------------------------

/// Placement and scale of a grid over the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridFrame {
    /// Layout position of the top-left corner of cell (0, 0).
    pub origin: Pos,
    /// Cell edge length, in layout pixels.
    pub cell_size: f64,
    /// World units per layout pixel.
    pub units_per_pixel: f64,
    pub unit: LengthUnit,
    pub width: i32,
    pub height: i32,
}

impl GridFrame {
    /// The cells of the grid.
    #[inline]
    pub fn range(&self) -> Range {
        Range::sized(self.width, self.height)
    }

    /// Cell containing a layout position. The result may lie outside
    /// [`range`](Self::range).
    #[inline]
    pub fn layout_to_cell(&self, pos: Pos) -> Point {
        let x = ((pos.x - self.origin.x) / self.cell_size).floor();
        let y = ((pos.y - self.origin.y) / self.cell_size).floor();
        Point::new(x as i32, y as i32)
    }

    /// Centre of a cell in layout pixels.
    #[inline]
    pub fn cell_center_layout(&self, p: Point) -> Pos {
        Pos::new(
            self.origin.x + (p.x as f64 + 0.5) * self.cell_size,
            self.origin.y + (p.y as f64 + 0.5) * self.cell_size,
        )
    }

    /// Convert layout pixels to world units.
    #[inline]
    pub fn layout_to_world(&self, pos: Pos) -> Pos {
        pos * self.units_per_pixel
    }

    /// Centre of a cell in world units.
    #[inline]
    pub fn cell_center_world(&self, p: Point) -> Pos {
        self.layout_to_world(self.cell_center_layout(p))
    }

    /// Cell containing a world position.
    #[inline]
    pub fn world_to_cell(&self, pos: Pos) -> Point {
        self.layout_to_cell(pos * (1.0 / self.units_per_pixel))
    }

    /// Edge length of a cell in world units: the path granularity.
    #[inline]
    pub fn cell_edge_world(&self) -> f64 {
        self.cell_size * self.units_per_pixel
    }

    /// Layout rectangle covered by the grid.
    pub fn extent(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.origin.x + self.width as f64 * self.cell_size,
            self.origin.y + self.height as f64 * self.cell_size,
        )
    }

    /// Cells whose centres may fall inside `rect`, clipped to the grid.
    pub fn cells_covering(&self, rect: Rect) -> Range {
        let lo = self.layout_to_cell(rect.min);
        let hi = self.layout_to_cell(rect.max);
        Range::new(lo.x, lo.y, hi.x + 1, hi.y + 1).intersect(self.range())
    }
}

// ---------------------------------------------------------------------------
// CostGrid
// ---------------------------------------------------------------------------

/// An immutable cost grid built from one layout version.
#[derive(Debug, Clone, PartialEq)]
pub struct CostGrid {
    version: LayoutVersion,
    frame: GridFrame,
    cells: Vec<CellState>,
}

impl CostGrid {
    /// Assemble a grid from row-major cell states.
    ///
    /// # Panics
    ///
    /// Panics if `cells` does not hold exactly `width × height` entries.
    pub fn new(version: LayoutVersion, frame: GridFrame, cells: Vec<CellState>) -> Self {
        assert_eq!(
            cells.len(),
            frame.range().len(),
            "cell count does not match {}x{} frame",
            frame.width,
            frame.height
        );
        Self {
            version,
            frame,
            cells,
        }
    }

    /// Layout version the grid was built from.
    #[inline]
    pub fn version(&self) -> LayoutVersion {
        self.version
    }

    #[inline]
    pub fn frame(&self) -> &GridFrame {
        &self.frame
    }

    #[inline]
    pub fn range(&self) -> Range {
        self.frame.range()
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.frame.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.frame.height
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.range().contains(p)
    }

    /// Flat row-major index of `p`, or `None` outside the grid.
    #[inline]
    pub fn idx(&self, p: Point) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }
        Some(p.y as usize * self.frame.width as usize + p.x as usize)
    }

    /// Cell for a flat index.
    #[inline]
    pub fn point(&self, idx: usize) -> Point {
        let w = self.frame.width as usize;
        Point::new((idx % w) as i32, (idx / w) as i32)
    }

    /// State of the cell at `p`. Cells outside the grid read as blocked.
    #[inline]
    pub fn at(&self, p: Point) -> CellState {
        self.idx(p).map_or(CellState::Blocked, |i| self.cells[i])
    }

    /// Whether `p` is inside the grid and can be entered.
    #[inline]
    pub fn is_passable(&self, p: Point) -> bool {
        !self.at(p).is_blocked()
    }

    /// Cost multiplier at `p`, `None` for blocked or outside cells.
    #[inline]
    pub fn multiplier(&self, p: Point) -> Option<f64> {
        self.at(p).multiplier()
    }

    /// Row-major iterator over `(Point, CellState)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Point, CellState)> + '_ {
        self.range().iter().zip(self.cells.iter().copied())
    }

    /// Number of cells matching `pred`.
    pub fn count(&self, pred: impl Fn(CellState) -> bool) -> usize {
        self.cells.iter().filter(|&&c| pred(c)).count()
    }

    // --- mapping shortcuts ---

    #[inline]
    pub fn layout_to_cell(&self, pos: Pos) -> Point {
        self.frame.layout_to_cell(pos)
    }

    #[inline]
    pub fn cell_center_layout(&self, p: Point) -> Pos {
        self.frame.cell_center_layout(p)
    }

    #[inline]
    pub fn cell_center_world(&self, p: Point) -> Pos {
        self.frame.cell_center_world(p)
    }

    #[inline]
    pub fn cell_edge_world(&self) -> f64 {
        self.frame.cell_edge_world()
    }

    /// World distance between the centres of two cells.
    #[inline]
    pub fn world_distance(&self, a: Point, b: Point) -> f64 {
        let dx = (a.x - b.x) as f64;
        let dy = (a.y - b.y) as f64;
        dx.hypot(dy) * self.cell_edge_world()
    }

    /// Render the grid as text: `.` free, `#` blocked, `~` penalized.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.len() + self.height() as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                out.push(match self.at(Point::new(x, y)) {
                    CellState::Free => '.',
                    CellState::Blocked => '#',
                    CellState::Penalized(_) => '~',
                });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: i32, h: i32) -> GridFrame {
        GridFrame {
            origin: Pos::new(10.0, 20.0),
            cell_size: 2.0,
            units_per_pixel: 0.5,
            unit: LengthUnit::Meters,
            width: w,
            height: h,
        }
    }

    #[test]
    fn mapping_round_trip() {
        let f = frame(8, 4);
        let p = Point::new(3, 2);
        let c = f.cell_center_layout(p);
        assert_eq!(c, Pos::new(17.0, 25.0));
        assert_eq!(f.layout_to_cell(c), p);
        assert_eq!(f.cell_center_world(p), Pos::new(8.5, 12.5));
        assert_eq!(f.world_to_cell(Pos::new(8.5, 12.5)), p);
        assert_eq!(f.cell_edge_world(), 1.0);
    }

    #[test]
    fn layout_to_cell_outside_is_negative() {
        let f = frame(8, 4);
        assert_eq!(f.layout_to_cell(Pos::new(9.0, 19.0)), Point::new(-1, -1));
    }

    #[test]
    fn cells_covering_clips_to_grid() {
        let f = frame(8, 4);
        let r = f.cells_covering(Rect::new(0.0, 0.0, 14.5, 21.0));
        assert_eq!(r, Range::new(0, 0, 3, 1));
        assert!(f.cells_covering(Rect::new(100.0, 100.0, 120.0, 120.0)).is_empty());
    }

    #[test]
    fn outside_cells_read_blocked() {
        let mut cells = vec![CellState::Free; 6];
        cells[4] = CellState::Penalized(3.0);
        let g = CostGrid::new(LayoutVersion(2), frame(3, 2), cells);
        assert_eq!(g.version(), LayoutVersion(2));
        assert_eq!(g.at(Point::new(1, 1)), CellState::Penalized(3.0));
        assert_eq!(g.multiplier(Point::new(1, 1)), Some(3.0));
        assert_eq!(g.at(Point::new(3, 0)), CellState::Blocked);
        assert!(!g.is_passable(Point::new(-1, 0)));
        assert_eq!(g.idx(Point::new(2, 1)), Some(5));
        assert_eq!(g.point(5), Point::new(2, 1));
    }

    #[test]
    fn ascii_rendering() {
        let cells = vec![
            CellState::Free,
            CellState::Blocked,
            CellState::Penalized(2.0),
            CellState::Free,
        ];
        let g = CostGrid::new(LayoutVersion::INITIAL, frame(2, 2), cells);
        assert_eq!(g.to_ascii(), ".#\n~.\n");
        assert_eq!(g.count(CellState::is_blocked), 1);
    }

    #[test]
    #[should_panic(expected = "cell count")]
    fn mismatched_cells_panic() {
        CostGrid::new(LayoutVersion::INITIAL, frame(3, 3), vec![CellState::Free; 4]);
    }
}
