use aislepath_core::Point;
use aislepath_grid::CostGrid;

use crate::neighbors::Neighbors;

/// Minimal pathfinding interface: neighbor enumeration.
pub trait Pather {
    /// Append neighbors of `p` into `buf`. The caller clears `buf` before calling.
    fn neighbors(&self, p: Point, buf: &mut Vec<Point>);
}

/// Pather with weighted (positive-cost) edges.
pub trait WeightedPather: Pather {
    /// Cost of moving from `from` to adjacent `to`. Must be > 0.
    fn cost(&self, from: Point, to: Point) -> f64;
}

impl Pather for CostGrid {
    /// Passable cells among the eight neighbours of `p`, in
    /// [`Neighbors::DIRS`] order.
    fn neighbors(&self, p: Point, buf: &mut Vec<Point>) {
        Neighbors::extend_all(p, buf, |n| self.is_passable(n));
    }
}

impl WeightedPather for CostGrid {
    /// World distance between the two cell centres, scaled by the mean of
    /// both cells' multipliers.
    fn cost(&self, from: Point, to: Point) -> f64 {
        let a = self.multiplier(from).unwrap_or(f64::INFINITY);
        let b = self.multiplier(to).unwrap_or(f64::INFINITY);
        self.world_distance(from, to) * (a + b) * 0.5
    }
}
