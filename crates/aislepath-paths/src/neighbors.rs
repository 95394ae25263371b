use aislepath_core::Point;

/// Fixed-order 8-directional neighbor enumeration.
///
/// Searches break equal-cost ties by this order.
pub struct Neighbors;

impl Neighbors {
    /// N, S, E, W, NE, NW, SE, SW with y growing downwards.
    pub const DIRS: [Point; 8] = [
        Point::new(0, -1),
        Point::new(0, 1),
        Point::new(1, 0),
        Point::new(-1, 0),
        Point::new(1, -1),
        Point::new(-1, -1),
        Point::new(1, 1),
        Point::new(-1, 1),
    ];

    /// Append the neighbours of `p` for which `keep` returns `true`.
    #[inline]
    pub fn extend_all(p: Point, buf: &mut Vec<Point>, keep: impl Fn(Point) -> bool) {
        for d in Self::DIRS {
            let n = p + d;
            if keep(n) {
                buf.push(n);
            }
        }
    }
}
