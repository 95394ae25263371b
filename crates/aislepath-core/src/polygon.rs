//! Simple polygons in layout coordinates.

use crate::geom::{Pos, Rect};

/// A simple polygon given by its ordered vertices. The closing edge from the
/// last vertex back to the first is implicit.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    vertices: Vec<Pos>,
}

impl Polygon {
    pub fn new(vertices: Vec<Pos>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle polygon.
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let r = Rect::new(x0, y0, x1, y1);
        Self::new(vec![
            r.min,
            Pos::new(r.max.x, r.min.y),
            r.max,
            Pos::new(r.min.x, r.max.y),
        ])
    }

    #[inline]
    pub fn vertices(&self) -> &[Pos] {
        &self.vertices
    }

    /// A polygon needs at least three vertices to enclose anything.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Whether every vertex is a finite coordinate.
    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(|v| v.is_finite())
    }

    /// Bounding rectangle, or `None` for a polygon without vertices.
    pub fn bbox(&self) -> Option<Rect> {
        let (first, rest) = self.vertices.split_first()?;
        Some(
            rest.iter()
                .fold(Rect::at(*first), |acc, &v| acc.union(Rect::at(v))),
        )
    }

    /// Iterate over the edges as `(start, end)` pairs, closing edge included.
    pub fn edges(&self) -> impl Iterator<Item = (Pos, Pos)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Even–odd containment test (ray casting towards +X).
    ///
    /// Points exactly on an edge may land on either side; callers needing a
    /// conservative answer combine this with [`distance_to_edge`](Self::distance_to_edge).
    pub fn contains(&self, p: Pos) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Shortest distance from `p` to any edge of the polygon.
    ///
    /// Returns `f64::INFINITY` for a polygon without vertices.
    pub fn distance_to_edge(&self, p: Pos) -> f64 {
        match self.vertices.len() {
            0 => f64::INFINITY,
            1 => p.distance(self.vertices[0]),
            _ => self
                .edges()
                .map(|(a, b)| segment_distance(p, a, b))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(v: Vec<(f64, f64)>) -> Self {
        Self::new(v.into_iter().map(Pos::from).collect())
    }
}

/// Distance from `p` to the segment `a`–`b`.
pub fn segment_distance(p: Pos, a: Pos, b: Pos) -> f64 {
    let ab = b - a;
    let len2 = ab.x * ab.x + ab.y * ab.y;
    if len2 <= f64::EPSILON {
        return p.distance(a);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
