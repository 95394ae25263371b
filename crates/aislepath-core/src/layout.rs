//! The warehouse layout model.
//!
//! [`Layout`] is the mutable description edited by the surrounding
//! application. Each edit bumps the layout's [`VersionTracker`]. Grid
//! construction never reads a `Layout` directly; it consumes an immutable
//! [`LayoutSnapshot`] taken with [`Layout::snapshot`].

use std::collections::BTreeMap;
use std::fmt;

use crate::geom::{Pos, Rect};
use crate::polygon::Polygon;
use crate::units::LengthUnit;
use crate::version::{LayoutVersion, VersionTracker};

/// Default cell edge length, in layout pixels.
pub const DEFAULT_RESOLUTION: f64 = 2.0;

/// Default cost multiplier for staging areas.
pub const DEFAULT_PENALTY_FACTOR: f64 = 10.0;

// ---------------------------------------------------------------------------
// Points and zones
// ---------------------------------------------------------------------------

/// Role of a named point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointKind {
    /// A pick aisle: shortest-path source.
    Entry,
    /// A staging location: shortest-path destination.
    Exit,
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("pick aisle"),
            Self::Exit => f.write_str("staging location"),
        }
    }
}

/// A named position in layout coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedPoint {
    pub name: String,
    pub pos: Pos,
}

impl NamedPoint {
    pub fn new(name: impl Into<String>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }
}

/// The named entry and exit points of a layout, each sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointSet {
    pub entries: Vec<NamedPoint>,
    pub exits: Vec<NamedPoint>,
}

impl PointSet {
    /// Iterate every point with its kind, entries first.
    pub fn iter(&self) -> impl Iterator<Item = (PointKind, &NamedPoint)> {
        self.entries
            .iter()
            .map(|p| (PointKind::Entry, p))
            .chain(self.exits.iter().map(|p| (PointKind::Exit, p)))
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.exits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.exits.is_empty()
    }
}

/// A polygon whose cells cost `factor` times more to cross.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PenaltyZone {
    pub polygon: Polygon,
    pub factor: f64,
}

impl PenaltyZone {
    pub fn new(polygon: Polygon, factor: f64) -> Self {
        Self { polygon, factor }
    }

    /// Whether `factor` is usable as a traversal multiplier.
    #[inline]
    pub fn is_valid_factor(factor: f64) -> bool {
        factor.is_finite() && factor >= 1.0
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable copy of a layout at a given version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutSnapshot {
    pub version: LayoutVersion,
    /// Extent of the floor plan, in layout pixels.
    pub floor_plan: Rect,
    /// World units per layout pixel.
    pub units_per_pixel: f64,
    /// Unit world distances are measured in.
    pub unit: LengthUnit,
    /// Cell edge length, in layout pixels.
    pub resolution: f64,
    pub obstacles: Vec<Polygon>,
    pub penalty_zones: Vec<PenaltyZone>,
    pub boundary: Option<Polygon>,
    pub points: PointSet,
}

impl LayoutSnapshot {
    /// A snapshot with no content over `floor_plan`, at version zero.
    pub fn empty(floor_plan: Rect) -> Self {
        Self {
            version: LayoutVersion::INITIAL,
            floor_plan,
            units_per_pixel: 1.0,
            unit: LengthUnit::default(),
            resolution: DEFAULT_RESOLUTION,
            obstacles: Vec::new(),
            penalty_zones: Vec::new(),
            boundary: None,
            points: PointSet::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by [`Layout`] edits.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A point of this kind already uses the name.
    DuplicateName { kind: PointKind, name: String },
    /// No point of this kind has the name.
    UnknownName { kind: PointKind, name: String },
    /// Obstacle or penalty-zone index out of bounds.
    NoSuchShape { index: usize },
    /// Penalty factor below 1 or not finite.
    InvalidPenalty(f64),
    /// Scale or resolution that is not a positive finite number.
    InvalidParameter { what: &'static str, value: f64 },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { kind, name } => {
                write!(f, "{kind} \u{201c}{name}\u{201d} already exists")
            }
            Self::UnknownName { kind, name } => write!(f, "no {kind} named \u{201c}{name}\u{201d}"),
            Self::NoSuchShape { index } => write!(f, "no shape at index {index}"),
            Self::InvalidPenalty(v) => write!(f, "penalty factor must be >= 1, got {v}"),
            Self::InvalidParameter { what, value } => {
                write!(f, "{what} must be a positive number, got {value}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Result of a bulk point placement along a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineFill {
    pub added: usize,
    /// Names that already existed and were left untouched.
    pub skipped: usize,
}

/// Mutable warehouse layout with version tracking.
#[derive(Debug, Clone)]
pub struct Layout {
    floor_plan: Rect,
    units_per_pixel: f64,
    unit: LengthUnit,
    resolution: f64,
    obstacles: Vec<Polygon>,
    penalty_zones: Vec<PenaltyZone>,
    boundary: Option<Polygon>,
    entries: BTreeMap<String, Pos>,
    exits: BTreeMap<String, Pos>,
    tracker: VersionTracker,
}

impl Layout {
    /// Create an empty layout over the given floor-plan extent.
    pub fn new(floor_plan: Rect) -> Self {
        Self {
            floor_plan,
            units_per_pixel: 1.0,
            unit: LengthUnit::default(),
            resolution: DEFAULT_RESOLUTION,
            obstacles: Vec::new(),
            penalty_zones: Vec::new(),
            boundary: None,
            entries: BTreeMap::new(),
            exits: BTreeMap::new(),
            tracker: VersionTracker::new(),
        }
    }

    /// The version of the layout as it is now.
    #[inline]
    pub fn current_version(&self) -> LayoutVersion {
        self.tracker.current()
    }

    #[inline]
    pub fn tracker(&self) -> &VersionTracker {
        &self.tracker
    }

    /// Take an immutable copy stamped with the current version.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let collect = |m: &BTreeMap<String, Pos>| {
            m.iter()
                .map(|(name, &pos)| NamedPoint::new(name.clone(), pos))
                .collect()
        };
        LayoutSnapshot {
            version: self.tracker.current(),
            floor_plan: self.floor_plan,
            units_per_pixel: self.units_per_pixel,
            unit: self.unit,
            resolution: self.resolution,
            obstacles: self.obstacles.clone(),
            penalty_zones: self.penalty_zones.clone(),
            boundary: self.boundary.clone(),
            points: PointSet {
                entries: collect(&self.entries),
                exits: collect(&self.exits),
            },
        }
    }

    // --- accessors ---

    pub fn floor_plan(&self) -> Rect {
        self.floor_plan
    }

    pub fn units_per_pixel(&self) -> f64 {
        self.units_per_pixel
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn obstacles(&self) -> &[Polygon] {
        &self.obstacles
    }

    pub fn penalty_zones(&self) -> &[PenaltyZone] {
        &self.penalty_zones
    }

    pub fn boundary(&self) -> Option<&Polygon> {
        self.boundary.as_ref()
    }

    pub fn entry(&self, name: &str) -> Option<Pos> {
        self.entries.get(name).copied()
    }

    pub fn exit(&self, name: &str) -> Option<Pos> {
        self.exits.get(name).copied()
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn exit_names(&self) -> impl Iterator<Item = &str> {
        self.exits.keys().map(String::as_str)
    }

    // --- global parameters ---

    pub fn set_floor_plan(&mut self, floor_plan: Rect) {
        if self.floor_plan != floor_plan {
            self.floor_plan = floor_plan;
            self.tracker.bump();
        }
    }

    /// Set the calibration: world units per layout pixel, and their unit.
    pub fn set_scale(&mut self, units_per_pixel: f64, unit: LengthUnit) -> Result<(), LayoutError> {
        check_positive("scale", units_per_pixel)?;
        if self.units_per_pixel != units_per_pixel || self.unit != unit {
            log::debug!("scale set to {units_per_pixel} {}/px", unit.suffix());
            self.units_per_pixel = units_per_pixel;
            self.unit = unit;
            self.tracker.bump();
        }
        Ok(())
    }

    /// Set the cell edge length in layout pixels.
    pub fn set_resolution(&mut self, resolution: f64) -> Result<(), LayoutError> {
        check_positive("resolution", resolution)?;
        if self.resolution != resolution {
            self.resolution = resolution;
            self.tracker.bump();
        }
        Ok(())
    }

    // --- shapes ---

    /// Add an obstacle. Returns its index.
    pub fn add_obstacle(&mut self, polygon: Polygon) -> usize {
        self.obstacles.push(polygon);
        self.tracker.bump();
        self.obstacles.len() - 1
    }

    pub fn replace_obstacle(&mut self, index: usize, polygon: Polygon) -> Result<(), LayoutError> {
        let slot = self
            .obstacles
            .get_mut(index)
            .ok_or(LayoutError::NoSuchShape { index })?;
        if *slot != polygon {
            *slot = polygon;
            self.tracker.bump();
        }
        Ok(())
    }

    pub fn remove_obstacle(&mut self, index: usize) -> Result<Polygon, LayoutError> {
        if index >= self.obstacles.len() {
            return Err(LayoutError::NoSuchShape { index });
        }
        let removed = self.obstacles.remove(index);
        self.tracker.bump();
        Ok(removed)
    }

    /// Add a penalty zone. Returns its index.
    pub fn add_penalty_zone(
        &mut self,
        polygon: Polygon,
        factor: f64,
    ) -> Result<usize, LayoutError> {
        if !PenaltyZone::is_valid_factor(factor) {
            return Err(LayoutError::InvalidPenalty(factor));
        }
        self.penalty_zones.push(PenaltyZone::new(polygon, factor));
        self.tracker.bump();
        Ok(self.penalty_zones.len() - 1)
    }

    pub fn replace_penalty_zone(
        &mut self,
        index: usize,
        zone: PenaltyZone,
    ) -> Result<(), LayoutError> {
        if !PenaltyZone::is_valid_factor(zone.factor) {
            return Err(LayoutError::InvalidPenalty(zone.factor));
        }
        let slot = self
            .penalty_zones
            .get_mut(index)
            .ok_or(LayoutError::NoSuchShape { index })?;
        if *slot != zone {
            *slot = zone;
            self.tracker.bump();
        }
        Ok(())
    }

    pub fn remove_penalty_zone(&mut self, index: usize) -> Result<PenaltyZone, LayoutError> {
        if index >= self.penalty_zones.len() {
            return Err(LayoutError::NoSuchShape { index });
        }
        let removed = self.penalty_zones.remove(index);
        self.tracker.bump();
        Ok(removed)
    }

    pub fn set_boundary(&mut self, polygon: Polygon) {
        if self.boundary.as_ref() != Some(&polygon) {
            self.boundary = Some(polygon);
            self.tracker.bump();
        }
    }

    pub fn clear_boundary(&mut self) {
        if self.boundary.take().is_some() {
            self.tracker.bump();
        }
    }

    // --- named points ---

    fn points_mut(&mut self, kind: PointKind) -> &mut BTreeMap<String, Pos> {
        match kind {
            PointKind::Entry => &mut self.entries,
            PointKind::Exit => &mut self.exits,
        }
    }

    /// Add a named point. Names are unique per kind.
    pub fn add_point(&mut self, kind: PointKind, name: &str, pos: Pos) -> Result<(), LayoutError> {
        let points = self.points_mut(kind);
        if points.contains_key(name) {
            return Err(LayoutError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        points.insert(name.to_string(), pos);
        log::debug!("added {kind} {name} at {pos}");
        self.tracker.bump();
        Ok(())
    }

    /// Move an existing named point.
    pub fn move_point(&mut self, kind: PointKind, name: &str, pos: Pos) -> Result<(), LayoutError> {
        let slot = self
            .points_mut(kind)
            .get_mut(name)
            .ok_or_else(|| LayoutError::UnknownName {
                kind,
                name: name.to_string(),
            })?;
        if *slot != pos {
            *slot = pos;
            self.tracker.bump();
        }
        Ok(())
    }

    /// Remove a named point, returning its position.
    pub fn remove_point(&mut self, kind: PointKind, name: &str) -> Result<Pos, LayoutError> {
        let pos = self
            .points_mut(kind)
            .remove(name)
            .ok_or_else(|| LayoutError::UnknownName {
                kind,
                name: name.to_string(),
            })?;
        self.tracker.bump();
        Ok(pos)
    }

    pub fn add_entry(&mut self, name: &str, pos: Pos) -> Result<(), LayoutError> {
        self.add_point(PointKind::Entry, name, pos)
    }

    pub fn add_exit(&mut self, name: &str, pos: Pos) -> Result<(), LayoutError> {
        self.add_point(PointKind::Exit, name, pos)
    }

    /// Place pick aisles `{cluster}{start}..={cluster}{end}` along the
    /// vertical line through the midpoint of `p1`–`p2`.
    ///
    /// Aisles face each other in pairs: numbers `n` and `n + 1` share a
    /// position, and pairs are spaced evenly from the top to the bottom of
    /// the line.
    pub fn add_entries_along_line(
        &mut self,
        cluster: &str,
        start: u32,
        end: u32,
        p1: Pos,
        p2: Pos,
    ) -> LineFill {
        let mut fill = LineFill::default();
        if end < start {
            return fill;
        }
        let total = (u64::from(end) - u64::from(start) + 1) as usize;
        let pairs = total.div_ceil(2);
        let x = p1.midpoint(p2).x;
        let (y0, y1) = (p1.y.min(p2.y), p1.y.max(p2.y));
        let spacing = if pairs > 1 {
            (y1 - y0) / (pairs - 1) as f64
        } else {
            0.0
        };

        let mut numbers = start..=end;
        for i in 0..pairs {
            let y = if pairs > 1 {
                y0 + i as f64 * spacing
            } else {
                (y0 + y1) / 2.0
            };
            for num in numbers.by_ref().take(2) {
                let name = format!("{cluster}{num}");
                self.record_fill(&mut fill, PointKind::Entry, name, Pos::new(x, y));
            }
        }
        fill
    }

    /// Place staging locations `{cluster}{start}..={cluster}{end}` evenly
    /// along the horizontal line through the midpoint of `p1`–`p2`.
    pub fn add_exits_along_line(
        &mut self,
        cluster: &str,
        start: u32,
        end: u32,
        p1: Pos,
        p2: Pos,
    ) -> LineFill {
        let mut fill = LineFill::default();
        if end < start {
            return fill;
        }
        let count = (u64::from(end) - u64::from(start) + 1) as usize;
        let y = p1.midpoint(p2).y;
        let (x0, x1) = (p1.x.min(p2.x), p1.x.max(p2.x));
        let spacing = if count > 1 {
            (x1 - x0) / (count - 1) as f64
        } else {
            0.0
        };

        for (i, num) in (start..=end).enumerate() {
            let x = if count > 1 {
                x0 + i as f64 * spacing
            } else {
                (x0 + x1) / 2.0
            };
            let name = format!("{cluster}{num}");
            self.record_fill(&mut fill, PointKind::Exit, name, Pos::new(x, y));
        }
        fill
    }

    fn record_fill(&mut self, fill: &mut LineFill, kind: PointKind, name: String, pos: Pos) {
        match self.add_point(kind, &name, pos) {
            Ok(()) => fill.added += 1,
            Err(_) => fill.skipped += 1,
        }
    }
}

fn check_positive(what: &'static str, value: f64) -> Result<(), LayoutError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidParameter { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new(Rect::sized(100.0, 80.0))
    }

    #[test]
    fn every_mutation_bumps_version() {
        let mut l = layout();
        let mut last = l.current_version();
        let mut check = |l: &Layout| {
            let v = l.current_version();
            assert!(v > last, "{v} should be newer than {last}");
            last = v;
        };

        l.add_obstacle(Polygon::rect(10.0, 10.0, 20.0, 20.0));
        check(&l);
        l.replace_obstacle(0, Polygon::rect(10.0, 10.0, 25.0, 20.0)).unwrap();
        check(&l);
        l.add_penalty_zone(Polygon::rect(0.0, 0.0, 5.0, 5.0), 3.0).unwrap();
        check(&l);
        l.set_boundary(Polygon::rect(0.0, 0.0, 90.0, 70.0));
        check(&l);
        l.add_entry("A1", Pos::new(30.0, 30.0)).unwrap();
        check(&l);
        l.move_point(PointKind::Entry, "A1", Pos::new(31.0, 30.0)).unwrap();
        check(&l);
        l.add_exit("S1", Pos::new(50.0, 60.0)).unwrap();
        check(&l);
        l.set_scale(0.05, LengthUnit::Meters).unwrap();
        check(&l);
        l.set_resolution(4.0).unwrap();
        check(&l);
        l.remove_point(PointKind::Exit, "S1").unwrap();
        check(&l);
        l.remove_obstacle(0).unwrap();
        check(&l);
        l.remove_penalty_zone(0).unwrap();
        check(&l);
        l.clear_boundary();
        check(&l);
        l.set_floor_plan(Rect::sized(120.0, 80.0));
        check(&l);
    }

    #[test]
    fn noop_edits_keep_version() {
        let mut l = layout();
        l.add_entry("A1", Pos::new(1.0, 1.0)).unwrap();
        l.set_resolution(3.0).unwrap();
        let v = l.current_version();
        l.move_point(PointKind::Entry, "A1", Pos::new(1.0, 1.0)).unwrap();
        l.set_resolution(3.0).unwrap();
        l.clear_boundary();
        assert_eq!(l.current_version(), v);
    }

    #[test]
    fn failed_edits_keep_version() {
        let mut l = layout();
        l.add_entry("A1", Pos::new(1.0, 1.0)).unwrap();
        let v = l.current_version();
        assert_eq!(
            l.add_entry("A1", Pos::new(2.0, 2.0)),
            Err(LayoutError::DuplicateName {
                kind: PointKind::Entry,
                name: "A1".into()
            })
        );
        assert!(l.remove_point(PointKind::Exit, "A1").is_err());
        assert!(l.remove_obstacle(3).is_err());
        assert_eq!(
            l.add_penalty_zone(Polygon::rect(0.0, 0.0, 1.0, 1.0), 0.5),
            Err(LayoutError::InvalidPenalty(0.5))
        );
        assert!(l.set_resolution(0.0).is_err());
        assert!(l.set_scale(f64::NAN, LengthUnit::Feet).is_err());
        assert_eq!(l.current_version(), v);
    }

    #[test]
    fn entries_and_exits_have_separate_namespaces() {
        let mut l = layout();
        l.add_entry("X", Pos::new(1.0, 1.0)).unwrap();
        l.add_exit("X", Pos::new(2.0, 2.0)).unwrap();
        assert_eq!(l.entry("X"), Some(Pos::new(1.0, 1.0)));
        assert_eq!(l.exit("X"), Some(Pos::new(2.0, 2.0)));
    }

    #[test]
    fn snapshot_is_stamped_and_sorted() {
        let mut l = layout();
        l.add_entry("B", Pos::new(1.0, 1.0)).unwrap();
        l.add_entry("A", Pos::new(2.0, 2.0)).unwrap();
        let snap = l.snapshot();
        assert_eq!(snap.version, l.current_version());
        let names: Vec<_> = snap.points.entries.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        l.add_obstacle(Polygon::rect(0.0, 0.0, 1.0, 1.0));
        assert!(snap.version < l.current_version());
        assert!(snap.obstacles.is_empty());
    }

    #[test]
    fn entries_along_line_come_in_pairs() {
        let mut l = layout();
        let (top, bottom) = (Pos::new(10.0, 0.0), Pos::new(10.0, 40.0));
        let fill = l.add_entries_along_line("A", 1, 5, top, bottom);
        assert_eq!(fill, LineFill { added: 5, skipped: 0 });
        assert_eq!(l.entry("A1"), Some(Pos::new(10.0, 0.0)));
        assert_eq!(l.entry("A2"), Some(Pos::new(10.0, 0.0)));
        assert_eq!(l.entry("A3"), Some(Pos::new(10.0, 20.0)));
        assert_eq!(l.entry("A5"), Some(Pos::new(10.0, 40.0)));
        assert_eq!(l.entry("A6"), None);
    }

    #[test]
    fn exits_along_line_skip_duplicates() {
        let mut l = layout();
        l.add_exit("S2", Pos::new(0.0, 0.0)).unwrap();
        let fill = l.add_exits_along_line("S", 1, 3, Pos::new(0.0, 70.0), Pos::new(60.0, 70.0));
        assert_eq!(fill, LineFill { added: 2, skipped: 1 });
        assert_eq!(l.exit("S1"), Some(Pos::new(0.0, 70.0)));
        assert_eq!(l.exit("S2"), Some(Pos::new(0.0, 0.0)));
        assert_eq!(l.exit("S3"), Some(Pos::new(60.0, 70.0)));
    }

    #[test]
    fn single_point_line_uses_midpoint() {
        let mut l = layout();
        l.add_exits_along_line("D", 7, 7, Pos::new(0.0, 10.0), Pos::new(20.0, 10.0));
        assert_eq!(l.exit("D7"), Some(Pos::new(10.0, 10.0)));
        let none = l.add_exits_along_line("D", 9, 8, Pos::ZERO, Pos::ZERO);
        assert_eq!(none, LineFill::default());
    }

    #[test]
    fn numbering_up_to_u32_max() {
        let mut l = layout();
        let (a, b) = (Pos::new(10.0, 0.0), Pos::new(10.0, 40.0));
        let fill = l.add_entries_along_line("A", u32::MAX, u32::MAX, a, b);
        assert_eq!(fill, LineFill { added: 1, skipped: 0 });
        assert_eq!(l.entry(&format!("A{}", u32::MAX)), Some(Pos::new(10.0, 20.0)));

        let fill = l.add_entries_along_line("B", u32::MAX - 2, u32::MAX, a, b);
        assert_eq!(fill, LineFill { added: 3, skipped: 0 });
        assert_eq!(l.entry(&format!("B{}", u32::MAX)), Some(Pos::new(10.0, 40.0)));

        let fill = l.add_exits_along_line("S", u32::MAX - 1, u32::MAX, a, b);
        assert_eq!(fill, LineFill { added: 2, skipped: 0 });
        assert_eq!(l.exit(&format!("S{}", u32::MAX)), Some(Pos::new(10.0, 20.0)));
    }
}
