//! **aislepath-core**: layout model and geometry for warehouse route
//! planning.
//!
//! This crate provides the types shared across the *aislepath* crates:
//! grid-cell and layout-coordinate geometry, polygons, length units, the
//! editable [`Layout`] with its [`VersionTracker`], and the immutable
//! [`LayoutSnapshot`] that grid construction consumes.

pub mod geom;
pub mod layout;
pub mod polygon;
pub mod units;
pub mod version;

pub use geom::{Point, Pos, Range, Rect};
pub use layout::{
    DEFAULT_PENALTY_FACTOR, DEFAULT_RESOLUTION, Layout, LayoutError, LayoutSnapshot, LineFill,
    NamedPoint, PenaltyZone, PointKind, PointSet,
};
pub use polygon::Polygon;
pub use units::LengthUnit;
pub use version::{LayoutVersion, VersionTracker};
