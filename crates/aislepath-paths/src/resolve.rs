//! Route lookup in precomputed maps.

use std::fmt;

use aislepath_core::{LayoutVersion, LengthUnit, Point, Pos};

use crate::maps::PathMaps;

/// A resolved route between two named points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub source: String,
    pub destination: String,
    /// Grid cells from source to destination, both included.
    pub cells: Vec<Point>,
    /// Cell centres in world units.
    pub waypoints: Vec<Pos>,
    /// Weighted length of the route, in `unit`.
    pub distance: f64,
    pub unit: LengthUnit,
}

impl Route {
    /// Route length converted to `unit`.
    pub fn distance_in(&self, unit: LengthUnit) -> f64 {
        self.unit.convert(self.distance, unit)
    }

    /// Number of moves along the route.
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

/// Errors from [`resolve_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No route joins the two points in the maps.
    UnreachableDestination { source: String, destination: String },
    /// The maps were computed for an older layout.
    StaleComputation {
        computed: LayoutVersion,
        current: LayoutVersion,
    },
    /// No maps have been computed yet.
    NotComputed,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreachableDestination {
                source,
                destination,
            } => write!(f, "no route from {source} to {destination}"),
            Self::StaleComputation { computed, current } => {
                write!(f, "routes were computed for layout {computed}, current is {current}")
            }
            Self::NotComputed => f.write_str("routes have not been computed"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Look up the route from entry point `source` to `destination`.
///
/// `destination` names an exit, or an entry when no exit has that name.
/// `current` is the layout version the caller considers live; maps built
/// from any other version are refused.
pub fn resolve_path(
    source: &str,
    destination: &str,
    maps: &PathMaps,
    current: LayoutVersion,
) -> Result<Route, ResolveError> {
    if maps.version() != current {
        return Err(ResolveError::StaleComputation {
            computed: maps.version(),
            current,
        });
    }
    let unreachable = || ResolveError::UnreachableDestination {
        source: source.to_owned(),
        destination: destination.to_owned(),
    };

    let from = maps.source(source).ok_or_else(unreachable)?;
    let target = maps
        .exit(destination)
        .or_else(|| maps.entry(destination))
        .ok_or_else(unreachable)?;
    let distance = from.distances.get(target.cell).ok_or_else(unreachable)?;
    let cells = from.path_to(target.cell).ok_or_else(unreachable)?;

    let grid = maps.grid();
    let waypoints = cells.iter().map(|&p| grid.cell_center_world(p)).collect();
    Ok(Route {
        source: source.to_owned(),
        destination: destination.to_owned(),
        cells,
        waypoints,
        distance,
        unit: grid.frame().unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precompute::{CancelToken, PrecomputeConfig, precompute};
    use aislepath_core::{Layout, Polygon, Rect};
    use aislepath_grid::{CostGrid, GridConfig, build_grid};
    use std::sync::Arc;

    fn compute(layout: &Layout) -> (Arc<CostGrid>, PathMaps) {
        let grid = Arc::new(build_grid(&layout.snapshot(), &GridConfig::default()).unwrap());
        let maps = precompute(
            grid.clone(),
            &layout.snapshot().points,
            &PrecomputeConfig::default(),
            |_, _| {},
            &CancelToken::new(),
        )
        .unwrap();
        (grid, maps)
    }

    /// A 1-pixel-per-unit layout with single-pixel cells.
    fn unit_layout(w: f64, h: f64) -> Layout {
        let mut layout = Layout::new(Rect::sized(w, h));
        layout.set_resolution(1.0).unwrap();
        layout
    }

    #[test]
    fn open_grid_uses_diagonals() {
        let mut layout = unit_layout(10.0, 10.0);
        layout.add_entry("A", Pos::new(0.5, 0.5)).unwrap();
        layout.add_exit("B", Pos::new(3.5, 4.5)).unwrap();
        let (_, maps) = compute(&layout);
        let route = resolve_path("A", "B", &maps, layout.current_version()).unwrap();
        // Three diagonal moves and one straight one on the 8-connected grid.
        let expected = 3.0 * std::f64::consts::SQRT_2 + 1.0;
        assert!((route.distance - expected).abs() < 1e-9);
        assert!((route.distance - 5.0).abs() < 0.3);
        assert_eq!(route.steps(), 4);
        assert_eq!(route.cells.first(), Some(&Point::new(0, 0)));
        assert_eq!(route.cells.last(), Some(&Point::new(3, 4)));
        assert_eq!(route.waypoints[0], Pos::new(0.5, 0.5));
    }

    #[test]
    fn continuous_wall_is_unreachable() {
        let mut layout = unit_layout(20.0, 10.0);
        layout.add_obstacle(Polygon::rect(9.0, 0.0, 11.0, 10.0));
        layout.add_entry("A", Pos::new(2.5, 5.5)).unwrap();
        layout.add_exit("B", Pos::new(17.5, 5.5)).unwrap();
        let (_, maps) = compute(&layout);
        assert_eq!(
            resolve_path("A", "B", &maps, layout.current_version()),
            Err(ResolveError::UnreachableDestination {
                source: "A".into(),
                destination: "B".into(),
            })
        );
    }

    #[test]
    fn penalty_zone_forces_detour() {
        // The direct route along row 0 is 10 units, 9 of them through a
        // factor-10 zone. Below it a wall leaves a free detour around rows
        // 1..=8 of roughly 25 units.
        let mut layout = unit_layout(11.0, 9.0);
        layout.add_obstacle(Polygon::rect(1.0, 1.0, 10.0, 8.0));
        layout.add_penalty_zone(Polygon::rect(1.0, 0.0, 10.0, 1.0), 10.0).unwrap();
        layout.add_entry("A", Pos::new(0.5, 0.5)).unwrap();
        layout.add_exit("B", Pos::new(10.5, 0.5)).unwrap();
        let snapshot = layout.snapshot();
        let config = GridConfig {
            dilation_cells: 0.0,
            ..GridConfig::default()
        };
        let grid = Arc::new(build_grid(&snapshot, &config).unwrap());
        assert_eq!((grid.width(), grid.height()), (11, 9));
        let maps = precompute(
            grid.clone(),
            &snapshot.points,
            &PrecomputeConfig::default(),
            |_, _| {},
            &CancelToken::new(),
        )
        .unwrap();
        let route = resolve_path("A", "B", &maps, layout.current_version()).unwrap();

        // Down 7, diagonal, across 8, diagonal, up 7.
        let detour = 22.0 + 2.0 * std::f64::consts::SQRT_2;
        assert!((route.distance - detour).abs() < 1e-9);
        assert!(route.distance < 25.0);
        assert!(route.cells.iter().all(|&p| grid.multiplier(p) == Some(1.0)));
        assert!(route.cells.contains(&Point::new(5, 8)));
    }

    #[test]
    fn stale_maps_are_refused() {
        let mut layout = unit_layout(10.0, 10.0);
        layout.add_entry("A", Pos::new(0.5, 0.5)).unwrap();
        layout.add_exit("B", Pos::new(8.5, 8.5)).unwrap();
        let (_, maps) = compute(&layout);
        let computed = layout.current_version();
        assert!(resolve_path("A", "B", &maps, computed).is_ok());

        layout.add_obstacle(Polygon::rect(4.0, 4.0, 6.0, 6.0));
        let current = layout.current_version();
        assert_eq!(
            resolve_path("A", "B", &maps, current),
            Err(ResolveError::StaleComputation { computed, current })
        );
    }

    #[test]
    fn same_point_is_zero() {
        let mut layout = unit_layout(6.0, 6.0);
        layout.add_entry("A", Pos::new(2.5, 2.5)).unwrap();
        layout.add_exit("S", Pos::new(2.2, 2.9)).unwrap();
        let (_, maps) = compute(&layout);
        let v = layout.current_version();

        let to_self = resolve_path("A", "A", &maps, v).unwrap();
        assert_eq!(to_self.distance, 0.0);
        assert_eq!(to_self.cells, vec![Point::new(2, 2)]);

        // Different names, same cell.
        let shared = resolve_path("A", "S", &maps, v).unwrap();
        assert_eq!(shared.distance, 0.0);
        assert_eq!(shared.steps(), 0);
    }

    #[test]
    fn unknown_names_are_unreachable() {
        let mut layout = unit_layout(6.0, 6.0);
        layout.add_entry("A", Pos::new(1.5, 1.5)).unwrap();
        layout.add_exit("S", Pos::new(4.5, 4.5)).unwrap();
        let (_, maps) = compute(&layout);
        let v = layout.current_version();
        assert!(matches!(
            resolve_path("nope", "S", &maps, v),
            Err(ResolveError::UnreachableDestination { .. })
        ));
        assert!(matches!(
            resolve_path("A", "nope", &maps, v),
            Err(ResolveError::UnreachableDestination { .. })
        ));
        // Exits are destinations, not sources.
        assert!(matches!(
            resolve_path("S", "A", &maps, v),
            Err(ResolveError::UnreachableDestination { .. })
        ));
    }

    #[test]
    fn routes_avoid_blocked_cells() {
        let mut layout = unit_layout(30.0, 20.0);
        layout.add_obstacle(Polygon::rect(5.0, 0.0, 7.0, 15.0));
        layout.add_obstacle(Polygon::rect(12.0, 5.0, 14.0, 20.0));
        layout.add_obstacle(Polygon::from(vec![(18.0, 2.0), (26.0, 10.0), (18.0, 14.0)]));
        layout.add_penalty_zone(Polygon::rect(8.0, 0.0, 11.0, 20.0), 4.0).unwrap();
        layout.add_entry("A", Pos::new(1.5, 1.5)).unwrap();
        layout.add_entry("C", Pos::new(9.5, 18.5)).unwrap();
        layout.add_exit("S1", Pos::new(28.5, 18.5)).unwrap();
        layout.add_exit("S2", Pos::new(28.5, 1.5)).unwrap();
        let (grid, maps) = compute(&layout);
        let v = layout.current_version();
        for src in ["A", "C"] {
            for dst in ["S1", "S2"] {
                let route = resolve_path(src, dst, &maps, v).unwrap();
                assert!(route.cells.iter().all(|&p| grid.is_passable(p)), "{src} -> {dst}");
                assert!(route.cells.windows(2).all(|w| w[0].is_adjacent(w[1])));
            }
        }
    }

    #[test]
    fn distance_converts_units() {
        let route = Route {
            source: "A".into(),
            destination: "B".into(),
            cells: vec![Point::ZERO],
            waypoints: vec![Pos::ZERO],
            distance: 10.0,
            unit: LengthUnit::Meters,
        };
        assert!((route.distance_in(LengthUnit::Feet) - 32.8084).abs() < 1e-9);
        assert_eq!(route.distance_in(LengthUnit::Meters), 10.0);
    }

    #[test]
    fn precompute_is_deterministic() {
        use rand::{RngExt, SeedableRng};

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut layout = unit_layout(40.0, 30.0);
        for _ in 0..12 {
            let x = rng.random_range(2.0..34.0);
            let y = rng.random_range(2.0..24.0);
            let w = rng.random_range(1.0..5.0);
            let h = rng.random_range(1.0..5.0);
            layout.add_obstacle(Polygon::rect(x, y, x + w, y + h));
        }
        layout.add_penalty_zone(Polygon::rect(15.0, 0.0, 25.0, 30.0), 3.0).unwrap();
        for i in 0..5 {
            layout
                .add_entry(&format!("A{i}"), Pos::new(0.5, 2.5 + 5.0 * i as f64))
                .unwrap();
        }
        layout.add_exit("S", Pos::new(39.5, 15.5)).unwrap();

        let snapshot = layout.snapshot();
        let grid = Arc::new(build_grid(&snapshot, &GridConfig::default()).unwrap());
        let run = |workers| {
            let config = PrecomputeConfig {
                workers: Some(workers),
                ..PrecomputeConfig::default()
            };
            let cancel = CancelToken::new();
            precompute(grid.clone(), &snapshot.points, &config, |_, _| {}, &cancel).unwrap()
        };
        let one = run(1);
        let many = run(4);
        for name in one.source_names() {
            assert_eq!(one.source(name), many.source(name));
            let a = resolve_path(name, "S", &one, layout.current_version());
            let b = resolve_path(name, "S", &many, layout.current_version());
            assert_eq!(a, b);
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn route_round_trip() {
        let route = Route {
            source: "aisle 3".into(),
            destination: "dock".into(),
            cells: vec![Point::new(1, 1), Point::new(2, 2)],
            waypoints: vec![Pos::new(1.5, 1.5), Pos::new(2.5, 2.5)],
            distance: std::f64::consts::SQRT_2,
            unit: LengthUnit::Feet,
        };
        let json = serde_json::to_string(&route).unwrap();
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(route, back);
    }
}
