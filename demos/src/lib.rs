//! Shared pieces of the aislepath demos: a sample warehouse and logger setup.

use aislepath_core::{Layout, LayoutError, LengthUnit, Polygon, Pos, Rect};
use aislepath_paths::{ResolveError, RoutePlanner};

/// Floor plan width in layout pixels.
pub const FLOOR_WIDTH: f64 = 600.0;
/// Floor plan height in layout pixels.
pub const FLOOR_HEIGHT: f64 = 400.0;

const RACKS: usize = 5;
const RACK_PITCH: f64 = 100.0;

/// A small warehouse: five racks with pick aisles between them, a congested
/// cross aisle and a row of staging locations along the bottom wall.
///
/// 20 px per metre, one cell every 4 px.
pub fn sample_layout() -> Result<Layout, LayoutError> {
    let mut layout = Layout::new(Rect::sized(FLOOR_WIDTH, FLOOR_HEIGHT));
    layout.set_scale(0.05, LengthUnit::Meters)?;
    layout.set_resolution(4.0)?;
    layout.set_boundary(Polygon::rect(10.0, 10.0, FLOOR_WIDTH - 10.0, FLOOR_HEIGHT - 10.0));

    for i in 0..RACKS {
        let x = 60.0 + i as f64 * RACK_PITCH;
        layout.add_obstacle(Polygon::rect(x, 40.0, x + 40.0, 300.0));
    }
    // A column with a chamfered base in the middle of the staging area.
    layout.add_obstacle(Polygon::from(vec![
        (290.0, 340.0),
        (310.0, 340.0),
        (316.0, 356.0),
        (284.0, 356.0),
    ]));
    layout.add_penalty_zone(Polygon::rect(20.0, 310.0, FLOOR_WIDTH - 20.0, 330.0), 10.0)?;

    for (i, cluster) in ["A", "B", "C", "D"].into_iter().enumerate() {
        let x = 130.0 + i as f64 * RACK_PITCH;
        let (top, bottom) = (Pos::new(x, 60.0), Pos::new(x, 280.0));
        let fill = layout.add_entries_along_line(cluster, 1, 8, top, bottom);
        log::debug!("aisle {cluster}: {} pick points", fill.added);
    }
    layout.add_exits_along_line("S", 1, 5, Pos::new(80.0, 370.0), Pos::new(520.0, 370.0));
    Ok(layout)
}

/// Install a `fern` logger writing to stderr.
pub fn init_logging(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:<5} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

/// Shortest route from `entry` to any exit of the committed maps, as
/// `(exit name, distance)`.
pub fn nearest_exit(
    planner: &RoutePlanner,
    entry: &str,
) -> Result<Option<(String, f64)>, ResolveError> {
    let mut best: Option<(String, f64)> = None;
    for exit in planner.layout().exit_names() {
        match planner.resolve(entry, exit) {
            Ok(route) => {
                if best.as_ref().is_none_or(|(_, d)| route.distance < *d) {
                    best = Some((route.destination, route.distance));
                }
            }
            Err(ResolveError::UnreachableDestination { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aislepath_paths::CancelToken;

    #[test]
    fn sample_layout_is_fully_routable() {
        let layout = sample_layout().unwrap();
        assert_eq!(layout.entry_names().count(), 32);
        assert_eq!(layout.exit_names().count(), 5);

        let planner = RoutePlanner::new(layout);
        let maps = planner.rebuild(|_, _| {}, &CancelToken::new()).unwrap();
        assert!(maps.unplaceable().is_empty());
        assert_eq!(maps.source_names().count(), 32);

        for entry in planner.layout().entry_names() {
            let (exit, distance) = nearest_exit(&planner, entry).unwrap().unwrap();
            assert!(exit.starts_with('S'));
            assert!(distance > 0.0, "{entry} -> {exit}");
        }
    }

    #[test]
    fn nearest_exit_reports_staleness() {
        let mut planner = RoutePlanner::new(sample_layout().unwrap());
        planner.rebuild(|_, _| {}, &CancelToken::new()).unwrap();
        planner
            .layout_mut()
            .add_obstacle(Polygon::rect(20.0, 340.0, 40.0, 360.0));
        assert!(matches!(
            nearest_exit(&planner, "A1"),
            Err(ResolveError::StaleComputation { .. })
        ));
    }
}
