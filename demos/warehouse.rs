//! Warehouse routing demo: precomputes routes for a sample layout, prints
//! the nearest staging location for every pick aisle, then edits the layout
//! and shows the stale-map check before rebuilding.
//!
//! Run: cargo run --bin warehouse [-- --grid]

use std::sync::atomic::{AtomicUsize, Ordering};

use aislepath_core::{LengthUnit, Polygon};
use aislepath_demos::{init_logging, nearest_exit, sample_layout};
use aislepath_paths::{CancelToken, RoutePlanner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(log::LevelFilter::Info)?;
    let show_grid = std::env::args().any(|a| a == "--grid");

    let mut planner = RoutePlanner::new(sample_layout()?);
    rebuild(&planner)?;

    if show_grid {
        if let Some(maps) = planner.store().current() {
            print!("{}", maps.grid().to_ascii());
        }
    }

    println!("{:<6} {:<6} {:>9} {:>9}", "aisle", "stage", "m", "ft");
    for entry in planner.layout().entry_names() {
        match nearest_exit(&planner, entry)? {
            Some((exit, d)) => println!(
                "{entry:<6} {exit:<6} {d:>9.2} {:>9.2}",
                LengthUnit::Meters.convert(d, LengthUnit::Feet)
            ),
            None => println!("{entry:<6} {:<6} {:>9} {:>9}", "-", "-", "-"),
        }
    }

    // Block the left end of the staging row and try the old maps.
    planner
        .layout_mut()
        .add_obstacle(Polygon::rect(20.0, 340.0, 200.0, 352.0));
    match planner.resolve("A1", "S1") {
        Ok(route) => log::warn!("unexpected route of {:.2} m from stale maps", route.distance),
        Err(e) => log::info!("A1 -> S1 refused: {e}"),
    }

    rebuild(&planner)?;
    let route = planner.resolve("A1", "S1")?;
    println!(
        "A1 -> S1 after edit: {:.2} {} over {} cells",
        route.distance,
        route.unit.suffix(),
        route.cells.len()
    );
    Ok(())
}

fn rebuild(planner: &RoutePlanner) -> Result<(), Box<dyn std::error::Error>> {
    let last_reported = AtomicUsize::new(0);
    let maps = planner.rebuild(
        |done, total| {
            // Report roughly every quarter of the run.
            let step = total.div_ceil(4).max(1);
            if done == total || done / step > last_reported.load(Ordering::Relaxed) {
                last_reported.store(done / step, Ordering::Relaxed);
                log::info!("precompute {done}/{total}");
            }
        },
        &CancelToken::new(),
    )?;
    for p in maps.unplaceable() {
        log::warn!("{p}");
    }
    Ok(())
}
