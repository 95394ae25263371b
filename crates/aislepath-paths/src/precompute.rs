//! Parallel precomputation of shortest routes from every entry point.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use aislepath_core::{Point, PointKind, PointSet, Range};
use aislepath_grid::{CostGrid, resolve_points};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::maps::{PathMaps, SourceMaps};
use crate::search::SearchRange;
use crate::traits::WeightedPather;

/// Tuning for [`precompute`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrecomputeConfig {
    /// Worker threads. `None` uses one per logical CPU.
    pub workers: Option<usize>,
    /// How far, in cells, a point on a blocked cell may be moved.
    pub snap_radius: i32,
}

impl Default for PrecomputeConfig {
    fn default() -> Self {
        Self {
            workers: None,
            snap_radius: 3,
        }
    }
}

impl PrecomputeConfig {
    fn worker_count(&self, jobs: usize) -> usize {
        self.workers
            .unwrap_or_else(num_cpus::get)
            .clamp(1, jobs.max(1))
    }
}

/// Shared flag for cancelling a running precompute from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Errors from [`precompute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrecomputeError {
    /// The run was cancelled; no results were kept.
    Cancelled,
    /// The search from entry point `source` panicked.
    WorkerCrashed { source: String, message: String },
    /// The worker pool could not be started.
    Pool(String),
}

impl fmt::Display for PrecomputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("precompute cancelled"),
            Self::WorkerCrashed { source, message } => {
                write!(f, "search from {source} crashed: {message}")
            }
            Self::Pool(e) => write!(f, "cannot start worker pool: {e}"),
        }
    }
}

impl std::error::Error for PrecomputeError {}

/// Run one Dijkstra search per placeable entry point of `points` over
/// `grid`, in parallel.
///
/// `progress` is called from the worker threads with `(completed, total)`
/// after every finished search. Cancelling `cancel` stops workers before
/// their next search and discards everything computed so far.
pub fn precompute(
    grid: Arc<CostGrid>,
    points: &PointSet,
    config: &PrecomputeConfig,
    progress: impl Fn(usize, usize) + Sync,
    cancel: &CancelToken,
) -> Result<PathMaps, PrecomputeError> {
    if cancel.is_cancelled() {
        return Err(PrecomputeError::Cancelled);
    }
    let started = Instant::now();
    let (placed, unplaceable) = resolve_points(&grid, points, config.snap_radius);

    let mut entries = BTreeMap::new();
    let mut exits = BTreeMap::new();
    for point in placed {
        match point.kind {
            PointKind::Entry => entries.insert(point.name.clone(), point),
            PointKind::Exit => exits.insert(point.name.clone(), point),
        };
    }
    let jobs: Vec<(String, Point)> = entries.values().map(|p| (p.name.clone(), p.cell)).collect();

    let sources = run_searches(&*grid, grid.range(), &jobs, config, &progress, cancel)?;

    log::info!(
        "precomputed {} sources on layout {} in {:.2?} ({} unplaceable)",
        sources.len(),
        grid.version(),
        started.elapsed(),
        unplaceable.len(),
    );
    Ok(PathMaps {
        grid,
        sources,
        entries,
        exits,
        unplaceable,
    })
}

enum Outcome {
    Done(SourceMaps),
    Skipped,
    Crashed(String),
}

/// Run every job on a dedicated pool and gather the maps by source name.
fn run_searches<P>(
    pather: &P,
    range: Range,
    jobs: &[(String, Point)],
    config: &PrecomputeConfig,
    progress: &(impl Fn(usize, usize) + Sync),
    cancel: &CancelToken,
) -> Result<BTreeMap<String, SourceMaps>, PrecomputeError>
where
    P: WeightedPather + Sync + ?Sized,
{
    let total = jobs.len();
    let mut sources = BTreeMap::new();
    if total == 0 {
        return Ok(sources);
    }

    let workers = config.worker_count(total);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(move |i| format!("aislepath-search-{i}"))
        .build()
        .map_err(|e| PrecomputeError::Pool(e.to_string()))?;
    log::debug!("running {total} searches on {workers} workers");

    let completed = AtomicUsize::new(0);
    let aborted = AtomicBool::new(false);
    let outcomes: Vec<Outcome> = pool.install(|| {
        jobs.par_iter()
            .map_init(
                || SearchRange::new(range),
                |scratch, (name, cell)| {
                    if cancel.is_cancelled() || aborted.load(Ordering::Relaxed) {
                        return Outcome::Skipped;
                    }
                    let result =
                        panic::catch_unwind(AssertUnwindSafe(|| scratch.dijkstra(pather, *cell)));
                    match result {
                        Ok(maps) => {
                            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            log::trace!(
                                "search from {name} reached {} cells",
                                maps.distances.len()
                            );
                            progress(done, total);
                            Outcome::Done(maps)
                        }
                        Err(payload) => {
                            aborted.store(true, Ordering::Relaxed);
                            Outcome::Crashed(panic_message(payload.as_ref()))
                        }
                    }
                },
            )
            .collect()
    });

    if cancel.is_cancelled() {
        log::info!("precompute cancelled after {} of {total} searches", completed.into_inner());
        return Err(PrecomputeError::Cancelled);
    }
    for ((name, _), outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Outcome::Done(maps) => {
                sources.insert(name.clone(), maps);
            }
            Outcome::Crashed(message) => {
                log::error!("search from {name} crashed: {message}");
                return Err(PrecomputeError::WorkerCrashed {
                    source: name.clone(),
                    message,
                });
            }
            Outcome::Skipped => {}
        }
    }
    // Skips without cancellation only happen after a crash, which returned above.
    debug_assert_eq!(sources.len(), total);
    Ok(sources)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
