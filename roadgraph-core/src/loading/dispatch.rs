//! Parallel resolution of edge geometry.
//!
//! Work units are dealt round-robin to a fixed pool of scoped worker
//! threads. Each worker owns a progress cell that only it writes and a
//! channel on which it sends its partial results once its bucket is done.
//! The coordinator polls the cells, reports progress and merges the
//! partial maps.

use std::{
    any::Any,
    collections::BTreeMap,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Sender, bounded};
use geo::{LineString, Point};
use itertools::Itertools;
use log::{debug, error, info, warn};

use crate::{
    Error, RoadId,
    geometry::{DEFAULT_ON_LINE_TOLERANCE, trim_with_tolerance},
    model::RoadGeometry,
};

/// How often the coordinator checks for completion
const TICK: Duration = Duration::from_millis(10);

/// One self-contained geometry resolution task
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub id: usize,
    pub from: Point<f64>,
    pub road_id: RoadId,
    pub to: Point<f64>,
    /// Full geometry of `road_id`, shared between the units of that road
    pub geometry: Arc<RoadGeometry>,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub workers: usize,
    pub poll_interval: Duration,
    pub tolerance: f64,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(1, usize::from),
            poll_interval: Duration::from_secs(10),
            tolerance: DEFAULT_ON_LINE_TOLERANCE,
        }
    }
}

pub type Resolved = Option<LineString<f64>>;

/// Percentage of a worker's bucket completed, written by that worker only
#[derive(Debug, Default)]
struct WorkerProgress(AtomicU8);

impl WorkerProgress {
    fn set(&self, percent: u8) {
        self.0.store(percent, Ordering::Release);
    }

    fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }
}

/// Trims every unit's road between its two points.
///
/// The result holds exactly one entry per unit id; units that could not be
/// resolved map to `None`.
pub fn resolve_all(units: Vec<WorkUnit>, options: &DispatchOptions) -> BTreeMap<usize, Resolved> {
    let tolerance = options.tolerance;
    resolve_all_with(units, options, move |unit| {
        trim_with_tolerance(&unit.geometry.lines, unit.from, unit.to, tolerance)
    })
}

/// [`resolve_all`] with a custom per-unit resolver
pub fn resolve_all_with<F>(
    units: Vec<WorkUnit>,
    options: &DispatchOptions,
    resolve: F,
) -> BTreeMap<usize, Resolved>
where
    F: Fn(&WorkUnit) -> Result<Resolved, Error> + Sync,
{
    if units.is_empty() {
        return BTreeMap::new();
    }

    let ids: Vec<usize> = units.iter().map(|unit| unit.id).collect();
    let workers = options.workers.clamp(1, units.len());
    let mut buckets: Vec<Vec<WorkUnit>> = (0..workers).map(|_| Vec::new()).collect();
    for (counter, unit) in units.into_iter().enumerate() {
        buckets[counter % workers].push(unit);
    }
    info!(
        "Dispatching {} geometry units to {workers} workers",
        ids.len()
    );

    let progress: Vec<WorkerProgress> = (0..workers).map(|_| WorkerProgress::default()).collect();
    let resolve = &resolve;

    let mut results = thread::scope(|scope| {
        let mut receivers = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for (worker, bucket) in buckets.into_iter().enumerate() {
            let (tx, rx) = bounded(1);
            let cell = &progress[worker];
            receivers.push(rx);
            handles.push(scope.spawn(move || run_worker(worker, bucket, cell, &tx, resolve)));
        }

        let started = Instant::now();
        let mut last_report = started;
        while !handles
            .iter()
            .zip(&progress)
            .all(|(handle, cell)| cell.get() == 100 || handle.is_finished())
        {
            if last_report.elapsed() >= options.poll_interval {
                report_progress(&progress, started);
                last_report = Instant::now();
            }
            thread::sleep(TICK);
        }
        report_progress(&progress, started);

        let mut merged = BTreeMap::new();
        for (worker, rx) in receivers.into_iter().enumerate() {
            match rx.recv() {
                Ok(partial) => merged.extend(partial),
                Err(_) => error!("Worker {worker} exited without sending results"),
            }
        }
        for (worker, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                error!("Worker {worker} panicked");
            }
        }
        merged
    });

    for id in ids {
        results.entry(id).or_insert(None);
    }
    let missing = results.values().filter(|line| line.is_none()).count();
    info!(
        "Resolved {} of {} geometry units",
        results.len() - missing,
        results.len()
    );
    results
}

fn run_worker<F>(
    worker: usize,
    bucket: Vec<WorkUnit>,
    progress: &WorkerProgress,
    tx: &Sender<BTreeMap<usize, Resolved>>,
    resolve: &F,
) where
    F: Fn(&WorkUnit) -> Result<Resolved, Error> + Sync,
{
    let total = bucket.len();
    debug!("Worker {worker} starting with {total} units");

    let mut partial = BTreeMap::new();
    for (done, unit) in bucket.iter().enumerate() {
        let resolved = match panic::catch_unwind(AssertUnwindSafe(|| resolve(unit))) {
            Ok(Ok(line)) => line,
            Ok(Err(err)) => {
                warn!(
                    "Unit {} on road {} ({:?} -> {:?}): {err}",
                    unit.id,
                    unit.road_id,
                    unit.from.x_y(),
                    unit.to.x_y()
                );
                None
            }
            Err(payload) => {
                let failure = Error::WorkerFailure {
                    unit: unit.id,
                    reason: panic_reason(payload.as_ref()),
                };
                error!("Worker {worker}: {failure}");
                None
            }
        };
        partial.insert(unit.id, resolved);
        // 100 is reserved for "results sent"
        progress.set(percent(done + 1, total).min(99));
    }

    if tx.send(partial).is_err() {
        warn!("Worker {worker}: coordinator stopped listening");
    }
    progress.set(100);
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done * 100 / total).unwrap_or(100)
}

fn report_progress(progress: &[WorkerProgress], started: Instant) {
    let cells: Vec<u8> = progress.iter().map(WorkerProgress::get).collect();
    let overall = cells.iter().map(|&p| usize::from(p)).sum::<usize>() / cells.len().max(1);
    info!(
        "Geometry workers [{}] {overall}% after {:.0?}",
        cells.iter().map(|p| format!("{p:>3}%")).join(" "),
        started.elapsed()
    );
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use geo::{MultiLineString, line_string};

    use super::*;
    use crate::model::RoadClass;

    fn units(count: usize) -> Vec<WorkUnit> {
        let geometry = Arc::new(RoadGeometry {
            class: RoadClass::Ordinary,
            lines: MultiLineString::new(vec![line_string![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 2.0, y: 0.0),
                (x: 3.0, y: 0.0),
            ]]),
        });
        (0..count)
            .map(|i| WorkUnit {
                // Sparse ids so positions and ids differ
                id: i * 7 + 3,
                from: Point::new(0.0, 0.0),
                road_id: "1101".to_string(),
                to: Point::new((i % 4) as f64, 0.0),
                geometry: Arc::clone(&geometry),
            })
            .collect()
    }

    fn options(workers: usize) -> DispatchOptions {
        DispatchOptions {
            workers,
            poll_interval: Duration::from_millis(5),
            tolerance: DEFAULT_ON_LINE_TOLERANCE,
        }
    }

    #[test]
    fn every_unit_id_appears_exactly_once() {
        for workers in 1..=5 {
            for count in [1, 2, 7, 20] {
                let work = units(count);
                let expected: Vec<usize> = work.iter().map(|u| u.id).collect();
                let results = resolve_all(work, &options(workers));
                assert_eq!(
                    results.keys().copied().collect::<Vec<_>>(),
                    expected,
                    "{count} units on {workers} workers"
                );
            }
        }
    }

    #[test]
    fn resolved_lines_match_their_units() {
        let results = resolve_all(units(4), &options(2));
        // Unit 0 trims (0,0)->(0,0): same vertex
        assert_eq!(results[&3], None);
        assert_eq!(
            results[&24],
            Some(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 3.0, y: 0.0)])
        );
    }

    #[test]
    fn failing_and_panicking_units_map_to_none() {
        let work = units(12);
        let expected: Vec<usize> = work.iter().map(|u| u.id).collect();

        let results = resolve_all_with(work, &options(3), |unit| match unit.id % 3 {
            0 => Err(Error::SameLineViolation { parts: 1 }),
            1 => panic!("bad geometry in unit {}", unit.id),
            _ => Ok(Some(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)])),
        });

        assert_eq!(results.keys().copied().collect::<Vec<_>>(), expected);
        for (id, line) in &results {
            assert_eq!(line.is_some(), id % 3 == 2, "unit {id}");
        }
    }

    #[test]
    fn no_units_no_workers() {
        assert!(resolve_all(Vec::new(), &options(4)).is_empty());
    }

    #[test]
    fn percent_is_capped() {
        assert_eq!(percent(0, 3), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
