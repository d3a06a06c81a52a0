//! Runs workers over a matrix and decides the outcome of the race against
//! the deadline.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::Error;
use crate::deadline::Deadline;
use crate::matrix::Matrix;
use crate::partition::{self, WorkRange};
use crate::placement::Placement;
use crate::worker::{self, WorkerStats};

/// How an invocation ended.
///
/// On [`Outcome::DeadlineExceeded`] the matrix holds a valid partial result:
/// every row is either fully transformed or untouched.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    DeadlineExceeded,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Summary of one invocation.
#[derive(Debug, Clone)]
pub struct Report {
    pub outcome: Outcome,
    pub workers: usize,
    pub rows_total: usize,
    pub rows_completed: usize,
    pub elements_completed: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl Report {
    /// Transformed elements per second of wall time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.elements_completed as f64 / secs
    }
}

/// Engine settings.
#[derive(Clone)]
pub struct EngineConfig {
    workers: NonZeroUsize,
    placement: Option<Arc<dyn Placement>>,
}

impl EngineConfig {
    /// One worker per unit of available parallelism, no placement (the same
    /// as [`Unpinned`](crate::Unpinned)).
    pub fn new() -> Self {
        Self {
            workers: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            placement: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self, Error> {
        self.workers = NonZeroUsize::new(workers).ok_or(Error::ZeroWorkers)?;
        Ok(self)
    }

    pub fn with_placement(mut self, placement: impl Placement + 'static) -> Self {
        self.placement = Some(Arc::new(placement));
        self
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("workers", &self.workers)
            .field("placement", &self.placement.is_some())
            .finish()
    }
}

/// Deadline-bounded parallel transform engine.
///
/// Each call partitions the rows, arms a deadline, runs one thread per
/// non-empty range and waits for all of them. Workers write only to their
/// own rows, so the buffer needs no locking. Nothing outlives a call.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use deadline_matrix::{Engine, EngineConfig, Matrix, Outcome};
///
/// let mut m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
/// let engine = Engine::new(EngineConfig::new().with_workers(2)?);
/// let report = engine.execute(&mut m, Duration::from_secs(10), |x| x * 2.0)?;
///
/// assert_eq!(report.outcome, Outcome::Success);
/// assert_eq!(m.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
/// # Ok::<(), deadline_matrix::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies `transform` to every element of `matrix` in place, stopping
    /// cooperatively once `deadline` has elapsed.
    ///
    /// The outcome is decided once, after every worker has returned: it is
    /// [`Outcome::Success`] only if the deadline timer had not fired by then.
    /// A timer firing just as the last worker finishes may go either way.
    ///
    /// # Panics
    ///
    /// If `transform` panics on a worker, the panic is resumed on the
    /// calling thread after all workers have stopped.
    #[tracing::instrument(
        level = "debug",
        skip(self, matrix, transform),
        fields(rows = matrix.rows(), cols = matrix.cols(), workers = self.config.workers.get())
    )]
    pub fn execute<F>(
        &self,
        matrix: &mut Matrix,
        deadline: Duration,
        transform: F,
    ) -> Result<Report, Error>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let rows_total = matrix.rows();
        let cols = matrix.cols();
        let ranges = partition::plan(rows_total, self.config.workers);
        tracing::debug!(?ranges, "planned work ranges");

        let started_at = Utc::now();
        let started = Instant::now();
        let timer = Deadline::arm(deadline)?;
        let signal = timer.signal();

        let chunks = split_rows(matrix.as_mut_slice(), cols, &ranges);
        let transform = &transform;
        let placement = self.config.placement.as_deref();

        let mut stats = Vec::with_capacity(ranges.len());
        let mut panic = None;
        let spawned = thread::scope(|scope| -> Result<(), Error> {
            let mut handles = Vec::with_capacity(ranges.len());
            for (index, (range, rows)) in ranges.iter().copied().zip(chunks).enumerate() {
                if range.is_empty() {
                    continue;
                }
                let worker_signal = signal.clone();
                let handle = thread::Builder::new()
                    .name(format!("matrix-worker-{index}"))
                    .spawn_scoped(scope, move || {
                        if let Some(placement) = placement {
                            placement.place(index);
                        }
                        let result = worker::run(rows, cols, range, transform, &worker_signal);
                        tracing::debug!(
                            worker = index,
                            rows_completed = result.rows_completed,
                            cancelled = result.cancelled,
                            "worker stopped"
                        );
                        result
                    });

                match handle {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // Wind down what already started before reporting.
                        signal.cancel();
                        join_all(handles, &mut stats, &mut panic);
                        return Err(Error::Spawn(e));
                    }
                }
            }
            join_all(handles, &mut stats, &mut panic);
            Ok(())
        });

        let in_time = timer.disarm();
        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }
        spawned?;

        let outcome = if in_time {
            Outcome::Success
        } else {
            Outcome::DeadlineExceeded
        };
        let rows_completed: usize = stats.iter().map(|s| s.rows_completed).sum();
        let report = Report {
            outcome,
            workers: ranges.len(),
            rows_total,
            rows_completed,
            elements_completed: rows_completed * cols,
            started_at,
            elapsed: started.elapsed(),
        };

        tracing::debug!(
            %outcome,
            rows_completed,
            elapsed = ?report.elapsed,
            "transform finished"
        );
        Ok(report)
    }

    /// Runs [`Engine::execute`] on tokio's blocking pool and hands the
    /// matrix back with the report.
    pub async fn execute_owned<F>(
        &self,
        mut matrix: Matrix,
        deadline: Duration,
        transform: F,
    ) -> Result<(Matrix, Report), Error>
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        let engine = self.clone();
        let task = tokio::task::spawn_blocking(move || {
            let report = engine.execute(&mut matrix, deadline, transform)?;
            Ok::<_, Error>((matrix, report))
        });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(Error::Join(e)),
        }
    }
}

type PanicPayload = Box<dyn std::any::Any + Send + 'static>;

fn join_all(
    handles: Vec<thread::ScopedJoinHandle<'_, WorkerStats>>,
    stats: &mut Vec<WorkerStats>,
    panic: &mut Option<PanicPayload>,
) {
    for handle in handles {
        match handle.join() {
            Ok(s) => stats.push(s),
            Err(payload) => {
                panic.get_or_insert(payload);
            }
        }
    }
}

/// Cuts the buffer into one disjoint slice per range.
fn split_rows<'a>(mut data: &'a mut [f64], cols: usize, ranges: &[WorkRange]) -> Vec<&'a mut [f64]> {
    let mut chunks = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut data).split_at_mut(range.len() * cols);
        chunks.push(head);
        data = tail;
    }
    chunks
}

/// Transforms `matrix` in place with the default engine configuration.
///
/// ```
/// use std::time::Duration;
/// use deadline_matrix::{Matrix, Outcome, transform};
///
/// let mut m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
/// let outcome = transform(&mut m, Duration::from_secs(10), |x| x * x + 1.0)?;
/// assert_eq!(outcome, Outcome::Success);
/// assert_eq!(m.as_slice(), &[2.0, 5.0, 10.0, 17.0]);
/// # Ok::<(), deadline_matrix::Error>(())
/// ```
pub fn transform<F>(matrix: &mut Matrix, deadline: Duration, transform: F) -> Result<Outcome, Error>
where
    F: Fn(f64) -> f64 + Sync,
{
    Engine::default()
        .execute(matrix, deadline, transform)
        .map(|report| report.outcome)
}
