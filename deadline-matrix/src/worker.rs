//! Applies a transform to one worker's rows.

use crate::deadline::CancellationSignal;
use crate::partition::WorkRange;

/// What a worker got through before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub rows_completed: usize,
    pub cancelled: bool,
}

/// Transforms the rows of `range` in place.
///
/// `rows` holds exactly the rows of `range`, `cols` elements each. The
/// signal is checked before every row; a row that has started is always
/// finished, so no row is ever left half transformed.
pub fn run<F>(
    rows: &mut [f64],
    cols: usize,
    range: WorkRange,
    transform: &F,
    signal: &CancellationSignal,
) -> WorkerStats
where
    F: Fn(f64) -> f64,
{
    debug_assert_eq!(rows.len(), range.len() * cols);

    for (done, _row) in range.rows().enumerate() {
        if signal.is_cancelled() {
            return WorkerStats {
                rows_completed: done,
                cancelled: true,
            };
        }
        let offset = done * cols;
        for value in &mut rows[offset..offset + cols] {
            *value = transform(*value);
        }
    }

    WorkerStats {
        rows_completed: range.len(),
        cancelled: false,
    }
}
