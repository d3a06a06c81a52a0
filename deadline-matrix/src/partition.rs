//! Splits row indices into contiguous per-worker ranges.

use std::num::NonZeroUsize;
use std::ops::Range;

/// A half-open range of row indices assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    pub start: usize,
    pub end: usize,
}

impl WorkRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Divides `0..rows` into `workers` contiguous ranges.
///
/// Every range gets `rows / workers` rows and the last one also takes the
/// remainder, so the ranges are sorted, disjoint and cover `0..rows`
/// exactly. With fewer rows than workers the leading ranges are empty.
pub fn plan(rows: usize, workers: NonZeroUsize) -> Vec<WorkRange> {
    let workers = workers.get();
    let per_worker = rows / workers;

    (0..workers)
        .map(|w| {
            let start = w * per_worker;
            let end = if w == workers - 1 {
                rows
            } else {
                start + per_worker
            };
            WorkRange { start, end }
        })
        .collect()
}
