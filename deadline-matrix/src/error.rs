//! Error types for deadline-matrix operations.
//!
//! Running out of time is not an error: it is reported as
//! [`Outcome::DeadlineExceeded`](crate::Outcome::DeadlineExceeded). The
//! variants here are contract breaches by the caller or failures of the
//! runtime underneath the engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("buffer of length {len} does not match a {rows}x{cols} matrix")]
    DataLength { rows: usize, cols: usize, len: usize },

    #[error("matrix dimensions {rows}x{cols} overflow usize")]
    DimensionOverflow { rows: usize, cols: usize },

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
