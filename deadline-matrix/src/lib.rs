//! Deadline-bounded parallel matrix transforms.
//!
//! `deadline-matrix` applies an element-wise function to a row-major `f64`
//! matrix in place, split across a fixed set of worker threads, and gives up
//! cooperatively once a wall-clock deadline has passed.
//!
//! # Model
//!
//! - **Partitioning**: rows are divided into one contiguous range per
//!   worker; the last range takes any remainder.
//! - **Deadline**: a one-shot timer sets a shared, monotonic cancellation
//!   flag when it elapses.
//! - **Workers**: each worker checks the flag before every row and never
//!   stops mid-row, so after a cancelled run each row is either fully
//!   transformed or untouched.
//! - **Outcome**: after all workers return, the timer is disarmed; if it had
//!   already fired the call reports [`Outcome::DeadlineExceeded`], otherwise
//!   [`Outcome::Success`]. Running late is an outcome, not an [`Error`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use deadline_matrix::{Matrix, Outcome};
//!
//! let mut m = Matrix::from_rows(vec![
//!     vec![1.0, 2.0],
//!     vec![3.0, 4.0],
//!     vec![5.0, 6.0],
//!     vec![7.0, 8.0],
//! ])?;
//!
//! let outcome = deadline_matrix::transform(&mut m, Duration::from_secs(10), |x| x * x + 1.0)?;
//!
//! assert_eq!(outcome, Outcome::Success);
//! assert_eq!(m.row(3), &[50.0, 65.0]);
//! # Ok::<(), deadline_matrix::Error>(())
//! ```

mod deadline;
mod engine;
mod error;
mod matrix;
mod partition;
mod placement;
mod worker;

pub use deadline::{CancellationSignal, Deadline};
pub use engine::{Engine, EngineConfig, Outcome, Report, transform};
pub use error::Error;
pub use matrix::Matrix;
pub use partition::{WorkRange, plan};
pub use placement::{Placement, Unpinned};
pub use worker::{WorkerStats, run as run_worker};
