//! Row-major matrix storage.

use std::ops::{Index, IndexMut};

use crate::Error;

/// A dense `rows x cols` matrix of `f64` stored row by row.
///
/// Element `(i, j)` lives at `data[i * cols + j]`. The buffer length always
/// equals `rows * cols`; every constructor checks this.
///
/// # Example
///
/// ```
/// use deadline_matrix::Matrix;
///
/// let mut m = Matrix::new(2, 3)?;
/// m.set(1, 2, 4.5);
/// assert_eq!(m.get(1, 2), 4.5);
/// assert_eq!(m.row(1), &[0.0, 0.0, 4.5]);
/// # Ok::<(), deadline_matrix::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Allocates a zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Result<Self, Error> {
        let len = Self::checked_len(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; len],
        })
    }

    /// Wraps an existing row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, Error> {
        let len = Self::checked_len(rows, cols)?;
        if data.len() != len {
            return Err(Error::DataLength {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let n = rows.len();
        let cols = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(Self::checked_len(n, cols)?);
        for row in rows {
            if row.len() != cols {
                return Err(Error::DataLength {
                    rows: n,
                    cols,
                    len: data.len() + row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n,
            cols,
            data,
        })
    }

    fn checked_len(rows: usize, cols: usize) -> Result<usize, Error> {
        rows.checked_mul(cols)
            .ok_or(Error::DimensionOverflow { rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the element at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds. See [`Matrix::try_get`].
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self[(i, j)]
    }

    /// Overwrites the element at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds. See [`Matrix::try_set`].
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self[(i, j)] = value;
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<f64, Error> {
        self.offset(i, j).map(|idx| self.data[idx])
    }

    pub fn try_set(&mut self, i: usize, j: usize, value: f64) -> Result<(), Error> {
        let idx = self.offset(i, j)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Returns row `i` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.rows, "row {i} out of bounds for {} rows", self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Returns row `i` as a mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        assert!(i < self.rows, "row {i} out of bounds for {} rows", self.rows);
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    fn offset(&self, i: usize, j: usize) -> Result<usize, Error> {
        if i >= self.rows || j >= self.cols {
            return Err(Error::IndexOutOfBounds {
                row: i,
                col: j,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(i * self.cols + j)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        match self.offset(i, j) {
            Ok(idx) => &self.data[idx],
            Err(e) => panic!("{e}"),
        }
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        match self.offset(i, j) {
            Ok(idx) => &mut self.data[idx],
            Err(e) => panic!("{e}"),
        }
    }
}
