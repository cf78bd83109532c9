use crate::scalar::Scalar;
use std::fmt::Debug;

/// Generic trait representing a matrix.
/// Implementations can be sparse or dense; solvers are written against this
/// trait so the same algorithm runs on either backing store.
pub trait Matrix: Debug {
    /// The underlying numeric type of the matrix elements (e.g., f64, Complex<f64>).
    type Value: Scalar;

    /// Returns the dimensions of the matrix as (rows, columns).
    fn dims(&self) -> (usize, usize);

    /// Returns the number of rows.
    fn rows(&self) -> usize {
        self.dims().0
    }

    /// Returns the number of columns.
    fn cols(&self) -> usize {
        self.dims().1
    }

    /// Checks if the matrix is square.
    fn is_square(&self) -> bool {
        let (rows, cols) = self.dims();
        rows == cols
    }

    /// Value at `(row, col)`; absent entries read as zero.
    ///
    /// # Panics
    /// If `row >= rows()` or `col >= cols()`.
    fn at(&self, row: usize, col: usize) -> Self::Value;

    /// Non-zero entries of `row` as `(column, value)` pairs in ascending
    /// column order.
    ///
    /// # Panics
    /// If `row >= rows()`.
    fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, Self::Value)> + '_;
}

/// A matrix that can be allocated and written element by element.
/// Factorizations producing dense or sparse outputs are generic over it.
pub trait MatrixMut: Matrix + Sized {
    /// Allocates an all-zero `rows x cols` matrix.
    fn zeros(rows: usize, cols: usize) -> Self;

    /// Writes `value` at `(row, col)`. Sparse implementations drop zeros.
    ///
    /// # Panics
    /// If `row >= rows()` or `col >= cols()`.
    fn set(&mut self, row: usize, col: usize, value: Self::Value);
}
