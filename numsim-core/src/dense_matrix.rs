use crate::error::{NumSimError, Result};
use crate::scalar::Scalar;
use crate::traits::{Matrix, MatrixMut};
use serde::{Deserialize, Serialize};

/// Represents a dense matrix stored in row-major order on the CPU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "DenseParts<T>",
    bound(deserialize = "T: Scalar + Deserialize<'de>")
)]
pub struct DenseMatrix<T: Scalar> {
    rows: usize,
    cols: usize,
    data: Vec<T>, // Data stored row-major: data[row * cols + col]
}

/// Unvalidated wire form; deserialization goes through [`DenseMatrix::new`].
#[derive(Deserialize)]
struct DenseParts<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Scalar> TryFrom<DenseParts<T>> for DenseMatrix<T> {
    type Error = NumSimError;

    fn try_from(parts: DenseParts<T>) -> Result<Self> {
        DenseMatrix::new(parts.rows, parts.cols, parts.data)
    }
}

impl<T: Scalar> DenseMatrix<T> {
    /// Creates a new DenseMatrix from raw data, dimensions, assuming row-major order.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(NumSimError::InvalidDimensions(format!(
                "Data length ({}) does not match dimensions ({}x{})",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a new DenseMatrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    /// Square identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = T::one();
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns a slice view of the underlying data vector.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns a mutable slice view of the underlying data vector.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Gets the element at the specified row and column (immutable).
    /// Returns None if indices are out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Gets the element at the specified row and column (mutable).
    /// Returns None if indices are out of bounds.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        if row < self.rows && col < self.cols {
            self.data.get_mut(row * self.cols + col)
        } else {
            None
        }
    }

    /// # Panics
    /// If the position is out of bounds.
    pub fn at(&self, row: usize, col: usize) -> T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        self.data[row * self.cols + col]
    }

    /// # Panics
    /// If the position is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        self.data[row * self.cols + col] = value;
    }

    /// Slice of one row.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Matrix-matrix product `self * right`.
    pub fn matmul(&self, right: &DenseMatrix<T>) -> Result<Self> {
        if self.cols != right.rows {
            return Err(NumSimError::MatrixMulMismatch {
                left_cols: self.cols,
                right_rows: right.rows,
            });
        }
        let mut out = Self::zeros(self.rows, right.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a.is_zero() {
                    continue;
                }
                for j in 0..right.cols {
                    out.data[i * right.cols + j] += a * right.data[k * right.cols + j];
                }
            }
        }
        Ok(out)
    }

    /// Matrix-vector product `self * x`.
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>> {
        if x.len() != self.cols {
            return Err(NumSimError::VectorSizeMismatch {
                expected: self.cols,
                actual: x.len(),
            });
        }
        Ok((0..self.rows)
            .map(|i| {
                self.row(i)
                    .iter()
                    .zip(x)
                    .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
            })
            .collect())
    }
}

impl<T: Scalar, const R: usize, const C: usize> From<[[T; C]; R]> for DenseMatrix<T> {
    fn from(rows: [[T; C]; R]) -> Self {
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self {
            rows: R,
            cols: C,
            data,
        }
    }
}

// Implement the generic Matrix trait
impl<T: Scalar> Matrix for DenseMatrix<T> {
    type Value = T;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn at(&self, row: usize, col: usize) -> T {
        DenseMatrix::at(self, row, col)
    }

    fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        self.row(row)
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| !v.is_zero())
    }
}

impl<T: Scalar> MatrixMut for DenseMatrix<T> {
    fn zeros(rows: usize, cols: usize) -> Self {
        DenseMatrix::zeros(rows, cols)
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        DenseMatrix::set(self, row, col, value)
    }
}

#[cfg(test)]
mod tests {
    use super::DenseMatrix;
    use crate::{Matrix, NumSimError};

    #[test]
    fn test_dense_new_validates_length() {
        let err = DenseMatrix::new(2, 2, vec![1.0f64; 3]).unwrap_err();
        match err {
            NumSimError::InvalidDimensions(msg) => assert!(msg.contains("Data length (3)")),
            _ => panic!("Expected InvalidDimensions error"),
        }
    }

    #[test]
    fn test_dense_get_and_set() {
        let mut m = DenseMatrix::<f64>::zeros(2, 3);
        m.set(1, 2, 5.0);
        assert_eq!(m.get(1, 2), Some(&5.0));
        assert_eq!(m.get(2, 0), None);
        *m.get_mut(0, 0).unwrap() = 1.0;
        assert_eq!(m.at(0, 0), 1.0);
        assert_eq!(m.row_entries(1).collect::<Vec<_>>(), vec![(2, 5.0)]);
    }

    #[test]
    fn test_dense_mul() {
        let a = DenseMatrix::from([[3.0f32, 2.0, 1.0], [1.0, 0.0, 2.0]]);
        let b = DenseMatrix::from([[1.0f32, 2.0], [0.0, 1.0], [4.0, 0.0]]);
        assert_eq!(a.matmul(&b).unwrap(), DenseMatrix::from([[7.0, 8.0], [9.0, 2.0]]));
        assert!(matches!(
            a.matmul(&a),
            Err(NumSimError::MatrixMulMismatch { left_cols: 3, right_rows: 2 })
        ));
        assert_eq!(a.mul_vec(&[1.0, 1.0, 1.0]).unwrap(), vec![6.0, 3.0]);
    }

    #[test]
    fn test_dense_transpose_and_identity() {
        let a = DenseMatrix::from([[1.0f64, 2.0], [4.0, 5.0], [7.0, 8.0]]);
        assert_eq!(a.transpose(), DenseMatrix::from([[1.0, 4.0, 7.0], [2.0, 5.0, 8.0]]));
        let id = DenseMatrix::<f64>::identity(2);
        assert_eq!(id.matmul(&a.transpose()).unwrap(), a.transpose());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_dense_at_out_of_bounds_panics() {
        DenseMatrix::<f64>::zeros(2, 2).at(2, 0);
    }
}
