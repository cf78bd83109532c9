//! Generic constructors for any [`MatrixMut`] container.
//!
//! Entries are written in row-major order, so sparse outputs are built by
//! appending.

use crate::scalar::Scalar;
use crate::traits::MatrixMut;
use num_traits::One;

/// `rows x cols` matrix with ones on the main diagonal.
pub fn eye<M: MatrixMut>(rows: usize, cols: usize) -> M {
    let mut m = M::zeros(rows, cols);
    for i in 0..rows.min(cols) {
        m.set(i, i, M::Value::one());
    }
    m
}

/// Square matrix with `v` on the main diagonal.
pub fn diag<M: MatrixMut>(v: &[M::Value]) -> M {
    let mut m = M::zeros(v.len(), v.len());
    for (i, &value) in v.iter().enumerate() {
        m.set(i, i, value);
    }
    m
}

/// Hilbert matrix `H_ij = 1 / (i + j + 1)`.
pub fn hilbert<M: MatrixMut>(d: usize) -> M {
    let mut m = M::zeros(d, d);
    for i in 0..d {
        for j in 0..d {
            m.set(i, j, M::Value::from_f64(1.0 / (i + j + 1) as f64));
        }
    }
    m
}

/// Exact inverse of [`hilbert`]:
/// `(-1)^(i+j) (i+j+1) C(d+i, d-j-1) C(d+j, d-i-1) C(i+j, i)^2`.
///
/// Entries are integers; they stay exact in `f64` up to `d = 12`.
pub fn inv_hilbert<M: MatrixMut>(d: usize) -> M {
    let mut m = M::zeros(d, d);
    for i in 0..d {
        for j in 0..d {
            let magnitude = (i + j + 1) as f64
                * binomial(d + i, d - j - 1)
                * binomial(d + j, d - i - 1)
                * binomial(i + j, i).powi(2);
            let value = if (i + j) % 2 == 0 {
                magnitude
            } else {
                -magnitude
            };
            m.set(i, j, M::Value::from_f64(value));
        }
    }
    m
}

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k)
        .fold(1.0, |acc: f64, i| acc * (n - i) as f64 / (i + 1) as f64)
        .round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DenseMatrix, SparseMatrix};
    use approx::assert_relative_eq;

    #[test]
    fn test_eye_rectangular() {
        let wide: SparseMatrix<f64> = eye(2, 4);
        assert_eq!(wide.dims(), (2, 4));
        assert_eq!(wide.nnz(), 2);
        assert_eq!(wide.at(1, 1), 1.0);

        let tall: DenseMatrix<f64> = eye(3, 2);
        assert_eq!(tall, DenseMatrix::from([[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]));
        assert_eq!(eye::<SparseMatrix<f64>>(3, 3), SparseMatrix::identity(3));
    }

    #[test]
    fn test_diag_skips_zeros_in_sparse() {
        let d: SparseMatrix<f64> = diag(&[2.0, 0.0, -1.0]);
        assert_eq!(d.dims(), (3, 3));
        assert_eq!(d.nnz(), 2);
        assert_eq!(d.diagonal(), vec![2.0, 0.0, -1.0]);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(6, 0), 1.0);
        assert_eq!(binomial(2, 3), 0.0);
    }

    #[test]
    fn test_hilbert_and_inverse() {
        let h: DenseMatrix<f64> = hilbert(3);
        assert_relative_eq!(h.at(1, 2), 0.25);
        let inv: DenseMatrix<f64> = inv_hilbert(3);
        assert_eq!(
            inv,
            DenseMatrix::from([[9.0, -36.0, 30.0], [-36.0, 192.0, -180.0], [30.0, -180.0, 180.0]])
        );

        let h: SparseMatrix<f64> = hilbert(5);
        let inv: SparseMatrix<f64> = inv_hilbert(5);
        let product = DenseMatrix::from(&h.matmul(&inv).unwrap());
        for i in 0..5 {
            for j in 0..5 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product.at(i, j) - expected).abs() < 1e-8);
            }
        }
    }
}
