//! Structural predicates on matrices.
//!
//! Mirror comparisons (symmetric, Hermitian and their skew forms) are exact.
//! Only stored (non-zero) entries are visited, so the cost is
//! `O(nnz * lookup)` for sparse inputs.
//!
//! Product predicates (orthogonal, unitary, projection) form the product
//! row by row and accept entries within `sqrt(epsilon)` of the target.

use crate::error::{NumSimError, Result};
use crate::scalar::Scalar;
use crate::traits::Matrix;
use num_traits::{Float, One, Zero};

fn mirrored_entries_match<M: Matrix>(a: &M, relation: impl Fn(M::Value) -> M::Value) -> bool {
    if !a.is_square() {
        return false;
    }
    (0..a.rows()).all(|i| a.row_entries(i).all(|(j, v)| a.at(j, i) == relation(v)))
}

/// `A == A^T`.
pub fn is_symmetric<M: Matrix>(a: &M) -> bool {
    mirrored_entries_match(a, |v| v)
}

/// `A == A^*`. Same as [`is_symmetric`] for real scalars.
pub fn is_hermitian<M: Matrix>(a: &M) -> bool {
    mirrored_entries_match(a, Scalar::conj)
}

/// `A == -A^T`.
pub fn is_skew_symmetric<M: Matrix>(a: &M) -> bool {
    mirrored_entries_match(a, |v| -v)
}

/// `A == -A^*`. Same as [`is_skew_symmetric`] for real scalars.
pub fn is_skew_hermitian<M: Matrix>(a: &M) -> bool {
    mirrored_entries_match(a, |v| -v.conj())
}

fn close<T: Scalar>(x: T, y: T) -> bool {
    (x - y).modulus() <= T::Real::epsilon().sqrt()
}

fn dense_row<M: Matrix>(a: &M, row: usize) -> Vec<M::Value> {
    let mut out = vec![M::Value::zero(); a.cols()];
    for (j, v) in a.row_entries(row) {
        out[j] = v;
    }
    out
}

/// `A * op(A)^T == I` where `op` is applied to the second factor.
fn rows_orthonormal<M: Matrix>(a: &M, op: impl Fn(M::Value) -> M::Value) -> bool {
    if !a.is_square() {
        return false;
    }
    (0..a.rows()).all(|i| {
        let row_i = dense_row(a, i);
        (0..a.rows()).all(|k| {
            let product = a
                .row_entries(k)
                .fold(M::Value::zero(), |acc, (j, v)| acc + row_i[j] * op(v));
            let target = if i == k {
                M::Value::one()
            } else {
                M::Value::zero()
            };
            close(product, target)
        })
    })
}

/// `A * A^T == I`.
pub fn is_orthogonal<M: Matrix>(a: &M) -> bool {
    rows_orthonormal(a, |v| v)
}

/// `A * A^* == I`. Same as [`is_orthogonal`] for real scalars.
pub fn is_unitary<M: Matrix>(a: &M) -> bool {
    rows_orthonormal(a, |v| v.conj())
}

/// `A * A == A`.
pub fn is_projection<M: Matrix>(a: &M) -> bool {
    if !a.is_square() {
        return false;
    }
    let n = a.rows();
    let mut acc = vec![M::Value::zero(); n];
    (0..n).all(|i| {
        acc.fill(M::Value::zero());
        for (j, v) in a.row_entries(i) {
            for (k, w) in a.row_entries(j) {
                acc[k] += v * w;
            }
        }
        acc.iter().enumerate().all(|(k, &p)| close(p, a.at(i, k)))
    })
}

/// Necessary conditions for Hermitian positive definiteness: square,
/// Hermitian, and every diagonal entry has a strictly positive real part.
pub fn check_symmetry_and_positive_diagonal<M: Matrix>(a: &M) -> Result<()> {
    if !a.is_square() {
        return Err(NumSimError::MatrixSizeMismatch {
            expected: (a.rows(), a.rows()),
            actual: a.dims(),
        });
    }
    if !is_hermitian(a) {
        return Err(NumSimError::NonSymmetricMatrix);
    }
    for row in 0..a.rows() {
        let d = a.at(row, row).real();
        if d <= <M::Value as Scalar>::Real::zero() {
            return Err(NumSimError::NonPositiveDiagonal { row });
        }
    }
    Ok(())
}
