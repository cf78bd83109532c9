//! Spectral norm and 2-norm condition number.
//!
//! Singular values come from the Gram matrix `G` (`A^* A` or `A A^*`,
//! whichever is smaller). The largest is found by power iteration on `G`,
//! the smallest by inverse iteration through a pivoted LU of `G`. Forming
//! `G` squares the condition number, so results lose accuracy once
//! `cond(A)` approaches `1 / sqrt(epsilon)`.

use log::debug;
use num_traits::Zero;
use numsim_core::{
    vector::{dot, norm, scale},
    DenseMatrix, Matrix, NumSimError, Result, Scalar,
};

use crate::factorization::doolittle;

/// Upper bound on power-iteration steps.
const POWER_MAX_ITERATIONS: usize = 10_000;
/// Relative change of the Rayleigh quotient that stops the power iteration.
const POWER_TOLERANCE: f64 = 1e-12;

/// Largest singular value `sigma_max(A) = ||A||_2`.
pub fn max_norm2<M: Matrix>(a: &M) -> Result<f64> {
    let g = gram(a)?;
    let lambda = dominant_eigenvalue(g.rows(), |v| g.mul_vec(v))?;
    Ok(lambda.max(0.0).sqrt())
}

/// Smallest singular value `sigma_min(A)`; `0` when `A` is rank deficient.
pub fn min_norm2<M: Matrix>(a: &M) -> Result<f64> {
    let g = gram(a)?;
    let lu = match doolittle(&g) {
        Ok(lu) => lu,
        Err(NumSimError::SingularMatrix { column }) => {
            debug!("min_norm2: Gram matrix singular at column {}", column);
            return Ok(0.0);
        }
        Err(e) => return Err(e),
    };
    let inverse_lambda = dominant_eigenvalue(g.rows(), |v| lu.solve(v))?;
    if inverse_lambda <= 0.0 {
        return Ok(0.0);
    }
    Ok((1.0 / inverse_lambda).sqrt())
}

/// 2-norm condition number `sigma_max / sigma_min`; infinite for rank
/// deficient matrices.
pub fn cond<M: Matrix>(a: &M) -> Result<f64> {
    let min = min_norm2(a)?;
    if min == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(max_norm2(a)? / min)
}

/// `A^* A` when `A` is tall or square, `A A^*` when it is wide.
fn gram<M: Matrix>(a: &M) -> Result<DenseMatrix<M::Value>> {
    let (rows, cols) = a.dims();
    if rows == 0 || cols == 0 {
        return Err(NumSimError::InvalidDimensions(format!(
            "Spectral norms need a non-empty matrix, got {}x{}",
            rows, cols
        )));
    }
    let mut data = vec![M::Value::zero(); rows.min(cols).pow(2)];
    if rows >= cols {
        // G_jk = sum_i conj(a_ij) a_ik
        for i in 0..rows {
            let entries: Vec<_> = a.row_entries(i).collect();
            for &(j, v) in &entries {
                for &(k, w) in &entries {
                    data[j * cols + k] += v.conj() * w;
                }
            }
        }
    } else {
        // G_ik = sum_j a_ij conj(a_kj)
        let mut row_i = vec![M::Value::zero(); cols];
        for i in 0..rows {
            row_i.fill(M::Value::zero());
            for (j, v) in a.row_entries(i) {
                row_i[j] = v;
            }
            for k in 0..rows {
                data[i * rows + k] = a
                    .row_entries(k)
                    .fold(M::Value::zero(), |acc, (j, w)| acc + row_i[j] * w.conj());
            }
        }
    }
    let n = rows.min(cols);
    DenseMatrix::new(n, n, data)
}

/// Dominant eigenvalue of a Hermitian positive semidefinite operator.
fn dominant_eigenvalue<T, F>(n: usize, mut apply: F) -> Result<f64>
where
    T: Scalar,
    F: FnMut(&[T]) -> Result<Vec<T>>,
{
    // Deterministic start vector with no zero components
    let mut v: Vec<T> = (0..n)
        .map(|i| T::from_f64(((i * 7 + 13) % 100) as f64 / 100.0 + 0.01))
        .collect();
    let start_norm = norm(&v);
    scale(T::from_f64(1.0 / start_norm), &mut v);

    let mut lambda = 0.0;
    for iteration in 1..=POWER_MAX_ITERATIONS {
        let mut w = apply(&v)?;
        let next: f64 = dot(&v, &w).real().into();
        let w_norm = norm(&w);
        if w_norm == 0.0 {
            return Ok(0.0);
        }
        scale(T::from_f64(1.0 / w_norm), &mut w);
        v = w;
        let change = (next - lambda).abs();
        lambda = next;
        if change <= POWER_TOLERANCE * lambda.abs() {
            debug!(
                "Power iteration converged after {} steps: lambda = {:e}",
                iteration, lambda
            );
            return Ok(lambda);
        }
    }
    debug!(
        "Power iteration stopped at {} steps: lambda = {:e}",
        POWER_MAX_ITERATIONS, lambda
    );
    Ok(lambda)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use numsim_core::{
        construct::{diag, hilbert},
        SparseMatrix,
    };

    #[test]
    fn test_diagonal_singular_values() {
        let a: SparseMatrix<f64> = diag(&[3.0, -1.0, 2.0]);
        assert_relative_eq!(max_norm2(&a).unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(min_norm2(&a).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(cond(&a).unwrap(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rectangular_uses_smaller_gram() {
        let tall = DenseMatrix::from([[2.0, 0.0], [0.0, 1.0], [0.0, 0.0]]);
        assert_relative_eq!(max_norm2(&tall).unwrap(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(min_norm2(&tall).unwrap(), 1.0, epsilon = 1e-9);

        let wide = SparseMatrix::from(&tall).transpose();
        assert_eq!(wide.dims(), (2, 3));
        assert_relative_eq!(cond(&wide).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hilbert_condition_number() {
        let h3: DenseMatrix<f64> = hilbert(3);
        assert_relative_eq!(max_norm2(&h3).unwrap(), 1.408_318_927_123_654, max_relative = 1e-9);
        assert_relative_eq!(cond(&h3).unwrap(), 524.056_777_586_064_4, max_relative = 1e-6);

        let h4: SparseMatrix<f64> = hilbert(4);
        assert_relative_eq!(cond(&h4).unwrap(), 15_513.738_738_929, max_relative = 1e-6);
    }

    #[test]
    fn test_singular_is_infinitely_conditioned() {
        let a = SparseMatrix::from([[1.0, 2.0], [2.0, 4.0]]);
        assert_eq!(min_norm2(&a).unwrap(), 0.0);
        assert_eq!(cond(&a).unwrap(), f64::INFINITY);
        assert_relative_eq!(max_norm2(&a).unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unitary_has_unit_condition() {
        let i = Complex64::new(0.0, 1.0);
        let zero = Complex64::new(0.0, 0.0);
        let a = SparseMatrix::from([[zero, i], [i, zero]]);
        assert_relative_eq!(max_norm2(&a).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(cond(&a).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let err = max_norm2(&SparseMatrix::<f64>::new(0, 3)).unwrap_err();
        assert!(matches!(err, NumSimError::InvalidDimensions(_)));
    }
}
