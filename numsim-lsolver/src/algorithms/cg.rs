use log::{debug, info, trace};
use num_traits::Zero;
use numsim_core::{
    check::check_symmetry_and_positive_diagonal,
    vector::{axpy, dot, mat_vec, norm, residual},
    Matrix, NumSimError, Result, Scalar,
};

use super::{
    finish, ConjugateGradient, IterationInfo, PreconditionedConjugateGradient, SolveAlgorithm,
    SolveResult,
};
use crate::preconditioner::{IdentityPreconditioner, Preconditioner};

impl<M: Matrix> SolveAlgorithm<M> for ConjugateGradient {
    type Metadata = IterationInfo;

    fn solve(
        &self,
        a: &M,
        b: &[M::Value],
        x0: &[M::Value],
    ) -> Result<SolveResult<M::Value, Self::Metadata>> {
        self.validate_inputs(a, b, x0)?;
        if self.check_input {
            check_symmetry_and_positive_diagonal(a)?;
        }
        solve_pcg(
            "CG",
            a,
            b,
            x0,
            &IdentityPreconditioner,
            self.tolerance,
            self.max_iterations,
        )
    }
}

impl<M, P> SolveAlgorithm<M> for PreconditionedConjugateGradient<P>
where
    M: Matrix,
    P: Preconditioner<M::Value>,
{
    type Metadata = IterationInfo;

    fn solve(
        &self,
        a: &M,
        b: &[M::Value],
        x0: &[M::Value],
    ) -> Result<SolveResult<M::Value, Self::Metadata>> {
        self.validate_inputs(a, b, x0)?;
        if let Some(dim) = self.preconditioner.dim() {
            if dim != a.rows() {
                return Err(NumSimError::MatrixSizeMismatch {
                    expected: a.dims(),
                    actual: (dim, dim),
                });
            }
        }
        solve_pcg(
            "PCG",
            a,
            b,
            x0,
            &self.preconditioner,
            self.tolerance,
            self.max_iterations,
        )
    }
}

/// Preconditioned CG; plain CG is the identity preconditioner.
/// Stops when `||r||_2 < tolerance`.
fn solve_pcg<M, P>(
    name: &str,
    a: &M,
    b: &[M::Value],
    x0: &[M::Value],
    preconditioner: &P,
    tolerance: f64,
    max_iterations: usize,
) -> Result<SolveResult<M::Value, IterationInfo>>
where
    M: Matrix,
    P: Preconditioner<M::Value> + ?Sized,
{
    let n = a.rows();
    debug!(
        "{}: n = {}, tolerance = {:e}, max iterations = {}",
        name, n, tolerance, max_iterations
    );

    let mut x = x0.to_vec();
    let mut r = residual(a, &x, b);
    let mut res_norm = norm(&r);
    info!("{} initial residual norm: {:e}", name, res_norm);
    if res_norm < tolerance {
        info!("Initial guess is already within tolerance.");
        let metadata = finish(name, 0, res_norm, tolerance);
        return Ok(SolveResult { x, metadata });
    }

    let mut z = vec![M::Value::zero(); n];
    preconditioner.apply(&r, &mut z)?;
    let mut p = z.clone();
    let mut rz_old = dot(&r, &z);
    let mut iterations = 0;

    while iterations < max_iterations {
        let ap = mat_vec(a, &p);
        let curvature = dot(&p, &ap);
        let c: f64 = curvature.real().into();
        if !(c > 0.0 && c.is_finite()) {
            return Err(NumSimError::NotPositiveDefinite { index: iterations });
        }
        let alpha = rz_old / curvature;
        axpy(alpha, &p, &mut x);
        axpy(-alpha, &ap, &mut r);
        iterations += 1;

        res_norm = norm(&r);
        trace!("{} iteration {}: residual norm {:e}", name, iterations, res_norm);
        if res_norm < tolerance {
            break;
        }

        preconditioner.apply(&r, &mut z)?;
        let rz_new = dot(&r, &z);
        let beta = rz_new / rz_old;
        for (pi, &zi) in p.iter_mut().zip(&z) {
            *pi = zi + beta * *pi;
        }
        rz_old = rz_new;
    }

    let metadata = finish(name, iterations, res_norm, tolerance);
    Ok(SolveResult { x, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factorization::{ilu0, inverse_lu};
    use crate::preconditioner::JacobiPreconditioner;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use numsim_core::{DenseMatrix, SparseMatrix};

    fn spd_2x2() -> SparseMatrix<f64> {
        SparseMatrix::from([[4.0, 1.0], [1.0, 3.0]])
    }

    #[test]
    fn test_cg_two_by_two() {
        let result = ConjugateGradient::with_params(1e-9, 1024, true)
            .solve(&spd_2x2(), &[1.0, 2.0], &[2.0, 1.0])
            .unwrap();
        assert!(result.metadata.converged);
        assert!(result.metadata.iterations <= 2);
        assert_relative_eq!(result.x[0], 1.0 / 11.0, epsilon = 1e-9);
        assert_relative_eq!(result.x[1], 7.0 / 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pcg_with_ilu_inverse() {
        let a = spd_2x2();
        let factors = ilu0(&a).unwrap();
        let c = inverse_lu(&factors.l, &factors.u).unwrap();
        let result = PreconditionedConjugateGradient::with_params(c, 1e-9, 1024)
            .solve(&a, &[1.0, 2.0], &[2.0, 1.0])
            .unwrap();
        assert!(result.metadata.converged);
        assert_relative_eq!(result.x[0], 1.0 / 11.0, epsilon = 1e-9);
        assert_relative_eq!(result.x[1], 7.0 / 11.0, epsilon = 1e-9);

        let by_solves = PreconditionedConjugateGradient::with_params(factors, 1e-9, 1024)
            .solve(&a, &[1.0, 2.0], &[2.0, 1.0])
            .unwrap();
        assert_eq!(by_solves.metadata.iterations, 1);
    }

    #[test]
    fn test_pcg_jacobi_on_dense() {
        let a = DenseMatrix::from([[4.0, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 4.0]]);
        let pre = JacobiPreconditioner::new(&a).unwrap();
        let result = PreconditionedConjugateGradient::with_params(pre, 1e-10, 50)
            .solve(&a, &[1.0, 2.0, 3.0], &[0.0; 3])
            .unwrap();
        assert!(result.metadata.converged);
        let expected = [13.0 / 28.0, 6.0 / 7.0, 27.0 / 28.0];
        for (xi, e) in result.x.iter().zip(expected) {
            assert_relative_eq!(*xi, e, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cg_indefinite_detected() {
        let a = SparseMatrix::from([[1.0f64, 0.0], [0.0, -1.0]]);
        let err = ConjugateGradient::with_params(1e-9, 10, false)
            .solve(&a, &[0.0, 1.0], &[0.0, 0.0])
            .unwrap_err();
        assert_eq!(err, NumSimError::NotPositiveDefinite { index: 0 });
    }

    #[test]
    fn test_cg_input_check() {
        let a = SparseMatrix::from([[4.0f64, 1.0], [0.0, 3.0]]);
        let err = ConjugateGradient::with_params(1e-9, 10, true)
            .solve(&a, &[1.0, 2.0], &[0.0, 0.0])
            .unwrap_err();
        assert_eq!(err, NumSimError::NonSymmetricMatrix);
    }

    #[test]
    fn test_pcg_preconditioner_dimension() {
        let pre = JacobiPreconditioner::new(&SparseMatrix::<f64>::identity(3)).unwrap();
        let err = PreconditionedConjugateGradient::new(pre)
            .solve(&spd_2x2(), &[1.0, 2.0], &[0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, NumSimError::MatrixSizeMismatch { .. }));
    }

    #[test]
    fn test_cg_iteration_limit_is_not_an_error() {
        let a = DenseMatrix::from([[4.0, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 4.0]]);
        let result = ConjugateGradient::with_params(1e-14, 1, false)
            .solve(&a, &[1.0, 2.0, 3.0], &[0.0; 3])
            .unwrap();
        assert_eq!(result.metadata.iterations, 1);
        assert!(!result.metadata.converged);
    }

    #[test]
    fn test_cg_hermitian() {
        let i = Complex64::new(0.0, 1.0);
        let a = SparseMatrix::from([
            [Complex64::new(4.0, 0.0), i],
            [-i, Complex64::new(3.0, 0.0)],
        ]);
        let x_true = [Complex64::new(1.0, 1.0), Complex64::new(0.0, -2.0)];
        let b = a.mul_vec(&x_true).unwrap();
        let result = ConjugateGradient::with_params(1e-12, 20, true)
            .solve(&a, &b, &[Complex64::new(0.0, 0.0); 2])
            .unwrap();
        assert!(result.metadata.converged);
        for (xi, e) in result.x.iter().zip(x_true) {
            assert_relative_eq!(xi.re, e.re, epsilon = 1e-9);
            assert_relative_eq!(xi.im, e.im, epsilon = 1e-9);
        }
    }
}
