use log::{debug, trace};
use num_traits::Zero;
use numsim_core::{vector::residual_norm, Matrix, Result};

use super::{finish, nonzero_diagonal, IterationInfo, Jacobi, SolveAlgorithm, SolveResult};

impl<M: Matrix> SolveAlgorithm<M> for Jacobi {
    type Metadata = IterationInfo;

    fn solve(
        &self,
        a: &M,
        b: &[M::Value],
        x0: &[M::Value],
    ) -> Result<SolveResult<M::Value, Self::Metadata>> {
        self.validate_inputs(a, b, x0)?;
        let diag = nonzero_diagonal(a)?;
        let n = a.rows();
        debug!(
            "Jacobi: n = {}, tolerance = {:e}, max iterations = {}",
            n, self.tolerance, self.max_iterations
        );

        let mut x = x0.to_vec();
        let mut next = vec![M::Value::zero(); n];
        let mut res_norm = residual_norm(a, &x, b);
        let mut iterations = 0;

        while res_norm >= self.tolerance && iterations < self.max_iterations {
            for i in 0..n {
                let off_diagonal = a
                    .row_entries(i)
                    .filter(|&(j, _)| j != i)
                    .fold(M::Value::zero(), |acc, (j, v)| acc + v * x[j]);
                next[i] = (b[i] - off_diagonal) / diag[i];
            }
            std::mem::swap(&mut x, &mut next);
            iterations += 1;
            res_norm = residual_norm(a, &x, b);
            trace!("Jacobi iteration {}: residual norm {:e}", iterations, res_norm);
        }

        let metadata = finish("Jacobi", iterations, res_norm, self.tolerance);
        Ok(SolveResult { x, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use numsim_core::{DenseMatrix, NumSimError, SparseMatrix};

    #[test]
    fn test_jacobi_diagonally_dominant() {
        let a = SparseMatrix::from([[4.0f64, 1.0, 2.0], [1.0, 3.0, 2.0], [1.0, 1.0, 2.0]]);
        let result = Jacobi::with_params(1e-8, 1000)
            .solve(&a, &[12.0, 13.0, 9.0], &[0.0; 3])
            .unwrap();
        assert!(result.metadata.converged);
        for (xi, expected) in result.x.iter().zip([1.0, 2.0, 3.0]) {
            assert_relative_eq!(*xi, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_jacobi_reads_only_previous_iterate() {
        // One sweep from zero must equal b / diag exactly
        let a = DenseMatrix::from([[2.0f64, 1.0], [1.0, 4.0]]);
        let result = Jacobi::with_params(1e-12, 1)
            .solve(&a, &[2.0, 4.0], &[0.0, 0.0])
            .unwrap();
        assert_eq!(result.x, vec![1.0, 1.0]);
        assert_eq!(result.metadata.iterations, 1);
        assert!(!result.metadata.converged);
    }

    #[test]
    fn test_jacobi_initial_guess_already_solves() {
        let a = SparseMatrix::from([[2.0f64, 0.0], [0.0, 2.0]]);
        let result = Jacobi::new().solve(&a, &[2.0, 4.0], &[1.0, 2.0]).unwrap();
        assert_eq!(result.metadata.iterations, 0);
        assert!(result.metadata.converged);
    }

    #[test]
    fn test_jacobi_zero_diagonal() {
        let a = SparseMatrix::from([[0.0f64, 1.0], [1.0, 1.0]]);
        let err = Jacobi::new().solve(&a, &[1.0, 1.0], &[0.0, 0.0]).unwrap_err();
        assert_eq!(err, NumSimError::DivisionByZero { row: 0 });
    }
}
