use log::{debug, trace, warn};
use num_traits::{One, Zero};
use numsim_core::{vector::residual_norm, Matrix, Result, Scalar};

use super::{
    finish, nonzero_diagonal, validate_system, IterationInfo, SolveAlgorithm, SolveResult, Sor,
};

/// Runs SOR sweeps directly on `x`, which holds the initial guess on entry
/// and the last iterate on return.
///
/// Within a sweep, row `i` already sees the updated values of rows `< i`.
/// Convergence for SPD matrices requires `0 < weight < 2`; other weights are
/// accepted but logged.
pub fn sor_in_place<M: Matrix>(
    a: &M,
    b: &[M::Value],
    x: &mut [M::Value],
    weight: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<IterationInfo> {
    validate_system(a, b, x)?;
    let diag = nonzero_diagonal(a)?;
    if !(weight > 0.0 && weight < 2.0) {
        warn!("SOR weight {} is outside (0, 2); the iteration may diverge.", weight);
    }
    debug!(
        "SOR: n = {}, weight = {}, tolerance = {:e}, max iterations = {}",
        a.rows(),
        weight,
        tolerance,
        max_iterations
    );

    let omega = M::Value::from_f64(weight);
    let keep = M::Value::one() - omega;
    let mut res_norm = residual_norm(a, x, b);
    let mut iterations = 0;

    while res_norm >= tolerance && iterations < max_iterations {
        for i in 0..a.rows() {
            let off_diagonal = a
                .row_entries(i)
                .filter(|&(j, _)| j != i)
                .fold(M::Value::zero(), |acc, (j, v)| acc + v * x[j]);
            let gauss_seidel = (b[i] - off_diagonal) / diag[i];
            x[i] = keep * x[i] + omega * gauss_seidel;
        }
        iterations += 1;
        res_norm = residual_norm(a, x, b);
        trace!("SOR iteration {}: residual norm {:e}", iterations, res_norm);
    }

    Ok(finish("SOR", iterations, res_norm, tolerance))
}

impl<M: Matrix> SolveAlgorithm<M> for Sor {
    type Metadata = IterationInfo;

    fn solve(
        &self,
        a: &M,
        b: &[M::Value],
        x0: &[M::Value],
    ) -> Result<SolveResult<M::Value, Self::Metadata>> {
        self.validate_inputs(a, b, x0)?;
        let mut x = x0.to_vec();
        let metadata = sor_in_place(
            a,
            b,
            &mut x,
            self.weight,
            self.tolerance,
            self.max_iterations,
        )?;
        Ok(SolveResult { x, metadata })
    }
}
