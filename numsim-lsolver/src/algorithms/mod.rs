use log::{info, warn};
use numsim_core::{Matrix, NumSimError, Result};
use serde::{Deserialize, Serialize};

/// Iteration cap used by every iterative solver unless overridden.
pub const DEFAULT_MAX_ITERATIONS: usize = 1024;
/// Residual-norm threshold used by every iterative solver unless overridden.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult<V, M> {
    pub x: Vec<V>,   // Solution vector
    pub metadata: M, // Metadata about the solve process
}

/// Outcome of an iterative solve.
///
/// Running out of iterations is not an error: `converged` is false and `x`
/// holds the last iterate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationInfo {
    /// Completed sweeps / Krylov steps.
    pub iterations: usize,
    /// `||b - A x||_2` for the returned iterate.
    pub residual_norm: f64,
    pub converged: bool,
}

// --- Algorithm Trait Definition ---
/// Trait representing a specific linear system solving algorithm.
/// Generic over the Matrix type (Sparse/Dense) it supports.
pub trait SolveAlgorithm<M: Matrix> {
    type Metadata: std::fmt::Debug;

    /// Solves the linear system Ax = b for x, starting from `x0`.
    ///
    /// # Arguments
    ///
    /// * `a` - The coefficient matrix A.
    /// * `b` - The right-hand side vector b.
    /// * `x0` - The initial guess; not modified.
    ///
    /// # Returns
    ///
    /// A `Result` containing the solution vector x or a `NumSimError`.
    fn solve(
        &self,
        a: &M,
        b: &[M::Value],
        x0: &[M::Value],
    ) -> Result<SolveResult<M::Value, Self::Metadata>>;

    /// Dimension checks shared by all solvers, run before any work.
    fn validate_inputs(&self, a: &M, b: &[M::Value], x0: &[M::Value]) -> Result<()> {
        validate_system(a, b, x0)
    }
}

pub(crate) fn validate_system<M: Matrix>(a: &M, b: &[M::Value], x: &[M::Value]) -> Result<()> {
    let (rows, cols) = a.dims();
    if rows != cols {
        return Err(NumSimError::MatrixSizeMismatch {
            expected: (rows, rows),
            actual: (rows, cols),
        });
    }
    for len in [b.len(), x.len()] {
        if len != rows {
            return Err(NumSimError::VectorSizeMismatch {
                expected: rows,
                actual: len,
            });
        }
    }
    Ok(())
}

/// Diagonal of `a`, failing on the first zero entry.
pub(crate) fn nonzero_diagonal<M: Matrix>(a: &M) -> Result<Vec<M::Value>> {
    (0..a.rows())
        .map(|row| {
            let d = a.at(row, row);
            if num_traits::Zero::is_zero(&d) {
                Err(NumSimError::DivisionByZero { row })
            } else {
                Ok(d)
            }
        })
        .collect()
}

/// Logs the final state of an iterative solve and packs it into [`IterationInfo`].
pub(crate) fn finish(
    name: &str,
    iterations: usize,
    residual_norm: f64,
    tolerance: f64,
) -> IterationInfo {
    let converged = residual_norm < tolerance;
    if converged {
        info!(
            "{} converged in {} iterations (residual norm {:e}).",
            name, iterations, residual_norm
        );
    } else {
        warn!(
            "{} did not converge within {} iterations (residual norm {:e}, tolerance {:e}).",
            name, iterations, residual_norm, tolerance
        );
    }
    IterationInfo {
        iterations,
        residual_norm,
        converged,
    }
}

// --- Algorithm Implementations ---

// Declare the modules for specific algorithm implementations
pub mod cg; // (Preconditioned) Conjugate Gradient
pub mod jacobi;
pub mod sor; // Successive Over-Relaxation / Gauss-Seidel

pub use sor::sor_in_place;

// --- Algorithm Struct Definitions ---
// Define structs that represent specific algorithms and hold their parameters.

/// Jacobi iteration: every update reads only the previous full iterate.
#[derive(Debug, Clone)]
pub struct Jacobi {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for Jacobi {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Jacobi {
    /// Creates a new instance of the Jacobi algorithm with default parameters.
    pub fn new() -> Self {
        Self::default()
    }
    /// Creates a new instance of the Jacobi algorithm with specified parameters.
    pub fn with_params(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }
}

/// Successive Over-Relaxation. `weight == 1` is Gauss-Seidel.
#[derive(Debug, Clone)]
pub struct Sor {
    pub weight: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for Sor {
    fn default() -> Self {
        Self {
            weight: 1.0,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Sor {
    /// Creates a new instance of the SOR algorithm with default parameters (Gauss-Seidel).
    pub fn new() -> Self {
        Self::default()
    }
    /// Creates a new instance of the SOR algorithm with specified parameters.
    pub fn with_params(weight: f64, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            weight,
            tolerance,
            max_iterations,
        }
    }
    pub fn gauss_seidel() -> Self {
        Self::default()
    }
}

/// Conjugate Gradient Algorithm. `A` must be Hermitian positive definite.
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Verify symmetry and a positive diagonal before iterating.
    pub check_input: bool,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            check_input: cfg!(debug_assertions),
        }
    }
}

impl ConjugateGradient {
    /// Creates a new instance of the Conjugate Gradient algorithm with default parameters.
    pub fn new() -> Self {
        Self::default()
    }
    /// Creates a new instance of the Conjugate Gradient algorithm with specified parameters.
    pub fn with_params(tolerance: f64, max_iterations: usize, check_input: bool) -> Self {
        Self {
            tolerance,
            max_iterations,
            check_input,
        }
    }
}

/// Conjugate Gradient applying `preconditioner` (an approximation of
/// `A^-1`) to the residual every iteration.
#[derive(Debug, Clone)]
pub struct PreconditionedConjugateGradient<P> {
    pub preconditioner: P,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl<P> PreconditionedConjugateGradient<P> {
    /// Creates a new PCG instance around `preconditioner` with default parameters.
    pub fn new(preconditioner: P) -> Self {
        Self::with_params(preconditioner, DEFAULT_TOLERANCE, DEFAULT_MAX_ITERATIONS)
    }
    /// Creates a new PCG instance with specified parameters.
    pub fn with_params(preconditioner: P, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            preconditioner,
            tolerance,
            max_iterations,
        }
    }
}
