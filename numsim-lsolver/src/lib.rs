//! `numsim-lsolver`: linear equation solvers over dense and sparse matrices.
//!
//! This library provides tools to solve systems of linear equations of the form Ax = b,
//! using stationary iterations (Jacobi, SOR), Krylov methods (CG, PCG) and direct
//! factorizations (Cholesky, pivoted Doolittle LU, incomplete LU), plus spectral
//! norm and condition number estimates.

// Core modules
pub mod algorithms;
pub mod factorization;
pub mod preconditioner;
pub mod spectral;

// Re-export from numsim_core
pub use numsim_core::{
    DenseMatrix, Matrix, MatrixMut, NumSimError, Result, Scalar, SparseMatrix, Triplet,
};

pub use algorithms::{IterationInfo, SolveAlgorithm, SolveResult};
pub use factorization::{LuFactors, PivotedLu};
pub use preconditioner::Preconditioner;
pub use spectral::{cond, max_norm2, min_norm2};
