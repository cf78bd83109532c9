//! # Numerical Core Library
//!
//! Provides the scalar abstraction, error type and matrix containers shared by
//! the linear solvers: a dense row-major [`DenseMatrix`] and a Compressed Row
//! Storage [`SparseMatrix`] with a cursor protocol for in-place editing.

// Declare modules
pub mod check;
pub mod construct;
pub mod dense_matrix;
pub mod error;
pub mod scalar;
pub mod sparse_matrix;
pub mod traits;
pub mod vector;

// Re-export public types
pub use dense_matrix::DenseMatrix;
pub use error::{NumSimError, Result};
pub use scalar::Scalar;
pub use sparse_matrix::{Cursor, SparseMatrix, SparseMatrixIter, Triplet};
pub use traits::{Matrix, MatrixMut};
