use thiserror::Error;

pub type Result<T> = core::result::Result<T, NumSimError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumSimError {
    #[error("Invalid matrix dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Vector size mismatch: expected {expected}, got {actual}")]
    VectorSizeMismatch { expected: usize, actual: usize },

    #[error("Matrix size mismatch: expected {expected:?}, got {actual:?}")]
    MatrixSizeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Matrix multiplication mismatch: left has {left_cols} columns, right has {right_rows} rows")]
    MatrixMulMismatch { left_cols: usize, right_rows: usize },

    #[error("Division by zero at row {row}")]
    DivisionByZero { row: usize },

    #[error("Matrix is not positive definite (detected at index {index})")]
    NotPositiveDefinite { index: usize },

    #[error("Matrix is singular (no pivot in column {column})")]
    SingularMatrix { column: usize },

    #[error("Matrix has a zero in its diagonal at row {row}")]
    MatrixHasZeroInDiag { row: usize },

    #[error("Matrix is not symmetric")]
    NonSymmetricMatrix,

    #[error("Matrix has a non-positive diagonal element at row {row}")]
    NonPositiveDiagonal { row: usize },
}

impl NumSimError {
    /// True for dimension-contract violations (caller bugs), false for
    /// numerical outcomes such as a singular or indefinite matrix that a
    /// caller may legitimately recover from by picking another solver.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            NumSimError::InvalidDimensions(_)
                | NumSimError::VectorSizeMismatch { .. }
                | NumSimError::MatrixSizeMismatch { .. }
                | NumSimError::MatrixMulMismatch { .. }
        )
    }
}
