//! Preconditioners for [`PreconditionedConjugateGradient`](crate::algorithms::PreconditionedConjugateGradient).

use num_traits::Zero;
use numsim_core::{DenseMatrix, Matrix, NumSimError, Result, Scalar, SparseMatrix};

use crate::algorithms::nonzero_diagonal;
use crate::factorization::LuFactors;

/// Approximates `A^-1`: [`apply`](Preconditioner::apply) writes `z ≈ A^-1 r`.
pub trait Preconditioner<T: Scalar> {
    /// Side length this preconditioner accepts; `None` for any.
    fn dim(&self) -> Option<usize>;

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()>;
}

/// `z = r`. Turns PCG into plain CG.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl<T: Scalar> Preconditioner<T> for IdentityPreconditioner {
    fn dim(&self) -> Option<usize> {
        None
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()> {
        z.copy_from_slice(r);
        Ok(())
    }
}

/// Inverse diagonal of `A`.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobiPreconditioner<T> {
    inv_diag: Vec<T>,
}

impl<T: Scalar> JacobiPreconditioner<T> {
    pub fn new<M: Matrix<Value = T>>(a: &M) -> Result<Self> {
        let inv_diag = nonzero_diagonal(a)?
            .into_iter()
            .map(|d| T::one() / d)
            .collect();
        Ok(Self { inv_diag })
    }
}

impl<T: Scalar> Preconditioner<T> for JacobiPreconditioner<T> {
    fn dim(&self) -> Option<usize> {
        Some(self.inv_diag.len())
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()> {
        for ((zi, &ri), &d) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * d;
        }
        Ok(())
    }
}

fn explicit_product<M: Matrix>(c: &M, r: &[M::Value], z: &mut [M::Value]) -> Result<()> {
    for (expected, actual) in [(c.cols(), r.len()), (c.rows(), z.len())] {
        if expected != actual {
            return Err(NumSimError::VectorSizeMismatch { expected, actual });
        }
    }
    for (i, zi) in z.iter_mut().enumerate() {
        *zi = c
            .row_entries(i)
            .fold(M::Value::zero(), |acc, (j, v)| acc + v * r[j]);
    }
    Ok(())
}

/// An explicit approximate inverse `C`, e.g. from [`inverse_lu`](crate::factorization::inverse_lu).
impl<T: Scalar> Preconditioner<T> for SparseMatrix<T> {
    fn dim(&self) -> Option<usize> {
        Some(self.rows())
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()> {
        explicit_product(self, r, z)
    }
}

impl<T: Scalar> Preconditioner<T> for DenseMatrix<T> {
    fn dim(&self) -> Option<usize> {
        Some(self.rows())
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()> {
        explicit_product(self, r, z)
    }
}

/// Applies `(L U)^-1` by triangular solves, e.g. on [`ilu0`](crate::factorization::ilu0) factors.
impl<M: Matrix> Preconditioner<M::Value> for LuFactors<M> {
    fn dim(&self) -> Option<usize> {
        Some(self.l.rows())
    }

    fn apply(&self, r: &[M::Value], z: &mut [M::Value]) -> Result<()> {
        let solved = self.solve(r)?;
        z.copy_from_slice(&solved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factorization::ilu0;

    #[test]
    fn test_jacobi_preconditioner() {
        let a = SparseMatrix::from([[4.0f64, 1.0], [1.0, 2.0]]);
        let pre = JacobiPreconditioner::new(&a).unwrap();
        let mut z = [0.0; 2];
        pre.apply(&[2.0, 2.0], &mut z).unwrap();
        assert_eq!(z, [0.5, 1.0]);
        assert_eq!(Preconditioner::<f64>::dim(&pre), Some(2));
    }

    #[test]
    fn test_identity_and_explicit() {
        let mut z = [0.0; 2];
        IdentityPreconditioner.apply(&[3.0f64, 4.0], &mut z).unwrap();
        assert_eq!(z, [3.0, 4.0]);

        let c = DenseMatrix::from([[1.0f64, 1.0], [0.0, 2.0]]);
        c.apply(&[1.0, 2.0], &mut z).unwrap();
        assert_eq!(z, [3.0, 4.0]);
        assert!(c.apply(&[1.0], &mut z).is_err());
    }

    #[test]
    fn test_lu_factors_apply_inverts_a() {
        let a = SparseMatrix::from([[4.0f64, 1.0], [1.0, 3.0]]);
        let factors = ilu0(&a).unwrap();
        let mut z = [0.0; 2];
        factors.apply(&[5.0, 4.0], &mut z).unwrap();
        assert_eq!(z, [1.0, 1.0]);
    }
}
