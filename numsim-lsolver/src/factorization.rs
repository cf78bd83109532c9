//! Direct and incomplete factorizations.
//!
//! * [`ilu0`]: incomplete LU restricted to the sparsity pattern of `A`.
//! * [`cholesky`]: `A = L L^*` for Hermitian positive definite `A`.
//! * [`doolittle`]: `P A = L U` with partial pivoting.
//! * [`solve_lu`], [`inverse_lu`], [`determinant`] build on the factors.

use log::{debug, trace};
use num_traits::{Float, One, Zero};
use numsim_core::{Matrix, MatrixMut, NumSimError, Result, Scalar, SparseMatrix, Triplet};

/// Lower/upper factor pair with `A ≈ L U`. `L` carries an explicit unit diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct LuFactors<M> {
    pub l: M,
    pub u: M,
}

impl<M: Matrix> LuFactors<M> {
    /// Solves `L U x = c`.
    pub fn solve(&self, c: &[M::Value]) -> Result<Vec<M::Value>> {
        solve_lu(&self.l, &self.u, c)
    }
}

/// Result of [`doolittle`]: `P A = L U`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotedLu<M> {
    pub l: M,
    pub u: M,
    /// Permutation matrix with `p[k][perm[k]] = 1`.
    pub p: M,
    /// Row `k` of `P A` is row `perm[k]` of `A`.
    pub perm: Vec<usize>,
    /// Number of row swaps performed.
    pub pivot_count: usize,
}

impl<M: Matrix> PivotedLu<M> {
    /// Solves `A x = b` by permuting `b` and running [`solve_lu`].
    pub fn solve(&self, b: &[M::Value]) -> Result<Vec<M::Value>> {
        if b.len() != self.perm.len() {
            return Err(NumSimError::VectorSizeMismatch {
                expected: self.perm.len(),
                actual: b.len(),
            });
        }
        let c: Vec<M::Value> = self.perm.iter().map(|&k| b[k]).collect();
        solve_lu(&self.l, &self.u, &c)
    }

    /// `det(A) = (-1)^pivot_count * prod(U_ii)`.
    pub fn determinant(&self) -> M::Value {
        let product = (0..self.u.rows()).fold(M::Value::one(), |acc, i| acc * self.u.at(i, i));
        if self.pivot_count % 2 == 0 {
            product
        } else {
            -product
        }
    }
}

fn require_square<M: Matrix>(a: &M) -> Result<usize> {
    let (rows, cols) = a.dims();
    if rows != cols {
        return Err(NumSimError::MatrixSizeMismatch {
            expected: (rows, rows),
            actual: (rows, cols),
        });
    }
    Ok(rows)
}

/// Incomplete LU factorization with zero fill-in.
///
/// Every stored entry of `L` and `U` sits on a position stored in `a`;
/// the unit diagonal of `L` is the only addition. Fails with
/// `MatrixHasZeroInDiag` when a pivot is (or becomes) zero, including a
/// diagonal missing from the pattern.
pub fn ilu0<T: Scalar>(a: &SparseMatrix<T>) -> Result<LuFactors<SparseMatrix<T>>> {
    let n = require_square(a)?;
    let row_ptr = a.row_ptr();
    let cols = a.col_indices();
    let mut vals = a.values().to_vec();
    debug!("ILU(0): n = {}, nnz = {}", n, a.nnz());

    let mut diag_pos = Vec::with_capacity(n);
    for row in 0..n {
        match cols[row_ptr[row]..row_ptr[row + 1]].binary_search(&row) {
            Ok(k) => diag_pos.push(row_ptr[row] + k),
            Err(_) => return Err(NumSimError::MatrixHasZeroInDiag { row }),
        }
    }

    // marker[col] = offset of (i, col) while row i is being eliminated
    let mut marker = vec![usize::MAX; n];
    for i in 0..n {
        let row = row_ptr[i]..row_ptr[i + 1];
        for p in row.clone() {
            marker[cols[p]] = p;
        }
        for p in row.clone() {
            let k = cols[p];
            if k >= i {
                break;
            }
            let pivot = vals[diag_pos[k]];
            if pivot.is_zero() {
                return Err(NumSimError::MatrixHasZeroInDiag { row: k });
            }
            vals[p] /= pivot;
            let factor = vals[p];
            for q in diag_pos[k] + 1..row_ptr[k + 1] {
                let target = marker[cols[q]];
                if target != usize::MAX {
                    let delta = factor * vals[q];
                    vals[target] -= delta;
                }
            }
        }
        for p in row {
            marker[cols[p]] = usize::MAX;
        }
        if vals[diag_pos[i]].is_zero() {
            return Err(NumSimError::MatrixHasZeroInDiag { row: i });
        }
        trace!("ILU(0): row {} eliminated", i);
    }

    let lower_nnz: usize = diag_pos
        .iter()
        .enumerate()
        .map(|(i, &d)| d - row_ptr[i] + 1)
        .sum();
    let mut lower = Vec::with_capacity(lower_nnz);
    let mut upper = Vec::with_capacity(vals.len());
    for i in 0..n {
        lower.push(Triplet::new(i, i, T::one()));
        for p in row_ptr[i]..row_ptr[i + 1] {
            let entry = Triplet::new(i, cols[p], vals[p]);
            if cols[p] < i {
                lower.push(entry);
            } else {
                upper.push(entry);
            }
        }
    }
    Ok(LuFactors {
        l: SparseMatrix::from_triplets(n, n, lower)?,
        u: SparseMatrix::from_triplets(n, n, upper)?,
    })
}

/// Cholesky factor `L` (lower triangular, real positive diagonal) with
/// `A = L L^*`. Only the lower triangle of `a` is read.
pub fn cholesky<M: MatrixMut>(a: &M) -> Result<M> {
    let n = require_square(a)?;
    debug!("Cholesky: n = {}", n);
    let mut l = M::zeros(n, n);
    for j in 0..n {
        let mut radicand = a.at(j, j);
        for k in 0..j {
            let ljk = l.at(j, k);
            radicand -= ljk * ljk.conj();
        }
        let real = radicand.real();
        // Also rejects NaN
        if !(real > <M::Value as Scalar>::Real::zero()) {
            return Err(NumSimError::NotPositiveDefinite { index: j });
        }
        let ljj = M::Value::from_real(Float::sqrt(real));
        l.set(j, j, ljj);
        for i in j + 1..n {
            let mut sum = a.at(i, j);
            for k in 0..j {
                sum -= l.at(i, k) * l.at(j, k).conj();
            }
            l.set(i, j, sum / ljj);
        }
    }
    Ok(l)
}

/// Doolittle LU with partial pivoting: `P A = L U`, `L` unit lower triangular.
///
/// The pivot of column `k` is the first row (from `k` down) holding the
/// largest modulus. Fails with `SingularMatrix` when that modulus is zero.
pub fn doolittle<M: MatrixMut>(a: &M) -> Result<PivotedLu<M>> {
    let n = require_square(a)?;
    debug!("Doolittle: n = {}", n);
    let mut work: Vec<Vec<M::Value>> = (0..n)
        .map(|i| (0..n).map(|j| a.at(i, j)).collect())
        .collect();
    let mut perm: Vec<usize> = (0..n).collect();
    let mut pivot_count = 0;

    for k in 0..n {
        let mut pivot_row = k;
        let mut best = work[k][k].modulus();
        for (i, row) in work.iter().enumerate().skip(k + 1) {
            let m = row[k].modulus();
            if m > best {
                best = m;
                pivot_row = i;
            }
        }
        if best.is_zero() {
            return Err(NumSimError::SingularMatrix { column: k });
        }
        if pivot_row != k {
            // Swapping whole rows also carries the multipliers already stored left of k
            work.swap(k, pivot_row);
            perm.swap(k, pivot_row);
            pivot_count += 1;
            trace!("Doolittle: swapped rows {} and {}", k, pivot_row);
        }
        let (head, tail) = work.split_at_mut(k + 1);
        let pivot = &head[k];
        for row in tail.iter_mut() {
            row[k] /= pivot[k];
            let factor = row[k];
            for j in k + 1..n {
                row[j] -= factor * pivot[j];
            }
        }
    }

    let mut l = M::zeros(n, n);
    let mut u = M::zeros(n, n);
    let mut p = M::zeros(n, n);
    for (i, row) in work.iter().enumerate() {
        l.set(i, i, M::Value::one());
        for (j, &v) in row.iter().enumerate() {
            if j < i {
                l.set(i, j, v);
            } else {
                u.set(i, j, v);
            }
        }
        p.set(i, perm[i], M::Value::one());
    }
    Ok(PivotedLu {
        l,
        u,
        p,
        perm,
        pivot_count,
    })
}

/// Solves `L U x = c` by forward then backward substitution.
///
/// `c` must already be permuted (`c = P b`). Only the lower triangle of `l`
/// and the upper triangle of `u` are read; a zero on either diagonal fails
/// with `DivisionByZero`.
pub fn solve_lu<M: Matrix>(l: &M, u: &M, c: &[M::Value]) -> Result<Vec<M::Value>> {
    let n = require_square(l)?;
    if u.dims() != (n, n) {
        return Err(NumSimError::MatrixSizeMismatch {
            expected: (n, n),
            actual: u.dims(),
        });
    }
    if c.len() != n {
        return Err(NumSimError::VectorSizeMismatch {
            expected: n,
            actual: c.len(),
        });
    }

    let mut y = vec![M::Value::zero(); n];
    for i in 0..n {
        let mut sum = c[i];
        let mut diag = M::Value::zero();
        for (j, v) in l.row_entries(i) {
            if j < i {
                sum -= v * y[j];
            } else if j == i {
                diag = v;
            }
        }
        if diag.is_zero() {
            return Err(NumSimError::DivisionByZero { row: i });
        }
        y[i] = sum / diag;
    }

    let mut x = vec![M::Value::zero(); n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        let mut diag = M::Value::zero();
        for (j, v) in u.row_entries(i) {
            if j > i {
                sum -= v * x[j];
            } else if j == i {
                diag = v;
            }
        }
        if diag.is_zero() {
            return Err(NumSimError::DivisionByZero { row: i });
        }
        x[i] = sum / diag;
    }
    Ok(x)
}

/// `(L U)^-1` assembled column by column, e.g. as an explicit PCG preconditioner.
pub fn inverse_lu<M: Matrix>(l: &M, u: &M) -> Result<SparseMatrix<M::Value>> {
    let n = require_square(l)?;
    let mut entries = Vec::new();
    let mut unit = vec![M::Value::zero(); n];
    for col in 0..n {
        unit[col] = M::Value::one();
        let column = solve_lu(l, u, &unit)?;
        unit[col] = M::Value::zero();
        entries.extend(
            column
                .into_iter()
                .enumerate()
                .filter(|(_, v)| !v.is_zero())
                .map(|(row, v)| Triplet::new(row, col, v)),
        );
    }
    SparseMatrix::from_triplets(n, n, entries)
}

/// Determinant via [`doolittle`]; a singular matrix yields zero.
pub fn determinant<M: MatrixMut>(a: &M) -> Result<M::Value> {
    match doolittle(a) {
        Ok(lu) => Ok(lu.determinant()),
        Err(NumSimError::SingularMatrix { .. }) => Ok(M::Value::zero()),
        Err(e) => Err(e),
    }
}
