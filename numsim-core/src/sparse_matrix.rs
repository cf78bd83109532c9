//! Compressed Row Storage (CRS) sparse matrix.
//!
//! Entries are kept in row-major order with strictly increasing column
//! indices inside every row, and no stored value is ever exactly zero:
//! writing a zero removes the entry. Because the layout is canonical, the
//! derived `PartialEq` is the same as comparing the sets of
//! `(row, column, value)` triples.

use crate::dense_matrix::DenseMatrix;
use crate::error::{NumSimError, Result};
use crate::scalar::Scalar;
use crate::traits::{Matrix, MatrixMut};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Represents a sparse matrix in Compressed Sparse Row (CSR) format on the CPU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "CsrParts<T>",
    bound(deserialize = "T: Scalar + Deserialize<'de>")
)]
pub struct SparseMatrix<T: Scalar> {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Vector containing the non-zero values of the matrix.
    pub(crate) values: Vec<T>,
    /// Vector containing the column indices corresponding to the values.
    pub(crate) col_indices: Vec<usize>,
    /// Vector containing the pointers to the start of each row in `values` and `col_indices`.
    /// The length of this vector is `rows + 1`. `row_ptr[i]` gives the index in `values`
    /// where row `i` starts, and `row_ptr[rows]` gives the total number of non-zero elements (nnz).
    pub(crate) row_ptr: Vec<usize>,
}

/// Unvalidated wire form; deserialization goes through [`SparseMatrix::from_csr`].
#[derive(Deserialize)]
struct CsrParts<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
    col_indices: Vec<usize>,
    row_ptr: Vec<usize>,
}

impl<T: Scalar> TryFrom<CsrParts<T>> for SparseMatrix<T> {
    type Error = NumSimError;

    fn try_from(parts: CsrParts<T>) -> Result<Self> {
        SparseMatrix::from_csr(
            parts.rows,
            parts.cols,
            parts.values,
            parts.col_indices,
            parts.row_ptr,
        )
    }
}

/// A stored entry of a sparse matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triplet<T> {
    row: usize,
    col: usize,
    value: T,
}

impl<T: Copy> Triplet<T> {
    pub fn new(row: usize, col: usize, value: T) -> Self {
        Triplet { row, col, value }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Scalar> SparseMatrix<T> {
    /// Creates a new empty SparseMatrix with given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        SparseMatrix {
            rows,
            cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptr: vec![0; rows + 1], // Initialize row_ptr with zeros
        }
    }

    /// Empty matrix with room for `capacity` entries before reallocating.
    pub fn with_capacity(rows: usize, cols: usize, capacity: usize) -> Self {
        SparseMatrix {
            rows,
            cols,
            values: Vec::with_capacity(capacity),
            col_indices: Vec::with_capacity(capacity),
            row_ptr: vec![0; rows + 1],
        }
    }

    pub fn identity(n: usize) -> Self {
        SparseMatrix {
            rows: n,
            cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptr: (0..=n).collect(),
        }
    }

    /// Builds a matrix from coordinate entries in any order.
    /// Duplicate coordinates are summed; entries summing to zero are dropped.
    pub fn from_triplets(rows: usize, cols: usize, triplets: Vec<Triplet<T>>) -> Result<Self> {
        let mut coords = triplets;
        for &Triplet { row, col, .. } in &coords {
            if row >= rows {
                return Err(NumSimError::InvalidDimensions(
                    "Row index out of bounds".to_string(),
                ));
            }
            if col >= cols {
                return Err(NumSimError::InvalidDimensions(
                    "Column index out of bounds".to_string(),
                ));
            }
        }
        // Stable so duplicates are summed in input order
        coords.sort_by_key(|&Triplet { row, col, .. }| (row, col));

        let triplet_count = coords.len();
        let mut matrix = Self::with_capacity(rows, cols, triplet_count);
        let mut iter = coords.into_iter().peekable();
        while let Some(first) = iter.next() {
            let mut value = first.value;
            while let Some(dup) = iter.next_if(|t| t.row == first.row && t.col == first.col) {
                value += dup.value;
            }
            if !value.is_zero() {
                matrix.values.push(value);
                matrix.col_indices.push(first.col);
                matrix.row_ptr[first.row + 1] += 1;
            }
        }
        // Convert counts to cumulative row pointers
        for i in 1..=rows {
            matrix.row_ptr[i] += matrix.row_ptr[i - 1];
        }
        log::debug!(
            "Assembled {}x{} sparse matrix: {} triplets -> {} non-zeros",
            rows,
            cols,
            triplet_count,
            matrix.nnz()
        );
        Ok(matrix)
    }

    /// Creates a SparseMatrix from CSR components.
    /// The components must already be canonical: sorted columns per row and no explicit zeros.
    pub fn from_csr(
        rows: usize,
        cols: usize,
        values: Vec<T>,
        col_indices: Vec<usize>,
        row_ptr: Vec<usize>,
    ) -> Result<Self> {
        validate_csr(rows, cols, &values, &col_indices, &row_ptr)?;
        Ok(SparseMatrix {
            rows,
            cols,
            values,
            col_indices,
            row_ptr,
        })
    }

    /// Creates a SparseMatrix from a dense 2D vector representation.
    /// Rows shorter than the longest row are padded with zeros.
    pub fn from_dense(dense: &[Vec<T>]) -> Self {
        let rows = dense.len();
        let cols = dense.iter().map(Vec::len).max().unwrap_or(0);
        let mut matrix = Self::new(rows, cols);
        for (r, row_vec) in dense.iter().enumerate() {
            for (c, &val) in row_vec.iter().enumerate() {
                if !val.is_zero() {
                    matrix.values.push(val);
                    matrix.col_indices.push(c);
                }
            }
            matrix.row_ptr[r + 1] = matrix.values.len();
        }
        matrix
    }

    /// Returns the dimensions of the matrix (rows, cols).
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// `rows * cols`, the number of addressable positions.
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns the number of non-zero elements.
    #[doc(alias = "filled_count")]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns a slice containing the non-zero values.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns a slice containing the column indices.
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Returns a slice containing the row pointers.
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Reserves room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
        self.col_indices.reserve(additional);
    }

    /// Removes every entry, keeping dimensions and capacity.
    pub fn clear(&mut self) {
        self.values.clear();
        self.col_indices.clear();
        self.row_ptr.iter_mut().for_each(|p| *p = 0);
    }

    fn check_bounds(&self, row: usize, col: usize) {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} sparse matrix",
            self.rows,
            self.cols
        );
    }

    /// Offset of `(row, col)` in the backing arrays, or the offset it would
    /// be inserted at.
    fn find(&self, row: usize, col: usize) -> core::result::Result<usize, usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_indices[start..end].binary_search(&col) {
            Ok(k) => Ok(start + k),
            Err(k) => Err(start + k),
        }
    }

    fn insert_at(&mut self, row: usize, offset: usize, col: usize, value: T) {
        self.values.insert(offset, value);
        self.col_indices.insert(offset, col);
        for p in &mut self.row_ptr[row + 1..] {
            *p += 1;
        }
    }

    fn remove_at(&mut self, row: usize, offset: usize) {
        self.values.remove(offset);
        self.col_indices.remove(offset);
        for p in &mut self.row_ptr[row + 1..] {
            *p -= 1;
        }
    }

    /// Value at `(row, col)`, zero when the entry is not stored.
    ///
    /// # Panics
    /// If the position is out of bounds.
    pub fn at(&self, row: usize, col: usize) -> T {
        self.check_bounds(row, col);
        match self.find(row, col) {
            Ok(offset) => self.values[offset],
            Err(_) => T::zero(),
        }
    }

    /// Gets the stored value at a specific row and column.
    /// Returns `None` for absent entries and for out-of-bounds positions.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.rows || col >= self.cols {
            return None; // Out of bounds
        }
        self.find(row, col).ok().map(|offset| self.values[offset])
    }

    /// True if `(row, col)` holds a non-zero value.
    ///
    /// # Panics
    /// If the position is out of bounds.
    pub fn has(&self, row: usize, col: usize) -> bool {
        self.check_bounds(row, col);
        self.find(row, col).is_ok()
    }

    /// Inserts, overwrites or (for a zero `value`) removes the entry at `(row, col)`.
    ///
    /// Overwriting is `O(row length)`; inserting or removing shifts every later
    /// entry and row pointer, `O(nnz + rows)` in the worst case.
    ///
    /// # Panics
    /// If the position is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.check_bounds(row, col);
        match self.find(row, col) {
            Ok(offset) if value.is_zero() => self.remove_at(row, offset),
            Ok(offset) => self.values[offset] = value,
            Err(offset) if !value.is_zero() => self.insert_at(row, offset, col, value),
            Err(_) => {}
        }
    }

    /// [`at`](Self::at) with the linear index `row * cols + col`.
    pub fn linear_at(&self, index: usize) -> T {
        assert!(index < self.size(), "linear index {index} out of bounds");
        self.at(index / self.cols, index % self.cols)
    }

    /// [`set`](Self::set) with the linear index `row * cols + col`.
    pub fn linear_set(&mut self, index: usize, value: T) {
        assert!(index < self.size(), "linear index {index} out of bounds");
        self.set(index / self.cols, index % self.cols, value)
    }

    // --- cursor protocol ---

    fn cursor_at_offset(&self, offset: usize) -> Cursor {
        if offset >= self.nnz() {
            return Cursor::END;
        }
        // Last row whose start is <= offset; empty rows share a start and are skipped.
        let row = self.row_ptr.partition_point(|&p| p <= offset) - 1;
        Cursor {
            slot: Some(Slot {
                row,
                col: self.col_indices[offset],
                offset,
            }),
        }
    }

    fn live_slot(&self, cursor: Cursor) -> Option<Slot> {
        let slot = cursor.slot?;
        assert!(
            slot.offset < self.nnz()
                && self.col_indices[slot.offset] == slot.col
                && self.row_ptr[slot.row] <= slot.offset
                && slot.offset < self.row_ptr[slot.row + 1],
            "stale cursor at ({}, {})",
            slot.row,
            slot.col
        );
        Some(slot)
    }

    /// Cursor on the first stored entry in row-major order.
    pub fn begin(&self) -> Cursor {
        self.cursor_at_offset(0)
    }

    /// The end cursor. All end cursors compare equal.
    pub fn end(&self) -> Cursor {
        Cursor::END
    }

    /// Cursor on the entry following `cursor`.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        match self.live_slot(cursor) {
            Some(slot) => self.cursor_at_offset(slot.offset + 1),
            None => Cursor::END,
        }
    }

    /// The entry under `cursor`, `None` at the end.
    ///
    /// # Panics
    /// If the matrix was structurally modified since the cursor was created
    /// and the cursor no longer points at a stored entry.
    pub fn entry(&self, cursor: Cursor) -> Option<Triplet<T>> {
        self.live_slot(cursor)
            .map(|slot| Triplet::new(slot.row, slot.col, self.values[slot.offset]))
    }

    /// Removes the entry under `cursor` and returns a cursor on the entry
    /// that logically followed it.
    ///
    /// Any other cursor past the removed entry is invalidated.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        match self.live_slot(cursor) {
            Some(slot) => {
                self.remove_at(slot.row, slot.offset);
                self.cursor_at_offset(slot.offset)
            }
            None => Cursor::END,
        }
    }

    /// Overwrites the entry under `cursor`. A zero `value` behaves like
    /// [`erase`](Self::erase); otherwise the returned cursor equals `cursor`.
    pub fn set_at(&mut self, cursor: Cursor, value: T) -> Cursor {
        if value.is_zero() {
            return self.erase(cursor);
        }
        if let Some(slot) = self.live_slot(cursor) {
            self.values[slot.offset] = value;
        }
        cursor
    }

    // --- iteration ---

    /// Stored entries in row-major order.
    pub fn iter(&self) -> SparseMatrixIter<'_, T> {
        SparseMatrixIter {
            matrix: self,
            row: 0,
            offset: 0,
        }
    }

    /// Stored `(column, value)` pairs of one row, column-ascending.
    pub fn row_iter(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        assert!(row < self.rows, "row {row} out of bounds");
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Keeps only the entries for which `keep(row, col, value)` returns true.
    /// Single pass, `O(nnz + rows)`.
    pub fn retain(&mut self, mut keep: impl FnMut(usize, usize, T) -> bool) {
        let mut write = 0;
        let mut read = 0;
        for row in 0..self.rows {
            let end = self.row_ptr[row + 1];
            while read < end {
                let (col, value) = (self.col_indices[read], self.values[read]);
                if keep(row, col, value) {
                    self.col_indices[write] = col;
                    self.values[write] = value;
                    write += 1;
                }
                read += 1;
            }
            self.row_ptr[row + 1] = write;
        }
        self.values.truncate(write);
        self.col_indices.truncate(write);
    }

    /// Applies `f` to every stored value, dropping results that are zero.
    fn map_values(&mut self, f: impl Fn(T) -> T) {
        let mut produced_zero = false;
        for v in &mut self.values {
            *v = f(*v);
            produced_zero |= v.is_zero();
        }
        if produced_zero {
            self.retain(|_, _, v| !v.is_zero());
        }
    }

    /// Row-by-row merge of two equally sized matrices. `op` receives the
    /// stored values at a position present in either operand.
    fn merge_with(&self, other: &Self, op: impl Fn(Option<T>, Option<T>) -> T) -> Self {
        assert_eq!(
            self.dims(),
            other.dims(),
            "elementwise operation on mismatched dimensions"
        );
        let mut out = Self::with_capacity(self.rows, self.cols, self.nnz() + other.nnz());
        for row in 0..self.rows {
            let (mut a, a_end) = (self.row_ptr[row], self.row_ptr[row + 1]);
            let (mut b, b_end) = (other.row_ptr[row], other.row_ptr[row + 1]);
            while a < a_end || b < b_end {
                let take_a = b >= b_end
                    || (a < a_end && self.col_indices[a] <= other.col_indices[b]);
                let take_b = a >= a_end
                    || (b < b_end && other.col_indices[b] <= self.col_indices[a]);
                let col = if take_a {
                    self.col_indices[a]
                } else {
                    other.col_indices[b]
                };
                let va = take_a.then(|| self.values[a]);
                let vb = take_b.then(|| other.values[b]);
                if take_a {
                    a += 1;
                }
                if take_b {
                    b += 1;
                }
                let value = op(va, vb);
                if !value.is_zero() {
                    out.values.push(value);
                    out.col_indices.push(col);
                }
            }
            out.row_ptr[row + 1] = out.values.len();
        }
        out
    }

    // --- products ---

    /// Matrix-matrix product `self * right` (row-wise Gustavson).
    /// Entries that cancel to zero are not stored.
    pub fn matmul(&self, right: &SparseMatrix<T>) -> Result<SparseMatrix<T>> {
        if self.cols != right.rows {
            return Err(NumSimError::MatrixMulMismatch {
                left_cols: self.cols,
                right_rows: right.rows,
            });
        }
        let mut out = Self::new(self.rows, right.cols);
        let mut acc = vec![T::zero(); right.cols];
        let mut marker = vec![usize::MAX; right.cols];
        let mut touched = Vec::new();
        for i in 0..self.rows {
            touched.clear();
            for (k, a) in self.row_iter(i) {
                for (j, b) in right.row_iter(k) {
                    if marker[j] != i {
                        marker[j] = i;
                        acc[j] = T::zero();
                        touched.push(j);
                    }
                    acc[j] += a * b;
                }
            }
            touched.sort_unstable();
            for &j in &touched {
                if !acc[j].is_zero() {
                    out.values.push(acc[j]);
                    out.col_indices.push(j);
                }
            }
            out.row_ptr[i + 1] = out.values.len();
        }
        log::debug!(
            "Sparse product {}x{} * {}x{}: {} non-zeros",
            self.rows,
            self.cols,
            right.rows,
            right.cols,
            out.nnz()
        );
        Ok(out)
    }

    /// Matrix-vector product `self * x`.
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>> {
        if x.len() != self.cols {
            return Err(NumSimError::VectorSizeMismatch {
                expected: self.cols,
                actual: x.len(),
            });
        }
        Ok((0..self.rows)
            .map(|i| {
                self.row_iter(i)
                    .fold(T::zero(), |acc, (j, v)| acc + v * x[j])
            })
            .collect())
    }

    /// Left product `x^T * self`.
    pub fn mul_left(&self, x: &[T]) -> Result<Vec<T>> {
        if x.len() != self.rows {
            return Err(NumSimError::VectorSizeMismatch {
                expected: self.rows,
                actual: x.len(),
            });
        }
        let mut out = vec![T::zero(); self.cols];
        for (t, xi) in self.iter().map(|t| (t, x[t.row])) {
            out[t.col] += xi * t.value;
        }
        Ok(out)
    }

    // --- structure ---

    pub fn transpose(&self) -> SparseMatrix<T> {
        let mut row_ptr = vec![0usize; self.cols + 1];
        for &c in &self.col_indices {
            row_ptr[c + 1] += 1;
        }
        for i in 1..=self.cols {
            row_ptr[i] += row_ptr[i - 1];
        }
        let mut next = row_ptr.clone();
        let mut values = vec![T::zero(); self.nnz()];
        let mut col_indices = vec![0usize; self.nnz()];
        for t in self.iter() {
            let pos = next[t.col];
            values[pos] = t.value;
            col_indices[pos] = t.row;
            next[t.col] += 1;
        }
        SparseMatrix {
            rows: self.cols,
            cols: self.rows,
            values,
            col_indices,
            row_ptr,
        }
    }

    /// Elementwise complex conjugate (a copy for real scalars).
    pub fn conjugate(&self) -> SparseMatrix<T> {
        let mut out = self.clone();
        out.map_values(|v| v.conj());
        out
    }

    /// Conjugate transpose `A^*`.
    pub fn adjugate(&self) -> SparseMatrix<T> {
        self.transpose().conjugate()
    }

    pub fn trace(&self) -> T {
        (0..self.rows.min(self.cols)).fold(T::zero(), |acc, i| acc + self.at(i, i))
    }

    /// Main diagonal, length `min(rows, cols)`.
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.rows.min(self.cols)).map(|i| self.at(i, i)).collect()
    }

    /// Entries on or below the `k`-th diagonal (`k > 0` is above the main diagonal).
    pub fn tril(&self, k: isize) -> SparseMatrix<T> {
        let mut out = self.clone();
        out.retain(|i, j, _| j as isize - i as isize <= k);
        out
    }

    /// Entries on or above the `k`-th diagonal (`k < 0` is below the main diagonal).
    pub fn triu(&self, k: isize) -> SparseMatrix<T> {
        let mut out = self.clone();
        out.retain(|i, j, _| j as isize - i as isize >= k);
        out
    }

    // --- aggregates ---

    pub fn sum(&self) -> T {
        self.values.iter().fold(T::zero(), |acc, &v| acc + v)
    }

    /// Mean over all `rows * cols` positions (absent entries count as zero).
    pub fn avg(&self) -> T {
        if self.size() == 0 {
            return T::zero();
        }
        self.sum() / T::from_f64(self.size() as f64)
    }

    pub fn has_nan(&self) -> bool {
        self.values.iter().any(|&v| v.is_nan())
    }

    pub fn has_inf(&self) -> bool {
        self.values.iter().any(|&v| v.is_infinite())
    }

    /// True if at least one position is not stored, i.e. reads as zero.
    pub fn has_zero(&self) -> bool {
        self.nnz() < self.size()
    }

    /// True if no entry is stored (everything is zero).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Scalar + PartialOrd> SparseMatrix<T> {
    /// Largest element; absent entries count as zero.
    pub fn max(&self) -> T {
        self.extreme(|candidate, best| candidate > best)
    }

    /// Smallest element; absent entries count as zero.
    pub fn min(&self) -> T {
        self.extreme(|candidate, best| candidate < best)
    }

    fn extreme(&self, better: impl Fn(T, T) -> bool) -> T {
        let implicit_zero = self.has_zero().then(T::zero);
        self.values
            .iter()
            .copied()
            .chain(implicit_zero)
            .reduce(|best, v| if better(v, best) { v } else { best })
            .unwrap_or_else(T::zero)
    }
}

/// Position handle into a [`SparseMatrix`].
///
/// A cursor does not borrow the matrix, so it can be passed back into the
/// mutating [`SparseMatrix::erase`] / [`SparseMatrix::set_at`]. Inserting or
/// removing entries invalidates cursors positioned after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    slot: Option<Slot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    row: usize,
    col: usize,
    offset: usize,
}

impl Cursor {
    const END: Cursor = Cursor { slot: None };

    pub fn is_end(&self) -> bool {
        self.slot.is_none()
    }

    /// Row of the entry, `None` for the end cursor.
    pub fn row(&self) -> Option<usize> {
        self.slot.map(|s| s.row)
    }

    /// Column of the entry, `None` for the end cursor.
    pub fn col(&self) -> Option<usize> {
        self.slot.map(|s| s.col)
    }
}

pub struct SparseMatrixIter<'a, T: Scalar> {
    matrix: &'a SparseMatrix<T>,
    row: usize,
    offset: usize,
}

impl<T: Scalar> Iterator for SparseMatrixIter<'_, T> {
    type Item = Triplet<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.matrix;
        if self.offset >= m.nnz() {
            return None;
        }
        while m.row_ptr[self.row + 1] <= self.offset {
            self.row += 1;
        }
        let item = Triplet {
            row: self.row,
            col: m.col_indices[self.offset],
            value: m.values[self.offset],
        };
        self.offset += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.matrix.nnz() - self.offset;
        (remaining, Some(remaining))
    }
}

impl<T: Scalar> ExactSizeIterator for SparseMatrixIter<'_, T> {}

impl<'a, T: Scalar> IntoIterator for &'a SparseMatrix<T> {
    type Item = Triplet<T>;
    type IntoIter = SparseMatrixIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate_csr<T: Scalar>(
    rows: usize,
    cols: usize,
    values: &[T],
    col_indices: &[usize],
    row_ptr: &[usize],
) -> Result<()> {
    if row_ptr.len().checked_sub(1) != Some(rows) {
        return Err(NumSimError::InvalidDimensions(
            "row_ptr length must be rows + 1".to_string(),
        ));
    }
    if values.len() != col_indices.len() {
        return Err(NumSimError::InvalidDimensions(
            "values and col_indices must have the same length".to_string(),
        ));
    }
    if row_ptr[0] != 0 || row_ptr.windows(2).any(|w| w[0] > w[1]) {
        return Err(NumSimError::InvalidDimensions(
            "row_ptr must start at 0 and be non-decreasing".to_string(),
        ));
    }
    if row_ptr[rows] != values.len() {
        return Err(NumSimError::InvalidDimensions(
            "Last element of row_ptr must equal the number of non-zero values".to_string(),
        ));
    }
    if col_indices.iter().any(|&c| c >= cols) {
        return Err(NumSimError::InvalidDimensions(
            "Column index out of bounds".to_string(),
        ));
    }
    for row in 0..rows {
        let cols_in_row = &col_indices[row_ptr[row]..row_ptr[row + 1]];
        if cols_in_row.windows(2).any(|w| w[0] >= w[1]) {
            return Err(NumSimError::InvalidDimensions(format!(
                "Column indices of row {row} must be strictly increasing"
            )));
        }
    }
    if values.iter().any(|v| v.is_zero()) {
        return Err(NumSimError::InvalidDimensions(
            "Explicit zeros must not be stored".to_string(),
        ));
    }
    Ok(())
}

// --- elementwise operators ---
// Dimension mismatches panic: they are caller bugs, not numerical outcomes.

impl<T: Scalar> AddAssign<&SparseMatrix<T>> for SparseMatrix<T> {
    fn add_assign(&mut self, rhs: &SparseMatrix<T>) {
        *self = &*self + rhs;
    }
}

impl<T: Scalar> SubAssign<&SparseMatrix<T>> for SparseMatrix<T> {
    fn sub_assign(&mut self, rhs: &SparseMatrix<T>) {
        *self = &*self - rhs;
    }
}

/// Hadamard (elementwise) product. See [`SparseMatrix::matmul`] for the matrix product.
impl<T: Scalar> MulAssign<&SparseMatrix<T>> for SparseMatrix<T> {
    fn mul_assign(&mut self, rhs: &SparseMatrix<T>) {
        *self = &*self * rhs;
    }
}

impl<T: Scalar> MulAssign<T> for SparseMatrix<T> {
    fn mul_assign(&mut self, factor: T) {
        if factor.is_zero() {
            self.clear();
        } else {
            self.map_values(|v| v * factor);
        }
    }
}

impl<T: Scalar> Add for &SparseMatrix<T> {
    type Output = SparseMatrix<T>;

    fn add(self, rhs: Self) -> SparseMatrix<T> {
        self.merge_with(rhs, |a, b| {
            a.unwrap_or_else(T::zero) + b.unwrap_or_else(T::zero)
        })
    }
}

impl<T: Scalar> Sub for &SparseMatrix<T> {
    type Output = SparseMatrix<T>;

    fn sub(self, rhs: Self) -> SparseMatrix<T> {
        self.merge_with(rhs, |a, b| {
            a.unwrap_or_else(T::zero) - b.unwrap_or_else(T::zero)
        })
    }
}

impl<T: Scalar> Mul for &SparseMatrix<T> {
    type Output = SparseMatrix<T>;

    fn mul(self, rhs: Self) -> SparseMatrix<T> {
        self.merge_with(rhs, |a, b| match (a, b) {
            (Some(x), Some(y)) => x * y,
            _ => T::zero(),
        })
    }
}

impl<T: Scalar> Add for SparseMatrix<T> {
    type Output = SparseMatrix<T>;

    fn add(self, rhs: SparseMatrix<T>) -> SparseMatrix<T> {
        &self + &rhs
    }
}

impl<T: Scalar> Sub for SparseMatrix<T> {
    type Output = SparseMatrix<T>;

    fn sub(self, rhs: SparseMatrix<T>) -> SparseMatrix<T> {
        &self - &rhs
    }
}

impl<T: Scalar> Mul<T> for SparseMatrix<T> {
    type Output = SparseMatrix<T>;

    fn mul(mut self, factor: T) -> SparseMatrix<T> {
        self *= factor;
        self
    }
}

impl<T: Scalar> Neg for SparseMatrix<T> {
    type Output = SparseMatrix<T>;

    fn neg(mut self) -> SparseMatrix<T> {
        self.map_values(|v| -v);
        self
    }
}

// --- conversions ---

impl<T: Scalar, const R: usize, const C: usize> From<[[T; C]; R]> for SparseMatrix<T> {
    fn from(rows: [[T; C]; R]) -> Self {
        let dense: Vec<Vec<T>> = rows.iter().map(|r| r.to_vec()).collect();
        let mut matrix = SparseMatrix::from_dense(&dense);
        // Width of a zero-row array cannot be inferred from its rows
        matrix.cols = C;
        matrix
    }
}

impl<T: Scalar> From<&DenseMatrix<T>> for SparseMatrix<T> {
    fn from(dense: &DenseMatrix<T>) -> Self {
        let mut matrix = SparseMatrix::new(dense.rows(), dense.cols());
        for i in 0..dense.rows() {
            for (j, v) in dense.row_entries(i) {
                matrix.values.push(v);
                matrix.col_indices.push(j);
            }
            matrix.row_ptr[i + 1] = matrix.values.len();
        }
        matrix
    }
}

impl<T: Scalar> From<&SparseMatrix<T>> for DenseMatrix<T> {
    fn from(sparse: &SparseMatrix<T>) -> Self {
        let mut dense = DenseMatrix::zeros(sparse.rows(), sparse.cols());
        for t in sparse {
            dense.set(t.row, t.col, t.value);
        }
        dense
    }
}

// Implement the generic Matrix trait for the CPU version
impl<T: Scalar> Matrix for SparseMatrix<T> {
    type Value = T;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn at(&self, row: usize, col: usize) -> T {
        SparseMatrix::at(self, row, col)
    }

    fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        self.row_iter(row)
    }
}

impl<T: Scalar> MatrixMut for SparseMatrix<T> {
    fn zeros(rows: usize, cols: usize) -> Self {
        SparseMatrix::new(rows, cols)
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        SparseMatrix::set(self, row, col, value)
    }
}
