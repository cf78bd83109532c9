//! Dense vector helpers.
//!
//! Dense vectors are plain `Vec<T>` / `&[T]`; these free functions provide
//! the handful of BLAS-1 style kernels the solvers need.

use crate::scalar::Scalar;
use crate::traits::Matrix;
use num_traits::Zero;

/// Inner product `sum(conj(a_i) * b_i)`.
///
/// # Panics
/// If the slices differ in length.
#[inline]
pub fn dot<T: Scalar>(a: &[T], b: &[T]) -> T {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (&x, &y)| acc + x.conj() * y)
}

/// Euclidean norm, accumulated in `f64`.
#[inline]
pub fn norm<T: Scalar>(a: &[T]) -> f64 {
    a.iter()
        .map(|&x| -> f64 { x.modulus_sqr().into() })
        .sum::<f64>()
        .sqrt()
}

/// `y += alpha * x`.
///
/// # Panics
/// If the slices differ in length.
#[inline]
pub fn axpy<T: Scalar>(alpha: T, x: &[T], y: &mut [T]) {
    assert_eq!(x.len(), y.len(), "axpy: length mismatch");
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// `x *= alpha`.
#[inline]
pub fn scale<T: Scalar>(alpha: T, x: &mut [T]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// Elementwise `a - b`.
///
/// # Panics
/// If the slices differ in length.
pub fn sub<T: Scalar>(a: &[T], b: &[T]) -> Vec<T> {
    assert_eq!(a.len(), b.len(), "sub: length mismatch");
    a.iter().zip(b).map(|(&x, &y)| x - y).collect()
}

/// Matrix-vector product `A * x` through the [`Matrix`] trait.
///
/// # Panics
/// If `x.len() != a.cols()`.
pub fn mat_vec<M: Matrix>(a: &M, x: &[M::Value]) -> Vec<M::Value> {
    assert_eq!(a.cols(), x.len(), "mat_vec: length mismatch");
    (0..a.rows())
        .map(|i| {
            a.row_entries(i)
                .fold(M::Value::zero(), |acc, (j, v)| acc + v * x[j])
        })
        .collect()
}

/// Residual `b - A * x`.
///
/// # Panics
/// If the dimensions of `a`, `x` and `b` disagree.
pub fn residual<M: Matrix>(a: &M, x: &[M::Value], b: &[M::Value]) -> Vec<M::Value> {
    assert_eq!(a.rows(), b.len(), "residual: length mismatch");
    let ax = mat_vec(a, x);
    sub(b, &ax)
}

/// `||b - A * x||_2`.
pub fn residual_norm<M: Matrix>(a: &M, x: &[M::Value], b: &[M::Value]) -> f64 {
    norm(&residual(a, x, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DenseMatrix;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_dot_conjugates_left() {
        let a = [Complex64::new(0.0, 1.0), Complex64::new(2.0, 0.0)];
        let b = [Complex64::new(0.0, 1.0), Complex64::new(1.0, 1.0)];
        // conj(i) * i + 2 * (1 + i) = 1 + 2 + 2i
        assert_eq!(dot(&a, &b), Complex64::new(3.0, 2.0));
        assert_relative_eq!(norm(&a), 5.0f64.sqrt());
    }

    #[test]
    fn test_axpy_and_sub() {
        let x = [1.0, 2.0, 3.0];
        let mut y = vec![1.0, 1.0, 1.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, vec![3.0, 5.0, 7.0]);
        assert_eq!(sub(&y, &x), vec![2.0, 3.0, 4.0]);
        scale(0.5, &mut y);
        assert_eq!(y, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_residual() {
        let a = DenseMatrix::from([[4.0, 1.0], [1.0, 3.0]]);
        let x = [1.0 / 11.0, 7.0 / 11.0];
        let b = [1.0, 2.0];
        assert_relative_eq!(residual_norm(&a, &x, &b), 0.0, epsilon = 1e-12);
        assert_eq!(mat_vec(&a, &[1.0, 1.0]), vec![5.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "dot: length mismatch")]
    fn test_dot_length_mismatch_panics() {
        dot(&[1.0f64, 2.0], &[1.0]);
    }
}
