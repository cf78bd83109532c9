//! Scalar abstraction shared by every container and solver.
//!
//! Real (`f32`, `f64`) and complex (`Complex<f32>`, `Complex<f64>`) numbers
//! implement [`Scalar`]. Solvers only ever rely on field arithmetic plus the
//! handful of operations below, so Hermitian variants (conjugated dot
//! products, complex Cholesky) fall out of the same code paths.

use std::fmt::Debug;
use std::ops::Neg;

use num_complex::Complex;
use num_traits::{Float, NumAssign};

/// Numeric element type of a matrix or vector.
///
/// "Zero" is the exact additive identity (`Zero::is_zero`); sparse storage
/// never keeps such values.
pub trait Scalar:
    Copy + Debug + Default + PartialEq + NumAssign + Neg<Output = Self> + Send + Sync + 'static
{
    /// The real field underlying this scalar (itself for real types).
    type Real: Float + Debug + Default + Into<f64> + Send + Sync + 'static;

    /// Complex conjugate (identity for real types).
    fn conj(self) -> Self;

    /// Squared magnitude `|z|^2`.
    fn modulus_sqr(self) -> Self::Real;

    /// Magnitude `|z|`.
    fn modulus(self) -> Self::Real;

    /// Real part.
    fn real(self) -> Self::Real;

    fn from_real(r: Self::Real) -> Self;

    /// Lossy conversion used for tolerances, weights and averages.
    fn from_f64(v: f64) -> Self;

    /// Principal square root.
    fn sqrt(self) -> Self;

    fn is_nan(self) -> bool;

    fn is_infinite(self) -> bool;
}

macro_rules! impl_real_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            type Real = $t;

            #[inline]
            fn conj(self) -> Self {
                self
            }

            #[inline]
            fn modulus_sqr(self) -> $t {
                self * self
            }

            #[inline]
            fn modulus(self) -> $t {
                self.abs()
            }

            #[inline]
            fn real(self) -> $t {
                self
            }

            #[inline]
            fn from_real(r: $t) -> Self {
                r
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }

            #[inline]
            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            #[inline]
            fn is_infinite(self) -> bool {
                <$t>::is_infinite(self)
            }
        }
    };
}

macro_rules! impl_complex_scalar {
    ($t:ty) => {
        impl Scalar for Complex<$t> {
            type Real = $t;

            #[inline]
            fn conj(self) -> Self {
                Complex::new(self.re, -self.im)
            }

            #[inline]
            fn modulus_sqr(self) -> $t {
                self.re * self.re + self.im * self.im
            }

            #[inline]
            fn modulus(self) -> $t {
                self.re.hypot(self.im)
            }

            #[inline]
            fn real(self) -> $t {
                self.re
            }

            #[inline]
            fn from_real(r: $t) -> Self {
                Complex::new(r, 0.0)
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                Complex::new(v as $t, 0.0)
            }

            #[inline]
            fn sqrt(self) -> Self {
                Complex::<$t>::sqrt(self)
            }

            #[inline]
            fn is_nan(self) -> bool {
                self.re.is_nan() || self.im.is_nan()
            }

            #[inline]
            fn is_infinite(self) -> bool {
                !Scalar::is_nan(self) && (self.re.is_infinite() || self.im.is_infinite())
            }
        }
    };
}

impl_real_scalar!(f32);
impl_real_scalar!(f64);
impl_complex_scalar!(f32);
impl_complex_scalar!(f64);

#[cfg(test)]
mod tests {
    use super::Scalar;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use num_traits::Zero;

    #[test]
    fn test_real_scalar_ops() {
        assert_eq!(Scalar::conj(-2.5f64), -2.5);
        assert_eq!(Scalar::modulus(-3.0f32), 3.0);
        assert_eq!(Scalar::modulus_sqr(-3.0f64), 9.0);
        assert_eq!(<f32 as Scalar>::from_f64(1.5), 1.5f32);
        assert_eq!(Scalar::sqrt(16.0f64), 4.0);
        assert!(Scalar::is_nan(f64::NAN));
        assert!(Scalar::is_infinite(f32::NEG_INFINITY));
        assert!((-0.0f64).is_zero());
    }

    #[test]
    fn test_complex_scalar_ops() {
        let z = Complex64::new(3.0, -4.0);
        assert_eq!(Scalar::conj(z), Complex64::new(3.0, 4.0));
        assert_relative_eq!(Scalar::modulus(z), 5.0);
        assert_relative_eq!(Scalar::modulus_sqr(z), 25.0);
        assert_eq!(Scalar::real(z), 3.0);
        assert_eq!(<Complex64 as Scalar>::from_real(2.0), Complex64::new(2.0, 0.0));

        let root = Scalar::sqrt(Complex64::new(-4.0, 0.0));
        assert_relative_eq!(root.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(root.im, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_complex_nan_inf() {
        let nan = Complex64::new(f64::NAN, 0.0);
        let inf = Complex64::new(0.0, f64::INFINITY);
        assert!(Scalar::is_nan(nan));
        assert!(!Scalar::is_infinite(nan));
        assert!(Scalar::is_infinite(inf));
        assert!(!Scalar::is_nan(inf));
    }
}
