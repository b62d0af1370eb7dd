//! The scalar abstraction the tensor algebra instantiates over.
//!
//! Constitutive kernels in this crate are written once, generically over
//! [`SmoothScalar`], and evaluated with plain reals, complex numbers (for
//! complex-step differentiation) or [dual numbers](crate::dual) of any order
//! (for forward-mode automatic differentiation).

use nalgebra::{ClosedAdd, ClosedDiv, ClosedMul, ClosedSub, Scalar};
use num::complex::Complex;
use num::{One, Zero};
use std::ops::Neg;

/// A scalar type that supports the smooth elementary functions required by
/// hyperelastic energy densities and plastic return mappings.
///
/// The trait bounds are exactly what `nalgebra`'s fixed-size matrix arithmetic
/// requires, so that `Matrix3<T>` works for every implementor.
pub trait SmoothScalar:
    Scalar + Copy + Zero + One + ClosedAdd + ClosedSub + ClosedMul + ClosedDiv + Neg<Output = Self>
{
    /// Embed a real constant.
    fn from_f64(value: f64) -> Self;

    /// The leading real part: the plain `f64` shadow of this scalar.
    ///
    /// For duals this is the undifferentiated value, for complex numbers the
    /// real part. Branching decisions (yield checks, convergence tests,
    /// clamps) are taken on the shadow so that every scalar type follows the
    /// same code path.
    fn real(self) -> f64;

    fn sqrt(self) -> Self;

    fn exp(self) -> Self;

    fn ln(self) -> Self;

    fn sin(self) -> Self;

    fn cos(self) -> Self;

    fn acos(self) -> Self;

    /// Raise to a real power.
    fn powf(self, exponent: f64) -> Self;

    /// Raise to an integer power.
    fn powi(self, exponent: i32) -> Self {
        self.powf(exponent as f64)
    }

    /// Multiplicative inverse.
    fn recip(self) -> Self {
        Self::one() / self
    }
}

impl SmoothScalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn real(self) -> f64 {
        self
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }

    fn acos(self) -> Self {
        f64::acos(self)
    }

    fn powf(self, exponent: f64) -> Self {
        f64::powf(self, exponent)
    }

    fn powi(self, exponent: i32) -> Self {
        f64::powi(self, exponent)
    }
}

impl SmoothScalar for Complex<f64> {
    fn from_f64(value: f64) -> Self {
        Complex::new(value, 0.0)
    }

    fn real(self) -> f64 {
        self.re
    }

    fn sqrt(self) -> Self {
        Complex::sqrt(self)
    }

    fn exp(self) -> Self {
        Complex::exp(self)
    }

    fn ln(self) -> Self {
        Complex::ln(self)
    }

    fn sin(self) -> Self {
        Complex::sin(self)
    }

    fn cos(self) -> Self {
        Complex::cos(self)
    }

    fn acos(self) -> Self {
        Complex::acos(self)
    }

    fn powf(self, exponent: f64) -> Self {
        Complex::powf(self, exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_shadow_and_powers() {
        let z = Complex::new(2.0, 1e-20);
        assert_eq!(z.real(), 2.0);
        assert!((SmoothScalar::powi(z, 2).re - 4.0).abs() < 1e-14);
        assert!((SmoothScalar::powf(z, -2.0 / 3.0).re - 2.0f64.powf(-2.0 / 3.0)).abs() < 1e-14);
    }

    #[test]
    fn real_recip() {
        assert_eq!(SmoothScalar::recip(4.0), 0.25);
    }
}
