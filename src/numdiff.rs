//! Numerical differentiation fallbacks: forward differences, central
//! differences and complex-step differentiation.
//!
//! These schemes back the finite-difference and complex-step variants of the
//! return-mapping algorithms and serve as an independent validation path for
//! the automatic differentiation drivers. Step sizes follow the usual rules
//! $h_{\mathrm{fwd}} = \max(1, |x|) \sqrt{\varepsilon}$ and
//! $h_{\mathrm{ctr}} = \max(1, |x|) \sqrt[3]{\varepsilon}$; the complex step
//! uses an imaginary perturbation of $10^{-20}$ and is exact to machine
//! precision for analytic functions.

use crate::constants::{cubic_root_eps, square_root_eps};
use crate::tensor::Tensor4;
use itertools::iproduct;
use nalgebra::{Matrix3, SMatrix, SVector};
use num::complex::Complex;

/// Magnitude of the imaginary perturbation used by the complex-step scheme.
pub const IMAGINARY_PERTURBATION: f64 = 1e-20;

fn forward_step(x: f64) -> f64 {
    x.abs().max(1.0) * square_root_eps()
}

fn central_step(x: f64) -> f64 {
    x.abs().max(1.0) * cubic_root_eps()
}

pub mod scalar_to_scalar {
    use super::*;

    pub fn forward_difference(f: impl Fn(f64) -> f64, x: f64) -> f64 {
        let h = forward_step(x);
        (f(x + h) - f(x)) / h
    }

    pub fn central_difference(f: impl Fn(f64) -> f64, x: f64) -> f64 {
        let h = central_step(x);
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    pub fn complex_step(f: impl Fn(Complex<f64>) -> Complex<f64>, x: f64) -> f64 {
        f(Complex::new(x, IMAGINARY_PERTURBATION)).im / IMAGINARY_PERTURBATION
    }
}

pub mod scalar_to_tensor {
    use super::*;

    pub fn forward_difference(
        f: impl Fn(f64) -> Matrix3<f64>,
        x: f64,
    ) -> Matrix3<f64> {
        let h = forward_step(x);
        (f(x + h) - f(x)) / h
    }

    pub fn central_difference(
        f: impl Fn(f64) -> Matrix3<f64>,
        x: f64,
    ) -> Matrix3<f64> {
        let h = central_step(x);
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    /// Returns the function value together with its derivative.
    pub fn complex_step(
        f: impl Fn(Complex<f64>) -> Matrix3<Complex<f64>>,
        x: f64,
    ) -> (Matrix3<f64>, Matrix3<f64>) {
        let result = f(Complex::new(x, IMAGINARY_PERTURBATION));
        (
            result.map(|entry| entry.re),
            result.map(|entry| entry.im / IMAGINARY_PERTURBATION),
        )
    }
}

pub mod tensor_to_scalar {
    use super::*;

    pub fn forward_difference(
        f: impl Fn(&Matrix3<f64>) -> f64,
        t: &Matrix3<f64>,
    ) -> Matrix3<f64> {
        let reference = f(t);
        let mut derivative = Matrix3::zeros();
        for (i, j) in iproduct!(0..3, 0..3) {
            let h = forward_step(t[(i, j)]);
            let mut perturbed = *t;
            perturbed[(i, j)] += h;
            derivative[(i, j)] = (f(&perturbed) - reference) / h;
        }
        derivative
    }

    pub fn central_difference(
        f: impl Fn(&Matrix3<f64>) -> f64,
        t: &Matrix3<f64>,
    ) -> Matrix3<f64> {
        let mut derivative = Matrix3::zeros();
        for (i, j) in iproduct!(0..3, 0..3) {
            let h = central_step(t[(i, j)]);
            let mut right = *t;
            let mut left = *t;
            right[(i, j)] += h;
            left[(i, j)] -= h;
            derivative[(i, j)] = (f(&right) - f(&left)) / (2.0 * h);
        }
        derivative
    }

    pub fn complex_step(
        f: impl Fn(&Matrix3<Complex<f64>>) -> Complex<f64>,
        t: &Matrix3<f64>,
    ) -> Matrix3<f64> {
        let mut seeded = t.map(|entry| Complex::new(entry, 0.0));
        let mut derivative = Matrix3::zeros();
        for (i, j) in iproduct!(0..3, 0..3) {
            seeded[(i, j)].im = IMAGINARY_PERTURBATION;
            derivative[(i, j)] = f(&seeded).im / IMAGINARY_PERTURBATION;
            seeded[(i, j)].im = 0.0;
        }
        derivative
    }
}

pub mod tensor_to_tensor {
    use super::*;

    pub fn forward_difference(
        f: impl Fn(&Matrix3<f64>) -> Matrix3<f64>,
        t: &Matrix3<f64>,
    ) -> Tensor4<f64> {
        let reference = f(t);
        let mut derivative = Tensor4::zeros();
        for (k, l) in iproduct!(0..3, 0..3) {
            let h = forward_step(t[(k, l)]);
            let mut perturbed = *t;
            perturbed[(k, l)] += h;
            let value = f(&perturbed);
            for (i, j) in iproduct!(0..3, 0..3) {
                derivative[(i, j, k, l)] = (value[(i, j)] - reference[(i, j)]) / h;
            }
        }
        derivative
    }

    pub fn central_difference(
        f: impl Fn(&Matrix3<f64>) -> Matrix3<f64>,
        t: &Matrix3<f64>,
    ) -> Tensor4<f64> {
        let mut derivative = Tensor4::zeros();
        for (k, l) in iproduct!(0..3, 0..3) {
            let h = central_step(t[(k, l)]);
            let mut right = *t;
            let mut left = *t;
            right[(k, l)] += h;
            left[(k, l)] -= h;
            let forward = f(&right);
            let backward = f(&left);
            for (i, j) in iproduct!(0..3, 0..3) {
                derivative[(i, j, k, l)] = (forward[(i, j)] - backward[(i, j)]) / (2.0 * h);
            }
        }
        derivative
    }

    pub fn complex_step(
        f: impl Fn(&Matrix3<Complex<f64>>) -> Matrix3<Complex<f64>>,
        t: &Matrix3<f64>,
    ) -> Tensor4<f64> {
        let mut seeded = t.map(|entry| Complex::new(entry, 0.0));
        let mut derivative = Tensor4::zeros();
        for (k, l) in iproduct!(0..3, 0..3) {
            seeded[(k, l)].im = IMAGINARY_PERTURBATION;
            let value = f(&seeded);
            for (i, j) in iproduct!(0..3, 0..3) {
                derivative[(i, j, k, l)] = value[(i, j)].im / IMAGINARY_PERTURBATION;
            }
            seeded[(k, l)].im = 0.0;
        }
        derivative
    }
}

/// Jacobians of fixed-size vector-valued maps, used by the finite-difference
/// and complex-step return-mapping variants.
pub mod vector_to_vector {
    use super::*;

    pub fn forward_difference<const N: usize>(
        f: impl Fn(&SVector<f64, N>) -> SVector<f64, N>,
        x: &SVector<f64, N>,
    ) -> SMatrix<f64, N, N> {
        let reference = f(x);
        let mut jacobian = SMatrix::zeros();
        for col in 0..N {
            let h = forward_step(x[col]);
            let mut perturbed = *x;
            perturbed[col] += h;
            let value = f(&perturbed);
            for row in 0..N {
                jacobian[(row, col)] = (value[row] - reference[row]) / h;
            }
        }
        jacobian
    }

    pub fn central_difference<const N: usize>(
        f: impl Fn(&SVector<f64, N>) -> SVector<f64, N>,
        x: &SVector<f64, N>,
    ) -> SMatrix<f64, N, N> {
        let mut jacobian = SMatrix::zeros();
        for col in 0..N {
            let h = central_step(x[col]);
            let mut right = *x;
            let mut left = *x;
            right[col] += h;
            left[col] -= h;
            let forward = f(&right);
            let backward = f(&left);
            for row in 0..N {
                jacobian[(row, col)] = (forward[row] - backward[row]) / (2.0 * h);
            }
        }
        jacobian
    }

    pub fn complex_step<const N: usize>(
        f: impl Fn(&SVector<Complex<f64>, N>) -> SVector<Complex<f64>, N>,
        x: &SVector<f64, N>,
    ) -> SMatrix<f64, N, N> {
        let mut seeded = x.map(|entry| Complex::new(entry, 0.0));
        let mut jacobian = SMatrix::zeros();
        for col in 0..N {
            seeded[col].im = IMAGINARY_PERTURBATION;
            let value = f(&seeded);
            for row in 0..N {
                jacobian[(row, col)] = value[row].im / IMAGINARY_PERTURBATION;
            }
            seeded[col].im = 0.0;
        }
        jacobian
    }
}
