//! The truncated tensor exponential and its analytic first derivative.
//!
//! $\exp(T) = \sum_{k \ge 0} T^k / k!$, accumulated until the Frobenius norm
//! of the newly added term drops below both the absolute tolerance and the
//! relative tolerance times the running sum, or until the hard term cap is
//! reached.

use crate::scalar::SmoothScalar;
use crate::tensor::{real_shadow, Tensor4};
use itertools::iproduct;
use nalgebra::Matrix3;

/// Default hard cap on the number of series terms.
pub const DEFAULT_MAX_TERMS: usize = 15;

/// Default absolute and relative truncation tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-14;

/// Compute $\exp(T)$ by the truncated power series.
///
/// The truncation decision is taken on the real shadow of the accumulating
/// term, so duals, complex numbers and plain reals all truncate after the
/// same number of terms for the same underlying real tensor. This keeps
/// derivative paths consistent with the plain evaluation.
pub fn tensor_exponential<T: SmoothScalar>(
    t: &Matrix3<T>,
    max_terms: usize,
    abs_tol: f64,
    rel_tol: f64,
) -> Matrix3<T> {
    let mut sum: Matrix3<T> = Matrix3::identity();
    let mut term: Matrix3<T> = Matrix3::identity();

    for k in 1..=max_terms {
        term = term * t * T::from_f64(1.0 / k as f64);
        sum += term;

        let term_norm = real_shadow(&term).norm();
        let sum_norm = real_shadow(&sum).norm();
        if term_norm < abs_tol && term_norm < rel_tol * sum_norm {
            break;
        }
    }

    sum
}

/// Compute $\exp(T)$ together with its first derivative
/// $D_{ijkl} = \partial \exp(T)_{ij} / \partial T_{kl}$.
///
/// The derivative is obtained by differentiating the series term by term,
/// $\partial (T^k)_{ij} / \partial T_{pq}
///   = \sum_{m=0}^{k-1} (T^m)_{ip} (T^{k-1-m})_{qj}$,
/// and shares the truncation rule with [`tensor_exponential`].
pub fn tensor_exponential_first_derivative<T: SmoothScalar>(
    t: &Matrix3<T>,
    max_terms: usize,
    abs_tol: f64,
    rel_tol: f64,
) -> (Matrix3<T>, Tensor4<T>) {
    let mut sum: Matrix3<T> = Matrix3::identity();
    let mut derivative = Tensor4::<T>::zeros();

    // powers[m] = T^m
    let mut powers: Vec<Matrix3<T>> = Vec::with_capacity(max_terms + 1);
    powers.push(Matrix3::identity());

    let mut factorial = 1.0;
    for k in 1..=max_terms {
        let next_power = powers[k - 1] * t;
        powers.push(next_power);
        factorial *= k as f64;
        let scale = T::from_f64(1.0 / factorial);

        let term = next_power * scale;
        sum += term;

        for m in 0..k {
            let left = &powers[m];
            let right = &powers[k - 1 - m];
            for (i, j, p, q) in iproduct!(0..3, 0..3, 0..3, 0..3) {
                derivative[(i, j, p, q)] =
                    derivative[(i, j, p, q)] + left[(i, p)] * right[(q, j)] * scale;
            }
        }

        let term_norm = real_shadow(&term).norm();
        let sum_norm = real_shadow(&sum).norm();
        if term_norm < abs_tol && term_norm < rel_tol * sum_norm {
            break;
        }
    }

    (sum, derivative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::det;
    use crate::testing::check_close;
    use matrixcompare::assert_matrix_eq;

    #[test]
    fn exponential_of_zero_is_identity() {
        let result = tensor_exponential(
            &Matrix3::<f64>::zeros(),
            DEFAULT_MAX_TERMS,
            DEFAULT_TOLERANCE,
            DEFAULT_TOLERANCE,
        );
        assert_matrix_eq!(result, Matrix3::identity(), comp = abs, tol = 1e-15);
    }

    #[test]
    fn diagonal_tensor_exponentiates_entrywise() {
        let t = Matrix3::from_diagonal(&nalgebra::Vector3::new(0.1, -0.3, 0.2));
        let result = tensor_exponential(&t, 30, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE);
        for i in 0..3 {
            assert!(check_close(result[(i, i)], t[(i, i)].exp(), 1e-14));
        }
        assert!(result[(0, 1)].abs() < 1e-15 && result[(1, 2)].abs() < 1e-15);
    }

    #[test]
    fn determinant_identity() {
        let t = Matrix3::new(0.1, 0.05, 0.0, -0.02, 0.2, 0.03, 0.01, 0.0, -0.15);
        let result = tensor_exponential(&t, 30, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE);
        assert!(check_close(det(&result), t.trace().exp(), 1e-8));
    }

    #[test]
    fn commuting_arguments_factorize() {
        // polynomials in the same tensor commute
        let a = Matrix3::new(0.1, 0.04, 0.0, 0.04, 0.05, 0.02, 0.0, 0.02, -0.1);
        let b = a * 0.5;
        let lhs = tensor_exponential(&(a + b), 30, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE);
        let rhs = tensor_exponential(&a, 30, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE)
            * tensor_exponential(&b, 30, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE);
        assert_matrix_eq!(lhs, rhs, comp = abs, tol = 1e-12);
    }

    #[test]
    fn derivative_matches_series_truncation() {
        let t = Matrix3::new(0.05, 0.0, 0.0, 0.0, 0.1, 0.1, 0.0, 0.0, 0.1);
        let (value, derivative) =
            tensor_exponential_first_derivative(&t, DEFAULT_MAX_TERMS, 1e-14, 1e-14);
        let plain = tensor_exponential(&t, DEFAULT_MAX_TERMS, 1e-14, 1e-14);
        assert_matrix_eq!(value, plain, comp = abs, tol = 1e-15);

        // directional check against a central difference
        let direction = Matrix3::new(0.3, -0.2, 0.1, 0.0, 0.4, -0.1, 0.2, 0.0, -0.3);
        let h = 1e-6;
        let forward = tensor_exponential(&(t + direction * h), 30, 1e-16, 1e-16);
        let backward = tensor_exponential(&(t - direction * h), 30, 1e-16, 1e-16);
        let expected = (forward - backward) / (2.0 * h);
        let actual = derivative.ddot_rank2(&direction);
        assert_matrix_eq!(actual, expected, comp = abs, tol = 1e-8);
    }
}
