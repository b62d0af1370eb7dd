//! Hyperelastic strain energy densities after Pence & Gou (2015).
//!
//! All potentials are functions of the right Cauchy-Green tensor
//! $\boldsymbol C$ with $J = \sqrt{\det \boldsymbol C}$ and
//! $I_1 = \operatorname{tr} \boldsymbol C$, parameterised by the bulk
//! modulus $K$ and shear modulus $G$:
//!
//! | Variant | $\Psi(\boldsymbol C; K, G)$ |
//! |---------|-----------------------------|
//! | A | $\frac{G}{2}(I_1 - 3) + (\frac{K}{2} - \frac{G}{3})(J - 1)^2 - G \ln J$ |
//! | B | $\frac{K}{8}(J - J^{-1})^2 + \frac{G}{2}(I_1 J^{-2/3} - 3)$ |
//! | C | $\frac{G}{2}(I_1 - 3) + \frac{3 G^2}{3K - 2G}(J^{2/3 - K/G} - 1)$ |
//!
//! Variant B carries analytic first and second derivatives (it backs the
//! finite-strain J2 core); variants A and C obtain their derivatives through
//! the automatic differentiation drivers.

use crate::autodiff;
use crate::dual::Dual2;
use crate::scalar::SmoothScalar;
use crate::tensor::{det, try_inv, Tensor4};
use nalgebra::Matrix3;

/// Pence-Gou potential A.
#[allow(non_snake_case)]
pub fn pence_gou_a<T: SmoothScalar>(C: &Matrix3<T>, K: f64, G: f64) -> T {
    let J = det(C).sqrt();
    let I1 = C.trace();
    (I1 - T::from_f64(3.0)) * T::from_f64(G / 2.0)
        + (J - T::one()).powi(2) * T::from_f64(K / 2.0 - G / 3.0)
        - J.ln() * T::from_f64(G)
}

/// Pence-Gou potential B.
#[allow(non_snake_case)]
pub fn pence_gou_b<T: SmoothScalar>(C: &Matrix3<T>, K: f64, G: f64) -> T {
    let J = det(C).sqrt();
    let I1 = C.trace();
    (J - J.recip()).powi(2) * T::from_f64(K / 8.0)
        + (I1 * J.powf(-2.0 / 3.0) - T::from_f64(3.0)) * T::from_f64(G / 2.0)
}

/// Pence-Gou potential C.
#[allow(non_snake_case)]
pub fn pence_gou_c<T: SmoothScalar>(C: &Matrix3<T>, K: f64, G: f64) -> T {
    let J = det(C).sqrt();
    let I1 = C.trace();
    (I1 - T::from_f64(3.0)) * T::from_f64(G / 2.0)
        + (J.powf(2.0 / 3.0 - K / G) - T::one()) * T::from_f64(3.0 * G * G / (3.0 * K - 2.0 * G))
}

/// Pence-Gou potential B with its analytic first derivative
/// $\partial \Psi / \partial \boldsymbol C$.
///
/// Generic over the scalar so that the same code path serves plain, dual and
/// complex evaluations. Returns `None` for singular $\boldsymbol C$.
#[allow(non_snake_case)]
pub fn pence_gou_b_first_derivative<T: SmoothScalar>(
    C: &Matrix3<T>,
    K: f64,
    G: f64,
) -> Option<(T, Matrix3<T>)> {
    let J = det(C).sqrt();
    let I1 = C.trace();

    let psi = (J - J.recip()).powi(2) * T::from_f64(K / 8.0)
        + (I1 * J.powf(-2.0 / 3.0) - T::from_f64(3.0)) * T::from_f64(G / 2.0);

    let dPsi_dJ = (J - J.recip()) * (T::one() + (J * J).recip()) * T::from_f64(K / 4.0)
        - I1 * J.powf(-5.0 / 3.0) * T::from_f64(G / 3.0);
    let dPsi_dI1 = J.powf(-2.0 / 3.0) * T::from_f64(G / 2.0);

    let C_inv = try_inv(C)?;
    let dJ_dC = C_inv.transpose() * (J * T::from_f64(0.5));
    let mut dPsi_dC = dJ_dC * dPsi_dJ;
    for i in 0..3 {
        dPsi_dC[(i, i)] = dPsi_dC[(i, i)] + dPsi_dI1;
    }

    Some((psi, dPsi_dC))
}

/// Pence-Gou potential B with analytic first and second derivatives.
#[allow(non_snake_case)]
pub fn pence_gou_b_second_derivative(
    C: &Matrix3<f64>,
    K: f64,
    G: f64,
) -> Option<(f64, Matrix3<f64>, Tensor4<f64>)> {
    let (psi, dPsi_dC) = pence_gou_b_first_derivative(C, K, G)?;

    let J = det(C).sqrt();
    let I1 = C.trace();
    let C_inv = try_inv(C)?;
    let dJ_dC = C_inv.transpose() * (J / 2.0);

    let dPsi_dJ =
        K / 4.0 * (J - 1.0 / J) * (1.0 + 1.0 / (J * J)) - G / 3.0 * I1 * J.powf(-5.0 / 3.0);
    let d2Psi_dJdJ = K / 4.0 * (1.0 + 3.0 / J.powi(4)) + 5.0 / 9.0 * G * I1 * J.powf(-8.0 / 3.0);
    let d2Psi_dJdI1 = -G / 3.0 * J.powf(-5.0 / 3.0);

    let d2J_dCdC = Tensor4::from_fn(|i, j, k, l| {
        J / 4.0 * C_inv[(j, i)] * C_inv[(l, k)] - J / 2.0 * C_inv[(j, k)] * C_inv[(l, i)]
    });

    let identity = Matrix3::identity();
    let d2Psi_dCdC = Tensor4::dyad(&dJ_dC, &dJ_dC) * d2Psi_dJdJ
        + d2J_dCdC * dPsi_dJ
        + (Tensor4::dyad(&dJ_dC, &identity) + Tensor4::dyad(&identity, &dJ_dC)) * d2Psi_dJdI1;

    Some((psi, dPsi_dC, d2Psi_dCdC))
}

/// First and second derivatives of potential A through the AD drivers.
#[allow(non_snake_case)]
pub fn pence_gou_a_second_derivative(
    C: &Matrix3<f64>,
    K: f64,
    G: f64,
) -> (f64, Matrix3<f64>, Tensor4<f64>) {
    autodiff::hessian(|C: &Matrix3<Dual2>| pence_gou_a(C, K, G), C)
}

/// First and second derivatives of potential C through the AD drivers.
#[allow(non_snake_case)]
pub fn pence_gou_c_second_derivative(
    C: &Matrix3<f64>,
    K: f64,
    G: f64,
) -> (f64, Matrix3<f64>, Tensor4<f64>) {
    autodiff::hessian(|C: &Matrix3<Dual2>| pence_gou_c(C, K, G), C)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check_close;
    use itertools::iproduct;
    use matrixcompare::assert_matrix_eq;

    // a deformed configuration with J = 2 and I1 = 5.25 in closed form
    #[allow(non_snake_case)]
    fn reference_C() -> Matrix3<f64> {
        Matrix3::new(1.25, 0.5, 0.5, 0.5, 2.0, 0.0, 0.5, 0.0, 2.0)
    }

    const K: f64 = 10000.0;
    const G: f64 = 1000.0;

    #[test]
    fn potential_values_at_reference_configuration() {
        let c = reference_C();
        assert!(check_close(pence_gou_a(&c, K, G), 5098.519486106722, 1e-13));
        assert!(check_close(pence_gou_b(&c, K, G), 2966.146377987021, 1e-13));
        assert!(check_close(pence_gou_c(&c, K, G), 1018.0232353221228, 1e-13));
    }

    #[test]
    fn potentials_vanish_at_undeformed_configuration() {
        let identity = Matrix3::<f64>::identity();
        assert!(pence_gou_a(&identity, K, G).abs() < 1e-12);
        assert!(pence_gou_b(&identity, K, G).abs() < 1e-12);
        assert!(pence_gou_c(&identity, K, G).abs() < 1e-12);
    }

    #[test]
    fn potential_b_is_stress_free_at_identity() {
        let (psi, d_psi) = pence_gou_b_first_derivative(&Matrix3::<f64>::identity(), K, G).unwrap();
        assert!(psi.abs() < 1e-12);
        assert_matrix_eq!(d_psi, Matrix3::zeros(), comp = abs, tol = 1e-12);
    }

    #[test]
    fn potential_b_first_derivative_closed_form() {
        let c = reference_C();
        let c_inv = try_inv(&c).unwrap();
        let (j, i1) = (2.0f64, 5.25);
        let (_, d_psi) = pence_gou_b_first_derivative(&c, K, G).unwrap();
        let dw_di1 = G / 2.0 * j.powf(-2.0 / 3.0);
        let dw_dj = K / 4.0 * (j - j.powi(-3)) - G * i1 / 3.0 * j.powf(-5.0 / 3.0);
        for (row, col) in iproduct!(0..3, 0..3) {
            let expected =
                dw_di1 * ((row == col) as u8 as f64) + dw_dj * j / 2.0 * c_inv[(row, col)];
            assert!(check_close(d_psi[(row, col)], expected, 1e-12));
        }
    }

    #[test]
    fn potential_b_derivatives_agree_with_automatic_differentiation() {
        let c = reference_C();
        let (psi, grad, hess) = pence_gou_b_second_derivative(&c, K, G).unwrap();
        let (psi_ad, grad_ad, hess_ad) =
            autodiff::hessian(|c: &Matrix3<Dual2>| pence_gou_b(c, K, G), &c);
        assert!(check_close(psi, psi_ad, 1e-12));
        assert_matrix_eq!(grad, grad_ad, comp = abs, tol = 1e-10);
        for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            assert!(check_close(hess[(i, j, k, l)], hess_ad[(i, j, k, l)], 1e-9));
        }
    }

    #[test]
    fn potential_a_derivatives_match_numerical_differentiation() {
        let c = reference_C();
        let (_, grad, _) = pence_gou_a_second_derivative(&c, K, G);
        let numeric = crate::numdiff::tensor_to_scalar::complex_step(|c| pence_gou_a(c, K, G), &c);
        assert_matrix_eq!(grad, numeric, comp = abs, tol = 1e-9);
    }

    #[test]
    fn potential_c_derivatives_match_numerical_differentiation() {
        let c = reference_C();
        let (_, grad, _) = pence_gou_c_second_derivative(&c, K, G);
        let numeric = crate::numdiff::tensor_to_scalar::complex_step(|c| pence_gou_c(c, K, G), &c);
        assert_matrix_eq!(grad, numeric, comp = abs, tol = 1e-9);
    }
}
