//! Stress measures and their derivatives.

use crate::scalar::SmoothScalar;
use crate::tensor::Tensor4;
use nalgebra::Matrix3;

/// The Kirchhoff stress from the second Piola-Kirchhoff stress,
/// $\boldsymbol\tau = \boldsymbol F \boldsymbol S \boldsymbol F^\top$.
#[allow(non_snake_case)]
pub fn kirchhoff_stress_from_pk2<T: SmoothScalar>(
    pk2: &Matrix3<T>,
    F: &Matrix3<T>,
) -> Matrix3<T> {
    F * pk2 * F.transpose()
}

/// The Kirchhoff stress together with
/// $\partial \tau_{ij} / \partial S_{KL} = F_{iK} F_{jL}$ and the partial
/// derivative with respect to the deformation gradient at fixed
/// $\boldsymbol S$,
/// $\partial \tau_{ij} / \partial F_{kK}
///   = \delta_{ik} (\boldsymbol F \boldsymbol S^\top)_{jK}
///   + \delta_{jk} (\boldsymbol F \boldsymbol S)_{iK}$.
#[allow(non_snake_case)]
pub fn kirchhoff_stress_first_derivative(
    pk2: &Matrix3<f64>,
    F: &Matrix3<f64>,
) -> (Matrix3<f64>, Tensor4<f64>, Tensor4<f64>) {
    let tau = kirchhoff_stress_from_pk2(pk2, F);

    let dTau_dPK2 = Tensor4::from_fn(|i, j, k, l| F[(i, k)] * F[(j, l)]);

    let F_St = F * pk2.transpose();
    let F_S = F * pk2;
    let dTau_dF = Tensor4::from_fn(|i, j, k, l| {
        let mut entry = 0.0;
        if i == k {
            entry += F_St[(j, l)];
        }
        if j == k {
            entry += F_S[(i, l)];
        }
        entry
    });

    (tau, dTau_dPK2, dTau_dF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numdiff::tensor_to_tensor;
    use crate::testing::check_close;
    use itertools::iproduct;
    use matrixcompare::assert_matrix_eq;

    #[allow(non_snake_case)]
    fn sample() -> (Matrix3<f64>, Matrix3<f64>) {
        let pk2 = Matrix3::new(120.0, 15.0, -4.0, 15.0, 80.0, 9.0, -4.0, 9.0, 60.0);
        let F = Matrix3::new(1.1, 0.08, -0.02, 0.05, 0.95, 0.1, 0.0, -0.04, 1.05);
        (pk2, F)
    }

    #[test]
    fn symmetric_pk2_gives_symmetric_kirchhoff_stress() {
        let (pk2, f) = sample();
        let tau = kirchhoff_stress_from_pk2(&pk2, &f);
        assert_matrix_eq!(tau, tau.transpose(), comp = abs, tol = 1e-12);
    }

    #[test]
    fn derivative_wrt_pk2_matches_finite_differences() {
        let (pk2, f) = sample();
        let (_, dtau_dpk2, _) = kirchhoff_stress_first_derivative(&pk2, &f);
        let numeric =
            tensor_to_tensor::central_difference(|s| kirchhoff_stress_from_pk2(s, &f), &pk2);
        for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            assert!(check_close(dtau_dpk2[(i, j, k, l)], numeric[(i, j, k, l)], 1e-7));
        }
    }

    #[test]
    fn partial_derivative_wrt_deformation_matches_finite_differences() {
        let (pk2, f) = sample();
        let (_, _, dtau_df) = kirchhoff_stress_first_derivative(&pk2, &f);
        let numeric =
            tensor_to_tensor::central_difference(|f| kirchhoff_stress_from_pk2(&pk2, f), &f);
        for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            assert!(check_close(dtau_df[(i, j, k, l)], numeric[(i, j, k, l)], 1e-6));
        }
    }
}
