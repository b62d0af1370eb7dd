//! Deformation measures and their derivatives with respect to the
//! deformation gradient.

use crate::scalar::SmoothScalar;
use crate::tensor::{try_inv, Tensor3, Tensor4};
use nalgebra::{Matrix3, Vector3};

/// The right Cauchy-Green tensor $\boldsymbol C = \boldsymbol F^\top \boldsymbol F$.
#[allow(non_snake_case)]
pub fn right_cauchy_green<T: SmoothScalar>(F: &Matrix3<T>) -> Matrix3<T> {
    F.transpose() * F
}

/// The left Cauchy-Green tensor $\boldsymbol b = \boldsymbol F \boldsymbol F^\top$.
#[allow(non_snake_case)]
pub fn left_cauchy_green<T: SmoothScalar>(F: &Matrix3<T>) -> Matrix3<T> {
    F * F.transpose()
}

/// The right Cauchy-Green tensor together with its derivative
/// $\partial C_{IJ} / \partial F_{kK} = \delta_{IK} F_{kJ} + F_{kI} \delta_{JK}$.
#[allow(non_snake_case)]
pub fn right_cauchy_green_first_derivative<T: SmoothScalar>(
    F: &Matrix3<T>,
) -> (Matrix3<T>, Tensor4<T>) {
    let C = right_cauchy_green(F);
    let dC_dF = Tensor4::from_fn(|i, j, k, l| {
        let mut entry = T::zero();
        if i == l {
            entry = entry + F[(k, j)];
        }
        if j == l {
            entry = entry + F[(k, i)];
        }
        entry
    });
    (C, dC_dF)
}

/// The left Cauchy-Green tensor together with its derivative
/// $\partial b_{ij} / \partial F_{kK} = \delta_{ik} F_{jK} + F_{iK} \delta_{jk}$.
#[allow(non_snake_case)]
pub fn left_cauchy_green_first_derivative<T: SmoothScalar>(
    F: &Matrix3<T>,
) -> (Matrix3<T>, Tensor4<T>) {
    let b = left_cauchy_green(F);
    let db_dF = Tensor4::from_fn(|i, j, k, l| {
        let mut entry = T::zero();
        if i == k {
            entry = entry + F[(j, l)];
        }
        if j == k {
            entry = entry + F[(i, l)];
        }
        entry
    });
    (b, db_dF)
}

/// The inverse deformation gradient and its derivative
/// $\partial F^{-1}_{iK} / \partial F_{jL} = -F^{-1}_{iL} F^{-1}_{jK}$.
///
/// Returns `None` for a singular deformation gradient.
#[allow(non_snake_case)]
pub fn inverse_deformation_gradient(
    F: &Matrix3<f64>,
) -> Option<(Matrix3<f64>, Tensor4<f64>)> {
    let F_inv = try_inv(F)?;
    let dFinv_dF = Tensor4::from_fn(|i, j, k, l| -F_inv[(i, k)] * F_inv[(l, j)]);
    Some((F_inv, dFinv_dF))
}

/// The deformed unit normal obtained by pushing a reference surface vector
/// $\boldsymbol N \, \mathrm dA_0$ through the inverse deformation gradient,
/// together with its derivative with respect to $\boldsymbol F^{-1}$.
#[allow(non_snake_case)]
pub fn deformed_normal_vector(
    F_inv: &Matrix3<f64>,
    reference_surface_vector: &Vector3<f64>,
) -> Option<(Vector3<f64>, Tensor3<f64>)> {
    let N = reference_surface_vector;
    let det_j = 1.0 / crate::tensor::det(F_inv);
    let dDetJ_dFinv = try_inv(F_inv)?.transpose() * (-det_j * det_j);

    // Nanson's relation scaled by the deformed area
    let n_tilde = F_inv.transpose() * N;
    let dNtilde_dFinv = Tensor3::from_fn(|i, j, k| if i == k { N[j] } else { 0.0 });

    let n_times_da = n_tilde * det_j;
    let dn_times_da_dFinv = Tensor3::from_fn(|i, j, k| {
        n_tilde[i] * dDetJ_dFinv[(j, k)] + det_j * dNtilde_dFinv[(i, j, k)]
    });

    let area = n_times_da.norm();
    let n = n_times_da / area;
    let dn_dn_times_da = (Matrix3::identity() - n * n.transpose()) / area;

    let dn_dFinv = Tensor3::from_fn(|i, j, k| {
        (0..3)
            .map(|m| dn_dn_times_da[(i, m)] * dn_times_da_dFinv[(m, j, k)])
            .sum()
    });

    Some((n, dn_dFinv))
}

/// The deformed normal projection $n_i n_j$ and its derivative with respect
/// to $\boldsymbol F^{-1}$.
#[allow(non_snake_case)]
pub fn deformed_normal_projection(
    F_inv: &Matrix3<f64>,
    reference_surface_vector: &Vector3<f64>,
) -> Option<(Matrix3<f64>, Tensor4<f64>)> {
    let (n, dn_dFinv) = deformed_normal_vector(F_inv, reference_surface_vector)?;
    let projection = n * n.transpose();
    let derivative = Tensor4::from_fn(|i, j, k, l| {
        n[i] * dn_dFinv[(j, k, l)] + n[j] * dn_dFinv[(i, k, l)]
    });
    Some((projection, derivative))
}
