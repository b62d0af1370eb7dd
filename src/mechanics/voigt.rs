//! Voigt notation for symmetric second-rank tensors.
//!
//! Six-vectors encode symmetric tensors in the component order
//! $(T_{11}, T_{22}, T_{33}, T_{12}, T_{13}, T_{23})$. Stress vectors carry
//! the tensor components verbatim; strain vectors carry engineering shear
//! components (twice the tensor shear). The projectors
//! $P = (1,1,1,2,2,2)$ and $P^{-1}$ convert between the raw and engineering
//! forms.

use crate::tensor::Tensor4;
use itertools::iproduct;
use nalgebra::{Matrix3, Matrix6, Vector6};

/// The index pairs backing each Voigt slot.
pub const VOIGT_PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];

/// The projector $P = (1,1,1,2,2,2)$ from tensorial to engineering shear
/// components.
pub fn engineering_projector() -> Vector6<f64> {
    Vector6::new(1.0, 1.0, 1.0, 2.0, 2.0, 2.0)
}

/// The inverse projector $P^{-1} = (1,1,1,\frac12,\frac12,\frac12)$.
pub fn engineering_projector_inverse() -> Vector6<f64> {
    Vector6::new(1.0, 1.0, 1.0, 0.5, 0.5, 0.5)
}

/// Encode a symmetric stress tensor as a Voigt 6-vector.
pub fn stress_to_voigt(stress: &Matrix3<f64>) -> Vector6<f64> {
    Vector6::from_fn(|slot, _| {
        let (i, j) = VOIGT_PAIRS[slot];
        stress[(i, j)]
    })
}

/// Decode a Voigt stress 6-vector into the symmetric tensor.
pub fn stress_from_voigt(stress: &Vector6<f64>) -> Matrix3<f64> {
    let mut tensor = Matrix3::zeros();
    for (slot, &(i, j)) in VOIGT_PAIRS.iter().enumerate() {
        tensor[(i, j)] = stress[slot];
        tensor[(j, i)] = stress[slot];
    }
    tensor
}

/// Encode a symmetric strain tensor as an engineering Voigt 6-vector
/// (shear components doubled).
pub fn strain_to_voigt(strain: &Matrix3<f64>) -> Vector6<f64> {
    Vector6::from_fn(|slot, _| {
        let (i, j) = VOIGT_PAIRS[slot];
        if i == j {
            strain[(i, j)]
        } else {
            2.0 * strain[(i, j)]
        }
    })
}

/// Decode an engineering Voigt strain 6-vector into the symmetric tensor.
pub fn strain_from_voigt(strain: &Vector6<f64>) -> Matrix3<f64> {
    let mut tensor = Matrix3::zeros();
    for (slot, &(i, j)) in VOIGT_PAIRS.iter().enumerate() {
        let value = if i == j { strain[slot] } else { 0.5 * strain[slot] };
        tensor[(i, j)] = value;
        tensor[(j, i)] = value;
    }
    tensor
}

/// Rotate a Voigt stress into the frame spanned by the rows of `rotation`:
/// $\sigma' = Q \sigma Q^\top$.
pub fn rotate_stress(stress: &Vector6<f64>, rotation: &Matrix3<f64>) -> Vector6<f64> {
    let tensor = stress_from_voigt(stress);
    stress_to_voigt(&(rotation * tensor * rotation.transpose()))
}

/// Rotate an engineering Voigt strain into the frame spanned by the rows of
/// `rotation`.
pub fn rotate_strain(strain: &Vector6<f64>, rotation: &Matrix3<f64>) -> Vector6<f64> {
    let tensor = strain_from_voigt(strain);
    strain_to_voigt(&(rotation * tensor * rotation.transpose()))
}

/// Expand a Voigt stiffness (engineering-strain convention) to its rank-4
/// tensor with full minor symmetry.
pub fn stiffness_to_tensor(stiffness: &Matrix6<f64>) -> Tensor4<f64> {
    let mut tensor = Tensor4::zeros();
    for (row, &(i, j)) in VOIGT_PAIRS.iter().enumerate() {
        for (col, &(k, l)) in VOIGT_PAIRS.iter().enumerate() {
            let value = stiffness[(row, col)];
            tensor[(i, j, k, l)] = value;
            tensor[(j, i, k, l)] = value;
            tensor[(i, j, l, k)] = value;
            tensor[(j, i, l, k)] = value;
        }
    }
    tensor
}

/// Contract a minor-symmetric rank-4 stiffness back to Voigt form.
pub fn stiffness_from_tensor(tensor: &Tensor4<f64>) -> Matrix6<f64> {
    Matrix6::from_fn(|row, col| {
        let (i, j) = VOIGT_PAIRS[row];
        let (k, l) = VOIGT_PAIRS[col];
        tensor[(i, j, k, l)]
    })
}

/// Rotate a Voigt stiffness into the frame spanned by the rows of
/// `rotation`: $C'_{ijkl} = Q_{ip} Q_{jq} Q_{kr} Q_{ls} C_{pqrs}$.
pub fn rotate_stiffness(stiffness: &Matrix6<f64>, rotation: &Matrix3<f64>) -> Matrix6<f64> {
    let tensor = stiffness_to_tensor(stiffness);
    let mut rotated = Tensor4::zeros();
    for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
        let mut sum = 0.0;
        for (p, q, r, s) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            sum += rotation[(i, p)]
                * rotation[(j, q)]
                * rotation[(k, r)]
                * rotation[(l, s)]
                * tensor[(p, q, r, s)];
        }
        rotated[(i, j, k, l)] = sum;
    }
    stiffness_from_tensor(&rotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanics::elasticity::isotropic_stiffness;
    use matrixcompare::assert_matrix_eq;
    use nalgebra::{Rotation3, Vector3};

    #[test]
    fn stress_roundtrip() {
        let stress = Vector6::new(10.0, 20.0, 30.0, 4.0, 5.0, 6.0);
        assert_matrix_eq!(
            stress_to_voigt(&stress_from_voigt(&stress)),
            stress,
            comp = abs,
            tol = 1e-15
        );
    }

    #[test]
    fn strain_roundtrip_applies_engineering_factors() {
        let strain = Vector6::new(0.01, -0.02, 0.03, 0.004, 0.005, 0.006);
        let tensor = strain_from_voigt(&strain);
        assert!((tensor[(0, 1)] - 0.002).abs() < 1e-15);
        assert_matrix_eq!(
            strain_to_voigt(&tensor),
            strain,
            comp = abs,
            tol = 1e-15
        );
    }

    #[test]
    fn projectors_are_mutually_inverse() {
        let product = engineering_projector().component_mul(&engineering_projector_inverse());
        assert_matrix_eq!(product, Vector6::repeat(1.0), comp = abs, tol = 1e-15);
    }

    #[test]
    fn isotropic_stiffness_is_rotation_invariant() {
        let stiffness = isotropic_stiffness(210000.0, 0.3);
        let rotation =
            Rotation3::from_axis_angle(&Vector3::z_axis(), 0.7).matrix().clone_owned();
        let rotated = rotate_stiffness(&stiffness, &rotation);
        assert_matrix_eq!(rotated, stiffness, comp = abs, tol = 1e-8);
    }

    #[test]
    fn stress_rotation_matches_tensor_rotation() {
        let rotation =
            Rotation3::from_axis_angle(&Vector3::x_axis(), -0.4).matrix().clone_owned();
        let stress = Vector6::new(100.0, -20.0, 35.0, 12.0, 0.0, -7.0);
        let direct = rotate_stress(&stress, &rotation);
        let tensor = rotation * stress_from_voigt(&stress) * rotation.transpose();
        assert_matrix_eq!(stress_from_voigt(&direct), tensor, comp = abs, tol = 1e-12);
    }

    #[test]
    fn stiffness_rotation_is_consistent_with_componentwise_rotation() {
        // rotating stress and strain separately must match the rotated stiffness
        let stiffness = isotropic_stiffness(70000.0, 0.25);
        let rotation =
            Rotation3::from_axis_angle(&Vector3::y_axis(), 1.1).matrix().clone_owned();
        let strain = Vector6::new(0.001, 0.0, -0.0005, 0.002, 0.0, 0.0004);
        let rotated_strain = rotate_strain(&strain, &rotation);
        let lhs = rotate_stiffness(&stiffness, &rotation) * rotated_strain;
        let rhs = rotate_stress(&(stiffness * strain), &rotation);
        assert_matrix_eq!(lhs, rhs, comp = abs, tol = 1e-8);
    }
}
