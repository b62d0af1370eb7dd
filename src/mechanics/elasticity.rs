//! Isotropic linear elasticity in Voigt notation.

use nalgebra::Matrix6;

/// The shear modulus $G = \frac{E}{2(1 + \nu)}$.
pub fn shear_modulus(young: f64, poisson: f64) -> f64 {
    young / (2.0 * (1.0 + poisson))
}

/// The bulk modulus $K = \frac{E}{3(1 - 2\nu)}$.
pub fn bulk_modulus(young: f64, poisson: f64) -> f64 {
    young / (3.0 * (1.0 - 2.0 * poisson))
}

/// The isotropic stiffness matrix relating engineering strain to stress.
pub fn isotropic_stiffness(young: f64, poisson: f64) -> Matrix6<f64> {
    let factor = young / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
    let diagonal = factor * (1.0 - poisson);
    let off_diagonal = factor * poisson;
    let shear = shear_modulus(young, poisson);

    let mut stiffness = Matrix6::zeros();
    for i in 0..3 {
        for j in 0..3 {
            stiffness[(i, j)] = if i == j { diagonal } else { off_diagonal };
        }
        stiffness[(3 + i, 3 + i)] = shear;
    }
    stiffness
}

/// The isotropic compliance matrix, inverse of [`isotropic_stiffness`].
pub fn isotropic_compliance(young: f64, poisson: f64) -> Matrix6<f64> {
    let mut compliance = Matrix6::zeros();
    for i in 0..3 {
        for j in 0..3 {
            compliance[(i, j)] = if i == j { 1.0 } else { -poisson } / young;
        }
        compliance[(3 + i, 3 + i)] = 1.0 / shear_modulus(young, poisson);
    }
    compliance
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixcompare::assert_matrix_eq;
    use nalgebra::Matrix6;

    #[test]
    fn stiffness_and_compliance_are_inverse() {
        let stiffness = isotropic_stiffness(210000.0, 0.3);
        let compliance = isotropic_compliance(210000.0, 0.3);
        assert_matrix_eq!(
            stiffness * compliance,
            Matrix6::identity(),
            comp = abs,
            tol = 1e-12
        );
    }

    #[test]
    fn uniaxial_stress_recovers_youngs_modulus() {
        let young = 210000.0;
        let compliance = isotropic_compliance(young, 0.3);
        let stress = nalgebra::Vector6::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let strain = compliance * stress;
        assert!((strain[0] - 1.0 / young).abs() < 1e-18);
        assert!((strain[1] + 0.3 / young).abs() < 1e-18);
    }

    #[test]
    fn moduli_conversions() {
        assert!((shear_modulus(210000.0, 0.3) - 80769.23076923077).abs() < 1e-8);
        assert!((bulk_modulus(210000.0, 0.3) - 175000.0).abs() < 1e-9);
    }
}
