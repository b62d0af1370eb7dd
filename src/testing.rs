//! Verification utilities: tolerance-aware comparisons, the Fibonacci
//! orientation lattice and the rotational-invariance harness
//! ("Turbokreisel") for material-point solvers.

use crate::constants::GOLDEN_ANGLE;
use crate::material::SmallStrainMaterial;
use crate::mechanics::voigt;
use crate::solver::small_strain::SmallStrainSolver;
use crate::tensor::Tensor4;
use eyre::{bail, eyre};
use itertools::iproduct;
use nalgebra::storage::Storage;
use nalgebra::{Dim, Matrix, Matrix3, Rotation3, Vector3};
use rayon::prelude::*;

/// Compare two scalars: relative for magnitudes above one, absolute below;
/// NaN and infinity always fail.
pub fn check_close(a: f64, b: f64, tol: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() / a.abs().max(1.0) <= tol
}

/// Component-wise [`check_close`] over two equally shaped matrices.
pub fn check_matrices_close<R, C, S1, S2>(
    a: &Matrix<f64, R, C, S1>,
    b: &Matrix<f64, R, C, S2>,
    tol: f64,
) -> bool
where
    R: Dim,
    C: Dim,
    S1: Storage<f64, R, C>,
    S2: Storage<f64, R, C>,
{
    a.iter().zip(b.iter()).all(|(&x, &y)| check_close(x, y, tol))
}

/// Component-wise [`check_close`] over two rank-4 tensors.
pub fn check_tensors_close(a: &Tensor4<f64>, b: &Tensor4<f64>, tol: f64) -> bool {
    iproduct!(0..3, 0..3, 0..3, 0..3)
        .all(|(i, j, k, l)| check_close(a[(i, j, k, l)], b[(i, j, k, l)], tol))
}

/// The Frobenius-relative distance $\lVert A - B \rVert_F / \lVert B \rVert_F$
/// between two rank-4 tensors.
pub fn frobenius_relative_error(a: &Tensor4<f64>, b: &Tensor4<f64>) -> f64 {
    let mut difference = 0.0;
    let mut reference = 0.0;
    for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
        difference += (a[(i, j, k, l)] - b[(i, j, k, l)]).powi(2);
        reference += b[(i, j, k, l)].powi(2);
    }
    (difference / reference).sqrt()
}

/// The Fibonacci lattice on the hemisphere: `count` orientations
/// $(\varphi_i, \theta_i)$ with $\theta_i = \arccos(-(i-1)/N)$ and
/// $\varphi_i = (i-1)\,\varphi_g$, $\varphi_g$ the golden angle.
pub fn fibonacci_lattice_hemisphere(count: usize) -> Vec<(f64, f64)> {
    (1..=count)
        .map(|i| {
            let theta = (-((i - 1) as f64) / count as f64).acos();
            let phi = (i - 1) as f64 * GOLDEN_ANGLE;
            (phi, theta)
        })
        .collect()
}

/// The orthonormal frame of a lattice orientation: rows are the rotated base
/// vectors.
pub fn rotation_from_spherical(phi: f64, theta: f64) -> Matrix3<f64> {
    let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), theta)
        * Rotation3::from_axis_angle(&Vector3::y_axis(), phi);
    rotation.matrix().transpose()
}

/// Rotational-invariance harness for small-strain materials.
///
/// Solves the configured, fully strain-controlled steps once in the
/// reference frame, then sweeps at least 100 lattice orientations: for each
/// orientation the steps are rebuilt with rotated strain targets, solved
/// from the same initial state, and the resulting stress and tangent are
/// rotated back and compared against the reference. Any diverging
/// orientation fails the material as frame dependent.
///
/// Orientations are independent material-point solves and run in parallel.
pub fn spin_turbokreisel<M>(
    solver: &SmallStrainSolver<M>,
    stress_tol: f64,
    stiffness_tol: f64,
) -> eyre::Result<()>
where
    M: SmallStrainMaterial + Clone + Send + Sync,
{
    let steps = solver.steps().to_vec();
    if steps.is_empty() {
        bail!("the turbokreisel requires at least one step");
    }
    for step in &steps {
        if !step.strain_controlled.iter().all(|&controlled| controlled) {
            bail!("the turbokreisel requires fully strain-controlled steps");
        }
    }

    let mut reference = solver.clone();
    reference.reset_to_initial_state();
    reference.solve()?;
    let reference_entry = reference
        .history()
        .last()
        .ok_or_else(|| eyre!("reference solve produced no history"))?
        .clone();

    let orientations = fibonacci_lattice_hemisphere(100);
    orientations
        .par_iter()
        .enumerate()
        .try_for_each(|(index, &(phi, theta))| -> eyre::Result<()> {
            let frame = rotation_from_spherical(phi, theta);

            let mut rotated = solver.clone();
            rotated.reset_to_initial_state();
            rotated.clear_steps();
            for step in &steps {
                let mut rotated_step = step.clone();
                rotated_step.strain_increment =
                    voigt::rotate_strain(&step.strain_increment, &frame);
                rotated.add_step(rotated_step)?;
            }
            rotated.solve()?;

            let entry = rotated
                .history()
                .last()
                .ok_or_else(|| eyre!("rotated solve produced no history"))?;

            let stress_back = voigt::rotate_stress(&entry.stress, &frame.transpose());
            if !check_matrices_close(&stress_back, &reference_entry.stress, stress_tol) {
                bail!(
                    "turbokreisel stress check failed for orientation {index} \
                     (phi = {phi}, theta = {theta})"
                );
            }

            let stiffness_back = voigt::rotate_stiffness(&entry.tangent, &frame.transpose());
            if !check_matrices_close(&stiffness_back, &reference_entry.tangent, stiffness_tol) {
                bail!(
                    "turbokreisel tangent check failed for orientation {index} \
                     (phi = {phi}, theta = {theta})"
                );
            }
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_close_is_relative_above_one() {
        assert!(check_close(1000.0, 1000.0 + 1e-8, 1e-10));
        assert!(!check_close(1.0, 1.0 + 1e-8, 1e-10));
        assert!(!check_close(f64::NAN, 0.0, 1.0));
        assert!(!check_close(f64::INFINITY, f64::INFINITY, 1.0));
    }

    #[test]
    fn lattice_covers_the_hemisphere() {
        let lattice = fibonacci_lattice_hemisphere(100);
        assert_eq!(lattice.len(), 100);
        // theta starts at the equator and sweeps towards the antipode
        assert!((lattice[0].1 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(lattice.iter().all(|&(_, theta)| {
            theta >= std::f64::consts::FRAC_PI_2 - 1e-12 && theta <= std::f64::consts::PI
        }));
    }

    #[test]
    fn lattice_frames_are_orthonormal() {
        use approx::assert_relative_eq;
        for &(phi, theta) in fibonacci_lattice_hemisphere(25).iter() {
            let frame = rotation_from_spherical(phi, theta);
            let gram = frame * frame.transpose();
            assert!(check_matrices_close(&gram, &Matrix3::identity(), 1e-13));
            assert_relative_eq!(frame.determinant(), 1.0, epsilon = 1e-12);
        }
    }
}
