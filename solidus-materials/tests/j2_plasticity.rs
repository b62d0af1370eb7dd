//! End-to-end verification of the finite-strain J2 plasticity model against
//! reference solutions, across all four tangent-evaluation variants.

use itertools::iproduct;
use nalgebra::Matrix3;
use solidus::material::{FiniteStrainMaterial, TimeIncrement};
use solidus::tensor::Tensor4;
use solidus::testing::{check_close, check_matrices_close, frobenius_relative_error};
use solidus_materials::{FiniteStrainJ2Plasticity, TangentMethod};

const METHODS: [TangentMethod; 4] = [
    TangentMethod::Analytic,
    TangentMethod::ForwardDifference,
    TangentMethod::CentralDifference,
    TangentMethod::ComplexStep,
];

fn material(method: TangentMethod) -> FiniteStrainJ2Plasticity {
    // K, G, fy, fyInf, eta, H, selector
    let selector = match method {
        TangentMethod::Analytic => 1.0,
        TangentMethod::ForwardDifference => 2.0,
        TangentMethod::CentralDifference => 3.0,
        TangentMethod::ComplexStep => 4.0,
    };
    FiniteStrainJ2Plasticity::from_properties(&[
        175000.0, 80800.0, 260.0, 580.0, 9.0, 70.0, selector,
    ])
    .unwrap()
}

fn time() -> TimeIncrement {
    TimeIncrement { time: 0.0, dt: 0.1 }
}

struct Solution {
    stress: Matrix3<f64>,
    tangent: Tensor4<f64>,
    plastic_gradient: Matrix3<f64>,
    alpha_p: f64,
}

fn solve(method: TangentMethod, deformation_gradient: &Matrix3<f64>) -> Solution {
    let material = material(method);
    let mut state = vec![0.0; material.num_state_vars()];
    material.initialize_state(&mut state).unwrap();
    let (response, tangent) = material
        .compute_stress(deformation_gradient, &time(), &mut state)
        .unwrap();
    let layout = material.state_layout();
    Solution {
        stress: response.kirchhoff_stress,
        tangent,
        plastic_gradient: layout.tensor(&state, "Fp"),
        alpha_p: layout.view(&state, "alphaP")[0],
    }
}

fn check_state(
    solution: &Solution,
    stress: &Matrix3<f64>,
    plastic_gradient: &Matrix3<f64>,
    alpha_p: f64,
    label: &str,
) {
    assert!(
        check_matrices_close(&solution.stress, stress, 1e-10),
        "{label}: Kirchhoff stress mismatch:\n{}\nvs\n{}",
        solution.stress,
        stress
    );
    assert!(
        check_matrices_close(
            &solution.stress,
            &solution.stress.transpose(),
            1e-10
        ),
        "{label}: Kirchhoff stress not symmetric"
    );
    assert!(
        check_matrices_close(&solution.plastic_gradient, plastic_gradient, 1e-10),
        "{label}: plastic deformation gradient mismatch:\n{}\nvs\n{}",
        solution.plastic_gradient,
        plastic_gradient
    );
    assert!(
        check_close(solution.alpha_p, alpha_p, 1e-10),
        "{label}: hardening variable mismatch: {} vs {alpha_p}",
        solution.alpha_p
    );
}

#[test]
fn undeformed_configuration() {
    for method in METHODS {
        let solution = solve(method, &Matrix3::identity());
        check_state(
            &solution,
            &Matrix3::zeros(),
            &Matrix3::identity(),
            0.0,
            "undeformed",
        );
    }
}

#[test]
fn simple_shear_with_yielding() {
    let mut deformation = Matrix3::identity();
    deformation[(1, 0)] = 0.02;

    let mut stress = Matrix3::zeros();
    stress[(0, 0)] = -1.66365138295391;
    stress[(0, 1)] = 166.959293480769;
    stress[(1, 0)] = 166.959293480769;
    stress[(1, 1)] = 1.67553448665712;
    stress[(2, 2)] = -0.0118831037141365;

    let mut plastic_gradient = Matrix3::zeros();
    plastic_gradient[(0, 0)] = 1.00013018240255;
    plastic_gradient[(0, 1)] = 0.00896629252627631;
    plastic_gradient[(1, 0)] = 0.00896629252627631;
    plastic_gradient[(1, 1)] = 0.999950856552022;
    plastic_gradient[(2, 2)] = 0.999999361845117;

    let alpha_p = 0.0103537584382;

    for method in METHODS {
        let solution = solve(method, &deformation);
        check_state(&solution, &stress, &plastic_gradient, alpha_p, "simple shear");
    }
}

#[test]
fn hydrostatic_deformation_stays_elastic() {
    let deformation = Matrix3::identity() * 1.002;

    let stress = Matrix3::from_diagonal_element(1048.97652265991);

    for method in METHODS {
        let solution = solve(method, &deformation);
        check_state(
            &solution,
            &stress,
            &Matrix3::identity(),
            0.0,
            "hydrostatic",
        );
    }
}

#[test]
fn arbitrary_deformation() {
    let deformation = Matrix3::new(
        1.01, 0.06, -0.03, 0.06, 1.02, 0.04, -0.03, 0.04, 0.95,
    );

    let stress = Matrix3::new(
        -4815.15772271678,
        179.062345389071,
        -95.4629813550829,
        179.062345389071,
        -4786.68287740693,
        124.546217296781,
        -95.4629813550829,
        124.546217296781,
        -4995.74104468547,
    );

    let plastic_gradient = Matrix3::new(
        1.01899554888122,
        0.0594232892187332,
        -0.0297463602782848,
        0.0594232892187332,
        1.02889141910947,
        0.0396457910879559,
        -0.0297463602782848,
        0.0396457910879559,
        0.959563358208919,
    );

    let alpha_p = 0.0998876084740522;

    for method in METHODS {
        let solution = solve(method, &deformation);
        check_state(
            &solution,
            &stress,
            &plastic_gradient,
            alpha_p,
            "arbitrary deformation",
        );
    }
}

#[test]
fn algorithmic_tangent_for_small_anisotropic_yield() {
    let mut deformation = Matrix3::identity();
    deformation[(0, 0)] += 0.001;
    deformation[(1, 1)] += 0.002;
    deformation[(2, 2)] += 0.003;

    let mut stress = Matrix3::zeros();
    stress[(0, 0)] = 898.575312428168;
    stress[(1, 1)] = 1048.76543449885;
    stress[(2, 2)] = 1199.06587694072;

    let mut plastic_gradient = Matrix3::zeros();
    plastic_gradient[(0, 0)] = 0.99993174180691;
    plastic_gradient[(1, 1)] = 0.999999983290772;
    plastic_gradient[(2, 2)] = 1.00006827956296;

    let alpha_p = 7.88301112597152e-05;

    let mut tangent = Tensor4::zeros();
    tangent[(0, 0, 0, 0)] = 200890.525305335;
    tangent[(0, 0, 1, 1)] = 124564.513352951;
    tangent[(0, 0, 2, 2)] = 198537.043113999;
    tangent[(0, 1, 0, 1)] = 75132.5523288948;
    tangent[(0, 1, 1, 0)] = 75057.5697417401;
    tangent[(0, 2, 0, 2)] = 75197.6138238636;
    tangent[(0, 2, 2, 0)] = 75047.6684323903;
    tangent[(1, 0, 0, 1)] = 75132.5523288948;
    tangent[(1, 0, 1, 0)] = 75057.5697417401;
    tangent[(1, 1, 0, 0)] = 124688.953426225;
    tangent[(1, 1, 1, 1)] = 274826.645041077;
    tangent[(1, 1, 2, 2)] = 124474.348696745;
    tangent[(1, 2, 1, 2)] = 75187.7026280292;
    tangent[(1, 2, 2, 1)] = 75112.7398138437;
    tangent[(2, 0, 0, 2)] = 75197.6138238636;
    tangent[(2, 0, 2, 0)] = 75047.6684323903;
    tangent[(2, 1, 1, 2)] = 75187.7026280292;
    tangent[(2, 1, 2, 1)] = 75112.7398138437;
    tangent[(2, 2, 0, 0)] = 198933.720522818;
    tangent[(2, 2, 1, 1)] = 124598.574593654;
    tangent[(2, 2, 2, 2)] = 200455.918711321;

    for method in METHODS {
        let solution = solve(method, &deformation);
        check_state(
            &solution,
            &stress,
            &plastic_gradient,
            alpha_p,
            "anisotropic yield",
        );

        match method {
            // the analytic and complex-step tangents reproduce the reference
            // values componentwise
            TangentMethod::Analytic | TangentMethod::ComplexStep => {
                for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
                    assert!(
                        check_close(
                            solution.tangent[(i, j, k, l)],
                            tangent[(i, j, k, l)],
                            1e-10
                        ),
                        "tangent mismatch at ({i},{j},{k},{l}): {} vs {}",
                        solution.tangent[(i, j, k, l)],
                        tangent[(i, j, k, l)]
                    );
                }
            }
            // the finite-difference tangents carry truncation noise; they
            // agree with the reference in the Frobenius-relative sense
            TangentMethod::ForwardDifference | TangentMethod::CentralDifference => {
                assert!(frobenius_relative_error(&solution.tangent, &tangent) < 1e-5);
            }
        }
    }
}

#[test]
fn all_variants_agree_on_stress_and_state() {
    let deformation = Matrix3::new(
        1.01, 0.06, -0.03, 0.06, 1.02, 0.04, -0.03, 0.04, 0.95,
    );
    let reference = solve(TangentMethod::Analytic, &deformation);

    for method in METHODS {
        let solution = solve(method, &deformation);
        assert!(check_matrices_close(&solution.stress, &reference.stress, 1e-10));
        assert!(check_matrices_close(
            &solution.plastic_gradient,
            &reference.plastic_gradient,
            1e-10
        ));
        assert!(check_close(solution.alpha_p, reference.alpha_p, 1e-10));

        let tangent_tolerance = match method {
            TangentMethod::Analytic | TangentMethod::ComplexStep => 1e-10,
            _ => 1e-5,
        };
        assert!(
            frobenius_relative_error(&solution.tangent, &reference.tangent)
                < tangent_tolerance
        );
    }
}

#[test]
fn pure_rotations_are_stress_free() {
    for method in [TangentMethod::Analytic, TangentMethod::ComplexStep] {
        for angle_deg in (0..=180).step_by(5) {
            let angle = (angle_deg as f64).to_radians();
            let rotation = Matrix3::new(
                angle.cos(),
                -angle.sin(),
                0.0,
                angle.sin(),
                angle.cos(),
                0.0,
                0.0,
                0.0,
                1.0,
            );
            let solution = solve(method, &rotation);
            check_state(
                &solution,
                &Matrix3::zeros(),
                &Matrix3::identity(),
                0.0,
                "pure rotation",
            );
        }
    }
}

#[test]
fn objectivity_under_superposed_rotations() {
    // tau(Q F) = Q tau(F) Q^T for a plastically loaded configuration
    let deformation = Matrix3::new(
        1.01, 0.06, -0.03, 0.06, 1.02, 0.04, -0.03, 0.04, 0.95,
    );
    for method in METHODS {
        let reference = solve(method, &deformation);
        for angle_deg in (0..=180).step_by(30) {
            let angle = (angle_deg as f64).to_radians();
            let rotation = Matrix3::new(
                angle.cos(),
                -angle.sin(),
                0.0,
                angle.sin(),
                angle.cos(),
                0.0,
                0.0,
                0.0,
                1.0,
            );
            let rotated = solve(method, &(rotation * deformation));
            let expected = rotation * reference.stress * rotation.transpose();
            assert!(
                check_matrices_close(&rotated.stress, &expected, 1e-10),
                "objectivity failed at {angle_deg} degrees"
            );
        }
    }
}

#[test]
fn isotropy_under_reference_rotations() {
    // rotating the reference configuration of F and Fp together leaves the
    // stress unchanged for an isotropic material
    let deformation = Matrix3::new(
        1.01, 0.06, -0.03, 0.06, 1.02, 0.04, -0.03, 0.04, 0.95,
    );
    for method in METHODS {
        let material = material(method);
        let layout = material.state_layout();

        let mut state = vec![0.0; material.num_state_vars()];
        material.initialize_state(&mut state).unwrap();
        let (reference, _) = material
            .compute_stress(&deformation, &time(), &mut state)
            .unwrap();
        let plastic_gradient = layout.tensor(&state, "Fp");
        let alpha_p = layout.view(&state, "alphaP")[0];

        for angle_deg in (0..=180).step_by(30) {
            let angle = (angle_deg as f64).to_radians();
            let rotation = Matrix3::new(
                angle.cos(),
                -angle.sin(),
                0.0,
                angle.sin(),
                angle.cos(),
                0.0,
                0.0,
                0.0,
                1.0,
            );

            let mut rotated_state = vec![0.0; material.num_state_vars()];
            material.initialize_state(&mut rotated_state).unwrap();
            layout.set_tensor(&mut rotated_state, "Fp", &(plastic_gradient * rotation));
            layout.view_mut(&mut rotated_state, "alphaP")[0] = alpha_p;

            let (rotated, _) = material
                .compute_stress(&(deformation * rotation), &time(), &mut rotated_state)
                .unwrap();
            assert!(
                check_matrices_close(
                    &rotated.kirchhoff_stress,
                    &reference.kirchhoff_stress,
                    1e-10
                ),
                "isotropy failed at {angle_deg} degrees"
            );
        }
    }
}

#[test]
fn plastic_loading_is_consistent_and_monotone() {
    // after the return mapping the state lies on the yield surface and the
    // hardening variable never decreases
    let mut deformation = Matrix3::identity();
    deformation[(1, 0)] = 0.02;

    let material = material(TangentMethod::Analytic);
    let layout = material.state_layout();
    let mut state = vec![0.0; material.num_state_vars()];
    material.initialize_state(&mut state).unwrap();

    let mut previous_alpha = 0.0;
    for load in 1..=4 {
        let mut f = Matrix3::identity();
        f[(1, 0)] = 0.02 * load as f64;
        material.compute_stress(&f, &time(), &mut state).unwrap();
        let alpha_p = layout.view(&state, "alphaP")[0];
        assert!(alpha_p >= previous_alpha);
        previous_alpha = alpha_p;
    }
    assert!(previous_alpha > 0.0);
}
