//! Finite-strain hyperelastic-plastic J2 model with isotropic saturation
//! hardening.
//!
//! The elastic response is compressible Neo-Hookean (Pence-Gou potential,
//! variant B) evaluated on the elastic part
//! $\boldsymbol F^{\mathrm e} = \boldsymbol F (\boldsymbol F^{\mathrm p})^{-1}$
//! of the multiplicative split. Yielding is governed by the J2 criterion on
//! the Mandel stress with the saturation hardening law
//! $\beta_{\mathrm p}(\alpha_{\mathrm p}) = f_{y\infty} + (f_y - f_{y\infty})
//! e^{-\eta \alpha_{\mathrm p}} + H \alpha_{\mathrm p}$.
//! Plastic flow is integrated by the exponential map, and the return mapping
//! solves the coupled system of eleven unknowns
//! $\boldsymbol X = (\mathrm{vec}\,\boldsymbol F^{\mathrm e}, \alpha_{\mathrm p},
//! \Delta\lambda)$ by Newton iteration with a column-pivot QR solve.
//!
//! The Jacobian $\partial \boldsymbol R / \partial \boldsymbol X$ and the
//! second derivative of the energy density are computed per the configured
//! [`TangentMethod`]: fully analytic, forward or central finite differences,
//! or complex-step differentiation. All variants converge to the same stress
//! and plastic state; they differ in tangent accuracy and cost.

use nalgebra::{Matrix3, SMatrix, SVector};
use num::complex::Complex;
use serde::{Deserialize, Serialize};
use solidus::constants::SQRT_2_3;
use solidus::error::Error;
use solidus::material::{
    ConstitutiveResponse, FiniteStrainMaterial, StateLayout, TimeIncrement,
};
use solidus::mechanics::deformation::right_cauchy_green_first_derivative;
use solidus::mechanics::energy::{
    pence_gou_b_first_derivative, pence_gou_b_second_derivative,
};
use solidus::mechanics::flow;
use solidus::mechanics::stress::kirchhoff_stress_first_derivative;
use solidus::numdiff::{tensor_to_tensor, vector_to_vector};
use solidus::scalar::SmoothScalar;
use solidus::tensor::{self, Tensor4};

/// How $\partial\boldsymbol R / \partial\boldsymbol X$ and
/// $\partial^2\Psi / \partial\boldsymbol C\,\partial\boldsymbol C$ are
/// evaluated inside the return mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TangentMethod {
    /// All derivatives analytic.
    Analytic,
    /// Forward finite differences.
    ForwardDifference,
    /// Central finite differences.
    CentralDifference,
    /// Complex-step differentiation.
    ComplexStep,
}

impl TangentMethod {
    /// Decode the conventional numeric selector (1 to 4) used in raw
    /// property arrays.
    pub fn from_selector(selector: f64) -> Result<Self, Error> {
        match selector as i64 {
            1 => Ok(Self::Analytic),
            2 => Ok(Self::ForwardDifference),
            3 => Ok(Self::CentralDifference),
            4 => Ok(Self::ComplexStep),
            other => Err(Error::InvalidArgument(format!(
                "unsupported algorithm selector {other}"
            ))),
        }
    }
}

/// Material parameters of [`FiniteStrainJ2Plasticity`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct J2PlasticityParameters {
    /// Bulk modulus $K$.
    pub bulk_modulus: f64,
    /// Shear modulus $G$.
    pub shear_modulus: f64,
    /// Initial yield stress $f_y$.
    pub yield_stress: f64,
    /// Saturated (asymptotic) yield stress $f_{y\infty}$.
    pub yield_stress_saturated: f64,
    /// Saturation rate $\eta$.
    pub saturation_rate: f64,
    /// Linear hardening modulus $H$.
    pub hardening_modulus: f64,
    /// Derivative evaluation strategy of the return mapping.
    pub method: TangentMethod,
    /// Mass density $\rho$.
    pub density: f64,
}

/// Tolerance of the inner return-mapping Newton iteration, applied to both
/// the residual and the correction norm.
const RETURN_MAPPING_TOLERANCE: f64 = 1e-12;

/// Iteration bound of the inner Newton; exceeding it signals a diverged
/// return mapping to the driver.
const MAX_RETURN_MAPPING_ITERATIONS: usize = 10;

/// Floor on the deviatoric norm, keeping the yield gradient defined at the
/// cone apex.
const DEVIATORIC_NORM_FLOOR: f64 = 1e-15;

/// The finite-strain J2 elasto-plastic material.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiniteStrainJ2Plasticity {
    parameters: J2PlasticityParameters,
}

fn unflatten_state<T: SmoothScalar>(x: &SVector<T, 11>) -> Matrix3<T> {
    Matrix3::from_fn(|i, j| x[3 * i + j])
}

impl FiniteStrainJ2Plasticity {
    pub fn new(parameters: J2PlasticityParameters) -> Self {
        Self { parameters }
    }

    /// Construct from a raw property slice
    /// `[K, G, fy, fyInf, eta, H, algorithm]` with an optional trailing
    /// density.
    pub fn from_properties(properties: &[f64]) -> Result<Self, Error> {
        if properties.len() < 7 || properties.len() > 8 {
            return Err(Error::InvalidArgument(format!(
                "finite-strain J2 plasticity expects 7 or 8 material properties, got {}",
                properties.len()
            )));
        }
        Ok(Self::new(J2PlasticityParameters {
            bulk_modulus: properties[0],
            shear_modulus: properties[1],
            yield_stress: properties[2],
            yield_stress_saturated: properties[3],
            saturation_rate: properties[4],
            hardening_modulus: properties[5],
            method: TangentMethod::from_selector(properties[6])?,
            density: properties.get(7).copied().unwrap_or(0.0),
        }))
    }

    pub fn parameters(&self) -> &J2PlasticityParameters {
        &self.parameters
    }

    /// The stress-like hardening variable
    /// $\beta_{\mathrm p}(\alpha_{\mathrm p})$.
    fn hardening<T: SmoothScalar>(&self, alpha_p: T) -> T {
        let p = &self.parameters;
        T::from_f64(p.yield_stress_saturated)
            + T::from_f64(p.yield_stress - p.yield_stress_saturated)
                * (-alpha_p * T::from_f64(p.saturation_rate)).exp()
            + alpha_p * T::from_f64(p.hardening_modulus)
    }

    /// $\beta_{\mathrm p}$ and
    /// $\partial\beta_{\mathrm p} / \partial\alpha_{\mathrm p}$.
    fn hardening_with_derivative(&self, alpha_p: f64) -> (f64, f64) {
        let p = &self.parameters;
        let saturation = (p.yield_stress - p.yield_stress_saturated)
            * (-alpha_p * p.saturation_rate).exp();
        (
            p.yield_stress_saturated + saturation + alpha_p * p.hardening_modulus,
            -p.saturation_rate * saturation + p.hardening_modulus,
        )
    }

    /// The yield function and its first derivatives with respect to the
    /// Mandel stress and the hardening variable.
    fn yield_from_stress<T: SmoothScalar>(
        &self,
        mandel: &Matrix3<T>,
        beta_p: T,
    ) -> (T, Matrix3<T>, T) {
        let fy = self.parameters.yield_stress;
        let deviator = tensor::dev(mandel);
        let mut rho = tensor::ddot(&deviator, &deviator).sqrt();
        if rho.real() == 0.0 {
            rho = rho + T::from_f64(DEVIATORIC_NORM_FLOOR);
        }
        let f = (rho - T::from_f64(SQRT_2_3) * beta_p) * T::from_f64(1.0 / fy);
        let df_dmandel = deviator * (rho.recip() * T::from_f64(1.0 / fy));
        (f, df_dmandel, T::from_f64(-SQRT_2_3 / fy))
    }

    /// The yield function with first and second Mandel derivatives.
    fn yield_from_stress_second_order(
        &self,
        mandel: &Matrix3<f64>,
        beta_p: f64,
    ) -> (f64, Matrix3<f64>, Tensor4<f64>, f64) {
        let fy = self.parameters.yield_stress;
        let deviator = tensor::dev(mandel);
        let rho = tensor::frobenius_norm(&deviator).max(DEVIATORIC_NORM_FLOOR);
        let f = (rho - SQRT_2_3 * beta_p) / fy;

        let df_dmandel = deviator / (rho * fy);
        let d2f_dmandel2 = Tensor4::from_fn(|i, j, k, l| {
            let projector = ((i == k && j == l) as u8) as f64
                - ((i == j && k == l) as u8) as f64 / 3.0;
            (-deviator[(i, j)] * deviator[(k, l)] / rho.powi(3) + projector / rho) / fy
        });

        (f, df_dmandel, d2f_dmandel2, -SQRT_2_3 / fy)
    }

    /// The Mandel stress $\boldsymbol M = \boldsymbol C^{\mathrm e} \boldsymbol S$
    /// for an arbitrary scalar type.
    fn mandel_stress_only<T: SmoothScalar>(&self, fe: &Matrix3<T>) -> Result<Matrix3<T>, Error> {
        let cauchy_green = fe.transpose() * fe;
        let (_, d_psi) = pence_gou_b_first_derivative(
            &cauchy_green,
            self.parameters.bulk_modulus,
            self.parameters.shear_modulus,
        )
        .ok_or(Error::SingularTangent)?;
        let pk2 = d_psi * T::from_f64(2.0);
        Ok(cauchy_green * pk2)
    }

    /// The Mandel stress and its derivative
    /// $\partial\boldsymbol M / \partial\boldsymbol F^{\mathrm e}$.
    fn mandel_stress(&self, fe: &Matrix3<f64>) -> Result<(Matrix3<f64>, Tensor4<f64>), Error> {
        let (cauchy_green, dc_dfe) = right_cauchy_green_first_derivative(fe);
        let (_, d_psi, d2_psi) = pence_gou_b_second_derivative(
            &cauchy_green,
            self.parameters.bulk_modulus,
            self.parameters.shear_modulus,
        )
        .ok_or(Error::SingularTangent)?;
        let pk2 = d_psi * 2.0;
        let mandel = cauchy_green * pk2;

        // dM_IJ/dC_KL = C_Ii 2 d2Psi_iJKL + delta_IK S_LJ
        let dmandel_dc = Tensor4::from_fn(|i, j, k, l| {
            let mut entry = 0.0;
            for m in 0..3 {
                entry += cauchy_green[(i, m)] * 2.0 * d2_psi[(m, j, k, l)];
            }
            if i == k {
                entry += pk2[(l, j)];
            }
            entry
        });
        Ok((mandel, dmandel_dc.compose(&dc_dfe)))
    }

    fn is_yielding(&self, fe_trial: &Matrix3<f64>, beta_p: f64) -> Result<bool, Error> {
        let mandel = self.mandel_stress_only(fe_trial)?;
        let (f, _, _) = self.yield_from_stress(&mandel, beta_p);
        Ok(f > 0.0)
    }

    /// The return-mapping residual $\boldsymbol R(\boldsymbol X)$, generic
    /// over the scalar so that the finite-difference and complex-step
    /// Jacobians evaluate the identical code path.
    ///
    /// Rows 0 to 8 enforce
    /// $\boldsymbol F^{\mathrm e} (\exp \Delta\lambda\,\partial f/\partial\boldsymbol M)^\top
    /// = \boldsymbol F^{\mathrm e, \mathrm{trial}}$, row 9 the hardening
    /// update and row 10 the yield condition.
    fn residual<T: SmoothScalar>(
        &self,
        x: &SVector<T, 11>,
        fe_trial: &Matrix3<f64>,
        alpha_p_old: f64,
    ) -> Result<SVector<T, 11>, Error> {
        let fe = unflatten_state(x);
        let alpha_p = x[9];
        let d_lambda = x[10];

        let beta_p = self.hardening(alpha_p);
        let mandel = self.mandel_stress_only(&fe)?;
        let (f, df_dmandel, df_dbeta) = self.yield_from_stress(&mandel, beta_p);

        let plastic_velocity = df_dmandel * d_lambda;
        let flow_increment = flow::exponential_map(&plastic_velocity);
        let updated = fe * flow_increment;

        let mut residual = SVector::<T, 11>::zeros();
        for i in 0..3 {
            for j in 0..3 {
                residual[3 * i + j] = updated[(i, j)] - T::from_f64(fe_trial[(i, j)]);
            }
        }
        residual[9] = alpha_p + d_lambda * df_dbeta - T::from_f64(alpha_p_old);
        residual[10] = f;
        Ok(residual)
    }

    /// The residual together with its fully analytic Jacobian.
    fn residual_and_jacobian(
        &self,
        x: &SVector<f64, 11>,
        fe_trial: &Matrix3<f64>,
        alpha_p_old: f64,
    ) -> Result<(SVector<f64, 11>, SMatrix<f64, 11, 11>), Error> {
        let fe = unflatten_state(x);
        let alpha_p = x[9];
        let d_lambda = x[10];

        let (beta_p, d_beta_p) = self.hardening_with_derivative(alpha_p);
        let (mandel, dmandel_dfe) = self.mandel_stress(&fe)?;
        let (f, df_dmandel, d2f_dmandel2, df_dbeta) =
            self.yield_from_stress_second_order(&mandel, beta_p);

        let plastic_velocity = df_dmandel * d_lambda;
        let (flow_increment, dflow_dvelocity) =
            flow::exponential_map_first_derivative(&plastic_velocity);

        let dvelocity_dfe = d2f_dmandel2.compose(&dmandel_dfe) * d_lambda;
        let dflow_dlambda = dflow_dvelocity.ddot_rank2(&df_dmandel);
        let dflow_dfe = dflow_dvelocity.compose(&dvelocity_dfe);

        // product rule on Fe * dFp for the first nine rows
        let dr9_dfe = Tensor4::from_fn(|i, j, k, l| {
            let mut entry = 0.0;
            for m in 0..3 {
                entry += fe[(i, m)] * dflow_dfe[(m, j, k, l)];
            }
            if i == k {
                entry += flow_increment[(l, j)];
            }
            entry
        });
        let dr9_dlambda = fe * dflow_dlambda;
        let df_dfe = dmandel_dfe.contract_left(&df_dmandel);

        let updated = fe * flow_increment;
        let mut residual = SVector::<f64, 11>::zeros();
        for i in 0..3 {
            for j in 0..3 {
                residual[3 * i + j] = updated[(i, j)] - fe_trial[(i, j)];
            }
        }
        residual[9] = alpha_p + d_lambda * df_dbeta - alpha_p_old;
        residual[10] = f;

        let mut jacobian = SMatrix::<f64, 11, 11>::zeros();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    for l in 0..3 {
                        jacobian[(3 * i + j, 3 * k + l)] = dr9_dfe[(i, j, k, l)];
                    }
                }
                jacobian[(3 * i + j, 10)] = dr9_dlambda[(i, j)];
                jacobian[(10, 3 * i + j)] = df_dfe[(i, j)];
            }
        }
        jacobian[(9, 9)] = 1.0;
        jacobian[(9, 10)] = df_dbeta;
        jacobian[(10, 9)] = df_dbeta * d_beta_p;

        Ok((residual, jacobian))
    }

    /// Residual and Jacobian per the configured [`TangentMethod`].
    fn residual_and_jacobian_by_method(
        &self,
        x: &SVector<f64, 11>,
        fe_trial: &Matrix3<f64>,
        alpha_p_old: f64,
    ) -> Result<(SVector<f64, 11>, SMatrix<f64, 11, 11>), Error> {
        match self.parameters.method {
            TangentMethod::Analytic => self.residual_and_jacobian(x, fe_trial, alpha_p_old),
            TangentMethod::ForwardDifference => {
                let residual = self.residual::<f64>(x, fe_trial, alpha_p_old)?;
                // a singular perturbed state poisons the Jacobian with NaN
                // and surfaces as a diverged return mapping
                let jacobian = vector_to_vector::forward_difference(
                    |x| {
                        self.residual::<f64>(x, fe_trial, alpha_p_old)
                            .unwrap_or_else(|_| SVector::repeat(f64::NAN))
                    },
                    x,
                );
                Ok((residual, jacobian))
            }
            TangentMethod::CentralDifference => {
                let residual = self.residual::<f64>(x, fe_trial, alpha_p_old)?;
                let jacobian = vector_to_vector::central_difference(
                    |x| {
                        self.residual::<f64>(x, fe_trial, alpha_p_old)
                            .unwrap_or_else(|_| SVector::repeat(f64::NAN))
                    },
                    x,
                );
                Ok((residual, jacobian))
            }
            TangentMethod::ComplexStep => {
                let residual = self.residual::<f64>(x, fe_trial, alpha_p_old)?;
                let jacobian = vector_to_vector::complex_step(
                    |x| {
                        self.residual::<Complex<f64>>(x, fe_trial, alpha_p_old)
                            .unwrap_or_else(|_| SVector::repeat(Complex::new(f64::NAN, 0.0)))
                    },
                    x,
                );
                Ok((residual, jacobian))
            }
        }
    }

    /// $\partial^2\Psi / \partial\boldsymbol C\,\partial\boldsymbol C$ per
    /// the configured [`TangentMethod`].
    fn energy_hessian(&self, cauchy_green: &Matrix3<f64>) -> Result<Tensor4<f64>, Error> {
        let (bulk, shear) = (self.parameters.bulk_modulus, self.parameters.shear_modulus);
        match self.parameters.method {
            TangentMethod::Analytic => pence_gou_b_second_derivative(cauchy_green, bulk, shear)
                .map(|(_, _, hessian)| hessian)
                .ok_or(Error::SingularTangent),
            TangentMethod::ForwardDifference => Ok(tensor_to_tensor::forward_difference(
                |c| {
                    pence_gou_b_first_derivative(c, bulk, shear)
                        .map(|(_, d_psi)| d_psi)
                        .unwrap_or_else(|| Matrix3::repeat(f64::NAN))
                },
                cauchy_green,
            )),
            TangentMethod::CentralDifference => Ok(tensor_to_tensor::central_difference(
                |c| {
                    pence_gou_b_first_derivative(c, bulk, shear)
                        .map(|(_, d_psi)| d_psi)
                        .unwrap_or_else(|| Matrix3::repeat(f64::NAN))
                },
                cauchy_green,
            )),
            TangentMethod::ComplexStep => Ok(tensor_to_tensor::complex_step(
                |c| {
                    pence_gou_b_first_derivative(c, bulk, shear)
                        .map(|(_, d_psi)| d_psi)
                        .unwrap_or_else(|| Matrix3::repeat(Complex::new(f64::NAN, 0.0)))
                },
                cauchy_green,
            )),
        }
    }

    /// Stress, energy and tangent for a known elastic deformation gradient
    /// and a known sensitivity
    /// $\partial\boldsymbol F^{\mathrm e} / \partial\boldsymbol F$.
    fn assemble_response(
        &self,
        fe: &Matrix3<f64>,
        dfe_df: &Tensor4<f64>,
    ) -> Result<(ConstitutiveResponse, Tensor4<f64>), Error> {
        let (cauchy_green, dc_dfe) = right_cauchy_green_first_derivative(fe);
        let d2_psi = self.energy_hessian(&cauchy_green)?;
        let (psi, d_psi) = pence_gou_b_first_derivative(
            &cauchy_green,
            self.parameters.bulk_modulus,
            self.parameters.shear_modulus,
        )
        .ok_or(Error::SingularTangent)?;

        let pk2 = d_psi * 2.0;
        let (tau, dtau_dpk2, dtau_dfe_partial) = kirchhoff_stress_first_derivative(&pk2, fe);

        let dpk2_dfe = (d2_psi * 2.0).compose(&dc_dfe);
        let dpk2_df = dpk2_dfe.compose(dfe_df);
        let tangent = dtau_dpk2.compose(&dpk2_df) + dtau_dfe_partial.compose(dfe_df);

        let response = ConstitutiveResponse {
            kirchhoff_stress: tau,
            elastic_energy_density: psi,
            density: self.parameters.density,
        };
        Ok((response, tangent))
    }
}

impl FiniteStrainMaterial for FiniteStrainJ2Plasticity {
    fn state_layout(&self) -> StateLayout {
        StateLayout::new().add("Fp", 9).add("alphaP", 1)
    }

    fn initialize_state(&self, state: &mut [f64]) -> Result<(), Error> {
        let layout = self.state_layout();
        if state.len() < layout.total_len() {
            return Err(Error::InvalidArgument(format!(
                "state buffer holds {} doubles, {} required",
                state.len(),
                layout.total_len()
            )));
        }
        state.fill(0.0);
        layout.set_tensor(state, "Fp", &Matrix3::identity());
        Ok(())
    }

    fn compute_stress(
        &self,
        deformation_gradient: &Matrix3<f64>,
        _time: &TimeIncrement,
        state: &mut [f64],
    ) -> Result<(ConstitutiveResponse, Tensor4<f64>), Error> {
        let layout = self.state_layout();
        let fp_old = layout.tensor(state, "Fp");
        let alpha_p_old = layout.view(state, "alphaP")[0];

        let fp_old_inv = tensor::try_inv(&fp_old).ok_or(Error::SingularTangent)?;
        let fe_trial = deformation_gradient * fp_old_inv;
        let (beta_p, _) = self.hardening_with_derivative(alpha_p_old);

        // sensitivity of the trial elastic gradient,
        // dFeTrial_IJ/dF_KL = delta_IK (Fp^-1)_LJ
        let dfe_trial_df = Tensor4::from_fn(|i, j, k, l| {
            if i == k {
                fp_old_inv[(l, j)]
            } else {
                0.0
            }
        });

        if !self.is_yielding(&fe_trial, beta_p)? {
            return self.assemble_response(&fe_trial, &dfe_trial_df);
        }

        // plastic step: Newton on the eleven coupled unknowns
        let mut x = SVector::<f64, 11>::zeros();
        for i in 0..3 {
            for j in 0..3 {
                x[3 * i + j] = fe_trial[(i, j)];
            }
        }
        x[9] = alpha_p_old;
        x[10] = 0.0;

        let mut correction = SVector::<f64, 11>::zeros();
        let (mut residual, mut jacobian) =
            self.residual_and_jacobian_by_method(&x, &fe_trial, alpha_p_old)?;

        let mut iterations = 0;
        while residual.norm() > RETURN_MAPPING_TOLERANCE
            || correction.norm() > RETURN_MAPPING_TOLERANCE
        {
            if iterations > MAX_RETURN_MAPPING_ITERATIONS {
                return Err(Error::ReturnMappingDiverged { iterations });
            }
            correction = -jacobian
                .col_piv_qr()
                .solve(&residual)
                .ok_or(Error::SingularTangent)?;
            x += correction;
            let (new_residual, new_jacobian) =
                self.residual_and_jacobian_by_method(&x, &fe_trial, alpha_p_old)?;
            residual = new_residual;
            jacobian = new_jacobian;
            iterations += 1;
        }

        // commit the plastic state
        let fe = unflatten_state(&x);
        let fe_inv = tensor::try_inv(&fe).ok_or(Error::SingularTangent)?;
        let plastic_increment = fe_inv * fe_trial;
        let fp_new = plastic_increment * fp_old;
        layout.set_tensor(state, "Fp", &fp_new);
        layout.view_mut(state, "alphaP")[0] = x[9];

        // implicit-function theorem: dX/dF from the converged Jacobian; the
        // only loaded rows of dR/dF are the trial rows
        let mut rhs = SMatrix::<f64, 11, 11>::zeros();
        for i in 0..3 {
            for j in 0..3 {
                for l in 0..3 {
                    rhs[(3 * i + j, 3 * i + l)] = fp_old_inv[(l, j)];
                }
            }
        }
        let dx_df = jacobian
            .col_piv_qr()
            .solve(&rhs)
            .ok_or(Error::SingularTangent)?;
        let dfe_df = Tensor4::from_fn(|i, j, k, l| dx_df[(3 * i + j, 3 * k + l)]);

        self.assemble_response(&fe, &dfe_df)
    }
}
