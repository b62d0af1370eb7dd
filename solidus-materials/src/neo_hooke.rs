//! The compressible Neo-Hookean material model (finite strain).

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use solidus::error::Error;
use solidus::material::{
    ConstitutiveResponse, FiniteStrainMaterial, StateLayout, TimeIncrement,
};
use solidus::mechanics::deformation::right_cauchy_green_first_derivative;
use solidus::mechanics::energy::pence_gou_b_second_derivative;
use solidus::mechanics::stress::kirchhoff_stress_first_derivative;
use solidus::tensor::Tensor4;

/// Compressible Neo-Hookean hyperelasticity based on the Pence-Gou
/// potential, variant B.
///
/// The Kirchhoff stress follows from
/// $\boldsymbol S = 2 \, \partial\Psi / \partial\boldsymbol C$ and
/// $\boldsymbol\tau = \boldsymbol F \boldsymbol S \boldsymbol F^\top$; the
/// tangent is assembled from the analytic second derivative of the
/// potential. The model carries no history state.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompressibleNeoHooke {
    pub bulk_modulus: f64,
    pub shear_modulus: f64,
    pub density: f64,
}

impl CompressibleNeoHooke {
    pub fn new(bulk_modulus: f64, shear_modulus: f64) -> Self {
        Self {
            bulk_modulus,
            shear_modulus,
            density: 0.0,
        }
    }

    /// Construct from a raw property slice `[K, G]` or `[K, G, rho]`.
    pub fn from_properties(properties: &[f64]) -> Result<Self, Error> {
        match properties {
            [bulk, shear] => Ok(Self::new(*bulk, *shear)),
            [bulk, shear, density] => Ok(Self {
                bulk_modulus: *bulk,
                shear_modulus: *shear,
                density: *density,
            }),
            _ => Err(Error::InvalidArgument(format!(
                "compressible Neo-Hooke expects 2 or 3 material properties, got {}",
                properties.len()
            ))),
        }
    }
}

impl FiniteStrainMaterial for CompressibleNeoHooke {
    fn state_layout(&self) -> StateLayout {
        StateLayout::new()
    }

    fn initialize_state(&self, _state: &mut [f64]) -> Result<(), Error> {
        Ok(())
    }

    fn compute_stress(
        &self,
        deformation_gradient: &Matrix3<f64>,
        _time: &TimeIncrement,
        _state: &mut [f64],
    ) -> Result<(ConstitutiveResponse, Tensor4<f64>), Error> {
        let (cauchy_green, dc_df) = right_cauchy_green_first_derivative(deformation_gradient);

        let (psi, d_psi, d2_psi) =
            pence_gou_b_second_derivative(&cauchy_green, self.bulk_modulus, self.shear_modulus)
                .ok_or(Error::SingularTangent)?;

        let pk2 = d_psi * 2.0;
        let (tau, dtau_dpk2, dtau_df_partial) =
            kirchhoff_stress_first_derivative(&pk2, deformation_gradient);

        let dpk2_df = (d2_psi * 2.0).compose(&dc_df);
        let tangent = dtau_dpk2.compose(&dpk2_df) + dtau_df_partial;

        let response = ConstitutiveResponse {
            kirchhoff_stress: tau,
            elastic_energy_density: psi,
            density: self.density,
        };
        Ok((response, tangent))
    }
}
