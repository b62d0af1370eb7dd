//! The isotropic linear elastic material model (small strain).

use nalgebra::{Matrix6, RealField, Vector6};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use solidus::error::Error;
use solidus::material::{SmallStrainMaterial, StateLayout, TimeIncrement};
use solidus::mechanics::elasticity::isotropic_stiffness;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LameParameters<T> {
    pub mu: T,
    pub lambda: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoungPoisson<T> {
    pub young: T,
    pub poisson: T,
}

impl<T> From<YoungPoisson<T>> for LameParameters<T>
where
    T: RealField,
{
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    fn from(params: YoungPoisson<T>) -> Self {
        let YoungPoisson { young, poisson } = params;
        let mu = 0.5 * young / (1.0 + poisson.clone());
        let lambda = 2.0 * mu.clone() * poisson.clone() / (1.0 - 2.0 * poisson);
        Self { mu, lambda }
    }
}

/// The isotropic linear elastic material.
///
/// The stress update is the closed form
/// $\Delta\vec\sigma = \vec C : \Delta\vec\varepsilon$ with the constant
/// isotropic stiffness $\vec C(E, \nu)$; the tangent is exact for any
/// increment size, so the model carries no history state.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearElasticMaterial {
    parameters: YoungPoisson<f64>,
    density: f64,
    stiffness: Matrix6<f64>,
}

impl LinearElasticMaterial {
    pub fn new(parameters: YoungPoisson<f64>) -> Self {
        Self::with_density(parameters, 0.0)
    }

    pub fn with_density(parameters: YoungPoisson<f64>, density: f64) -> Self {
        let stiffness = isotropic_stiffness(parameters.young, parameters.poisson);
        Self {
            parameters,
            density,
            stiffness,
        }
    }

    /// Construct from a raw property slice `[E, nu]` or `[E, nu, rho]`.
    pub fn from_properties(properties: &[f64]) -> Result<Self, Error> {
        match properties {
            [young, poisson] => Ok(Self::new(YoungPoisson {
                young: *young,
                poisson: *poisson,
            })),
            [young, poisson, density] => Ok(Self::with_density(
                YoungPoisson {
                    young: *young,
                    poisson: *poisson,
                },
                *density,
            )),
            _ => Err(Error::InvalidArgument(format!(
                "linear elasticity expects 2 or 3 material properties, got {}",
                properties.len()
            ))),
        }
    }

    pub fn parameters(&self) -> &YoungPoisson<f64> {
        &self.parameters
    }

    pub fn stiffness(&self) -> &Matrix6<f64> {
        &self.stiffness
    }
}

impl SmallStrainMaterial for LinearElasticMaterial {
    fn state_layout(&self) -> StateLayout {
        StateLayout::new()
    }

    fn initialize_state(&self, _state: &mut [f64]) -> Result<(), Error> {
        Ok(())
    }

    fn density(&self) -> f64 {
        self.density
    }

    fn compute_stress(
        &self,
        stress: &mut Vector6<f64>,
        strain_increment: &Vector6<f64>,
        _time: &TimeIncrement,
        _state: &mut [f64],
    ) -> Result<Matrix6<f64>, Error> {
        *stress += self.stiffness * strain_increment;
        Ok(self.stiffness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solidus::testing::check_close;

    #[test]
    fn lame_parameters_from_young_poisson() {
        let LameParameters { mu, lambda } = YoungPoisson {
            young: 210000.0,
            poisson: 0.3,
        }
        .into();
        assert!(check_close(mu, 80769.23076923077, 1e-12));
        assert!(check_close(lambda, 121153.84615384616, 1e-12));
    }

    #[test]
    fn stress_update_is_linear_in_the_increment() {
        let material = LinearElasticMaterial::new(YoungPoisson {
            young: 210000.0,
            poisson: 0.3,
        });
        let mut stress = Vector6::zeros();
        let strain = Vector6::new(1e-3, 0.0, 0.0, 0.0, 0.0, 0.0);
        let time = TimeIncrement { time: 1.0, dt: 1.0 };
        let tangent = material
            .compute_stress(&mut stress, &strain, &time, &mut [])
            .unwrap();
        // uniaxial strain, not uniaxial stress: sigma_11 = (lambda + 2 mu) eps
        assert!(check_close(stress[0], 282692.30769230769 * 1e-3, 1e-12));
        assert!(check_close(stress[1], 121153.84615384616 * 1e-3, 1e-12));
        assert_eq!(tangent, *material.stiffness());
    }
}
