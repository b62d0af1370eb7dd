//! Integration of plastic flow rules.
//!
//! The flow is written in the intermediate configuration: given the plastic
//! velocity increment $\Delta\boldsymbol G^{\mathrm p}$ (flow direction times
//! plastic multiplier), the update produces
//! $\Delta\boldsymbol F^{\mathrm p} = (\exp \Delta\boldsymbol G^{\mathrm p})^\top$,
//! which enters the multiplicative state update
//! $\boldsymbol F^{\mathrm p}_{n+1} = \Delta\boldsymbol F^{\mathrm p} \boldsymbol F^{\mathrm p}_n$.
//! The transpose reflects the right-to-left accumulation convention of the
//! stored plastic deformation gradient.

use crate::scalar::SmoothScalar;
use crate::tensor::exponential::{
    tensor_exponential, tensor_exponential_first_derivative, DEFAULT_MAX_TERMS, DEFAULT_TOLERANCE,
};
use crate::tensor::Tensor4;
use nalgebra::Matrix3;

/// The exponential-map flow increment
/// $\Delta\boldsymbol F^{\mathrm p} = (\exp \Delta\boldsymbol G^{\mathrm p})^\top$.
pub fn exponential_map<T: SmoothScalar>(plastic_velocity: &Matrix3<T>) -> Matrix3<T> {
    tensor_exponential(
        plastic_velocity,
        DEFAULT_MAX_TERMS,
        DEFAULT_TOLERANCE,
        DEFAULT_TOLERANCE,
    )
    .transpose()
}

/// The exponential-map flow increment together with its derivative
/// $\partial \Delta F^{\mathrm p}_{iI} / \partial \Delta G^{\mathrm p}_{kl}$.
pub fn exponential_map_first_derivative(
    plastic_velocity: &Matrix3<f64>,
) -> (Matrix3<f64>, Tensor4<f64>) {
    let (exp, d_exp) = tensor_exponential_first_derivative(
        plastic_velocity,
        DEFAULT_MAX_TERMS,
        DEFAULT_TOLERANCE,
        DEFAULT_TOLERANCE,
    );
    (exp.transpose(), d_exp.swap_first_pair())
}

/// Explicit (forward Euler) flow integration
/// $\Delta\boldsymbol F^{\mathrm p} = (I + \Delta\boldsymbol G^{\mathrm p})^\top$
/// with its constant derivative.
pub fn explicit_integration(plastic_velocity: &Matrix3<f64>) -> (Matrix3<f64>, Tensor4<f64>) {
    let increment = (Matrix3::identity() + plastic_velocity).transpose();
    let derivative = Tensor4::from_fn(|i, j, k, l| ((i == l && j == k) as u8) as f64);
    (increment, derivative)
}
