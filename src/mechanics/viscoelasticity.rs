//! The Kelvin-chain substrate for viscoelastic constitutive laws.
//!
//! A Kelvin chain approximates a creep compliance function by a series of
//! spring-dashpot units with geometrically spaced retardation times. Each
//! unit contributes an internal strain state (one Voigt 6-vector per unit)
//! which evolves by the exponential algorithm below; the chain evaluation
//! condenses the units into an effective uniaxial compliance and a creep
//! strain increment for the current time step.

use crate::scalar::SmoothScalar;
use nalgebra::{DVector, Matrix6, Matrix6xX, Vector6};

/// Compliance functions commonly fitted by Kelvin chains.
pub mod compliance {
    use super::SmoothScalar;

    /// The power law $J(\tau) = m \tau^n$.
    pub fn power_law<T: SmoothScalar>(tau: T, m: f64, n: f64) -> T {
        tau.powf(n) * T::from_f64(m)
    }

    /// The logarithmic power law $J(\tau) = m \ln(1 + \tau^n)$.
    pub fn log_power_law<T: SmoothScalar>(tau: T, m: f64, n: f64) -> T {
        (T::one() + tau.powf(n)).ln() * T::from_f64(m)
    }
}

/// Geometrically spaced retardation times $\tau_i = \tau_{\min} s^i$.
pub fn retardation_times(count: usize, minimum: f64, spacing: f64) -> DVector<f64> {
    DVector::from_fn(count, |i, _| minimum * spacing.powi(i as i32))
}

/// The integration factors $(\lambda, \beta)$ of a single Kelvin unit for a
/// time step `dt` and retardation time `tau`.
///
/// $\beta = e^{-\Delta t / \tau}$ and
/// $\lambda = (1 - \beta)\,\tau / \Delta t$, with series and saturation
/// branches guarding the extreme ratios.
pub fn integration_factors(dt: f64, tau: f64) -> (f64, f64) {
    let ratio = dt / tau;
    if ratio >= 30.0 {
        (tau / dt, 0.0)
    } else if ratio < 1e-6 {
        (1.0 - 0.5 * ratio + ratio * ratio / 6.0, 1.0)
    } else {
        let beta = (-ratio).exp();
        ((1.0 - beta) * tau / dt, beta)
    }
}

/// Evaluate the chain for the current step: accumulate the effective
/// uniaxial compliance and the creep strain increment from the unit states.
///
/// `state` holds one Voigt 6-vector per unit, column-wise. `factor` scales
/// both contributions (e.g. by an aging multiplier).
pub fn evaluate_kelvin_chain(
    dt: f64,
    elastic_moduli: &DVector<f64>,
    retardation_times: &DVector<f64>,
    state: &Matrix6xX<f64>,
    uniaxial_compliance: &mut f64,
    strain_increment: &mut Vector6<f64>,
    factor: f64,
) {
    for unit in 0..elastic_moduli.len() {
        let (lambda, beta) = integration_factors(dt, retardation_times[unit]);
        *uniaxial_compliance += factor * (1.0 - lambda) / elastic_moduli[unit];
        *strain_increment += state.column(unit) * (factor * (1.0 - beta));
    }
}

/// Advance the per-unit strain states by the stress increment of the step.
pub fn update_state(
    dt: f64,
    elastic_moduli: &DVector<f64>,
    retardation_times: &DVector<f64>,
    state: &mut Matrix6xX<f64>,
    stress_increment: &Vector6<f64>,
    unit_compliance: &Matrix6<f64>,
) {
    let compliance_strain = unit_compliance * stress_increment;
    for unit in 0..elastic_moduli.len() {
        let (lambda, beta) = integration_factors(dt, retardation_times[unit]);
        let updated =
            compliance_strain * (lambda / elastic_moduli[unit]) + state.column(unit) * beta;
        state.set_column(unit, &updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanics::elasticity::isotropic_compliance;
    use crate::testing::check_close;
    use matrixcompare::assert_matrix_eq;

    #[test]
    fn retardation_times_are_geometric() {
        let times = retardation_times(3, 10.0, 5.0);
        assert_matrix_eq!(
            times,
            DVector::from_vec(vec![10.0, 50.0, 250.0]),
            comp = abs,
            tol = 1e-12
        );
    }

    #[test]
    fn integration_factor_branches() {
        let dt = 30.0;

        // saturated branch
        let tau = dt / 30.0;
        let (lambda, beta) = integration_factors(dt, tau);
        assert_eq!(beta, 0.0);
        assert!(check_close(lambda, tau / dt, 1e-14));

        // series branch
        let tau = dt / 1e-7;
        let (lambda, beta) = integration_factors(dt, tau);
        let ratio = dt / tau;
        assert_eq!(beta, 1.0);
        assert!(check_close(lambda, 1.0 - 0.5 * ratio + ratio * ratio / 6.0, 1e-14));

        // regular branch
        let tau = dt / 10.0;
        let (lambda, beta) = integration_factors(dt, tau);
        assert!(check_close(beta, (-10.0f64).exp(), 1e-14));
        assert!(check_close(lambda, (1.0 - beta) * tau / dt, 1e-14));
    }

    #[test]
    fn chain_evaluation_and_state_update() {
        // two-unit chain with hand-checked compliance and state evolution
        let count = 2;
        let moduli = DVector::from_fn(count, |i, _| 3.0 * 10.0f64.powi(i as i32));
        let times = retardation_times(count, 10.0, 5.0);
        let dt = 10.0;
        let factor = 1.35;

        let mut state = Matrix6xX::from_columns(&[
            Vector6::new(0.01, 0.02, 0.03, 0.04, 0.05, 0.06),
            Vector6::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6),
        ]);

        let mut compliance = 0.0;
        let mut strain_increment = Vector6::zeros();
        evaluate_kelvin_chain(
            dt,
            &moduli,
            &times,
            &state,
            &mut compliance,
            &mut strain_increment,
            factor,
        );

        assert!(check_close(compliance, 0.16976016796969498, 1e-12));
        let expected_strain = Vector6::new(
            0.033004975878657986,
            0.06600995175731597,
            0.09901492763597397,
            0.13201990351463194,
            0.1650248793932899,
            0.1980298552719479,
        );
        assert_matrix_eq!(strain_increment, expected_strain, comp = abs, tol = 1e-14);

        let stress_increment = Vector6::new(0.1, 0.2, 0.3, 0.06, 0.04, 0.02);
        let unit_compliance = isotropic_compliance(1.0, 0.2);
        update_state(
            dt,
            &moduli,
            &times,
            &mut state,
            &stress_increment,
            &unit_compliance,
        );

        assert!(check_close(state[(0, 0)], 0.0036787944117144234, 1e-12));
        assert!(check_close(state[(0, 1)], 0.0818730753077982, 1e-12));
        assert!(check_close(state[(1, 0)], 0.03264241117657116, 1e-12));
        assert!(check_close(state[(1, 1)], 0.16737153555403675, 1e-12));
        assert!(check_close(state[(2, 0)], 0.061606027941427874, 1e-12));
        assert!(check_close(state[(5, 1)], 0.49268860582216517, 1e-12));
    }

    #[test]
    fn compliance_functions() {
        assert!(check_close(compliance::power_law(4.0, 2.0, 0.5), 4.0, 1e-14));
        assert!(check_close(
            compliance::log_power_law(1.0, 3.0, 2.0),
            3.0 * 2.0f64.ln(),
            1e-14
        ));
    }
}
