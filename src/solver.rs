//! Material-point drivers.
//!
//! A driver exercises a single constitutive law under mixed strain/stress
//! control over pseudo-time: each [`finite_strain::Step`] or
//! [`small_strain::Step`] prescribes a piecewise-linear target trajectory,
//! which the driver traverses with adaptive substepping, solving one Newton
//! iteration per increment and recording the accepted states as history.

use serde::{Deserialize, Serialize};

pub mod finite_strain;
pub mod small_strain;

pub use finite_strain::MaterialPointSolver;
pub use small_strain::SmallStrainSolver;

/// Options of the outer mixed-control Newton iteration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Maximum number of Newton iterations per increment.
    pub max_iterations: usize,
    /// Convergence tolerance on the residual norm.
    pub residual_tolerance: f64,
    /// Convergence tolerance on the correction norm.
    pub correction_tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            residual_tolerance: 1e-10,
            correction_tolerance: 1e-10,
        }
    }
}

/// Growth factor applied to the substep size after an accepted increment.
/// The grown step never exceeds the step's configured maximum.
pub(crate) const SUBSTEP_GROWTH: f64 = 1.5;

/// A step is considered complete when the remaining pseudo-time falls below
/// this threshold.
pub(crate) const TIME_MATCH_TOLERANCE: f64 = 1e-12;

pub(crate) fn format_csv_value(value: f64) -> String {
    format!("{:>14}", format!("{:.6e}", value))
}

pub(crate) fn format_csv_label(label: &str) -> String {
    format!("{:>14}", label)
}
