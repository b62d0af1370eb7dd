//! Failure kinds of the constitutive core and the material-point drivers.

use thiserror::Error;

/// Errors produced by constitutive evaluations and material-point solves.
///
/// Constitutive failures propagate to the driver, which reacts by cutting the
/// current substep; only [`Error::MinStepReached`] and
/// [`Error::InvalidArgument`] surface to the caller under normal operation.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Inconsistent setup data, e.g. control flags that mark a component as
    /// both strain- and stress-controlled.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The inner return-mapping Newton iteration did not converge.
    #[error("return mapping diverged after {iterations} iterations")]
    ReturnMappingDiverged { iterations: usize },

    /// The outer mixed-control Newton iteration did not converge.
    #[error("increment did not converge within {iterations} iterations")]
    NonConvergentIncrement { iterations: usize },

    /// Substepping reduced the time step below the configured minimum.
    #[error("minimum time step {dt_min:e} reached at time {time}")]
    MinStepReached { time: f64, dt_min: f64 },

    /// A step exhausted its increment budget before reaching its end time.
    #[error("maximum number of increments ({count}) reached")]
    MaxIncrementsReached { count: usize },

    /// A tangent or Jacobian solve failed on a zero pivot.
    #[error("singular tangent encountered")]
    SingularTangent,
}

impl Error {
    /// Whether a driver may react to this failure by cutting the substep.
    ///
    /// Singular tangents are treated like a diverged return mapping.
    pub fn is_recoverable_by_substepping(&self) -> bool {
        matches!(
            self,
            Error::ReturnMappingDiverged { .. }
                | Error::NonConvergentIncrement { .. }
                | Error::SingularTangent
        )
    }
}
