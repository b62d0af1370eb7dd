//! Constitutive interfaces and the state-variable layout.
//!
//! Materials are stateless objects; all persistent state lives in a flat
//! `f64` buffer owned by the caller (typically a material-point driver or a
//! finite element assembly). A [`StateLayout`] maps state-variable names to
//! slices of that buffer, so that drivers can snapshot, restore and export
//! state without knowing its interpretation.

use crate::error::Error;
use crate::tensor::Tensor4;
use nalgebra::{Matrix3, Matrix6, Vector6};

/// Pseudo-time information for a single constitutive evaluation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeIncrement {
    /// Pseudo-time at the end of the increment.
    pub time: f64,
    /// Length of the increment.
    pub dt: f64,
}

/// The stress-like outputs of a finite-strain constitutive evaluation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConstitutiveResponse {
    /// Kirchhoff stress $\boldsymbol \tau$.
    pub kirchhoff_stress: Matrix3<f64>,
    /// Elastic (stored) energy density $\psi$.
    pub elastic_energy_density: f64,
    /// Mass density from the material parameters.
    pub density: f64,
}

/// A named layout of state variables inside a flat `f64` buffer.
///
/// Entries are laid out contiguously in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateLayout {
    entries: Vec<(&'static str, usize, usize)>,
    total: usize,
}

impl StateLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `len` doubles under `name`, returning `self` for chaining.
    pub fn add(mut self, name: &'static str, len: usize) -> Self {
        self.entries.push((name, self.total, len));
        self.total += len;
        self
    }

    /// Total number of doubles required by this layout.
    pub fn total_len(&self) -> usize {
        self.total
    }

    /// The `(offset, len)` pair registered under `name`.
    pub fn entry(&self, name: &str) -> Option<(usize, usize)> {
        self.entries
            .iter()
            .find(|(entry_name, _, _)| *entry_name == name)
            .map(|&(_, offset, len)| (offset, len))
    }

    /// Borrow the slice registered under `name`.
    ///
    /// Panics if the name is unknown or the buffer is shorter than the
    /// layout requires.
    pub fn view<'a>(&self, state: &'a [f64], name: &str) -> &'a [f64] {
        let (offset, len) = self
            .entry(name)
            .unwrap_or_else(|| panic!("unknown state variable '{name}'"));
        &state[offset..offset + len]
    }

    /// Mutably borrow the slice registered under `name`.
    pub fn view_mut<'a>(&self, state: &'a mut [f64], name: &str) -> &'a mut [f64] {
        let (offset, len) = self
            .entry(name)
            .unwrap_or_else(|| panic!("unknown state variable '{name}'"));
        &mut state[offset..offset + len]
    }

    /// Read a second-rank tensor stored row-major under `name`.
    pub fn tensor(&self, state: &[f64], name: &str) -> Matrix3<f64> {
        let slice = self.view(state, name);
        Matrix3::from_row_slice(slice)
    }

    /// Store a second-rank tensor row-major under `name`.
    pub fn set_tensor(&self, state: &mut [f64], name: &str, value: &Matrix3<f64>) {
        let slice = self.view_mut(state, name);
        for i in 0..3 {
            for j in 0..3 {
                slice[3 * i + j] = value[(i, j)];
            }
        }
    }
}

/// A finite-strain constitutive law.
///
/// The driver owns the state buffer; the material receives a borrowed slice
/// for the duration of each call and must not retain it. Failure of the
/// stress update (e.g. a diverged return mapping) is reported through the
/// error value and handled by the caller through substep cutting.
pub trait FiniteStrainMaterial {
    /// The layout of this material's state variables.
    fn state_layout(&self) -> StateLayout;

    /// Number of doubles the state buffer must provide.
    fn num_state_vars(&self) -> usize {
        self.state_layout().total_len()
    }

    /// Populate a fresh state buffer with the virgin state.
    fn initialize_state(&self, state: &mut [f64]) -> Result<(), Error>;

    /// Compute the Kirchhoff stress, the energy density and the algorithmic
    /// tangent $\partial \boldsymbol\tau / \partial \boldsymbol F$ for the
    /// deformation gradient at the end of the increment, updating the state
    /// buffer in place.
    fn compute_stress(
        &self,
        deformation_gradient: &Matrix3<f64>,
        time: &TimeIncrement,
        state: &mut [f64],
    ) -> Result<(ConstitutiveResponse, Tensor4<f64>), Error>;
}

/// A small-strain (hypo-elastic) constitutive law over Voigt 6-vectors.
///
/// Stresses are engineering stresses $(\sigma_{11}, \sigma_{22}, \sigma_{33},
/// \sigma_{12}, \sigma_{13}, \sigma_{23})$ and strains carry engineering
/// shear components (twice the tensor shear).
pub trait SmallStrainMaterial {
    fn state_layout(&self) -> StateLayout;

    fn num_state_vars(&self) -> usize {
        self.state_layout().total_len()
    }

    fn initialize_state(&self, state: &mut [f64]) -> Result<(), Error>;

    /// Mass density from the material parameters.
    fn density(&self) -> f64 {
        0.0
    }

    /// Update `stress` by the strain increment and return the consistent
    /// tangent $\partial \Delta\sigma / \partial \Delta\varepsilon$.
    fn compute_stress(
        &self,
        stress: &mut Vector6<f64>,
        strain_increment: &Vector6<f64>,
        time: &TimeIncrement,
        state: &mut [f64],
    ) -> Result<Matrix6<f64>, Error>;
}
