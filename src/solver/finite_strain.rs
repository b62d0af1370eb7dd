//! The finite-strain material-point driver.
//!
//! Control is mixed per component of the displacement gradient
//! $\nabla \boldsymbol u = \boldsymbol F - \boldsymbol I$ and the Kirchhoff
//! stress: each of the nine components is driven either by a displacement
//! gradient target or by a stress target. Components flatten row-major,
//! $(i, j) \mapsto 3i + j$.

use crate::error::Error;
use crate::material::{FiniteStrainMaterial, TimeIncrement};
use crate::mechanics::voigt;
use crate::solver::{
    format_csv_label, format_csv_value, SolverOptions, SUBSTEP_GROWTH, TIME_MATCH_TOLERANCE,
};
use crate::tensor::{sym, Tensor4};
use log::{debug, warn};
use nalgebra::{Matrix3, SVector};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A loading step: piecewise-linear displacement gradient and Kirchhoff
/// stress targets over a pseudo-time interval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Target displacement gradient increment over the whole step.
    pub grad_u_increment: Matrix3<f64>,
    /// Target Kirchhoff stress increment over the whole step.
    pub stress_increment: Matrix3<f64>,
    /// Components (row-major) driven by the displacement gradient target.
    pub grad_u_controlled: [bool; 9],
    /// Components (row-major) driven by the stress target.
    pub stress_controlled: [bool; 9],
    pub time_start: f64,
    pub time_end: f64,
    pub dt_start: f64,
    pub dt_min: f64,
    pub dt_max: f64,
    pub max_increments: usize,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            grad_u_increment: Matrix3::zeros(),
            stress_increment: Matrix3::zeros(),
            grad_u_controlled: [false; 9],
            stress_controlled: [true; 9],
            time_start: 0.0,
            time_end: 1.0,
            dt_start: 0.1,
            dt_min: 1e-6,
            dt_max: 0.5,
            max_increments: 100,
        }
    }
}

impl Step {
    /// Check that for each component exactly one of displacement gradient or
    /// stress is controlled.
    pub fn validate(&self) -> Result<(), Error> {
        for i in 0..9 {
            if self.grad_u_controlled[i] == self.stress_controlled[i] {
                return Err(Error::InvalidArgument(format!(
                    "exactly one of displacement gradient or stress must be controlled \
                     for component {i}"
                )));
            }
        }
        if self.time_end <= self.time_start {
            return Err(Error::InvalidArgument(
                "step must span a positive time interval".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Increment {
    grad_u_increment: SVector<f64, 9>,
    stress_increment: SVector<f64, 9>,
    grad_u_controlled: [bool; 9],
    time_old: f64,
    dt: f64,
}

/// The state recorded after each accepted increment.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub time: f64,
    /// Kirchhoff stress.
    pub stress: Matrix3<f64>,
    /// Deformation gradient at the end of the increment.
    pub deformation_gradient: Matrix3<f64>,
    /// Algorithmic tangent $\partial\boldsymbol\tau / \partial\boldsymbol F$.
    pub tangent: Tensor4<f64>,
    pub state: Vec<f64>,
}

fn flatten(tensor: &Matrix3<f64>) -> SVector<f64, 9> {
    SVector::from_fn(|index, _| tensor[(index / 3, index % 3)])
}

fn unflatten(vector: &SVector<f64, 9>) -> Matrix3<f64> {
    Matrix3::from_fn(|i, j| vector[3 * i + j])
}

/// Drives a [`FiniteStrainMaterial`] through a sequence of mixed-control
/// loading steps.
#[derive(Clone, Debug)]
pub struct MaterialPointSolver<M> {
    material: M,
    options: SolverOptions,
    steps: Vec<Step>,
    history: Vec<HistoryEntry>,
    stress: Matrix3<f64>,
    grad_u: Matrix3<f64>,
    tangent: Tensor4<f64>,
    state: Vec<f64>,
    state_trial: Vec<f64>,
    initial_stress: Matrix3<f64>,
    initial_state: Vec<f64>,
}

impl<M: FiniteStrainMaterial> MaterialPointSolver<M> {
    pub fn new(material: M, options: SolverOptions) -> Result<Self, Error> {
        let mut state = vec![0.0; material.num_state_vars()];
        material.initialize_state(&mut state)?;
        Ok(Self {
            options,
            steps: Vec::new(),
            history: Vec::new(),
            stress: Matrix3::zeros(),
            grad_u: Matrix3::zeros(),
            tangent: Tensor4::zeros(),
            state_trial: state.clone(),
            initial_state: state.clone(),
            state,
            initial_stress: Matrix3::zeros(),
            material,
        })
    }

    /// Append a loading step after validating its control flags.
    pub fn add_step(&mut self, step: Step) -> Result<(), Error> {
        step.validate()?;
        self.steps.push(step);
        Ok(())
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn clear_steps(&mut self) {
        self.steps.clear();
    }

    /// Inject an initial stress and state, e.g. a preload.
    pub fn set_initial_state(&mut self, stress: Matrix3<f64>, state: Vec<f64>) -> Result<(), Error> {
        if state.len() != self.state.len() {
            return Err(Error::InvalidArgument(format!(
                "expected {} state variables, got {}",
                self.state.len(),
                state.len()
            )));
        }
        self.initial_stress = stress;
        self.stress = stress;
        self.initial_state = state.clone();
        self.state = state;
        Ok(())
    }

    /// Reset stress, deformation, state and history to the initial
    /// configuration.
    pub fn reset_to_initial_state(&mut self) {
        self.stress = self.initial_stress;
        self.grad_u = Matrix3::zeros();
        self.state.copy_from_slice(&self.initial_state);
        self.history.clear();
    }

    /// Solve all added steps in order.
    pub fn solve(&mut self) -> Result<(), Error> {
        let steps = self.steps.clone();
        for step in &steps {
            debug!(
                "solving step from {} to {}",
                step.time_start, step.time_end
            );
            self.solve_step(step)?;
        }
        Ok(())
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn material(&self) -> &M {
        &self.material
    }

    /// The current deformation gradient $\boldsymbol F = \boldsymbol I + \nabla\boldsymbol u$.
    pub fn deformation_gradient(&self) -> Matrix3<f64> {
        Matrix3::identity() + self.grad_u
    }

    fn solve_step(&mut self, step: &Step) -> Result<(), Error> {
        let step_time = step.time_end - step.time_start;
        let mut time = step.time_start;
        let mut dt = step.dt_start;
        let mut counter = 0;

        while time < step.time_end - TIME_MATCH_TOLERANCE && counter <= step.max_increments {
            if time + dt > step.time_end {
                dt = step.time_end - time;
            }

            let scale = dt / step_time;
            let increment = Increment {
                grad_u_increment: flatten(&step.grad_u_increment) * scale,
                stress_increment: flatten(&step.stress_increment) * scale,
                grad_u_controlled: step.grad_u_controlled,
                time_old: time,
                dt,
            };

            match self.solve_increment(&increment) {
                Ok(()) => {
                    time += dt;
                    counter += 1;
                    dt = (dt * SUBSTEP_GROWTH).min(step.dt_max);
                }
                Err(error) if error.is_recoverable_by_substepping() => {
                    if dt <= step.dt_min {
                        return Err(Error::MinStepReached {
                            time,
                            dt_min: step.dt_min,
                        });
                    }
                    warn!("increment failed at t = {time} ({error}); cutting dt = {dt:e}");
                    dt = (dt / 2.0).max(step.dt_min);
                }
                Err(error) => return Err(error),
            }
        }

        if (time - step.time_end).abs() > TIME_MATCH_TOLERANCE {
            return Err(Error::MaxIncrementsReached {
                count: step.max_increments,
            });
        }
        Ok(())
    }

    fn solve_increment(&mut self, increment: &Increment) -> Result<(), Error> {
        let mut d_grad_u = SVector::<f64, 9>::zeros();
        let mut target = increment.stress_increment;
        for i in 0..9 {
            if increment.grad_u_controlled[i] {
                d_grad_u[i] = increment.grad_u_increment[i];
                target[i] = increment.grad_u_increment[i];
            }
        }

        let time = TimeIncrement {
            time: increment.time_old + increment.dt,
            dt: increment.dt,
        };

        let mut counter = 0;
        let mut correction_norm = 0.0;
        let mut stress_trial;
        let mut tangent;

        loop {
            self.state_trial.copy_from_slice(&self.state);
            let deformation_gradient =
                Matrix3::identity() + self.grad_u + unflatten(&d_grad_u);

            let (response, dtau_df) = self.material.compute_stress(
                &deformation_gradient,
                &time,
                &mut self.state_trial,
            )?;
            stress_trial = response.kirchhoff_stress;
            tangent = dtau_df;

            let mut residual = flatten(&(stress_trial - self.stress));
            for i in 0..9 {
                if increment.grad_u_controlled[i] {
                    residual[i] = d_grad_u[i];
                }
            }
            residual -= target;
            let residual_norm = residual.norm();

            debug!(
                "    iteration {counter}, ||dGradU|| = {correction_norm:e}, \
                 ||R|| = {residual_norm:e}"
            );

            if correction_norm < self.options.correction_tolerance
                && residual_norm < self.options.residual_tolerance
            {
                break;
            }
            if counter >= self.options.max_iterations {
                return Err(Error::NonConvergentIncrement { iterations: counter });
            }

            let mut modified_tangent = tangent.to_flat();
            for i in 0..9 {
                if increment.grad_u_controlled[i] {
                    modified_tangent.row_mut(i).fill(0.0);
                    modified_tangent[(i, i)] = 1.0;
                }
            }

            let correction = modified_tangent
                .full_piv_lu()
                .solve(&residual)
                .ok_or(Error::SingularTangent)?;
            correction_norm = correction.norm();
            d_grad_u -= correction;
            counter += 1;
        }

        self.grad_u += unflatten(&d_grad_u);
        self.stress = stress_trial;
        self.state.copy_from_slice(&self.state_trial);
        self.tangent = tangent;
        self.history.push(HistoryEntry {
            time: increment.time_old + increment.dt,
            stress: self.stress,
            deformation_gradient: self.deformation_gradient(),
            tangent,
            state: self.state.clone(),
        });
        Ok(())
    }

    /// Export the recorded history as CSV in the layout
    /// `Time, Stress_11..Stress_23, Strain_11..Strain_23, StateVar_1..n`.
    ///
    /// Stress columns hold the Kirchhoff stress in Voigt order; strain
    /// columns hold the symmetric part of the displacement gradient with
    /// engineering shear components.
    pub fn export_history_csv(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        let mut file = File::create(path)?;
        let n_state = self.state.len();

        let mut header = String::from("#");
        header.push_str(&format_csv_label("Time"));
        for component in ["11", "22", "33", "12", "13", "23"] {
            header.push(',');
            header.push_str(&format_csv_label(&format!("Stress_{component}")));
        }
        for component in ["11", "22", "33", "12", "13", "23"] {
            header.push(',');
            header.push_str(&format_csv_label(&format!("Strain_{component}")));
        }
        for i in 1..=n_state {
            header.push(',');
            header.push_str(&format_csv_label(&format!("StateVar_{i}")));
        }
        writeln!(file, "{header}")?;

        for entry in &self.history {
            let stress = voigt::stress_to_voigt(&entry.stress);
            let strain = voigt::strain_to_voigt(&sym(
                &(entry.deformation_gradient - Matrix3::identity()),
            ));
            let mut line = String::new();
            line.push_str(&format_csv_value(entry.time));
            for i in 0..6 {
                line.push(',');
                line.push_str(&format_csv_value(stress[i]));
            }
            for i in 0..6 {
                line.push(',');
                line.push_str(&format_csv_value(strain[i]));
            }
            for value in &entry.state {
                line.push(',');
                line.push_str(&format_csv_value(*value));
            }
            writeln!(file, "{line}")?;
        }
        Ok(())
    }
}
