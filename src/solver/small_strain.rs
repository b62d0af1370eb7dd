//! The small-strain material-point driver over Voigt 6-vectors.

use crate::error::Error;
use crate::material::{SmallStrainMaterial, TimeIncrement};
use crate::solver::{
    format_csv_label, format_csv_value, SolverOptions, SUBSTEP_GROWTH, TIME_MATCH_TOLERANCE,
};
use log::{debug, warn};
use nalgebra::{Matrix6, Vector6};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A loading step: piecewise-linear strain and stress targets over a
/// pseudo-time interval, with per-component control flags and time step
/// bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Target strain increment (engineering Voigt) over the whole step.
    pub strain_increment: Vector6<f64>,
    /// Target stress increment over the whole step.
    pub stress_increment: Vector6<f64>,
    /// Components driven by the strain target.
    pub strain_controlled: [bool; 6],
    /// Components driven by the stress target.
    pub stress_controlled: [bool; 6],
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
            strain_increment: Vector6::zeros(),
            stress_increment: Vector6::zeros(),
            strain_controlled: [false; 6],
            stress_controlled: [true; 6],
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
    /// Check that for each component exactly one of strain or stress is
    /// controlled.
    pub fn validate(&self) -> Result<(), Error> {
        for i in 0..6 {
            if self.strain_controlled[i] == self.stress_controlled[i] {
                return Err(Error::InvalidArgument(format!(
                    "exactly one of strain or stress must be controlled for component {i}"
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

/// A single substep derived from a [`Step`] by time-fraction scaling.
#[derive(Clone, Debug)]
struct Increment {
    strain_increment: Vector6<f64>,
    stress_increment: Vector6<f64>,
    strain_controlled: [bool; 6],
    time_old: f64,
    dt: f64,
}

/// The state recorded after each accepted increment.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub time: f64,
    pub stress: Vector6<f64>,
    pub strain: Vector6<f64>,
    pub tangent: Matrix6<f64>,
    pub state: Vec<f64>,
}

/// Drives a [`SmallStrainMaterial`] through a sequence of mixed-control
/// loading steps.
#[derive(Clone, Debug)]
pub struct SmallStrainSolver<M> {
    material: M,
    options: SolverOptions,
    steps: Vec<Step>,
    history: Vec<HistoryEntry>,
    stress: Vector6<f64>,
    strain: Vector6<f64>,
    tangent: Matrix6<f64>,
    state: Vec<f64>,
    state_trial: Vec<f64>,
    initial_stress: Vector6<f64>,
    initial_state: Vec<f64>,
}

impl<M: SmallStrainMaterial> SmallStrainSolver<M> {
    pub fn new(material: M, options: SolverOptions) -> Result<Self, Error> {
        let mut state = vec![0.0; material.num_state_vars()];
        material.initialize_state(&mut state)?;
        Ok(Self {
            options,
            steps: Vec::new(),
            history: Vec::new(),
            stress: Vector6::zeros(),
            strain: Vector6::zeros(),
            tangent: Matrix6::zeros(),
            state_trial: state.clone(),
            initial_state: state.clone(),
            state,
            initial_stress: Vector6::zeros(),
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
    pub fn set_initial_state(&mut self, stress: Vector6<f64>, state: Vec<f64>) -> Result<(), Error> {
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

    /// Reset stress, strain, state and history to the initial configuration.
    pub fn reset_to_initial_state(&mut self) {
        self.stress = self.initial_stress;
        self.strain = Vector6::zeros();
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
                strain_increment: step.strain_increment * scale,
                stress_increment: step.stress_increment * scale,
                strain_controlled: step.strain_controlled,
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
        // initialize the strain-controlled components from the target
        let mut d_strain = Vector6::zeros();
        let mut target = increment.stress_increment;
        for i in 0..6 {
            if increment.strain_controlled[i] {
                d_strain[i] = increment.strain_increment[i];
                target[i] = increment.strain_increment[i];
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
            // restore the start-of-increment state for each trial evaluation
            self.state_trial.copy_from_slice(&self.state);
            stress_trial = self.stress;

            tangent = self.material.compute_stress(
                &mut stress_trial,
                &d_strain,
                &time,
                &mut self.state_trial,
            )?;

            // mixed-control residual: stress rows measure the stress
            // increment, strain rows the strain increment
            let mut residual = stress_trial - self.stress;
            for i in 0..6 {
                if increment.strain_controlled[i] {
                    residual[i] = d_strain[i];
                }
            }
            residual -= target;
            let residual_norm = residual.norm();

            debug!(
                "    iteration {counter}, ||ddE|| = {correction_norm:e}, ||R|| = {residual_norm:e}"
            );

            if correction_norm < self.options.correction_tolerance
                && residual_norm < self.options.residual_tolerance
            {
                break;
            }
            if counter >= self.options.max_iterations {
                return Err(Error::NonConvergentIncrement { iterations: counter });
            }

            let mut modified_tangent = tangent;
            for i in 0..6 {
                if increment.strain_controlled[i] {
                    modified_tangent.row_mut(i).fill(0.0);
                    modified_tangent[(i, i)] = 1.0;
                }
            }

            let correction = modified_tangent
                .full_piv_lu()
                .solve(&residual)
                .ok_or(Error::SingularTangent)?;
            correction_norm = correction.norm();
            d_strain -= correction;
            counter += 1;
        }

        self.stress = stress_trial;
        self.strain += d_strain;
        self.state.copy_from_slice(&self.state_trial);
        self.tangent = tangent;
        self.history.push(HistoryEntry {
            time: increment.time_old + increment.dt,
            stress: self.stress,
            strain: self.strain,
            tangent,
            state: self.state.clone(),
        });
        Ok(())
    }

    /// Export the recorded history as CSV in the layout
    /// `Time, Stress_11..Stress_23, Strain_11..Strain_23, StateVar_1..n`.
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
            let mut line = String::new();
            line.push_str(&format_csv_value(entry.time));
            for i in 0..6 {
                line.push(',');
                line.push_str(&format_csv_value(entry.stress[i]));
            }
            for i in 0..6 {
                line.push(',');
                line.push_str(&format_csv_value(entry.strain[i]));
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
