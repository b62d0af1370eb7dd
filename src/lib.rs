//! A composable library for constitutive material modelling in computational
//! solid mechanics.
//!
//! `solidus` provides the numerical substrate that constitutive laws for solid
//! materials stand on: small fixed-size tensor algebra on 3D indices,
//! forward-mode automatic differentiation with higher-order duals, numerical
//! differentiation fallbacks, a truncated tensor exponential with its analytic
//! derivative, a continuum-mechanics kit (deformation and stress measures,
//! hyperelastic energy densities, plastic flow integration, Voigt utilities),
//! and material-point drivers that exercise a constitutive law under mixed
//! strain/stress control with adaptive substepping.
//!
//! Concrete material models live in the companion crate `solidus-materials`.
//!
//! **Although featureful, the library API is completely unstable and the
//! functionality is not sufficiently well tested for production usage at this
//! point.**

pub mod autodiff;
pub mod constants;
pub mod dual;
pub mod error;
pub mod material;
pub mod mechanics;
pub mod numdiff;
pub mod scalar;
pub mod solver;
pub mod tensor;
pub mod testing;

pub extern crate eyre;
pub extern crate nalgebra;
pub extern crate num;

pub use dual::{Dual, Dual1, Dual2, Dual3};
pub use error::Error;
pub use scalar::SmoothScalar;
