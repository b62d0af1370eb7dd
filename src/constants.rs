//! Numerical constants shared across the crate.
//!
//! All tolerances used by the constitutive core are fixed here once so that
//! every subsystem clamps and truncates consistently.

/// $\sqrt{2/3}$, the factor relating the deviatoric norm to the equivalent
/// (von Mises) quantity.
pub const SQRT_2_3: f64 = 0.8164965809277260;

/// $\sqrt{3/2}$.
pub const SQRT_3_2: f64 = 1.2247448713915890;

/// $\sqrt{2}$.
pub const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// $\sqrt{3}$.
pub const SQRT_3: f64 = 1.7320508075688772;

/// $\sqrt{6}$.
pub const SQRT_6: f64 = 2.4494897427831780;

/// The golden angle $\pi (3 - \sqrt 5)$, used by the Fibonacci lattice on the
/// hemisphere.
pub const GOLDEN_ANGLE: f64 = 2.399963229728653;

/// Magnitudes below this floor are treated as numerically zero, e.g. by the
/// analytic $3 \times 3$ inverse.
pub const NUM_ZERO_POS: f64 = 1e-16;

/// $\sqrt{\varepsilon_{\mathrm{mach}}}$, the forward-difference step scale.
pub fn square_root_eps() -> f64 {
    f64::EPSILON.sqrt()
}

/// $\sqrt[3]{\varepsilon_{\mathrm{mach}}}$, the central-difference step scale.
pub fn cubic_root_eps() -> f64 {
    f64::EPSILON.cbrt()
}
