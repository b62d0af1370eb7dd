//! Forward-mode dual numbers of arbitrary order.
//!
//! A [`Dual<T>`] pairs a value with a directional derivative; nesting the type
//! raises the differentiation order, so `Dual<f64>` carries first derivatives,
//! `Dual<Dual<f64>>` carries second derivatives and so on. All arithmetic and
//! elementary functions propagate derivatives by the chain rule through the
//! recursive [`SmoothScalar`] implementation.
//!
//! The drivers in [`crate::autodiff`] seed and harvest these duals; user code
//! normally only needs the aliases [`Dual1`], [`Dual2`] and [`Dual3`].

use crate::scalar::SmoothScalar;
use num::{One, Zero};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A truncated first-order Taylor expansion over the scalar `T`.
///
/// `val` is the function value, `grad` the directional derivative with respect
/// to the seed direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Dual<T> {
    pub val: T,
    pub grad: T,
}

/// First-order dual.
pub type Dual1 = Dual<f64>;
/// Second-order (hyper-)dual.
pub type Dual2 = Dual<Dual1>;
/// Third-order dual.
pub type Dual3 = Dual<Dual2>;

impl<T: SmoothScalar> Dual<T> {
    pub fn new(val: T, grad: T) -> Self {
        Self { val, grad }
    }

    /// A dual with zero derivative.
    pub fn constant(value: f64) -> Self {
        Self {
            val: T::from_f64(value),
            grad: T::zero(),
        }
    }

    /// A dual seeded with a unit derivative in this order's direction.
    pub fn seeded(value: f64) -> Self {
        Self {
            val: T::from_f64(value),
            grad: T::one(),
        }
    }

    /// Increase the dual order by one.
    ///
    /// The value is copied into the new number and the first-derivative slot
    /// is shifted into the seed slot of the added order, so that a subsequent
    /// evaluation produces the next-higher derivative. Inverse of
    /// [`Dual::lower_order`].
    pub fn raise_order(self) -> Dual<Dual<T>> {
        Dual {
            val: Dual {
                val: self.val,
                grad: T::zero(),
            },
            grad: Dual {
                val: self.grad,
                grad: T::zero(),
            },
        }
    }
}

impl<T: SmoothScalar> Dual<Dual<T>> {
    /// Decrease the dual order by one, dropping the highest derivative slot.
    ///
    /// `x.raise_order().lower_order() == x`, and the value projection commutes
    /// with both morphisms.
    pub fn lower_order(self) -> Dual<T> {
        Dual {
            val: self.val.val,
            grad: self.grad.val,
        }
    }
}

impl<T: SmoothScalar> Add for Dual<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.grad + rhs.grad)
    }
}

impl<T: SmoothScalar> Sub for Dual<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.grad - rhs.grad)
    }
}

impl<T: SmoothScalar> Mul for Dual<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.val * rhs.val,
            self.val * rhs.grad + self.grad * rhs.val,
        )
    }
}

impl<T: SmoothScalar> Div for Dual<T> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::new(
            self.val / rhs.val,
            (self.grad * rhs.val - self.val * rhs.grad) / (rhs.val * rhs.val),
        )
    }
}

impl<T: SmoothScalar> Neg for Dual<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.val, -self.grad)
    }
}

impl<T: SmoothScalar> AddAssign for Dual<T> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: SmoothScalar> SubAssign for Dual<T> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: SmoothScalar> MulAssign for Dual<T> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<T: SmoothScalar> DivAssign for Dual<T> {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<T: SmoothScalar> Zero for Dual<T> {
    fn zero() -> Self {
        Self::new(T::zero(), T::zero())
    }

    fn is_zero(&self) -> bool {
        self.val.is_zero() && self.grad.is_zero()
    }
}

impl<T: SmoothScalar> One for Dual<T> {
    fn one() -> Self {
        Self::new(T::one(), T::zero())
    }
}

impl<T: SmoothScalar> SmoothScalar for Dual<T> {
    fn from_f64(value: f64) -> Self {
        Self::constant(value)
    }

    fn real(self) -> f64 {
        self.val.real()
    }

    fn sqrt(self) -> Self {
        let root = self.val.sqrt();
        Self::new(root, self.grad / (T::from_f64(2.0) * root))
    }

    fn exp(self) -> Self {
        let value = self.val.exp();
        Self::new(value, self.grad * value)
    }

    fn ln(self) -> Self {
        Self::new(self.val.ln(), self.grad / self.val)
    }

    fn sin(self) -> Self {
        Self::new(self.val.sin(), self.grad * self.val.cos())
    }

    fn cos(self) -> Self {
        Self::new(self.val.cos(), -self.grad * self.val.sin())
    }

    fn acos(self) -> Self {
        Self::new(
            self.val.acos(),
            -self.grad / (T::one() - self.val * self.val).sqrt(),
        )
    }

    fn powf(self, exponent: f64) -> Self {
        Self::new(
            self.val.powf(exponent),
            self.grad * T::from_f64(exponent) * self.val.powf(exponent - 1.0),
        )
    }
}
