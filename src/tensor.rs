//! Fixed-size tensor algebra on 3D spatial indices.
//!
//! Rank-1 and rank-2 tensors are `nalgebra` vectors and matrices; this module
//! adds the rank-3, rank-4 and rank-6 types the constitutive core needs,
//! together with the contractions, dyadic products and named isotropic
//! tensors of continuum mechanics. Everything is generic over
//! [`SmoothScalar`], so the same kernels run on plain reals, duals and
//! complex numbers.
//!
//! The flattening convention used crate-wide maps the index pair $(i, j)$ to
//! the flat index $3 i + j$ (row-major); rank-4 tensors flatten to
//! $9 \times 9$ matrices accordingly.

use crate::constants::NUM_ZERO_POS;
use crate::scalar::SmoothScalar;
use itertools::iproduct;
use nalgebra::{Matrix3, SMatrix};
use numeric_literals::replace_float_literals;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

pub mod exponential;

/// The determinant of a second-rank tensor, by cofactor expansion.
///
/// `nalgebra`'s own determinant requires a full field scalar; this version
/// only needs ring arithmetic and therefore works for duals.
pub fn det<T: SmoothScalar>(t: &Matrix3<T>) -> T {
    t[(0, 0)] * (t[(1, 1)] * t[(2, 2)] - t[(1, 2)] * t[(2, 1)])
        - t[(0, 1)] * (t[(1, 0)] * t[(2, 2)] - t[(1, 2)] * t[(2, 0)])
        + t[(0, 2)] * (t[(1, 0)] * t[(2, 1)] - t[(1, 1)] * t[(2, 0)])
}

/// The analytic inverse of a second-rank tensor.
///
/// Returns `None` when the real shadow of the determinant falls below the
/// numerical zero floor.
pub fn try_inv<T: SmoothScalar>(t: &Matrix3<T>) -> Option<Matrix3<T>> {
    let d = det(t);
    if d.real().abs() < NUM_ZERO_POS {
        return None;
    }
    let inv_det = d.recip();
    let adjugate = Matrix3::new(
        t[(1, 1)] * t[(2, 2)] - t[(1, 2)] * t[(2, 1)],
        t[(0, 2)] * t[(2, 1)] - t[(0, 1)] * t[(2, 2)],
        t[(0, 1)] * t[(1, 2)] - t[(0, 2)] * t[(1, 1)],
        t[(1, 2)] * t[(2, 0)] - t[(1, 0)] * t[(2, 2)],
        t[(0, 0)] * t[(2, 2)] - t[(0, 2)] * t[(2, 0)],
        t[(0, 2)] * t[(1, 0)] - t[(0, 0)] * t[(1, 2)],
        t[(1, 0)] * t[(2, 1)] - t[(1, 1)] * t[(2, 0)],
        t[(0, 1)] * t[(2, 0)] - t[(0, 0)] * t[(2, 1)],
        t[(0, 0)] * t[(1, 1)] - t[(0, 1)] * t[(1, 0)],
    );
    Some(adjugate * inv_det)
}

/// The symmetric part $\frac{1}{2}(T + T^\top)$.
#[replace_float_literals(T::from_f64(literal))]
pub fn sym<T: SmoothScalar>(t: &Matrix3<T>) -> Matrix3<T> {
    (t + t.transpose()) * 0.5
}

/// The deviatoric part $T - \frac{1}{3}\operatorname{tr}(T)\,I$.
#[replace_float_literals(T::from_f64(literal))]
pub fn dev<T: SmoothScalar>(t: &Matrix3<T>) -> Matrix3<T> {
    let hydrostatic = t.trace() * (1.0 / 3.0);
    let mut result = t.clone_owned();
    for i in 0..3 {
        result[(i, i)] = result[(i, i)] - hydrostatic;
    }
    result
}

/// The double contraction $A : B = A_{ij} B_{ij}$.
pub fn ddot<T: SmoothScalar>(a: &Matrix3<T>, b: &Matrix3<T>) -> T {
    let mut result = T::zero();
    for (i, j) in iproduct!(0..3, 0..3) {
        result = result + a[(i, j)] * b[(i, j)];
    }
    result
}

/// The Frobenius norm $\sqrt{T : T}$.
pub fn frobenius_norm<T: SmoothScalar>(t: &Matrix3<T>) -> T {
    ddot(t, t).sqrt()
}

/// Lift a real-valued tensor to any [`SmoothScalar`] component-wise.
pub fn lift<T: SmoothScalar>(t: &Matrix3<f64>) -> Matrix3<T> {
    t.map(T::from_f64)
}

/// Project the real shadow of a tensor with arbitrary scalar entries.
pub fn real_shadow<T: SmoothScalar>(t: &Matrix3<T>) -> Matrix3<f64> {
    t.map(|entry| entry.real())
}

/// A third-rank tensor on $3 \times 3 \times 3$ indices.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tensor3<T>(pub [[[T; 3]; 3]; 3]);

impl<T: SmoothScalar> Tensor3<T> {
    pub fn zeros() -> Self {
        Self([[[T::zero(); 3]; 3]; 3])
    }

    pub fn from_fn(f: impl Fn(usize, usize, usize) -> T) -> Self {
        let mut result = Self::zeros();
        for (i, j, k) in iproduct!(0..3, 0..3, 0..3) {
            result[(i, j, k)] = f(i, j, k);
        }
        result
    }
}

impl Tensor3<f64> {
    /// The Levi-Civita permutation tensor, $\epsilon_{123} = +1$.
    pub fn levi_civita() -> Self {
        let mut eps = Self::zeros();
        eps[(0, 1, 2)] = 1.0;
        eps[(1, 2, 0)] = 1.0;
        eps[(2, 0, 1)] = 1.0;
        eps[(0, 2, 1)] = -1.0;
        eps[(2, 1, 0)] = -1.0;
        eps[(1, 0, 2)] = -1.0;
        eps
    }
}

impl<T> Index<(usize, usize, usize)> for Tensor3<T> {
    type Output = T;

    fn index(&self, (i, j, k): (usize, usize, usize)) -> &T {
        &self.0[i][j][k]
    }
}

impl<T> IndexMut<(usize, usize, usize)> for Tensor3<T> {
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut T {
        &mut self.0[i][j][k]
    }
}

/// A fourth-rank tensor on $3 \times 3 \times 3 \times 3$ indices.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tensor4<T>(pub [[[[T; 3]; 3]; 3]; 3]);

impl<T: SmoothScalar> Tensor4<T> {
    pub fn zeros() -> Self {
        Self([[[[T::zero(); 3]; 3]; 3]; 3])
    }

    pub fn from_fn(f: impl Fn(usize, usize, usize, usize) -> T) -> Self {
        let mut result = Self::zeros();
        for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            result[(i, j, k, l)] = f(i, j, k, l);
        }
        result
    }

    /// The dyadic product $(A \otimes B)_{ijkl} = A_{ij} B_{kl}$.
    pub fn dyad(a: &Matrix3<T>, b: &Matrix3<T>) -> Self {
        Self::from_fn(|i, j, k, l| a[(i, j)] * b[(k, l)])
    }

    /// Contract the trailing index pair with a second-rank tensor:
    /// $(C : B)_{ij} = C_{ijkl} B_{kl}$.
    pub fn ddot_rank2(&self, b: &Matrix3<T>) -> Matrix3<T> {
        let mut result = Matrix3::zeros();
        for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            result[(i, j)] += self[(i, j, k, l)] * b[(k, l)];
        }
        result
    }

    /// Contract the leading index pair with a second-rank tensor:
    /// $(A : C)_{kl} = A_{ij} C_{ijkl}$.
    pub fn contract_left(&self, a: &Matrix3<T>) -> Matrix3<T> {
        let mut result = Matrix3::zeros();
        for (i, j, k, l) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            result[(k, l)] += a[(i, j)] * self[(i, j, k, l)];
        }
        result
    }

    /// The composition $(A \circ B)_{ijmn} = A_{ijkl} B_{klmn}$.
    pub fn compose(&self, other: &Self) -> Self {
        let mut result = Self::zeros();
        for (i, j, m, n) in iproduct!(0..3, 0..3, 0..3, 0..3) {
            let mut sum = T::zero();
            for (k, l) in iproduct!(0..3, 0..3) {
                sum = sum + self[(i, j, k, l)] * other[(k, l, m, n)];
            }
            result[(i, j, m, n)] = sum;
        }
        result
    }

    /// Swap the leading index pair: $T^\prime_{ijkl} = T_{jikl}$.
    pub fn swap_first_pair(&self) -> Self {
        Self::from_fn(|i, j, k, l| self[(j, i, k, l)])
    }

    /// Flatten to a $9 \times 9$ matrix with the crate-wide convention
    /// $(i, j) \mapsto 3i + j$.
    pub fn to_flat(&self) -> SMatrix<T, 9, 9> {
        SMatrix::from_fn(|row, col| self[(row / 3, row % 3, col / 3, col % 3)])
    }

    /// Inverse of [`Tensor4::to_flat`].
    pub fn from_flat(flat: &SMatrix<T, 9, 9>) -> Self {
        Self::from_fn(|i, j, k, l| flat[(3 * i + j, 3 * k + l)])
    }
}

impl Tensor4<f64> {
    /// $\mathbb I_4$, with $\delta_{ik}\delta_{jl}$.
    pub fn identity_4() -> Self {
        Self::from_fn(|i, j, k, l| ((i == k && j == l) as u8) as f64)
    }

    /// $\mathbb I_4^\top$, with $\delta_{il}\delta_{jk}$.
    pub fn identity_4_transpose() -> Self {
        Self::from_fn(|i, j, k, l| ((i == l && j == k) as u8) as f64)
    }

    /// The symmetrizing projector
    /// $\frac{1}{2}(\delta_{ik}\delta_{jl} + \delta_{il}\delta_{jk})$.
    pub fn sym_identity() -> Self {
        Self::from_fn(|i, j, k, l| {
            0.5 * (((i == k && j == l) as u8) as f64 + ((i == l && j == k) as u8) as f64)
        })
    }

    /// The skew projector
    /// $\frac{1}{2}(\delta_{ik}\delta_{jl} - \delta_{il}\delta_{jk})$.
    pub fn skw_identity() -> Self {
        Self::from_fn(|i, j, k, l| {
            0.5 * (((i == k && j == l) as u8) as f64 - ((i == l && j == k) as u8) as f64)
        })
    }

    /// $\mathbb I_{\mathrm{hyd}} = I \otimes I$, with $\delta_{ij}\delta_{kl}$.
    pub fn hyd_identity() -> Self {
        Self::from_fn(|i, j, k, l| ((i == j && k == l) as u8) as f64)
    }

    /// The deviatoric projector $\mathbb D = \mathbb I_4 - \frac{1}{3} \mathbb I_{\mathrm{hyd}}$.
    pub fn deviatoric_projector() -> Self {
        Self::identity_4() + Self::hyd_identity() * (-1.0 / 3.0)
    }
}

impl<T> Index<(usize, usize, usize, usize)> for Tensor4<T> {
    type Output = T;

    fn index(&self, (i, j, k, l): (usize, usize, usize, usize)) -> &T {
        &self.0[i][j][k][l]
    }
}

impl<T> IndexMut<(usize, usize, usize, usize)> for Tensor4<T> {
    fn index_mut(&mut self, (i, j, k, l): (usize, usize, usize, usize)) -> &mut T {
        &mut self.0[i][j][k][l]
    }
}

impl<T: SmoothScalar> Add for Tensor4<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_fn(|i, j, k, l| self[(i, j, k, l)] + rhs[(i, j, k, l)])
    }
}

impl<T: SmoothScalar> Sub for Tensor4<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_fn(|i, j, k, l| self[(i, j, k, l)] - rhs[(i, j, k, l)])
    }
}

impl<T: SmoothScalar> AddAssign for Tensor4<T> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: SmoothScalar> SubAssign for Tensor4<T> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: SmoothScalar> Mul<T> for Tensor4<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self::from_fn(|i, j, k, l| self[(i, j, k, l)] * rhs)
    }
}

impl<T: SmoothScalar> Neg for Tensor4<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_fn(|i, j, k, l| -self[(i, j, k, l)])
    }
}

/// A sixth-rank tensor on 3D indices, produced by the third-order
/// differentiation driver.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor6<T> {
    data: Vec<T>,
}

impl<T: SmoothScalar> Tensor6<T> {
    pub fn zeros() -> Self {
        Self {
            data: vec![T::zero(); 729],
        }
    }

    fn flat_index(index: [usize; 6]) -> usize {
        index.iter().fold(0, |acc, &i| 3 * acc + i)
    }
}

impl<T: SmoothScalar> Index<[usize; 6]> for Tensor6<T> {
    type Output = T;

    fn index(&self, index: [usize; 6]) -> &T {
        &self.data[Self::flat_index(index)]
    }
}

impl<T: SmoothScalar> IndexMut<[usize; 6]> for Tensor6<T> {
    fn index_mut(&mut self, index: [usize; 6]) -> &mut T {
        &mut self.data[Self::flat_index(index)]
    }
}
