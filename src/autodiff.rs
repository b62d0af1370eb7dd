//! Forward-mode automatic differentiation drivers over tensor fields.
//!
//! Each driver seeds the components of the input tensor with unit dual
//! perturbations, evaluates the user function and reads the derivative slots
//! back. The drivers provide the gradient, Hessian and third derivative of a
//! scalar-valued function of a second-rank tensor, the Jacobian of a
//! tensor-valued function of a tensor, and the mixed tensor–scalar second
//! derivative needed by hardening couplings.

use crate::dual::{Dual, Dual1, Dual2, Dual3};
use crate::tensor::{Tensor4, Tensor6};
use itertools::iproduct;
use nalgebra::Matrix3;

fn constant_2(value: f64) -> Dual2 {
    Dual::constant(value)
}

fn constant_3(value: f64) -> Dual3 {
    Dual::constant(value)
}

/// The value and gradient of a scalar-valued function of a second-rank
/// tensor, $\partial f / \partial T$.
pub fn gradient<F>(f: F, t: &Matrix3<f64>) -> (f64, Matrix3<f64>)
where
    F: Fn(&Matrix3<Dual1>) -> Dual1,
{
    let mut seeded = t.map(Dual1::constant);
    let mut grad = Matrix3::zeros();
    let mut value = 0.0;

    for (i, j) in iproduct!(0..3, 0..3) {
        seeded[(i, j)].grad = 1.0;
        let result = f(&seeded);
        value = result.val;
        grad[(i, j)] = result.grad;
        seeded[(i, j)].grad = 0.0;
    }

    (value, grad)
}

/// The value, gradient and Hessian of a scalar-valued function of a
/// second-rank tensor, $(\partial f / \partial T, \partial^2 f / \partial T \partial T)$.
pub fn hessian<F>(f: F, t: &Matrix3<f64>) -> (f64, Matrix3<f64>, Tensor4<f64>)
where
    F: Fn(&Matrix3<Dual2>) -> Dual2,
{
    let mut seeded = t.map(constant_2);
    let mut grad = Matrix3::zeros();
    let mut hess = Tensor4::zeros();
    let mut value = 0.0;

    for (i, j) in iproduct!(0..3, 0..3) {
        seeded[(i, j)].grad.val = 1.0;
        for (k, l) in iproduct!(0..3, 0..3) {
            seeded[(k, l)].val.grad = 1.0;
            let result = f(&seeded);
            value = result.val.val;
            grad[(i, j)] = result.grad.val;
            hess[(i, j, k, l)] = result.grad.grad;
            seeded[(k, l)].val.grad = 0.0;
        }
        seeded[(i, j)].grad.val = 0.0;
    }

    (value, grad, hess)
}

/// The value and first three derivatives of a scalar-valued function of a
/// second-rank tensor; the third derivative is a rank-6 tensor.
pub fn third_derivative<F>(
    f: F,
    t: &Matrix3<f64>,
) -> (f64, Matrix3<f64>, Tensor4<f64>, Tensor6<f64>)
where
    F: Fn(&Matrix3<Dual3>) -> Dual3,
{
    let mut seeded = t.map(constant_3);
    let mut grad = Matrix3::zeros();
    let mut hess = Tensor4::zeros();
    let mut third = Tensor6::zeros();
    let mut value = 0.0;

    for (i, j) in iproduct!(0..3, 0..3) {
        seeded[(i, j)].grad.val.val = 1.0;
        for (k, l) in iproduct!(0..3, 0..3) {
            seeded[(k, l)].val.grad.val = 1.0;
            for (m, n) in iproduct!(0..3, 0..3) {
                seeded[(m, n)].val.val.grad = 1.0;
                let result = f(&seeded);
                value = result.val.val.val;
                grad[(i, j)] = result.grad.val.val;
                hess[(i, j, k, l)] = result.grad.grad.val;
                third[[i, j, k, l, m, n]] = result.grad.grad.grad;
                seeded[(m, n)].val.val.grad = 0.0;
            }
            seeded[(k, l)].val.grad.val = 0.0;
        }
        seeded[(i, j)].grad.val.val = 0.0;
    }

    (value, grad, hess, third)
}

/// The value and Jacobian of a tensor-valued function of a second-rank
/// tensor, $(F, \partial F / \partial T)$.
pub fn jacobian<F>(f: F, t: &Matrix3<f64>) -> (Matrix3<f64>, Tensor4<f64>)
where
    F: Fn(&Matrix3<Dual1>) -> Matrix3<Dual1>,
{
    let mut seeded = t.map(Dual1::constant);
    let mut value = Matrix3::zeros();
    let mut jac = Tensor4::zeros();

    for (k, l) in iproduct!(0..3, 0..3) {
        seeded[(k, l)].grad = 1.0;
        let result = f(&seeded);
        for (i, j) in iproduct!(0..3, 0..3) {
            value[(i, j)] = result[(i, j)].val;
            jac[(i, j, k, l)] = result[(i, j)].grad;
        }
        seeded[(k, l)].grad = 0.0;
    }

    (value, jac)
}

/// The mixed second derivative $\partial^2 f / \partial T \partial s$ of a
/// scalar-valued function of a second-rank tensor and a scalar.
pub fn tensor_scalar_hessian<F>(f: F, t: &Matrix3<f64>, s: f64) -> Matrix3<f64>
where
    F: Fn(&Matrix3<Dual2>, Dual2) -> Dual2,
{
    let mut seeded = t.map(constant_2);
    let mut scalar = constant_2(s);
    scalar.val.grad = 1.0;
    let mut mixed = Matrix3::zeros();

    for (i, j) in iproduct!(0..3, 0..3) {
        seeded[(i, j)].grad.val = 1.0;
        let result = f(&seeded, scalar);
        mixed[(i, j)] = result.grad.grad;
        seeded[(i, j)].grad.val = 0.0;
    }

    mixed
}
