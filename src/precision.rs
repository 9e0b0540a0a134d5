//! Floating-point precision abstraction.
//!
//! Every numerical routine is generic over [`Precision`], implemented for `f32`
//! and `f64`. Besides the tolerance used for "effectively zero" comparisons,
//! the trait hands out the process-wide basis and gate tables of its width.

use std::sync::Arc;

use nalgebra::{DMatrix, RealField};
use num_complex::Complex;
use once_cell::sync::Lazy;

use crate::basis::BasisTable;
use crate::gates::Gates;

/// Real scalar type the library computes in.
pub trait Precision: RealField + Copy {
    /// Tolerance gating "is this effectively zero" decisions.
    ///
    /// 10 machine epsilons for `f32`, 100 for `f64`.
    fn eps() -> Self;

    /// Converts from `f64`, the optimizer's working type.
    fn narrow(x: f64) -> Self;

    /// Converts into `f64`, the optimizer's working type.
    fn widen(self) -> f64;

    /// The shared, read-only basis/projector table of this precision.
    fn basis_table() -> Arc<BasisTable<Self>>;

    /// The shared, read-only gate table of this precision.
    fn gate_table() -> Arc<Gates<Self>>;
}

static BASIS_F32: Lazy<Arc<BasisTable<f32>>> = Lazy::new(|| Arc::new(BasisTable::new()));
static BASIS_F64: Lazy<Arc<BasisTable<f64>>> = Lazy::new(|| Arc::new(BasisTable::new()));
static GATES_F32: Lazy<Arc<Gates<f32>>> = Lazy::new(|| Arc::new(Gates::new()));
static GATES_F64: Lazy<Arc<Gates<f64>>> = Lazy::new(|| Arc::new(Gates::new()));

impl Precision for f32 {
    fn eps() -> Self {
        10.0 * f32::EPSILON
    }
    fn narrow(x: f64) -> Self {
        x as f32
    }
    fn widen(self) -> f64 {
        self as f64
    }
    fn basis_table() -> Arc<BasisTable<Self>> {
        Arc::clone(&BASIS_F32)
    }
    fn gate_table() -> Arc<Gates<Self>> {
        Arc::clone(&GATES_F32)
    }
}

impl Precision for f64 {
    fn eps() -> Self {
        100.0 * f64::EPSILON
    }
    fn narrow(x: f64) -> Self {
        x
    }
    fn widen(self) -> f64 {
        self
    }
    fn basis_table() -> Arc<BasisTable<Self>> {
        Arc::clone(&BASIS_F64)
    }
    fn gate_table() -> Arc<Gates<Self>> {
        Arc::clone(&GATES_F64)
    }
}

/// Complex matrix over a [`Precision`].
pub type CMat<T> = DMatrix<Complex<T>>;

/// Builds a complex number from its parts.
pub(crate) fn cpx<T: Precision>(re: T, im: T) -> Complex<T> {
    Complex::new(re, im)
}

/// Lifts a real number into the complex plane.
pub(crate) fn real<T: Precision>(re: T) -> Complex<T> {
    Complex::new(re, T::zero())
}

/// Unit-modulus phase factor `e^{i phi}`.
pub(crate) fn phase<T: Precision>(phi: T) -> Complex<T> {
    Complex::new(phi.cos(), phi.sin())
}

/// Complex identity of size `n`.
pub(crate) fn eye<T: Precision>(n: usize) -> CMat<T> {
    CMat::<T>::identity(n, n)
}

/// Lifts an `f64` literal into the working precision.
pub(crate) fn lit<T: Precision>(x: f64) -> T {
    T::narrow(x)
}
