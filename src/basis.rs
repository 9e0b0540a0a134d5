//! Canonical qubit and qutrit measurement bases.
//!
//! The table holds four measurement settings per local dimension. Setting 0
//! is the computational basis and setting 3 repeats it, so the three settings
//! `1..=3` are the ones evaluated by the fixed-basis deficit.
//!
//! | setting | qubit            | qutrit                        |
//! |---------|------------------|-------------------------------|
//! | 0       | `{|0>, |1>}`     | `{|0>, |1>, |2>}`             |
//! | 1       | `{|+>, |->}`     | real symmetric basis          |
//! | 2       | `{|+i>, |-i>}`   | complex-phase basis           |
//! | 3       | same as 0        | same as 0                     |

use nalgebra::DVector;
use num_complex::Complex;

use crate::measurement::MeasuredFamily;
use crate::precision::{CMat, Precision, cpx, lit, real};

/// Number of measurement settings stored per local dimension.
pub const SETTINGS: usize = 4;

/// The four Pauli matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity.
    I,
    X,
    Y,
    Z,
}

/// An orthonormal basis together with the rank-1 projectors onto its vectors.
#[derive(Debug, Clone)]
pub struct Basis<T: Precision> {
    kets: Vec<DVector<Complex<T>>>,
    projectors: Vec<CMat<T>>,
}

impl<T: Precision> Basis<T> {
    /// Builds the basis and its projectors `|k><k|` from the given kets.
    pub fn from_kets(kets: Vec<DVector<Complex<T>>>) -> Self {
        let projectors = kets.iter().map(|k| k * k.adjoint()).collect();
        Basis { kets, projectors }
    }

    /// Basis vectors, in order.
    pub fn kets(&self) -> &[DVector<Complex<T>>] {
        &self.kets
    }

    /// Projectors onto the basis vectors, in the same order as [`Basis::kets`].
    pub fn projectors(&self) -> &[CMat<T>] {
        &self.projectors
    }

    /// The `i`-th basis vector, `None` past the dimension.
    pub fn ket(&self, i: usize) -> Option<&DVector<Complex<T>>> {
        self.kets.get(i)
    }

    /// The `i`-th projector, `None` past the dimension.
    pub fn projector(&self, i: usize) -> Option<&CMat<T>> {
        self.projectors.get(i)
    }
}

/// Immutable lookup table of Pauli matrices and canonical measurement bases.
///
/// Built once per precision and shared through [`Precision::basis_table`];
/// [`BasisTable::new`] can also be called directly to inject a private copy.
#[derive(Debug, Clone)]
pub struct BasisTable<T: Precision> {
    pauli: [CMat<T>; 4],
    qubit: [Basis<T>; SETTINGS],
    qutrit: [Basis<T>; SETTINGS],
}

impl<T: Precision> BasisTable<T> {
    /// Evaluates the closed-form definitions of every entry.
    pub fn new() -> Self {
        let o = Complex::new(T::zero(), T::zero());
        let one = real(T::one());
        let i = cpx(T::zero(), T::one());
        let s = lit::<T>(0.5).sqrt();
        let h = real(lit::<T>(0.5));
        let rs = real(s);
        let is = cpx(T::zero(), s);

        let pauli = [
            CMat::from_row_slice(2, 2, &[one, o, o, one]),
            CMat::from_row_slice(2, 2, &[o, one, one, o]),
            CMat::from_row_slice(2, 2, &[o, -i, i, o]),
            CMat::from_row_slice(2, 2, &[one, o, o, -one]),
        ];

        let ket = |v: &[Complex<T>]| DVector::from_column_slice(v);

        let computational2 = vec![ket(&[one, o]), ket(&[o, one])];
        let qubit = [
            Basis::from_kets(computational2.clone()),
            Basis::from_kets(vec![ket(&[rs, rs]), ket(&[rs, -rs])]),
            Basis::from_kets(vec![ket(&[rs, is]), ket(&[rs, -is])]),
            Basis::from_kets(computational2),
        ];

        let computational3 = vec![ket(&[one, o, o]), ket(&[o, one, o]), ket(&[o, o, one])];
        let qutrit = [
            Basis::from_kets(computational3.clone()),
            Basis::from_kets(vec![
                ket(&[h, rs, h]),
                ket(&[-rs, o, rs]),
                ket(&[h, -rs, h]),
            ]),
            Basis::from_kets(vec![
                ket(&[-h, -is, h]),
                ket(&[rs, o, rs]),
                ket(&[-h, is, h]),
            ]),
            Basis::from_kets(computational3),
        ];

        BasisTable {
            pauli,
            qubit,
            qutrit,
        }
    }

    /// The Pauli matrix `which`.
    pub fn pauli(&self, which: Pauli) -> &CMat<T> {
        &self.pauli[which as usize]
    }

    /// Qubit basis for a measurement setting, `None` outside `0..SETTINGS`.
    pub fn qubit(&self, setting: usize) -> Option<&Basis<T>> {
        self.qubit.get(setting)
    }

    /// Qutrit basis for a measurement setting, `None` outside `0..SETTINGS`.
    pub fn qutrit(&self, setting: usize) -> Option<&Basis<T>> {
        self.qutrit.get(setting)
    }

    /// Basis of the given measured family for a measurement setting.
    pub fn basis(&self, family: MeasuredFamily, setting: usize) -> Option<&Basis<T>> {
        self.settings(family).get(setting)
    }

    /// Computational basis (setting 0) of the family.
    pub fn computational(&self, family: MeasuredFamily) -> &Basis<T> {
        &self.settings(family)[0]
    }

    /// Settings `1..=3`, the ones the fixed-basis deficit compares.
    pub fn canonical(&self, family: MeasuredFamily) -> [&Basis<T>; 3] {
        let [_, a, b, c] = self.settings(family);
        [a, b, c]
    }

    fn settings(&self, family: MeasuredFamily) -> &[Basis<T>; SETTINGS] {
        match family {
            MeasuredFamily::Qubit => &self.qubit,
            MeasuredFamily::Qutrit => &self.qutrit,
        }
    }
}

impl<T: Precision> Default for BasisTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
