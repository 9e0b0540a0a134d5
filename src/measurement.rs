//! Angle parametrization of complete rank-1 projective measurements.
//!
//! A qubit measurement is fixed by two angles `(θ, φ)`; a qutrit measurement
//! by five `(θ₁, θ₂, θ₃, φ, δ)`. In both cases the produced projectors are
//! mutually orthogonal and sum to the identity on the local space.

use nalgebra::DVector;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::basis::BasisTable;
use crate::error::{Error, Result};
use crate::precision::{CMat, Precision, lit, phase};

/// Local dimension of the measured party, which selects the parametrization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasuredFamily {
    /// Two-level measured party, two angles.
    Qubit,
    /// Three-level measured party, five angles.
    Qutrit,
}

impl MeasuredFamily {
    /// Selects the family for a local dimension, `None` unless it is 2 or 3.
    pub fn from_dim(dim: usize) -> Option<Self> {
        match dim {
            2 => Some(MeasuredFamily::Qubit),
            3 => Some(MeasuredFamily::Qutrit),
            _ => None,
        }
    }

    /// Local dimension of the measured party.
    pub fn dim(self) -> usize {
        match self {
            MeasuredFamily::Qubit => 2,
            MeasuredFamily::Qutrit => 3,
        }
    }

    /// Number of real angles the parametrization takes.
    pub fn angle_count(self) -> usize {
        match self {
            MeasuredFamily::Qubit => 2,
            MeasuredFamily::Qutrit => 5,
        }
    }

    /// Checks that a parameter vector has [`MeasuredFamily::angle_count`] entries.
    pub fn check_len(self, found: usize) -> Result<()> {
        let expected = self.angle_count();
        if found != expected {
            return Err(Error::InvalidParameterVectorLength { expected, found });
        }
        Ok(())
    }

    /// Local projectors for the given angles.
    pub fn projectors<T: Precision>(
        self,
        table: &BasisTable<T>,
        angles: &[T],
    ) -> Result<Vec<CMat<T>>> {
        match (self, angles) {
            (MeasuredFamily::Qubit, &[theta, phi]) => {
                Ok(qubit_projectors(table, theta, phi).to_vec())
            }
            (MeasuredFamily::Qutrit, &[t1, t2, t3, phi, delta]) => {
                Ok(qutrit_projectors(table, [t1, t2, t3, phi, delta]).to_vec())
            }
            _ => Err(Error::InvalidParameterVectorLength {
                expected: self.angle_count(),
                found: angles.len(),
            }),
        }
    }
}

fn outer<T: Precision>(v: &DVector<Complex<T>>) -> CMat<T> {
    v * v.adjoint()
}

/// Unit vectors `|0>, …, |N-1>` of the family's computational basis.
fn computational_kets<T: Precision, const N: usize>(
    table: &BasisTable<T>,
    family: MeasuredFamily,
) -> [&DVector<Complex<T>>; N] {
    let kets = table.computational(family).kets();
    std::array::from_fn(|i| &kets[i])
}

/// Qubit measurement along the Bloch direction `(θ, φ)`.
///
/// `|ψ₁> = cos(θ/2)|0> + e^{iφ} sin(θ/2)|1>` and
/// `|ψ₂> = sin(θ/2)|0> - e^{iφ} cos(θ/2)|1>`.
pub(crate) fn qubit_projectors<T: Precision>(
    table: &BasisTable<T>,
    theta: T,
    phi: T,
) -> [CMat<T>; 2] {
    let [u, d] = computational_kets(table, MeasuredFamily::Qubit);
    let half = theta * lit::<T>(0.5);
    let (s, c) = (Complex::from(half.sin()), Complex::from(half.cos()));
    let e = phase(phi);

    let psi1 = u * c + d * (e * s);
    let psi2 = u * s - d * (e * c);
    [outer(&psi1), outer(&psi2)]
}

/// Qutrit measurement from five angles `[θ₁, θ₂, θ₃, φ, δ]`.
///
/// The three polar angles are halved before use and the second phase is
/// `-φ`, which together span every orthonormal qutrit basis up to phases.
pub(crate) fn qutrit_projectors<T: Precision>(
    table: &BasisTable<T>,
    angles: [T; 5],
) -> [CMat<T>; 3] {
    let [up, mid, down] = computational_kets(table, MeasuredFamily::Qutrit);

    let half = lit::<T>(0.5);
    let (t1, t2, t3) = (angles[0] * half, angles[1] * half, angles[2] * half);
    let (c1, s1) = (Complex::from(t1.cos()), Complex::from(t1.sin()));
    let (c2, s2) = (Complex::from(t2.cos()), Complex::from(t2.sin()));
    let (c3, s3) = (Complex::from(t3.cos()), Complex::from(t3.sin()));
    let e_phi1 = phase(angles[3]);
    let e_phi2 = phase(-angles[3]);
    let e_del = phase(angles[4]);
    let e_ndel = phase(-angles[4]);

    let v1 = up * (c1 * c2) - mid * (e_phi1 * (e_del * s1 * c2 * c3 + s2 * s3))
        + down * (e_phi2 * (s2 * c3 - e_del * s1 * c2 * s3));
    let v2 = up * (e_ndel * s1) + mid * (e_phi1 * c1 * c3) + down * (e_phi2 * c1 * s3);
    let v3 = up * (c1 * s2) + mid * (e_phi1 * (c2 * s3 - e_del * s1 * s2 * c3))
        - down * (e_phi2 * (e_del * s1 * s2 * s3 + c2 * c3));

    [outer(&v1), outer(&v2), outer(&v3)]
}
