//! Entropies of quantum states and classical probability vectors.
//!
//! Every function accepts a density matrix or, where noted, an `N × 1` column
//! holding a pure state. Eigenvalues at or below [`Precision::eps`] are treated
//! as zero, which also absorbs small negative rounding noise.

use nalgebra::{DVector, Dim, Matrix, RawStorage};

use crate::error::{Error, Result};
use crate::precision::{CMat, Precision, lit};

/// Shape of a validated state input.
enum StateShape {
    Pure,
    Mixed,
}

fn check_state<T: Precision>(rho: &CMat<T>) -> Result<StateShape> {
    if rho.is_empty() {
        return Err(Error::ZeroSize);
    }
    if rho.ncols() == 1 {
        return Ok(StateShape::Pure);
    }
    if rho.nrows() != rho.ncols() {
        return Err(Error::ShapeMismatch {
            rows: rho.nrows(),
            cols: rho.ncols(),
        });
    }
    Ok(StateShape::Mixed)
}

fn check_prob<T, R, C, S>(prob: &Matrix<T, R, C, S>) -> Result<()>
where
    T: Precision,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    if prob.is_empty() {
        return Err(Error::ZeroSize);
    }
    if prob.ncols() != 1 {
        return Err(Error::NotCVector {
            rows: prob.nrows(),
            cols: prob.ncols(),
        });
    }
    if prob.iter().any(|&p| p < -T::eps()) {
        return Err(Error::InvalidProbability);
    }
    Ok(())
}

/// Real eigenvalues of a Hermitian matrix.
pub(crate) fn eigenvalues<T: Precision>(rho: &CMat<T>) -> DVector<T> {
    rho.symmetric_eigenvalues()
}

/// `-Σ λ log2 λ` over the entries above the tolerance.
fn shannon_sum<'a, T: Precision>(values: impl Iterator<Item = &'a T>) -> T {
    values
        .filter(|&&v| v > T::eps())
        .fold(T::zero(), |acc, &v| acc - v * v.log2())
}

/// `Σ λ^α` over the entries above the tolerance.
fn power_sum<'a, T: Precision>(values: impl Iterator<Item = &'a T>, alpha: T) -> T {
    values
        .filter(|&&v| v > T::eps())
        .fold(T::zero(), |acc, &v| acc + v.powf(alpha))
}

fn max_of<'a, T: Precision>(values: impl Iterator<Item = &'a T>) -> T {
    values.fold(T::zero(), |acc, &v| acc.max(v))
}

fn is_inf<T: Precision>(alpha: T) -> bool {
    alpha.widen().is_infinite()
}

/// Von Neumann entropy of an already validated square Hermitian matrix.
pub(crate) fn von_neumann<T: Precision>(rho: &CMat<T>) -> T {
    shannon_sum(eigenvalues(rho).iter())
}

/// Von Neumann entropy `-Tr ρ log2 ρ`.
///
/// A column vector is a pure state and has zero entropy; no eigendecomposition
/// is performed for it.
pub fn entropy<T: Precision>(rho: &CMat<T>) -> Result<T> {
    match check_state(rho)? {
        StateShape::Pure => Ok(T::zero()),
        StateShape::Mixed => Ok(von_neumann(rho)),
    }
}

/// Shannon entropy (base 2) of a probability column.
pub fn shannon<T, R, C, S>(prob: &Matrix<T, R, C, S>) -> Result<T>
where
    T: Precision,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    check_prob(prob)?;
    Ok(shannon_sum(prob.iter()))
}

/// Rényi entropy of order `alpha` (base 2).
///
/// Order 0 gives `log2 N`, order 1 the von Neumann entropy and `+∞` the
/// min-entropy `-log2 λ_max`.
pub fn renyi<T: Precision>(rho: &CMat<T>, alpha: T) -> Result<T> {
    let shape = check_state(rho)?;
    if alpha < -T::eps() {
        return Err(Error::OutOfRange);
    }
    if alpha < T::eps() {
        return Ok(lit::<T>(rho.nrows() as f64).log2());
    }
    if let StateShape::Pure = shape {
        return Ok(T::zero());
    }
    if (alpha - T::one()).abs() < T::eps() {
        return Ok(von_neumann(rho));
    }
    let eig = eigenvalues(rho);
    if is_inf(alpha) {
        return Ok(-max_of(eig.iter()).log2());
    }
    Ok(power_sum(eig.iter(), alpha).log2() / (T::one() - alpha))
}

/// Rényi entropy of order `alpha` of a probability column.
pub fn renyi_prob<T, R, C, S>(prob: &Matrix<T, R, C, S>, alpha: T) -> Result<T>
where
    T: Precision,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    if alpha < -T::eps() {
        return Err(Error::OutOfRange);
    }
    check_prob(prob)?;
    if alpha < T::eps() {
        return Ok(lit::<T>(prob.len() as f64).log2());
    }
    if (alpha - T::one()).abs() < T::eps() {
        return Ok(shannon_sum(prob.iter()));
    }
    if is_inf(alpha) {
        return Ok(-max_of(prob.iter()).log2());
    }
    Ok(power_sum(prob.iter(), alpha).log2() / (T::one() - alpha))
}

/// Tsallis entropy of order `alpha`.
///
/// Order 1 reduces to the von Neumann entropy in natural units.
pub fn tsallis<T: Precision>(rho: &CMat<T>, alpha: T) -> Result<T> {
    let shape = check_state(rho)?;
    if alpha < -T::eps() {
        return Err(Error::OutOfRange);
    }
    if let StateShape::Pure = shape {
        return Ok(T::zero());
    }
    if (alpha - T::one()).abs() < T::eps() {
        return Ok(lit::<T>(2.0).ln() * von_neumann(rho));
    }
    let eig = eigenvalues(rho);
    Ok((power_sum(eig.iter(), alpha) - T::one()) / (T::one() - alpha))
}

/// Tsallis entropy of order `alpha` of a probability column.
pub fn tsallis_prob<T, R, C, S>(prob: &Matrix<T, R, C, S>, alpha: T) -> Result<T>
where
    T: Precision,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    check_prob(prob)?;
    if alpha < T::zero() {
        return Err(Error::OutOfRange);
    }
    if (alpha - T::one()).abs() < T::eps() {
        return Ok(lit::<T>(2.0).ln() * shannon_sum(prob.iter()));
    }
    Ok((power_sum(prob.iter(), alpha) - T::one()) / (T::one() - alpha))
}
