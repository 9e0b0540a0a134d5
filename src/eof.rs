//! Two-qubit entanglement: concurrence and entanglement of formation.

use nalgebra::DVector;

use crate::basis::Pauli;
use crate::entropy::{entropy, shannon};
use crate::error::{Error, Result};
use crate::precision::{CMat, Precision, lit, real};

fn check_qubit_pair<T: Precision>(rho: &CMat<T>) -> Result<bool> {
    if rho.is_empty() {
        return Err(Error::ZeroSize);
    }
    let pure = rho.ncols() == 1;
    if !pure && rho.nrows() != rho.ncols() {
        return Err(Error::ShapeMismatch {
            rows: rho.nrows(),
            cols: rho.ncols(),
        });
    }
    if rho.nrows() != 4 {
        return Err(Error::NotQubitPair(rho.nrows()));
    }
    Ok(pure)
}

/// `√ρ` of a Hermitian positive semidefinite matrix, with eigenvalues at or
/// below eps clipped to zero.
fn sqrt_psd<T: Precision>(rho: &CMat<T>) -> CMat<T> {
    let eig = rho.clone().symmetric_eigen();
    let roots = eig
        .eigenvalues
        .map(|l| real(if l > T::eps() { l.sqrt() } else { T::zero() }));
    &eig.eigenvectors * CMat::from_diagonal(&roots) * eig.eigenvectors.adjoint()
}

/// Wootters concurrence of a two-qubit state (4×4 density matrix or 4×1 ket).
pub fn concurrence<T: Precision>(rho: &CMat<T>) -> Result<T> {
    if check_qubit_pair(rho)? {
        let p = rho.column(0);
        let c = (p[0] * p[3] - p[1] * p[2]).norm_sqr().sqrt();
        return Ok(lit::<T>(2.0) * c);
    }

    let table = T::basis_table();
    let yy = table.pauli(Pauli::Y).kronecker(table.pauli(Pauli::Y));
    let flipped = &yy * rho.conjugate() * &yy;
    let root = sqrt_psd(rho);
    let m = &root * flipped * &root;
    let hermitian = (&m + m.adjoint()) * real(lit::<T>(0.5));

    let mut lambdas: Vec<T> = hermitian
        .symmetric_eigenvalues()
        .iter()
        .map(|&l| if l > T::eps() { l.sqrt() } else { T::zero() })
        .collect();
    lambdas.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let c = lambdas[0] - lambdas[1] - lambdas[2] - lambdas[3];
    Ok(c.max(T::zero()))
}

/// Entanglement entropy of a bipartite pure state `psi` with local dimensions
/// `dims = [d1, d2]`: the entropy of the first party's reduced state.
pub fn entanglement<T: Precision>(psi: &CMat<T>, dims: &[usize]) -> Result<T> {
    if psi.is_empty() {
        return Err(Error::ZeroSize);
    }
    if psi.ncols() != 1 {
        return Err(Error::NotCVector {
            rows: psi.nrows(),
            cols: psi.ncols(),
        });
    }
    if dims.len() != 2 || dims.contains(&0) {
        return Err(Error::InvalidDimension);
    }
    let expected = dims[0] * dims[1];
    if expected != psi.nrows() {
        return Err(Error::DimensionMismatch {
            expected,
            found: psi.nrows(),
        });
    }
    let coeffs = CMat::from_row_slice(dims[0], dims[1], psi.as_slice());
    let reduced = &coeffs * coeffs.adjoint();
    entropy(&reduced)
}

/// Entanglement of formation of a two-qubit state.
///
/// A ket gives its entanglement entropy; a density matrix goes through the
/// concurrence `C` as `h((1 + √(1 − C²)) / 2)`.
pub fn eof<T: Precision>(rho: &CMat<T>) -> Result<T> {
    if check_qubit_pair(rho)? {
        return entanglement(rho, &[2, 2]);
    }
    let c = concurrence(rho)?;
    let x = lit::<T>(0.5) * (T::one() + (T::one() - c * c).max(T::zero()).sqrt());
    shannon(&DVector::from_vec(vec![x, T::one() - x]))
}
