//! Standard gates and controlled-operator construction on qudit registers.
//!
//! Party indices are 1-based and registers are ordered with the first party as
//! the most significant digit, matching `kronecker` of the local factors.

use crate::basis::Pauli;
use crate::error::{Error, Result};
use crate::precision::{CMat, Precision, cpx, eye, lit, phase, real};

/// Fixed one-, two- and three-qubit gates.
#[derive(Debug, Clone)]
pub struct Gates<T: Precision> {
    x: CMat<T>,
    y: CMat<T>,
    z: CMat<T>,
    had: CMat<T>,
    cnot: CMat<T>,
    cz: CMat<T>,
    swap: CMat<T>,
    toffoli: CMat<T>,
    fredkin: CMat<T>,
}

/// Real matrix of size `n` with ones at the listed `(row, col)` entries.
fn ones_at<T: Precision>(n: usize, entries: &[(usize, usize)]) -> CMat<T> {
    let mut m = CMat::zeros(n, n);
    for &(r, c) in entries {
        m[(r, c)] = real(T::one());
    }
    m
}

impl<T: Precision> Gates<T> {
    /// Builds the table; the Pauli matrices come from the shared basis table.
    pub fn new() -> Self {
        let table = T::basis_table();
        let s = real(lit::<T>(0.5).sqrt());
        let mut cz = eye::<T>(4);
        cz[(3, 3)] = real(-T::one());

        Gates {
            x: table.pauli(Pauli::X).clone(),
            y: table.pauli(Pauli::Y).clone(),
            z: table.pauli(Pauli::Z).clone(),
            had: CMat::from_row_slice(2, 2, &[s, s, s, -s]),
            cnot: ones_at(4, &[(0, 0), (1, 1), (2, 3), (3, 2)]),
            cz,
            swap: ones_at(4, &[(0, 0), (1, 2), (2, 1), (3, 3)]),
            toffoli: ones_at(
                8,
                &[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 7), (7, 6)],
            ),
            fredkin: ones_at(
                8,
                &[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 6), (6, 5), (7, 7)],
            ),
        }
    }

    /// Pauli X.
    pub fn x(&self) -> &CMat<T> {
        &self.x
    }

    /// Pauli Y.
    pub fn y(&self) -> &CMat<T> {
        &self.y
    }

    /// Pauli Z.
    pub fn z(&self) -> &CMat<T> {
        &self.z
    }

    /// Hadamard.
    pub fn had(&self) -> &CMat<T> {
        &self.had
    }

    /// Controlled NOT, control on the first qubit.
    pub fn cnot(&self) -> &CMat<T> {
        &self.cnot
    }

    /// Controlled Z.
    pub fn cz(&self) -> &CMat<T> {
        &self.cz
    }

    /// Swap of two qubits.
    pub fn swap(&self) -> &CMat<T> {
        &self.swap
    }

    /// Toffoli (controls on qubits 1 and 2).
    pub fn toffoli(&self) -> &CMat<T> {
        &self.toffoli
    }

    /// Fredkin (control on qubit 1, swaps 2 and 3).
    pub fn fredkin(&self) -> &CMat<T> {
        &self.fredkin
    }

    /// Single-qubit rotation `cos(θ/2) I + i sin(θ/2) (n̂·σ)` about the unit axis `n̂`.
    pub fn u2(&self, theta: T, unit: &[T]) -> Result<CMat<T>> {
        if unit.len() != 3 {
            return Err(Error::NotUnitVector);
        }
        let norm = unit.iter().fold(T::zero(), |acc, &u| acc + u * u).sqrt();
        if (norm - T::one()).abs() > T::eps() {
            return Err(Error::NotUnitVector);
        }
        let half = theta * lit::<T>(0.5);
        let axis = &self.x * real(unit[0]) + &self.y * real(unit[1]) + &self.z * real(unit[2]);
        Ok(eye::<T>(2) * real(half.cos()) + axis * cpx(T::zero(), half.sin()))
    }
}

impl<T: Precision> Default for Gates<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantum Fourier transform on a `dim`-level system.
pub fn qft<T: Precision>(dim: usize) -> Result<CMat<T>> {
    if dim == 0 {
        return Err(Error::InvalidDimension);
    }
    let norm = real(T::one() / lit::<T>(dim as f64).sqrt());
    let step = T::two_pi() / lit::<T>(dim as f64);
    Ok(CMat::from_fn(dim, dim, |i, j| {
        phase(step * lit::<T>(((i * j) % dim) as f64)) * norm
    }))
}

/// Multi-index over a register, last digit running fastest.
#[derive(Debug, Clone)]
pub(crate) struct MixedRadix {
    digits: Vec<usize>,
    radices: Vec<usize>,
}

impl MixedRadix {
    pub(crate) fn new(radices: Vec<usize>) -> Self {
        MixedRadix {
            digits: vec![0; radices.len()],
            radices,
        }
    }

    pub(crate) fn digits(&self) -> &[usize] {
        &self.digits
    }

    /// Steps to the next multi-index; `false` once every index has been visited.
    pub(crate) fn advance(&mut self) -> bool {
        for i in (0..self.digits.len()).rev() {
            self.digits[i] += 1;
            if self.digits[i] < self.radices[i] {
                return true;
            }
            self.digits[i] = 0;
        }
        false
    }
}

/// Place values of each digit of a register with local dimensions `dims`.
fn strides(dims: &[usize]) -> Vec<usize> {
    let mut out = vec![1; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        out[i] = out[i + 1] * dims[i + 1];
    }
    out
}

fn check_subsystems(ctrl: &[usize], sys: &[usize], parties: usize) -> Result<()> {
    let mut all: Vec<usize> = sys.iter().chain(ctrl).copied().collect();
    if sys.is_empty() || all.len() > parties || all.iter().any(|&p| p == 0 || p > parties) {
        return Err(Error::InvalidSubsystem);
    }
    all.sort_unstable();
    all.dedup();
    if all.len() != sys.len() + ctrl.len() {
        return Err(Error::InvalidSubsystem);
    }
    Ok(())
}

/// Controlled-`a` on a register of local dimensions `dims`.
///
/// `a` acts on the parties `sys` (in that order). When every party in `ctrl`
/// holds the same value `c ≥ 1`, `a^c` is applied; when some control holds 0,
/// or the controls disagree, the register is left alone. With no controls the
/// result is `a` embedded on `sys`.
pub fn make_ctrl<T: Precision>(
    a: &CMat<T>,
    ctrl: &[usize],
    sys: &[usize],
    dims: &[usize],
) -> Result<CMat<T>> {
    if a.is_empty() {
        return Err(Error::ZeroSize);
    }
    if a.nrows() != a.ncols() {
        return Err(Error::ShapeMismatch {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    if dims.is_empty() || dims.contains(&0) {
        return Err(Error::InvalidDimension);
    }
    check_subsystems(ctrl, sys, dims.len())?;
    let d = ctrl.first().map_or(1, |&c| dims[c - 1]);
    if ctrl.iter().any(|&c| dims[c - 1] != d) {
        return Err(Error::DimensionsNotEqual);
    }
    let sys_dims: Vec<usize> = sys.iter().map(|&s| dims[s - 1]).collect();
    let expected: usize = sys_dims.iter().product();
    if expected != a.nrows() {
        return Err(Error::DimensionMismatch {
            expected,
            found: a.nrows(),
        });
    }

    let mut powers = vec![eye::<T>(a.nrows())];
    for p in 0..d.saturating_sub(1).max(1) {
        let next = &powers[p] * a;
        powers.push(next);
    }

    let total: usize = dims.iter().product();
    let place = strides(dims);
    let sys_place = strides(&sys_dims);
    let mut u = CMat::<T>::zeros(total, total);

    let mut row = MixedRadix::new(dims.to_vec());
    loop {
        let digits = row.digits();
        let i: usize = digits.iter().zip(&place).map(|(&g, &p)| g * p).sum();

        let power = if ctrl.iter().any(|&c| digits[c - 1] == 0) {
            None
        } else if let Some(&first) = ctrl.first() {
            let c = digits[first - 1];
            Some(if ctrl.iter().all(|&k| digits[k - 1] == c) { c } else { 0 })
        } else {
            Some(1)
        };

        match power {
            None => u[(i, i)] = real(T::one()),
            Some(p) => {
                let mut k = 0;
                let mut base = i;
                for (&s, &sp) in sys.iter().zip(&sys_place) {
                    k += digits[s - 1] * sp;
                    base -= digits[s - 1] * place[s - 1];
                }
                let mut col = MixedRadix::new(sys_dims.clone());
                loop {
                    let mut j = base;
                    let mut l = 0;
                    for ((&s, &sp), &g) in sys.iter().zip(&sys_place).zip(col.digits()) {
                        j += g * place[s - 1];
                        l += g * sp;
                    }
                    u[(i, j)] = powers[p][(k, l)];
                    if !col.advance() {
                        break;
                    }
                }
            }
        }

        if !row.advance() {
            break;
        }
    }
    Ok(u)
}

/// [`make_ctrl`] on `n` parties that all have dimension `dim`.
pub fn make_ctrl_uniform<T: Precision>(
    a: &CMat<T>,
    ctrl: &[usize],
    sys: &[usize],
    n: usize,
    dim: usize,
) -> Result<CMat<T>> {
    if n == 0 {
        return Err(Error::OutOfRange);
    }
    if dim == 0 {
        return Err(Error::InvalidDimension);
    }
    make_ctrl(a, ctrl, sys, &vec![dim; n])
}
