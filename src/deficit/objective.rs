//! Post-measurement entropy as a function of the measurement angles.

use crate::basis::BasisTable;
use crate::embed::Embedding;
use crate::entropy::von_neumann;
use crate::measurement::MeasuredFamily;
use crate::precision::{CMat, Precision};

/// Everything the objective needs, borrowed from the owning session.
pub(crate) struct Objective<'a, T: Precision> {
    rho: &'a CMat<T>,
    embedding: &'a Embedding<T>,
    table: &'a BasisTable<T>,
    family: MeasuredFamily,
}

impl<'a, T: Precision> Objective<'a, T> {
    pub(crate) fn new(
        rho: &'a CMat<T>,
        embedding: &'a Embedding<T>,
        table: &'a BasisTable<T>,
        family: MeasuredFamily,
    ) -> Self {
        Objective {
            rho,
            embedding,
            table,
            family,
        }
    }

    /// Entropy of `Σ Pᵢ ρ Pᵢ` for local projectors `Pᵢ` on the measured party.
    pub(crate) fn measured_entropy(&self, local: &[CMat<T>]) -> T {
        let n = self.rho.nrows();
        let measured = local.iter().fold(CMat::<T>::zeros(n, n), |acc, p| {
            let lifted = self.embedding.place(p);
            acc + &lifted * self.rho * &lifted
        });
        von_neumann(&measured)
    }

    /// Objective value at the angle vector `x`; NaN if `x` has the wrong
    /// length for the family.
    pub(crate) fn evaluate(&self, x: &[f64]) -> f64 {
        let angles: Vec<T> = x.iter().map(|&v| T::narrow(v)).collect();
        match self.family.projectors(self.table, &angles) {
            Ok(local) => self.measured_entropy(&local).widen(),
            Err(_) => f64::NAN,
        }
    }

    /// Objective values at the three canonical settings of the basis table.
    pub(crate) fn at_settings(&self) -> [T; 3] {
        self.table
            .canonical(self.family)
            .map(|basis| self.measured_entropy(basis.projectors()))
    }
}
