//! Party structure of a composite system and Kronecker embedding of local
//! operators acting on the measured party.

use crate::error::{Error, Result};
use crate::measurement::MeasuredFamily;
use crate::precision::{CMat, Precision, eye};

/// Ordered local dimensions of a composite system plus the measured party.
///
/// The measured ("nodal") party is 1-based and always a qubit or a qutrit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parties {
    dims: Vec<usize>,
    nodal: usize,
    family: MeasuredFamily,
}

impl Parties {
    /// Validates `dims` against a state of dimension `total` and picks `nodal`.
    pub fn new(dims: Vec<usize>, nodal: usize, total: usize) -> Result<Self> {
        if dims.is_empty() || dims.contains(&0) {
            return Err(Error::InvalidDimension);
        }
        let expected: usize = dims.iter().product();
        if expected != total {
            return Err(Error::DimensionMismatch {
                expected,
                found: total,
            });
        }
        let family = Self::family_at(&dims, nodal)?;
        Ok(Parties {
            dims,
            nodal,
            family,
        })
    }

    /// All parties share `dim`; their count is `round(log_dim(total))`.
    pub fn uniform(dim: usize, nodal: usize, total: usize) -> Result<Self> {
        if dim < 2 {
            return Err(Error::InvalidDimension);
        }
        let count = ((total as f64).ln() / (dim as f64).ln()).round() as usize;
        Self::new(vec![dim; count], nodal, total)
    }

    /// The same structure measured on another party; `self` is untouched on error.
    pub fn with_nodal(&self, nodal: usize) -> Result<Self> {
        let family = Self::family_at(&self.dims, nodal)?;
        Ok(Parties {
            dims: self.dims.clone(),
            nodal,
            family,
        })
    }

    fn family_at(dims: &[usize], nodal: usize) -> Result<MeasuredFamily> {
        if nodal == 0 || nodal > dims.len() {
            return Err(Error::InvalidMeasuredParty {
                index: nodal,
                parties: dims.len(),
            });
        }
        let local = dims[nodal - 1];
        MeasuredFamily::from_dim(local).ok_or(Error::UnsupportedMeasuredPartyDimension(local))
    }

    /// Local dimensions, in party order.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// 1-based index of the measured party.
    pub fn nodal(&self) -> usize {
        self.nodal
    }

    /// Number of parties.
    pub fn count(&self) -> usize {
        self.dims.len()
    }

    /// Dimension of the whole system.
    pub fn total(&self) -> usize {
        self.dims.iter().product()
    }

    /// Measurement family of the measured party.
    pub fn family(&self) -> MeasuredFamily {
        self.family
    }

    /// Product of the local dimensions strictly before the measured party.
    pub fn before(&self) -> usize {
        self.dims[..self.nodal - 1].iter().product()
    }

    /// Product of the local dimensions strictly after the measured party.
    pub fn after(&self) -> usize {
        self.dims[self.nodal..].iter().product()
    }
}

/// Where the measured party sits among the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Measured party is the first one.
    First,
    /// Measured party is the last one (and not the first).
    Last,
    /// Parties on both sides.
    Interior,
}

/// Identity factors around the measured party; each placement keeps only
/// the blocks it multiplies with.
#[derive(Debug, Clone)]
enum Blocks<T: Precision> {
    First { after: CMat<T> },
    Last { before: CMat<T> },
    Interior { before: CMat<T>, after: CMat<T> },
}

/// Identity blocks that lift a measured-party operator to the full space.
#[derive(Debug, Clone)]
pub struct Embedding<T: Precision> {
    local_dim: usize,
    blocks: Blocks<T>,
}

impl<T: Precision> Embedding<T> {
    /// Precomputes the identity blocks for a party structure.
    pub fn new(parties: &Parties) -> Self {
        let blocks = if parties.nodal() == 1 {
            Blocks::First {
                after: eye(parties.after()),
            }
        } else if parties.nodal() == parties.count() {
            Blocks::Last {
                before: eye(parties.before()),
            }
        } else {
            Blocks::Interior {
                before: eye(parties.before()),
                after: eye(parties.after()),
            }
        };
        Embedding {
            local_dim: parties.family().dim(),
            blocks,
        }
    }

    /// Placement of the measured party.
    pub fn placement(&self) -> Placement {
        match self.blocks {
            Blocks::First { .. } => Placement::First,
            Blocks::Last { .. } => Placement::Last,
            Blocks::Interior { .. } => Placement::Interior,
        }
    }

    /// Lifts a `local_dim × local_dim` operator, rejecting any other shape.
    pub fn embed(&self, local: &CMat<T>) -> Result<CMat<T>> {
        if local.nrows() != self.local_dim || local.ncols() != self.local_dim {
            return Err(Error::DimensionMismatch {
                expected: self.local_dim,
                found: local.nrows(),
            });
        }
        Ok(self.place(local))
    }

    /// Lifts an operator whose shape the caller already guarantees.
    pub(crate) fn place(&self, local: &CMat<T>) -> CMat<T> {
        match &self.blocks {
            Blocks::First { after } => local.kronecker(after),
            Blocks::Last { before } => before.kronecker(local),
            Blocks::Interior { before, after } => before.kronecker(local).kronecker(after),
        }
    }
}
