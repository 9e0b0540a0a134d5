//! Error type shared by every fallible operation of the crate.

use thiserror::Error;

/// Errors raised while validating states, party structures and parameters.
///
/// All validation is eager: a value that would make a later computation
/// meaningless is rejected by the call that introduces it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input matrix or vector has no elements.
    #[error("input has zero size")]
    ZeroSize,

    /// A square matrix (or a column vector, where allowed) was required.
    #[error("matrix is not square: {rows}x{cols}")]
    ShapeMismatch { rows: usize, cols: usize },

    /// The product of the declared party dimensions does not match the matrix size.
    #[error("dimension mismatch: parties span {expected}, matrix has {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A party dimension is zero, or no parties were declared.
    #[error("invalid party dimensions")]
    InvalidDimension,

    /// The measured (nodal) party index is outside `1..=parties`.
    #[error("invalid measured party index {index} for a {parties}-party system")]
    InvalidMeasuredParty { index: usize, parties: usize },

    /// The measured party is neither a qubit nor a qutrit.
    #[error("measured party has local dimension {0}, only qubit or qutrit is supported")]
    UnsupportedMeasuredPartyDimension(usize),

    /// An angle bound or seed vector has the wrong length for the measured party.
    #[error("parameter vector has {found} elements, {expected} required for this measured party")]
    InvalidParameterVectorLength { expected: usize, found: usize },

    /// An entropy order or similar parameter is outside its domain.
    #[error("parameter out of range")]
    OutOfRange,

    /// A column vector was required.
    #[error("input is not a column vector: {rows}x{cols}")]
    NotCVector { rows: usize, cols: usize },

    /// A probability vector has an entry below the numerical tolerance.
    #[error("invalid probability distribution")]
    InvalidProbability,

    /// The state does not live on two qubits.
    #[error("state is not a two-qubit state: dimension {0}")]
    NotQubitPair(usize),

    /// A subsystem index is zero, out of range or repeated.
    #[error("invalid subsystem indices")]
    InvalidSubsystem,

    /// Control parties do not share one local dimension.
    #[error("control parties have unequal dimensions")]
    DimensionsNotEqual,

    /// The rotation axis is not a three-component unit vector.
    #[error("rotation axis is not a 3-dimensional unit vector")]
    NotUnitVector,
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
