//! The `cpx-qinfo` library computes information-theoretic quantities of
//! finite-dimensional quantum states held as complex `nalgebra` matrices.
//!
//! * [`entropy`], [`renyi`] and [`tsallis`] (plus their probability-vector
//!   variants) for density matrices and kets.
//! * [`concurrence`], [`entanglement`] and [`eof`] for two-qubit states.
//! * [`DeficitSpace`], the quantum deficit (discord) of a multipartite state,
//!   optimized over projective measurements on a qubit or qutrit party.
//! * [`Gates`], [`qft`] and [`make_ctrl`] for building (controlled) operators
//!   on qudit registers.
//!
//! Everything is generic over [`Precision`] (`f32` or `f64`).

pub mod basis;
pub mod deficit;
pub mod embed;
pub mod entropy;
pub mod eof;
pub mod error;
pub mod gates;
pub mod measurement;
pub mod optim;
pub mod precision;

pub use basis::{Basis, BasisTable, Pauli};
pub use deficit::{CacheState, DeficitConfig, DeficitSpace};
pub use embed::{Embedding, Parties, Placement};
pub use entropy::{entropy, renyi, renyi_prob, shannon, tsallis, tsallis_prob};
pub use eof::{concurrence, entanglement, eof};
pub use error::{Error, Result};
pub use gates::{Gates, make_ctrl, make_ctrl_uniform, qft};
pub use measurement::MeasuredFamily;
pub use optim::{Algorithm, BoxMinimizer, Minimizer, Outcome, Problem, Termination};
pub use precision::{CMat, Precision};
