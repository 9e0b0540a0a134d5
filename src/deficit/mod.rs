//! Quantum deficit of a multipartite state under local projective
//! measurements on one ("nodal") party.
//!
//! [`DeficitSpace`] owns the state, its party structure and a
//! [`DeficitConfig`]. The deficit is
//!
//! ```text
//! min over measurements P of S(Σ Pᵢ ρ Pᵢ) − S(ρ)
//! ```
//!
//! where the measurement is parametrized by 2 angles on a qubit party and 5 on
//! a qutrit party. Values are computed on first access and cached until a
//! setter, [`DeficitSpace::refresh`] or [`DeficitSpace::reset_party`]
//! invalidates them.
//!
//! ```
//! use cpx_qinfo::DeficitSpace;
//! use nalgebra::DMatrix;
//! use num_complex::Complex64;
//!
//! let h = Complex64::new(0.5, 0.0);
//! let z = Complex64::new(0.0, 0.0);
//! let bell = DMatrix::from_row_slice(4, 4, &[h, z, z, h, z, z, z, z, z, z, z, z, h, z, z, h]);
//! let mut space = DeficitSpace::new(bell, 1, vec![2, 2]).unwrap();
//! assert!((space.result() - 1.0).abs() < 1e-6);
//! ```

mod config;
mod objective;

pub use config::DeficitConfig;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::basis::BasisTable;
use crate::embed::{Embedding, Parties};
use crate::entropy::von_neumann;
use crate::error::{Error, Result};
use crate::measurement::MeasuredFamily;
use crate::optim::{Algorithm, BoxMinimizer, Minimizer, Problem};
use crate::precision::{CMat, Precision};
use objective::Objective;

/// Which cached values are currently valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheState {
    /// Entropy of the whole state.
    pub total_entropy: bool,
    /// Optimized deficit and its angles.
    pub optimum: bool,
    /// Deficits at the canonical measurement settings.
    pub registered: bool,
}

#[derive(Debug, Clone)]
struct Optimum<T> {
    value: T,
    angles: Vec<T>,
}

#[derive(Debug, Clone)]
struct Registered<T> {
    min: T,
    all: [T; 3],
}

/// Deficit session over one state.
#[derive(Debug, Clone)]
pub struct DeficitSpace<T: Precision, M: Minimizer = BoxMinimizer> {
    rho: CMat<T>,
    parties: Parties,
    embedding: Embedding<T>,
    table: Arc<BasisTable<T>>,
    minimizer: M,
    config: DeficitConfig,
    total_entropy: Option<T>,
    optimum: Option<Optimum<T>>,
    registered: Option<Registered<T>>,
}

/// Accepts a density matrix, or a ket which becomes `|ψ><ψ|`.
fn density_matrix<T: Precision>(rho: CMat<T>) -> Result<CMat<T>> {
    if rho.is_empty() {
        return Err(Error::ZeroSize);
    }
    if rho.ncols() == 1 {
        return Ok(&rho * rho.adjoint());
    }
    if rho.nrows() != rho.ncols() {
        return Err(Error::ShapeMismatch {
            rows: rho.nrows(),
            cols: rho.ncols(),
        });
    }
    Ok(rho)
}

impl<T: Precision> DeficitSpace<T> {
    /// Session over `rho` with explicit local dimensions, measuring party
    /// `nodal` (1-based).
    pub fn new(rho: CMat<T>, nodal: usize, dims: Vec<usize>) -> Result<Self> {
        let rho = density_matrix(rho)?;
        let parties = Parties::new(dims, nodal, rho.nrows())?;
        Ok(Self::assemble(rho, parties, T::basis_table(), BoxMinimizer::default()))
    }

    /// Session over `rho` where every party has dimension `dim`.
    pub fn with_uniform_dim(rho: CMat<T>, nodal: usize, dim: usize) -> Result<Self> {
        let rho = density_matrix(rho)?;
        let parties = Parties::uniform(dim, nodal, rho.nrows())?;
        Ok(Self::assemble(rho, parties, T::basis_table(), BoxMinimizer::default()))
    }
}

impl<T: Precision, M: Minimizer> DeficitSpace<T, M> {
    fn assemble(rho: CMat<T>, parties: Parties, table: Arc<BasisTable<T>>, minimizer: M) -> Self {
        DeficitSpace {
            embedding: Embedding::new(&parties),
            config: DeficitConfig::for_family(parties.family()),
            rho,
            parties,
            table,
            minimizer,
            total_entropy: None,
            optimum: None,
            registered: None,
        }
    }

    /// Swaps in another minimizer; the optimized result is dropped.
    pub fn with_minimizer<N: Minimizer>(self, minimizer: N) -> DeficitSpace<T, N> {
        DeficitSpace {
            rho: self.rho,
            parties: self.parties,
            embedding: self.embedding,
            table: self.table,
            minimizer,
            config: self.config,
            total_entropy: self.total_entropy,
            optimum: None,
            registered: self.registered,
        }
    }

    /// Swaps in another basis table; both deficit caches are dropped.
    pub fn with_basis(mut self, table: Arc<BasisTable<T>>) -> Self {
        self.table = table;
        self.optimum = None;
        self.registered = None;
        self
    }

    /// The state, as a density matrix.
    pub fn rho(&self) -> &CMat<T> {
        &self.rho
    }

    /// Party dimensions and the measured party.
    pub fn parties(&self) -> &Parties {
        &self.parties
    }

    /// Measurement family of the current nodal party.
    pub fn family(&self) -> MeasuredFamily {
        self.parties.family()
    }

    /// The minimizer driving both search phases.
    pub fn minimizer(&self) -> &M {
        &self.minimizer
    }

    /// Current optimizer configuration.
    pub fn config(&self) -> &DeficitConfig {
        &self.config
    }

    /// Which values are cached right now.
    pub fn cache_state(&self) -> CacheState {
        CacheState {
            total_entropy: self.total_entropy.is_some(),
            optimum: self.optimum.is_some(),
            registered: self.registered.is_some(),
        }
    }

    fn invalidate_optimum(&mut self) {
        self.optimum = None;
    }

    /// Algorithm of the global phase.
    pub fn global_algorithm(&mut self, algorithm: Algorithm) -> &mut Self {
        self.config.global_algorithm = algorithm;
        self.invalidate_optimum();
        self
    }

    /// Relative x tolerance of the global phase.
    pub fn global_xtol(&mut self, xtol: f64) -> &mut Self {
        self.config.global_xtol = xtol;
        self.invalidate_optimum();
        self
    }

    /// Relative f tolerance of the global phase.
    pub fn global_ftol(&mut self, ftol: f64) -> &mut Self {
        self.config.global_ftol = ftol;
        self.invalidate_optimum();
        self
    }

    /// Enables or disables the global phase.
    pub fn global_opt(&mut self, enabled: bool) -> &mut Self {
        self.config.global_enabled = enabled;
        self.invalidate_optimum();
        self
    }

    /// Algorithm of the local refinement.
    pub fn local_algorithm(&mut self, algorithm: Algorithm) -> &mut Self {
        self.config.local_algorithm = algorithm;
        self.invalidate_optimum();
        self
    }

    /// Relative x tolerance of the local refinement.
    pub fn local_xtol(&mut self, xtol: f64) -> &mut Self {
        self.config.local_xtol = xtol;
        self.invalidate_optimum();
        self
    }

    /// Relative f tolerance of the local refinement.
    pub fn local_ftol(&mut self, ftol: f64) -> &mut Self {
        self.config.local_ftol = ftol;
        self.invalidate_optimum();
        self
    }

    /// Number of points the local refinement starts from: the global
    /// optimum plus the best basin candidates of the global phase.
    pub fn local_starts(&mut self, starts: usize) -> &mut Self {
        self.config.local_starts = starts;
        self.invalidate_optimum();
        self
    }

    /// Upper bounds of the angles, as multiples of π.
    pub fn angle_range(&mut self, range: &[f64]) -> Result<&mut Self> {
        self.family().check_len(range.len())?;
        self.config.angle_range = range.to_vec();
        self.invalidate_optimum();
        Ok(self)
    }

    /// Starting angles, as multiples of π.
    pub fn initial_angle(&mut self, angles: &[f64]) -> Result<&mut Self> {
        self.family().check_len(angles.len())?;
        self.config.initial_angle = angles.to_vec();
        self.invalidate_optimum();
        Ok(self)
    }

    /// Replaces the whole configuration.
    pub fn set_config(&mut self, config: DeficitConfig) -> Result<&mut Self> {
        config.validate(self.family())?;
        self.config = config;
        self.invalidate_optimum();
        Ok(self)
    }

    /// Drops every cached value and restores the default configuration.
    pub fn refresh(&mut self) -> &mut Self {
        self.total_entropy = None;
        self.optimum = None;
        self.registered = None;
        self.config = DeficitConfig::for_family(self.family());
        self
    }

    /// Measures another party instead; the configuration returns to that
    /// party's defaults. On error the session is left untouched.
    pub fn reset_party(&mut self, nodal: usize) -> Result<&mut Self> {
        let parties = self.parties.with_nodal(nodal)?;
        self.embedding = Embedding::new(&parties);
        self.config = DeficitConfig::for_family(parties.family());
        self.parties = parties;
        self.optimum = None;
        self.registered = None;
        debug!(nodal, family = ?self.family(), "measured party changed");
        Ok(self)
    }

    /// Von Neumann entropy of the whole state.
    pub fn total_entropy(&mut self) -> T {
        *self
            .total_entropy
            .get_or_insert_with(|| von_neumann(&self.rho))
    }

    /// Optimized deficit.
    pub fn result(&mut self) -> T {
        self.optimum().value
    }

    /// Measurement angles attaining [`DeficitSpace::result`].
    pub fn opt_angles(&mut self) -> &[T] {
        &self.optimum().angles
    }

    /// Smallest deficit over the three canonical measurement settings.
    pub fn result_reg(&mut self) -> T {
        self.registered().min
    }

    /// Deficits at canonical measurement settings 1, 2 and 3.
    pub fn result_reg_all(&mut self) -> [T; 3] {
        self.registered().all
    }

    fn optimum(&mut self) -> &Optimum<T> {
        let optimum = match self.optimum.take() {
            Some(optimum) => optimum,
            None => self.optimize(),
        };
        self.optimum.insert(optimum)
    }

    fn registered(&mut self) -> &Registered<T> {
        let registered = match self.registered.take() {
            Some(registered) => registered,
            None => self.evaluate_settings(),
        };
        self.registered.insert(registered)
    }

    fn optimize(&mut self) -> Optimum<T> {
        let total = self.total_entropy();
        let family = self.family();
        let objective = Objective::new(&self.rho, &self.embedding, &self.table, family);
        let mut f = |x: &[f64]| objective.evaluate(x);

        let (lower, upper) = self.config.bounds();
        let mut x = self.config.start();
        let mut candidates = Vec::new();
        debug!(nodal = self.parties.nodal(), ?family, "optimizing deficit");

        if self.config.global_enabled {
            let problem = Problem {
                lower: lower.clone(),
                upper: upper.clone(),
                xtol_rel: self.config.global_xtol,
                ftol_rel: self.config.global_ftol,
            };
            let algorithm = self.config.global_algorithm;
            let outcome = self.minimizer.minimize(algorithm, &problem, &mut x, &mut f);
            trace!(
                phase = "global",
                ?algorithm,
                value = outcome.value,
                evaluations = outcome.evaluations,
                termination = ?outcome.termination,
                "phase finished"
            );
            candidates = outcome.candidates;
        }

        let problem = Problem {
            lower,
            upper,
            xtol_rel: self.config.local_xtol,
            ftol_rel: self.config.local_ftol,
        };
        let algorithm = self.config.local_algorithm;
        let extra = self.config.local_starts.max(1) - 1;
        let (best, angles) = std::iter::once(x)
            .chain(candidates.into_iter().take(extra))
            .map(|mut start| {
                let outcome = self.minimizer.minimize(algorithm, &problem, &mut start, &mut f);
                trace!(
                    phase = "local",
                    ?algorithm,
                    value = outcome.value,
                    evaluations = outcome.evaluations,
                    termination = ?outcome.termination,
                    "phase finished"
                );
                (outcome.value, start)
            })
            .reduce(|best, next| if next.0 < best.0 { next } else { best })
            .unwrap_or((f64::INFINITY, Vec::new()));

        let value = T::narrow(best) - total;
        debug!(nodal = self.parties.nodal(), value = value.widen(), "deficit optimized");
        Optimum {
            value,
            angles: angles.into_iter().map(T::narrow).collect(),
        }
    }

    fn evaluate_settings(&mut self) -> Registered<T> {
        let total = self.total_entropy();
        let objective = Objective::new(&self.rho, &self.embedding, &self.table, self.family());
        let all = objective.at_settings().map(|value| value - total);
        let min = all[1..].iter().fold(all[0], |acc, &v| acc.min(v));
        debug!(nodal = self.parties.nodal(), value = min.widen(), "registered deficit evaluated");
        Registered { min, all }
    }
}

#[cfg(test)]
mod deficit_tests {
    use super::*;
    use crate::optim::{Outcome, Termination};
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use num_complex::Complex64;
    use std::cell::RefCell;
    use std::f64::consts::PI;

    /// Evaluates the start point once and records every call; global runs
    /// report `candidates`.
    #[derive(Default)]
    struct Recording {
        calls: RefCell<Vec<(Algorithm, Vec<f64>)>>,
        candidates: Vec<Vec<f64>>,
    }

    impl Recording {
        fn count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Minimizer for Recording {
        fn minimize(
            &self,
            algorithm: Algorithm,
            problem: &Problem,
            x: &mut [f64],
            objective: &mut dyn FnMut(&[f64]) -> f64,
        ) -> Outcome {
            self.calls.borrow_mut().push((algorithm, x.to_vec()));
            problem.clamp(x);
            Outcome {
                value: objective(x),
                evaluations: 1,
                termination: Termination::Converged,
                candidates: if algorithm.is_global() {
                    self.candidates.clone()
                } else {
                    Vec::new()
                },
            }
        }
    }

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    fn ket(amps: &[f64]) -> CMat<f64> {
        CMat::from_column_slice(amps.len(), 1, &amps.iter().map(|&a| c(a)).collect::<Vec<_>>())
    }

    fn diag(values: &[f64]) -> CMat<f64> {
        CMat::from_diagonal(&DVector::from_vec(values.iter().map(|&v| c(v)).collect()))
    }

    fn bell() -> CMat<f64> {
        let s = 0.5f64.sqrt();
        let psi = ket(&[s, 0.0, 0.0, s]);
        &psi * psi.adjoint()
    }

    fn recording(rho: CMat<f64>, nodal: usize, dims: Vec<usize>) -> DeficitSpace<f64, Recording> {
        DeficitSpace::new(rho, nodal, dims)
            .unwrap()
            .with_minimizer(Recording::default())
    }

    fn entropy_of(values: &[f64]) -> f64 {
        values
            .iter()
            .filter(|&&v| v > 0.0)
            .map(|&v| -v * v.log2())
            .sum()
    }

    #[test]
    fn test_result_is_computed_once() {
        let mut space = recording(bell(), 1, vec![2, 2]);
        let first = space.result();
        assert_eq!(space.minimizer().count(), 2);
        let second = space.result();
        let _ = space.opt_angles();
        assert_eq!(space.minimizer().count(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_global_phase_can_be_disabled() {
        let mut space = recording(bell(), 1, vec![2, 2]);
        space.global_opt(false).local_algorithm(Algorithm::ParticleSwarm);
        space.result();
        let calls = space.minimizer().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Algorithm::ParticleSwarm);
    }

    #[test]
    fn test_local_phase_restarts_from_global_candidates() {
        // Classical mixture: measuring along z (θ = 0) gives no deficit.
        let rho = diag(&[0.5, 0.0, 0.0, 0.5]);
        let candidates = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        let recording = Recording {
            candidates: candidates.clone(),
            ..Recording::default()
        };
        let mut space = DeficitSpace::new(rho, 1, vec![2, 2])
            .unwrap()
            .with_minimizer(recording);
        space.initial_angle(&[0.5, 0.0]).unwrap().local_starts(3);
        assert!(space.result().abs() < 1e-10);
        assert_eq!(space.opt_angles(), &[0.0, 0.0]);

        let calls = space.minimizer().calls.borrow();
        assert_eq!(calls.len(), 1 + 3);
        assert_eq!(calls[1], (Algorithm::NelderMead, vec![0.5 * PI, 0.0]));
        assert_eq!(calls[2].1, candidates[0]);
        assert_eq!(calls[3].1, candidates[1]);
    }

    #[test]
    fn test_single_local_start_ignores_candidates() {
        let recording = Recording {
            candidates: vec![vec![0.0, 0.0]],
            ..Recording::default()
        };
        let mut space = DeficitSpace::new(bell(), 1, vec![2, 2])
            .unwrap()
            .with_minimizer(recording);
        space.local_starts(1);
        space.result();
        assert_eq!(space.minimizer().count(), 2);
        space.local_starts(0);
        space.result();
        assert_eq!(space.minimizer().count(), 4);
    }

    #[test]
    fn test_seed_components_are_independent() {
        let mut space = recording(bell(), 1, vec![2, 2]);
        space.initial_angle(&[0.2, 0.3]).unwrap();
        space.result();
        let calls = space.minimizer().calls.borrow();
        assert_eq!(calls[0].0, Algorithm::DirectL);
        assert_relative_eq!(calls[0].1[0], 0.2 * PI);
        assert_relative_eq!(calls[0].1[1], 0.3 * PI);
    }

    #[test]
    fn test_setters_invalidate_only_the_optimum() {
        let mut space = recording(bell(), 1, vec![2, 2]);
        space.result();
        space.result_reg();
        assert_eq!(
            space.cache_state(),
            CacheState {
                total_entropy: true,
                optimum: true,
                registered: true
            }
        );

        space.local_xtol(1e-8).global_xtol(1e-3);
        assert_eq!(
            space.cache_state(),
            CacheState {
                total_entropy: true,
                optimum: false,
                registered: true
            }
        );
        space.result();
        assert_eq!(space.minimizer().count(), 4);

        space.angle_range(&[1.0, 1.0]).unwrap();
        assert!(!space.cache_state().optimum);
        space.result();
        let config = space.config().clone();
        space.set_config(config).unwrap();
        assert!(!space.cache_state().optimum);
        assert!(space.cache_state().registered);
    }

    #[test]
    fn test_refresh_clears_everything_and_restores_defaults() {
        let mut space = recording(bell(), 1, vec![2, 2]);
        space.result();
        space.result_reg();
        space.global_algorithm(Algorithm::Direct).local_ftol(1e-3);
        space.refresh();
        assert_eq!(space.cache_state(), CacheState::default());
        assert_eq!(space.config(), &DeficitConfig::for_family(MeasuredFamily::Qubit));
    }

    #[test]
    fn test_wrong_length_vectors_are_rejected() {
        let mut space = recording(bell(), 1, vec![2, 2]);
        space.result();
        assert_eq!(
            space.angle_range(&[1.0]).err(),
            Some(Error::InvalidParameterVectorLength {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            space.initial_angle(&[0.1; 5]).err(),
            Some(Error::InvalidParameterVectorLength {
                expected: 2,
                found: 5
            })
        );
        let mut config = DeficitConfig::for_family(MeasuredFamily::Qutrit);
        config.global_enabled = false;
        assert!(space.set_config(config).is_err());
        assert!(space.cache_state().optimum);
        assert!(space.config().global_enabled);
    }

    #[test]
    fn test_reset_party_validation() {
        let rho = diag(&[0.125; 8]);
        let mut space = recording(rho, 1, vec![2, 4]);
        space.result_reg();
        for bad in [0, 3] {
            assert_eq!(
                space.reset_party(bad).err(),
                Some(Error::InvalidMeasuredParty {
                    index: bad,
                    parties: 2
                })
            );
        }
        assert_eq!(
            space.reset_party(2).err(),
            Some(Error::UnsupportedMeasuredPartyDimension(4))
        );
        assert_eq!(space.parties().nodal(), 1);
        assert!(space.cache_state().registered);
    }

    #[test]
    fn test_reset_party_switches_family() {
        let rho = diag(&[1.0 / 6.0; 6]);
        let mut space = recording(rho, 1, vec![2, 3]);
        space.global_opt(false);
        space.result();
        space.result_reg();
        space.reset_party(2).unwrap();
        assert_eq!(space.family(), MeasuredFamily::Qutrit);
        assert_eq!(space.config(), &DeficitConfig::for_family(MeasuredFamily::Qutrit));
        assert_eq!(
            space.cache_state(),
            CacheState {
                total_entropy: true,
                optimum: false,
                registered: false
            }
        );
        space.result();
        assert_eq!(space.opt_angles().len(), 5);
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            DeficitSpace::new(CMat::<f64>::zeros(0, 0), 1, vec![2]).err(),
            Some(Error::ZeroSize)
        );
        assert_eq!(
            DeficitSpace::new(CMat::<f64>::zeros(4, 2), 1, vec![2, 2]).err(),
            Some(Error::ShapeMismatch { rows: 4, cols: 2 })
        );
        assert_eq!(
            DeficitSpace::new(bell(), 1, vec![2, 3]).err(),
            Some(Error::DimensionMismatch {
                expected: 6,
                found: 4
            })
        );
        assert_eq!(
            DeficitSpace::new(bell(), 3, vec![2, 2]).err(),
            Some(Error::InvalidMeasuredParty {
                index: 3,
                parties: 2
            })
        );
        assert_eq!(
            DeficitSpace::new(diag(&[0.25; 4]), 1, vec![4]).err(),
            Some(Error::UnsupportedMeasuredPartyDimension(4))
        );
        assert_eq!(
            DeficitSpace::with_uniform_dim(bell(), 1, 0).err(),
            Some(Error::InvalidDimension)
        );
    }

    #[test]
    fn test_uniform_dimension_constructor() {
        let space = DeficitSpace::with_uniform_dim(diag(&[0.125; 8]), 3, 2).unwrap();
        assert_eq!(space.parties().dims(), &[2, 2, 2]);
        assert_eq!(space.family(), MeasuredFamily::Qubit);
    }

    #[test]
    fn test_bell_state_deficit_is_one() {
        let mut space = DeficitSpace::new(bell(), 1, vec![2, 2]).unwrap();
        assert_relative_eq!(space.total_entropy(), 0.0, epsilon = 1e-10);
        assert_relative_eq!(space.result(), 1.0, epsilon = 1e-8);
        for v in space.result_reg_all() {
            assert_relative_eq!(v, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pure_ket_input_matches_density_matrix() {
        let s = 0.5f64.sqrt();
        let mut from_ket = DeficitSpace::new(ket(&[s, 0.0, 0.0, s]), 2, vec![2, 2]).unwrap();
        let mut from_rho = DeficitSpace::new(bell(), 2, vec![2, 2]).unwrap();
        assert_eq!(from_ket.rho().shape(), (4, 4));
        assert_relative_eq!(from_ket.result_reg(), from_rho.result_reg(), epsilon = 1e-12);
    }

    #[test]
    fn test_product_state_has_no_deficit() {
        let mut space = DeficitSpace::new(ket(&[1.0, 0.0, 0.0, 0.0]), 1, vec![2, 2]).unwrap();
        assert!(space.result().abs() < 1e-6, "{}", space.result());
        assert!(space.result_reg().abs() < 1e-10);
    }

    #[test]
    fn test_classical_mixture_has_no_deficit() {
        let rho = diag(&[0.5, 0.0, 0.0, 0.5]);
        let mut space = DeficitSpace::new(rho, 1, vec![2, 2]).unwrap();
        assert_relative_eq!(space.total_entropy(), 1.0, epsilon = 1e-10);
        assert!(space.result().abs() < 1e-6, "{}", space.result());
        let all = space.result_reg_all();
        assert_relative_eq!(all[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(all[1], 1.0, epsilon = 1e-10);
        assert_relative_eq!(all[2], 0.0, epsilon = 1e-10);
        assert_eq!(space.result_reg(), all.iter().copied().fold(f64::INFINITY, f64::min));
    }

    #[test]
    fn test_werner_state_matches_closed_form() {
        let p = 0.5;
        let rho = bell() * c(p) + CMat::identity(4, 4) * c((1.0 - p) / 4.0);
        let measured = entropy_of(&[(1.0 + p) / 4.0, (1.0 + p) / 4.0, (1.0 - p) / 4.0, (1.0 - p) / 4.0]);
        let joint = entropy_of(&[(1.0 + 3.0 * p) / 4.0, (1.0 - p) / 4.0, (1.0 - p) / 4.0, (1.0 - p) / 4.0]);
        let mut space = DeficitSpace::new(rho, 2, vec![2, 2]).unwrap();
        assert_relative_eq!(space.result(), measured - joint, epsilon = 1e-8);
        assert_relative_eq!(space.result_reg(), measured - joint, epsilon = 1e-10);
    }

    #[test]
    fn test_optimal_angles_stay_in_bounds() {
        let rho = diag(&[0.5, 0.0, 0.0, 0.5]);
        let mut space = DeficitSpace::new(rho, 1, vec![2, 2]).unwrap();
        space.angle_range(&[0.5, 1.0]).unwrap().initial_angle(&[0.25, 0.5]).unwrap();
        let angles = space.opt_angles().to_vec();
        assert_eq!(angles.len(), 2);
        assert!(angles[0] >= 0.0 && angles[0] <= 0.5 * PI);
        assert!(angles[1] >= 0.0 && angles[1] <= PI);
    }

    #[test]
    fn test_registered_minimum_of_interior_party() {
        // |0><0| ⊗ |+><+| ⊗ |0><0|, measured on the middle party.
        let table = <f64 as Precision>::basis_table();
        let zero = table.qubit(0).unwrap().projector(0).unwrap();
        let plus = table.qubit(1).unwrap().projector(0).unwrap();
        let rho = zero.kronecker(plus).kronecker(zero);
        let mut space = DeficitSpace::new(rho, 2, vec![2, 2, 2]).unwrap();
        let all = space.result_reg_all();
        assert_relative_eq!(all[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(all[1], 1.0, epsilon = 1e-10);
        assert_relative_eq!(all[2], 1.0, epsilon = 1e-10);
        assert_eq!(space.result_reg(), all[0]);
    }

    #[test]
    fn test_maximally_entangled_qutrits() {
        let s = 3f64.sqrt().recip();
        let psi = ket(&[s, 0.0, 0.0, 0.0, s, 0.0, 0.0, 0.0, s]);
        let mut space = DeficitSpace::with_uniform_dim(psi, 1, 3).unwrap();
        assert_eq!(space.family(), MeasuredFamily::Qutrit);
        for v in space.result_reg_all() {
            assert_relative_eq!(v, 3f64.log2(), epsilon = 1e-10);
        }
        assert_relative_eq!(space.result(), 3f64.log2(), epsilon = 1e-8);
        assert_eq!(space.opt_angles().len(), 5);
    }

    /// Normalized qutrit (0.3, 0.5 e^{1.1i}, 0.8 e^{-0.7i}).
    fn skewed_qutrit() -> CMat<f64> {
        let amps = [
            c(0.3),
            Complex64::from_polar(0.5, 1.1),
            Complex64::from_polar(0.8, -0.7),
        ];
        let v = CMat::from_column_slice(3, 1, &amps);
        let norm = v.norm();
        v.unscale(norm)
    }

    #[test]
    fn test_product_qutrit_state_has_no_deficit() {
        let zero = ket(&[1.0, 0.0]);
        let psi = skewed_qutrit().kronecker(&zero);
        let mut space = DeficitSpace::new(psi, 1, vec![3, 2]).unwrap();
        assert_eq!(space.family(), MeasuredFamily::Qutrit);
        assert!(space.result().abs() < 1e-6, "{}", space.result());
    }

    #[test]
    fn test_product_qutrit_state_interior_party() {
        let zero = ket(&[1.0, 0.0]);
        let psi = zero.kronecker(&skewed_qutrit()).kronecker(&zero);
        let mut space = DeficitSpace::new(psi, 2, vec![2, 3, 2]).unwrap();
        assert_eq!(space.family(), MeasuredFamily::Qutrit);
        assert!(space.result().abs() < 1e-6, "{}", space.result());
        let angles = space.opt_angles();
        assert_eq!(angles.len(), 5);
        assert!(angles.iter().all(|&a| (0.0..=2.0 * PI).contains(&a)));
    }

    #[test]
    fn test_single_precision_session() {
        let h = num_complex::Complex32::new(0.5, 0.0);
        let z = num_complex::Complex32::new(0.0, 0.0);
        let rho = CMat::<f32>::from_row_slice(4, 4, &[h, z, z, h, z, z, z, z, z, z, z, z, h, z, z, h]);
        let mut space = DeficitSpace::new(rho, 1, vec![2, 2]).unwrap();
        space.global_opt(false);
        assert!((space.result() - 1.0).abs() < 1e-4);
    }
}
