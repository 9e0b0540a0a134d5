//! Derivative-free minimization over a box.
//!
//! The deficit engine only needs a narrow contract: minimize a scalar function
//! of a real vector inside `[lower, upper]`, starting from (and overwriting) an
//! initial point, stopping on relative x or f tolerances. [`Minimizer`] is that
//! contract and [`BoxMinimizer`] its default implementation, which runs every
//! algorithm through an `argmin` executor.

mod cost;
mod direct;
mod swarm;

use argmin::core::{Error as ArgminError, Executor, IterState, State, TerminationReason};
use argmin::solver::neldermead::NelderMead;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use cost::{BoxCost, Capped, Ledger};
use direct::{Direct, MAX_CANDIDATES};

/// Ceiling on objective evaluations per run of [`BoxMinimizer`].
pub const MAX_EVALUATIONS: usize = 100_000;

/// Seed of the particle swarm's random generator unless overridden.
pub const DEFAULT_SEED: u64 = 0x5eed;

pub(crate) const EVALUATION_LIMIT: &str = "evaluation limit reached";
pub(crate) const FTOL_REACHED: &str = "relative f tolerance reached";

type SimplexState = IterState<Vec<f64>, (), (), (), (), f64>;

/// Named search algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// DIRECT global search (Jones' dividing rectangles).
    Direct,
    /// Locally biased DIRECT: one rectangle per size class.
    DirectL,
    /// Particle swarm with a seeded generator.
    ParticleSwarm,
    /// Nelder–Mead simplex; trial points are projected onto the box.
    NelderMead,
}

impl Algorithm {
    /// Whether the algorithm explores the whole box rather than refining a point.
    pub fn is_global(self) -> bool {
        !matches!(self, Algorithm::NelderMead)
    }
}

/// Box constraints and stopping tolerances of one minimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Lower corner of the box.
    pub lower: Vec<f64>,
    /// Upper corner of the box.
    pub upper: Vec<f64>,
    /// Relative tolerance on the parameters; 0 disables.
    pub xtol_rel: f64,
    /// Relative tolerance on the objective; 0 disables.
    pub ftol_rel: f64,
}

impl Problem {
    /// Number of parameters.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Projects `x` onto the box.
    pub fn clamp(&self, x: &mut [f64]) {
        for ((xi, &lo), &hi) in x.iter_mut().zip(&self.lower).zip(&self.upper) {
            *xi = xi.clamp(lo, hi.max(lo));
        }
    }

    pub(crate) fn width(&self, i: usize) -> f64 {
        (self.upper[i] - self.lower[i]).max(0.0)
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The algorithm's own convergence test passed: divided rectangles or
    /// the swarm narrower than the x tolerance, or simplex values closer
    /// than the tolerances.
    Converged,
    /// An iteration improved the best value by less than the relative f
    /// tolerance.
    FTolReached,
    /// The evaluation ceiling was hit; the best point so far is returned.
    EvaluationLimit,
    /// The solver failed; the best point evaluated before the failure is
    /// returned.
    Aborted,
}

/// Result of a run; the optimal point itself is written back into `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Objective value at the returned point.
    pub value: f64,
    /// Number of objective evaluations spent.
    pub evaluations: usize,
    /// Stopping reason.
    pub termination: Termination,
    /// Further promising points of distinct basins, best first, for a
    /// multi-start refinement. Only DIRECT runs report any.
    pub candidates: Vec<Vec<f64>>,
}

/// A box-constrained minimizer.
pub trait Minimizer {
    /// Minimizes `objective` over `problem`'s box starting at `x`.
    ///
    /// On return `x` holds the best point found, even when the run stopped
    /// early.
    fn minimize(
        &self,
        algorithm: Algorithm,
        problem: &Problem,
        x: &mut [f64],
        objective: &mut dyn FnMut(&[f64]) -> f64,
    ) -> Outcome;
}

/// Default minimizer dispatching on [`Algorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxMinimizer {
    max_evaluations: usize,
    seed: u64,
}

impl BoxMinimizer {
    /// Minimizer with a custom evaluation ceiling (at least one evaluation).
    pub fn with_max_evaluations(max_evaluations: usize) -> Self {
        BoxMinimizer {
            max_evaluations: max_evaluations.max(1),
            ..Self::default()
        }
    }

    /// Reseeds the particle swarm.
    pub fn with_seed(self, seed: u64) -> Self {
        BoxMinimizer { seed, ..self }
    }

    fn direct(
        &self,
        cost: BoxCost<'_, '_>,
        problem: &Problem,
        start: (&[f64], f64),
        budget: u64,
        locally_biased: bool,
    ) -> Result<(Termination, Vec<Vec<f64>>), ArgminError> {
        let solver = Direct::new(problem, start, budget, locally_biased);
        let result = Executor::new(cost, solver).run()?;
        let termination = termination(result.state().get_termination_reason());
        Ok((termination, result.solver().candidates(MAX_CANDIDATES)))
    }

    fn nelder_mead(
        &self,
        cost: BoxCost<'_, '_>,
        problem: &Problem,
        start: &[f64],
        budget: u64,
    ) -> Result<(Termination, Vec<Vec<f64>>), ArgminError> {
        let tolerance = problem.xtol_rel.max(problem.ftol_rel).max(4.0 * f64::EPSILON);
        let solver = NelderMead::new(initial_simplex(problem, start)).with_sd_tolerance(tolerance)?;
        let result = Executor::<_, _, SimplexState>::new(cost, Capped::new(solver, budget)).run()?;
        Ok((termination(result.state().get_termination_reason()), Vec::new()))
    }

    fn swarm(
        &self,
        cost: BoxCost<'_, '_>,
        problem: &Problem,
        budget: u64,
    ) -> Result<(Termination, Vec<Vec<f64>>), ArgminError> {
        let solver = Capped::new(swarm::Swarm::new(problem, self.seed), budget);
        let result = Executor::<_, _, swarm::SwarmState>::new(cost, solver).run()?;
        Ok((termination(result.state().get_termination_reason()), Vec::new()))
    }
}

impl Default for BoxMinimizer {
    fn default() -> Self {
        BoxMinimizer {
            max_evaluations: MAX_EVALUATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

impl Minimizer for BoxMinimizer {
    fn minimize(
        &self,
        algorithm: Algorithm,
        problem: &Problem,
        x: &mut [f64],
        objective: &mut dyn FnMut(&[f64]) -> f64,
    ) -> Outcome {
        problem.clamp(x);
        let ledger = Ledger::default();
        let cost = BoxCost::new(problem, &ledger, objective);
        let start_value = cost.value(x);
        let budget = (self.max_evaluations - 1) as u64;

        let run = if problem.dim() == 0 {
            Ok((Termination::Converged, Vec::new()))
        } else {
            match algorithm {
                Algorithm::Direct => self.direct(cost, problem, (&*x, start_value), budget, false),
                Algorithm::DirectL => self.direct(cost, problem, (&*x, start_value), budget, true),
                Algorithm::ParticleSwarm => self.swarm(cost, problem, budget),
                Algorithm::NelderMead => self.nelder_mead(cost, problem, x, budget),
            }
        };
        let (termination, candidates) = run.unwrap_or_else(|err| {
            warn!(?algorithm, %err, "minimizer aborted");
            (Termination::Aborted, Vec::new())
        });

        let (value, best) = ledger.best();
        x.copy_from_slice(&best);
        let outcome = Outcome {
            value,
            evaluations: ledger.evaluations(),
            termination,
            candidates,
        };
        if termination == Termination::EvaluationLimit {
            warn!(?algorithm, evaluations = outcome.evaluations, "evaluation limit reached");
        } else {
            trace!(
                ?algorithm,
                value,
                evaluations = outcome.evaluations,
                ?termination,
                "minimization finished"
            );
        }
        outcome
    }
}

/// `start` plus one vertex per axis, a tenth of the box away and turned
/// back inward at the upper bound.
fn initial_simplex(problem: &Problem, start: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = vec![start.to_vec()];
    for i in 0..problem.dim() {
        let step = 0.1 * problem.width(i);
        let mut vertex = start.to_vec();
        vertex[i] = if start[i] + step > problem.upper[i] {
            start[i] - step
        } else {
            start[i] + step
        };
        simplex.push(vertex);
    }
    simplex
}

fn termination(reason: Option<&TerminationReason>) -> Termination {
    match reason {
        Some(TerminationReason::SolverConverged) => Termination::Converged,
        Some(TerminationReason::SolverExit(why)) if why == FTOL_REACHED => Termination::FTolReached,
        _ => Termination::EvaluationLimit,
    }
}
