//! Particle swarm global search with a reproducible generator.

use argmin::core::{
    CostFunction, Error, KV, PopulationState, Problem as Evaluator, Solver, State,
    TerminationReason, TerminationStatus,
};
use argmin::solver::particleswarm::{Particle, ParticleSwarm};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::Problem;

pub(crate) type SwarmState = PopulationState<Particle<Vec<f64>, f64>, f64>;

const PARTICLES: usize = 40;

/// `argmin`'s particle swarm, converged once every particle sits within the
/// x tolerance of the best one along each axis.
pub(crate) struct Swarm {
    inner: ParticleSwarm<Vec<f64>, f64, StdRng>,
    spread: Vec<f64>,
}

impl Swarm {
    pub(crate) fn new(problem: &Problem, seed: u64) -> Self {
        let inner = ParticleSwarm::new((problem.lower.clone(), problem.upper.clone()), PARTICLES)
            .with_rng_generator(StdRng::seed_from_u64(seed));
        let spread = (0..problem.dim())
            .map(|i| problem.xtol_rel * problem.width(i))
            .collect();
        Swarm { inner, spread }
    }

    fn collapsed(&self, state: &SwarmState) -> bool {
        let (Some(best), Some(population)) = (state.get_best_param(), state.get_population())
        else {
            return false;
        };
        population.iter().all(|particle| {
            particle
                .position
                .iter()
                .zip(&best.position)
                .zip(&self.spread)
                .all(|((a, b), &tol)| (a - b).abs() <= tol)
        })
    }
}

impl<O> Solver<O, SwarmState> for Swarm
where
    O: CostFunction<Param = Vec<f64>, Output = f64>,
{
    const NAME: &'static str = "Particle Swarm Optimization";

    fn init(
        &mut self,
        problem: &mut Evaluator<O>,
        state: SwarmState,
    ) -> Result<(SwarmState, Option<KV>), Error> {
        self.inner.init(problem, state)
    }

    fn next_iter(
        &mut self,
        problem: &mut Evaluator<O>,
        state: SwarmState,
    ) -> Result<(SwarmState, Option<KV>), Error> {
        self.inner.next_iter(problem, state)
    }

    fn terminate(&mut self, state: &SwarmState) -> TerminationStatus {
        if self.collapsed(state) {
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        } else {
            TerminationStatus::NotTerminated
        }
    }
}

#[cfg(test)]
mod swarm_tests {
    use super::*;
    use argmin::core::Executor;

    struct Bowl;

    impl CostFunction for Bowl {
        type Param = Vec<f64>;
        type Output = f64;

        fn cost(&self, x: &Self::Param) -> Result<f64, Error> {
            Ok((x[0] - 0.3).powi(2) + (x[1] + 0.2).powi(2))
        }
    }

    fn square(xtol_rel: f64) -> Problem {
        Problem {
            lower: vec![-1.0, -1.0],
            upper: vec![1.0, 1.0],
            xtol_rel,
            ftol_rel: 0.0,
        }
    }

    #[test]
    fn test_swarm_collapses_onto_minimum() {
        let result = Executor::new(Bowl, Swarm::new(&square(1e-3), 7))
            .configure(|state: SwarmState| state.max_iters(5_000))
            .run()
            .unwrap();
        let state = result.state();
        assert_eq!(
            state.get_termination_reason(),
            Some(&TerminationReason::SolverConverged)
        );
        let best = &state.get_best_param().unwrap().position;
        assert!((best[0] - 0.3).abs() < 1e-2, "{best:?}");
        assert!((best[1] + 0.2).abs() < 1e-2, "{best:?}");
    }

    #[test]
    fn test_zero_tolerance_never_collapses_a_fresh_swarm() {
        let swarm = Swarm::new(&square(0.0), 1);
        assert!(swarm.spread.iter().all(|&s| s == 0.0));
        assert!(!swarm.collapsed(&SwarmState::new()));
    }
}
