//! The objective as an `argmin` cost function, plus the evaluation ceiling.

use std::cell::{Cell, RefCell};

use argmin::core::{
    CostFunction, Error, KV, Problem as Evaluator, Solver, State, TerminationReason,
    TerminationStatus,
};

use super::{EVALUATION_LIMIT, Problem};

/// Evaluation count and best point of one run.
///
/// Lives outside the executor so the best point survives a failed run.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    evaluations: Cell<usize>,
    best: RefCell<Option<(f64, Vec<f64>)>>,
}

impl Ledger {
    fn record(&self, x: &[f64], value: f64) {
        self.evaluations.set(self.evaluations.get() + 1);
        let mut best = self.best.borrow_mut();
        if best.as_ref().is_none_or(|(held, _)| value < *held) {
            *best = Some((value, x.to_vec()));
        }
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    /// Lowest value recorded and its point; `(+∞, [])` before any evaluation.
    pub(crate) fn best(&self) -> (f64, Vec<f64>) {
        self.best
            .borrow()
            .clone()
            .unwrap_or((f64::INFINITY, Vec::new()))
    }
}

/// Objective restricted to a box: parameters are projected onto it and NaN
/// reads as `+∞`.
pub(crate) struct BoxCost<'a, 'f> {
    problem: &'a Problem,
    ledger: &'a Ledger,
    objective: RefCell<&'f mut dyn FnMut(&[f64]) -> f64>,
}

impl<'a, 'f> BoxCost<'a, 'f> {
    pub(crate) fn new(
        problem: &'a Problem,
        ledger: &'a Ledger,
        objective: &'f mut dyn FnMut(&[f64]) -> f64,
    ) -> Self {
        BoxCost {
            problem,
            ledger,
            objective: RefCell::new(objective),
        }
    }

    pub(crate) fn value(&self, x: &[f64]) -> f64 {
        let mut x = x.to_vec();
        self.problem.clamp(&mut x);
        let mut objective = self.objective.borrow_mut();
        let mut value = (**objective)(&x);
        if value.is_nan() {
            value = f64::INFINITY;
        }
        self.ledger.record(&x, value);
        value
    }
}

impl CostFunction for BoxCost<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.value(param))
    }
}

/// Stops the wrapped solver once the objective has been evaluated `limit`
/// times.
pub(crate) struct Capped<S> {
    solver: S,
    limit: u64,
}

impl<S> Capped<S> {
    pub(crate) fn new(solver: S, limit: u64) -> Self {
        Capped { solver, limit }
    }
}

impl<O, I, S> Solver<O, I> for Capped<S>
where
    I: State,
    S: Solver<O, I>,
{
    const NAME: &'static str = S::NAME;

    fn init(&mut self, problem: &mut Evaluator<O>, state: I) -> Result<(I, Option<KV>), Error> {
        self.solver.init(problem, state)
    }

    fn next_iter(&mut self, problem: &mut Evaluator<O>, state: I) -> Result<(I, Option<KV>), Error> {
        self.solver.next_iter(problem, state)
    }

    fn terminate_internal(&mut self, state: &I) -> TerminationStatus {
        let spent = state.get_func_counts().get("cost_count").copied().unwrap_or(0);
        if spent >= self.limit {
            return TerminationStatus::Terminated(TerminationReason::SolverExit(
                EVALUATION_LIMIT.to_string(),
            ));
        }
        self.solver.terminate_internal(state)
    }
}

#[cfg(test)]
mod cost_tests {
    use super::*;

    fn unit_square() -> Problem {
        Problem {
            lower: vec![0.0, 0.0],
            upper: vec![1.0, 1.0],
            xtol_rel: 0.0,
            ftol_rel: 0.0,
        }
    }

    #[test]
    fn test_cost_clamps_and_records() {
        let problem = unit_square();
        let ledger = Ledger::default();
        let mut f = |x: &[f64]| x[0] + x[1];
        let cost = BoxCost::new(&problem, &ledger, &mut f);
        assert_eq!(cost.cost(&vec![2.0, -1.0]).unwrap(), 1.0);
        assert_eq!(cost.value(&[0.25, 0.5]), 0.75);
        assert_eq!(ledger.evaluations(), 2);
        assert_eq!(ledger.best(), (0.75, vec![0.25, 0.5]));
    }

    #[test]
    fn test_nan_reads_as_infinity() {
        let problem = unit_square();
        let ledger = Ledger::default();
        let mut f = |_: &[f64]| f64::NAN;
        let cost = BoxCost::new(&problem, &ledger, &mut f);
        assert_eq!(cost.value(&[0.5, 0.5]), f64::INFINITY);
        assert_eq!(ledger.best().0, f64::INFINITY);
        assert_eq!(ledger.best().1, vec![0.5, 0.5]);
    }

    #[test]
    fn test_ties_keep_the_first_point() {
        let problem = unit_square();
        let ledger = Ledger::default();
        let mut f = |_: &[f64]| 1.0;
        let cost = BoxCost::new(&problem, &ledger, &mut f);
        cost.value(&[0.1, 0.1]);
        cost.value(&[0.9, 0.9]);
        assert_eq!(ledger.best().1, vec![0.1, 0.1]);
    }
}
