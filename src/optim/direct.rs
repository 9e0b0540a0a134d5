//! DIRECT (DIviding RECTangles) global search and its locally biased variant,
//! as an `argmin` solver.
//!
//! The box is mapped onto the unit hypercube. Every hyperrectangle is sampled
//! at its centre; each iteration trisects the "potentially optimal" ones, i.e.
//! those on the lower-right convex hull of (size, value) that could still hold
//! a better value than the best so far. The run converges once every rectangle
//! divided in one iteration is narrower than the x tolerance along each axis.

use std::collections::BTreeMap;

use argmin::core::{
    CostFunction, Error, IterState, KV, Problem as Evaluator, Solver, TerminationReason,
    TerminationStatus,
};

use super::{EVALUATION_LIMIT, FTOL_REACHED, Problem};

pub(crate) type DirectState = IterState<Vec<f64>, (), (), (), (), f64>;

/// Samples scanned, best first, when picking basin representatives.
const CANDIDATE_SCAN: usize = 4096;
/// Largest number of basin representatives reported.
pub(crate) const MAX_CANDIDATES: usize = 16;
/// Chebyshev radius in unit-cube coordinates within which a better sample
/// claims a point for its own basin.
const BASIN_RADIUS: f64 = 0.12;

#[derive(Debug, Clone, PartialEq)]
struct Rect {
    center: Vec<f64>,
    /// Number of trisections along each axis; side length is `3^-level`.
    levels: Vec<u32>,
    value: f64,
    /// Creation order; among equal values the oldest rectangle goes first.
    age: u64,
}

fn side(level: u32) -> f64 {
    3f64.powi(-(level as i32))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Converged,
    FTolReached,
    EvaluationLimit,
}

/// DIRECT over a box. `locally_biased` selects DIRECT-L.
#[derive(Debug, Clone)]
pub(crate) struct Direct {
    lower: Vec<f64>,
    width: Vec<f64>,
    xtol_rel: f64,
    ftol_rel: f64,
    locally_biased: bool,
    max_evaluations: u64,
    rects: Vec<Rect>,
    age: u64,
    best: (f64, Vec<f64>),
    stop: Option<Stop>,
}

impl Direct {
    /// `start` is a point already evaluated by the caller; it competes with
    /// the samples but is not part of the partition.
    pub(crate) fn new(
        problem: &Problem,
        start: (&[f64], f64),
        max_evaluations: u64,
        locally_biased: bool,
    ) -> Self {
        Direct {
            lower: problem.lower.clone(),
            width: (0..problem.dim()).map(|i| problem.width(i)).collect(),
            xtol_rel: problem.xtol_rel,
            ftol_rel: problem.ftol_rel,
            locally_biased,
            max_evaluations,
            rects: Vec::new(),
            age: 0,
            best: (start.1, start.0.to_vec()),
            stop: None,
        }
    }

    fn to_box(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .zip(self.lower.iter().zip(&self.width))
            .map(|(u, (lo, w))| lo + u * w)
            .collect()
    }

    fn sample<O>(&mut self, problem: &mut Evaluator<O>, unit: &[f64]) -> Result<f64, Error>
    where
        O: CostFunction<Param = Vec<f64>, Output = f64>,
    {
        let x = self.to_box(unit);
        let value = problem.cost(&x)?;
        if value < self.best.0 {
            self.best = (value, x);
        }
        Ok(value)
    }

    fn exhausted<O>(&self, problem: &Evaluator<O>) -> bool {
        problem.counts.get("cost_count").copied().unwrap_or(0) >= self.max_evaluations
    }

    /// Trisects `rects[idx]` along its longest sides, splitting first along
    /// the axis with the best sample so it keeps the largest pieces.
    fn divide<O>(&mut self, problem: &mut Evaluator<O>, idx: usize) -> Result<(), Error>
    where
        O: CostFunction<Param = Vec<f64>, Output = f64>,
    {
        let center = self.rects[idx].center.clone();
        let mut levels = self.rects[idx].levels.clone();
        let min_level = levels.iter().copied().min().unwrap_or(0);
        let delta = side(min_level + 1);

        let mut samples = Vec::new();
        for axis in (0..levels.len()).filter(|&i| levels[i] == min_level) {
            let mut lo = center.clone();
            let mut hi = center.clone();
            lo[axis] -= delta;
            hi[axis] += delta;
            let f_lo = self.sample(problem, &lo)?;
            let f_hi = self.sample(problem, &hi)?;
            samples.push((f_lo.min(f_hi), axis, [(lo, f_lo), (hi, f_hi)]));
        }
        samples.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, axis, pair) in samples {
            levels[axis] += 1;
            for (center, value) in pair {
                self.age += 1;
                self.rects.push(Rect {
                    center,
                    levels: levels.clone(),
                    value,
                    age: self.age,
                });
            }
        }
        self.age += 1;
        let parent = &mut self.rects[idx];
        parent.levels = levels;
        parent.age = self.age;
        Ok(())
    }

    /// Centres of up to `limit` distinct basins, best first, in box
    /// coordinates. The best point itself is left out.
    ///
    /// A sample represents a basin when no better sample lies within
    /// [`BASIN_RADIUS`] of it.
    pub(crate) fn candidates(&self, limit: usize) -> Vec<Vec<f64>> {
        let mut order: Vec<usize> = (0..self.rects.len()).collect();
        order.sort_by(|&a, &b| self.rects[a].value.total_cmp(&self.rects[b].value));
        order.truncate(CANDIDATE_SCAN);

        let mut found = Vec::new();
        for (rank, &i) in order.iter().enumerate() {
            if found.len() >= limit {
                break;
            }
            let center = &self.rects[i].center;
            let claimed = order[..rank]
                .iter()
                .any(|&j| chebyshev(center, &self.rects[j].center) <= BASIN_RADIUS);
            if claimed {
                continue;
            }
            let x = self.to_box(center);
            if x != self.best.1 {
                found.push(x);
            }
        }
        found
    }
}

fn chebyshev(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Size classes: rectangles sharing a key are compared on value only.
///
/// DIRECT measures the centre-to-vertex distance, DIRECT-L half the longest
/// side.
fn size_key(rect: &Rect, locally_biased: bool) -> Vec<u32> {
    if locally_biased {
        vec![rect.levels.iter().copied().min().unwrap_or(0)]
    } else {
        let mut levels = rect.levels.clone();
        levels.sort_unstable();
        levels
    }
}

fn size_measure(key: &[u32], locally_biased: bool) -> f64 {
    if locally_biased {
        0.5 * side(key[0])
    } else {
        0.5 * key.iter().map(|&l| side(l).powi(2)).sum::<f64>().sqrt()
    }
}

/// Indices of the rectangles to divide this iteration, given the best value
/// `minf` found so far.
fn potentially_optimal(rects: &[Rect], minf: f64, locally_biased: bool) -> Vec<usize> {
    // Per size class, every rectangle attaining the class minimum.
    let mut classes: BTreeMap<Vec<u32>, Vec<usize>> = BTreeMap::new();
    for (idx, rect) in rects.iter().enumerate() {
        let members = classes.entry(size_key(rect, locally_biased)).or_default();
        match members.first().map(|&m| rect.value.total_cmp(&rects[m].value)) {
            Some(std::cmp::Ordering::Greater) => {}
            Some(std::cmp::Ordering::Equal) => members.push(idx),
            _ => *members = vec![idx],
        }
    }

    let mut points: Vec<(f64, f64, Vec<usize>)> = classes
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by_key(|&m| rects[m].age);
            let value = rects[members[0]].value;
            (size_measure(&key, locally_biased), value, members)
        })
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut hull: Vec<usize> = Vec::new();
    for i in 0..points.len() {
        while hull.len() >= 2 {
            let a = &points[hull[hull.len() - 2]];
            let b = &points[hull[hull.len() - 1]];
            let c = &points[i];
            // Drop `b` if it lies on or above the segment a-c.
            let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
            if cross <= 0.0 {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(i);
    }

    let slope = |p: usize, q: usize| {
        let (p, q) = (&points[p], &points[q]);
        (p.1 - q.1) / (p.0 - q.0)
    };
    let mut chosen = Vec::new();
    for (pos, &i) in hull.iter().enumerate() {
        let last = pos + 1 == hull.len();
        let k1 = if pos == 0 { f64::NEG_INFINITY } else { slope(i, hull[pos - 1]) };
        let k2 = if last { f64::NEG_INFINITY } else { slope(i, hull[pos + 1]) };
        let (d, f, members) = (points[i].0, points[i].1, &points[i].2);
        if last || f - k1.max(k2) * d <= minf {
            if locally_biased {
                chosen.push(members[0]);
            } else {
                chosen.extend_from_slice(members);
            }
        }
    }
    chosen
}

impl<O> Solver<O, DirectState> for Direct
where
    O: CostFunction<Param = Vec<f64>, Output = f64>,
{
    const NAME: &'static str = "DIRECT";

    fn init(
        &mut self,
        problem: &mut Evaluator<O>,
        state: DirectState,
    ) -> Result<(DirectState, Option<KV>), Error> {
        let n = self.lower.len();
        let center = vec![0.5; n];
        let value = self.sample(problem, &center)?;
        self.rects = vec![Rect {
            center,
            levels: vec![0; n],
            value,
            age: 0,
        }];
        Ok((state.param(self.best.1.clone()).cost(self.best.0), None))
    }

    fn next_iter(
        &mut self,
        problem: &mut Evaluator<O>,
        state: DirectState,
    ) -> Result<(DirectState, Option<KV>), Error> {
        let previous = self.best.0;
        let mut small = true;
        for idx in potentially_optimal(&self.rects, previous, self.locally_biased) {
            if self.exhausted(problem) {
                self.stop = Some(Stop::EvaluationLimit);
                break;
            }
            self.divide(problem, idx)?;
            small &= self.rects[idx].levels.iter().all(|&l| side(l) <= self.xtol_rel);
        }

        if self.stop.is_none() {
            let best = self.best.0;
            if small {
                self.stop = Some(Stop::Converged);
            } else if self.ftol_rel > 0.0
                && best < previous
                && (previous - best).abs() <= self.ftol_rel * previous.abs()
            {
                self.stop = Some(Stop::FTolReached);
            }
        }
        Ok((state.param(self.best.1.clone()).cost(self.best.0), None))
    }

    fn terminate(&mut self, _state: &DirectState) -> TerminationStatus {
        let reason = match self.stop {
            None => return TerminationStatus::NotTerminated,
            Some(Stop::Converged) => TerminationReason::SolverConverged,
            Some(Stop::FTolReached) => TerminationReason::SolverExit(FTOL_REACHED.to_string()),
            Some(Stop::EvaluationLimit) => {
                TerminationReason::SolverExit(EVALUATION_LIMIT.to_string())
            }
        };
        TerminationStatus::Terminated(reason)
    }
}
