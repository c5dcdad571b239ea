//! Limited-memory quasi-Newton minimiser for the four transform parameters.
//!
//! L-BFGS with optional box bounds: steps are projected onto the box, bound
//! variables pinned against their bound are frozen for the direction
//! computation, and step lengths come from a backtracking Armijo search.
//! Gradients are central finite differences of the cost.

use crate::core::{cost::CostFunction, transform::RigidTransform};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Sufficient-decrease constant for the Armijo condition
const ARMIJO_C1: f64 = 1e-4;
/// Step-length halvings tried before the line search gives up
const MAX_BACKTRACKS: usize = 50;

/// Box constraints on (scale, rotation, tx, ty)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: [f64; 4],
    pub upper: [f64; 4],
}

impl Bounds {
    pub fn new(lower: [f64; 4], upper: [f64; 4]) -> Self {
        Self { lower, upper }
    }

    fn project(&self, x: &mut [f64; 4]) {
        for i in 0..4 {
            x[i] = x[i].clamp(self.lower[i], self.upper[i]);
        }
    }

    /// Variable `i` sits on a bound and the gradient pushes it outward
    fn pinned(&self, x: &[f64; 4], g: &[f64; 4], i: usize) -> bool {
        (x[i] <= self.lower[i] && g[i] > 0.0) || (x[i] >= self.upper[i] && g[i] < 0.0)
    }
}

/// Optimizer settings
///
/// Defaults reproduce the service's historical behaviour: start at
/// scale 0.10, rotation 0.01 rad, translation (2.5, 2.5), at most 1000
/// iterations, relative cost tolerance 1e-12, no bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Starting point of the local search
    pub initial_guess: RigidTransform,

    /// Maximum number of quasi-Newton iterations.
    /// Default: 1000
    pub max_iterations: usize,

    /// Stop once `(f_k - f_k+1) / max(|f_k|, |f_k+1|, 1)` falls to this value.
    /// Default: 1e-12
    pub ftol: f64,

    /// Stop once the largest projected gradient component falls to this value.
    /// Default: 1e-12
    pub gtol: f64,

    /// Number of correction pairs kept for the inverse Hessian estimate.
    /// Default: 10
    pub history: usize,

    /// Budget of cost evaluations; each gradient costs eight.
    /// Default: 15000
    pub max_evaluations: usize,

    /// Relative finite-difference step for the gradient.
    /// Default: 1e-8
    pub gradient_step: f64,

    /// Optional box constraints. Default: none
    pub bounds: Option<Bounds>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            initial_guess: RigidTransform::new(0.10, 0.01, 2.5, 2.5),
            max_iterations: 1000,
            ftol: 1e-12,
            gtol: 1e-12,
            history: 10,
            max_evaluations: 15_000,
            gradient_step: 1e-8,
            bounds: None,
        }
    }
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_guess(mut self, guess: RigidTransform) -> Self {
        self.initial_guess = guess;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Why the search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative cost reduction fell below `ftol`
    CostConverged,
    /// Projected gradient fell below `gtol`
    GradientConverged,
    MaxIterations,
    MaxEvaluations,
    /// No step length produced sufficient decrease
    LineSearchFailed,
    /// The cost at the initial guess was NaN or infinite
    NonFiniteCost,
}

impl Termination {
    pub fn is_success(self) -> bool {
        matches!(self, Termination::CostConverged | Termination::GradientConverged)
    }
}

/// Outcome of a minimisation
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Best parameters found (the initial guess if nothing improved it)
    pub transform: RigidTransform,
    pub cost: f64,
    pub success: bool,
    pub termination: Termination,
    pub iterations: usize,
    pub evaluations: usize,
}

#[derive(Debug, Clone, Copy)]
struct Correction {
    s: [f64; 4],
    y: [f64; 4],
    rho: f64,
}

#[inline]
fn dot(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn max_abs(a: &[f64; 4]) -> f64 {
    a.iter().fold(0.0, |m, v| m.max(v.abs()))
}

/// Bounded L-BFGS driver
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Minimise `objective` starting from the configured initial guess
    pub fn minimize(&self, objective: &CostFunction<'_>) -> OptimizationResult {
        let cfg = &self.config;

        let mut x = cfg.initial_guess.to_array();
        if let Some(bounds) = &cfg.bounds {
            bounds.project(&mut x);
        }

        let mut f = objective.cost_at(&x);
        let mut evaluations = 1;

        if !f.is_finite() {
            return self.finish(x, f, Termination::NonFiniteCost, 0, evaluations);
        }

        let mut g = objective.gradient(&x, cfg.gradient_step);
        evaluations += 8;

        let mut history: VecDeque<Correction> = VecDeque::with_capacity(cfg.history);
        let mut iterations = 0;
        let mut termination = Termination::MaxIterations;

        while iterations < cfg.max_iterations {
            let free = self.free_mask(&x, &g);
            let pg = mask(&g, &free);
            if max_abs(&pg) <= cfg.gtol {
                termination = Termination::GradientConverged;
                break;
            }

            let mut d = mask(&two_loop(&history, &pg), &free);
            let mut slope = dot(&g, &d);
            if !(slope < 0.0) {
                // Stale curvature information; restart from steepest descent
                history.clear();
                d = pg.map(|v| -v);
                slope = dot(&g, &d);
            }

            let mut alpha = if history.is_empty() {
                (1.0 / pg.iter().map(|v| v * v).sum::<f64>().sqrt()).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                if evaluations >= cfg.max_evaluations {
                    break;
                }
                let mut candidate = [
                    x[0] + alpha * d[0],
                    x[1] + alpha * d[1],
                    x[2] + alpha * d[2],
                    x[3] + alpha * d[3],
                ];
                if let Some(bounds) = &cfg.bounds {
                    bounds.project(&mut candidate);
                }
                let step = sub(&candidate, &x);
                let fc = objective.cost_at(&candidate);
                evaluations += 1;

                let decrease = if cfg.bounds.is_some() { dot(&g, &step) } else { alpha * slope };
                if fc.is_finite() && fc <= f + ARMIJO_C1 * decrease {
                    accepted = Some((candidate, fc));
                    break;
                }
                alpha *= 0.5;
            }

            let Some((x_new, f_new)) = accepted else {
                if evaluations >= cfg.max_evaluations {
                    termination = Termination::MaxEvaluations;
                    break;
                }
                if !history.is_empty() {
                    // Retry once along the steepest descent direction
                    history.clear();
                    continue;
                }
                termination = Termination::LineSearchFailed;
                break;
            };

            let g_new = objective.gradient(&x_new, cfg.gradient_step);
            evaluations += 8;
            iterations += 1;

            let s = sub(&x_new, &x);
            let y = sub(&g_new, &g);
            let sy = dot(&s, &y);
            if sy > f64::EPSILON * dot(&y, &y) {
                if history.len() == cfg.history.max(1) {
                    history.pop_front();
                }
                history.push_back(Correction { s, y, rho: 1.0 / sy });
            }

            let reduction = (f - f_new) / f.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            f = f_new;
            g = g_new;

            if reduction <= cfg.ftol {
                termination = Termination::CostConverged;
                break;
            }
            if evaluations >= cfg.max_evaluations {
                termination = Termination::MaxEvaluations;
                break;
            }
        }

        self.finish(x, f, termination, iterations, evaluations)
    }

    fn free_mask(&self, x: &[f64; 4], g: &[f64; 4]) -> [bool; 4] {
        match &self.config.bounds {
            Some(bounds) => [0, 1, 2, 3].map(|i| !bounds.pinned(x, g, i)),
            None => [true; 4],
        }
    }

    fn finish(
        &self,
        x: [f64; 4],
        cost: f64,
        termination: Termination,
        iterations: usize,
        evaluations: usize,
    ) -> OptimizationResult {
        let success = termination.is_success();
        // Non-convergence is surfaced to callers through `success`
        tracing::debug!(
            "Optimizer finished ({:?}, success={}) after {} iterations, cost {:.6e}",
            termination,
            success,
            iterations,
            cost
        );
        OptimizationResult {
            transform: RigidTransform::from_array(x),
            cost,
            success,
            termination,
            iterations,
            evaluations,
        }
    }
}

#[inline]
fn sub(a: &[f64; 4], b: &[f64; 4]) -> [f64; 4] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]]
}

#[inline]
fn mask(v: &[f64; 4], free: &[bool; 4]) -> [f64; 4] {
    [0, 1, 2, 3].map(|i| if free[i] { v[i] } else { 0.0 })
}

/// Inverse-Hessian estimate applied to `g`, returned as a descent direction
fn two_loop(history: &VecDeque<Correction>, g: &[f64; 4]) -> [f64; 4] {
    let mut q = *g;
    let mut alphas = Vec::with_capacity(history.len());

    for c in history.iter().rev() {
        let a = c.rho * dot(&c.s, &q);
        for i in 0..4 {
            q[i] -= a * c.y[i];
        }
        alphas.push(a);
    }

    let gamma = history
        .back()
        .map(|c| dot(&c.s, &c.y) / dot(&c.y, &c.y))
        .unwrap_or(1.0);
    let mut r = q.map(|v| gamma * v);

    for (c, a) in history.iter().zip(alphas.iter().rev()) {
        let b = c.rho * dot(&c.y, &r);
        for i in 0..4 {
            r[i] += c.s[i] * (a - b);
        }
    }

    r.map(|v| -v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{curve::generate_heart, spatial_index::SpatialIndex};
    use geo::Point;

    #[test]
    fn test_default_config() {
        let cfg = OptimizerConfig::default();
        assert_eq!(cfg.initial_guess.to_array(), [0.10, 0.01, 2.5, 2.5]);
        assert_eq!(cfg.max_iterations, 1000);
        assert_eq!(cfg.ftol, 1e-12);
        assert!(cfg.bounds.is_none());
    }

    #[test]
    fn test_translation_only_problem() {
        // One curve point, one target: cost = (tx - 3)^2 + (ty + 1)^2 at scale 1
        let curve = vec![Point::new(0.0, 0.0)];
        let index = SpatialIndex::new(&[Point::new(3.0, -1.0)]).unwrap();
        let objective = CostFunction::new(&curve, &index);

        let optimizer = Optimizer::new(
            OptimizerConfig::new().with_initial_guess(RigidTransform::new(1.0, 0.0, 0.0, 0.0)),
        );
        let result = optimizer.minimize(&objective);

        assert!(result.cost < 1e-10, "cost {}", result.cost);
        assert!((result.transform.tx - 3.0).abs() < 1e-5);
        assert!((result.transform.ty + 1.0).abs() < 1e-5);
        assert!(result.iterations <= 1000);
    }

    #[test]
    fn test_recovers_small_offset() {
        let curve = generate_heart(200);
        let truth = RigidTransform::new(0.1004, 0.0125, 2.503, 2.498);
        let targets = truth.apply(&curve);
        let index = SpatialIndex::new(&targets).unwrap();
        let objective = CostFunction::new(&curve, &index);

        let result = Optimizer::default().minimize(&objective);

        assert!(result.cost < 1e-6, "cost {}", result.cost);
        assert!((result.transform.scale - truth.scale).abs() < 1e-3);
        assert!((result.transform.rotation - truth.rotation).abs() < 1e-3);
        assert!((result.transform.tx - truth.tx).abs() < 1e-3);
        assert!((result.transform.ty - truth.ty).abs() < 1e-3);
    }

    #[test]
    fn test_bounds_are_respected() {
        let curve = vec![Point::new(0.0, 0.0)];
        let index = SpatialIndex::new(&[Point::new(3.0, 0.0)]).unwrap();
        let objective = CostFunction::new(&curve, &index);

        let bounds = Bounds::new([0.5, -1.0, -1.0, -1.0], [2.0, 1.0, 1.0, 1.0]);
        let optimizer = Optimizer::new(
            OptimizerConfig::new()
                .with_initial_guess(RigidTransform::new(1.0, 0.0, 0.0, 0.0))
                .with_bounds(bounds),
        );
        let result = optimizer.minimize(&objective);

        assert!((result.transform.tx - 1.0).abs() < 1e-9);
        assert!(result.transform.ty.abs() < 1e-6);
        assert!((result.cost - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_iterations_returns_initial_guess() {
        let curve = generate_heart(20);
        let index = SpatialIndex::new(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).unwrap();
        let objective = CostFunction::new(&curve, &index);

        let guess = RigidTransform::new(0.3, 0.2, 0.1, 0.0);
        let optimizer = Optimizer::new(
            OptimizerConfig::new()
                .with_initial_guess(guess)
                .with_max_iterations(0),
        );
        let result = optimizer.minimize(&objective);

        assert_eq!(result.transform, guess);
        assert!(!result.success);
        assert_eq!(result.termination, Termination::MaxIterations);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_non_finite_start() {
        let curve = generate_heart(20);
        let index = SpatialIndex::new(&[Point::new(0.0, 0.0)]).unwrap();
        let objective = CostFunction::new(&curve, &index);

        let optimizer = Optimizer::new(
            OptimizerConfig::new().with_initial_guess(RigidTransform::new(f64::INFINITY, 0.0, 0.0, 0.0)),
        );
        let result = optimizer.minimize(&objective);
        assert_eq!(result.termination, Termination::NonFiniteCost);
        assert!(!result.success);
    }
}
