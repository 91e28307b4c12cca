//! Integer-programming backends behind a single trait.
//!
//! The clearing engine never searches for installed solvers: callers pick a
//! [`SolverBackend`] through [`SolverConfig`] and hand the built solver to the
//! price discovery step.

mod branch_and_bound;
mod interior_point;
mod merit_order;
mod simplex;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Model, VarId};

pub use branch_and_bound::BranchAndBound;
pub use interior_point::ClarabelLp;
pub use merit_order::MeritOrder;

/// Default node budget for branch and bound.
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// Slack this close to a whole unit still admits that unit.
const SATURATE_TOL: f64 = 1e-6;

/// Errors a backend can report for a single solve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no integer assignment satisfies the constraints")]
    Infeasible,
    #[error("objective is unbounded")]
    Unbounded,
    #[error("node limit of {0} reached before proving optimality")]
    NodeLimit(usize),
    #[error("simplex iteration limit reached")]
    IterationLimit,
    #[error("model shape not supported: {0}")]
    Unsupported(String),
}

/// An optimal integer assignment, indexed by `VarId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub values: Vec<i64>,
    /// Objective evaluated on `values`, not taken from the relaxation.
    pub objective: f64,
}

impl Solution {
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.index()]
    }
}

/// A conforming integer-programming solver.
pub trait IntegerSolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Maximize `model`'s objective over its integer feasible set.
    fn solve(&self, model: &Model) -> Result<Solution, SolveError>;
}

/// Objective coefficient per variable, duplicate terms summed.
pub(crate) fn objective_coefficients(model: &Model) -> Vec<f64> {
    let mut coefficient = vec![0.0; model.variables().len()];
    for &(var, a) in model.objective().terms() {
        coefficient[var.index()] += a;
    }
    coefficient
}

/// Raise each variable with a non-negative objective coefficient, visiting
/// them in `order`, as far as its bound and every constraint allow.
pub(crate) fn saturate(model: &Model, values: &mut [i64], order: &[usize]) {
    let coefficient = objective_coefficients(model);

    for &j in order {
        if coefficient[j] < 0.0 {
            continue;
        }
        let mut room = model.variables()[j].upper - values[j];
        for constraint in model.constraints() {
            if room <= 0 {
                break;
            }
            let a: f64 = constraint
                .expr
                .terms()
                .iter()
                .filter(|(var, _)| var.index() == j)
                .map(|(_, a)| a)
                .sum();
            if a <= SATURATE_TOL {
                continue;
            }
            let slack = constraint.rhs - constraint.expr.evaluate(values);
            room = room.min(((slack + SATURATE_TOL) / a).floor().max(0.0) as i64);
        }
        if room > 0 {
            values[j] += room;
        }
    }
}

/// Selectable solver implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Clarabel interior-point LP relaxation, rounded and verified against
    /// its bound; falls back to branch and bound when the check fails.
    #[default]
    Clarabel,
    /// General LP-relaxation branch and bound.
    BranchAndBound,
    /// Greedy fill of a single shared capacity row; exact for clearing models.
    MeritOrder,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Clarabel => write!(f, "clarabel"),
            SolverBackend::BranchAndBound => write!(f, "branch_and_bound"),
            SolverBackend::MeritOrder => write!(f, "merit_order"),
        }
    }
}

impl FromStr for SolverBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "clarabel" | "lp" => Ok(SolverBackend::Clarabel),
            "branch_and_bound" | "bnb" => Ok(SolverBackend::BranchAndBound),
            "merit_order" | "greedy" => Ok(SolverBackend::MeritOrder),
            other => Err(format!(
                "unknown solver backend '{other}' (expected clarabel, branch_and_bound or merit_order)"
            )),
        }
    }
}

/// Solver selection passed into the clearing engine at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Branch-and-bound node budget, also used by the `Clarabel` fallback;
    /// ignored by `MeritOrder`.
    pub max_nodes: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::default(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl SolverConfig {
    pub fn build(&self) -> Box<dyn IntegerSolver> {
        match self.backend {
            SolverBackend::Clarabel => {
                Box::new(ClarabelLp::new(BranchAndBound::new(self.max_nodes)))
            }
            SolverBackend::BranchAndBound => Box::new(BranchAndBound::new(self.max_nodes)),
            SolverBackend::MeritOrder => Box::new(MeritOrder),
        }
    }
}
