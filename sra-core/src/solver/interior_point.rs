//! Clarabel interior-point solve of the LP relaxation.
//!
//! The clearing model's constraint matrix (one unit-coefficient capacity row
//! plus variable bounds) is totally unimodular, so its relaxation already has
//! an integral optimum. When optima tie, interior-point iterates land inside
//! the optimal face rather than on a vertex, so the relaxed point is floored
//! and then raised in descending objective order. The result is accepted only
//! if it reaches the relaxation bound; any other outcome is handed to the
//! fallback solver.

use std::cmp::Ordering;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT,
};
use tracing::{debug, trace};

use super::{objective_coefficients, saturate, BranchAndBound, IntegerSolver, Solution, SolveError};
use crate::model::Model;

/// A relaxed value this far below a whole unit still rounds up to it.
const ROUNDING_TOL: f64 = 1e-6;
/// Relative gap allowed between the rounded objective and the relaxation bound.
const BOUND_TOL: f64 = 1e-7;

/// LP-relaxation backend on Clarabel, exact for totally unimodular models.
#[derive(Debug, Clone)]
pub struct ClarabelLp {
    fallback: BranchAndBound,
}

impl ClarabelLp {
    pub fn new(fallback: BranchAndBound) -> Self {
        Self { fallback }
    }
}

impl Default for ClarabelLp {
    fn default() -> Self {
        Self::new(BranchAndBound::default())
    }
}

impl IntegerSolver for ClarabelLp {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&self, model: &Model) -> Result<Solution, SolveError> {
        match relax_and_round(model) {
            Ok(solution) => Ok(solution),
            Err(reason) => {
                debug!(model = model.name(), %reason, "relaxation rejected, using branch and bound");
                self.fallback.solve(model)
            }
        }
    }
}

struct Relaxation {
    values: Vec<f64>,
    bound: f64,
}

fn relax_and_round(model: &Model) -> Result<Solution, String> {
    if model.variables().is_empty() {
        return Err("model has no variables".into());
    }
    if let Some(var) = model.variables().iter().find(|v| v.lower > v.upper) {
        return Err(format!("variable '{}' has empty bounds", var.name));
    }

    let relaxed = solve_relaxation(model)?;
    trace!(model = model.name(), bound = relaxed.bound, "relaxation solved");

    let mut values = round_down(model, &relaxed.values, ROUNDING_TOL);
    if !model.is_feasible(&values) {
        values = round_down(model, &relaxed.values, 0.0);
    }
    if !model.is_feasible(&values) {
        return Err("rounded relaxation violates a constraint".into());
    }

    let coefficient = objective_coefficients(model);
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort keeps declaration order among equal coefficients.
    order.sort_by(|&a, &b| {
        coefficient[b]
            .partial_cmp(&coefficient[a])
            .unwrap_or(Ordering::Equal)
    });
    saturate(model, &mut values, &order);

    let objective = model.objective_value(&values);
    if objective + BOUND_TOL * (1.0 + relaxed.bound.abs()) < relaxed.bound {
        return Err(format!(
            "rounded objective {objective} is below relaxation bound {}",
            relaxed.bound
        ));
    }
    Ok(Solution { values, objective })
}

fn round_down(model: &Model, relaxed: &[f64], tolerance: f64) -> Vec<i64> {
    model
        .variables()
        .iter()
        .zip(relaxed)
        .map(|(var, &x)| ((x + tolerance).floor() as i64).clamp(var.lower, var.upper))
        .collect()
}

/// Solve `max c'x` over `Ax <= b, lower <= x <= upper` as Clarabel's
/// `min -c'x` subject to `Ax + s = b, s >= 0`, with the bounds as extra rows.
fn solve_relaxation(model: &Model) -> Result<Relaxation, String> {
    let n = model.variables().len();
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut rhs = Vec::new();

    for constraint in model.constraints() {
        let row = rhs.len();
        for &(var, a) in constraint.expr.terms() {
            columns[var.index()].push((row, a));
        }
        rhs.push(constraint.rhs);
    }
    for (j, var) in model.variables().iter().enumerate() {
        columns[j].push((rhs.len(), 1.0));
        rhs.push(var.upper as f64);
        columns[j].push((rhs.len(), -1.0));
        rhs.push(-(var.lower as f64));
    }
    let m = rhs.len();

    // CSC: entries sorted by row within each column, duplicates summed.
    let mut col_ptr = Vec::with_capacity(n + 1);
    let mut row_idx = Vec::new();
    let mut entries = Vec::new();
    for column in &mut columns {
        let start = row_idx.len();
        col_ptr.push(start);
        column.sort_by_key(|&(r, _)| r);
        for &(r, a) in column.iter() {
            if row_idx.len() > start && row_idx.last() == Some(&r) {
                if let Some(last) = entries.last_mut() {
                    *last += a;
                }
            } else {
                row_idx.push(r);
                entries.push(a);
            }
        }
    }
    col_ptr.push(row_idx.len());

    let a_mat = CscMatrix::new(m, n, col_ptr, row_idx, entries);
    let p_mat = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
    let q: Vec<f64> = objective_coefficients(model).iter().map(|c| -c).collect();
    let cones = [SupportedConeT::NonnegativeConeT(m)];

    let settings: DefaultSettings<f64> = DefaultSettingsBuilder::default()
        .verbose(false)
        .build()
        .map_err(|e| format!("Clarabel settings error: {e:?}"))?;
    let mut solver = DefaultSolver::new(&p_mat, &q, &a_mat, &rhs, &cones, settings)
        .map_err(|e| format!("Clarabel initialization failed: {e:?}"))?;
    solver.solve();

    let solution = &solver.solution;
    match solution.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => Ok(Relaxation {
            values: solution.x.clone(),
            bound: -solution.obj_val,
        }),
        status => Err(format!("Clarabel returned status {status:?}")),
    }
}
