//! Dense two-phase simplex for the LP relaxation of a `Model`.
//!
//! Variables are shifted to `y = x - lower` so every column is non-negative,
//! and upper bounds become explicit `y <= upper - lower` rows. Rows with a
//! negative right-hand side get an artificial column for phase one. Bland's
//! rule picks entering and leaving columns, so the method cannot cycle.

use crate::model::Model;

const EPS: f64 = 1e-9;
const PIVOT_EPS: f64 = 1e-7;
const FEASIBILITY_TOL: f64 = 1e-7;
const MAX_ITERATIONS: usize = 50_000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LpOutcome {
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
    Unbounded,
    IterationLimit,
}

struct Tableau {
    /// Each row holds `width` coefficients followed by its right-hand side.
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    width: usize,
}

impl Tableau {
    fn rhs(&self, r: usize) -> f64 {
        self.rows[r][self.width]
    }

    fn pivot(&mut self, r: usize, c: usize, costs: &mut [f64]) {
        let p = self.rows[r][c];
        for v in self.rows[r].iter_mut() {
            *v /= p;
        }
        let pivot_row = self.rows[r].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            let factor = row[c];
            if i == r || factor == 0.0 {
                continue;
            }
            for (v, pv) in row.iter_mut().zip(&pivot_row) {
                *v -= factor * pv;
            }
        }
        let factor = costs[c];
        if factor != 0.0 {
            for (v, pv) in costs.iter_mut().zip(&pivot_row) {
                *v -= factor * pv;
            }
        }
        self.basis[r] = c;
    }

    /// Reduced costs `c - c_B B^-1 A`, with `-z` in the trailing slot.
    fn reduced_costs(&self, cost: &[f64]) -> Vec<f64> {
        let mut d = cost.to_vec();
        d.push(0.0);
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            let cb = cost[basic];
            if cb == 0.0 {
                continue;
            }
            for (dv, v) in d.iter_mut().zip(row) {
                *dv -= cb * v;
            }
        }
        d
    }

    fn optimize(&mut self, costs: &mut [f64], allowed: &[bool]) -> Result<(), LpOutcome> {
        for _ in 0..MAX_ITERATIONS {
            let Some(c) = (0..self.width).find(|&j| allowed[j] && costs[j] > EPS) else {
                return Ok(());
            };

            let mut leaving: Option<(usize, f64)> = None;
            for r in 0..self.rows.len() {
                let a = self.rows[r][c];
                if a <= EPS {
                    continue;
                }
                let ratio = self.rhs(r) / a;
                leaving = match leaving {
                    None => Some((r, ratio)),
                    Some((best_r, best)) => {
                        let tie = (ratio - best).abs() <= EPS;
                        if ratio < best - EPS || (tie && self.basis[r] < self.basis[best_r]) {
                            Some((r, ratio))
                        } else {
                            Some((best_r, best))
                        }
                    }
                };
            }

            let Some((r, _)) = leaving else {
                return Err(LpOutcome::Unbounded);
            };
            self.pivot(r, c, costs);
        }
        Err(LpOutcome::IterationLimit)
    }
}

/// Maximize the model's objective over `lower <= x <= upper` (continuous).
pub(crate) fn solve_relaxation(model: &Model, lower: &[f64], upper: &[f64]) -> LpOutcome {
    let n = model.variables().len();
    if (0..n).any(|j| upper[j] < lower[j] - EPS) {
        return LpOutcome::Infeasible;
    }

    let mut dense: Vec<(Vec<f64>, f64)> = Vec::with_capacity(model.constraints().len() + n);
    for constraint in model.constraints() {
        let mut coefs = vec![0.0; n];
        for &(var, a) in constraint.expr.terms() {
            coefs[var.index()] += a;
        }
        let shift: f64 = coefs.iter().zip(lower).map(|(a, l)| a * l).sum();
        dense.push((coefs, constraint.rhs - shift));
    }
    for j in 0..n {
        let mut coefs = vec![0.0; n];
        coefs[j] = 1.0;
        dense.push((coefs, (upper[j] - lower[j]).max(0.0)));
    }

    let m = dense.len();
    let artificial_count = dense.iter().filter(|(_, rhs)| *rhs < 0.0).count();
    let structural = n + m;
    let width = structural + artificial_count;

    let mut rows = Vec::with_capacity(m);
    let mut basis = Vec::with_capacity(m);
    let mut next_artificial = structural;
    for (i, (coefs, rhs)) in dense.into_iter().enumerate() {
        let mut row = vec![0.0; width + 1];
        row[..n].copy_from_slice(&coefs);
        row[n + i] = 1.0;
        row[width] = rhs;
        if rhs < 0.0 {
            for v in row.iter_mut() {
                *v = -*v;
            }
            row[next_artificial] = 1.0;
            basis.push(next_artificial);
            next_artificial += 1;
        } else {
            basis.push(n + i);
        }
        rows.push(row);
    }

    let mut tableau = Tableau { rows, basis, width };

    if artificial_count > 0 {
        let mut cost = vec![0.0; width];
        for c in cost.iter_mut().skip(structural) {
            *c = -1.0;
        }
        let mut d = tableau.reduced_costs(&cost);
        let all = vec![true; width];
        if let Err(outcome) = tableau.optimize(&mut d, &all) {
            return outcome;
        }
        if -d[width] < -FEASIBILITY_TOL {
            return LpOutcome::Infeasible;
        }
        // Drive zero-valued artificials out of the basis where possible.
        for r in 0..m {
            if tableau.basis[r] < structural {
                continue;
            }
            if let Some(j) = (0..structural).find(|&j| tableau.rows[r][j].abs() > PIVOT_EPS) {
                tableau.pivot(r, j, &mut d);
            }
        }
    }

    let mut cost = vec![0.0; width];
    for &(var, a) in model.objective().terms() {
        cost[var.index()] += a;
    }
    let mut d = tableau.reduced_costs(&cost);
    let allowed: Vec<bool> = (0..width).map(|j| j < structural).collect();
    if let Err(outcome) = tableau.optimize(&mut d, &allowed) {
        return outcome;
    }

    let mut values = lower.to_vec();
    for (r, &basic) in tableau.basis.iter().enumerate() {
        if basic < n {
            values[basic] = (lower[basic] + tableau.rhs(r)).clamp(lower[basic], upper[basic]);
        }
    }
    let objective = values.iter().zip(&cost).map(|(x, c)| x * c).sum();
    LpOutcome::Optimal { values, objective }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearExpr;

    fn bounds(model: &Model) -> (Vec<f64>, Vec<f64>) {
        let lower = model.variables().iter().map(|v| v.lower as f64).collect();
        let upper = model.variables().iter().map(|v| v.upper as f64).collect();
        (lower, upper)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn fractional_knapsack_relaxation() {
        let mut model = Model::new("lp");
        let x = model.add_integer_var("x", 0, 10);
        let y = model.add_integer_var("y", 0, 10);
        model.add_constraint("cap", LinearExpr::new().term(x, 2.0).term(y, 2.0), 15.0);
        model.set_objective(LinearExpr::new().term(x, 5.0).term(y, 3.0));
        let (lo, hi) = bounds(&model);

        match solve_relaxation(&model, &lo, &hi) {
            LpOutcome::Optimal { values, objective } => {
                assert_close(values[0], 7.5);
                assert_close(values[1], 0.0);
                assert_close(objective, 37.5);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn negative_rhs_needs_phase_one() {
        // -x <= -3 forces x >= 3; minimize x by maximizing -x.
        let mut model = Model::new("lp");
        let x = model.add_integer_var("x", 0, 10);
        model.add_constraint("floor", LinearExpr::new().term(x, -1.0), -3.0);
        model.set_objective(LinearExpr::new().term(x, -1.0));
        let (lo, hi) = bounds(&model);

        match solve_relaxation(&model, &lo, &hi) {
            LpOutcome::Optimal { values, objective } => {
                assert_close(values[0], 3.0);
                assert_close(objective, -3.0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn contradictory_rows_are_infeasible() {
        let mut model = Model::new("lp");
        let x = model.add_integer_var("x", 0, 10);
        model.add_constraint("floor", LinearExpr::new().term(x, -1.0), -8.0);
        model.add_constraint("ceiling", LinearExpr::new().term(x, 1.0), 5.0);
        let (lo, hi) = bounds(&model);
        assert_eq!(solve_relaxation(&model, &lo, &hi), LpOutcome::Infeasible);
    }

    #[test]
    fn empty_row_with_negative_rhs_is_infeasible() {
        let mut model = Model::new("lp");
        model.add_constraint("balance", LinearExpr::new(), -1.0);
        assert_eq!(solve_relaxation(&model, &[], &[]), LpOutcome::Infeasible);
    }

    #[test]
    fn crossed_bounds_are_infeasible() {
        let mut model = Model::new("lp");
        model.add_integer_var("x", 0, 10);
        assert_eq!(
            solve_relaxation(&model, &[4.0], &[3.0]),
            LpOutcome::Infeasible
        );
    }

    #[test]
    fn shifted_lower_bounds_are_respected() {
        let mut model = Model::new("lp");
        let x = model.add_integer_var("x", 2, 6);
        let y = model.add_integer_var("y", 1, 4);
        model.add_constraint("cap", LinearExpr::sum([x, y]), 7.0);
        model.set_objective(LinearExpr::new().term(x, 1.0).term(y, 2.0));
        let (lo, hi) = bounds(&model);

        match solve_relaxation(&model, &lo, &hi) {
            LpOutcome::Optimal { values, objective } => {
                assert_close(values[0], 3.0);
                assert_close(values[1], 4.0);
                assert_close(objective, 11.0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
