//! Merit-order fill for single-capacity models.
//!
//! A model qualifies when at most one constraint has more than one term and
//! that constraint has unit coefficients. Single-term constraints tighten the
//! variable's bounds. The shared capacity is then filled in descending
//! objective coefficient order, equal coefficients in declaration order,
//! which is optimal for this shape. Zero-valued variables are filled too, so
//! ties resolve to the largest optimal assignment.

use std::cmp::Ordering;

use super::{objective_coefficients, IntegerSolver, Solution, SolveError};
use crate::model::Model;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct MeritOrder;

impl IntegerSolver for MeritOrder {
    fn name(&self) -> &'static str {
        "merit_order"
    }

    fn solve(&self, model: &Model) -> Result<Solution, SolveError> {
        let n = model.variables().len();
        let mut lower: Vec<i64> = model.variables().iter().map(|v| v.lower).collect();
        let mut upper: Vec<i64> = model.variables().iter().map(|v| v.upper).collect();
        let mut capacity: Option<(Vec<usize>, i64)> = None;

        for constraint in model.constraints() {
            let terms: Vec<(usize, f64)> = constraint
                .expr
                .terms()
                .iter()
                .filter(|(_, a)| a.abs() > EPS)
                .map(|(var, a)| (var.index(), *a))
                .collect();

            match terms.as_slice() {
                [] => {
                    if constraint.rhs < -EPS {
                        return Err(SolveError::Infeasible);
                    }
                }
                [(j, a)] => {
                    let limit = constraint.rhs / a;
                    if *a > 0.0 {
                        upper[*j] = upper[*j].min((limit + EPS).floor() as i64);
                    } else {
                        lower[*j] = lower[*j].max((limit - EPS).ceil() as i64);
                    }
                }
                _ => {
                    if capacity.is_some() {
                        return Err(SolveError::Unsupported(format!(
                            "more than one multi-term constraint ('{}')",
                            constraint.name
                        )));
                    }
                    let mut members = Vec::with_capacity(terms.len());
                    let mut seen = vec![false; n];
                    for &(j, a) in &terms {
                        if (a - 1.0).abs() > EPS || seen[j] {
                            return Err(SolveError::Unsupported(format!(
                                "constraint '{}' is not a unit-coefficient capacity row",
                                constraint.name
                            )));
                        }
                        seen[j] = true;
                        members.push(j);
                    }
                    capacity = Some((members, (constraint.rhs + EPS).floor() as i64));
                }
            }
        }

        if (0..n).any(|j| lower[j] > upper[j]) {
            return Err(SolveError::Infeasible);
        }

        let coefficient = objective_coefficients(model);

        let mut values = lower.clone();
        let mut in_capacity = vec![false; n];

        if let Some((mut members, rhs)) = capacity {
            let mut remaining = rhs - members.iter().map(|&j| lower[j]).sum::<i64>();
            if remaining < 0 {
                return Err(SolveError::Infeasible);
            }
            for &j in &members {
                in_capacity[j] = true;
            }
            // Stable sort keeps declaration order among equal coefficients.
            members.sort_by(|&a, &b| {
                coefficient[b]
                    .partial_cmp(&coefficient[a])
                    .unwrap_or(Ordering::Equal)
            });
            for j in members {
                if remaining == 0 || coefficient[j] < 0.0 {
                    break;
                }
                let take = (upper[j] - lower[j]).min(remaining);
                values[j] += take;
                remaining -= take;
            }
        }

        for j in 0..n {
            if !in_capacity[j] && coefficient[j] >= 0.0 {
                values[j] = upper[j];
            }
        }

        let objective = model.objective_value(&values);
        Ok(Solution { values, objective })
    }
}
