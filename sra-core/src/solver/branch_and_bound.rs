//! Depth-first branch and bound over simplex relaxations.

use tracing::trace;

use super::simplex::{solve_relaxation, LpOutcome};
use super::{saturate, IntegerSolver, Solution, SolveError};
use crate::model::Model;

/// A relaxation value this close to an integer is treated as integral.
const INTEGRALITY_TOL: f64 = 1e-6;
/// Nodes whose bound does not beat the incumbent by this much are pruned.
const PRUNE_TOL: f64 = 1e-9;

/// General integer solver: LP relaxation plus bound splitting on the first
/// fractional variable. Exploration order is deterministic, and the final
/// incumbent is raised along non-negative objective directions so that ties
/// resolve to the largest optimal assignment.
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    max_nodes: usize,
}

impl BranchAndBound {
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes }
    }
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self::new(super::DEFAULT_MAX_NODES)
    }
}

struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl IntegerSolver for BranchAndBound {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn solve(&self, model: &Model) -> Result<Solution, SolveError> {
        let root = Node {
            lower: model.variables().iter().map(|v| v.lower as f64).collect(),
            upper: model.variables().iter().map(|v| v.upper as f64).collect(),
        };

        let mut stack = vec![root];
        let mut incumbent: Option<Solution> = None;
        let mut explored = 0;

        while let Some(node) = stack.pop() {
            explored += 1;
            if explored > self.max_nodes {
                return Err(SolveError::NodeLimit(self.max_nodes));
            }

            let (values, bound) = match solve_relaxation(model, &node.lower, &node.upper) {
                LpOutcome::Optimal { values, objective } => (values, objective),
                LpOutcome::Infeasible => continue,
                LpOutcome::Unbounded => return Err(SolveError::Unbounded),
                LpOutcome::IterationLimit => return Err(SolveError::IterationLimit),
            };

            if let Some(best) = &incumbent {
                if bound <= best.objective + PRUNE_TOL {
                    continue;
                }
            }

            let fractional = values
                .iter()
                .position(|v| (v - v.round()).abs() > INTEGRALITY_TOL);

            match fractional {
                None => {
                    let ints: Vec<i64> = values.iter().map(|v| v.round() as i64).collect();
                    let objective = model.objective_value(&ints);
                    let improves = incumbent
                        .as_ref()
                        .map_or(true, |best| objective > best.objective + PRUNE_TOL);
                    if improves {
                        trace!(model = model.name(), objective, "new incumbent");
                        incumbent = Some(Solution {
                            values: ints,
                            objective,
                        });
                    }
                }
                Some(j) => {
                    let split = values[j].floor();
                    let mut up = Node {
                        lower: node.lower.clone(),
                        upper: node.upper.clone(),
                    };
                    up.lower[j] = split + 1.0;
                    let mut down = node;
                    down.upper[j] = split;
                    // LIFO: the down branch is explored first.
                    stack.push(up);
                    stack.push(down);
                }
            }
        }

        trace!(model = model.name(), explored, "branch and bound finished");
        let mut best = incumbent.ok_or(SolveError::Infeasible)?;
        let declared: Vec<usize> = (0..best.values.len()).collect();
        saturate(model, &mut best.values, &declared);
        best.objective = model.objective_value(&best.values);
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearExpr;

    #[test]
    fn integer_knapsack_needs_branching() {
        // max 5x + 4y  s.t. 6x + 4y <= 24, x + 2y <= 6  → LP optimum is fractional.
        let mut model = Model::new("knapsack");
        let x = model.add_integer_var("x", 0, 10);
        let y = model.add_integer_var("y", 0, 10);
        model.add_constraint("a", LinearExpr::new().term(x, 6.0).term(y, 4.0), 24.0);
        model.add_constraint("b", LinearExpr::new().term(x, 1.0).term(y, 2.0), 6.0);
        model.set_objective(LinearExpr::new().term(x, 5.0).term(y, 4.0));

        let solution = BranchAndBound::default().solve(&model).unwrap();
        assert!(model.is_feasible(&solution.values));
        assert_eq!(solution.objective, 20.0);
    }

    #[test]
    fn ties_resolve_to_the_largest_assignment() {
        let mut model = Model::new("ties");
        let zero = model.add_integer_var("zero", 0, 10);
        let paid = model.add_integer_var("paid", 0, 5);
        model.add_constraint("cap", LinearExpr::sum([zero, paid]), 15.0);
        model.set_objective(LinearExpr::new().term(zero, 0.0).term(paid, 20.0));

        let solution = BranchAndBound::default().solve(&model).unwrap();
        assert_eq!(solution.values, vec![10, 5]);
        assert_eq!(solution.objective, 100.0);
    }

    #[test]
    fn infeasible_model_is_reported() {
        let mut model = Model::new("infeasible");
        let x = model.add_integer_var("x", 0, 5);
        model.add_constraint("floor", LinearExpr::new().term(x, -1.0), -6.0);
        assert_eq!(
            BranchAndBound::default().solve(&model),
            Err(SolveError::Infeasible)
        );
    }

    #[test]
    fn node_limit_is_enforced() {
        let mut model = Model::new("knapsack");
        let x = model.add_integer_var("x", 0, 10);
        let y = model.add_integer_var("y", 0, 10);
        model.add_constraint("a", LinearExpr::new().term(x, 6.0).term(y, 4.0), 24.0);
        model.add_constraint("b", LinearExpr::new().term(x, 1.0).term(y, 2.0), 6.0);
        model.set_objective(LinearExpr::new().term(x, 5.0).term(y, 4.0));

        assert_eq!(
            BranchAndBound::new(1).solve(&model),
            Err(SolveError::NodeLimit(1))
        );
    }

    #[test]
    fn integrality_between_fractional_bounds() {
        // 2x <= 7 has LP optimum 3.5; the integer optimum is 3.
        let mut model = Model::new("round");
        let x = model.add_integer_var("x", 0, 10);
        model.add_constraint("cap", LinearExpr::new().term(x, 2.0), 7.0);
        model.set_objective(LinearExpr::new().term(x, 1.0));
        let solution = BranchAndBound::default().solve(&model).unwrap();
        assert_eq!(solution.values, vec![3]);
    }
}
