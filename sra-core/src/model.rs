//! Solver-agnostic integer program.
//!
//! A `Model` is an arena of bounded integer variables addressed by `VarId`,
//! a list of named `expr <= rhs` constraints, and a linear objective that is
//! always maximized. Backends in [`crate::solver`] consume it read-only.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Feasibility slack used when checking a candidate assignment.
const FEASIBILITY_EPS: f64 = 1e-9;

/// Stable index of a variable inside its `Model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Integer decision variable with inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub lower: i64,
    pub upper: i64,
}

/// Ordered sum of `coefficient * variable` terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit-coefficient sum over `vars`.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        vars.into_iter().map(|var| (var, 1.0)).collect()
    }

    pub fn term(mut self, var: VarId, coefficient: f64) -> Self {
        self.push(var, coefficient);
        self
    }

    pub fn push(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[i64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coefficient)| coefficient * values[var.index()] as f64)
            .sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Named linear inequality `expr <= rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub rhs: f64,
}

impl Constraint {
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        self.expr.evaluate(values) <= self.rhs + FEASIBILITY_EPS
    }
}

/// Maximization integer program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpr::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Declare an integer variable bounded to `[lower, upper]`.
    pub fn add_integer_var(&mut self, name: impl Into<String>, lower: i64, upper: i64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: name.into(),
            lower,
            upper,
        });
        id
    }

    /// Add `expr <= rhs` and return the constraint's index.
    pub fn add_constraint(&mut self, name: impl Into<String>, expr: LinearExpr, rhs: f64) -> usize {
        debug_assert!(expr
            .terms()
            .iter()
            .all(|(var, _)| var.index() < self.variables.len()));
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            rhs,
        });
        self.constraints.len() - 1
    }

    /// Replace the right-hand side of constraint `index`.
    pub fn set_rhs(&mut self, index: usize, rhs: f64) {
        self.constraints[index].rhs = rhs;
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn objective_value(&self, values: &[i64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// True if `values` respects every bound and constraint.
    pub fn is_feasible(&self, values: &[i64]) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(var, &value)| var.lower <= value && value <= var.upper)
            && self.constraints.iter().all(|c| c.is_satisfied(values))
    }

    /// Render in CPLEX LP format, for inspecting named constraints by hand.
    pub fn to_lp_format(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\\* {} *\\", self.name);
        let _ = writeln!(out, "Maximize");
        let _ = writeln!(out, "OBJ: {}", self.render_expr(&self.objective));
        let _ = writeln!(out, "Subject To");
        for constraint in &self.constraints {
            let _ = writeln!(
                out,
                "{}: {} <= {}",
                constraint.name,
                self.render_expr(&constraint.expr),
                constraint.rhs
            );
        }
        let _ = writeln!(out, "Bounds");
        for var in &self.variables {
            let _ = writeln!(out, "{} <= {} <= {}", var.lower, var.name, var.upper);
        }
        if !self.variables.is_empty() {
            let _ = writeln!(out, "Generals");
            for var in &self.variables {
                let _ = writeln!(out, "{}", var.name);
            }
        }
        let _ = writeln!(out, "End");
        out
    }

    fn render_expr(&self, expr: &LinearExpr) -> String {
        if expr.is_empty() {
            return "0".to_string();
        }
        let mut out = String::new();
        for (i, (var, coefficient)) in expr.terms().iter().enumerate() {
            let name = &self.variables[var.index()].name;
            let magnitude = coefficient.abs();
            match (i, *coefficient < 0.0) {
                (0, false) => {}
                (0, true) => out.push_str("- "),
                (_, false) => out.push_str(" + "),
                (_, true) => out.push_str(" - "),
            }
            if magnitude == 1.0 {
                out.push_str(name);
            } else {
                let _ = write!(out, "{magnitude} {name}");
            }
        }
        out
    }
}
