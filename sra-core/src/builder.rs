//! Clearing model construction.
//!
//! One integer variable per curve step, bounded by the step's units:
//! `uncleared_offers[j]` for offers and `cleared_bids[i]` for bids. The
//! balance row keeps what stays unmatched within what bids leave over:
//!
//! ```text
//! Σ uncleared_offers[j] + Σ cleared_bids[i] <= Σ available_offer_units[j]
//! ```
//!
//! Per-step limit rows repeat the variable bounds under traceable names.
//! The objective rewards served bids and unserved offers at their prices.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocation::{AllocatedStep, Allocation};
use crate::curve::{Curve, CurveStep, Side};
use crate::model::{LinearExpr, Model, VarId};
use crate::solver::Solution;

pub const MODEL_NAME: &str = "SRA-Solve";
pub const PERTURBED_MODEL_NAME: &str = "SRA-Solve-2";
pub const BALANCE_CONSTRAINT: &str = "balance";

/// A curve step paired with its decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepVar {
    pub step: CurveStep,
    pub var: VarId,
}

/// The clearing integer program plus the step-to-variable arena.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearingModel {
    model: Model,
    bids: Vec<StepVar>,
    offers: Vec<StepVar>,
    balance: usize,
    total_offer_units: u64,
}

impl ClearingModel {
    /// Build the unperturbed model from normalized curves.
    ///
    /// An empty side contributes no variables and no limit rows.
    pub fn build(bids: &Curve, offers: &Curve) -> Self {
        let mut model = Model::new(MODEL_NAME);

        let offers_vars: Vec<StepVar> = offers
            .steps()
            .iter()
            .enumerate()
            .map(|(j, step)| StepVar {
                step: *step,
                var: model.add_integer_var(format!("uncleared_offers_{j}"), 0, step.units as i64),
            })
            .collect();
        let bid_vars: Vec<StepVar> = bids
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| StepVar {
                step: *step,
                var: model.add_integer_var(format!("cleared_bids_{i}"), 0, step.units as i64),
            })
            .collect();

        let total_offer_units = offers.total_units();
        let balance = model.add_constraint(
            BALANCE_CONSTRAINT,
            LinearExpr::sum(offers_vars.iter().chain(&bid_vars).map(|sv| sv.var)),
            total_offer_units as f64,
        );

        for (j, sv) in offers_vars.iter().enumerate() {
            model.add_constraint(
                format!("uncleared_offer_limit{j}"),
                LinearExpr::new().term(sv.var, 1.0),
                sv.step.units as f64,
            );
        }
        for (i, sv) in bid_vars.iter().enumerate() {
            model.add_constraint(
                format!("cleared_bid_limit{i}"),
                LinearExpr::new().term(sv.var, 1.0),
                sv.step.units as f64,
            );
        }

        model.set_objective(
            bid_vars
                .iter()
                .chain(&offers_vars)
                .map(|sv| (sv.var, sv.step.price))
                .collect(),
        );

        debug!(
            bids = bid_vars.len(),
            offers = offers_vars.len(),
            total_offer_units,
            "built clearing model"
        );

        Self {
            model,
            bids: bid_vars,
            offers: offers_vars,
            balance,
            total_offer_units,
        }
    }

    /// Same model with the balance row tightened by exactly one unit.
    pub fn perturbed(&self) -> Self {
        let mut next = self.clone();
        next.model.set_name(PERTURBED_MODEL_NAME);
        next.model.set_rhs(self.balance, self.balance_rhs() - 1.0);
        next
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn bid_vars(&self) -> &[StepVar] {
        &self.bids
    }

    pub fn offer_vars(&self) -> &[StepVar] {
        &self.offers
    }

    pub fn balance_rhs(&self) -> f64 {
        self.model.constraints()[self.balance].rhs
    }

    pub fn total_offer_units(&self) -> u64 {
        self.total_offer_units
    }

    /// Read a solution back onto the curve steps.
    pub fn allocation(&self, solution: &Solution) -> Allocation {
        let read = |side: Side, vars: &[StepVar]| -> Vec<AllocatedStep> {
            vars.iter()
                .map(|sv| AllocatedStep {
                    side,
                    row: sv.step.row,
                    price: sv.step.price,
                    units: sv.step.units,
                    quantity: solution.value(sv.var).max(0) as u64,
                })
                .collect()
        };
        Allocation {
            cleared_bids: read(Side::Bid, &self.bids),
            uncleared_offers: read(Side::Offer, &self.offers),
        }
    }
}
