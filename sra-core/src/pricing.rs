//! Price discovery by balance-row perturbation.
//!
//! The clearing price is the shadow price of the balance row. Integer
//! programs have no well-defined duals, so it is recovered as a finite
//! difference: solve the model, solve it again with one unit less slack on the
//! balance row, and take the drop in objective. Only the first solve's
//! allocation is ever reported.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::allocation::Allocation;
use crate::builder::ClearingModel;
use crate::curve::Curve;
use crate::error::ClearingError;
use crate::solver::{IntegerSolver, Solution, SolverConfig};

/// Which side's price level the clearing price matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSetter {
    Offer,
    Bid,
}

impl fmt::Display for PriceSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSetter::Offer => write!(f, "OFFER"),
            PriceSetter::Bid => write!(f, "BID"),
        }
    }
}

/// Rounding and setter-matching rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Decimal places the clearing price is rounded to.
    pub price_decimals: u32,
    /// Maximum distance between the clearing price and a step price for the
    /// step's side to count as the setter. Zero means exact equality.
    pub setter_tolerance: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_decimals: 2,
            setter_tolerance: 0.0,
        }
    }
}

/// Everything the two solves produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDiscovery {
    /// Allocation from the unperturbed solve.
    pub allocation: Allocation,
    pub objective_value: f64,
    pub perturbed_objective_value: f64,
    pub clearing_price: f64,
    pub setter: Option<PriceSetter>,
    pub solver: String,
    pub total_offer_units: u64,
}

/// Runs the unperturbed and perturbed solves with an injected backend.
pub struct PriceDiscoverySolver {
    solver: Box<dyn IntegerSolver>,
    pricing: PricingConfig,
}

impl PriceDiscoverySolver {
    pub fn new(solver: Box<dyn IntegerSolver>, pricing: PricingConfig) -> Self {
        Self { solver, pricing }
    }

    pub fn from_config(solver: &SolverConfig, pricing: PricingConfig) -> Self {
        Self::new(solver.build(), pricing)
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Solve the clearing model and its one-unit perturbation.
    ///
    /// An offer curve holding no units at all (empty, or only zero-unit
    /// steps) always fails with `ModelInfeasible` on `SRA-Solve-2`: the
    /// perturbed balance row would need a capacity of -1.
    pub fn discover(&self, bids: &Curve, offers: &Curve) -> Result<PriceDiscovery, ClearingError> {
        let base = ClearingModel::build(bids, offers);
        let solution = self.run(&base)?;
        let allocation = base.allocation(&solution);
        let objective_value = solution.objective;

        info!(
            uncleared_offers = allocation.total_uncleared_offer_units(),
            cleared_bids = allocation.total_cleared_bid_units(),
            objective = objective_value,
            "solved clearing model"
        );

        let perturbed = base.perturbed();
        if perturbed.balance_rhs() < 0.0 {
            warn!(
                model = perturbed.name(),
                "offer curve holds no units, perturbed balance row has negative capacity"
            );
            return Err(ClearingError::ModelInfeasible {
                model: perturbed.name().to_string(),
            });
        }
        let perturbed_objective_value = self.run(&perturbed)?.objective;

        let clearing_price = round_price(
            objective_value - perturbed_objective_value,
            self.pricing.price_decimals,
        );
        let setter = classify_setter(clearing_price, bids, offers, self.pricing.setter_tolerance);

        match setter {
            Some(side) => info!(clearing_price, setter = %side, "clearing price found"),
            None => warn!(
                clearing_price,
                "clearing price matches no bid or offer price, setter is ambiguous"
            ),
        }

        Ok(PriceDiscovery {
            allocation,
            objective_value,
            perturbed_objective_value,
            clearing_price,
            setter,
            solver: self.solver.name().to_string(),
            total_offer_units: base.total_offer_units(),
        })
    }

    fn run(&self, model: &ClearingModel) -> Result<Solution, ClearingError> {
        debug!(
            model = model.name(),
            solver = self.solver.name(),
            balance_rhs = model.balance_rhs(),
            "solving"
        );
        self.solver
            .solve(model.model())
            .map_err(|err| ClearingError::from_solve(model.name(), err))
    }
}

impl fmt::Debug for PriceDiscoverySolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceDiscoverySolver")
            .field("solver", &self.solver.name())
            .field("pricing", &self.pricing)
            .finish()
    }
}

/// Round to `decimals` places on the exact binary value of `value`, sending
/// exact midpoints to the even digit (10.125 → 10.12). Never returns `-0.0`.
///
/// Values outside `Decimal`'s range are returned unchanged.
pub fn round_price(value: f64, decimals: u32) -> f64 {
    let Some(exact) = Decimal::from_f64_retain(value) else {
        return value;
    };
    exact
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven)
        .to_f64()
        .map_or(value, |rounded| rounded + 0.0)
}

/// Offers are checked before bids; `None` when neither side matches.
pub fn classify_setter(
    price: f64,
    bids: &Curve,
    offers: &Curve,
    tolerance: f64,
) -> Option<PriceSetter> {
    if offers.has_price(price, tolerance) {
        Some(PriceSetter::Offer)
    } else if bids.has_price(price, tolerance) {
        Some(PriceSetter::Bid)
    } else {
        None
    }
}
