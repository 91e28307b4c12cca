//! Result summarization: one report record per clearing run.

use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::error::ClearingError;
use crate::pricing::{PriceDiscovery, PriceSetter};

/// Aggregate outcome of a clearing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearingResult {
    pub total_cleared_bid_units: u64,
    pub total_uncleared_offer_units: u64,
    /// Units of the zero-priced offer step carried into the auction.
    pub default_allocation_units: u64,
    pub clearing_price: f64,
    pub setter: Option<PriceSetter>,
    pub objective_value: f64,
}

/// Units of the first zero-priced offer step, in curve order.
pub fn default_allocation_units(offers: &Curve) -> Option<u64> {
    offers
        .steps()
        .iter()
        .find(|step| step.price == 0.0)
        .map(|step| step.units)
}

/// Package the unperturbed allocation and discovered price.
///
/// Fails with `NoDefaultAllocation` when the offer curve has no zero-priced
/// step; `discovery` itself stays valid in that case.
pub fn summarize(discovery: &PriceDiscovery, offers: &Curve) -> Result<ClearingResult, ClearingError> {
    let default_allocation_units =
        default_allocation_units(offers).ok_or(ClearingError::NoDefaultAllocation)?;

    Ok(ClearingResult {
        total_cleared_bid_units: discovery.allocation.total_cleared_bid_units(),
        total_uncleared_offer_units: discovery.allocation.total_uncleared_offer_units(),
        default_allocation_units,
        clearing_price: discovery.clearing_price,
        setter: discovery.setter,
        objective_value: discovery.objective_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocatedStep, Allocation};
    use crate::curve::{Side, Step};

    fn discovery() -> PriceDiscovery {
        let step = |side, price, units, quantity| AllocatedStep {
            side,
            row: 0,
            price,
            units,
            quantity,
        };
        PriceDiscovery {
            allocation: Allocation {
                cleared_bids: vec![step(Side::Bid, 50.0, 10, 10)],
                uncleared_offers: vec![
                    step(Side::Offer, 0.0, 10, 0),
                    step(Side::Offer, 20.0, 5, 5),
                ],
            },
            objective_value: 600.0,
            perturbed_objective_value: 580.0,
            clearing_price: 20.0,
            setter: Some(PriceSetter::Offer),
            solver: "merit_order".into(),
            total_offer_units: 15,
        }
    }

    #[test]
    fn summary_aggregates_first_solve() {
        let offers =
            Curve::from_steps(Side::Offer, &[Step::new(20.0, 5), Step::new(0.0, 10)]).unwrap();
        let result = summarize(&discovery(), &offers).unwrap();

        assert_eq!(
            result,
            ClearingResult {
                total_cleared_bid_units: 10,
                total_uncleared_offer_units: 5,
                default_allocation_units: 10,
                clearing_price: 20.0,
                setter: Some(PriceSetter::Offer),
                objective_value: 600.0,
            }
        );
    }

    #[test]
    fn missing_zero_priced_offer_is_an_error() {
        let offers = Curve::from_steps(Side::Offer, &[Step::new(20.0, 5)]).unwrap();
        assert_eq!(
            summarize(&discovery(), &offers),
            Err(ClearingError::NoDefaultAllocation)
        );
    }

    #[test]
    fn first_zero_priced_step_wins() {
        let offers = Curve::from_steps(
            Side::Offer,
            &[Step::new(0.0, 7), Step::new(5.0, 1), Step::new(0.0, 3)],
        )
        .unwrap();
        assert_eq!(default_allocation_units(&offers), Some(7));
    }

    #[test]
    fn setter_serializes_as_upper_case_or_null() {
        let offers = Curve::from_steps(Side::Offer, &[Step::new(0.0, 10)]).unwrap();
        let mut d = discovery();
        let json = serde_json::to_value(summarize(&d, &offers).unwrap()).unwrap();
        assert_eq!(json["setter"], "OFFER");

        d.setter = None;
        let json = serde_json::to_value(summarize(&d, &offers).unwrap()).unwrap();
        assert!(json["setter"].is_null());
    }
}
