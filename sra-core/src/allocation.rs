//! Per-step allocation produced by a solve.

use serde::{Deserialize, Serialize};

use crate::curve::Side;

/// The decided quantity for one curve step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocatedStep {
    pub side: Side,
    /// Zero-based input row of the step.
    pub row: usize,
    pub price: f64,
    pub units: u64,
    /// Cleared units for a bid, uncleared units for an offer.
    pub quantity: u64,
}

/// Cleared bids and uncleared offers, in curve order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub cleared_bids: Vec<AllocatedStep>,
    pub uncleared_offers: Vec<AllocatedStep>,
}

impl Allocation {
    pub fn total_cleared_bid_units(&self) -> u64 {
        self.cleared_bids.iter().map(|s| s.quantity).sum()
    }

    pub fn total_uncleared_offer_units(&self) -> u64 {
        self.uncleared_offers.iter().map(|s| s.quantity).sum()
    }

    /// Offer units that were matched against bids.
    pub fn total_cleared_offer_units(&self) -> u64 {
        self.uncleared_offers
            .iter()
            .map(|s| s.units - s.quantity.min(s.units))
            .sum()
    }

    /// Every quantity lies within `[0, units]` of its step.
    pub fn within_bounds(&self) -> bool {
        self.cleared_bids
            .iter()
            .chain(&self.uncleared_offers)
            .all(|s| s.quantity <= s.units)
    }

    /// `Σ uncleared_offers <= total_offer_units - Σ cleared_bids`.
    pub fn satisfies_balance(&self, total_offer_units: u64) -> bool {
        self.total_uncleared_offer_units() + self.total_cleared_bid_units() <= total_offer_units
    }

    pub fn steps(&self) -> impl Iterator<Item = &AllocatedStep> {
        self.cleared_bids.iter().chain(&self.uncleared_offers)
    }
}
