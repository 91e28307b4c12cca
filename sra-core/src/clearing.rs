//! The clearing pipeline: normalize → build → solve → perturb → solve → summarize.
//!
//! Each call is a pure function of its inputs and the injected solver.

use serde::{Deserialize, Serialize};

use crate::curve::{Curve, RawStep, Side};
use crate::error::ClearingError;
use crate::pricing::{PriceDiscovery, PriceDiscoverySolver};
use crate::summary::{summarize, ClearingResult};

/// Normalized inputs plus everything derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearingOutcome {
    pub bids: Curve,
    pub offers: Curve,
    pub discovery: PriceDiscovery,
    pub result: ClearingResult,
}

/// Clear one auction from raw bid and offer records.
pub fn clear(
    bids: &[RawStep],
    offers: &[RawStep],
    engine: &PriceDiscoverySolver,
) -> Result<ClearingOutcome, ClearingError> {
    let bids = Curve::normalize(Side::Bid, bids)?;
    let offers = Curve::normalize(Side::Offer, offers)?;
    clear_curves(bids, offers, engine)
}

/// Clear one auction from already-normalized curves.
pub fn clear_curves(
    bids: Curve,
    offers: Curve,
    engine: &PriceDiscoverySolver,
) -> Result<ClearingOutcome, ClearingError> {
    let discovery = engine.discover(&bids, &offers)?;
    let result = summarize(&discovery, &offers)?;
    Ok(ClearingOutcome {
        bids,
        offers,
        discovery,
        result,
    })
}
