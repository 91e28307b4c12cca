//! Deterministic fingerprint of a clearing run's inputs.
//!
//! Two runs over the same normalized curves share a fingerprint, so reports
//! can be compared or deduplicated without re-reading the inputs.

use serde_json::json;

use crate::curve::Curve;

/// BLAKE3 hex digest over the canonical JSON of both curves.
pub fn curves_fingerprint(bids: &Curve, offers: &Curve) -> String {
    let canonical = json!({
        "bids": steps(bids),
        "offers": steps(offers),
    });
    blake3::hash(canonical.to_string().as_bytes())
        .to_hex()
        .to_string()
}

fn steps(curve: &Curve) -> Vec<(f64, u64)> {
    curve.steps().iter().map(|s| (s.price, s.units)).collect()
}
