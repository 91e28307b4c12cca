//! Bid and offer curves: validated, price-sorted step sequences.
//!
//! A curve is built once from raw tabular records and never mutated. Steps
//! are sorted ascending by price with a stable sort, so equal prices keep
//! their input order. Each step carries its running cumulative units and the
//! units still available beyond its price level.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ClearingError;

/// Which side of the auction a curve belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Bid,
    Offer,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "BID"),
            Side::Offer => write!(f, "OFFER"),
        }
    }
}

/// One input row as delivered by a tabular loader, before coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStep {
    #[serde(rename = "PRICE", alias = "price")]
    pub price: String,
    #[serde(rename = "UNITS", alias = "units")]
    pub units: String,
}

impl RawStep {
    pub fn new(price: impl ToString, units: impl ToString) -> Self {
        Self {
            price: price.to_string(),
            units: units.to_string(),
        }
    }
}

/// A typed step: the smallest indivisible quantity at a fixed price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub price: f64,
    pub units: u64,
}

impl Step {
    pub fn new(price: f64, units: u64) -> Self {
        Self { price, units }
    }
}

/// A step after normalization, with its derived curve attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveStep {
    /// Zero-based position of the record in the original input.
    pub row: usize,
    pub price: f64,
    pub units: u64,
    /// Running sum of `units` over the ascending-price order.
    pub cumulative_units: u64,
    /// `total_units - cumulative_units`; zero at the highest-priced step.
    pub uncleared_units: u64,
}

/// An immutable, ascending-price sequence of steps for one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    side: Side,
    steps: Vec<CurveStep>,
    total_units: u64,
}

impl Curve {
    /// Coerce raw records and build the curve.
    ///
    /// Fails with `InvalidRecord` on the first row whose price is not a finite
    /// number or whose units are not a non-negative integer.
    pub fn normalize(side: Side, records: &[RawStep]) -> Result<Self, ClearingError> {
        let steps = records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let price = parse_price(&record.price)
                    .map_err(|reason| ClearingError::invalid(side, row, reason))?;
                let units = parse_units(&record.units)
                    .map_err(|reason| ClearingError::invalid(side, row, reason))?;
                Ok(Step { price, units })
            })
            .collect::<Result<Vec<_>, ClearingError>>()?;
        Self::from_steps(side, &steps)
    }

    /// Build a curve from already-typed steps.
    pub fn from_steps(side: Side, steps: &[Step]) -> Result<Self, ClearingError> {
        let mut indexed = Vec::with_capacity(steps.len());
        for (row, step) in steps.iter().enumerate() {
            if !step.price.is_finite() {
                return Err(ClearingError::invalid(side, row, "price must be finite"));
            }
            if step.units > i64::MAX as u64 {
                return Err(ClearingError::invalid(side, row, "units out of range"));
            }
            indexed.push((row, *step));
        }

        // `sort_by` is stable: equal prices keep input order.
        indexed.sort_by(|(_, a), (_, b)| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));

        let mut total_units: u64 = 0;
        for &(row, step) in &indexed {
            total_units = total_units
                .checked_add(step.units)
                .filter(|total| *total <= i64::MAX as u64)
                .ok_or_else(|| ClearingError::invalid(side, row, "total units out of range"))?;
        }

        let mut cumulative_units = 0;
        let steps = indexed
            .into_iter()
            .map(|(row, step)| {
                cumulative_units += step.units;
                CurveStep {
                    row,
                    price: step.price,
                    units: step.units,
                    cumulative_units,
                    uncleared_units: total_units - cumulative_units,
                }
            })
            .collect();

        Ok(Self {
            side,
            steps,
            total_units,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn steps(&self) -> &[CurveStep] {
        &self.steps
    }

    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True if any step's price is within `tolerance` of `price`.
    pub fn has_price(&self, price: f64, tolerance: f64) -> bool {
        self.steps
            .iter()
            .any(|step| (step.price - price).abs() <= tolerance)
    }
}

fn parse_price(text: &str) -> Result<f64, String> {
    let trimmed = text.trim();
    let price: f64 = trimmed
        .parse()
        .map_err(|_| format!("price '{trimmed}' is not a number"))?;
    if !price.is_finite() {
        return Err(format!("price '{trimmed}' is not finite"));
    }
    Ok(price)
}

/// Units accept integer text, or float text with no fractional part ("10.0").
fn parse_units(text: &str) -> Result<u64, String> {
    let trimmed = text.trim();
    let units = match trimmed.parse::<i64>() {
        Ok(units) => units,
        Err(_) => {
            let float: f64 = trimmed
                .parse()
                .map_err(|_| format!("units '{trimmed}' is not an integer"))?;
            if !float.is_finite() || float.fract() != 0.0 || float.abs() > i64::MAX as f64 {
                return Err(format!("units '{trimmed}' is not an integer"));
            }
            float as i64
        }
    };
    if units < 0 {
        return Err(format!("units must be non-negative, got {units}"));
    }
    Ok(units as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[(&str, &str)]) -> Vec<RawStep> {
        rows.iter().map(|(p, u)| RawStep::new(p, u)).collect()
    }

    #[test]
    fn offers_are_sorted_with_cumulative_attributes() {
        let curve = Curve::normalize(
            Side::Offer,
            &raw(&[("20", "5"), ("0", "10"), ("35.5", "3")]),
        )
        .unwrap();

        let prices: Vec<f64> = curve.steps().iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![0.0, 20.0, 35.5]);
        assert_eq!(curve.total_units(), 18);

        let cumulative: Vec<u64> = curve.steps().iter().map(|s| s.cumulative_units).collect();
        assert_eq!(cumulative, vec![10, 15, 18]);

        let uncleared: Vec<u64> = curve.steps().iter().map(|s| s.uncleared_units).collect();
        assert_eq!(uncleared, vec![8, 3, 0]);
    }

    #[test]
    fn equal_prices_keep_input_order() {
        let curve = Curve::normalize(
            Side::Bid,
            &raw(&[("10", "1"), ("5", "2"), ("10", "3"), ("5", "4")]),
        )
        .unwrap();
        let rows: Vec<usize> = curve.steps().iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![1, 3, 0, 2]);
    }

    #[test]
    fn empty_input_yields_empty_curve() {
        let curve = Curve::normalize(Side::Bid, &[]).unwrap();
        assert!(curve.is_empty());
        assert_eq!(curve.total_units(), 0);
    }

    #[test]
    fn whitespace_and_integral_floats_are_accepted() {
        let curve = Curve::normalize(Side::Offer, &raw(&[(" 12.5 ", " 10.0 ")])).unwrap();
        assert_eq!(curve.steps()[0].price, 12.5);
        assert_eq!(curve.steps()[0].units, 10);
    }

    #[test]
    fn negative_units_are_rejected() {
        let err = Curve::normalize(Side::Offer, &raw(&[("0", "10"), ("20", "-1")])).unwrap_err();
        assert!(matches!(
            err,
            ClearingError::InvalidRecord {
                side: Side::Offer,
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn malformed_price_is_rejected() {
        let err = Curve::normalize(Side::Bid, &raw(&[("abc", "10")])).unwrap_err();
        assert!(matches!(err, ClearingError::InvalidRecord { row: 0, .. }));
    }

    #[test]
    fn fractional_units_are_rejected() {
        let err = Curve::normalize(Side::Bid, &raw(&[("10", "2.5")])).unwrap_err();
        assert!(err.to_string().contains("not an integer"));
    }

    #[test]
    fn non_finite_price_is_rejected() {
        assert!(Curve::normalize(Side::Bid, &raw(&[("inf", "1")])).is_err());
        assert!(Curve::from_steps(Side::Bid, &[Step::new(f64::NAN, 1)]).is_err());
    }

    #[test]
    fn total_overflow_reports_the_input_row() {
        let max = i64::MAX as u64;
        let err = Curve::from_steps(
            Side::Offer,
            &[Step::new(20.0, max), Step::new(5.0, 1), Step::new(1.0, 0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ClearingError::invalid(Side::Offer, 0, "total units out of range")
        );
    }

    #[test]
    fn has_price_honours_tolerance() {
        let curve = Curve::from_steps(Side::Offer, &[Step::new(20.0, 5)]).unwrap();
        assert!(curve.has_price(20.0, 0.0));
        assert!(!curve.has_price(20.004, 0.0));
        assert!(curve.has_price(20.004, 0.005));
    }
}
