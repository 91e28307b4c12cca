//! Auction runner — wires loading, configuration, and the clearing engine.
//!
//! Two entry points:
//! - `clear_auction()`: reads bid and offer CSV files, then clears. Used by the CLI.
//! - `clear_records()`: takes already-loaded records. Used by batch mode and tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use sra_core::{
    clear, curves_fingerprint, AllocatedStep, ClearingError, ClearingOutcome, ClearingResult,
    RawStep,
};

use crate::config::{AuctionConfig, ConfigError};
use crate::data_loader::{load_inputs, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("clearing error: {0}")]
    Clearing(#[from] ClearingError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything persisted about one clearing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearingReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 hash of the normalized bid and offer curves.
    pub fingerprint: String,
    pub solver: String,
    pub result: ClearingResult,
    pub perturbed_objective_value: f64,
    /// Cleared bid steps first, then uncleared offer steps, in curve order.
    pub allocation: Vec<AllocatedStep>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ClearingReport {
    pub fn from_outcome(outcome: &ClearingOutcome) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            fingerprint: curves_fingerprint(&outcome.bids, &outcome.offers),
            solver: outcome.discovery.solver.clone(),
            result: outcome.result.clone(),
            perturbed_objective_value: outcome.discovery.perturbed_objective_value,
            allocation: outcome.discovery.allocation.steps().copied().collect(),
        }
    }

    /// Short fingerprint prefix used in artifact directory names.
    pub fn short_fingerprint(&self) -> &str {
        let end = self.fingerprint.len().min(12);
        &self.fingerprint[..end]
    }
}

/// Clear one auction from in-memory records — no I/O.
pub fn clear_records(
    bids: &[RawStep],
    offers: &[RawStep],
    config: &AuctionConfig,
) -> Result<ClearingReport, RunError> {
    config.validate()?;
    let engine = config.engine();
    debug!(
        solver = engine.solver_name(),
        bids = bids.len(),
        offers = offers.len(),
        "clearing auction"
    );
    let outcome = clear(bids, offers, &engine)?;
    let report = ClearingReport::from_outcome(&outcome);
    info!(
        fingerprint = report.short_fingerprint(),
        cleared_bids = report.result.total_cleared_bid_units,
        uncleared_offers = report.result.total_uncleared_offer_units,
        price = report.result.clearing_price,
        "auction cleared"
    );
    Ok(report)
}

/// Clear one auction from bid and offer CSV files.
pub fn clear_auction(
    bids_path: &Path,
    offers_path: &Path,
    config: &AuctionConfig,
) -> Result<ClearingReport, RunError> {
    let inputs = load_inputs(bids_path, offers_path)?;
    info!(
        bids = %bids_path.display(),
        offers = %offers_path.display(),
        "loaded auction inputs"
    );
    clear_records(&inputs.bids, &inputs.offers, config)
}
