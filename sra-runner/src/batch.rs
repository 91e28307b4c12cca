//! Batch clearing — many independent auctions in parallel.
//!
//! Each directory holds `bids.csv` and `offers.csv`. Auctions share nothing,
//! so they are cleared on the rayon pool; one failure does not stop the rest.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::AuctionConfig;
use crate::data_loader::load_auction_dir;
use crate::runner::{clear_records, ClearingReport, RunError};

/// Outcome of one auction in a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub dir: PathBuf,
    pub outcome: Result<ClearingReport, RunError>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Clear every auction directory. Entries come back in input order.
pub fn clear_batch<P: AsRef<Path> + Sync>(dirs: &[P], config: &AuctionConfig) -> Vec<BatchEntry> {
    let entries: Vec<BatchEntry> = dirs
        .par_iter()
        .map(|dir| {
            let dir = dir.as_ref();
            let outcome = load_auction_dir(dir)
                .map_err(RunError::from)
                .and_then(|inputs| clear_records(&inputs.bids, &inputs.offers, config));
            if let Err(e) = &outcome {
                warn!(dir = %dir.display(), error = %e, "auction failed");
            }
            BatchEntry {
                dir: dir.to_path_buf(),
                outcome,
            }
        })
        .collect();

    let cleared = entries.iter().filter(|e| e.is_ok()).count();
    info!(
        total = entries.len(),
        cleared,
        failed = entries.len() - cleared,
        "batch complete"
    );
    entries
}
