//! CSV loading for bid and offer records.
//!
//! Each file needs `PRICE` and `UNITS` columns (lower-case accepted); other
//! columns are ignored and fields are trimmed. Values stay as text here so
//! that coercion failures are reported by the normalizer with a row index.
//!
//! An auction directory holds `bids.csv` and `offers.csv`.

use std::path::{Path, PathBuf};

use sra_core::RawStep;
use thiserror::Error;

pub const BIDS_FILE: &str = "bids.csv";
pub const OFFERS_FILE: &str = "offers.csv";

/// Errors from the record loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("auction directory '{0}' is missing {BIDS_FILE} or {OFFERS_FILE}")]
    IncompleteAuction(PathBuf),
}

/// Raw bid and offer records for one auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionInputs {
    pub bids: Vec<RawStep>,
    pub offers: Vec<RawStep>,
}

/// Read every record of a `PRICE`/`UNITS` CSV file.
pub fn load_records(path: &Path) -> Result<Vec<RawStep>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(file).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse records from any reader (header row required).
pub fn read_records<R: std::io::Read>(reader: R) -> Result<Vec<RawStep>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

/// Load a bids/offers file pair.
pub fn load_inputs(bids: &Path, offers: &Path) -> Result<AuctionInputs, LoadError> {
    Ok(AuctionInputs {
        bids: load_records(bids)?,
        offers: load_records(offers)?,
    })
}

/// Load `bids.csv` and `offers.csv` from an auction directory.
pub fn load_auction_dir(dir: &Path) -> Result<AuctionInputs, LoadError> {
    let bids = dir.join(BIDS_FILE);
    let offers = dir.join(OFFERS_FILE);
    if !bids.is_file() || !offers.is_file() {
        return Err(LoadError::IncompleteAuction(dir.to_path_buf()));
    }
    load_inputs(&bids, &offers)
}
