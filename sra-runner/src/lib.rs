//! SRA Runner — file loading, configuration, batch clearing, and export.
//!
//! This crate builds on `sra-core` to provide:
//! - TOML auction configuration (solver backend, pricing rules)
//! - CSV loading of bid and offer records
//! - Single-auction runner producing a fingerprinted `ClearingReport`
//! - Parallel batch clearing over auction directories
//! - JSON/CSV/LP artifact export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use batch::{clear_batch, BatchEntry};
pub use config::{AuctionConfig, ConfigError};
pub use data_loader::{load_auction_dir, load_inputs, load_records, AuctionInputs, LoadError};
pub use export::{
    export_allocation_csv, export_json, export_summary_csv, import_json, load_artifacts,
    save_artifacts, write_lp_files,
};
pub use runner::{clear_auction, clear_records, ClearingReport, RunError, SCHEMA_VERSION};
