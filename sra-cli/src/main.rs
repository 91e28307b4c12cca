//! SRA CLI — clear settlement residue auctions from CSV inputs.
//!
//! Commands:
//! - `clear` — clear one auction from a bids CSV and an offers CSV
//! - `batch` — clear many auction directories in parallel

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sra_core::{Curve, Side, SolverBackend};
use sra_runner::{
    clear_batch, clear_records, export_json, load_inputs, save_artifacts, write_lp_files,
    AuctionConfig, ClearingReport,
};

#[derive(Parser)]
#[command(name = "sra", about = "SRA CLI — settlement residue auction clearing engine")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear one auction from bid and offer CSV files.
    Clear {
        /// Bids CSV with PRICE and UNITS columns.
        #[arg(long)]
        bids: PathBuf,

        /// Offers CSV with PRICE and UNITS columns.
        #[arg(long)]
        offers: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Solver backend: clarabel, branch_and_bound or merit_order. Overrides the config.
        #[arg(long)]
        backend: Option<SolverBackend>,

        /// Write summary.csv, allocation.csv and report.json under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of the summary table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write both clearing models as LP files.
        #[arg(long, default_value_t = false)]
        write_lp: bool,
    },
    /// Clear every auction directory (each holding bids.csv and offers.csv).
    Batch {
        /// Auction directories.
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save artifacts for each cleared auction under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Clear {
            bids,
            offers,
            config,
            backend,
            output_dir,
            json,
            write_lp,
        } => run_clear_cmd(
            &bids,
            &offers,
            config.as_deref(),
            backend,
            output_dir.as_deref(),
            json,
            write_lp,
        ),
        Commands::Batch {
            dirs,
            config,
            output_dir,
        } => run_batch_cmd(&dirs, config.as_deref(), output_dir.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(level),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AuctionConfig> {
    match path {
        Some(path) => AuctionConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AuctionConfig::default()),
    }
}

fn run_clear_cmd(
    bids_path: &Path,
    offers_path: &Path,
    config_path: Option<&Path>,
    backend: Option<SolverBackend>,
    output_dir: Option<&Path>,
    json: bool,
    write_lp: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(backend) = backend {
        config.solver.backend = backend;
    }

    let inputs = load_inputs(bids_path, offers_path)?;

    if write_lp {
        let bids = Curve::normalize(Side::Bid, &inputs.bids)?;
        let offers = Curve::normalize(Side::Offer, &inputs.offers)?;
        let lp_dir = output_dir.unwrap_or_else(|| Path::new("."));
        for path in write_lp_files(&bids, &offers, lp_dir)? {
            info!(path = %path.display(), "wrote LP model");
        }
    }

    let report = clear_records(&inputs.bids, &inputs.offers, &config)?;

    if json {
        println!("{}", export_json(&report)?);
    } else {
        print_summary(&report);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_batch_cmd(
    dirs: &[PathBuf],
    config_path: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let entries = clear_batch(dirs, &config);

    let mut failed = 0;
    for entry in &entries {
        match &entry.outcome {
            Ok(report) => {
                let r = &report.result;
                println!(
                    "{:<32} cleared={:<8} uncleared={:<8} price={:<10} setter={}",
                    entry.dir.display(),
                    r.total_cleared_bid_units,
                    r.total_uncleared_offer_units,
                    r.clearing_price,
                    setter_label(report),
                );
                if let Some(out) = output_dir {
                    save_artifacts(report, out)?;
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{:<32} FAILED: {e}", entry.dir.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} auctions failed", entries.len());
    }
    Ok(())
}

fn setter_label(report: &ClearingReport) -> String {
    report
        .result
        .setter
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_summary(report: &ClearingReport) {
    let r = &report.result;
    println!();
    println!("=== Clearing Result ===");
    println!("Solver:           {}", report.solver);
    println!("Inputs:           {}", report.short_fingerprint());
    println!();
    println!("--- Allocation ---");
    println!("Cleared Bids:     {}", r.total_cleared_bid_units);
    println!("Uncleared Offers: {}", r.total_uncleared_offer_units);
    println!("Default Units:    {}", r.default_allocation_units);
    println!();
    println!("--- Price ---");
    println!("Clearing Price:   {}", r.clearing_price);
    println!("Setter:           {}", setter_label(report));
    println!("Objective:        {}", r.objective_value);
    println!("Perturbed:        {}", report.perturbed_objective_value);
}
