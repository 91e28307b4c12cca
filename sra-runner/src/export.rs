//! Report export — JSON, CSV, and LP artifact generation.
//!
//! Persisted reports carry a `schema_version`; newer versions than this build
//! understands are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sra_core::{AllocatedStep, ClearingModel, Curve};

use crate::runner::{ClearingReport, SCHEMA_VERSION};

pub const SUMMARY_FILE: &str = "summary.csv";
pub const ALLOCATION_FILE: &str = "allocation.csv";
pub const REPORT_FILE: &str = "report.json";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ClearingReport` to pretty JSON.
pub fn export_json(report: &ClearingReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ClearingReport to JSON")
}

/// Deserialize a `ClearingReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ClearingReport> {
    let report: ClearingReport =
        serde_json::from_str(json).context("failed to deserialize ClearingReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the one-row auction summary.
///
/// Columns: Cleared Bids, Uncleared Offers, Default Units, Clearing Price,
/// Objective, Setter (empty when no step carries the price).
pub fn export_summary_csv(report: &ClearingReport) -> Result<String> {
    let r = &report.result;
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Cleared Bids",
        "Uncleared Offers",
        "Default Units",
        "Clearing Price",
        "Objective",
        "Setter",
    ])?;
    wtr.write_record([
        r.total_cleared_bid_units.to_string(),
        r.total_uncleared_offer_units.to_string(),
        r.default_allocation_units.to_string(),
        r.clearing_price.to_string(),
        r.objective_value.to_string(),
        r.setter.map(|s| s.to_string()).unwrap_or_default(),
    ])?;
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-step allocation: side, row, price, units, quantity.
pub fn export_allocation_csv(steps: &[AllocatedStep]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["side", "row", "price", "units", "quantity"])?;
    for s in steps {
        wtr.write_record([
            s.side.to_string(),
            s.row.to_string(),
            s.price.to_string(),
            s.units.to_string(),
            s.quantity.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one clearing run.
///
/// Creates `{fingerprint prefix}_{timestamp}/` under `output_dir` containing
/// `summary.csv`, `allocation.csv` and `report.json`. Returns the directory.
pub fn save_artifacts(report: &ClearingReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.short_fingerprint(),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join(SUMMARY_FILE), export_summary_csv(report)?)?;
    std::fs::write(
        run_dir.join(ALLOCATION_FILE),
        export_allocation_csv(&report.allocation)?,
    )?;
    std::fs::write(run_dir.join(REPORT_FILE), export_json(report)?)?;

    Ok(run_dir)
}

/// Load a `ClearingReport` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<ClearingReport> {
    let path = dir.join(REPORT_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Write the unperturbed and perturbed clearing models as `{name}.lp` files.
pub fn write_lp_files(bids: &Curve, offers: &Curve, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create LP dir: {}", dir.display()))?;
    let base = ClearingModel::build(bids, offers);
    let perturbed = base.perturbed();

    let mut paths = Vec::with_capacity(2);
    for model in [&base, &perturbed] {
        let path = dir.join(format!("{}.lp", model.name()));
        std::fs::write(&path, model.model().to_lp_format())
            .with_context(|| format!("failed to write {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}
