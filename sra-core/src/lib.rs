//! SRA Core — clearing engine for the settlement residue auction.
//!
//! This crate contains the pure part of the auction:
//! - Curve normalization (raw `PRICE`/`UNITS` rows → sorted cumulative curves)
//! - A solver-agnostic integer program and two interchangeable backends
//! - The clearing model (cleared bids, uncleared offers, one balance row)
//! - Price discovery by perturbing the balance row one unit
//! - Summarization into a single `ClearingResult`
//!
//! No file or network I/O happens here; see `sra-runner` for loading and export.

pub mod allocation;
pub mod builder;
pub mod clearing;
pub mod curve;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod pricing;
pub mod solver;
pub mod summary;

pub use allocation::{AllocatedStep, Allocation};
pub use builder::{ClearingModel, StepVar};
pub use clearing::{clear, clear_curves, ClearingOutcome};
pub use curve::{Curve, CurveStep, RawStep, Side, Step};
pub use error::ClearingError;
pub use fingerprint::curves_fingerprint;
pub use model::{Constraint, LinearExpr, Model, VarId, Variable};
pub use pricing::{PriceDiscovery, PriceDiscoverySolver, PriceSetter, PricingConfig};
pub use solver::{
    BranchAndBound, ClarabelLp, IntegerSolver, MeritOrder, Solution, SolveError, SolverBackend,
    SolverConfig,
};
pub use summary::{summarize, ClearingResult};
