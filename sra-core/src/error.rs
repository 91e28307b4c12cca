//! Error taxonomy for a clearing run.
//!
//! Every variant is fatal to the run that raised it. An ambiguous price
//! setter is not an error: it surfaces as `setter = None`.

use thiserror::Error;

use crate::curve::Side;
use crate::solver::SolveError;

/// Errors from normalization, model solving, and summarization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClearingError {
    #[error("invalid {side} record at row {row}: {reason}")]
    InvalidRecord {
        side: Side,
        row: usize,
        reason: String,
    },

    /// Also raised for offer curves with zero total units, whose perturbed
    /// balance row has a negative right-hand side.
    #[error("model '{model}' is infeasible")]
    ModelInfeasible { model: String },

    #[error("solver failed on model '{model}': {source}")]
    Solver {
        model: String,
        #[source]
        source: SolveError,
    },

    #[error("no zero-priced offer step, default allocation is undefined")]
    NoDefaultAllocation,
}

impl ClearingError {
    pub(crate) fn invalid(side: Side, row: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            side,
            row,
            reason: reason.into(),
        }
    }

    /// Map a backend failure onto the run-level taxonomy.
    pub(crate) fn from_solve(model: &str, err: SolveError) -> Self {
        match err {
            SolveError::Infeasible => Self::ModelInfeasible {
                model: model.to_string(),
            },
            other => Self::Solver {
                model: model.to_string(),
                source: other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_solve_maps_to_model_infeasible() {
        let err = ClearingError::from_solve("SRA-Solve", SolveError::Infeasible);
        assert_eq!(
            err,
            ClearingError::ModelInfeasible {
                model: "SRA-Solve".into()
            }
        );
    }

    #[test]
    fn other_solve_failures_keep_their_source() {
        let err = ClearingError::from_solve("SRA-Solve-2", SolveError::NodeLimit(10));
        match err {
            ClearingError::Solver { model, source } => {
                assert_eq!(model, "SRA-Solve-2");
                assert_eq!(source, SolveError::NodeLimit(10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_record_message_names_side_and_row() {
        let err = ClearingError::invalid(Side::Offer, 3, "units must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid OFFER record at row 3: units must be non-negative"
        );
    }
}
