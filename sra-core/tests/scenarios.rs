//! End-to-end clearing scenarios, run against every solver backend.

use sra_core::{
    clear, ClearingError, PriceDiscoverySolver, PriceSetter, PricingConfig, RawStep,
    SolverBackend, SolverConfig,
};

fn engines() -> Vec<PriceDiscoverySolver> {
    [
        SolverBackend::Clarabel,
        SolverBackend::BranchAndBound,
        SolverBackend::MeritOrder,
    ]
        .into_iter()
        .map(|backend| {
            PriceDiscoverySolver::from_config(
                &SolverConfig {
                    backend,
                    ..SolverConfig::default()
                },
                PricingConfig::default(),
            )
        })
        .collect()
}

fn rows(steps: &[(f64, i64)]) -> Vec<RawStep> {
    steps.iter().map(|&(p, u)| RawStep::new(p, u)).collect()
}

// ── Scenario A: marginal offer sets the price ────────────────────────

#[test]
fn scenario_a_marginal_offer() {
    for engine in engines() {
        let outcome = clear(
            &rows(&[(50.0, 10)]),
            &rows(&[(0.0, 10), (20.0, 5)]),
            &engine,
        )
        .unwrap();

        let result = &outcome.result;
        assert_eq!(result.total_cleared_bid_units, 10, "{}", engine.solver_name());
        assert_eq!(result.default_allocation_units, 10);
        assert_eq!(result.clearing_price, 20.0);
        assert_eq!(result.setter, Some(PriceSetter::Offer));
    }
}

// ── Scenario B: no bids, no scarcity ─────────────────────────────────

#[test]
fn scenario_b_empty_bid_curve() {
    for engine in engines() {
        let outcome = clear(&[], &rows(&[(0.0, 10), (20.0, 5)]), &engine).unwrap();

        let result = &outcome.result;
        assert_eq!(result.total_cleared_bid_units, 0, "{}", engine.solver_name());
        assert_eq!(result.total_uncleared_offer_units, 15);
        assert_eq!(result.clearing_price, 0.0);
    }
}

// ── Scenario C: bids exceed offers ───────────────────────────────────

#[test]
fn scenario_c_bids_capped_at_available_offers() {
    for engine in engines() {
        let outcome = clear(
            &rows(&[(50.0, 30)]),
            &rows(&[(0.0, 10), (20.0, 5)]),
            &engine,
        )
        .unwrap();

        let result = &outcome.result;
        assert_eq!(result.total_cleared_bid_units, 15, "{}", engine.solver_name());
        assert_eq!(result.total_uncleared_offer_units, 0);
        assert_eq!(result.clearing_price, 50.0);
        assert_eq!(result.setter, Some(PriceSetter::Bid));
    }
}

// ── Scenario D: zero-unit bid steps are inert ────────────────────────

#[test]
fn scenario_d_zero_unit_bid_is_inert() {
    let offers = rows(&[(0.0, 10), (20.0, 5), (35.0, 4)]);
    for engine in engines() {
        let with_zero = clear(&rows(&[(50.0, 12), (999.0, 0)]), &offers, &engine).unwrap();
        let without = clear(&rows(&[(50.0, 12)]), &offers, &engine).unwrap();

        assert_eq!(with_zero.result, without.result, "{}", engine.solver_name());
        let zero_step = with_zero
            .discovery
            .allocation
            .cleared_bids
            .iter()
            .find(|s| s.units == 0)
            .unwrap();
        assert_eq!(zero_step.quantity, 0);
    }
}

// ── Failure modes ────────────────────────────────────────────────────

#[test]
fn negative_units_are_rejected_before_solving() {
    for engine in engines() {
        let err = clear(&rows(&[(50.0, -1)]), &rows(&[(0.0, 10)]), &engine).unwrap_err();
        assert!(matches!(err, ClearingError::InvalidRecord { row: 0, .. }));
    }
}

#[test]
fn offers_without_zero_price_fail_summarization() {
    for engine in engines() {
        let err = clear(&rows(&[(50.0, 1)]), &rows(&[(10.0, 5)]), &engine).unwrap_err();
        assert_eq!(err, ClearingError::NoDefaultAllocation);
    }
}

#[test]
fn empty_offer_curve_is_infeasible_once_perturbed() {
    for engine in engines() {
        let err = clear(&rows(&[(50.0, 1)]), &[], &engine).unwrap_err();
        assert!(matches!(err, ClearingError::ModelInfeasible { .. }));
    }
}

// ── Determinism ──────────────────────────────────────────────────────

#[test]
fn identical_inputs_give_identical_results() {
    let bids = rows(&[(50.0, 4), (42.5, 3), (42.5, 6), (10.0, 8)]);
    let offers = rows(&[(0.0, 9), (15.0, 3), (42.5, 2), (60.0, 5)]);
    for engine in engines() {
        let first = clear(&bids, &offers, &engine).unwrap();
        let second = clear(&bids, &offers, &engine).unwrap();
        assert_eq!(first, second);
    }
}
