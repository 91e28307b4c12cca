//! Criterion benchmarks for the clearing hot path.
//!
//! Benchmarks:
//! 1. Curve normalization from raw text records
//! 2. Full price discovery (two solves) per backend and curve size

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sra_core::{
    Curve, PriceDiscoverySolver, PricingConfig, RawStep, Side, SolverBackend, SolverConfig,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_records(rng: &mut StdRng, n: usize, with_default: bool) -> Vec<RawStep> {
    let mut records: Vec<RawStep> = (0..n)
        .map(|_| {
            let cents: i64 = rng.gen_range(100..20_000);
            let units: u64 = rng.gen_range(1..50);
            RawStep::new(cents as f64 / 100.0, units)
        })
        .collect();
    if with_default {
        records.push(RawStep::new(0, rng.gen_range(10..200u64)));
    }
    records
}

fn bench_normalize(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let records = make_records(&mut rng, 200, true);
    c.bench_function("normalize_offers_200", |b| {
        b.iter(|| Curve::normalize(Side::Offer, black_box(&records)).unwrap())
    });
}

fn bench_discover(c: &mut Criterion) {
    let mut group = c.benchmark_group("discover");
    for &n in &[10usize, 50, 150] {
        let mut rng = StdRng::seed_from_u64(42);
        let bids = Curve::normalize(Side::Bid, &make_records(&mut rng, n, false)).unwrap();
        let offers = Curve::normalize(Side::Offer, &make_records(&mut rng, n, true)).unwrap();

        for backend in [
            SolverBackend::MeritOrder,
            SolverBackend::Clarabel,
            SolverBackend::BranchAndBound,
        ] {
            let engine = PriceDiscoverySolver::from_config(
                &SolverConfig {
                    backend,
                    ..SolverConfig::default()
                },
                PricingConfig::default(),
            );
            group.bench_with_input(BenchmarkId::new(backend.to_string(), n), &n, |b, _| {
                b.iter(|| engine.discover(black_box(&bids), black_box(&offers)).unwrap())
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_discover);
criterion_main!(benches);
