//! Conversion pipeline benchmarks.
//!
//! 1. Thompson construction of patterns of growing size
//! 2. Subset construction (NFA -> DFA), with and without the intermediate NFA
//! 3. DFA minimization
//! 4. Cached conversions through the engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use relang::prelude::*;

/// `(a|b)*a(a|b)^n`, whose minimal DFA has `2^(n+1)` states.
fn nth_from_last(n: usize) -> String {
    format!("(a|b)*a{}", "(a|b)".repeat(n))
}

fn ab() -> Alphabet {
    Alphabet::from("ab")
}

fn bench_thompson(c: &mut Criterion) {
    let mut group = c.benchmark_group("regex/compile");
    group.measurement_time(Duration::from_secs(5));

    for n in [4, 16, 64] {
        let pattern = nth_from_last(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &pattern, |b, pattern| {
            b.iter(|| Regex::new(black_box(pattern), ab()).unwrap());
        });
    }

    group.finish();
}

fn bench_subset_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("determinization");
    group.measurement_time(Duration::from_secs(5));

    for n in [2, 4, 6, 8] {
        let enfa = Regex::new(&nth_from_last(n), ab()).unwrap().into_automaton();
        let nfa = enfa.to_nfa();
        group.bench_with_input(BenchmarkId::new("via_nfa", n), &nfa, |b, nfa| {
            b.iter(|| nfa.to_dfa());
        });
        group.bench_with_input(BenchmarkId::new("direct", n), &enfa, |b, enfa| {
            b.iter(|| enfa.to_dfa_direct());
        });
    }

    group.finish();
}

fn bench_minimization(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimization");
    group.measurement_time(Duration::from_secs(5));

    for n in [2, 4, 6, 8] {
        let dfa = Regex::new(&nth_from_last(n), ab())
            .unwrap()
            .automaton()
            .to_dfa();
        group.bench_with_input(BenchmarkId::from_parameter(dfa.size()), &dfa, |b, dfa| {
            b.iter(|| dfa.minimize());
        });
    }

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    let enfa = Regex::new(&nth_from_last(6), ab()).unwrap().into_automaton();

    group.bench_function("minimize_cold", |b| {
        let engine = ConversionEngine::new(EngineConfig::default().with_cache_capacity(0));
        b.iter(|| engine.minimize(&enfa).unwrap());
    });
    group.bench_function("minimize_cached", |b| {
        let engine = ConversionEngine::default();
        b.iter(|| engine.minimize(&enfa).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_thompson,
    bench_subset_construction,
    bench_minimization,
    bench_engine
);
criterion_main!(benches);
