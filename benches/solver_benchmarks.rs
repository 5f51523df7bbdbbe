use std::sync::{atomic::AtomicBool, Arc};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use wcsp_core::config::SearchConfig;
use wcsp_core::cost::Cost;
use wcsp_core::search::Solver;
use wcsp_core::wcsp::table::TableWcsp;

// N-Queens as a WCSP: all pairs of queens forbidden from sharing a row or
// diagonal (columns are the variables, so "same column" can't happen).
fn n_queens_problem(n: usize) -> TableWcsp {
    let mut wcsp = TableWcsp::new(vec![(0, n as i32 - 1, vec![Cost::MIN_COST; n]); n]);
    for i in 0..n {
        for j in (i + 1)..n {
            let row_diff = (j - i) as i32;
            let costs = (0..n as i32)
                .map(|a| {
                    (0..n as i32)
                        .map(|b| {
                            if a == b || (a - b).abs() == row_diff {
                                Cost::MAX_COST
                            } else {
                                Cost::MIN_COST
                            }
                        })
                        .collect()
                })
                .collect();
            wcsp.add_binary(i as u32, j as u32, costs);
        }
    }
    wcsp.set_ub(Cost::MAX_COST);
    wcsp
}

fn n_queens_heuristics(c: &mut Criterion) {
    let mut group = c.benchmark_group("N-Queens Heuristics");
    let n = 10;

    group.bench_function("N=10, min-domain/max-degree", |b| {
        b.iter(|| {
            let wcsp = black_box(n_queens_problem(n));
            let config = SearchConfig::default();
            let mut solver = Solver::new(wcsp, config, Arc::new(AtomicBool::new(false)));
            let outcome = solver.solve().unwrap();
            assert!(outcome.best_cost.is_some());
        })
    });

    group.bench_function("N=10, weighted-degree + last-conflict", |b| {
        b.iter(|| {
            let wcsp = black_box(n_queens_problem(n));
            let config = SearchConfig::builder()
                .weighted_degree(true)
                .last_conflict(true)
                .build()
                .unwrap();
            let mut solver = Solver::new(wcsp, config, Arc::new(AtomicBool::new(false)));
            let outcome = solver.solve().unwrap();
            assert!(outcome.best_cost.is_some());
        })
    });

    group.finish();
}

fn n_queens_hbfs_vs_dfs(c: &mut Criterion) {
    let mut group = c.benchmark_group("N-Queens HBFS vs DFS");

    for n in [8, 10, 12].iter() {
        group.bench_with_input(BenchmarkId::new("DFS", n), n, |b, &n| {
            b.iter(|| {
                let wcsp = black_box(n_queens_problem(n));
                let config = SearchConfig::default();
                let mut solver = Solver::new(wcsp, config, Arc::new(AtomicBool::new(false)));
                let outcome = solver.solve();
                assert!(outcome.is_ok());
            });
        });

        group.bench_with_input(BenchmarkId::new("HBFS", n), n, |b, &n| {
            b.iter(|| {
                let wcsp = black_box(n_queens_problem(n));
                let config = SearchConfig::builder().hbfs_init(16).build().unwrap();
                let mut solver = Solver::new(wcsp, config, Arc::new(AtomicBool::new(false)));
                let outcome = solver.solve();
                assert!(outcome.is_ok());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, n_queens_hbfs_vs_dfs, n_queens_heuristics);
criterion_main!(benches);
