//! Randomized coverage for the search core's cross-configuration
//! invariants (`spec.md` §8): every complete search mode (plain DFS, HBFS,
//! Luby restarts, LDS with its complete-pass fallback enabled) must agree
//! on the optimum of the same problem, and a problem built to always be
//! feasible must always yield a solution. Grounded on the teacher's own
//! `prop_tests` submodule in `examples/map_colouring.rs`: a `generate_*`
//! strategy builds a random problem instance, fed into a `proptest!` block.

use std::sync::{atomic::AtomicBool, Arc};

use proptest::prelude::*;

use wcsp_core::config::SearchConfig;
use wcsp_core::cost::Cost;
use wcsp_core::search::Solver;
use wcsp_core::wcsp::table::TableWcsp;

/// A random graph-colouring-shaped WCSP: `num_vars` variables over
/// `num_colours` values, unary costs in `0..3`, and a soft (cost 1, not
/// forbidden) clash penalty on each of a random set of edges. Always
/// feasible — there is no hard constraint — so every complete search must
/// report `Some` cost and at least one solution.
fn random_soft_colouring() -> impl Strategy<Value = (usize, usize, Vec<(u32, u32)>, Vec<Vec<i64>>)> {
    (2..8usize, 2..4usize).prop_flat_map(|(num_vars, num_colours)| {
        let edges = proptest::collection::vec(
            (0..num_vars as u32, 0..num_vars as u32)
                .prop_filter("edges must join distinct variables", |(a, b)| a != b)
                .prop_map(|(a, b)| if a < b { (a, b) } else { (b, a) }),
            0..=(num_vars * (num_vars - 1) / 2).min(10),
        )
        .prop_map(|edges| {
            let unique: std::collections::BTreeSet<(u32, u32)> = edges.into_iter().collect();
            unique.into_iter().collect::<Vec<_>>()
        });
        let unary = proptest::collection::vec(
            proptest::collection::vec(0i64..3, num_colours),
            num_vars,
        );
        (Just(num_vars), Just(num_colours), edges, unary)
    })
}

fn build_wcsp(num_vars: usize, num_colours: usize, edges: &[(u32, u32)], unary: &[Vec<i64>]) -> TableWcsp {
    let mut wcsp = TableWcsp::new(
        (0..num_vars)
            .map(|v| {
                (
                    0,
                    num_colours as i32 - 1,
                    unary[v].iter().map(|&c| Cost::new(c)).collect(),
                )
            })
            .collect(),
    );
    let clash: Vec<Vec<Cost>> = (0..num_colours)
        .map(|i| {
            (0..num_colours)
                .map(|j| if i == j { Cost::new(1) } else { Cost::MIN_COST })
                .collect()
        })
        .collect();
    for &(a, b) in edges {
        wcsp.add_binary(a, b, clash.clone());
    }
    let max_possible = unary.iter().flatten().sum::<i64>() + edges.len() as i64;
    wcsp.set_ub(Cost::new(max_possible + 1));
    wcsp
}

fn interrupt_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Sound branching and pruning: HBFS must find the same optimum as
    /// plain DFS on the same instance, regardless of how it partitions the
    /// search into open nodes.
    #[test]
    fn hbfs_agrees_with_dfs((num_vars, num_colours, edges, unary) in random_soft_colouring()) {
        let dfs_wcsp = build_wcsp(num_vars, num_colours, &edges, &unary);
        let mut dfs_solver = Solver::new(dfs_wcsp, SearchConfig::default(), interrupt_flag());
        let dfs_outcome = dfs_solver.solve().unwrap();

        let hbfs_wcsp = build_wcsp(num_vars, num_colours, &edges, &unary);
        let hbfs_config = SearchConfig::builder().hbfs_init(2).build().unwrap();
        let mut hbfs_solver = Solver::new(hbfs_wcsp, hbfs_config, interrupt_flag());
        let hbfs_outcome = hbfs_solver.solve().unwrap();

        prop_assert!(dfs_outcome.proved_optimal);
        prop_assert!(hbfs_outcome.proved_optimal);
        prop_assert_eq!(dfs_outcome.best_cost, hbfs_outcome.best_cost);
    }

    /// The Luby restart controller only ever interrupts and resumes a DFS
    /// search at the same root; it must not change the proven optimum.
    #[test]
    fn restarts_agree_with_dfs((num_vars, num_colours, edges, unary) in random_soft_colouring()) {
        let plain_wcsp = build_wcsp(num_vars, num_colours, &edges, &unary);
        let mut plain_solver = Solver::new(plain_wcsp, SearchConfig::default(), interrupt_flag());
        let plain_outcome = plain_solver.solve().unwrap();

        let restart_wcsp = build_wcsp(num_vars, num_colours, &edges, &unary);
        let restart_config = SearchConfig::builder().restart(20).build().unwrap();
        let mut restart_solver = Solver::new(restart_wcsp, restart_config, interrupt_flag());
        let restart_outcome = restart_solver.solve().unwrap();

        prop_assert!(plain_outcome.proved_optimal);
        prop_assert!(restart_outcome.proved_optimal);
        prop_assert_eq!(plain_outcome.best_cost, restart_outcome.best_cost);
    }

    /// With the complete-pass fallback enabled (`ldsMax >= 0`), LDS always
    /// proves optimality no matter how small the escalation bound — the
    /// final unbounded pass makes the search complete regardless.
    #[test]
    fn lds_with_fallback_agrees_with_dfs((num_vars, num_colours, edges, unary) in random_soft_colouring()) {
        let dfs_wcsp = build_wcsp(num_vars, num_colours, &edges, &unary);
        let mut dfs_solver = Solver::new(dfs_wcsp, SearchConfig::default(), interrupt_flag());
        let dfs_outcome = dfs_solver.solve().unwrap();

        let lds_wcsp = build_wcsp(num_vars, num_colours, &edges, &unary);
        let lds_config = SearchConfig::builder().lds(1).build().unwrap();
        let mut lds_solver = Solver::new(lds_wcsp, lds_config, interrupt_flag());
        let lds_outcome = lds_solver.solve().unwrap();

        prop_assert!(dfs_outcome.proved_optimal);
        prop_assert!(lds_outcome.proved_optimal);
        prop_assert_eq!(dfs_outcome.best_cost, lds_outcome.best_cost);
    }

    /// A problem with only soft (never-forbidding) clash costs is always
    /// feasible: a complete search must always report a solution.
    #[test]
    fn always_feasible_instance_always_solves((num_vars, num_colours, edges, unary) in random_soft_colouring()) {
        let wcsp = build_wcsp(num_vars, num_colours, &edges, &unary);
        let mut solver = Solver::new(wcsp, SearchConfig::default(), interrupt_flag());
        let outcome = solver.solve().unwrap();

        prop_assert!(outcome.proved_optimal);
        prop_assert!(outcome.best_cost.is_some());
        prop_assert!(outcome.stats.solutions >= 1);
    }
}
