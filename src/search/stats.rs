//! Search statistics: the running counters the engine keeps on itself (per
//! the "Global mutable options" design note, these are the only mutable
//! state left outside [`crate::config::SearchConfig`]) and a
//! `prettytable`-rendered human summary, mirroring the teacher's
//! `stats::render_stats_table`.

use prettytable::{Cell, Row, Table};

use crate::cost::Cost;

/// Running counters for one `solve` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchStats {
    pub nodes_visited: u64,
    pub backtracks: u64,
    /// Nodes re-visited while replaying an open node's choice-point slice;
    /// drives HBFS's adaptive backtrack-budget adjustment.
    pub recomputation_nodes: u64,
    pub restarts: u64,
    pub solutions: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fraction of total nodes that were re-derived by replay rather
    /// than freshly explored; the quantity HBFS's budget controller reacts
    /// to (`spec.md` §4.3).
    pub fn recomputation_ratio(&self) -> f64 {
        if self.nodes_visited == 0 {
            0.0
        } else {
            self.recomputation_nodes as f64 / self.nodes_visited as f64
        }
    }
}

/// Render a one-row human summary of a finished search, alongside the
/// final bound it reported.
pub fn render_stats_table(stats: &SearchStats, final_cost: Cost) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Cost"),
        Cell::new("Nodes"),
        Cell::new("Backtracks"),
        Cell::new("Recomputations"),
        Cell::new("Restarts"),
        Cell::new("Solutions"),
    ]));
    table.add_row(Row::new(vec![
        Cell::new(&final_cost.to_string()),
        Cell::new(&stats.nodes_visited.to_string()),
        Cell::new(&stats.backtracks.to_string()),
        Cell::new(&stats.recomputation_nodes.to_string()),
        Cell::new(&stats.restarts.to_string()),
        Cell::new(&stats.solutions.to_string()),
    ]));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputation_ratio_is_zero_before_any_nodes() {
        let stats = SearchStats::new();
        assert_eq!(stats.recomputation_ratio(), 0.0);
    }

    #[test]
    fn recomputation_ratio_divides_recomputed_by_visited() {
        let stats = SearchStats {
            nodes_visited: 100,
            recomputation_nodes: 25,
            ..Default::default()
        };
        assert_eq!(stats.recomputation_ratio(), 0.25);
    }

    #[test]
    fn render_includes_the_final_cost() {
        let stats = SearchStats::new();
        let rendered = render_stats_table(&stats, Cost::new(42));
        assert!(rendered.contains("42"));
    }
}
