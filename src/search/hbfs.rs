//! Hybrid Best-First/Depth-First Search (`spec.md` §4.3): an outer
//! best-first loop over suspended subproblems, each explored by a bounded
//! depth-first dive whose backtrack budget adapts to how much of the dive
//! was spent re-deriving state already proven once (replay) versus doing
//! fresh work.

use tracing::debug;

use crate::config::BtdMode;
use crate::cost::Cost;
use crate::error::{Result, Signal};
use crate::search::engine::Solver;
use crate::search::open_list::OpenList;
use crate::wcsp::WcspStore;

impl<W: WcspStore> Solver<W> {
    /// Whether `config.btd_mode` asks `hybrid_solve` to cooperate with the
    /// installed decomposition rather than drive the whole problem's own
    /// log/open list.
    fn btd_cooperative(&self) -> bool {
        self.tree_dec.is_some()
            && matches!(
                self.config.btd_mode,
                BtdMode::Cooperative | BtdMode::CooperativeWithRootReuse
            )
    }

    /// Swap the engine's root choice-point log and open list out for the
    /// current cluster's own, so every dive for the remainder of this call
    /// reads and writes the cluster's storage instead of the root's.
    /// Returns the cluster's `delta` shift, used to make the dive's bound
    /// computations relative to the cluster rather than the whole problem.
    fn swap_in_cluster_state(&mut self) -> Option<Cost> {
        if !self.btd_cooperative() {
            return None;
        }
        let tree_dec = self.tree_dec.as_mut()?;
        let cluster_id = tree_dec.current_cluster();
        let cluster = tree_dec.cluster_mut(cluster_id);
        std::mem::swap(&mut self.cp_log, cluster.cp_log_mut());
        std::mem::swap(&mut self.open, cluster.open_mut());
        Some(cluster.delta())
    }

    /// Undo [`Self::swap_in_cluster_state`], handing the cluster back its
    /// own (now-updated) log and open list.
    fn swap_out_cluster_state(&mut self) {
        if !self.btd_cooperative() {
            return;
        }
        if let Some(tree_dec) = self.tree_dec.as_mut() {
            let cluster_id = tree_dec.current_cluster();
            let cluster = tree_dec.cluster_mut(cluster_id);
            std::mem::swap(&mut self.cp_log, cluster.cp_log_mut());
            std::mem::swap(&mut self.open, cluster.open_mut());
        }
    }

    /// Run HBFS from the current store state down to either proving
    /// `clb == cub` or exhausting the open list. Returns the tightened
    /// `(lb, ub)` pair. `clb`/`cub` seed the very first (whole-problem, or
    /// whole-cluster under BTD cooperation) open node.
    pub fn hybrid_solve(&mut self, clb: Cost, cub: Cost) -> Result<(Cost, Cost)> {
        let mut clb = clb;
        let mut cub = cub;
        self.hbfs_limit = self.config.hbfs_init.unwrap_or(1).max(1);
        self.hbfs_disabled_for_call = false;
        self.hbfs_active = true;

        let cluster_delta = self.swap_in_cluster_state();
        // Root-cluster reuse carries the previous call's log/open list
        // forward across restarts instead of reseeding from scratch.
        let reuse_existing = cluster_delta.is_some()
            && matches!(self.config.btd_mode, BtdMode::CooperativeWithRootReuse)
            && !self.open.is_empty();
        if !reuse_existing {
            self.cp_log = crate::search::choice_point::ChoicePointLog::new();
            self.open = OpenList::new(cub);
            let start = self.cp_log.start();
            self.open.push(crate::search::open_list::OpenNode::new(clb, start, start));
        }
        let delta = cluster_delta.unwrap_or(Cost::MIN_COST);

        let outcome = self.hybrid_solve_loop(&mut clb, &mut cub, delta);
        self.hbfs_active = false;
        self.swap_out_cluster_state();
        outcome?;
        Ok((clb, cub))
    }

    fn hybrid_solve_loop(&mut self, clb: &mut Cost, cub: &mut Cost, delta: Cost) -> Result<()> {
        while *clb < *cub && !self.open.is_empty() {
            self.check_interrupt()?;

            if !self.hbfs_disabled_for_call
                && (self.cp_log.len() > self.config.hbfs_cp_limit
                    || self.open.len() > self.config.hbfs_open_node_limit)
            {
                debug!(
                    cp_log_len = self.cp_log.len(),
                    open_len = self.open.len(),
                    "HBFS resource cap exceeded, disabling suspension for the remainder of this call"
                );
                self.hbfs_disabled_for_call = true;
            }

            let node = self.open.pop().expect("open list non-empty in loop guard");
            self.store.save();
            self.cp_log.rebase();

            let dive = self
                .replay(node.first, node.last)
                .and_then(|()| {
                    self.dive_backtracks = 0;
                    let node_lb = self.wcsp.lb().max(node.cost);
                    self.recursive_solve(node_lb)
                });

            match dive {
                Ok(()) | Err(Signal::Contradiction) => {}
                Err(e) => {
                    self.store.restore_one();
                    return Err(e);
                }
            }
            self.store.restore_one();

            *cub = self.wcsp.ub();
            self.open.update_ub(*cub);
            self.open.record_closed(node.cost);
            *clb = (*clb).max(self.open.lb(delta)).max(self.open.closed_nodes_lb());

            self.adapt_hbfs_limit();
        }
        Ok(())
    }

    /// `spec.md` §4.3's adaptive budget: `ρ = recomputationNodes / nodes`;
    /// double the budget when `ρ > 1/β` (too much replay overhead, dives
    /// ending too soon), halve it (floored at 1) when `ρ < 1/α` (dives
    /// running long relative to replay cost).
    fn adapt_hbfs_limit(&mut self) {
        if self.stats.nodes_visited == 0 {
            return;
        }
        let rho = self.stats.recomputation_ratio();
        if rho > 1.0 / self.config.hbfs_beta as f64 {
            self.hbfs_limit = self.hbfs_limit.saturating_mul(2);
        } else if rho < 1.0 / self.config.hbfs_alpha as f64 {
            self.hbfs_limit = (self.hbfs_limit / 2).max(1);
        }
    }
}
