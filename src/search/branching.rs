//! Branching policies (`spec.md` §4.2): inherent methods on [`Solver`]
//! rather than a trait-object family, since they all operate on the same
//! shared mutable search state (the store, the choice-point log, the open
//! list) and are never swapped independently of the engine instance they
//! are embedded in — unlike the variable-ordering heuristics, which
//! genuinely are swapped independently and so stay trait objects.

use crate::cost::{Cost, Value, VariableId};
use crate::error::{Result, Signal};
use crate::search::choice_point::{ChoicePoint, Operation};
use crate::search::engine::Solver;
use crate::search::open_list::OpenNode;
use crate::config::DichotomicMode;
use crate::wcsp::WcspStore;

impl<W: WcspStore> Solver<W> {
    pub(crate) fn apply_op(&mut self, op: Operation, var: VariableId, value: Value) -> Result<()> {
        match op {
            Operation::Assign => self.wcsp.assign(&mut self.store, var, value),
            Operation::Remove => self.wcsp.remove(&mut self.store, var, value),
            Operation::Increase => self.wcsp.increase(&mut self.store, var, value),
            Operation::Decrease => self.wcsp.decrease(&mut self.store, var, value),
            Operation::RangeRemoval => self.wcsp.remove(&mut self.store, var, value),
        }
    }

    /// Whether HBFS should suspend the current dive rather than continue
    /// exploring the complementary branch (`spec.md` §4.3's per-dive
    /// backtrack budget `B`).
    pub(crate) fn hbfs_suspend_now(&self) -> bool {
        self.hbfs_active && !self.hbfs_disabled_for_call && self.dive_backtracks >= self.hbfs_limit
    }

    /// Anchor an open node at the current choice-point log position,
    /// covering the active slice `[cp_log.start(), cp_log.index())`
    /// (`spec.md`'s `addOpenNode`).
    pub(crate) fn add_open_node(&mut self, lb: Cost) {
        let first = self.cp_log.start();
        let last = self.cp_log.index();
        self.cp_log.raise_stop(last);
        self.open.push(OpenNode::new(lb, first, last));
    }

    fn log_choice_point(
        &mut self,
        op: Operation,
        var: VariableId,
        value: Value,
        reverse: bool,
    ) -> Option<usize> {
        if self.hbfs_active {
            Some(self.cp_log.push(ChoicePoint::new(op, var, value, reverse)))
        } else {
            None
        }
    }

    /// Shared bookkeeping after a branch's first (left) attempt fails or
    /// succeeds: restore the checkpoint, re-enforce the bound, count the
    /// backtrack, and check the restart budget (`spec.md` §4.2 step 4,
    /// §4.7).
    fn after_first_branch(&mut self, var: VariableId, first_failed: bool) -> Result<()> {
        self.store.restore_one();
        self.wcsp.enforce_ub()?;
        if first_failed {
            self.stats.backtracks += 1;
            self.dive_backtracks += 1;
            if let Some(lc) = &self.last_conflict {
                lc.record_conflict(var);
            }
            if self.stats.backtracks > self.restart_limit {
                return Err(Signal::NbBacktracksOut);
            }
        }
        Ok(())
    }

    /// The standard two-way choice point: `assign(var, value)` then, on
    /// failure, `remove(var, value)` (`spec.md` §4.2).
    ///
    /// Cooperates with HBFS (`spec.md` §4.3 step 6): once the per-dive
    /// backtrack budget is spent, the complementary branch is logged but
    /// not explored — instead it is anchored as a new open node and
    /// control returns to the HBFS driver.
    pub fn binary_choice_point(&mut self, var: VariableId, value: Value, lb: Cost) -> Result<()> {
        self.check_interrupt()?;
        self.stats.nodes_visited += 1;
        self.store.save();
        let left_log_pos = self.log_choice_point(Operation::Assign, var, value, false);

        let left = self
            .wcsp
            .assign(&mut self.store, var, value)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve(lb)
            });

        let failed = match left {
            Ok(()) => false,
            Err(Signal::Contradiction) => true,
            Err(e) => return Err(e),
        };
        self.after_first_branch(var, failed)?;
        if let Some(pos) = left_log_pos {
            self.cp_log.rewind(pos);
        }

        if self.hbfs_suspend_now() {
            self.log_choice_point(Operation::Remove, var, value, true);
            self.add_open_node(lb);
            return Ok(());
        }

        self.store.save();
        self.log_choice_point(Operation::Remove, var, value, true);
        let right = self
            .wcsp
            .remove(&mut self.store, var, value)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve(lb)
            });
        match right {
            Ok(()) => {
                self.store.restore_one();
                Ok(())
            }
            Err(Signal::Contradiction) => {
                self.store.restore_one();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// The LDS counterpart of [`Self::binary_choice_point`]: the
    /// conventional (assign) branch is always explored; the
    /// against-heuristic (remove) branch costs one discrepancy and is
    /// skipped once the budget is exhausted, setting `lds_limited`
    /// (`spec.md` §4.7).
    pub fn binary_choice_point_lds(
        &mut self,
        var: VariableId,
        value: Value,
        lb: Cost,
        discrepancy: i32,
    ) -> Result<()> {
        self.check_interrupt()?;
        self.stats.nodes_visited += 1;
        self.store.save();

        let left = self
            .wcsp
            .assign(&mut self.store, var, value)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve_lds(lb, discrepancy)
            });
        let failed = match left {
            Ok(()) => false,
            Err(Signal::Contradiction) => true,
            Err(e) => return Err(e),
        };
        self.after_first_branch(var, failed)?;

        if discrepancy <= 0 {
            self.lds_limited = true;
            return Ok(());
        }

        self.store.save();
        let right = self
            .wcsp
            .remove(&mut self.store, var, value)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve_lds(lb, discrepancy - 1)
            });
        match right {
            Ok(()) => {
                self.store.restore_one();
                Ok(())
            }
            Err(Signal::Contradiction) => {
                self.store.restore_one();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// A two-way split driven by an explicit pair of operations, shared by
    /// [`Self::dichotomic_choice_point`]'s midpoint modes and
    /// [`Self::scp_choice_point`].
    fn two_way_op_choice_point(
        &mut self,
        var: VariableId,
        lb: Cost,
        op_a: Operation,
        val_a: Value,
        op_b: Operation,
        val_b: Value,
    ) -> Result<()> {
        self.check_interrupt()?;
        self.stats.nodes_visited += 1;
        self.store.save();
        let first_log_pos = self.log_choice_point(op_a, var, val_a, false);

        let first = self
            .apply_op(op_a, var, val_a)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve(lb)
            });
        let failed = match first {
            Ok(()) => false,
            Err(Signal::Contradiction) => true,
            Err(e) => return Err(e),
        };
        self.after_first_branch(var, failed)?;
        if let Some(pos) = first_log_pos {
            self.cp_log.rewind(pos);
        }

        if self.hbfs_suspend_now() {
            self.log_choice_point(op_b, var, val_b, true);
            self.add_open_node(lb);
            return Ok(());
        }

        self.store.save();
        self.log_choice_point(op_b, var, val_b, true);
        let second = self
            .apply_op(op_b, var, val_b)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve(lb)
            });
        match second {
            Ok(()) => {
                self.store.restore_one();
                Ok(())
            }
            Err(Signal::Contradiction) => {
                self.store.restore_one();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Split the domain in half and branch on each half (`spec.md` §4.2,
    /// modes 0 and 1). Mode 2 (sorted-by-cost) removes the discarded half
    /// value by value rather than in one `RangeRemoval` log entry — a
    /// simplification recorded in `DESIGN.md`.
    pub fn dichotomic_choice_point(
        &mut self,
        var: VariableId,
        value: Value,
        mode: DichotomicMode,
        lb: Cost,
    ) -> Result<()> {
        match mode {
            DichotomicMode::Midpoint | DichotomicMode::MidpointFixedOrder => {
                let inf = self.wcsp.inf(var);
                let sup = self.wcsp.sup(var);
                let mid = inf + (sup - inf) / 2;
                let decrease_first = match mode {
                    DichotomicMode::Midpoint => value <= mid,
                    DichotomicMode::MidpointFixedOrder => true,
                    DichotomicMode::SortedByCost => unreachable!(),
                };
                if decrease_first {
                    self.two_way_op_choice_point(
                        var,
                        lb,
                        Operation::Decrease,
                        mid,
                        Operation::Increase,
                        mid + 1,
                    )
                } else {
                    self.two_way_op_choice_point(
                        var,
                        lb,
                        Operation::Increase,
                        mid + 1,
                        Operation::Decrease,
                        mid,
                    )
                }
            }
            DichotomicMode::SortedByCost => self.sorted_cost_dichotomic_choice_point(var, lb),
        }
    }

    /// Mode 2: split the domain, sorted by unary cost, into a lower-cost
    /// half (explored first) and the remaining half.
    fn sorted_cost_dichotomic_choice_point(&mut self, var: VariableId, lb: Cost) -> Result<()> {
        self.check_interrupt()?;
        self.stats.nodes_visited += 1;

        let mut domain = self.wcsp.enum_domain_and_cost(var);
        domain.sort_by_key(|&(_, cost)| cost);
        let half = (domain.len() + 1) / 2;
        let keep: Vec<Value> = domain[..half].iter().map(|&(v, _)| v).collect();
        let drop: Vec<Value> = domain[half..].iter().map(|&(v, _)| v).collect();

        self.store.save();
        let mut first_log_pos = None;
        for &value in &drop {
            let pos = self.log_choice_point(Operation::Remove, var, value, false);
            first_log_pos = first_log_pos.or(pos);
        }
        let first = self
            .remove_each(var, &drop)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve(lb)
            });
        let failed = match first {
            Ok(()) => false,
            Err(Signal::Contradiction) => true,
            Err(e) => return Err(e),
        };
        self.after_first_branch(var, failed)?;
        if let Some(pos) = first_log_pos {
            self.cp_log.rewind(pos);
        }

        if self.hbfs_suspend_now() {
            for &value in &keep {
                self.log_choice_point(Operation::Remove, var, value, true);
            }
            self.add_open_node(lb);
            return Ok(());
        }

        self.store.save();
        for &value in &keep {
            self.log_choice_point(Operation::Remove, var, value, true);
        }
        let second = self
            .remove_each(var, &keep)
            .and_then(|_| self.wcsp.propagate(&mut self.store))
            .and_then(|_| {
                let lb = self.wcsp.lb();
                self.recursive_solve(lb)
            });
        match second {
            Ok(()) => {
                self.store.restore_one();
                Ok(())
            }
            Err(Signal::Contradiction) => {
                self.store.restore_one();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn remove_each(&mut self, var: VariableId, values: &[Value]) -> Result<()> {
        for &value in values {
            self.wcsp.remove(&mut self.store, var, value)?;
        }
        Ok(())
    }

    /// A single value at a time, in increasing unary-cost order, until the
    /// domain empties or the bound closes (`spec.md` §4.2). Does not
    /// cooperate with HBFS suspension: unlike the two-way policies, there
    /// is no single complementary branch to anchor as one open node, so
    /// this policy is only meaningful under plain DFS.
    pub fn n_ary_sorted_choice_point(&mut self, var: VariableId) -> Result<()> {
        let mut domain = self.wcsp.enum_domain_and_cost(var);
        domain.sort_by_key(|&(_, cost)| cost);

        for (value, _) in domain {
            self.check_interrupt()?;
            if self.wcsp.lb() >= self.wcsp.ub() {
                break;
            }
            self.stats.nodes_visited += 1;
            self.store.save();
            let attempt = self
                .wcsp
                .assign(&mut self.store, var, value)
                .and_then(|_| self.wcsp.propagate(&mut self.store))
                .and_then(|_| {
                    let lb = self.wcsp.lb();
                    self.recursive_solve(lb)
                });
            self.store.restore_one();
            match attempt {
                Ok(()) => {}
                Err(Signal::Contradiction) => {
                    self.wcsp.enforce_ub()?;
                    self.stats.backtracks += 1;
                    if let Some(lc) = &self.last_conflict {
                        lc.record_conflict(var);
                    }
                    if self.stats.backtracks > self.restart_limit {
                        return Err(Signal::NbBacktracksOut);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// SCP's three-region split around a chosen value (`spec.md` §4.2):
    /// when the value has room on one side of its variable's current
    /// interval, the first branch crosses that boundary (retaining the
    /// other side for the complementary branch); with room on neither
    /// side the domain is already a singleton-adjacent pair and this
    /// degenerates to [`Self::binary_choice_point`].
    pub fn scp_choice_point(&mut self, var: VariableId, value: Value, lb: Cost) -> Result<()> {
        let lo = self.wcsp.inf(var);
        let hi = self.wcsp.sup(var);
        if value > lo {
            self.two_way_op_choice_point(
                var,
                lb,
                Operation::Increase,
                value,
                Operation::Decrease,
                value - 1,
            )
        } else if value < hi {
            self.two_way_op_choice_point(
                var,
                lb,
                Operation::Decrease,
                value,
                Operation::Increase,
                value + 1,
            )
        } else {
            self.binary_choice_point(var, value, lb)
        }
    }
}
