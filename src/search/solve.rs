//! Top-level orchestration (`spec.md` §2 component 9): preprocessing, the
//! LDS escalation schedule, the Luby-sequence restart controller, and the
//! public `solve` entry point that ties them together.

use tracing::info;

use crate::cost::Cost;
use crate::error::{Error, Result, Signal};
use crate::search::engine::Solver;
use crate::search::heuristics::{LubyRestartPolicy, NoRestartPolicy, RestartPolicy};
use crate::search::stats::SearchStats;
use crate::wcsp::WcspStore;

/// The result of a completed `solve` call.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// The best cost found, if any. `None` means the problem is infeasible.
    pub best_cost: Option<Cost>,
    /// Whether `best_cost` is proven optimal (a complete search finished)
    /// as opposed to a best-effort result cut short by `all_solutions`,
    /// LDS with the complete-pass fallback disabled, or interruption.
    pub proved_optimal: bool,
    pub interrupted: bool,
    pub stats: SearchStats,
}

impl<W: WcspStore> Solver<W> {
    /// Preprocessing (`spec.md` §4.8, if enabled) plus the initial
    /// propagation pass. Returns `Ok(false)` if this proves the problem
    /// infeasible outright.
    fn begin_solve(&mut self) -> Result<bool> {
        if self.wcsp.propagate(&mut self.store).is_err() {
            return Ok(false);
        }
        if self.config.singleton_consistency {
            match self.singleton_consistency() {
                Ok(()) => {}
                Err(Signal::Contradiction) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Sweep every unassigned variable's domain, tentatively assigning
    /// each value and propagating; values that immediately contradict are
    /// permanently removed. Repeats to a fixpoint, since removing a dead
    /// value can make a previously-consistent value elsewhere dead too
    /// (`spec.md` §4.8).
    fn singleton_consistency(&mut self) -> Result<()> {
        loop {
            let mut changed = false;
            for var in 0..self.wcsp.number_of_variables() as crate::cost::VariableId {
                if self.wcsp.assigned(var) {
                    continue;
                }
                let domain = self.wcsp.enum_domain(var);
                let mut dead = Vec::new();
                for value in domain {
                    self.check_interrupt()?;
                    self.store.save();
                    let probe = self
                        .wcsp
                        .assign(&mut self.store, var, value)
                        .and_then(|_| self.wcsp.propagate(&mut self.store));
                    self.store.restore_one();
                    if probe.is_err() {
                        dead.push(value);
                    }
                }
                for value in dead {
                    if self.wcsp.canbe(var, value) {
                        self.wcsp.remove(&mut self.store, var, value)?;
                        changed = true;
                    }
                }
                if !self.wcsp.assigned(var) {
                    self.wcsp.propagate(&mut self.store)?;
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// The Luby-sequence restart controller (`spec.md` §4.7): run the
    /// configured driver (HBFS or plain DFS) under successively longer
    /// backtrack budgets, catching `NbBacktracksOut` and restoring to the
    /// pre-search checkpoint between attempts. Always proves completeness
    /// once it returns `Ok`: a restart attempt only stops early via
    /// `NbBacktracksOut`, handled here, or an error propagated to the caller.
    fn solve_with_restarts(&mut self) -> Result<bool> {
        let mut policy: Box<dyn RestartPolicy> = if self.config.restart.is_some() {
            Box::new(LubyRestartPolicy::new(1))
        } else {
            Box::new(NoRestartPolicy)
        };
        self.restart_on_solution = self.config.restart.is_some();
        self.restart_limit = if self.config.restart.is_some() {
            1
        } else {
            u64::MAX
        };
        let base_depth = self.store.depth();

        loop {
            let ub_before = self.wcsp.ub();
            let lb = self.wcsp.lb();
            let ub = self.wcsp.ub();
            let result = if self.config.hbfs_enabled() {
                self.hybrid_solve(lb, ub).map(|_| ())
            } else {
                self.recursive_solve(lb)
            };

            match result {
                Ok(()) => return Ok(true),
                Err(Signal::NbBacktracksOut) => {
                    self.stats.restarts += 1;
                    self.store.restore(base_depth);
                    let ub_improved = self.wcsp.ub() < ub_before;
                    self.restart_limit = policy.next_limit(&self.stats, ub_improved);
                    if let Some(threshold) = self.config.restart {
                        if self.stats.nodes_visited > threshold {
                            self.restart_limit = u64::MAX;
                        }
                    }
                    info!(
                        restarts = self.stats.restarts,
                        next_limit = self.restart_limit,
                        "restarting"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// LDS escalation (`spec.md` §4.7): re-run `recursive_solve_lds` with
    /// an increasing discrepancy bound until a pass completes without
    /// truncation or the bound exceeds `|ldsMax|`, at which point a final
    /// unlimited pass runs unless `ldsMax` was negative. Returns `Ok(false)`
    /// when the bound is exhausted with the fallback disabled: `best_cost`
    /// may still hold the best solution seen, but completeness was never
    /// established.
    fn solve_with_lds(&mut self) -> Result<bool> {
        let lds_max = self.config.lds.expect("lds_enabled implies lds is Some");
        let bound = lds_max.unsigned_abs() as i32;
        let allow_fallback = lds_max >= 0;
        let base_depth = self.store.depth();
        let mut discrepancy = 0i32;

        loop {
            self.check_interrupt()?;
            self.in_lds_pass = true;
            self.lds_limited = false;
            let lb = self.wcsp.lb();
            let ub = self.wcsp.ub();
            let result = self.recursive_solve_lds(lb, discrepancy);
            self.store.restore(base_depth);
            self.in_lds_pass = false;

            match result {
                Ok(()) => {
                    if !self.lds_limited {
                        return Ok(true);
                    }
                }
                Err(Signal::Contradiction) => {}
                Err(e) => return Err(e),
            }

            if discrepancy >= bound {
                return if allow_fallback {
                    let complete = if self.config.hbfs_enabled() {
                        self.hybrid_solve(lb, ub).map(|_| ())
                    } else {
                        self.recursive_solve(lb)
                    };
                    complete.map(|()| true)
                } else {
                    Ok(false)
                };
            }
            discrepancy += 1;
        }
    }

    /// Run preprocessing, then the configured search mode (LDS or restarts
    /// — restarts and LDS are not combined in this engine, matching the
    /// CLI surface: `lds` and `restart` address different instabilities
    /// and are typically not both set), and report the outcome.
    pub fn solve(&mut self) -> std::result::Result<SolveOutcome, Error> {
        match self.begin_solve() {
            Ok(true) => {}
            Ok(false) => {
                return Ok(SolveOutcome {
                    best_cost: None,
                    proved_optimal: true,
                    interrupted: false,
                    stats: self.stats,
                });
            }
            Err(Signal::TimeOut) => {
                return Ok(SolveOutcome {
                    best_cost: None,
                    proved_optimal: false,
                    interrupted: true,
                    stats: self.stats,
                });
            }
            Err(e) => return Err(Error::Signal(e)),
        }

        let outcome = if self.config.lds_enabled() {
            self.solve_with_lds()
        } else {
            self.solve_with_restarts()
        };

        match outcome {
            Ok(proved) => {
                let best = if self.stats.solutions > 0 {
                    Some(self.wcsp.ub())
                } else {
                    None
                };
                Ok(SolveOutcome {
                    best_cost: best,
                    proved_optimal: proved,
                    interrupted: false,
                    stats: self.stats,
                })
            }
            Err(Signal::TimeOut) => Ok(SolveOutcome {
                best_cost: (self.stats.solutions > 0).then(|| self.wcsp.ub()),
                proved_optimal: false,
                interrupted: true,
                stats: self.stats,
            }),
            Err(Signal::NbSolutionsOut) => Ok(SolveOutcome {
                best_cost: (self.stats.solutions > 0).then(|| self.wcsp.ub()),
                proved_optimal: false,
                interrupted: false,
                stats: self.stats,
            }),
            Err(e) => Err(Error::Signal(e)),
        }
    }
}
