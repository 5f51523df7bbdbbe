//! [`Solver`]: the engine's shared state and its two entry-point recursions,
//! `recursive_solve` and `recursive_solve_lds` (`spec.md` §4.5).

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::config::SearchConfig;
use crate::cost::{Cost, Value, VariableId};
use crate::error::{Result, Signal};
use crate::search::choice_point::ChoicePointLog;
use crate::search::heuristics::{
    LastConflict, MinDomainMaxDegree, MinDomainMaxWeightedDegree, StaticOrder,
    VariableOrderingHeuristic,
};
use crate::search::open_list::OpenList;
use crate::search::stats::SearchStats;
use crate::search::tree_dec::TreeDecomposition;
use crate::search::unassigned::UnassignedList;
use crate::store::Store;
use crate::wcsp::{AssignListener, WcspStore};

/// Notified whenever `recursive_solve`/`recursive_solve_lds` completes a
/// variable assignment — i.e. finds a solution (`spec.md` §4.5).
///
/// A no-op by default. A front-end wanting SCP's "find the next distinct
/// sequence" escape (`Signal::FindNewSequence`) or some other
/// enumeration-time behavior installs one of these rather than the engine
/// hardcoding that front-end's protocol.
pub trait SolutionObserver<W: WcspStore> {
    fn on_solution(&mut self, wcsp: &W, stats: &SearchStats) -> Result<()>;
}

/// The default observer: does nothing.
pub struct NoopObserver;

impl<W: WcspStore> SolutionObserver<W> for NoopObserver {
    fn on_solution(&mut self, _wcsp: &W, _stats: &SearchStats) -> Result<()> {
        Ok(())
    }
}

/// Forwards assignments observed by the constraint store into the engine's
/// unassigned-variable list (`spec.md` §4.4).
pub(crate) struct UnassignedListener {
    pub(crate) list: Rc<UnassignedList>,
}

impl AssignListener for UnassignedListener {
    fn on_assign(&self, store: &mut Store, var: VariableId, _value: Value) {
        self.list.erase(store, var);
    }
}

/// The tree-search engine. Generic over the constraint store it drives;
/// owns every other piece of mutable search state named in `spec.md` §2.
pub struct Solver<W: WcspStore> {
    pub(crate) wcsp: W,
    pub(crate) store: Store,
    pub(crate) config: SearchConfig,
    pub(crate) unassigned: Rc<UnassignedList>,
    pub(crate) heuristic: Box<dyn VariableOrderingHeuristic<W>>,
    pub(crate) last_conflict: Option<Rc<LastConflict<W>>>,
    pub(crate) observer: Box<dyn SolutionObserver<W>>,
    pub(crate) cp_log: ChoicePointLog,
    pub(crate) open: OpenList,
    pub(crate) stats: SearchStats,
    pub(crate) interrupted: Arc<AtomicBool>,

    /// HBFS's current per-dive backtrack budget (`spec.md` §4.3's `B`).
    pub(crate) hbfs_limit: u64,
    /// Backtracks taken during the current dive, reset at the start of
    /// each `hybrid_solve` iteration.
    pub(crate) dive_backtracks: u64,
    /// Whether this call's cp-log/open-list resource caps were exceeded;
    /// once set, branching never suspends for the remainder of the call.
    pub(crate) hbfs_disabled_for_call: bool,
    /// Whether HBFS logging/suspension is active for the branch currently
    /// executing (`hybrid_solve` sets this for the duration of each dive;
    /// the plain DFS driver leaves it false).
    pub(crate) hbfs_active: bool,

    /// The backtrack ceiling the restart controller has set for the
    /// current attempt (`spec.md`'s `nbBacktracksLimit`); `u64::MAX` when
    /// restarts are disabled.
    pub(crate) restart_limit: u64,
    /// Whether a solution found right now should unwind to the restart
    /// controller (only set while a plain-DFS-with-restarts attempt, not
    /// an HBFS dive or an LDS pass, is in progress).
    pub(crate) restart_on_solution: bool,
    /// Whether an LDS pass is in progress (`recursive_solve_lds`).
    pub(crate) in_lds_pass: bool,
    /// Set by an LDS pass that truncated at least one against-heuristic
    /// branch because its discrepancy budget was exhausted.
    pub(crate) lds_limited: bool,

    /// The index of the first non-decision variable, or `0` if every
    /// variable is a decision variable. Variables at or past this index
    /// are never offered to the variable-ordering heuristic.
    pub(crate) nb_decision_vars: usize,

    /// The tree decomposition `hybrid_solve` cooperates with when
    /// `config.btd_mode` is `Cooperative`/`CooperativeWithRootReuse`
    /// (`spec.md` §4.3/§6). `None` outside BTD; building one is an external
    /// collaborator's job, not this crate's.
    pub(crate) tree_dec: Option<Box<dyn TreeDecomposition>>,
}

impl<W: WcspStore> Solver<W> {
    /// Build a solver over `wcsp`, composing the variable-ordering
    /// heuristic chain from `config` (`spec.md` §4.1: weighted-degree vs.
    /// plain min-domain/max-degree, optionally wrapped in last-conflict).
    pub fn new(mut wcsp: W, config: SearchConfig, interrupted: Arc<AtomicBool>) -> Self {
        let n = wcsp.number_of_variables();
        let mut order: Vec<VariableId> = (0..n as VariableId).collect();
        order.sort_by_key(|&v| wcsp.dac_order(v));
        let unassigned = Rc::new(UnassignedList::new(&order));
        wcsp.set_assign_listener(Rc::new(UnassignedListener {
            list: Rc::clone(&unassigned),
        }));

        let base: Box<dyn VariableOrderingHeuristic<W>> = if config.static_variable_ordering {
            Box::new(StaticOrder)
        } else if config.weighted_degree {
            Box::new(MinDomainMaxWeightedDegree)
        } else {
            Box::new(MinDomainMaxDegree)
        };

        let (heuristic, last_conflict) = if config.last_conflict && !config.static_variable_ordering {
            let lc = Rc::new(LastConflict::new(base));
            let boxed: Box<dyn VariableOrderingHeuristic<W>> = Box::new(Rc::clone(&lc));
            (boxed, Some(lc))
        } else {
            (base, None)
        };

        let ub = wcsp.ub();
        Self {
            wcsp,
            store: Store::new(),
            config,
            unassigned,
            heuristic,
            last_conflict,
            observer: Box::new(NoopObserver),
            cp_log: ChoicePointLog::new(),
            open: OpenList::new(ub),
            stats: SearchStats::new(),
            interrupted,
            hbfs_limit: u64::MAX,
            dive_backtracks: 0,
            hbfs_disabled_for_call: false,
            hbfs_active: false,
            restart_limit: u64::MAX,
            restart_on_solution: false,
            in_lds_pass: false,
            lds_limited: false,
            nb_decision_vars: 0,
            tree_dec: None,
        }
    }

    /// Install a solution observer, replacing the default no-op.
    pub fn set_observer(&mut self, observer: Box<dyn SolutionObserver<W>>) {
        self.observer = observer;
    }

    /// Install the tree decomposition `hybrid_solve` should cooperate with.
    /// Only consulted when `config().btd_mode` is `Cooperative` or
    /// `CooperativeWithRootReuse`; a plain `Disabled`/`ComponentsOnly` run
    /// never touches it even if one is installed.
    pub fn set_tree_decomposition(&mut self, tree_dec: Box<dyn TreeDecomposition>) {
        self.tree_dec = Some(tree_dec);
    }

    /// Restrict variable selection to `0..count`, leaving variables past
    /// it permanently unoffered to the heuristic (auxiliary variables some
    /// front-ends add but never branch on). `0` (the default) means every
    /// variable is a decision variable.
    pub fn set_nb_decision_vars(&mut self, count: usize) {
        self.nb_decision_vars = count;
    }

    pub fn wcsp(&self) -> &W {
        &self.wcsp
    }

    pub fn wcsp_mut(&mut self) -> &mut W {
        &mut self.wcsp
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Raise [`Signal::TimeOut`] if the cooperative interrupt flag is set.
    /// Checked at the entry of every choice point (`spec.md` §7).
    pub(crate) fn check_interrupt(&self) -> Result<()> {
        if self.interrupted.load(Ordering::Relaxed) {
            Err(Signal::TimeOut)
        } else {
            Ok(())
        }
    }

    fn candidate_variables(&self) -> Vec<VariableId> {
        self.unassigned
            .iter()
            .filter(|&v| self.nb_decision_vars == 0 || (v as usize) < self.nb_decision_vars)
            .collect()
    }

    pub(crate) fn select_variable(&self) -> Option<VariableId> {
        let candidates = self.candidate_variables();
        self.heuristic.select(&self.wcsp, &candidates)
    }

    /// The branching value: the previous best solution's value for this
    /// variable if still in-domain, else the EAC support value
    /// (`spec.md` §3's `getBestValue` reuse).
    pub(crate) fn select_value(&self, var: VariableId) -> Value {
        match self.wcsp.best_value(var) {
            Some(value) if self.wcsp.canbe(var, value) => value,
            _ => self.wcsp.support(var),
        }
    }

    /// The recursive depth-first search core (`spec.md` §4.5): pick a
    /// variable, branch on it, or — if every decision variable is
    /// assigned — record the solution just found.
    pub fn recursive_solve(&mut self, lb: Cost) -> Result<()> {
        self.check_interrupt()?;
        match self.select_variable() {
            Some(var) => {
                let value = self.select_value(var);
                trace!(var, value, ?lb, "branching");
                self.branch(var, value, lb)
            }
            None => self.handle_solution(lb),
        }
    }

    /// The LDS-bounded counterpart of [`Self::recursive_solve`]
    /// (`spec.md` §4.7): the conventional (heuristic-following) branch
    /// never costs a discrepancy; the against-heuristic branch costs one
    /// and is skipped entirely once the budget is spent.
    pub fn recursive_solve_lds(&mut self, lb: Cost, discrepancy: i32) -> Result<()> {
        self.check_interrupt()?;
        match self.select_variable() {
            Some(var) => {
                let value = self.select_value(var);
                self.binary_choice_point_lds(var, value, lb, discrepancy)
            }
            None => self.handle_solution(lb),
        }
    }

    /// Dispatch to the configured branching policy (`spec.md` §4.2).
    fn branch(&mut self, var: VariableId, value: Value, lb: Cost) -> Result<()> {
        if let Some(mode) = self.config.dichotomic_branching {
            if self.wcsp.domain_size(var) >= self.config.dichotomic_branching_size {
                return self.dichotomic_choice_point(var, value, mode, lb);
            }
        }
        if self.config.binary_branching {
            self.binary_choice_point(var, value, lb)
        } else {
            self.n_ary_sorted_choice_point(var)
        }
    }

    /// Record a complete assignment (`spec.md` §4.5): persist best values
    /// for value-ordering reuse, tighten the bound or count the solution,
    /// notify the observer, and raise whichever typed signal the caller's
    /// mode demands.
    pub(crate) fn handle_solution(&mut self, lb: Cost) -> Result<()> {
        self.stats.solutions += 1;
        for var in 0..self.wcsp.number_of_variables() as VariableId {
            let value = self.wcsp.inf(var);
            self.wcsp.set_best_value(var, value);
        }

        if let Some(cap) = self.config.all_solutions {
            if self.stats.solutions >= cap {
                return Err(Signal::NbSolutionsOut);
            }
        } else {
            self.wcsp.update_ub(lb);
        }

        self.observer.on_solution(&self.wcsp, &self.stats)?;

        if self.restart_on_solution && !self.in_lds_pass {
            return Err(Signal::NbBacktracksOut);
        }
        Ok(())
    }
}
