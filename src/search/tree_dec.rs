//! Tree-decomposition (BTD) cooperation boundary (`spec.md` §1, §6).
//!
//! Building a tree decomposition and driving per-cluster recursion are
//! explicitly out of scope for this crate (`spec.md` §1 Non-goals: "the
//! tree-decomposition builder ... remain external collaborators"). This
//! module defines the cooperation interface [`super::hbfs::Solver::hybrid_solve`]
//! calls into when BTD is active (`crate::config::BtdMode::Cooperative` or
//! `CooperativeWithRootReuse`): it swaps its own choice-point log and open
//! list out for the current cluster's for the duration of a dive, so every
//! existing branching/HBFS code path runs unmodified against whichever
//! storage is live. `SearchConfig::btd_mode` stays at
//! [`crate::config::BtdMode::Disabled`] in every test and demo this crate
//! ships — an actual decomposition builder remains an external collaborator.
//!
//! `dyn`-safe by construction: [`TreeDecomposition::cluster`]/`cluster_mut`
//! return trait objects rather than an associated `Cluster` type, so a
//! [`Solver`](super::engine::Solver) can hold `Box<dyn TreeDecomposition>`
//! without committing to one concrete decomposition type.

use crate::cost::{Cost, VariableId};
use crate::search::choice_point::ChoicePointLog;
use crate::search::open_list::OpenList;

/// A single cluster of a tree decomposition, as the search core would
/// consume it during BTD-cooperative HBFS (`spec.md` §6's per-cluster
/// `cp`, `open`, `hbfsLimit`, `delta`, ... list).
pub trait ClusterContext {
    /// This cluster's local backtrack-budget counter, independent of the
    /// global one (`spec.md`'s `cluster->hbfsLimit`).
    fn hbfs_limit(&self) -> u64;
    fn set_hbfs_limit(&mut self, limit: u64);

    /// The constant shift applied to this cluster's reported costs so a
    /// node's absolute cost and its cost relative to the cluster agree
    /// (`spec.md`'s `getCurrentDelta`).
    fn delta(&self) -> Cost;

    fn set_lb(&mut self, lb: Cost);
    fn set_ub(&mut self, ub: Cost);

    /// The lower bound already proven for this cluster's recursive
    /// subproblem (`spec.md`'s `getLbRec`).
    fn lb_rec(&self) -> Cost;

    /// The number of variables owned by this cluster (an empty root
    /// cluster is not counted toward `nbHybrid` in `hybrid_solve`).
    fn nb_vars(&self) -> usize;

    fn owns_variable(&self, var: VariableId) -> bool;

    /// This cluster's own choice-point log, swapped in for the engine's
    /// root log for the duration of a dive.
    fn cp_log_mut(&mut self) -> &mut ChoicePointLog;

    /// This cluster's own open-node list, swapped in alongside
    /// [`Self::cp_log_mut`].
    fn open_mut(&mut self) -> &mut OpenList;
}

/// The decomposition's cluster tree: resolves a cluster id to its context
/// and names the current active cluster, per `spec.md` §6's
/// `getRoot`/`getCluster`/`setCurrentCluster`.
pub trait TreeDecomposition {
    fn root(&self) -> usize;
    fn cluster(&self, id: usize) -> &dyn ClusterContext;
    fn cluster_mut(&mut self, id: usize) -> &mut dyn ClusterContext;
    fn set_current_cluster(&mut self, id: usize);
    fn current_cluster(&self) -> usize;
}
