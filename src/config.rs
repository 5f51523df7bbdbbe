//! Search configuration.
//!
//! The reference solver threads its options through a global struct that
//! every method reaches into. Per the "Global mutable options" design note,
//! this crate instead passes one immutable [`SearchConfig`] by reference
//! into the engine and keeps only genuinely mutable counters on the engine
//! itself. `SearchConfig` derives `serde::{Serialize, Deserialize}` so a
//! front-end can load it from a config file or dump it alongside a run's
//! statistics, the way the teacher crate's own options are serializable.

use serde::{Deserialize, Serialize};

/// The dichotomic-branching split mode (`spec.md` §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DichotomicMode {
    /// `decrease(v, mid)` / `increase(v, mid+1)`, ordered by whether the
    /// heuristic's chosen value is `<= mid`.
    Midpoint,
    /// Same split, fixed branch order regardless of the chosen value.
    MidpointFixedOrder,
    /// Domain sorted by unary cost, then split in half.
    SortedByCost,
}

impl DichotomicMode {
    fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Midpoint),
            1 => Some(Self::MidpointFixedOrder),
            2 => Some(Self::SortedByCost),
            _ => None,
        }
    }
}

/// How many levels of tree decomposition cooperation are active
/// (`spec.md` §6's `btdMode`, 0..3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BtdMode {
    /// No tree decomposition; plain HBFS/DFS over the whole problem.
    Disabled,
    /// Decomposition built and used only to report connected components.
    ComponentsOnly,
    /// Full BTD-HBFS cooperation via [`crate::search::tree_dec::ClusterContext`].
    Cooperative,
    /// Cooperative BTD with root-cluster re-use across restarts.
    CooperativeWithRootReuse,
}

impl BtdMode {
    fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Disabled),
            1 => Some(Self::ComponentsOnly),
            2 => Some(Self::Cooperative),
            3 => Some(Self::CooperativeWithRootReuse),
            _ => None,
        }
    }
}

/// Immutable search configuration, covering every option named in
/// `spec.md` §6's CLI surface that the core itself reads.
///
/// Constructed once per run via [`SearchConfig::builder`] or `serde`
/// deserialization, then held by shared reference for the run's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Enable HBFS; carries the initial backtrack budget `B` (`hbfs`).
    pub hbfs_init: Option<u64>,
    /// `hbfsAlpha`: budget doubles when the observed recomputation ratio
    /// falls below `1 / alpha`.
    pub hbfs_alpha: u64,
    /// `hbfsBeta`: budget halves when the ratio exceeds `1 / beta`.
    pub hbfs_beta: u64,
    /// `hbfsCPLimit`: choice-point log capacity before a forced compaction.
    pub hbfs_cp_limit: usize,
    /// `hbfsOpenNodeLimit`: open-list capacity before the globally worst
    /// node is dropped.
    pub hbfs_open_node_limit: usize,
    /// `lds`: limited discrepancy search bound. Negative disables the
    /// fallback-to-complete-DFS pass once discrepancy is exhausted.
    pub lds: Option<i32>,
    /// `restart`: node-count threshold that activates Luby-sequence
    /// restarts; `None` disables restarts entirely.
    pub restart: Option<u64>,
    /// `weightedDegree`: use min-domain/max-weighted-degree instead of
    /// plain min-domain/max-degree.
    pub weighted_degree: bool,
    /// `lastConflict`: override the base heuristic with the most recently
    /// conflicting variable while it remains unassigned.
    pub last_conflict: bool,
    /// `dichotomicBranching`: `None` selects binary choice points.
    pub dichotomic_branching: Option<DichotomicMode>,
    /// `dichotomicBranchingSize`: only dichotomize domains at least this
    /// large; smaller domains use binary choice points regardless.
    pub dichotomic_branching_size: usize,
    /// `binaryBranching`: use binary (vs. n-ary sorted) choice points when
    /// dichotomic branching is not selected.
    pub binary_branching: bool,
    /// `Static_variable_ordering`: ignore all scoring heuristics and take
    /// variables in DAC order.
    pub static_variable_ordering: bool,
    /// `allSolutions`: enumerate up to this many solutions instead of
    /// stopping at the first proven optimum.
    pub all_solutions: Option<u64>,
    /// `verifyOpt`: after search, re-derive the optimum with a second,
    /// independent pass and compare.
    pub verify_opt: bool,
    /// `singletonConsistency`: run the singleton-consistency fixpoint
    /// during preprocessing.
    pub singleton_consistency: bool,
    /// `btdMode`.
    pub btd_mode: BtdMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hbfs_init: None,
            hbfs_alpha: 20,
            hbfs_beta: 5,
            hbfs_cp_limit: 1_000_000,
            hbfs_open_node_limit: 100_000,
            lds: None,
            restart: None,
            weighted_degree: false,
            last_conflict: false,
            dichotomic_branching: None,
            dichotomic_branching_size: 10,
            binary_branching: true,
            static_variable_ordering: false,
            all_solutions: None,
            verify_opt: false,
            singleton_consistency: false,
            btd_mode: BtdMode::Disabled,
        }
    }
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    pub fn hbfs_enabled(&self) -> bool {
        self.hbfs_init.is_some()
    }

    pub fn lds_enabled(&self) -> bool {
        self.lds.is_some()
    }
}

/// A builder validating the option-compatibility constraints `spec.md`
/// §7 assigns to `preprocessing`'s fatal-error path (e.g. a dichotomic
/// branching level outside `0..=2` is a configuration error, not a search
/// signal — it is caught before the engine ever runs).
#[derive(Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn hbfs_init(mut self, budget: u64) -> Self {
        self.config.hbfs_init = Some(budget);
        self
    }

    pub fn hbfs_alpha(mut self, alpha: u64) -> Self {
        self.config.hbfs_alpha = alpha;
        self
    }

    pub fn hbfs_beta(mut self, beta: u64) -> Self {
        self.config.hbfs_beta = beta;
        self
    }

    pub fn restart(mut self, threshold: u64) -> Self {
        self.config.restart = Some(threshold);
        self
    }

    pub fn lds(mut self, max_discrepancy: i32) -> Self {
        self.config.lds = Some(max_discrepancy);
        self
    }

    pub fn weighted_degree(mut self, enabled: bool) -> Self {
        self.config.weighted_degree = enabled;
        self
    }

    pub fn last_conflict(mut self, enabled: bool) -> Self {
        self.config.last_conflict = enabled;
        self
    }

    pub fn dichotomic_branching(mut self, level: u8) -> Result<Self, crate::error::Error> {
        let mode = DichotomicMode::from_level(level).ok_or_else(|| {
            crate::error::Error::Config(format!(
                "dichotomicBranching must be 0, 1, or 2; got {level}"
            ))
        })?;
        self.config.dichotomic_branching = Some(mode);
        Ok(self)
    }

    pub fn dichotomic_branching_size(mut self, size: usize) -> Self {
        self.config.dichotomic_branching_size = size;
        self
    }

    pub fn binary_branching(mut self, enabled: bool) -> Self {
        self.config.binary_branching = enabled;
        self
    }

    pub fn static_variable_ordering(mut self, enabled: bool) -> Self {
        self.config.static_variable_ordering = enabled;
        self
    }

    pub fn all_solutions(mut self, cap: u64) -> Self {
        self.config.all_solutions = Some(cap);
        self
    }

    pub fn verify_opt(mut self, enabled: bool) -> Self {
        self.config.verify_opt = enabled;
        self
    }

    pub fn singleton_consistency(mut self, enabled: bool) -> Self {
        self.config.singleton_consistency = enabled;
        self
    }

    pub fn btd_mode(mut self, level: u8) -> Result<Self, crate::error::Error> {
        let mode = BtdMode::from_level(level).ok_or_else(|| {
            crate::error::Error::Config(format!("btdMode must be 0..=3; got {level}"))
        })?;
        self.config.btd_mode = mode;
        Ok(self)
    }

    pub fn build(self) -> Result<SearchConfig, crate::error::Error> {
        if self.config.lds_enabled() && self.config.static_variable_ordering {
            return Err(crate::error::Error::Config(
                "lds is incompatible with static_variable_ordering".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_runs_plain_dfs_with_binary_branching() {
        let config = SearchConfig::default();
        assert!(!config.hbfs_enabled());
        assert!(!config.lds_enabled());
        assert!(config.binary_branching);
    }

    #[test]
    fn builder_rejects_out_of_range_dichotomic_level() {
        let err = SearchConfig::builder().dichotomic_branching(3);
        assert!(err.is_err());
    }

    #[test]
    fn builder_rejects_lds_with_static_ordering() {
        let err = SearchConfig::builder()
            .lds(2)
            .static_variable_ordering(true)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SearchConfig::builder()
            .hbfs_init(16)
            .restart(1_000)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hbfs_init, config.hbfs_init);
        assert_eq!(back.restart, config.restart);
    }
}
