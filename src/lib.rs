//! `wcsp-core` is the tree-search engine of a weighted constraint
//! satisfaction problem (WCSP) branch-and-bound solver.
//!
//! It owns variable- and value-ordering heuristics, the branching policies
//! (binary, dichotomic, SCP, n-ary), Hybrid Best-First/Depth-First Search
//! with its replay-based open-node list, Limited Discrepancy Search, and
//! Luby-sequence restart scheduling. It does not own constraint propagation,
//! cost-function semantics, or tree-decomposition construction — those are
//! external collaborators this crate consumes through the [`wcsp::WcspStore`]
//! trait, the way a real front-end's own arc-consistency engine would.
//!
//! # Core Concepts
//!
//! - **[`wcsp::WcspStore`]**: the constraint-store boundary the search core
//!   is written against. [`wcsp::table::TableWcsp`] is a small bitmask-domain
//!   reference implementation used by this crate's own tests and demos —
//!   not a production WCSP propagator.
//! - **[`config::SearchConfig`]**: the immutable, `serde`-serializable set of
//!   search options (HBFS budget, LDS bound, restart threshold, branching
//!   mode, ...).
//! - **[`search::Solver`]**: the engine itself, generic over any
//!   `WcspStore` implementation.
//!
//! # Example
//!
//! ```
//! use std::sync::{atomic::AtomicBool, Arc};
//! use wcsp_core::config::SearchConfig;
//! use wcsp_core::cost::Cost;
//! use wcsp_core::search::Solver;
//! use wcsp_core::wcsp::table::TableWcsp;
//!
//! // Two variables over {0, 1, 2}, forbidden to take the same value.
//! let mut wcsp = TableWcsp::new(vec![
//!     (0, 2, vec![Cost::MIN_COST; 3]),
//!     (0, 2, vec![Cost::MIN_COST; 3]),
//! ]);
//! wcsp.add_binary(
//!     0,
//!     1,
//!     (0..3)
//!         .map(|i| (0..3).map(|j| if i == j { Cost::MAX_COST } else { Cost::MIN_COST }).collect())
//!         .collect(),
//! );
//! wcsp.set_ub(Cost::MAX_COST);
//!
//! let config = SearchConfig::default();
//! let mut solver = Solver::new(wcsp, config, Arc::new(AtomicBool::new(false)));
//! let outcome = solver.solve().unwrap();
//!
//! assert!(outcome.best_cost.is_some());
//! assert!(outcome.proved_optimal);
//! ```

pub mod config;
pub mod cost;
pub mod error;
pub mod search;
pub mod store;
pub mod wcsp;

pub use config::SearchConfig;
pub use cost::{Cost, Value, VariableId};
pub use error::{Error, Signal};
pub use search::{SolutionObserver, SolveOutcome, Solver};
pub use wcsp::WcspStore;
