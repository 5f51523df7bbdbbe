//! The tree-search engine: variable/value selection, branching policies,
//! HBFS, LDS, restarts, and the top-level solve loop (`spec.md` §2).
//!
//! [`engine::Solver`] owns all genuinely mutable search state (the
//! choice-point log, open list, statistics, and the backtrackable
//! [`crate::store::Store`]) and is generic over a [`crate::wcsp::WcspStore`]
//! implementation, so the same engine drives any constraint store that
//! implements the trait.

pub mod branching;
pub mod choice_point;
pub mod engine;
pub mod hbfs;
pub mod heuristics;
pub mod open_list;
pub mod replay;
pub mod solve;
pub mod stats;
pub mod tree_dec;
pub mod unassigned;

pub use engine::{Solver, SolutionObserver};
pub use solve::SolveOutcome;
