//! Variable-ordering heuristics (`spec.md` §4.1) and restart scheduling
//! (§4.3, §4.7). Heuristics are trait objects, selected and composed by the
//! caller per `SearchConfig` — mirroring the teacher's
//! `VariableSelectionHeuristic`/`RestartPolicy` pattern in
//! `heuristics/variable.rs` and `heuristics/restart.rs` — because callers
//! genuinely swap these independently. Branching policies, by contrast, are
//! inherent methods on [`super::engine::Solver`]: see that module's doc
//! comment for why that distinction was kept.

pub mod restart;
pub mod variable;

pub use restart::{LubyRestartPolicy, NoRestartPolicy, RestartPolicy};
pub use variable::{
    BepMostUrgent, LastConflict, MinDomainMaxDegree, MinDomainMaxWeightedDegree, Randomized,
    ScpFilter, StaticOrder, VariableOrderingHeuristic,
};
