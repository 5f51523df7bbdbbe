//! The constraint-store interface the search core consumes.
//!
//! `spec.md` §1 names the constraint store (`WCSP`) as an external
//! collaborator: it holds variables, domains, and cost functions, performs
//! local-consistency propagation, and answers the queries and mutations of
//! §6. This module defines that boundary as a Rust trait so the engine in
//! [`crate::search`] can be written once against it and exercised in tests
//! without depending on any particular propagation algorithm — designing a
//! new consistency algorithm is explicitly out of scope (§1 Non-goals).
//!
//! [`table::TableWcsp`] is a small reference implementation used by this
//! crate's own tests and demos. It implements unary costs plus pairwise
//! table constraints with a weak (but sound) lower bound — adequate for
//! exercising the search core, not a substitute for a production WCSP
//! solver's arc-consistency propagation.

pub mod table;

use std::rc::Rc;

use crate::cost::{Cost, Value, VariableId};
use crate::error::{Result, Signal};
use crate::store::Store;

/// Registered on a [`WcspStore`] so the search engine's unassigned-variable
/// list (`spec.md` §4.4) can stay in sync with assignments that happen as a
/// side effect of propagation, not just of explicit branching.
///
/// This replaces the reference solver's global `setvalue` function pointer
/// with an explicit listener interface, per the "Assignment callback"
/// design note.
pub trait AssignListener {
    fn on_assign(&self, store: &mut Store, var: VariableId, value: Value);
}

/// The constraint store boundary consumed by the search core.
///
/// Every mutating method that can discover infeasibility returns
/// `Result<(), Signal>` so a [`Signal::Contradiction`] propagates with `?`
/// up to the nearest branching frame, which is exactly how `spec.md` §7
/// describes the `Contradiction` signal's handling.
pub trait WcspStore {
    /// The fixed number of variables in the problem.
    fn number_of_variables(&self) -> usize;

    /// A fixed total order on variables, canonicalizing enumeration. An
    /// implementation detail of the store; the search core only ever reads
    /// it once, at initialization, to order the unassigned-variable list.
    fn dac_order(&self, var: VariableId) -> u32;

    fn domain_size(&self, var: VariableId) -> usize;
    fn inf(&self, var: VariableId) -> Value;
    fn sup(&self, var: VariableId) -> Value;
    fn canbe(&self, var: VariableId, value: Value) -> bool;
    /// Whether the variable has an enumerated (discrete) domain
    /// representation, as opposed to only bounds. The reference
    /// implementation always answers `true`; the distinction matters for
    /// the n-ary and dichotomic branching policies in §4.2.
    fn enumerated(&self, var: VariableId) -> bool;
    fn assigned(&self, var: VariableId) -> bool;
    fn unassigned(&self, var: VariableId) -> bool {
        !self.assigned(var)
    }
    fn degree(&self, var: VariableId) -> usize;
    fn weighted_degree(&self, var: VariableId) -> u64;
    /// The EAC support value: a value known to realize (close to) the
    /// variable's minimum achievable unary cost. Used as the branching
    /// value when no previous solution recorded a best value in-domain.
    fn support(&self, var: VariableId) -> Value;
    fn max_unary_cost(&self, var: VariableId) -> Cost;
    fn unary_cost(&self, var: VariableId, value: Value) -> Cost;
    /// The value assigned to `var` in the best solution found so far, if
    /// any (`spec.md` §3's `getBestValue`).
    fn best_value(&self, var: VariableId) -> Option<Value>;
    fn enum_domain(&self, var: VariableId) -> Vec<Value>;
    fn enum_domain_and_cost(&self, var: VariableId) -> Vec<(Value, Cost)>;

    fn lb(&self) -> Cost;
    fn ub(&self) -> Cost;
    /// A constant negative shift applied to reported costs so that
    /// internal costs stay non-negative; `spec.md` §6's `getNegativeLb`.
    fn negative_lb(&self) -> Cost;

    fn assign(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()>;
    fn remove(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()>;
    fn increase(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()>;
    fn decrease(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()>;
    /// Fast multiple-assignment path used by replay (`spec.md` §4.6):
    /// assigns every `(var, value)` pair in one pass before propagating,
    /// rather than propagating once per assignment.
    fn assign_ls(&mut self, store: &mut Store, batch: &[(VariableId, Value)]) -> Result<()>;
    fn propagate(&mut self, store: &mut Store) -> Result<()>;

    fn update_ub(&mut self, ub: Cost);
    fn set_ub(&mut self, ub: Cost);
    /// Re-checks the current lower bound against `ub` and raises
    /// `Contradiction` if the node is now proven infeasible. Called after
    /// every restore, per `spec.md` §4.2 step 4.
    fn enforce_ub(&mut self) -> Result<()>;

    fn reset_weighted_degree(&mut self, store: &mut Store, var: VariableId);
    fn set_best_value(&mut self, var: VariableId, value: Value);

    fn set_assign_listener(&mut self, listener: Rc<dyn AssignListener>);
}

/// Raise a [`Signal::Contradiction`]. A tiny helper so call sites read like
/// the reference solver's `THROWCONTRADICTION` macro.
pub fn contradiction<T>() -> Result<T> {
    Err(Signal::Contradiction)
}
