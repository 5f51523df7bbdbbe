//! A small table-based [`WcspStore`] reference implementation.
//!
//! Variables have bounded enumerated domains (at most 64 values, so a domain
//! fits in one `u64` bitmask); costs come from per-variable unary cost
//! vectors and pairwise cost tables. Propagation removes values that are
//! *hard*-forbidden (cost `Cost::MAX_COST`) by an assigned neighbor and
//! recomputes a lower bound that is sound but weak: soft (finite) binary
//! costs are only counted once both endpoints are assigned, rather than
//! projected onto unary costs the way a real soft-arc-consistency pass
//! would. That is an intentional simplification — `spec.md` §1 puts
//! "designing new consistency algorithms" out of scope, and this store
//! exists only to exercise the search core's branching, replay, and
//! bounding logic in tests and demos.

use std::rc::Rc;

use super::{AssignListener, WcspStore};
use crate::cost::{Cost, Value, VariableId};
use crate::error::{Result, Signal};
use crate::store::{Store, Trailed};

struct BinaryConstraint {
    var_a: VariableId,
    var_b: VariableId,
    costs: Vec<Vec<Cost>>,
}

impl BinaryConstraint {
    fn cost(&self, offset_a: usize, offset_b: usize) -> Cost {
        self.costs[offset_a][offset_b]
    }
}

struct VarState {
    inf: Value,
    domain: Trailed<u64>,
    unary: Vec<Cost>,
    weighted_degree: Trailed<u64>,
    best_value: Option<Value>,
}

impl VarState {
    fn full_mask(size: usize) -> u64 {
        if size == 64 {
            u64::MAX
        } else {
            (1u64 << size) - 1
        }
    }

    fn offset(&self, value: Value) -> usize {
        (value - self.inf) as usize
    }
}

/// A table-constraint WCSP used for this crate's own tests and demos.
pub struct TableWcsp {
    vars: Vec<VarState>,
    constraints: Vec<BinaryConstraint>,
    degree: Vec<usize>,
    ub: Cost,
    listener: Option<Rc<dyn AssignListener>>,
}

impl TableWcsp {
    /// Build a store with one variable per `(inf, sup, unary_costs)` triple.
    /// `unary_costs[i]` is the cost of `inf + i`; its length must equal
    /// `sup - inf + 1` and that span must not exceed 64.
    pub fn new(variables: Vec<(Value, Value, Vec<Cost>)>) -> Self {
        let degree = vec![0; variables.len()];
        let vars = variables
            .into_iter()
            .map(|(inf, sup, unary)| {
                let size = (sup - inf + 1) as usize;
                assert_eq!(unary.len(), size, "unary cost vector must span the domain");
                assert!(size <= 64, "TableWcsp domains are capped at 64 values");
                VarState {
                    inf,
                    domain: Trailed::new(VarState::full_mask(size)),
                    unary,
                    weighted_degree: Trailed::new(0),
                    best_value: None,
                }
            })
            .collect();
        Self {
            vars,
            constraints: Vec::new(),
            degree,
            ub: Cost::MAX_COST,
            listener: None,
        }
    }

    /// Add a binary table constraint. `costs[i][j]` is the cost of pairing
    /// `var_a`'s `i`-th domain value with `var_b`'s `j`-th domain value.
    pub fn add_binary(&mut self, var_a: VariableId, var_b: VariableId, costs: Vec<Vec<Cost>>) {
        self.degree[var_a as usize] += 1;
        self.degree[var_b as usize] += 1;
        self.constraints.push(BinaryConstraint {
            var_a,
            var_b,
            costs,
        });
    }

    fn var(&self, var: VariableId) -> &VarState {
        &self.vars[var as usize]
    }

    fn domain_values(&self, var: VariableId) -> Vec<Value> {
        let state = self.var(var);
        let mask = state.domain.get();
        (0..state.unary.len())
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| state.inf + i as Value)
            .collect()
    }

    fn remove_bit(&self, store: &mut Store, var: VariableId, offset: usize) -> Result<u64> {
        let state = self.var(var);
        let mask = state.domain.get() & !(1 << offset);
        state.domain.set(store, mask);
        if mask == 0 {
            return Err(Signal::Contradiction);
        }
        Ok(mask)
    }

    fn bump_weighted_degree(&self, store: &mut Store, var: VariableId) {
        let state = self.var(var);
        let degree = state.weighted_degree.get();
        state.weighted_degree.set(store, degree + 1);
    }
}

impl WcspStore for TableWcsp {
    fn number_of_variables(&self) -> usize {
        self.vars.len()
    }

    fn dac_order(&self, var: VariableId) -> u32 {
        var
    }

    fn domain_size(&self, var: VariableId) -> usize {
        self.var(var).domain.get().count_ones() as usize
    }

    fn inf(&self, var: VariableId) -> Value {
        let state = self.var(var);
        let mask = state.domain.get();
        state.inf + mask.trailing_zeros() as Value
    }

    fn sup(&self, var: VariableId) -> Value {
        let state = self.var(var);
        let mask = state.domain.get();
        state.inf + (63 - mask.leading_zeros() as Value)
    }

    fn canbe(&self, var: VariableId, value: Value) -> bool {
        let state = self.var(var);
        let offset = value - state.inf;
        if offset < 0 || offset as usize >= state.unary.len() {
            return false;
        }
        state.domain.get() & (1 << offset) != 0
    }

    fn enumerated(&self, _var: VariableId) -> bool {
        true
    }

    fn assigned(&self, var: VariableId) -> bool {
        self.domain_size(var) == 1
    }

    fn degree(&self, var: VariableId) -> usize {
        self.degree[var as usize]
    }

    fn weighted_degree(&self, var: VariableId) -> u64 {
        self.var(var).weighted_degree.get()
    }

    fn support(&self, var: VariableId) -> Value {
        self.domain_values(var)
            .into_iter()
            .min_by_key(|&v| self.unary_cost(var, v))
            .expect("domain never empties without raising Contradiction")
    }

    fn max_unary_cost(&self, var: VariableId) -> Cost {
        self.domain_values(var)
            .into_iter()
            .map(|v| self.unary_cost(var, v))
            .max()
            .unwrap_or(Cost::MIN_COST)
    }

    fn unary_cost(&self, var: VariableId, value: Value) -> Cost {
        let state = self.var(var);
        state.unary[state.offset(value)]
    }

    fn best_value(&self, var: VariableId) -> Option<Value> {
        self.var(var).best_value
    }

    fn enum_domain(&self, var: VariableId) -> Vec<Value> {
        self.domain_values(var)
    }

    fn enum_domain_and_cost(&self, var: VariableId) -> Vec<(Value, Cost)> {
        self.domain_values(var)
            .into_iter()
            .map(|v| (v, self.unary_cost(var, v)))
            .collect()
    }

    fn lb(&self) -> Cost {
        let mut total = Cost::MIN_COST;
        for var in 0..self.vars.len() as VariableId {
            total += if self.assigned(var) {
                let v = self.inf(var);
                self.unary_cost(var, v)
            } else {
                self.domain_values(var)
                    .into_iter()
                    .map(|v| self.unary_cost(var, v))
                    .min()
                    .unwrap_or(Cost::MIN_COST)
            };
        }
        for constraint in &self.constraints {
            if self.assigned(constraint.var_a) && self.assigned(constraint.var_b) {
                let a = self.var(constraint.var_a);
                let b = self.var(constraint.var_b);
                let offset_a = a.offset(self.inf(constraint.var_a));
                let offset_b = b.offset(self.inf(constraint.var_b));
                total += constraint.cost(offset_a, offset_b);
            }
        }
        total
    }

    fn ub(&self) -> Cost {
        self.ub
    }

    fn negative_lb(&self) -> Cost {
        Cost::MIN_COST
    }

    fn assign(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()> {
        if !self.canbe(var, value) {
            return Err(Signal::Contradiction);
        }
        let state = self.var(var);
        let offset = state.offset(value);
        state.domain.set(store, 1 << offset);
        if let Some(listener) = &self.listener {
            listener.on_assign(store, var, value);
        }
        Ok(())
    }

    fn remove(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()> {
        if !self.canbe(var, value) {
            return Ok(());
        }
        let offset = self.var(var).offset(value);
        let mask = self.remove_bit(store, var, offset)?;
        if mask.count_ones() == 1 {
            let remaining = self.var(var).inf + mask.trailing_zeros() as Value;
            if let Some(listener) = &self.listener {
                listener.on_assign(store, var, remaining);
            }
        }
        Ok(())
    }

    fn increase(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()> {
        let state = self.var(var);
        let keep_from = state.offset(value).max(0) as u32;
        let keep = if keep_from >= 64 {
            0
        } else {
            !0u64 << keep_from
        };
        let mask = state.domain.get() & keep;
        state.domain.set(store, mask);
        if mask == 0 {
            return Err(Signal::Contradiction);
        }
        if mask.count_ones() == 1 {
            let remaining = state.inf + mask.trailing_zeros() as Value;
            if let Some(listener) = &self.listener {
                listener.on_assign(store, var, remaining);
            }
        }
        Ok(())
    }

    fn decrease(&mut self, store: &mut Store, var: VariableId, value: Value) -> Result<()> {
        let state = self.var(var);
        let offset = state.offset(value);
        let keep = if offset >= 63 {
            u64::MAX
        } else {
            (1u64 << (offset + 1)) - 1
        };
        let mask = state.domain.get() & keep;
        state.domain.set(store, mask);
        if mask == 0 {
            return Err(Signal::Contradiction);
        }
        if mask.count_ones() == 1 {
            let remaining = state.inf + mask.trailing_zeros() as Value;
            if let Some(listener) = &self.listener {
                listener.on_assign(store, var, remaining);
            }
        }
        Ok(())
    }

    fn assign_ls(&mut self, store: &mut Store, batch: &[(VariableId, Value)]) -> Result<()> {
        for &(var, value) in batch {
            self.assign(store, var, value)?;
        }
        Ok(())
    }

    fn propagate(&mut self, store: &mut Store) -> Result<()> {
        loop {
            let mut changed = false;
            for i in 0..self.constraints.len() {
                let (var_a, var_b) = (self.constraints[i].var_a, self.constraints[i].var_b);
                for (assigned_var, other_var) in [(var_a, var_b), (var_b, var_a)] {
                    if !self.assigned(assigned_var) || self.assigned(other_var) {
                        continue;
                    }
                    let assigned_value = self.inf(assigned_var);
                    let removals: Vec<Value> = self
                        .domain_values(other_var)
                        .into_iter()
                        .filter(|&other_value| {
                            let constraint = &self.constraints[i];
                            let a = self.var(var_a).offset(if assigned_var == var_a {
                                assigned_value
                            } else {
                                other_value
                            });
                            let b = self.var(var_b).offset(if assigned_var == var_b {
                                assigned_value
                            } else {
                                other_value
                            });
                            constraint.cost(a, b).is_infeasible()
                        })
                        .collect();
                    for value in removals {
                        changed = true;
                        let offset = self.var(other_var).offset(value);
                        if self.remove_bit(store, other_var, offset).is_err() {
                            self.bump_weighted_degree(store, var_a);
                            self.bump_weighted_degree(store, var_b);
                            return Err(Signal::Contradiction);
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
        self.enforce_ub()
    }

    fn update_ub(&mut self, ub: Cost) {
        if ub < self.ub {
            self.ub = ub;
        }
    }

    fn set_ub(&mut self, ub: Cost) {
        self.ub = ub;
    }

    fn enforce_ub(&mut self) -> Result<()> {
        if self.lb() >= self.ub {
            Err(Signal::Contradiction)
        } else {
            Ok(())
        }
    }

    fn reset_weighted_degree(&mut self, store: &mut Store, var: VariableId) {
        self.var(var).weighted_degree.set(store, 0);
    }

    fn set_best_value(&mut self, var: VariableId, value: Value) {
        self.vars[var as usize].best_value = Some(value);
    }

    fn set_assign_listener(&mut self, listener: Rc<dyn AssignListener>) {
        self.listener = Some(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forbid_equal(size: usize) -> Vec<Vec<Cost>> {
        (0..size)
            .map(|i| {
                (0..size)
                    .map(|j| if i == j { Cost::MAX_COST } else { Cost::MIN_COST })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn propagation_removes_values_forbidden_by_an_assignment() {
        let mut wcsp = TableWcsp::new(vec![
            (0, 2, vec![Cost::MIN_COST; 3]),
            (0, 2, vec![Cost::MIN_COST; 3]),
        ]);
        wcsp.add_binary(0, 1, forbid_equal(3));
        wcsp.set_ub(Cost::MAX_COST);
        let mut store = Store::new();

        wcsp.assign(&mut store, 0, 1).unwrap();
        wcsp.propagate(&mut store).unwrap();

        assert!(!wcsp.canbe(1, 1));
        assert_eq!(wcsp.domain_size(1), 2);
    }

    #[test]
    fn fully_forbidding_binary_constraint_is_infeasible_once_both_singletons() {
        let mut wcsp = TableWcsp::new(vec![
            (0, 0, vec![Cost::MIN_COST]),
            (0, 0, vec![Cost::MIN_COST]),
        ]);
        wcsp.add_binary(0, 1, vec![vec![Cost::MAX_COST]]);
        wcsp.set_ub(Cost::MAX_COST);
        let mut store = Store::new();

        wcsp.assign(&mut store, 0, 0).unwrap();
        let result = wcsp.propagate(&mut store);

        assert_eq!(result, Err(Signal::Contradiction));
    }

    #[test]
    fn restore_undoes_propagated_removals() {
        let mut wcsp = TableWcsp::new(vec![
            (0, 2, vec![Cost::MIN_COST; 3]),
            (0, 2, vec![Cost::MIN_COST; 3]),
        ]);
        wcsp.add_binary(0, 1, forbid_equal(3));
        wcsp.set_ub(Cost::MAX_COST);
        let mut store = Store::new();

        store.save();
        wcsp.assign(&mut store, 0, 1).unwrap();
        wcsp.propagate(&mut store).unwrap();
        assert_eq!(wcsp.domain_size(1), 2);

        store.restore_one();
        assert_eq!(wcsp.domain_size(1), 3);
        assert_eq!(wcsp.domain_size(0), 3);
    }
}
