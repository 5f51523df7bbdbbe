//! Replay: reconstruct the store state a suspended open node was anchored
//! at, by re-applying its choice-point slice (`spec.md` §4.6).
//!
//! The slice `[first, last)` was written during an earlier dive and is
//! never overwritten afterwards — this engine's choice-point log only ever
//! grows (see the module doc on [`super::choice_point::ChoicePointLog`]), so
//! those positions are always safe to read back, however many HBFS
//! iterations have run since. Re-applying them also re-appends an
//! equivalent record to the *current* log tail, so the new dive under this
//! node is itself loggable and can anchor further open nodes of its own —
//! this is the one place the log's "index reuse" framing in `spec.md` §3 is
//! simplified to "append a fresh copy" instead of rewinding `index`
//! backward, which would risk corrupting a sibling open node's still-live
//! slice; see `DESIGN.md`.
//!
//! The literal `Assign` entries in the slice are applied with one
//! `assign_ls` batch call before anything else, matching `spec.md` §4.6's
//! "assign every literal assignment in one pass before propagating". Every
//! other entry (`Remove`, `Increase`, `Decrease`, `RangeRemoval`) is applied
//! individually in slice order; `propagate` then runs once at the end.

use crate::cost::{Value, VariableId};
use crate::error::Result;
use crate::search::choice_point::Operation;
use crate::search::engine::Solver;
use crate::wcsp::WcspStore;

impl<W: WcspStore> Solver<W> {
    pub(crate) fn replay(&mut self, first: usize, last: usize) -> Result<()> {
        if first == last {
            return Ok(());
        }
        let entries: Vec<_> = self.cp_log.slice(first, last).to_vec();

        let batch: Vec<(VariableId, Value)> = entries
            .iter()
            .filter(|cp| cp.op == Operation::Assign)
            .map(|cp| (cp.var, cp.value))
            .collect();
        if !batch.is_empty() {
            self.wcsp.assign_ls(&mut self.store, &batch)?;
        }

        for cp in &entries {
            if cp.op != Operation::Assign {
                self.apply_op(cp.op, cp.var, cp.value)?;
            }
            self.cp_log.push(*cp);
        }

        self.wcsp.propagate(&mut self.store)?;
        self.stats.recomputation_nodes += entries.len() as u64;
        self.stats.nodes_visited += entries.len() as u64;
        Ok(())
    }
}
