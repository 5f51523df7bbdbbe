//! An explicit, versioned backtrackable store.
//!
//! The reference solver relies on a stack-discipline memory allocator that
//! transparently undoes pointer writes on backtrack. There is no equivalent
//! in safe Rust, so this module re-architects it as the Design Notes
//! prescribe: a trail of undo closures plus a stack of marks. Every
//! backtrackable field in the engine is a [`Trailed<T>`] that pushes its own
//! undo entry onto a shared [`Store`] whenever it is mutated. `save()` and
//! `restore(depth)` are the only two operations the rest of the crate needs
//! to know about; everything else is `Trailed::set`.

use std::cell::Cell;
use std::rc::Rc;

/// Stack-structured memory providing save/restore checkpoints.
///
/// Every tentative assignment made during search is preceded by a
/// [`Store::save`] and followed, on exit from that branch (success,
/// [`crate::error::Signal::Contradiction`], or any other typed exit), by a
/// matching [`Store::restore`]. See `spec.md` §8 "Checkpoint discipline".
#[derive(Default)]
pub struct Store {
    trail: Vec<Box<dyn FnMut()>>,
    marks: Vec<usize>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current checkpoint depth (number of outstanding `save()` calls).
    pub fn depth(&self) -> usize {
        self.marks.len()
    }

    /// Push a checkpoint. Every `Trailed` mutation recorded after this call
    /// is undone by the matching `restore`.
    pub fn save(&mut self) {
        self.marks.push(self.trail.len());
    }

    /// Unwind the trail back to the given depth, running undo closures in
    /// reverse order of registration (most recent first), and pop marks
    /// down to that depth.
    ///
    /// `depth` must be `<= self.depth()`; restoring to a depth greater than
    /// the current one is a programming error and panics, matching the
    /// reference store's debug-assertion discipline.
    pub fn restore(&mut self, depth: usize) {
        assert!(
            depth <= self.marks.len(),
            "cannot restore to a depth ({depth}) deeper than the current one ({})",
            self.marks.len()
        );
        while self.marks.len() > depth {
            let mark = self.marks.pop().expect("marks non-empty in loop guard");
            while self.trail.len() > mark {
                let mut undo = self.trail.pop().expect("trail longer than mark");
                undo();
            }
        }
    }

    /// Pop exactly one checkpoint level, equivalent to `restore(depth() - 1)`.
    /// Mirrors the reference store's zero-argument `Store::restore()`.
    pub fn restore_one(&mut self) {
        let depth = self.depth();
        assert!(depth > 0, "restore_one called with no outstanding save()");
        self.restore(depth - 1);
    }

    fn push_undo(&mut self, undo: impl FnMut() + 'static) {
        self.trail.push(Box::new(undo));
    }
}

/// A single backtrackable cell. Every read sees the value as of the last
/// mutation; every write before a matching `restore` is rolled back.
///
/// `Trailed` cells are cheaply cloneable (they share the underlying cell via
/// `Rc`), so the same backtrackable slot can be held by both the engine and
/// a data structure like the unassigned-variable list without any of the
/// components needing a lifetime back to the `Store`.
pub struct Trailed<T: Copy + 'static> {
    cell: Rc<Cell<T>>,
}

impl<T: Copy + 'static> Trailed<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(Cell::new(value)),
        }
    }

    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Overwrite the value, registering an undo entry on `store` that
    /// restores the previous value. A no-op write (new value equal to the
    /// old one under `PartialEq`) is still trailed unconditionally: the
    /// caller controls whether it wants to skip redundant writes, this
    /// type just offers the mechanism.
    pub fn set(&self, store: &mut Store, value: T) {
        let old = self.cell.get();
        let cell = Rc::clone(&self.cell);
        store.push_undo(move || cell.set(old));
        self.cell.set(value);
    }
}

impl<T: Copy + 'static> Clone for Trailed<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: Copy + std::fmt::Debug + 'static> std::fmt::Debug for Trailed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Trailed").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_undoes_writes_in_reverse_order() {
        let mut store = Store::new();
        let cell = Trailed::new(0_i32);

        store.save();
        cell.set(&mut store, 1);
        cell.set(&mut store, 2);
        assert_eq!(cell.get(), 2);

        store.restore_one();
        assert_eq!(cell.get(), 0);
    }

    #[test]
    fn nested_checkpoints_restore_independently() {
        let mut store = Store::new();
        let cell = Trailed::new(10_i32);

        store.save(); // depth 1
        cell.set(&mut store, 20);
        store.save(); // depth 2
        cell.set(&mut store, 30);
        assert_eq!(cell.get(), 30);

        store.restore(1);
        assert_eq!(cell.get(), 20);
        assert_eq!(store.depth(), 1);

        store.restore(0);
        assert_eq!(cell.get(), 10);
        assert_eq!(store.depth(), 0);
    }

    #[test]
    #[should_panic]
    fn restoring_past_current_depth_panics() {
        let mut store = Store::new();
        store.save();
        store.restore(5);
    }
}
