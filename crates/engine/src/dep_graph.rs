//! Dependency graph for formula cells.
//!
//! Tracks precedents (cells a formula reads) and dependents (cells whose
//! formulas read a given cell) for edge rewiring, invalidation walks, and
//! the cycle check that gates every edit.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a precedent of B)
//! ```
//!
//! Edges are keyed by `Position`, not by references between cells: a
//! position can carry incoming edges while no cell exists there at all
//! (formulas may read cells that were never written, or were cleared).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::position::Position;

/// Persistent dependency graph for formula cells.
///
/// Maintains bidirectional adjacency for O(1) lookups:
/// - `preds[B]` = cells that B reads (precedents, B's `refs_out`)
/// - `succs[A]` = cells that read A (dependents, A's `refs_in`)
///
/// # Invariants
///
/// 1. **Bidirectional consistency:** If A ∈ preds[B] then B ∈ succs[A], and vice versa.
/// 2. **No dangling entries:** Empty sets are removed, not stored.
/// 3. **No duplicate edges:** Set semantics enforced by FxHashSet.
/// 4. **Atomic updates:** `replace_edges` is the only mutator that touches both maps.
#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    preds: FxHashMap<Position, FxHashSet<Position>>,
    succs: FxHashMap<Position, FxHashSet<Position>>,
}

impl DepGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cells this formula cell reads (its outgoing edges).
    pub fn precedents(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.preds
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// The cells that read this cell (its incoming edges).
    pub fn dependents(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.succs
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Number of cells with outgoing edges (formula cells with references).
    pub fn formula_cell_count(&self) -> usize {
        self.preds.len()
    }

    /// Number of cells referenced by at least one formula.
    pub fn referenced_cell_count(&self) -> usize {
        self.succs.len()
    }

    /// Replace all outgoing edges for a formula cell atomically.
    ///
    /// This is the primary mutation API. It:
    /// 1. Removes the cell from all its old precedents' dependent sets
    /// 2. Clears the cell's precedent set
    /// 3. Adds the cell to all new precedents' dependent sets
    /// 4. Sets the cell's new precedent set
    ///
    /// Pass an empty set to tear down all outgoing edges.
    pub fn replace_edges(&mut self, formula_cell: Position, new_preds: FxHashSet<Position>) {
        // Step 1: Remove old edges
        if let Some(old_preds) = self.preds.remove(&formula_cell) {
            for pred in old_preds {
                if let Some(deps) = self.succs.get_mut(&pred) {
                    deps.remove(&formula_cell);
                    // Clean up empty entries (invariant: no dangling)
                    if deps.is_empty() {
                        self.succs.remove(&pred);
                    }
                }
            }
        }

        // Step 2: If no new precedents, we're done (cell is not a formula or has no refs)
        if new_preds.is_empty() {
            return;
        }

        // Step 3: Add new edges
        for pred in &new_preds {
            self.succs.entry(*pred).or_default().insert(formula_cell);
        }

        // Step 4: Store new precedents
        self.preds.insert(formula_cell, new_preds);
    }

    /// Tear down all outgoing edges for a cell (formula replaced or cell
    /// cleared). Incoming edges are untouched: other formulas keep reading
    /// the position.
    pub fn clear_cell(&mut self, cell: Position) {
        self.replace_edges(cell, FxHashSet::default());
    }

    /// True if `start` can reach itself along dependents edges.
    ///
    /// Runs after `replace_edges` has installed the edited cell's new
    /// outgoing edges. The rest of the graph was acyclic before the edit,
    /// so any cycle must pass through the edited cell; walking "who reads
    /// me" from it and looking for it again is sufficient.
    pub fn creates_cycle(&self, start: Position) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for dep in self.dependents(current) {
                if dep == start {
                    return true;
                }
                stack.push(dep);
            }
        }

        false
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        // Invariant 1: Bidirectional consistency (preds → succs)
        for (formula_cell, preds) in &self.preds {
            for pred in preds {
                assert!(
                    self.succs
                        .get(pred)
                        .map_or(false, |s| s.contains(formula_cell)),
                    "Missing succ edge: {} should have {} in dependents",
                    pred,
                    formula_cell
                );
            }
        }

        // Invariant 1: Bidirectional consistency (succs → preds)
        for (cell, dependents) in &self.succs {
            for dep in dependents {
                assert!(
                    self.preds.get(dep).map_or(false, |s| s.contains(cell)),
                    "Missing pred edge: {} should have {} in precedents",
                    dep,
                    cell
                );
            }
        }

        // Invariant 2: No empty sets stored
        for (cell, preds) in &self.preds {
            assert!(!preds.is_empty(), "Empty preds set stored for {}", cell);
        }
        for (cell, succs) in &self.succs {
            assert!(!succs.is_empty(), "Empty succs set stored for {}", cell);
        }
    }
}
