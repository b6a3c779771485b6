//! Sparse occupancy storage shared across particle ancestries.
//!
//! Every particle logically owns a full occupancy grid, but particles
//! that share ancestry share almost all of their map. Instead of one
//! grid per particle, each cell stores a small table keyed by the
//! ancestry node that observed it; reading a cell for a particle walks
//! that particle's ancestry until a keyed entry is found. Memory then
//! grows with the number of distinct cell edits across live lineages,
//! not with particles × cells.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ancestry::{AncestryTree, NodeId};

/// Binary occupancy of an observed cell.
///
/// Unobserved cells have no state at all; lookups express that as
/// `None` (or fall back to [`CellState::Free`] when a ray needs a
/// concrete answer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    /// Definitely empty.
    Free,
    /// Contains an obstacle.
    Occupied,
}

/// Per-cell table of ancestry observations.
///
/// A short sorted vector: the common case is one or two live ids per
/// cell, where binary search over a `Vec` beats any nested map.
#[derive(Debug, Default, Clone)]
struct CellAncestry {
    entries: Vec<(NodeId, CellState)>,
}

impl CellAncestry {
    fn get(&self, id: NodeId) -> Option<CellState> {
        self.entries
            .binary_search_by_key(&id, |e| e.0)
            .ok()
            .map(|i| self.entries[i].1)
    }

    fn set(&mut self, id: NodeId, state: CellState) {
        match self.entries.binary_search_by_key(&id, |e| e.0) {
            Ok(i) => self.entries[i].1 = state,
            Err(i) => self.entries.insert(i, (id, state)),
        }
    }

    fn remove(&mut self, id: NodeId) -> Option<CellState> {
        match self.entries.binary_search_by_key(&id, |e| e.0) {
            Ok(i) => Some(self.entries.remove(i).1),
            Err(_) => None,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Sparse grid of per-ancestor occupancy observations.
#[derive(Debug, Default)]
pub struct DistributedMap {
    cells: HashMap<(i32, i32), CellAncestry>,
}

impl DistributedMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observation recorded at `(cx, cy)` by the node `id` itself.
    ///
    /// `None` means that node never wrote this cell.
    pub fn lookup_by_id(&self, cx: i32, cy: i32, id: NodeId) -> Option<CellState> {
        self.cells.get(&(cx, cy)).and_then(|cell| cell.get(id))
    }

    /// Occupancy of `(cx, cy)` as seen by the particle `id`.
    ///
    /// Walks `id`'s ancestry toward the root and returns the first
    /// recorded observation. A cell no ancestor observed reads as
    /// [`CellState::Free`]: rays pass through unknown space.
    pub fn lookup(&self, cx: i32, cy: i32, tree: &AncestryTree, id: NodeId) -> CellState {
        if let Some(cell) = self.cells.get(&(cx, cy)) {
            for ancestor in tree.ancestors(id) {
                if let Some(state) = cell.get(ancestor) {
                    return state;
                }
            }
        }
        CellState::Free
    }

    /// Install or overwrite the observation of `id` at `(cx, cy)`.
    ///
    /// Row and per-cell table are created on demand.
    pub fn update_by_id(&mut self, state: CellState, cx: i32, cy: i32, id: NodeId) {
        self.cells.entry((cx, cy)).or_default().set(id, state);
    }

    /// Record an observation for the particle `id`, first-writer-wins.
    ///
    /// If any ancestor of `id` (including `id` itself) already observed
    /// `(cx, cy)`, nothing is written and `false` is returned. The
    /// caller uses the return value to keep the owning node's
    /// modified-cell list exact.
    pub fn update(
        &mut self,
        state: CellState,
        cx: i32,
        cy: i32,
        tree: &AncestryTree,
        id: NodeId,
    ) -> bool {
        if let Some(cell) = self.cells.get(&(cx, cy)) {
            if tree.ancestors(id).any(|ancestor| cell.get(ancestor).is_some()) {
                return false;
            }
        }
        self.update_by_id(state, cx, cy, id);
        true
    }

    /// Remove the observation of `id` at `(cx, cy)`.
    ///
    /// Empty rows are dropped so the outer table stays proportional to
    /// the observed region.
    pub fn erase(&mut self, cx: i32, cy: i32, id: NodeId) {
        if let Some(cell) = self.cells.get_mut(&(cx, cy)) {
            let removed = cell.remove(id);
            debug_assert!(removed.is_some(), "erase of unrecorded entry ({cx},{cy})@{id}");
            if cell.entries.is_empty() {
                self.cells.remove(&(cx, cy));
            }
        }
    }

    /// Re-key the observation at `(cx, cy)` from `old` to `new`.
    pub fn rename(&mut self, cx: i32, cy: i32, old: NodeId, new: NodeId) {
        if let Some(cell) = self.cells.get_mut(&(cx, cy)) {
            if let Some(state) = cell.remove(old) {
                cell.set(new, state);
            }
        }
    }

    /// Number of cells with at least one observation.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total number of `(cell, node)` observations.
    pub fn entry_count(&self) -> usize {
        self.cells.values().map(CellAncestry::len).sum()
    }

    /// All observations, as `(cx, cy, node, state)` tuples.
    pub fn entries(&self) -> impl Iterator<Item = (i32, i32, NodeId, CellState)> + '_ {
        self.cells.iter().flat_map(|(&(cx, cy), cell)| {
            cell.entries.iter().map(move |&(id, state)| (cx, cy, id, state))
        })
    }
}
