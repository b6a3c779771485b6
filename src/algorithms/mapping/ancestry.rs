//! Ancestry tree over particle generations.
//!
//! Every pose ever sampled becomes a node; an edge means "was predicted
//! from". The current particles are the leaves. Nodes are kept in an
//! arena keyed by id with parent links only, so the ancestry walk the
//! map performs on every cell read is a tight integer loop with no
//! reference cycles.
//!
//! Trimming keeps the tree a Steiner tree of the surviving lineages:
//! dead branches are deleted outright, and chains of only children are
//! folded into a single node that inherits the shallowest id and the
//! union of the chain's cell edits.

use std::collections::HashMap;

use crate::core::types::Pose2D;

use super::distributed_map::DistributedMap;

/// Process-unique, monotonically assigned node identifier.
pub type NodeId = u32;

/// One node of the ancestry tree.
#[derive(Debug, Clone)]
pub struct AncestryNode {
    /// Identifier this node's map entries are keyed by.
    pub id: NodeId,
    /// Pose hypothesis sampled for this node.
    pub pose: Pose2D,
    /// Parent link; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Number of live children.
    pub children: u32,
    /// Whether this node is one of the current particles.
    pub leaf: bool,
    /// Exact set of cells whose map table carries this node's id.
    pub modified_cells: Vec<(i32, i32)>,
}

/// Arena of ancestry nodes.
#[derive(Debug)]
pub struct AncestryTree {
    nodes: HashMap<NodeId, AncestryNode>,
    next_id: NodeId,
    root: NodeId,
}

impl AncestryTree {
    /// Create a tree holding only the root, at the identity pose.
    pub fn new() -> Self {
        let root = AncestryNode {
            id: 0,
            pose: Pose2D::identity(),
            parent: None,
            children: 0,
            leaf: false,
            modified_cells: Vec::new(),
        };
        let mut nodes = HashMap::new();
        nodes.insert(0, root);
        Self {
            nodes,
            next_id: 1,
            root: 0,
        }
    }

    /// Id of the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Attach a new leaf under `parent` and return its id.
    ///
    /// The parent stops being a leaf: it now survives through its
    /// descendants, not as a particle of its own.
    pub fn spawn(&mut self, parent: NodeId, pose: Pose2D) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;

        let parent_node = self
            .nodes
            .get_mut(&parent)
            .expect("spawn under a node that is not in the tree");
        parent_node.children += 1;
        parent_node.leaf = false;

        self.nodes.insert(
            id,
            AncestryNode {
                id,
                pose,
                parent: Some(parent),
                children: 0,
                leaf: true,
                modified_cells: Vec::new(),
            },
        );
        id
    }

    /// Node by id.
    pub fn get(&self, id: NodeId) -> Option<&AncestryNode> {
        self.nodes.get(&id)
    }

    /// Pose of a live node.
    #[inline]
    pub fn pose(&self, id: NodeId) -> Pose2D {
        self.nodes[&id].pose
    }

    /// Mark or unmark a node as a current particle.
    pub fn set_leaf(&mut self, id: NodeId, leaf: bool) {
        self.nodes.get_mut(&id).expect("unknown node id").leaf = leaf;
    }

    /// Record that `id` owns the map entry at `(cx, cy)`.
    pub fn add_cell(&mut self, id: NodeId, cx: i32, cy: i32) {
        self.nodes
            .get_mut(&id)
            .expect("unknown node id")
            .modified_cells
            .push((cx, cy));
    }

    /// Whether the arena holds a node with this id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes, root included; never zero.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Ids of all live nodes, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Ancestry walk from `id` (inclusive) up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Prune and compact the lineage of `id` after a resampling round.
    ///
    /// Walks from `id` toward the root applying two rules until neither
    /// fires:
    ///
    /// - a node that is not a particle and has no children is a dead
    ///   branch: its map entries are erased and the node removed;
    /// - a node whose parent (other than the root) has no other child
    ///   absorbs that parent: the node's map entries are re-keyed to the
    ///   parent's id, the modified-cell lists are concatenated, and the
    ///   node takes over the parent's id and parent link.
    ///
    /// Returns the id now carrying the lineage of `id`, or `None` when
    /// `id` itself was a dead branch. Callers holding the old id must
    /// re-key: a fold gives the surviving node its parent's id.
    pub fn trim(&mut self, id: NodeId, map: &mut DistributedMap) -> Option<NodeId> {
        let mut kept = Some(id);
        let mut current = id;

        loop {
            let node = &self.nodes[&current];
            let Some(parent_id) = node.parent else {
                // Reached the root; it is never pruned.
                return kept;
            };

            if !node.leaf && node.children == 0 {
                // Dead branch: no particle will ever read through it.
                let node = self.nodes.remove(&current).expect("node vanished mid-trim");
                for &(cx, cy) in &node.modified_cells {
                    map.erase(cx, cy, node.id);
                }
                self.nodes
                    .get_mut(&parent_id)
                    .expect("parent vanished mid-trim")
                    .children -= 1;
                if kept == Some(current) {
                    kept = None;
                }
                current = parent_id;
                continue;
            }

            if parent_id == self.root {
                return kept;
            }

            if self.nodes[&parent_id].children == 1 {
                // Only child: fold the parent in, inheriting its id.
                let parent = self.nodes.remove(&parent_id).expect("parent vanished mid-trim");
                let mut node = self.nodes.remove(&current).expect("node vanished mid-trim");

                for &(cx, cy) in &node.modified_cells {
                    map.rename(cx, cy, node.id, parent.id);
                }
                let mut cells = parent.modified_cells;
                cells.append(&mut node.modified_cells);
                node.modified_cells = cells;
                node.id = parent.id;
                node.parent = parent.parent;

                if kept == Some(current) {
                    kept = Some(parent.id);
                }
                current = parent.id;
                self.nodes.insert(parent.id, node);
                continue;
            }

            // Nothing to do here, but the walk above may still have
            // freed an ancestor.
            current = parent_id;
        }
    }
}

impl Default for AncestryTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's ancestry, from the node itself to the root.
pub struct Ancestors<'a> {
    tree: &'a AncestryTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.nodes.get(&id).and_then(|n| n.parent);
        Some(id)
    }
}
