//! Directory record tree
//!
//! Records form a forest under an implicit root (the directory file
//! itself). Nodes live in an arena and refer to each other by [`NodeId`];
//! removing a node invalidates its slot and ids are never reused.
//!
//! ```text
//! roots: [PT0]────────────────────────┐
//!          │                          │
//!          ├── ST0 ── SE0 ── IM0      │ next sibling (0004,1400)
//!          │            └─── IM1      │ first child  (0004,1420)
//!          └── ST1 ── SE0 ── IM0      ▼
//!        [HG0]  (single-level leaf)
//! ```
//!
//! A branch has children and no instance, a leaf has an instance and no
//! children.

mod iter;
mod node;

use std::ops::{Index, IndexMut};

pub use iter::{Ancestors, PreOrder};
pub use node::{RecordChain, RecordNode, RECORD_IN_USE};

use crate::error::{FileSetError, Result};
use crate::file_id::{self, Alphabet};

/// Stable handle to a node in a [`RecordTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Arena of directory records
#[derive(Debug, Clone, Default)]
pub struct RecordTree {
    nodes: Vec<Option<RecordNode>>,
    /// Root-level records in order
    roots: Vec<NodeId>,
}

impl RecordTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&RecordNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut RecordNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Children of `parent`, or the root-level records for `None`
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(id) => &self[id].children,
            None => &self.roots,
        }
    }

    fn children_of_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(id) => &mut self[id].children,
            None => &mut self.roots,
        }
    }

    /// Child of `parent` with the given key
    pub fn child_by_key(&self, parent: Option<NodeId>, key: &str) -> Option<NodeId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&id| self[id].key() == key)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append `node` as the last child of `parent`
    pub fn attach(&mut self, parent: Option<NodeId>, mut node: RecordNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(Some(node));
        self.children_of_mut(parent).push(id);
        id
    }

    /// Splice a chain into the tree and return the id of its leaf
    ///
    /// Walks down from the top matching each chain node against existing
    /// siblings by key. Matching branches are reused; the first node
    /// without a match and everything below it is attached as new. The
    /// leaf itself is always attached.
    pub fn add(&mut self, chain: RecordChain) -> NodeId {
        let (ancestors, leaf) = chain.into_parts();

        let mut parent = None;
        let mut diverged = false;
        for node in ancestors {
            if !diverged {
                let existing = self
                    .child_by_key(parent, node.key())
                    .filter(|&id| !self[id].has_instance());
                if let Some(id) = existing {
                    parent = Some(id);
                    continue;
                }
                diverged = true;
            }
            parent = Some(self.attach(parent, node));
        }
        self.attach(parent, leaf)
    }

    /// Remove a leaf, then every ancestor left without children
    pub fn remove(&mut self, id: NodeId) -> Result<RecordNode> {
        let node = self.get(id).ok_or_else(|| {
            FileSetError::Structural(format!("node {:?} is not in the tree", id))
        })?;
        if !node.children.is_empty() {
            return Err(FileSetError::Structural(format!(
                "only leaves can be removed, the {} record '{}' has {} children",
                node.record_type(),
                node.key(),
                node.children.len()
            )));
        }

        let parent = node.parent;
        self.children_of_mut(parent).retain(|&child| child != id);
        let removed = self.nodes[id.0].take();

        if let Some(parent) = parent {
            if self[parent].children.is_empty() {
                self.remove(parent)?;
            }
        }

        removed.ok_or_else(|| FileSetError::Structural(format!("node {:?} vanished", id)))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Nodes sharing `id`'s parent, `id` included
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        self.children_of(self[id].parent)
    }

    /// Position of `id` among its siblings
    pub fn index(&self, id: NodeId) -> usize {
        self.siblings(id)
            .iter()
            .position(|&sibling| sibling == id)
            .unwrap_or(0)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.siblings(id).get(self.index(id) + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.index(id);
        index
            .checked_sub(1)
            .and_then(|previous| self.siblings(id).get(previous).copied())
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors::new(self, self[id].parent)
    }

    /// `id` followed by its ancestors
    pub fn reverse(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors::new(self, Some(id))
    }

    /// The root-level record above `id`
    pub fn top(&self, id: NodeId) -> NodeId {
        self.reverse(id).last().unwrap_or(id)
    }

    /// Number of ancestors; root-level records are at depth 0
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Pre-order traversal of every node
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder::new(self)
    }

    /// Leaves carrying an instance, in tree order
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(|&id| self[id].has_instance())
    }

    // =========================================================================
    // File IDs
    // =========================================================================

    /// This node's File ID component
    pub fn component(&self, id: NodeId, alphabet: Alphabet) -> Result<String> {
        let prefix = self[id].record_type().prefix_at(self.depth(id));
        file_id::component(&prefix, self.index(id) as u64, alphabet)
    }

    /// Components from the top of the tree down to `id`
    pub fn file_id(&self, id: NodeId, alphabet: Alphabet) -> Result<Vec<String>> {
        let mut components = self
            .reverse(id)
            .map(|node| self.component(node, alphabet))
            .collect::<Result<Vec<_>>>()?;
        components.reverse();
        Ok(components)
    }

    /// File IDs of every leaf with an instance, in tree order
    pub fn leaf_file_ids(&self, alphabet: Alphabet) -> Result<Vec<(NodeId, Vec<String>)>> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect_file_ids(None, &mut path, alphabet, &mut out)?;
        Ok(out)
    }

    fn collect_file_ids(
        &self,
        parent: Option<NodeId>,
        path: &mut Vec<String>,
        alphabet: Alphabet,
        out: &mut Vec<(NodeId, Vec<String>)>,
    ) -> Result<()> {
        let depth = path.len();
        for (index, &id) in self.children_of(parent).iter().enumerate() {
            let node = &self[id];
            let prefix = node.record_type().prefix_at(depth);
            path.push(file_id::component(&prefix, index as u64, alphabet)?);
            if node.has_instance() {
                out.push((id, path.clone()));
            }
            self.collect_file_ids(Some(id), path, alphabet, out)?;
            path.pop();
        }
        Ok(())
    }
}

impl Index<NodeId> for RecordTree {
    type Output = RecordNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node id {:?}", id),
        }
    }
}

impl IndexMut<NodeId> for RecordTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale node id {:?}", id),
        }
    }
}
