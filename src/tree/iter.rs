//! Tree traversal

use super::{NodeId, RecordTree};

/// Depth-first, parent before children, siblings in order
pub struct PreOrder<'a> {
    tree: &'a RecordTree,
    stack: Vec<NodeId>,
}

impl<'a> PreOrder<'a> {
    pub(super) fn new(tree: &'a RecordTree) -> Self {
        Self {
            tree,
            stack: tree.roots().iter().rev().copied().collect(),
        }
    }
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree[id].children.iter().rev().copied());
        Some(id)
    }
}

/// Walks parent links towards the top of the tree
pub struct Ancestors<'a> {
    tree: &'a RecordTree,
    next: Option<NodeId>,
}

impl<'a> Ancestors<'a> {
    pub(super) fn new(tree: &'a RecordTree, start: Option<NodeId>) -> Self {
        Self { tree, next: start }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree[id].parent;
        Some(id)
    }
}
