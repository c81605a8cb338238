/// Render context: the record of which nodes have already been produced.
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

use crate::core::node::Node;

/// Identity of a node as recorded in a [`Ctx`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Memo set of node identities produced so far.
///
/// A fresh `Ctx` is created per render call unless the caller threads one
/// across calls, which is how "already mentioned" state carries from one
/// sentence to the next. Keys are kept in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct Ctx {
    seen: IndexSet<NodeKey, FxBuildHasher>,
}

impl Ctx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `node` (or any node with the same identity) has
    /// been rendered against this context.
    pub fn contains(&self, node: &Node) -> bool {
        self.seen.contains(&node.key())
    }

    pub fn contains_key(&self, key: NodeKey) -> bool {
        self.seen.contains(&key)
    }

    /// Record `node`. Returns false if it was already present.
    pub fn add(&mut self, node: &Node) -> bool {
        self.seen.insert(node.key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Recorded keys, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.seen.iter().copied()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}
