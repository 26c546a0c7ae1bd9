//! Mutable topology state of a single node.
use super::finger::FingerTable;
use super::id::IdSpace;
use super::node::Node;

/// Predecessor and finger table of a node.
///
/// The store is owned by exactly one [NodeService](super::NodeService), which keeps it
/// behind a lock and never holds that lock while talking to other nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStore {
    predecessor: Option<Node>,
    finger: FingerTable,
}

impl NodeStore {
    /// Store of the first node of a ring: every finger points to the node itself.
    pub fn bootstrap(space: IdSpace, node: &Node) -> Self {
        Self::with_successor(space, node, node.clone())
    }

    /// Store of a node that learned its successor from a known node.
    pub fn with_successor(space: IdSpace, node: &Node, successor: Node) -> Self {
        Self {
            predecessor: None,
            finger: FingerTable::new(space, node.id(), successor),
        }
    }

    /// Current predecessor, if known.
    pub fn predecessor(&self) -> Option<&Node> {
        self.predecessor.as_ref()
    }

    /// Replace the predecessor.
    pub fn set_predecessor(&mut self, node: Node) {
        self.predecessor = Some(node);
    }

    /// Forget the predecessor, returning the old one.
    pub fn clear_predecessor(&mut self) -> Option<Node> {
        self.predecessor.take()
    }

    /// Successor, i.e. node of finger 0.
    pub fn successor(&self) -> &Node {
        self.finger.successor()
    }

    /// Point finger 0 to `node`.
    pub fn set_successor(&mut self, node: Node) {
        self.finger.set_successor(node)
    }

    /// Finger table of the node.
    pub fn finger(&self) -> &FingerTable {
        &self.finger
    }

    /// Mutable finger table, used by finger refresh.
    pub fn finger_mut(&mut self) -> &mut FingerTable {
        &mut self.finger
    }
}
