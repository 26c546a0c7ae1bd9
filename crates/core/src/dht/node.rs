//! Identity of a ring participant.
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

use super::id::Id;
use super::id::IdSpace;

/// A participant of the ring: its identifier and the endpoint it can be reached at.
///
/// Equality, ordering and hashing only look at [Node::id]. A `Node` held by another
/// node is a snapshot, the participant behind it may already be gone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    id: Id,
    address: String,
}

impl Node {
    /// Create a node whose id is the hash of its address.
    pub fn new(address: impl Into<String>, space: IdSpace) -> Self {
        let address = address.into();
        Self {
            id: space.hash(&address),
            address,
        }
    }

    /// Create a node placed at a known position of the ring.
    pub fn with_id(id: Id, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
        }
    }

    /// Position of the node on the ring.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Endpoint of the node.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}
