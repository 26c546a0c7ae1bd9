#![warn(missing_docs)]
use derivative::Derivative;
use serde::Deserialize;
use serde::Serialize;

use super::id::Id;
use super::id::IdSpace;
use super::node::Node;
use crate::error::Error;
use crate::error::Result;

/// One routing entry: the first node believed to succeed `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finger {
    /// `(local id + 2^index) mod 2^m`, fixed at construction.
    pub start: Id,
    /// Current guess of `successor(start)`.
    pub node: Node,
}

/// Finger table of Chord DHT.
///
/// Holds exactly `m` fingers. Finger 0 always starts right after the local id, so its
/// node is the successor of the local node.
#[derive(Derivative, Clone, Debug)]
#[derivative(PartialEq)]
pub struct FingerTable {
    id: Id,
    fingers: Vec<Finger>,
    #[derivative(PartialEq = "ignore")]
    fix_finger_index: usize,
}

impl FingerTable {
    /// builder, every finger points to `successor`
    pub fn new(space: IdSpace, id: Id, successor: Node) -> Self {
        let fingers = (0..space.bits() as usize)
            .map(|index| Finger {
                start: space.finger_start(id, index),
                node: successor.clone(),
            })
            .collect();
        Self {
            id,
            fingers,
            fix_finger_index: 0,
        }
    }

    /// number of fingers, equals to the bit width of the ring
    pub fn len(&self) -> usize {
        self.fingers.len()
    }

    /// A table always has at least one finger.
    pub fn is_empty(&self) -> bool {
        self.fingers.is_empty()
    }

    /// getter
    pub fn get(&self, index: usize) -> Option<&Finger> {
        self.fingers.get(index)
    }

    /// Node of finger 0.
    pub fn successor(&self) -> &Node {
        &self.fingers[0].node
    }

    /// Replace the node of finger 0.
    pub fn set_successor(&mut self, node: Node) {
        self.fingers[0].node = node;
    }

    /// Replace the node of finger `index`, its start is left untouched.
    pub fn refresh(&mut self, index: usize, node: Node) -> Result<()> {
        let Some(finger) = self.fingers.get_mut(index) else {
            tracing::error!("refresh finger index out of range, index: {}", index);
            return Err(Error::FingerIndexOutOfRange(index));
        };
        if finger.node != node {
            tracing::debug!("refresh finger table index: {} node: {}", index, node);
        }
        finger.node = node;
        Ok(())
    }

    /// Point every finger to `node`.
    pub fn reset(&mut self, node: Node) {
        for finger in self.fingers.iter_mut() {
            finger.node = node.clone();
        }
    }

    /// get finger list
    pub fn list(&self) -> &[Finger] {
        &self.fingers
    }

    /// Check finger is contains some node
    pub fn contains(&self, node: &Node) -> bool {
        self.fingers.iter().any(|f| &f.node == node)
    }

    /// Get the finger that gets closest to `id` without passing it.
    ///
    /// If `id` is numerically below the local id the lookup has to cross zero, and the
    /// farthest finger is taken directly as long as it does not pass `id`.
    /// Otherwise fingers are scanned from the farthest one, taking the first whose node
    /// lies in (local id, `id`). Falls back to the successor.
    pub fn closest_preceding_node(&self, id: Id) -> Node {
        if id < self.id {
            if let Some(last) = self.fingers.last() {
                if last.node.id().is_strictly_between(self.id, id) {
                    return last.node.clone();
                }
            }
        }

        for finger in self.fingers.iter().rev() {
            if finger.node.id().is_strictly_between(self.id, id) {
                return finger.node.clone();
            }
        }

        self.successor().clone()
    }

    /// Index of the finger to refresh next, advancing the cursor.
    pub fn next_fix_index(&mut self) -> usize {
        let index = self.fix_finger_index;
        self.fix_finger_index = (index + 1) % self.fingers.len();
        index
    }
}
