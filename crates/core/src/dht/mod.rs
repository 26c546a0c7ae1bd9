#![warn(missing_docs)]
//! Chord distributed hash table.
//! ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! With high probability, the number of nodes that must be contacted to find a successor in an N-node network is O(log N).

/// Capabilities a node needs from its peers
pub mod client;
/// Finger table of a node
pub mod finger;
pub mod id;
pub mod node;
mod service;
mod stabilization;
pub mod store;

pub use client::with_timeout;
pub use client::RemoteNode;
pub use client::TimedClient;
pub use client::Transport;
pub use finger::Finger;
pub use finger::FingerTable;
pub use id::between;
pub use id::Id;
pub use id::IdSpace;
pub use node::Node;
pub use service::NodeService;
pub use stabilization::Stabilizer;
pub use store::NodeStore;
