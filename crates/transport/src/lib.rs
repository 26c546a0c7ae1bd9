#![warn(missing_docs)]
//! In-process transport for chordring.
//!
//! A [LocalNetwork] hosts any number of [NodeService](chordring_core::dht::NodeService)s
//! in one process. Nodes talk to each other through [LocalTransport], which encodes every
//! request and reply with bincode the way a wire transport would. Per-node [Fault]s and
//! an optional random [Latency] let tests and simulations exercise failure handling, and
//! every delivery is recorded for hop analysis.
pub mod client;
pub mod error;
pub mod network;

pub use client::LocalClient;
pub use client::LocalTransport;
pub use network::Delivery;
pub use network::Fault;
pub use network::Latency;
pub use network::LocalNetwork;
pub use network::LocalService;
