//! Core of a Chord ring: identifier arithmetic, routing state and the protocol
//! operations a node runs against its peers.
pub mod config;
pub mod consts;
pub mod dht;
pub mod error;
pub mod inspect;
pub mod message;

pub use config::ChordConfig;
pub use config::FixFingers;
pub use error::ClientError;
pub use error::Error;
pub use error::Result;
