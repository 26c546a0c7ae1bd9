//! Error of chordring_core

use serde::Deserialize;
use serde::Serialize;

use crate::dht::Node;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in chordring-core.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Identifier bit width must be within 1..=128, got {0}")]
    InvalidIdBits(u8),

    #[error("Invalid hexadecimal identifier: {0}")]
    BadIdFormat(String),

    #[error("Finger index {0} out of range")]
    FingerIndexOutOfRange(usize),

    #[error("Failed on acquiring node store lock")]
    StoreLockError,

    #[error("Remote node error: {0}")]
    Client(#[from] ClientError),
}

impl Error {
    /// Returns `true` if the error was caused by an unreachable or timed out peer.
    pub fn is_connection_failed(&self) -> bool {
        matches!(self, Self::Client(ClientError::ConnectionFailed(_)))
    }
}

/// Result of a call through a [RemoteNode](crate::dht::RemoteNode).
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failure of a remote call.
///
/// The enum is serializable so that a failure observed several hops away can travel
/// back to the node that started the lookup without losing its kind.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientError {
    /// Peer unreachable, or it did not answer before the deadline.
    #[error("Connection to {0} failed")]
    ConnectionFailed(Node),

    /// Any other failure, including malformed or out-of-contract replies.
    #[error("Unexpected remote failure: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// Returns `true` for [ClientError::ConnectionFailed].
    pub fn is_connection_failed(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}
