//! Messages exchanged between nodes.
//!
//! A transport serializes a [Message], hands it to
//! [NodeService::serve](crate::dht::NodeService::serve) on the receiving side and carries
//! the [Reply] back. The `into_*` helpers turn a reply into the result expected by the
//! matching [RemoteNode](crate::dht::RemoteNode) method.
#![warn(missing_docs)]
use serde::Deserialize;
use serde::Serialize;

use crate::dht::Id;
use crate::dht::Node;
use crate::error::ClientError;
use crate::error::ClientResult;

/// Requests a node can receive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Find the successor of `id`, forwarding through the ring if needed.
    FindSuccessor(Id),
    /// Ask for the current successor.
    QuerySuccessor,
    /// Ask for the current predecessor.
    QueryPredecessor,
    /// The node thinks it might be the predecessor of the receiver.
    NotifyPredecessor(Node),
    /// Liveness probe.
    Ping,
}

/// Answers to a [Message].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Answer of [Message::FindSuccessor].
    FoundSuccessor(Node),
    /// Answer of [Message::QuerySuccessor].
    Successor(Node),
    /// Answer of [Message::QueryPredecessor].
    Predecessor(Option<Node>),
    /// Answer of [Message::NotifyPredecessor].
    Notified,
    /// Answer of [Message::Ping].
    Pong,
    /// The request failed on the receiver or further down the ring.
    Failed(ClientError),
}

impl Message {
    /// Name of the message, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FindSuccessor(_) => "FindSuccessor",
            Self::QuerySuccessor => "QuerySuccessor",
            Self::QueryPredecessor => "QueryPredecessor",
            Self::NotifyPredecessor(_) => "NotifyPredecessor",
            Self::Ping => "Ping",
        }
    }
}

fn unexpected(expected: &str, got: Reply) -> ClientError {
    ClientError::Unexpected(format!("expected {expected} reply, got {got:?}"))
}

impl Reply {
    /// Decode the answer of [Message::FindSuccessor].
    pub fn into_found_successor(self) -> ClientResult<Node> {
        match self {
            Self::FoundSuccessor(node) => Ok(node),
            Self::Failed(e) => Err(e),
            other => Err(unexpected("FoundSuccessor", other)),
        }
    }

    /// Decode the answer of [Message::QuerySuccessor].
    pub fn into_successor(self) -> ClientResult<Node> {
        match self {
            Self::Successor(node) => Ok(node),
            Self::Failed(e) => Err(e),
            other => Err(unexpected("Successor", other)),
        }
    }

    /// Decode the answer of [Message::QueryPredecessor].
    pub fn into_predecessor(self) -> ClientResult<Option<Node>> {
        match self {
            Self::Predecessor(node) => Ok(node),
            Self::Failed(e) => Err(e),
            other => Err(unexpected("Predecessor", other)),
        }
    }

    /// Decode the answer of [Message::NotifyPredecessor].
    pub fn into_notified(self) -> ClientResult<()> {
        match self {
            Self::Notified => Ok(()),
            Self::Failed(e) => Err(e),
            other => Err(unexpected("Notified", other)),
        }
    }

    /// Decode the answer of [Message::Ping].
    pub fn into_pong(self) -> ClientResult<()> {
        match self {
            Self::Pong => Ok(()),
            Self::Failed(e) => Err(e),
            other => Err(unexpected("Pong", other)),
        }
    }
}
