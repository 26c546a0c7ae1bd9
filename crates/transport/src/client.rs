//! [Transport] and [RemoteNode] over a [LocalNetwork](crate::LocalNetwork).
use std::sync::Weak;

use async_trait::async_trait;
use chordring_core::dht::Id;
use chordring_core::dht::Node;
use chordring_core::dht::RemoteNode;
use chordring_core::dht::Transport;
use chordring_core::error::ClientResult;
use chordring_core::message::Message;
use chordring_core::message::Reply;

use crate::network::upgrade;
use crate::network::Inner;

/// Transport of one node of a [LocalNetwork](crate::LocalNetwork).
#[derive(Clone)]
pub struct LocalTransport {
    network: Weak<Inner>,
    origin: Node,
}

/// Client from the owner of a [LocalTransport] to one target node.
pub struct LocalClient {
    network: Weak<Inner>,
    origin: Node,
    target: Node,
}

impl LocalTransport {
    pub(crate) fn new(network: Weak<Inner>, origin: Node) -> Self {
        Self { network, origin }
    }

    /// Node owning this transport.
    pub fn origin(&self) -> &Node {
        &self.origin
    }
}

impl Transport for LocalTransport {
    type Client = LocalClient;

    fn client(&self, node: &Node) -> LocalClient {
        LocalClient {
            network: self.network.clone(),
            origin: self.origin.clone(),
            target: node.clone(),
        }
    }
}

impl LocalClient {
    async fn call(&self, msg: Message) -> ClientResult<Reply> {
        let network = upgrade(&self.network, &self.target)?;
        network.deliver(&self.origin, &self.target, msg).await
    }
}

#[async_trait]
impl RemoteNode for LocalClient {
    async fn find_successor(&self, id: Id) -> ClientResult<Node> {
        self.call(Message::FindSuccessor(id))
            .await?
            .into_found_successor()
    }

    async fn successor(&self) -> ClientResult<Node> {
        self.call(Message::QuerySuccessor).await?.into_successor()
    }

    async fn predecessor(&self) -> ClientResult<Option<Node>> {
        self.call(Message::QueryPredecessor).await?.into_predecessor()
    }

    async fn notify(&self, candidate: Node) -> ClientResult<()> {
        self.call(Message::NotifyPredecessor(candidate))
            .await?
            .into_notified()
    }

    async fn ping(&self) -> ClientResult<()> {
        self.call(Message::Ping).await?.into_pong()
    }
}
