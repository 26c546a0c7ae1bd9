//! Lookup and maintenance of a single chord node.
#![warn(missing_docs)]
use std::sync::Mutex;
use std::sync::MutexGuard;

use super::client::RemoteNode;
use super::client::TimedClient;
use super::client::Transport;
use super::id::Id;
use super::id::IdSpace;
use super::node::Node;
use super::store::NodeStore;
use crate::config::ChordConfig;
use crate::config::FixFingers;
use crate::error::ClientError;
use crate::error::Error;
use crate::error::Result;
use crate::message::Message;
use crate::message::Reply;

/// NodeService runs the Chord protocol for one node.
///
/// It owns the [NodeStore] of the node and reaches other nodes through the
/// [Transport] it was built with. Lookups and inbound requests only take the store lock
/// for short, non-blocking sections. [join](Self::join) and the three periodic routines
/// ([stabilize](Self::stabilize), [fix_fingers](Self::fix_fingers) and
/// [check_predecessor](Self::check_predecessor)) are additionally serialized by a
/// maintenance lock, so they never interleave on the same node.
pub struct NodeService<T> {
    node: Node,
    space: IdSpace,
    config: ChordConfig,
    store: Mutex<NodeStore>,
    maintenance: futures::lock::Mutex<()>,
    transport: T,
}

impl<T> NodeService<T>
where T: Transport
{
    fn with_store(node: Node, config: ChordConfig, transport: T, store: NodeStore) -> Result<Self> {
        Ok(Self {
            space: config.space()?,
            node,
            config,
            store: Mutex::new(store),
            maintenance: futures::lock::Mutex::new(()),
            transport,
        })
    }

    /// Create the first node of a ring. The node is its own successor.
    pub fn new(node: Node, config: ChordConfig, transport: T) -> Result<Self> {
        let store = NodeStore::bootstrap(config.space()?, &node);
        Self::with_store(node, config, transport, store)
    }

    /// Create a node that enters the ring through `known`.
    ///
    /// `known` is asked for the successor of the new node, and every finger starts out
    /// pointing to that successor. No other node learns about the new node until it
    /// stabilizes.
    pub async fn join_via(
        node: Node,
        config: ChordConfig,
        transport: T,
        known: &Node,
    ) -> Result<Self> {
        let space = config.space()?;
        let client = TimedClient::new(transport.client(known), known.clone(), config.rpc_timeout());
        let successor = client.find_successor(node.id()).await?;
        tracing::info!("{} joined ring via {}, successor: {}", node, known, successor);
        let store = NodeStore::with_successor(space, &node, successor);
        Self::with_store(node, config, transport, store)
    }

    /// Identity of this node.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Position of this node on the ring.
    pub fn id(&self) -> Id {
        self.node.id()
    }

    /// Identifier space this node lives in.
    pub fn space(&self) -> IdSpace {
        self.space
    }

    /// Config this node was built with.
    pub fn config(&self) -> &ChordConfig {
        &self.config
    }

    /// Lock and return MutexGuard of the node store.
    pub fn lock_store(&self) -> Result<MutexGuard<'_, NodeStore>> {
        self.store.lock().map_err(|_| Error::StoreLockError)
    }

    /// Client of `node`, every call bounded by the configured rpc timeout.
    pub fn remote(&self, node: &Node) -> TimedClient<T::Client> {
        TimedClient::new(
            self.transport.client(node),
            node.clone(),
            self.config.rpc_timeout(),
        )
    }

    /// Current successor, the node of finger 0.
    pub fn successor(&self) -> Result<Node> {
        Ok(self.lock_store()?.successor().clone())
    }

    /// Current predecessor.
    pub fn predecessor(&self) -> Result<Option<Node>> {
        Ok(self.lock_store()?.predecessor().cloned())
    }

    /// Local answer to a liveness probe.
    pub fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Finger of this node that gets closest to `id` without passing it.
    /// See [FingerTable::closest_preceding_node](super::FingerTable::closest_preceding_node).
    pub fn closest_preceding_node(&self, id: Id) -> Result<Node> {
        Ok(self.lock_store()?.finger().closest_preceding_node(id))
    }

    /// Find the node responsible for `id`.
    ///
    /// If `id` falls in (self, successor] the successor owns it. Otherwise the request is
    /// forwarded to the closest preceding finger, which continues the lookup and whose
    /// answer is returned unchanged. A failed hop fails the whole lookup.
    pub async fn find_successor(&self, id: Id) -> Result<Node> {
        let next = {
            let store = self.lock_store()?;
            let successor = store.successor();
            if id.is_between(self.id(), successor.id()) {
                tracing::debug!(
                    "find_successor: self: {}, id: {}, successor: {}",
                    self.node,
                    id,
                    successor
                );
                return Ok(successor.clone());
            }
            store.finger().closest_preceding_node(id)
        };

        tracing::debug!(
            "find_successor: self: {}, id: {}, forward to: {}",
            self.node,
            id,
            next
        );
        Ok(self.remote(&next).find_successor(id).await?)
    }

    /// Join a ring containing `known`.
    ///
    /// Drops the predecessor and takes the successor of this node's id, as found by
    /// `known`, as new successor. Other fingers are left for
    /// [fix_fingers](Self::fix_fingers).
    pub async fn join(&self, known: &Node) -> Result<()> {
        let _guard = self.maintenance.lock().await;
        let successor = self.remote(known).find_successor(self.id()).await?;
        let mut store = self.lock_store()?;
        store.clear_predecessor();
        tracing::info!("{} joined ring via {}, successor: {}", self.node, known, successor);
        store.set_successor(successor);
        Ok(())
    }

    /// Handle notification from a node that thinks it is the predecessor of this node.
    ///
    /// The candidate is accepted when there is no predecessor, or when it sits strictly
    /// between the current predecessor and this node. Returns whether it was accepted.
    pub fn notify(&self, candidate: Node) -> Result<bool> {
        let mut store = self.lock_store()?;
        let accept = match store.predecessor() {
            None => true,
            Some(predecessor) => candidate
                .id()
                .is_strictly_between(predecessor.id(), self.id()),
        };
        if accept {
            tracing::info!("{} set predecessor: {}", self.node, candidate);
            store.set_predecessor(candidate);
        }
        Ok(accept)
    }

    /// Stabilize operation.
    ///
    /// Asks the successor for its predecessor `x`. If `x` sits in (self, successor] it
    /// becomes the new successor. The (possibly new) successor is then notified of this
    /// node.
    pub async fn stabilize(&self) -> Result<()> {
        let _guard = self.maintenance.lock().await;
        let successor = self.successor()?;
        let candidate = self.remote(&successor).predecessor().await?;

        let successor = match candidate {
            Some(x) if x.id().is_between(self.id(), successor.id()) && x != successor => {
                let mut store = self.lock_store()?;
                tracing::info!("{} set successor: {} (was {})", self.node, x, successor);
                store.set_successor(x.clone());
                x
            }
            _ => successor,
        };

        self.remote(&successor).notify(self.node.clone()).await?;
        Ok(())
    }

    /// Refresh the finger table.
    ///
    /// With [FixFingers::Full] every finger is refreshed. A finger whose lookup fails
    /// keeps its old node, the remaining fingers are still refreshed and the first
    /// failure is returned. With [FixFingers::Incremental] one finger is refreshed per
    /// call, cycling through the table.
    pub async fn fix_fingers(&self) -> Result<()> {
        let _guard = self.maintenance.lock().await;
        match self.config.fix_fingers {
            FixFingers::Full => {
                let mut first_err = None;
                for index in 0..self.space.bits() as usize {
                    if let Err(e) = self.fix_finger(index).await {
                        tracing::warn!("{} failed on fix finger {}: {}", self.node, index, e);
                        first_err.get_or_insert(e);
                    }
                }
                first_err.map_or(Ok(()), Err)
            }
            FixFingers::Incremental => {
                let index = self.lock_store()?.finger_mut().next_fix_index();
                self.fix_finger(index).await
            }
        }
    }

    /// Look up the successor of the start of finger `index` and store it.
    /// The store is not locked while the lookup runs.
    async fn fix_finger(&self, index: usize) -> Result<()> {
        let start = self.space.finger_start(self.id(), index);
        let node = self.find_successor(start).await?;
        let mut store = self.lock_store()?;
        store.finger_mut().refresh(index, node)
    }

    /// Check the predecessor is still alive.
    ///
    /// Only a [ClientError::ConnectionFailed] from the ping clears the predecessor. Any
    /// other failure is returned and the predecessor is kept.
    pub async fn check_predecessor(&self) -> Result<()> {
        let _guard = self.maintenance.lock().await;
        let Some(predecessor) = self.predecessor()? else {
            return Ok(());
        };

        match self.remote(&predecessor).ping().await {
            Ok(()) => Ok(()),
            Err(ClientError::ConnectionFailed(_)) => {
                let mut store = self.lock_store()?;
                // A notify may have replaced it while the ping was in flight.
                if store.predecessor() == Some(&predecessor) {
                    tracing::info!("{} lost predecessor: {}", self.node, predecessor);
                    store.clear_predecessor();
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{} failed on ping predecessor {}: {}", self.node, predecessor, e);
                Err(e.into())
            }
        }
    }

    /// Answer a request from another node.
    pub async fn serve(&self, msg: Message) -> Reply {
        tracing::debug!("{} serving {}", self.node, msg.name());
        let foreign = match &msg {
            Message::FindSuccessor(id) => Some(*id),
            Message::NotifyPredecessor(node) => Some(node.id()),
            _ => None,
        };
        if let Some(id) = foreign.filter(|id| !self.space.contains(*id)) {
            tracing::warn!("{} rejected {}: {} is outside the ring", self.node, msg.name(), id);
            return Reply::Failed(ClientError::Unexpected(format!(
                "identifier {} outside a ring of {} bits",
                id,
                self.space.bits()
            )));
        }
        let ret = match msg {
            Message::FindSuccessor(id) => self.find_successor(id).await.map(Reply::FoundSuccessor),
            Message::QuerySuccessor => self.successor().map(Reply::Successor),
            Message::QueryPredecessor => self.predecessor().map(Reply::Predecessor),
            Message::NotifyPredecessor(node) => self.notify(node).map(|_| Reply::Notified),
            Message::Ping => self.ping().map(|_| Reply::Pong),
        };
        ret.unwrap_or_else(|e| match e {
            Error::Client(e) => Reply::Failed(e),
            other => Reply::Failed(ClientError::Unexpected(other.to_string())),
        })
    }
}
