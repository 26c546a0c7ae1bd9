//! Registry of in-process nodes and the delivery path between them.
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;
use std::time::Duration;

use bytes::Bytes;
use chordring_core::dht::Id;
use chordring_core::dht::IdSpace;
use chordring_core::dht::Node;
use chordring_core::dht::NodeService;
use chordring_core::error::ClientError;
use chordring_core::error::ClientResult;
use chordring_core::message::Message;
use chordring_core::message::Reply;
use chordring_core::ChordConfig;
use dashmap::DashMap;
use rand::distributions::Distribution;

use crate::client::LocalTransport;
use crate::error::Error;
use crate::error::Result;

/// A node service hosted by a [LocalNetwork].
pub type LocalService = NodeService<LocalTransport>;

/// Misbehaviour injected on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every request fails right away with [ClientError::ConnectionFailed].
    Unreachable,
    /// Requests are accepted but never answered.
    Silent,
    /// Replies are corrupted on the way back and fail to decode.
    Garbled,
}

/// Random delay added before each delivery, uniform in `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    /// Lower bound in milliseconds.
    pub min_ms: u64,
    /// Upper bound in milliseconds, excluded.
    pub max_ms: u64,
}

impl Latency {
    async fn delay(&self) {
        if self.max_ms <= self.min_ms {
            tokio::time::sleep(Duration::from_millis(self.min_ms)).await;
            return;
        }
        let range = rand::distributions::Uniform::new(self.min_ms, self.max_ms);
        let ms = range.sample(&mut rand::thread_rng());
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// One request handed to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Node that sent the request.
    pub origin: Node,
    /// Node the request was addressed to.
    pub target: Node,
    /// The request.
    pub message: Message,
}

pub(crate) struct Inner {
    config: ChordConfig,
    space: IdSpace,
    latency: Option<Latency>,
    nodes: DashMap<Id, Arc<LocalService>>,
    faults: DashMap<Id, Fault>,
    deliveries: Mutex<Vec<Delivery>>,
}

/// A set of nodes living in the same process.
///
/// Cloning is cheap and every clone sees the same nodes. Transports handed to the
/// hosted services only keep a weak reference, so dropping the last [LocalNetwork]
/// releases the nodes.
#[derive(Clone)]
pub struct LocalNetwork {
    inner: Arc<Inner>,
}

impl LocalNetwork {
    /// Create an empty network. Every node spawned on it uses `config`.
    pub fn new(config: ChordConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create an empty network that delays each delivery by a random `latency`.
    pub fn with_latency(config: ChordConfig, latency: Latency) -> Result<Self> {
        Self::build(config, Some(latency))
    }

    fn build(config: ChordConfig, latency: Option<Latency>) -> Result<Self> {
        let space = config.space()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                space,
                latency,
                nodes: DashMap::new(),
                faults: DashMap::new(),
                deliveries: Mutex::new(vec![]),
            }),
        })
    }

    /// Config shared by the nodes of this network.
    pub fn config(&self) -> &ChordConfig {
        &self.inner.config
    }

    /// Identifier space of this network.
    pub fn space(&self) -> IdSpace {
        self.inner.space
    }

    /// Identity of the node reachable at `address`.
    pub fn node_at(&self, address: &str) -> Node {
        Node::new(address, self.inner.space)
    }

    /// Transport for the node `origin`.
    pub fn transport(&self, origin: &Node) -> LocalTransport {
        LocalTransport::new(Arc::downgrade(&self.inner), origin.clone())
    }

    /// Register a service so other nodes can reach it.
    pub fn register(&self, service: Arc<LocalService>) -> Result<()> {
        match self.inner.nodes.entry(service.id()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(Error::NodeAlreadyRegistered(service.node().to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(service);
                Ok(())
            }
        }
    }

    /// Start the first node of a ring.
    pub fn spawn(&self, node: Node) -> Result<Arc<LocalService>> {
        let transport = self.transport(&node);
        let service = Arc::new(NodeService::new(
            node,
            self.inner.config.clone(),
            transport,
        )?);
        self.register(service.clone())?;
        tracing::info!("spawned {}", service.node());
        Ok(service)
    }

    /// Start the first node of a ring at `address`, its id derived from the address.
    pub fn spawn_node(&self, address: &str) -> Result<Arc<LocalService>> {
        self.spawn(self.node_at(address))
    }

    /// Start a node that joins the ring through `known`.
    pub async fn join(&self, node: Node, known: &Node) -> Result<Arc<LocalService>> {
        if self.inner.nodes.contains_key(&node.id()) {
            return Err(Error::NodeAlreadyRegistered(node.to_string()));
        }
        let transport = self.transport(&node);
        let service = Arc::new(
            NodeService::join_via(node, self.inner.config.clone(), transport, known).await?,
        );
        self.register(service.clone())?;
        Ok(service)
    }

    /// Start a node at `address` that joins the ring through `known`.
    pub async fn join_node(&self, address: &str, known: &Node) -> Result<Arc<LocalService>> {
        self.join(self.node_at(address), known).await
    }

    /// Remove a node without telling anyone, as if its process died.
    pub fn crash(&self, node: &Node) -> Result<Arc<LocalService>> {
        let (_, service) = self
            .inner
            .nodes
            .remove(&node.id())
            .ok_or_else(|| Error::NodeNotFound(node.to_string()))?;
        tracing::info!("crashed {}", node);
        Ok(service)
    }

    /// Service of the node with the given id.
    pub fn get(&self, id: Id) -> Option<Arc<LocalService>> {
        self.inner.nodes.get(&id).map(|s| s.value().clone())
    }

    /// All hosted services, sorted by id.
    pub fn services(&self) -> Vec<Arc<LocalService>> {
        let mut services: Vec<_> = self
            .inner
            .nodes
            .iter()
            .map(|s| s.value().clone())
            .collect();
        services.sort_by_key(|s| s.id());
        services
    }

    /// Number of hosted services.
    pub fn len(&self) -> usize {
        self.inner.nodes.len()
    }

    /// Whether the network hosts no services.
    pub fn is_empty(&self) -> bool {
        self.inner.nodes.is_empty()
    }

    /// Make `node` misbehave until [clear_fault](Self::clear_fault).
    pub fn set_fault(&self, node: &Node, fault: Fault) {
        tracing::info!("fault {:?} injected on {}", fault, node);
        self.inner.faults.insert(node.id(), fault);
    }

    /// Make `node` behave again.
    pub fn clear_fault(&self, node: &Node) {
        self.inner.faults.remove(&node.id());
    }

    /// Requests delivered so far, in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.inner.deliveries()
    }

    /// Forget recorded deliveries.
    pub fn clear_deliveries(&self) {
        if let Ok(mut deliveries) = self.inner.deliveries.lock() {
            deliveries.clear();
        }
    }
}

impl Inner {
    fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    fn record(&self, delivery: Delivery) {
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push(delivery);
        }
    }

    /// Hand `msg` to `target` and bring back its reply, both ways through bincode.
    pub(crate) async fn deliver(
        &self,
        origin: &Node,
        target: &Node,
        msg: Message,
    ) -> ClientResult<Reply> {
        let data = encode(&msg)?;
        self.record(Delivery {
            origin: origin.clone(),
            target: target.clone(),
            message: msg,
        });

        if let Some(latency) = self.latency {
            latency.delay().await;
        }

        let fault = self.faults.get(&target.id()).map(|f| *f.value());
        let service = self.nodes.get(&target.id()).map(|s| s.value().clone());
        let service = match (fault, service) {
            (Some(Fault::Unreachable), _) | (_, None) => {
                return Err(ClientError::ConnectionFailed(target.clone()));
            }
            (Some(Fault::Silent), _) => return std::future::pending().await,
            (_, Some(service)) => service,
        };

        let msg: Message = decode(&data)?;
        tracing::trace!("{} -> {}: {}", origin, target, msg.name());
        let reply = service.serve(msg).await;

        let mut data = encode(&reply)?;
        if fault == Some(Fault::Garbled) {
            data = garble(data);
        }
        decode(&data)
    }
}

/// Overwrite the enum tag so the payload no longer decodes.
fn garble(data: Bytes) -> Bytes {
    let mut raw = data.to_vec();
    raw.iter_mut().take(4).for_each(|b| *b = 0xff);
    Bytes::from(raw)
}

fn encode<T: serde::Serialize>(value: &T) -> ClientResult<Bytes> {
    bincode::serialize(value)
        .map(Bytes::from)
        .map_err(|e| ClientError::Unexpected(format!("failed to encode: {}", e)))
}

fn decode<T: serde::de::DeserializeOwned>(data: &[u8]) -> ClientResult<T> {
    bincode::deserialize(data)
        .map_err(|e| ClientError::Unexpected(format!("failed to decode: {}", e)))
}

/// Upgrade the weak handle of a transport, or fail like an unreachable peer.
pub(crate) fn upgrade(inner: &Weak<Inner>, target: &Node) -> ClientResult<Arc<Inner>> {
    inner
        .upgrade()
        .ok_or_else(|| ClientError::ConnectionFailed(target.clone()))
}
