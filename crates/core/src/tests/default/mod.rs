use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::ChordConfig;
use crate::dht::Id;
use crate::dht::Node;
use crate::dht::NodeService;
use crate::dht::RemoteNode;
use crate::dht::Transport;
use crate::error::ClientError;
use crate::error::ClientResult;
use crate::message::Message;
use crate::message::Reply;

mod test_service;
mod test_stabilization;

/// How a mocked node misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFault {
    Down,
    Broken,
    Silent,
}

#[derive(Default)]
struct Registry {
    nodes: HashMap<Id, Arc<NodeService<MockTransport>>>,
    faults: HashMap<Id, MockFault>,
    calls: Vec<(Id, &'static str)>,
}

/// Transport dispatching straight into the [NodeService::serve] of registered nodes.
#[derive(Clone, Default)]
pub struct MockTransport {
    registry: Arc<Mutex<Registry>>,
}

pub struct MockClient {
    transport: MockTransport,
    target: Node,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, service: Arc<NodeService<MockTransport>>) {
        let mut registry = self.registry.lock().unwrap();
        registry.nodes.insert(service.id(), service);
    }

    /// Bootstrap a node with the given id as the first node of a ring.
    pub fn spawn(&self, config: &ChordConfig, id: u32) -> Arc<NodeService<MockTransport>> {
        let service =
            Arc::new(NodeService::new(node(id), config.clone(), self.clone()).unwrap());
        self.register(service.clone());
        service
    }

    /// Create a node with the given id through `known` and register it.
    pub async fn join(
        &self,
        config: &ChordConfig,
        id: u32,
        known: &Node,
    ) -> Arc<NodeService<MockTransport>> {
        let service = Arc::new(
            NodeService::join_via(node(id), config.clone(), self.clone(), known)
                .await
                .unwrap(),
        );
        self.register(service.clone());
        service
    }

    pub fn set_fault(&self, node: &Node, fault: MockFault) {
        let mut registry = self.registry.lock().unwrap();
        registry.faults.insert(node.id(), fault);
    }

    pub fn clear_fault(&self, node: &Node) {
        let mut registry = self.registry.lock().unwrap();
        registry.faults.remove(&node.id());
    }

    /// Targets and message names of all calls so far, in order.
    pub fn calls(&self) -> Vec<(Id, &'static str)> {
        self.registry.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.registry.lock().unwrap().calls.clear();
    }
}

impl Transport for MockTransport {
    type Client = MockClient;

    fn client(&self, node: &Node) -> MockClient {
        MockClient {
            transport: self.clone(),
            target: node.clone(),
        }
    }
}

impl MockClient {
    async fn call(&self, msg: Message) -> ClientResult<Reply> {
        let (service, fault) = {
            let mut registry = self.transport.registry.lock().unwrap();
            registry.calls.push((self.target.id(), msg.name()));
            (
                registry.nodes.get(&self.target.id()).cloned(),
                registry.faults.get(&self.target.id()).copied(),
            )
        };

        match (service, fault) {
            (_, Some(MockFault::Silent)) => futures::future::pending().await,
            (_, Some(MockFault::Broken)) => {
                Err(ClientError::Unexpected("broken pipe".to_string()))
            }
            (None, _) | (_, Some(MockFault::Down)) => {
                Err(ClientError::ConnectionFailed(self.target.clone()))
            }
            (Some(service), None) => Ok(service.serve(msg).await),
        }
    }
}

#[async_trait]
impl RemoteNode for MockClient {
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

pub fn node(id: u32) -> Node {
    Node::with_id(Id::from(id), format!("mock://n{}", id))
}

/// Config of a 6 bit ring with a short rpc timeout.
pub fn small_ring_config() -> ChordConfig {
    ChordConfig::new(6).rpc_timeout_ms(200)
}

/// Run stabilize on every node in order, `rounds` times.
pub async fn stabilize_all(services: &[Arc<NodeService<MockTransport>>], rounds: usize) {
    for _ in 0..rounds {
        for service in services {
            service.stabilize().await.unwrap();
        }
    }
}

pub async fn fix_fingers_all(services: &[Arc<NodeService<MockTransport>>]) {
    for service in services {
        service.fix_fingers().await.unwrap();
    }
}

/// Ring [1, 18, 25, 40, 58] on 6 bits, built by sequential joins through N1,
/// stabilized and with converged finger tables.
pub async fn gen_ring(transport: &MockTransport) -> Vec<Arc<NodeService<MockTransport>>> {
    super::setup_tracing();
    let config = small_ring_config();
    let first = transport.spawn(&config, 1);
    let mut services = vec![first.clone()];
    for id in [18, 25, 40, 58] {
        let service = transport.join(&config, id, first.node()).await;
        services.push(service);
        services.sort_by_key(|s| s.id());
        stabilize_all(&services, 3).await;
    }
    fix_fingers_all(&services).await;
    services
}
