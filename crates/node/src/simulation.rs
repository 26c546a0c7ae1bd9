//! Ring simulation on the in-process transport.
//!
//! A [Simulation] builds a ring by sequential joins, runs maintenance rounds, crashes some
//! nodes, and reports how the ring and a set of lookups look afterwards.
use std::sync::Arc;

use chordring_core::dht::Node;
use chordring_core::dht::Stabilizer;
use chordring_core::inspect::ChordInspect;
use chordring_core::ChordConfig;
use chordring_transport::LocalNetwork;
use chordring_transport::LocalService;
use serde::Deserialize;
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::error::Error;
use crate::error::Result;
use crate::util::build_version;

/// Outcome of resolving one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupReport {
    pub key: String,
    pub id: String,
    /// Node that started the lookup.
    pub from: String,
    #[serde(default)]
    pub owner: Option<String>,
    /// Owner among the live nodes, computed without routing.
    pub expected: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub version: String,
    pub id_bits: u8,
    /// Whether successor pointers formed the sorted ring before any crash.
    pub consistent: bool,
    /// Same check over the live nodes after crashes and recovery rounds.
    pub consistent_after_failures: bool,
    pub crashed: Vec<String>,
    pub nodes: Vec<ChordInspect>,
    pub lookups: Vec<LookupReport>,
}

pub struct Simulation {
    network: LocalNetwork,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(chord: ChordConfig, config: SimulationConfig) -> Result<Self> {
        if config.nodes == 0 {
            return Err(Error::InvalidSimulation("at least one node is needed".into()));
        }
        if config.failures >= config.nodes {
            return Err(Error::InvalidSimulation(format!(
                "cannot crash {} of {} nodes",
                config.failures, config.nodes
            )));
        }
        let network = LocalNetwork::new(chord)?;
        Ok(Self { network, config })
    }

    pub fn network(&self) -> &LocalNetwork {
        &self.network
    }

    fn address(&self, index: usize) -> String {
        format!("{}{}", self.config.address_prefix, index)
    }

    /// Spawn node 0, then join every other node through it, running maintenance
    /// rounds after each join.
    pub async fn build_ring(&self) -> Result<()> {
        let first = self.network.spawn_node(&self.address(0))?;
        for index in 1..self.config.nodes {
            let service = self
                .network
                .join_node(&self.address(index), first.node())
                .await?;
            tracing::debug!("node {} joined as {}", index, service.node());
            self.run_rounds(self.config.rounds).await;
        }
        Ok(())
    }

    /// Run full maintenance on every live node, in id order.
    pub async fn run_rounds(&self, rounds: usize) {
        for round in 0..rounds {
            for service in self.network.services() {
                Stabilizer::new(service)
                    .stabilize()
                    .await
                    .unwrap_or_else(|e| tracing::error!("failed to stabilize {:?}", e));
            }
            tracing::debug!("round {} done", round);
        }
    }

    /// Crash `count` nodes spread evenly over the ring, never the first one.
    pub fn crash(&self, count: usize) -> Result<Vec<Node>> {
        let services = self.network.services();
        if count == 0 {
            return Ok(vec![]);
        }
        let step = (services.len() / (count + 1)).max(1);
        let mut crashed = vec![];
        for service in services.iter().skip(step).step_by(step).take(count) {
            self.network.crash(service.node())?;
            crashed.push(service.node().clone());
        }
        Ok(crashed)
    }

    /// Whether every live node's successor is the next live node by id, wrapping around.
    pub fn is_consistent(&self) -> bool {
        let services = self.network.services();
        services.iter().enumerate().all(|(i, service)| {
            let next = services[(i + 1) % services.len()].node();
            service.successor().map(|s| &s == next).unwrap_or(false)
        })
    }

    /// Owner of `key` among the live nodes, without routing.
    pub fn expected_owner(&self, key: &str) -> Option<Node> {
        let id = self.network.space().hash(key);
        let services = self.network.services();
        services
            .iter()
            .find(|s| s.id() >= id)
            .or_else(|| services.first())
            .map(|s| s.node().clone())
    }

    /// Resolve `key` starting at `from`.
    pub async fn lookup(&self, from: &Arc<LocalService>, key: &str) -> LookupReport {
        let id = self.network.space().hash(key);
        let expected = self
            .expected_owner(key)
            .map(|n| n.to_string())
            .unwrap_or_default();
        let (owner, error) = match from.find_successor(id).await {
            Ok(node) => (Some(node.to_string()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        LookupReport {
            key: key.to_string(),
            id: id.to_string(),
            from: from.node().to_string(),
            owner,
            expected,
            error,
        }
    }

    /// Build, stabilize, break, recover, resolve.
    pub async fn run(&self) -> Result<SimulationReport> {
        self.build_ring().await?;
        self.run_rounds(self.config.rounds).await;
        let consistent = self.is_consistent();
        tracing::info!("ring of {} nodes built, consistent: {}", self.network.len(), consistent);

        let crashed = self.crash(self.config.failures)?;
        if !crashed.is_empty() {
            self.run_rounds(self.config.rounds).await;
        }
        let consistent_after_failures = self.is_consistent();

        let services = self.network.services();
        let mut lookups = vec![];
        if let Some(from) = services.first() {
            for key in self.config.lookups.iter() {
                lookups.push(self.lookup(from, key).await);
            }
        }

        let nodes = services
            .iter()
            .map(|s| ChordInspect::inspect(s))
            .collect::<chordring_core::Result<Vec<_>>>()?;

        Ok(SimulationReport {
            version: build_version(),
            id_bits: self.network.config().id_bits,
            consistent,
            consistent_after_failures,
            crashed: crashed.iter().map(|n| n.to_string()).collect(),
            nodes,
            lookups,
        })
    }
}
