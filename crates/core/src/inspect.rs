use serde::Deserialize;
use serde::Serialize;

use crate::dht::NodeService;
use crate::dht::Transport;
use crate::error::Result;

/// Point-in-time view of one node's routing state, ready to be dumped as json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordInspect {
    pub id: String,
    pub address: String,
    pub successor: String,
    #[serde(default)]
    pub predecessor: Option<String>,
    /// Finger start and the node it points to, in slot order.
    pub finger_table: Vec<(String, String)>,
}

impl ChordInspect {
    /// Snapshot the routing state of `service`.
    ///
    /// Fails with [StoreLockError](crate::error::Error::StoreLockError) when the store lock
    /// is poisoned.
    pub fn inspect<T: Transport>(service: &NodeService<T>) -> Result<Self> {
        let node = service.node();
        let store = service.lock_store()?;
        let finger_table = store
            .finger()
            .list()
            .iter()
            .map(|f| (f.start.to_string(), f.node.to_string()))
            .collect();

        Ok(Self {
            id: node.id().to_string(),
            address: node.address().to_string(),
            successor: store.successor().to_string(),
            predecessor: store.predecessor().map(|x| x.to_string()),
            finger_table,
        })
    }
}
