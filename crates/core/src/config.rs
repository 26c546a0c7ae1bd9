//! Configuration of a chord node.
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::consts::DEFAULT_ID_BITS;
use crate::consts::DEFAULT_RPC_TIMEOUT_MS;
use crate::consts::DEFAULT_STABILIZE_INTERVAL_MS;
use crate::dht::IdSpace;
use crate::error::Result;

/// How the finger table is refreshed on each maintenance tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixFingers {
    /// Every finger on every tick.
    #[default]
    Full,
    /// One finger per tick, cycling through the table.
    Incremental,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordConfig {
    /// Bit width `m` of the identifier ring.
    #[serde(default = "default_id_bits")]
    pub id_bits: u8,
    #[serde(default = "default_stabilize_interval_ms")]
    pub stabilize_interval_ms: u64,
    /// Deadline of every remote call. An expired call counts as a connection failure.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    #[serde(default)]
    pub fix_fingers: FixFingers,
}

fn default_id_bits() -> u8 {
    DEFAULT_ID_BITS
}

fn default_stabilize_interval_ms() -> u64 {
    DEFAULT_STABILIZE_INTERVAL_MS
}

fn default_rpc_timeout_ms() -> u64 {
    DEFAULT_RPC_TIMEOUT_MS
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            id_bits: DEFAULT_ID_BITS,
            stabilize_interval_ms: DEFAULT_STABILIZE_INTERVAL_MS,
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            fix_fingers: FixFingers::default(),
        }
    }
}

impl ChordConfig {
    /// Config of a ring with `id_bits` wide identifiers, other fields default.
    pub fn new(id_bits: u8) -> Self {
        Self {
            id_bits,
            ..Default::default()
        }
    }

    /// Validated identifier space.
    pub fn space(&self) -> Result<IdSpace> {
        IdSpace::new(self.id_bits)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn stabilize_interval(&self) -> Duration {
        Duration::from_millis(self.stabilize_interval_ms)
    }

    pub fn rpc_timeout_ms(mut self, ms: u64) -> Self {
        self.rpc_timeout_ms = ms;
        self
    }

    pub fn fix_fingers(mut self, mode: FixFingers) -> Self {
        self.fix_fingers = mode;
        self
    }
}
