//! Constant variables of the node.

pub const DEFAULT_CONFIG_LOCATION: &str = "~/.chordring/config.yaml";
pub const DEFAULT_ADDRESS_PREFIX: &str = "local://node-";
pub const DEFAULT_SIMULATION_NODES: usize = 16;
pub const DEFAULT_SIMULATION_ROUNDS: usize = 3;
pub const DEFAULT_LOOKUP_KEYS: [&str; 3] = ["alice", "bob", "carol"];
