//! Yaml config of the node.
use std::fs;
use std::io;

use chordring_core::ChordConfig;
use serde::Deserialize;
use serde::Serialize;

use crate::consts::DEFAULT_ADDRESS_PREFIX;
use crate::consts::DEFAULT_LOOKUP_KEYS;
use crate::consts::DEFAULT_SIMULATION_NODES;
use crate::consts::DEFAULT_SIMULATION_ROUNDS;
use crate::error::Error;
use crate::error::Result;
use crate::util::ensure_parent_dir;
use crate::util::expand_home;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// When there is no configuration in the YAML file,
    /// its deserialization is equivalent to `ChordConfig::default()` in Rust.
    #[serde(default)]
    pub chord: ChordConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Shape of a simulated ring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Number of nodes joining the ring.
    #[serde(default = "default_nodes")]
    pub nodes: usize,
    /// Node `i` is reachable at `{address_prefix}{i}`, its id is the hash of that address.
    #[serde(default = "default_address_prefix")]
    pub address_prefix: String,
    /// Maintenance rounds run after each join, and again after failures.
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// Number of nodes crashed once the ring is built.
    #[serde(default)]
    pub failures: usize,
    /// Keys resolved at the end of the simulation.
    #[serde(default = "default_lookups")]
    pub lookups: Vec<String>,
}

fn default_nodes() -> usize {
    DEFAULT_SIMULATION_NODES
}

fn default_address_prefix() -> String {
    DEFAULT_ADDRESS_PREFIX.to_string()
}

fn default_rounds() -> usize {
    DEFAULT_SIMULATION_ROUNDS
}

fn default_lookups() -> Vec<String> {
    DEFAULT_LOOKUP_KEYS.iter().map(|k| k.to_string()).collect()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            address_prefix: default_address_prefix(),
            rounds: default_rounds(),
            failures: 0,
            lookups: default_lookups(),
        }
    }
}

impl Config {
    pub fn write_fs<P>(&self, path: P) -> Result<String>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        ensure_parent_dir(&path)?;
        let f =
            fs::File::create(path.as_path()).map_err(|e| Error::CreateFileError(e.to_string()))?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self)?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        tracing::debug!("Read config from: {:?}", path);
        let f = fs::File::open(path).map_err(|e| Error::OpenFileError(e.to_string()))?;
        let f_rdr = io::BufReader::new(f);
        Ok(serde_yaml::from_reader(f_rdr)?)
    }
}
