//! Network configuration with TOML file support.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use benor_consensus::{Coin, RandomCoin, SeededCoin};
use benor_network::PeerAddressing;
use benor_types::{NodeId, ProtocolParams, Value};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration of a Ben-Or network: who takes part, who is faulty, what
/// every participant starts with and where it listens.
///
/// Can be loaded from a TOML file via [`NetworkConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Total number of participants (N).
    #[serde(default = "default_nodes")]
    pub nodes: usize,

    /// Number of faulty participants tolerated (F).
    #[serde(default = "default_faulty_count")]
    pub faulty_count: usize,

    /// Initial value per participant, written `0`, `1` or `"?"`. The
    /// ambiguous marker is only allowed for faulty participants. Empty means
    /// alternating `0, 1, 0, ...`.
    #[serde(default)]
    pub initial_values: Vec<Value>,

    /// Indices of the participants that run in faulty mode.
    #[serde(default)]
    pub faulty_nodes: Vec<usize>,

    /// Host every participant binds to and is reached at.
    #[serde(default = "default_host")]
    pub host: String,

    /// Participant `i` listens on `base_port + i`.
    #[serde(default = "default_base_port")]
    pub base_port: u16,

    /// Seed for reproducible coin flips. Unset means OS randomness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_seed: Option<u64>,

    /// How long a launcher waits for every correct participant to decide.
    #[serde(default = "default_decision_timeout_secs")]
    pub decision_timeout_secs: u64,

    /// Interval of readiness probing and decision polling.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_nodes() -> usize {
    4
}

fn default_faulty_count() -> usize {
    1
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_base_port() -> u16 {
    3000
}

fn default_decision_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NetworkConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check the configuration and derive the protocol parameters.
    ///
    /// More faulty participants than `faulty_count` is allowed, with a
    /// warning: it is how a run beyond the fault tolerance is staged.
    pub fn validate(&self) -> Result<ProtocolParams, NodeError> {
        let params = ProtocolParams::new(self.nodes, self.faulty_count)?;

        if !self.initial_values.is_empty() && self.initial_values.len() != self.nodes {
            return Err(NodeError::Config(format!(
                "initial_values has {} entries for {} nodes",
                self.initial_values.len(),
                self.nodes
            )));
        }

        let mut faulty = BTreeSet::new();
        for &index in &self.faulty_nodes {
            if index >= self.nodes {
                return Err(NodeError::Config(format!(
                    "faulty node {index} out of range for {} nodes",
                    self.nodes
                )));
            }
            if !faulty.insert(index) {
                return Err(NodeError::Config(format!("faulty node {index} listed twice")));
            }
        }

        for id in NodeId::all(self.nodes) {
            if !self.is_faulty(id) && !self.initial_value(id).is_binary() {
                return Err(NodeError::Config(format!(
                    "node {} is not faulty but starts with '{}'",
                    id.index(),
                    self.initial_value(id)
                )));
            }
        }

        if usize::from(self.base_port) + self.nodes - 1 > usize::from(u16::MAX) {
            return Err(NodeError::Config(format!(
                "base_port {} leaves no room for {} nodes",
                self.base_port, self.nodes
            )));
        }

        if faulty.len() > self.faulty_count {
            warn!(
                faulty = faulty.len(),
                tolerated = self.faulty_count,
                "more faulty participants than tolerated"
            );
        }
        if !params.can_decide() {
            warn!(
                nodes = self.nodes,
                faulty_count = self.faulty_count,
                "F + 1 exceeds N - F, no participant can ever decide"
            );
        }

        Ok(params)
    }

    pub fn initial_value(&self, id: NodeId) -> Value {
        self.initial_values
            .get(id.index())
            .copied()
            .unwrap_or_else(|| Value::from_bit(id.index() % 2 == 1))
    }

    pub fn is_faulty(&self, id: NodeId) -> bool {
        self.faulty_nodes.contains(&id.index())
    }

    pub fn addressing(&self) -> PeerAddressing {
        PeerAddressing::new(self.host.clone(), self.base_port)
    }

    /// `host:port` participant `id` binds to.
    pub fn listen_addr(&self, id: NodeId) -> String {
        format!("{}:{}", self.host, id.port(self.base_port))
    }

    /// Coin for participant `id`. With a seed every participant gets its own
    /// reproducible stream.
    pub fn coin_for(&self, id: NodeId) -> Arc<dyn Coin> {
        match self.coin_seed {
            Some(seed) => Arc::new(SeededCoin::new(seed.wrapping_add(id.index() as u64))),
            None => Arc::new(RandomCoin),
        }
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            faulty_count: default_faulty_count(),
            initial_values: Vec::new(),
            faulty_nodes: Vec::new(),
            host: default_host(),
            base_port: default_base_port(),
            coin_seed: None,
            decision_timeout_secs: default_decision_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
