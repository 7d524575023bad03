//! Participant identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a participant in `[0, N)`.
///
/// Immutable for the participant's lifetime. Used to derive its listening port
/// and in logs, never in quorum logic.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    /// Iterate over every participant id of a network of `nodes` participants.
    pub fn all(nodes: usize) -> impl Iterator<Item = NodeId> {
        (0..nodes).map(NodeId)
    }

    /// Listening port of this participant given the network's base port.
    pub fn port(&self, base_port: u16) -> u16 {
        base_port.saturating_add(self.0 as u16)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
