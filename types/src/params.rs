//! Protocol parameters: network size N and fault bound F.
//!
//! Every threshold of the protocol is derived from these two numbers:
//! - quorum: `N - F` same-round messages before a participant acts,
//! - decision: `F + 1` votes for one value before a participant decides,
//! - proposal majority: strictly more than `N / 2` proposals for one value.

use serde::{Deserialize, Serialize};

use crate::{NodeId, TypesError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Total number of participants (N), faulty ones included.
    pub nodes: usize,
    /// Number of faulty participants tolerated (F).
    pub faulty: usize,
}

impl ProtocolParams {
    /// Validate and build parameters. `F` must leave a non-empty quorum.
    pub fn new(nodes: usize, faulty: usize) -> Result<Self, TypesError> {
        if nodes == 0 {
            return Err(TypesError::EmptyNetwork);
        }
        if faulty >= nodes {
            return Err(TypesError::TooManyFaults { nodes, faulty });
        }
        Ok(Self { nodes, faulty })
    }

    /// `N - F`.
    pub fn quorum(&self) -> usize {
        self.nodes - self.faulty
    }

    /// `F + 1`.
    pub fn decision_threshold(&self) -> usize {
        self.faulty + 1
    }

    /// Whether `count` proposals for one value form a strict majority of N.
    pub fn is_majority(&self, count: usize) -> bool {
        count * 2 > self.nodes
    }

    /// Whether a decision is reachable at all: `F + 1 <= N - F`.
    ///
    /// When this is false every participant keeps advancing rounds forever.
    pub fn can_decide(&self) -> bool {
        self.decision_threshold() <= self.quorum()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes
    }

    pub fn check_node(&self, id: NodeId) -> Result<(), TypesError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TypesError::NodeOutOfRange {
                index: id.index(),
                nodes: self.nodes,
            })
        }
    }
}
