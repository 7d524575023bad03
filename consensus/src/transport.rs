//! Outbound message capability.

use benor_types::{ConsensusMessage, NodeId};

/// Fire-and-forget delivery of one message to one participant.
///
/// The engine never learns whether a send succeeded; implementations must not
/// block on network I/O and must not call back into the sending engine
/// synchronously.
pub trait Transport: Send + Sync {
    fn send(&self, target: NodeId, message: ConsensusMessage);
}
