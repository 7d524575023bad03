//! Nullable transport: record messages without sending them.

use std::sync::Mutex;

use benor_consensus::Transport;
use benor_types::{ConsensusMessage, MessageKind, NodeId};

/// A transport that records every send instead of delivering it.
pub struct NullTransport {
    sent_messages: Mutex<Vec<(NodeId, ConsensusMessage)>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self {
            sent_messages: Mutex::new(Vec::new()),
        }
    }

    /// All `(target, message)` pairs "sent" so far (for assertions).
    pub fn sent(&self) -> Vec<(NodeId, ConsensusMessage)> {
        self.sent_messages.lock().unwrap().clone()
    }

    /// Sent messages of one kind.
    pub fn sent_of_kind(&self, kind: MessageKind) -> Vec<(NodeId, ConsensusMessage)> {
        self.sent()
            .into_iter()
            .filter(|(_, message)| message.kind == kind)
            .collect()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<(NodeId, ConsensusMessage)> {
        std::mem::take(&mut *self.sent_messages.lock().unwrap())
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.sent_messages.lock().unwrap().clear();
    }
}

impl Default for NullTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for NullTransport {
    fn send(&self, target: NodeId, message: ConsensusMessage) {
        self.sent_messages.lock().unwrap().push((target, message));
    }
}
