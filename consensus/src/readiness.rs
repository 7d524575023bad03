//! Readiness barrier: "have all participants started listening?"
//!
//! Participants register themselves (or are registered by a probe) once their
//! listener accepts traffic. `start()` suspends on [`ReadinessBarrier::wait_all_ready`]
//! until every one of the N participants has been registered. The barrier is a
//! one-way latch: registrations are never withdrawn.

use std::collections::BTreeSet;

use benor_types::NodeId;
use tokio::sync::watch;

pub struct ReadinessBarrier {
    expected: usize,
    ready: watch::Sender<BTreeSet<NodeId>>,
}

impl ReadinessBarrier {
    /// Barrier for a network of `expected` participants.
    pub fn new(expected: usize) -> Self {
        let (ready, _) = watch::channel(BTreeSet::new());
        Self { expected, ready }
    }

    /// Mark a participant as accepting traffic.
    ///
    /// Returns `true` the first time a given participant is registered.
    /// Indices outside the network are ignored.
    pub fn mark_ready(&self, id: NodeId) -> bool {
        if id.index() >= self.expected {
            tracing::warn!(node = %id, expected = self.expected, "ignoring readiness for unknown participant");
            return false;
        }
        let inserted = self.ready.send_if_modified(|set| set.insert(id));
        if inserted {
            tracing::debug!(node = %id, ready = self.ready_count(), expected = self.expected, "participant ready");
        }
        inserted
    }

    pub fn is_ready(&self, id: NodeId) -> bool {
        self.ready.borrow().contains(&id)
    }

    pub fn ready_count(&self) -> usize {
        self.ready.borrow().len()
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn all_ready(&self) -> bool {
        self.ready_count() >= self.expected
    }

    /// Suspend until every participant is ready. Returns immediately if they
    /// already are. There is no timeout.
    pub async fn wait_all_ready(&self) {
        let expected = self.expected;
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|set| set.len() >= expected).await;
    }
}
