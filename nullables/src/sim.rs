//! Simulated network: an in-memory mailbox shared by a set of engines.
//!
//! Sends are queued, never delivered inline, so an engine is never re-entered
//! while it is broadcasting. Tests pump the queue with [`SimNetwork::run`]
//! (FIFO) or [`SimNetwork::run_shuffled`] (seeded random delivery order).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use benor_consensus::{ConsensusEngine, Transport};
use benor_types::{ConsensusMessage, NodeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A message in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub target: NodeId,
    pub message: ConsensusMessage,
}

pub struct SimNetwork {
    queue: Mutex<VecDeque<Envelope>>,
    delivered: Mutex<usize>,
}

impl SimNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            delivered: Mutex::new(0),
        })
    }

    /// Messages queued but not yet delivered.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Messages delivered so far.
    pub fn delivered(&self) -> usize {
        *self.delivered.lock().unwrap()
    }

    /// Snapshot of the queue, oldest first.
    pub fn in_flight(&self) -> Vec<Envelope> {
        self.queue.lock().unwrap().iter().copied().collect()
    }

    /// Deliver queued messages oldest first until the queue drains or
    /// `max_deliveries` is reached. Returns the number delivered.
    pub fn run(&self, engines: &[Arc<ConsensusEngine>], max_deliveries: usize) -> usize {
        self.pump(engines, max_deliveries, |queue| queue.pop_front(), |_| {})
    }

    /// Like [`run`](Self::run) but each step picks a random queued message,
    /// modelling reordering. The same seed replays the same schedule.
    pub fn run_shuffled(
        &self,
        engines: &[Arc<ConsensusEngine>],
        seed: u64,
        max_deliveries: usize,
    ) -> usize {
        self.run_shuffled_inspecting(engines, seed, max_deliveries, |_| {})
    }

    /// [`run_shuffled`](Self::run_shuffled), calling `inspect` with the
    /// engines after every delivery.
    pub fn run_shuffled_inspecting(
        &self,
        engines: &[Arc<ConsensusEngine>],
        seed: u64,
        max_deliveries: usize,
        inspect: impl FnMut(&[Arc<ConsensusEngine>]),
    ) -> usize {
        let mut rng = StdRng::seed_from_u64(seed);
        self.pump(
            engines,
            max_deliveries,
            |queue| {
                if queue.is_empty() {
                    None
                } else {
                    let pick = rng.gen_range(0..queue.len());
                    queue.swap_remove_back(pick)
                }
            },
            inspect,
        )
    }

    fn pump(
        &self,
        engines: &[Arc<ConsensusEngine>],
        max_deliveries: usize,
        mut next: impl FnMut(&mut VecDeque<Envelope>) -> Option<Envelope>,
        mut inspect: impl FnMut(&[Arc<ConsensusEngine>]),
    ) -> usize {
        let mut count = 0;
        while count < max_deliveries {
            let Some(envelope) = next(&mut self.queue.lock().unwrap()) else {
                break;
            };
            if let Some(engine) = engines.get(envelope.target.index()) {
                engine.on_message(envelope.message);
            }
            inspect(engines);
            count += 1;
        }
        *self.delivered.lock().unwrap() += count;
        count
    }
}

impl Transport for SimNetwork {
    fn send(&self, target: NodeId, message: ConsensusMessage) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Envelope { target, message });
    }
}
