//! Consensus engine: one participant's Ben-Or state machine.
//!
//! Per round the engine moves through
//! `Proposing → AccumulatingProposals → AccumulatingVotes → {Decided | NextRound}`:
//!
//! - `start()` waits for the readiness barrier, enters round 1 with the initial
//!   value and broadcasts `Propose(1, x)`.
//! - When a round's proposals reach the `N - F` quorum the engine broadcasts
//!   `Vote(k, v)`, where `v` is the strict-majority value or the ambiguous marker.
//! - When a round's votes reach the quorum the engine decides on `F + 1` votes for
//!   one value, or moves to round `k + 1` with the leading vote (or a coin flip)
//!   and broadcasts a new proposal.
//! - On deciding, the engine announces its value once as both `Propose(k + 1, v)`
//!   and `Vote(k + 1, v)` so that peers still in round `k + 1` can reach quorum
//!   without it, then ignores all further traffic.
//!
//! All mutable state sits behind one mutex. Broadcasts are computed under the
//! lock and handed to the transport after it is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use benor_types::{
    ConsensusMessage, MessageKind, NodeId, NodeState, ProtocolParams, Round, Value,
};
use tracing::{debug, info, trace, warn};

use crate::coin::Coin;
use crate::decision::{conclude, vote_for, RoundConclusion};
use crate::error::ConsensusError;
use crate::readiness::ReadinessBarrier;
use crate::tally::Tally;
use crate::transport::Transport;

/// Static configuration of one participant.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub id: NodeId,
    pub params: ProtocolParams,
    /// Value proposed in round 1. Ignored for faulty participants.
    pub initial: Value,
    pub faulty: bool,
}

/// Why an inbound message was dropped without being tallied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    Faulty,
    Killed,
    AlreadyDecided,
    /// Rounds are 1-based; round 0 never carries protocol traffic.
    InertRound,
}

/// What one inbound message did to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    Ignored(IgnoreReason),
    /// Recorded; no quorum action (below quorum, or already fired for the round).
    Tallied {
        kind: MessageKind,
        round: Round,
        count: usize,
    },
    /// Proposal quorum reached; a vote was broadcast.
    VoteBroadcast { round: Round, value: Value },
    /// Vote quorum reached with `F + 1` votes for `value`; the decision was
    /// announced for the next round.
    Decided { round: Round, value: Value },
    /// Vote quorum reached without a decision; `round` is the round proposed
    /// into. State only moves when it is ahead of the current round.
    Advanced {
        round: Round,
        value: Value,
        coin_flipped: bool,
    },
}

/// What a call to [`ConsensusEngine::start`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// Entered round 1 and broadcast the initial proposal.
    Started,
    /// Already decided or past round 1; state kept, initial proposal re-broadcast.
    Rebroadcast,
    /// Faulty participant: state nulled, nothing sent.
    Faulty,
}

struct EngineInner {
    state: NodeState,
    proposals: Tally,
    votes: Tally,
}

pub struct ConsensusEngine {
    config: EngineConfig,
    inner: Mutex<EngineInner>,
    transport: Arc<dyn Transport>,
    coin: Arc<dyn Coin>,
    readiness: Arc<ReadinessBarrier>,
}

impl ConsensusEngine {
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        coin: Arc<dyn Coin>,
        readiness: Arc<ReadinessBarrier>,
    ) -> Result<Self, ConsensusError> {
        config.params.check_node(config.id)?;
        if !config.faulty && !config.initial.is_binary() {
            return Err(ConsensusError::NonBinaryInitialValue { node: config.id });
        }

        Ok(Self {
            config,
            inner: Mutex::new(EngineInner {
                state: NodeState::inert(config.initial),
                proposals: Tally::new(),
                votes: Tally::new(),
            }),
            transport,
            coin,
            readiness,
        })
    }

    pub fn id(&self) -> NodeId {
        self.config.id
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.config.params
    }

    pub fn initial_value(&self) -> Value {
        self.config.initial
    }

    pub fn is_faulty(&self) -> bool {
        self.config.faulty
    }

    pub fn readiness(&self) -> &Arc<ReadinessBarrier> {
        &self.readiness
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of `{killed, x, decided, k}`.
    ///
    /// Faulty participants always report the null triple.
    pub fn state(&self) -> NodeState {
        let inner = self.lock();
        if self.config.faulty {
            NodeState::null(inner.state.killed)
        } else {
            inner.state
        }
    }

    /// Number of values received so far for a round and message kind.
    pub fn tally_len(&self, kind: MessageKind, round: Round) -> usize {
        let inner = self.lock();
        match kind {
            MessageKind::Propose => inner.proposals.len(round),
            MessageKind::Vote => inner.votes.len(round),
        }
    }

    /// Enter round 1 once every participant is reachable.
    ///
    /// Suspends on the readiness barrier with no timeout.
    pub async fn start(&self) -> StartOutcome {
        self.readiness.wait_all_ready().await;

        if self.config.faulty {
            let mut inner = self.lock();
            inner.state = NodeState::null(inner.state.killed);
            debug!(node = %self.config.id, "faulty participant started, staying silent");
            return StartOutcome::Faulty;
        }

        let outcome = {
            let mut inner = self.lock();
            if inner.state.is_decided() || inner.state.round() > Round::FIRST {
                warn!(
                    node = %self.config.id,
                    k = %inner.state.round(),
                    decided = inner.state.is_decided(),
                    "start on a participant that already progressed, keeping state"
                );
                StartOutcome::Rebroadcast
            } else {
                inner.state = NodeState {
                    killed: false,
                    x: Some(self.config.initial),
                    decided: Some(false),
                    k: Some(Round::FIRST),
                };
                info!(node = %self.config.id, x = %self.config.initial, "entering round 1");
                StartOutcome::Started
            }
        };

        self.broadcast(ConsensusMessage::propose(Round::FIRST, self.config.initial));
        outcome
    }

    /// Halt the participant: `killed = true`, null `x` and `decided`, `k = 0`.
    ///
    /// Tallies are discarded so a later `start()` begins from a clean slate.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.state = NodeState {
            killed: true,
            x: None,
            decided: None,
            k: Some(Round::INERT),
        };
        inner.proposals.clear();
        inner.votes.clear();
        info!(node = %self.config.id, "participant stopped");
    }

    /// Process one inbound message.
    pub fn on_message(&self, message: ConsensusMessage) -> MessageOutcome {
        let (outcome, outbound): (MessageOutcome, Vec<ConsensusMessage>) = {
            let mut inner = self.lock();
            match self.admit(&inner.state, &message) {
                Some(reason) => (MessageOutcome::Ignored(reason), Vec::new()),
                None => match message.kind {
                    MessageKind::Propose => self.on_propose(&mut inner, message),
                    MessageKind::Vote => self.on_vote(&mut inner, message),
                },
            }
        };

        for next in outbound {
            self.broadcast(next);
        }
        outcome
    }

    /// Fault gate and lifecycle guard.
    fn admit(&self, state: &NodeState, message: &ConsensusMessage) -> Option<IgnoreReason> {
        if self.config.faulty {
            Some(IgnoreReason::Faulty)
        } else if state.killed {
            Some(IgnoreReason::Killed)
        } else if state.is_decided() {
            Some(IgnoreReason::AlreadyDecided)
        } else if message.round.is_inert() {
            Some(IgnoreReason::InertRound)
        } else {
            None
        }
    }

    fn on_propose(
        &self,
        inner: &mut EngineInner,
        message: ConsensusMessage,
    ) -> (MessageOutcome, Vec<ConsensusMessage>) {
        let round = message.round;
        let count = inner.proposals.record(round, message.value);
        trace!(node = %self.config.id, k = %round, x = %message.value, count, "proposal received");

        let Some(counts) = inner
            .proposals
            .fire_at_quorum(round, self.config.params.quorum())
        else {
            return (
                MessageOutcome::Tallied {
                    kind: MessageKind::Propose,
                    round,
                    count,
                },
                Vec::new(),
            );
        };

        let value = vote_for(&self.config.params, counts);
        debug!(
            node = %self.config.id,
            k = %round,
            zeros = counts.zeros,
            ones = counts.ones,
            vote = %value,
            "proposal quorum reached"
        );
        (
            MessageOutcome::VoteBroadcast { round, value },
            vec![ConsensusMessage::vote(round, value)],
        )
    }

    fn on_vote(
        &self,
        inner: &mut EngineInner,
        message: ConsensusMessage,
    ) -> (MessageOutcome, Vec<ConsensusMessage>) {
        let round = message.round;
        let count = inner.votes.record(round, message.value);
        trace!(node = %self.config.id, k = %round, x = %message.value, count, "vote received");

        let Some(counts) = inner
            .votes
            .fire_at_quorum(round, self.config.params.quorum())
        else {
            return (
                MessageOutcome::Tallied {
                    kind: MessageKind::Vote,
                    round,
                    count,
                },
                Vec::new(),
            );
        };

        match conclude(&self.config.params, counts) {
            RoundConclusion::Decide(value) => {
                inner.state.x = Some(value);
                inner.state.decided = Some(true);
                inner.state.k = Some(inner.state.round().max(round));
                info!(node = %self.config.id, k = %round, x = %value, "decided");
                let next = round.next();
                (
                    MessageOutcome::Decided { round, value },
                    vec![
                        ConsensusMessage::propose(next, value),
                        ConsensusMessage::vote(next, value),
                    ],
                )
            }
            conclusion => {
                let (value, coin_flipped) = match conclusion {
                    RoundConclusion::Adopt(value) => (value, false),
                    _ => (self.coin.flip(), true),
                };
                let next = round.next();
                // A late quorum for an older round still proposes, but `k` never goes back.
                if next > inner.state.round() {
                    inner.state.x = Some(value);
                    inner.state.k = Some(next);
                }
                debug!(
                    node = %self.config.id,
                    k = %next,
                    x = %value,
                    zeros = counts.zeros,
                    ones = counts.ones,
                    coin_flipped,
                    "no decision, advancing round"
                );
                (
                    MessageOutcome::Advanced {
                        round: next,
                        value,
                        coin_flipped,
                    },
                    vec![ConsensusMessage::propose(next, value)],
                )
            }
        }
    }

    /// Send `message` to every participant, this one included.
    fn broadcast(&self, message: ConsensusMessage) {
        for target in NodeId::all(self.config.params.nodes) {
            self.transport.send(target, message);
        }
    }
}
