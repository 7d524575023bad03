//! Prometheus metrics for one participant.
//!
//! Each participant owns a dedicated [`Registry`] so that several participants
//! in one process never share counters. `/metrics` encodes it in the text
//! exposition format.

use benor_consensus::{MessageOutcome, StartOutcome};
use benor_types::{MessageKind, NodeState};
use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

pub struct ParticipantMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Proposals delivered to this participant, including ignored ones.
    pub proposals_received: IntCounter,
    /// Votes delivered to this participant, including ignored ones.
    pub votes_received: IntCounter,
    /// Messages this participant broadcast (one per broadcast, not per target).
    pub broadcasts: IntCounter,
    pub decisions: IntCounter,
    /// Rounds left without a decision.
    pub rounds_advanced: IntCounter,
    /// Rounds left on a coin flip.
    pub coin_flips: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Current round `k` (0 when inert, stopped or faulty).
    pub round: IntGauge,
}

impl ParticipantMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let proposals_received = register_int_counter_with_registry!(
            Opts::new("benor_proposals_received_total", "Proposals received"),
            registry
        )
        .expect("failed to register proposals_received counter");

        let votes_received = register_int_counter_with_registry!(
            Opts::new("benor_votes_received_total", "Votes received"),
            registry
        )
        .expect("failed to register votes_received counter");

        let broadcasts = register_int_counter_with_registry!(
            Opts::new("benor_broadcasts_total", "Messages broadcast to all participants"),
            registry
        )
        .expect("failed to register broadcasts counter");

        let decisions = register_int_counter_with_registry!(
            Opts::new("benor_decisions_total", "Decisions reached"),
            registry
        )
        .expect("failed to register decisions counter");

        let rounds_advanced = register_int_counter_with_registry!(
            Opts::new("benor_rounds_advanced_total", "Rounds ended without a decision"),
            registry
        )
        .expect("failed to register rounds_advanced counter");

        let coin_flips = register_int_counter_with_registry!(
            Opts::new("benor_coin_flips_total", "Rounds ended on a coin flip"),
            registry
        )
        .expect("failed to register coin_flips counter");

        let round = register_int_gauge_with_registry!(
            Opts::new("benor_round", "Current round of this participant"),
            registry
        )
        .expect("failed to register round gauge");

        Self {
            registry,
            proposals_received,
            votes_received,
            broadcasts,
            decisions,
            rounds_advanced,
            coin_flips,
            round,
        }
    }

    /// Account for one delivered message and what the engine did with it.
    pub fn observe_message(&self, kind: MessageKind, outcome: &MessageOutcome) {
        match kind {
            MessageKind::Propose => self.proposals_received.inc(),
            MessageKind::Vote => self.votes_received.inc(),
        }
        match outcome {
            MessageOutcome::VoteBroadcast { .. } => self.broadcasts.inc(),
            MessageOutcome::Decided { .. } => {
                self.decisions.inc();
                self.broadcasts.inc_by(2);
            }
            MessageOutcome::Advanced { coin_flipped, .. } => {
                self.rounds_advanced.inc();
                if *coin_flipped {
                    self.coin_flips.inc();
                }
                self.broadcasts.inc();
            }
            MessageOutcome::Ignored(_) | MessageOutcome::Tallied { .. } => {}
        }
    }

    pub fn observe_start(&self, outcome: StartOutcome) {
        if outcome != StartOutcome::Faulty {
            self.broadcasts.inc();
        }
    }

    pub fn observe_state(&self, state: &NodeState) {
        self.round
            .set(i64::try_from(state.round().as_u64()).unwrap_or(i64::MAX));
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for ParticipantMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benor_consensus::IgnoreReason;
    use benor_types::{Round, Value};

    #[test]
    fn decision_counts_two_broadcasts() {
        let metrics = ParticipantMetrics::new();
        metrics.observe_message(
            MessageKind::Vote,
            &MessageOutcome::Decided {
                round: Round::FIRST,
                value: Value::One,
            },
        );
        assert_eq!(metrics.votes_received.get(), 1);
        assert_eq!(metrics.decisions.get(), 1);
        assert_eq!(metrics.broadcasts.get(), 2);
    }

    #[test]
    fn ignored_messages_are_still_received() {
        let metrics = ParticipantMetrics::new();
        metrics.observe_message(
            MessageKind::Propose,
            &MessageOutcome::Ignored(IgnoreReason::Faulty),
        );
        assert_eq!(metrics.proposals_received.get(), 1);
        assert_eq!(metrics.broadcasts.get(), 0);
    }

    #[test]
    fn coin_flip_advances_round() {
        let metrics = ParticipantMetrics::new();
        metrics.observe_message(
            MessageKind::Vote,
            &MessageOutcome::Advanced {
                round: Round::new(2),
                value: Value::Zero,
                coin_flipped: true,
            },
        );
        assert_eq!(metrics.rounds_advanced.get(), 1);
        assert_eq!(metrics.coin_flips.get(), 1);
    }

    #[test]
    fn encode_contains_metric_names() {
        let metrics = ParticipantMetrics::new();
        metrics.observe_start(StartOutcome::Started);
        let text = metrics.encode().unwrap();
        assert!(text.contains("benor_broadcasts_total 1"));
        assert!(text.contains("benor_round 0"));
    }
}
