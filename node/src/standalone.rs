//! A single participant running in its own process.
//!
//! Its peers live elsewhere, so readiness comes from a [`PeerProbe`] polling
//! every peer's `/status` instead of a barrier shared in memory.

use std::sync::Arc;
use std::time::Duration;

use benor_consensus::ReadinessBarrier;
use benor_network::{PeerClient, PeerProbe};
use benor_types::NodeId;
use tokio::task::JoinHandle;
use tracing::{debug, info, Instrument};

use crate::config::NetworkConfig;
use crate::logging::participant_span;
use crate::participant::Participant;
use crate::shutdown::ShutdownController;
use crate::NodeError;

pub struct StandaloneNode {
    participant: Participant,
    probe: JoinHandle<()>,
}

impl StandaloneNode {
    pub async fn launch(
        config: &NetworkConfig,
        id: NodeId,
        shutdown: &ShutdownController,
    ) -> Result<Self, NodeError> {
        let params = config.validate()?;
        params.check_node(id)?;

        let barrier = Arc::new(ReadinessBarrier::new(params.nodes));
        let participant = Participant::launch(config, params, id, barrier.clone(), shutdown).await?;

        let request_timeout = config.poll_interval().max(Duration::from_millis(500));
        let client = PeerClient::new(config.addressing(), request_timeout)?;
        let probe = PeerProbe::new(client, barrier, config.poll_interval());
        let probe = tokio::spawn(probe.run(shutdown.subscribe()).instrument(participant_span(id)));

        Ok(Self { participant, probe })
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// Run `start()` in the background; it proceeds once every peer answers.
    pub fn start_when_ready(&self) {
        let engine = self.participant.engine().clone();
        let metrics = self.participant.metrics().clone();
        let id = engine.id();
        tokio::spawn(
            async move {
                debug!("waiting for peers before starting");
                let outcome = engine.start().await;
                metrics.observe_start(outcome);
                metrics.observe_state(&engine.state());
                info!(?outcome, "consensus started");
            }
            .instrument(participant_span(id)),
        );
    }

    /// Wait for the server and probe to finish after shutdown.
    pub async fn join(self) -> Result<(), NodeError> {
        self.participant.join().await?;
        self.probe
            .await
            .map_err(|e| NodeError::Task(e.to_string()))
    }
}
