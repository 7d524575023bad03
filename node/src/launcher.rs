//! In-process local network: N participants on consecutive ports.
//!
//! All participants share one readiness barrier, so `start()` on any of them
//! proceeds as soon as every listener is bound. Control goes through the
//! participants' own HTTP surface, exactly as an external operator would
//! drive them.

use std::sync::Arc;
use std::time::Duration;

use benor_consensus::ReadinessBarrier;
use benor_network::PeerClient;
use benor_types::{NodeId, NodeState, ProtocolParams};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::NetworkConfig;
use crate::participant::Participant;
use crate::shutdown::ShutdownController;
use crate::NodeError;

pub struct LocalNetwork {
    config: NetworkConfig,
    params: ProtocolParams,
    participants: Vec<Participant>,
    client: PeerClient,
    barrier: Arc<ReadinessBarrier>,
    shutdown: ShutdownController,
}

impl LocalNetwork {
    /// Validate `config` and launch every participant.
    ///
    /// If any participant fails to bind, the ones already running are shut
    /// down before the error is returned.
    pub async fn launch(config: NetworkConfig) -> Result<Self, NodeError> {
        let params = config.validate()?;
        let barrier = Arc::new(ReadinessBarrier::new(params.nodes));
        let shutdown = ShutdownController::new();
        let client = PeerClient::new(config.addressing(), Duration::from_secs(5))?;

        let mut participants = Vec::with_capacity(params.nodes);
        for id in NodeId::all(params.nodes) {
            match Participant::launch(&config, params, id, barrier.clone(), &shutdown).await {
                Ok(participant) => participants.push(participant),
                Err(e) => {
                    shutdown.shutdown();
                    for participant in participants {
                        let _ = participant.join().await;
                    }
                    return Err(e);
                }
            }
        }

        info!(
            nodes = params.nodes,
            faulty_count = params.faulty,
            base_port = config.base_port,
            "local network up"
        );

        Ok(Self {
            config,
            params,
            participants,
            client,
            barrier,
            shutdown,
        })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn params(&self) -> ProtocolParams {
        self.params
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn barrier(&self) -> &Arc<ReadinessBarrier> {
        &self.barrier
    }

    /// `GET /start` on every participant.
    pub async fn start_all(&self) -> Result<(), NodeError> {
        for id in NodeId::all(self.params.nodes) {
            self.client.start(id).await?;
        }
        info!("consensus started on every participant");
        Ok(())
    }

    /// `GET /stop` on every participant.
    pub async fn stop_all(&self) -> Result<(), NodeError> {
        for id in NodeId::all(self.params.nodes) {
            self.client.stop(id).await?;
        }
        info!("every participant stopped");
        Ok(())
    }

    /// `GET /getState` on every participant, in index order.
    pub async fn states(&self) -> Result<Vec<NodeState>, NodeError> {
        let mut states = Vec::with_capacity(self.params.nodes);
        for id in NodeId::all(self.params.nodes) {
            states.push(self.client.state(id).await?);
        }
        Ok(states)
    }

    /// Snapshot of every participant read from the engines directly.
    pub fn local_states(&self) -> Vec<NodeState> {
        self.participants.iter().map(Participant::state).collect()
    }

    /// Whether every non-faulty participant has decided.
    pub fn all_correct_decided(&self) -> bool {
        self.participants
            .iter()
            .filter(|p| !p.engine().is_faulty())
            .all(|p| p.state().is_decided())
    }

    /// Poll until every non-faulty participant has decided or `timeout`
    /// elapses. Returns the final snapshots.
    pub async fn wait_for_decision(&self, timeout: Duration) -> Result<Vec<NodeState>, NodeError> {
        let deadline = Instant::now() + timeout;
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        loop {
            ticker.tick().await;
            if self.all_correct_decided() {
                return Ok(self.local_states());
            }
            if Instant::now() >= deadline {
                let correct: Vec<&Participant> = self
                    .participants
                    .iter()
                    .filter(|p| !p.engine().is_faulty())
                    .collect();
                let decided = correct.iter().filter(|p| p.state().is_decided()).count();
                warn!(decided, expected = correct.len(), "decision timeout");
                return Err(NodeError::DecisionTimeout {
                    timeout_secs: timeout.as_secs(),
                    decided,
                    expected: correct.len(),
                });
            }
        }
    }

    /// Signal every participant server to stop and wait for them to drain.
    pub async fn shutdown(self) -> Result<(), NodeError> {
        self.shutdown.shutdown();
        let mut first_error = None;
        for participant in self.participants {
            if let Err(e) = participant.join().await {
                warn!(error = %e, "participant did not shut down cleanly");
                first_error.get_or_insert(e);
            }
        }
        info!("local network shut down");
        first_error.map_or(Ok(()), Err)
    }
}
