//! One participant: a consensus engine behind its HTTP server.
//!
//! Launching binds the listener first and registers the participant on its
//! readiness barrier before serving, so a participant is never counted ready
//! while its port is still closed.

use std::net::SocketAddr;
use std::sync::Arc;

use benor_consensus::{ConsensusEngine, EngineConfig, ReadinessBarrier};
use benor_network::HttpTransport;
use benor_rpc::{ParticipantMetrics, RpcError, RpcServer, RpcState};
use benor_types::{NodeId, NodeState, ProtocolParams};
use tokio::task::JoinHandle;
use tracing::{info, Instrument};

use crate::config::NetworkConfig;
use crate::logging::participant_span;
use crate::shutdown::ShutdownController;
use crate::NodeError;

pub struct Participant {
    engine: Arc<ConsensusEngine>,
    metrics: Arc<ParticipantMetrics>,
    addr: SocketAddr,
    server: JoinHandle<Result<(), RpcError>>,
}

impl Participant {
    /// Build participant `id` of the network described by `config` and start
    /// serving until `shutdown` fires.
    pub async fn launch(
        config: &NetworkConfig,
        params: ProtocolParams,
        id: NodeId,
        barrier: Arc<ReadinessBarrier>,
        shutdown: &ShutdownController,
    ) -> Result<Self, NodeError> {
        let transport = Arc::new(HttpTransport::new(
            config.addressing(),
            HttpTransport::DEFAULT_TIMEOUT,
        )?);
        let engine = Arc::new(ConsensusEngine::new(
            EngineConfig {
                id,
                params,
                initial: config.initial_value(id),
                faulty: config.is_faulty(id),
            },
            transport,
            config.coin_for(id),
            barrier.clone(),
        )?);
        let metrics = Arc::new(ParticipantMetrics::new());
        metrics.observe_state(&engine.state());

        let state = Arc::new(RpcState::new(engine.clone(), metrics.clone()));
        let server = RpcServer::bind(&config.listen_addr(id), state).await?;
        let addr = server.local_addr()?;
        barrier.mark_ready(id);

        info!(
            node = %id,
            %addr,
            faulty = engine.is_faulty(),
            initial = %engine.initial_value(),
            "participant launched"
        );

        let server = tokio::spawn(
            server
                .serve(shutdown.signalled())
                .instrument(participant_span(id)),
        );

        Ok(Self {
            engine,
            metrics,
            addr,
            server,
        })
    }

    pub fn id(&self) -> NodeId {
        self.engine.id()
    }

    pub fn engine(&self) -> &Arc<ConsensusEngine> {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<ParticipantMetrics> {
        &self.metrics
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> NodeState {
        self.engine.state()
    }

    /// Wait for the server task to finish after shutdown.
    pub async fn join(self) -> Result<(), NodeError> {
        self.server
            .await
            .map_err(|e| NodeError::Task(e.to_string()))??;
        Ok(())
    }
}
