//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::RpcError;
use crate::handlers::{router, RpcState};

/// A participant's HTTP server with its listener already bound.
///
/// Binding and serving are split so that the caller can register readiness
/// between the two: once [`RpcServer::bind`] returns, peers can connect.
pub struct RpcServer {
    listener: TcpListener,
    state: Arc<RpcState>,
}

impl RpcServer {
    pub async fn bind(addr: &str, state: Arc<RpcState>) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| RpcError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        self.listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(node = %self.state.engine.id(), %addr, "rpc server listening");
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ParticipantMetrics;
    use benor_consensus::{ConsensusEngine, EngineConfig, ReadinessBarrier};
    use benor_nullables::{NullCoin, NullTransport};
    use benor_types::{NodeId, ProtocolParams, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state() -> Arc<RpcState> {
        let engine = ConsensusEngine::new(
            EngineConfig {
                id: NodeId::new(0),
                params: ProtocolParams::new(1, 0).unwrap(),
                initial: Value::Zero,
                faulty: false,
            },
            Arc::new(NullTransport::new()),
            Arc::new(NullCoin::constant(Value::Zero)),
            Arc::new(ReadinessBarrier::new(1)),
        )
        .unwrap();
        Arc::new(RpcState::new(
            Arc::new(engine),
            Arc::new(ParticipantMetrics::new()),
        ))
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let server = RpcServer::bind("127.0.0.1:0", state()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(server.serve(async move {
            let _ = rx.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("live"));

        tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let first = RpcServer::bind("127.0.0.1:0", state()).await.unwrap();
        let addr = first.local_addr().unwrap().to_string();
        assert!(matches!(
            RpcServer::bind(&addr, state()).await,
            Err(RpcError::Bind { .. })
        ));
    }
}
