//! Peer readiness probing for participants running in separate processes.
//!
//! A standalone participant cannot see its peers' listeners directly, so the
//! probe polls every peer's `/status` at a fixed interval and registers each
//! one on the readiness barrier the first time it answers. Polling stops once
//! the barrier is complete or shutdown is signalled.

use std::sync::Arc;
use std::time::Duration;

use benor_consensus::ReadinessBarrier;
use benor_types::NodeId;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::client::PeerClient;

pub struct PeerProbe {
    client: PeerClient,
    barrier: Arc<ReadinessBarrier>,
    interval: Duration,
}

impl PeerProbe {
    pub fn new(client: PeerClient, barrier: Arc<ReadinessBarrier>, interval: Duration) -> Self {
        Self {
            client,
            barrier,
            interval,
        }
    }

    /// Query every peer not yet registered once. Returns how many were newly
    /// registered.
    pub async fn probe_once(&self) -> usize {
        let mut registered = 0;
        for id in NodeId::all(self.barrier.expected()) {
            if self.barrier.is_ready(id) {
                continue;
            }
            match self.client.status(id).await {
                Ok(status) => {
                    trace!(peer = %id, ?status, "peer answered");
                    if self.barrier.mark_ready(id) {
                        registered += 1;
                    }
                }
                Err(e) => trace!(peer = %id, error = %e, "peer not reachable yet"),
            }
        }
        registered
    }

    /// Poll until every peer is registered or `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!(ready = self.barrier.ready_count(), "peer probe stopped by shutdown");
                    return;
                }
                _ = ticker.tick() => {
                    let registered = self.probe_once().await;
                    if registered > 0 {
                        debug!(
                            registered,
                            ready = self.barrier.ready_count(),
                            expected = self.barrier.expected(),
                            "peers became reachable"
                        );
                    }
                    if self.barrier.all_ready() {
                        info!(expected = self.barrier.expected(), "all peers reachable");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::PeerAddressing;
    use axum::{routing::get, Router};

    async fn serve_status() -> u16 {
        let app = Router::new().route("/status", get(|| async { "live" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        port
    }

    fn probe(port: u16, barrier: Arc<ReadinessBarrier>) -> PeerProbe {
        let client =
            PeerClient::new(PeerAddressing::new("127.0.0.1", port), Duration::from_millis(500))
                .unwrap();
        PeerProbe::new(client, barrier, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn registers_answering_peer() {
        let port = serve_status().await;
        let barrier = Arc::new(ReadinessBarrier::new(1));
        assert_eq!(probe(port, barrier.clone()).probe_once().await, 1);
        assert!(barrier.all_ready());
    }

    #[tokio::test]
    async fn run_returns_once_barrier_completes() {
        let port = serve_status().await;
        let barrier = Arc::new(ReadinessBarrier::new(1));
        let (_tx, rx) = broadcast::channel(1);
        tokio::time::timeout(Duration::from_secs(5), probe(port, barrier.clone()).run(rx))
            .await
            .unwrap();
        assert!(barrier.all_ready());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        // Port 1 refuses connections, so the barrier never completes.
        let barrier = Arc::new(ReadinessBarrier::new(1));
        let (tx, rx) = broadcast::channel(1);
        let task = tokio::spawn(probe(1, barrier.clone()).run(rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(!barrier.all_ready());
    }
}
