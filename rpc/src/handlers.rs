//! RPC request handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use benor_consensus::ConsensusEngine;
use benor_types::{ConsensusMessage, NodeState};
use tracing::{debug, trace};

use crate::error::RpcError;
use crate::metrics::ParticipantMetrics;

/// Shared state behind every handler of one participant.
pub struct RpcState {
    pub engine: Arc<ConsensusEngine>,
    pub metrics: Arc<ParticipantMetrics>,
}

impl RpcState {
    pub fn new(engine: Arc<ConsensusEngine>, metrics: Arc<ParticipantMetrics>) -> Self {
        Self { engine, metrics }
    }
}

pub fn router(state: Arc<RpcState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/getState", get(get_state))
        .route("/start", get(start))
        .route("/stop", get(stop))
        .route("/message", post(message))
        .route("/metrics", get(metrics))
        .with_state(state)
}

// ── Liveness & state ─────────────────────────────────────────────────────

async fn status(State(state): State<Arc<RpcState>>) -> impl IntoResponse {
    if state.engine.is_faulty() {
        (StatusCode::INTERNAL_SERVER_ERROR, "faulty")
    } else {
        (StatusCode::OK, "live")
    }
}

async fn get_state(State(state): State<Arc<RpcState>>) -> Json<NodeState> {
    Json(state.engine.state())
}

// ── Lifecycle ────────────────────────────────────────────────────────────

/// Start runs detached because it may wait on the readiness barrier
/// indefinitely.
async fn start(State(state): State<Arc<RpcState>>) -> &'static str {
    let engine = state.engine.clone();
    let metrics = state.metrics.clone();
    tokio::spawn(async move {
        let outcome = engine.start().await;
        debug!(node = %engine.id(), ?outcome, "start finished");
        metrics.observe_start(outcome);
        metrics.observe_state(&engine.state());
    });
    "started"
}

async fn stop(State(state): State<Arc<RpcState>>) -> &'static str {
    state.engine.stop();
    state.metrics.observe_state(&state.engine.state());
    "stopped"
}

// ── Message intake ───────────────────────────────────────────────────────

async fn message(
    State(state): State<Arc<RpcState>>,
    body: Result<Json<ConsensusMessage>, JsonRejection>,
) -> Result<&'static str, RpcError> {
    let Json(message) = body.map_err(|e| {
        trace!(node = %state.engine.id(), error = %e, "rejecting malformed message");
        RpcError::InvalidRequest(e.body_text())
    })?;

    let outcome = state.engine.on_message(message);
    trace!(node = %state.engine.id(), ?message, ?outcome, "message handled");
    state.metrics.observe_message(message.kind, &outcome);
    state.metrics.observe_state(&state.engine.state());
    Ok("received")
}

// ── Metrics ──────────────────────────────────────────────────────────────

async fn metrics(State(state): State<Arc<RpcState>>) -> Result<impl IntoResponse, RpcError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use benor_consensus::{EngineConfig, ReadinessBarrier};
    use benor_nullables::{NullCoin, NullTransport};
    use benor_types::{MessageKind, NodeId, ProtocolParams, Round, Value};
    use tower::ServiceExt;

    struct Fixture {
        app: Router,
        state: Arc<RpcState>,
        transport: Arc<NullTransport>,
    }

    fn fixture(faulty: bool) -> Fixture {
        let transport = Arc::new(NullTransport::new());
        let barrier = Arc::new(ReadinessBarrier::new(4));
        for id in NodeId::all(4) {
            barrier.mark_ready(id);
        }
        let engine = ConsensusEngine::new(
            EngineConfig {
                id: NodeId::new(1),
                params: ProtocolParams::new(4, 1).unwrap(),
                initial: Value::One,
                faulty,
            },
            transport.clone(),
            Arc::new(NullCoin::constant(Value::Zero)),
            barrier,
        )
        .unwrap();
        let state = Arc::new(RpcState::new(
            Arc::new(engine),
            Arc::new(ParticipantMetrics::new()),
        ));
        Fixture {
            app: router(state.clone()),
            state,
            transport,
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::post("/message")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn status_reports_live() {
        let f = fixture(false);
        assert_eq!(call(&f.app, get("/status")).await, (StatusCode::OK, "live".into()));
    }

    #[tokio::test]
    async fn status_reports_faulty_as_500() {
        let f = fixture(true);
        assert_eq!(
            call(&f.app, get("/status")).await,
            (StatusCode::INTERNAL_SERVER_ERROR, "faulty".into())
        );
    }

    #[tokio::test]
    async fn get_state_of_fresh_participant() {
        let f = fixture(false);
        let (status, body) = call(&f.app, get("/getState")).await;
        assert_eq!(status, StatusCode::OK);
        let state: NodeState = serde_json::from_str(&body).unwrap();
        assert_eq!(state, NodeState::inert(Value::One));
    }

    #[tokio::test]
    async fn get_state_of_faulty_participant_is_null() {
        let f = fixture(true);
        let (_, body) = call(&f.app, get("/getState")).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"killed": false, "x": null, "decided": null, "k": null})
        );
    }

    #[tokio::test]
    async fn start_runs_in_background() {
        let f = fixture(false);
        assert_eq!(call(&f.app, get("/start")).await, (StatusCode::OK, "started".into()));

        for _ in 0..100 {
            if f.state.engine.state().k == Some(Round::FIRST) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(f.state.engine.state().k, Some(Round::FIRST));
        assert_eq!(f.transport.sent_of_kind(MessageKind::Propose).len(), 4);
    }

    #[tokio::test]
    async fn stop_kills_participant() {
        let f = fixture(false);
        assert_eq!(call(&f.app, get("/stop")).await, (StatusCode::OK, "stopped".into()));
        assert!(f.state.engine.state().killed);
    }

    #[tokio::test]
    async fn message_is_tallied() {
        let f = fixture(false);
        let (status, _) = call(&f.app, post_json(r#"{"round":1,"value":1,"kind":"propose"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(f.state.engine.tally_len(MessageKind::Propose, Round::FIRST), 1);
        assert_eq!(f.state.metrics.proposals_received.get(), 1);
    }

    #[tokio::test]
    async fn ambiguous_vote_is_accepted() {
        let f = fixture(false);
        let (status, _) = call(&f.app, post_json(r#"{"round":2,"value":"?","kind":"vote"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(f.state.engine.tally_len(MessageKind::Vote, Round::new(2)), 1);
    }

    #[tokio::test]
    async fn malformed_message_is_400_and_not_tallied() {
        let f = fixture(false);
        for body in [
            "not json",
            r#"{"round":1,"value":2,"kind":"propose"}"#,
            r#"{"round":1,"value":"maybe","kind":"vote"}"#,
            r#"{"round":1,"value":1,"kind":"commit"}"#,
            r#"{"value":1,"kind":"propose"}"#,
        ] {
            let (status, _) = call(&f.app, post_json(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        }
        assert_eq!(f.state.engine.tally_len(MessageKind::Propose, Round::FIRST), 0);
        assert_eq!(f.state.metrics.proposals_received.get(), 0);
    }

    #[tokio::test]
    async fn metrics_are_exposed() {
        let f = fixture(false);
        call(&f.app, post_json(r#"{"round":1,"value":0,"kind":"propose"}"#)).await;
        let (status, body) = call(&f.app, get("/metrics")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("benor_proposals_received_total 1"));
    }
}
