//! Typed client for a participant's HTTP surface.

use std::time::Duration;

use benor_types::{ConsensusMessage, NodeId, NodeState};

use crate::error::NetworkError;
use crate::http::{build_client, PeerAddressing};

/// Liveness as reported by `GET /status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerStatus {
    Live,
    Faulty,
}

#[derive(Clone)]
pub struct PeerClient {
    http: reqwest::Client,
    addressing: PeerAddressing,
}

impl PeerClient {
    pub fn new(addressing: PeerAddressing, timeout: Duration) -> Result<Self, NetworkError> {
        Ok(Self {
            http: build_client(timeout)?,
            addressing,
        })
    }

    pub fn addressing(&self) -> &PeerAddressing {
        &self.addressing
    }

    /// `GET /status`. Any answer, `"live"` or `"faulty"`, means the peer's
    /// listener is up.
    pub async fn status(&self, id: NodeId) -> Result<PeerStatus, NetworkError> {
        let url = self.addressing.url(id, "/status");
        let response = self.get(&url).await?;
        match response.status().as_u16() {
            200 => Ok(PeerStatus::Live),
            500 => Ok(PeerStatus::Faulty),
            status => Err(NetworkError::Status { url, status }),
        }
    }

    /// `GET /getState`.
    pub async fn state(&self, id: NodeId) -> Result<NodeState, NetworkError> {
        let url = self.addressing.url(id, "/getState");
        let response = self.get_ok(&url).await?;
        response
            .json::<NodeState>()
            .await
            .map_err(|e| NetworkError::InvalidResponse {
                url,
                reason: e.to_string(),
            })
    }

    /// `GET /start`. Returns once the peer has accepted the request; the peer
    /// itself may still be waiting for readiness.
    pub async fn start(&self, id: NodeId) -> Result<(), NetworkError> {
        let url = self.addressing.url(id, "/start");
        self.get_ok(&url).await.map(drop)
    }

    /// `GET /stop`.
    pub async fn stop(&self, id: NodeId) -> Result<(), NetworkError> {
        let url = self.addressing.url(id, "/stop");
        self.get_ok(&url).await.map(drop)
    }

    /// `POST /message`, awaiting the peer's acknowledgement.
    pub async fn deliver(&self, id: NodeId, message: &ConsensusMessage) -> Result<(), NetworkError> {
        let url = self.addressing.url(id, "/message");
        let response = self
            .http
            .post(&url)
            .json(message)
            .send()
            .await
            .map_err(|e| NetworkError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        check_success(url, response).map(drop)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, NetworkError> {
        self.http
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response, NetworkError> {
        let response = self.get(url).await?;
        check_success(url.to_string(), response)
    }
}

fn check_success(url: String, response: reqwest::Response) -> Result<reqwest::Response, NetworkError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(NetworkError::Status {
            url,
            status: response.status().as_u16(),
        })
    }
}
