//! Fire-and-forget message delivery over HTTP.
//!
//! [`HttpTransport::send`] never blocks and never fails: it spawns one task per
//! target on the current tokio runtime and logs delivery problems at `debug`.
//! A peer that is down simply misses the message, which the protocol already
//! tolerates for up to `F` participants.

use std::time::Duration;

use benor_consensus::Transport;
use benor_types::{ConsensusMessage, NodeId};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::error::NetworkError;

/// Maps participant ids to their HTTP endpoints (`http://host:base_port + index`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerAddressing {
    host: String,
    base_port: u16,
}

impl PeerAddressing {
    pub fn new(host: impl Into<String>, base_port: u16) -> Self {
        Self {
            host: host.into(),
            base_port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base_port(&self) -> u16 {
        self.base_port
    }

    pub fn base_url(&self, id: NodeId) -> String {
        format!("http://{}:{}", self.host, id.port(self.base_port))
    }

    /// Full URL of `path` (which must start with `/`) on participant `id`.
    pub fn url(&self, id: NodeId, path: &str) -> String {
        format!("{}{}", self.base_url(id), path)
    }
}

/// Build the shared `reqwest` client with the given request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, NetworkError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| NetworkError::Client(e.to_string()))
}

/// [`Transport`] that posts each message to the target's `/message` endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    addressing: PeerAddressing,
}

impl HttpTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(addressing: PeerAddressing, timeout: Duration) -> Result<Self, NetworkError> {
        Ok(Self {
            client: build_client(timeout)?,
            addressing,
        })
    }

    pub fn addressing(&self) -> &PeerAddressing {
        &self.addressing
    }
}

impl Transport for HttpTransport {
    fn send(&self, target: NodeId, message: ConsensusMessage) {
        let Ok(handle) = Handle::try_current() else {
            warn!(peer = %target, "no tokio runtime, dropping outbound message");
            return;
        };

        let client = self.client.clone();
        let url = self.addressing.url(target, "/message");
        handle.spawn(async move {
            match client.post(&url).json(&message).send().await {
                Ok(response) if response.status().is_success() => {
                    trace!(peer = %target, k = %message.round, kind = ?message.kind, "delivered");
                }
                Ok(response) => {
                    debug!(peer = %target, status = response.status().as_u16(), "peer rejected message");
                }
                Err(e) => {
                    debug!(peer = %target, error = %e, "message delivery failed");
                }
            }
        });
    }
}
