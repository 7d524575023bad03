use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("peer {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}
