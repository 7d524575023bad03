//! HTTP server for one Ben-Or participant.
//!
//! Provides endpoints for:
//! - Message intake (`POST /message`)
//! - Lifecycle control (`GET /start`, `GET /stop`)
//! - Liveness and state (`GET /status`, `GET /getState`)
//! - Prometheus metrics (`GET /metrics`)

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use handlers::{router, RpcState};
pub use metrics::ParticipantMetrics;
pub use server::RpcServer;
