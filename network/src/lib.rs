//! HTTP networking for Ben-Or participants.
//!
//! Every participant listens on `host:base_port + index`. This crate holds the
//! client side of that surface:
//!
//! - [`HttpTransport`] delivers consensus messages with `POST /message`, one
//!   detached task per target, never reporting failures back to the engine.
//! - [`PeerProbe`] polls each peer's `GET /status` and registers reachable
//!   peers on the [`ReadinessBarrier`](benor_consensus::ReadinessBarrier).
//! - [`PeerClient`] is a typed client for the rest of a peer's surface, used
//!   by launchers and tests.

pub mod client;
pub mod error;
pub mod http;
pub mod probe;

pub use client::{PeerClient, PeerStatus};
pub use error::NetworkError;
pub use http::{HttpTransport, PeerAddressing};
pub use probe::PeerProbe;
