//! Ben-Or participant nodes: configuration, process plumbing and launchers.
//!
//! A participant is a [`ConsensusEngine`](benor_consensus::ConsensusEngine)
//! served over HTTP on `base_port + index`. This crate wires one up from a
//! [`NetworkConfig`] and provides two ways to run them:
//! - [`LocalNetwork`] launches all N participants in one process, sharing a
//!   readiness barrier.
//! - [`StandaloneNode`] runs a single participant whose readiness comes from
//!   probing its peers over HTTP.

pub mod config;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod participant;
pub mod shutdown;
pub mod standalone;

pub use config::NetworkConfig;
pub use error::NodeError;
pub use launcher::LocalNetwork;
pub use logging::{init_logging, participant_span, LogFormat};
pub use participant::Participant;
pub use shutdown::ShutdownController;
pub use standalone::StandaloneNode;
