//! Fundamental types for the Ben-Or consensus protocol.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! participant identities, round numbers, the binary value domain, wire messages,
//! state snapshots, and the protocol parameters (N, F) with their thresholds.

pub mod error;
pub mod message;
pub mod node;
pub mod params;
pub mod round;
pub mod state;
pub mod value;

pub use error::TypesError;
pub use message::{ConsensusMessage, MessageKind};
pub use node::NodeId;
pub use params::ProtocolParams;
pub use round::Round;
pub use state::NodeState;
pub use value::Value;
