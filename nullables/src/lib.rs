//! Nullable infrastructure for deterministic testing.
//!
//! The consensus engine reaches the outside world only through the
//! [`Transport`](benor_consensus::Transport) and [`Coin`](benor_consensus::Coin)
//! traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod coin;
pub mod network;
pub mod sim;

pub use coin::NullCoin;
pub use network::NullTransport;
pub use sim::{Envelope, SimNetwork};
