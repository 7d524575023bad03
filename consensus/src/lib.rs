//! Consensus: randomized binary agreement (Ben-Or).
//!
//! Each participant runs one [`ConsensusEngine`]. Rounds alternate a proposal
//! phase and a vote phase, both gated on an `N - F` quorum of same-round
//! messages. `F + 1` votes for one value decide it; anything less carries the
//! leading value (or a fair coin flip) into the next round.
//!
//! ## Module overview
//!
//! - [`engine`]: the per-participant state machine, fault gate and lifecycle.
//! - [`tally`]: per-round proposal/vote tables with a fire-once latch.
//! - [`decision`]: the majority and decision rules as pure functions.
//! - [`transport`]: the outbound message capability injected into the engine.
//! - [`coin`]: the randomized tie-break.
//! - [`readiness`]: the barrier `start()` waits on.
//! - [`error`]: consensus error types.

pub mod coin;
pub mod decision;
pub mod engine;
pub mod error;
pub mod readiness;
pub mod tally;
pub mod transport;

pub use coin::{Coin, RandomCoin, SeededCoin};
pub use decision::{conclude, vote_for, RoundConclusion};
pub use engine::{
    ConsensusEngine, EngineConfig, IgnoreReason, MessageOutcome, StartOutcome,
};
pub use error::ConsensusError;
pub use readiness::ReadinessBarrier;
pub use tally::{Counts, Tally};
pub use transport::Transport;
