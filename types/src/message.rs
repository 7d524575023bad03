//! Wire messages exchanged between participants.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Round, Value};

/// The two protocol message kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Propose,
    Vote,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propose => "propose",
            Self::Vote => "vote",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `POST /message`: `{"round": k, "value": x, "kind": "propose" | "vote"}`.
///
/// Carries no sender identity; tallies count values, not senders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMessage {
    pub round: Round,
    pub value: Value,
    pub kind: MessageKind,
}

impl ConsensusMessage {
    pub fn propose(round: Round, value: Value) -> Self {
        Self {
            round,
            value,
            kind: MessageKind::Propose,
        }
    }

    pub fn vote(round: Round, value: Value) -> Self {
        Self {
            round,
            value,
            kind: MessageKind::Vote,
        }
    }
}
