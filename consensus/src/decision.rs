//! The quorum rules, as pure functions of a round's counts.

use benor_types::{ProtocolParams, Value};

use crate::tally::Counts;

/// Vote to cast once a round's proposals reach quorum: the value held by a
/// strict majority of all N participants, otherwise [`Value::Ambiguous`].
pub fn vote_for(params: &ProtocolParams, proposals: Counts) -> Value {
    if params.is_majority(proposals.zeros) {
        Value::Zero
    } else if params.is_majority(proposals.ones) {
        Value::One
    } else {
        Value::Ambiguous
    }
}

/// How a round ends once its votes reach quorum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundConclusion {
    /// At least F + 1 votes for the value. Terminal.
    Decide(Value),
    /// No decision; carry the more frequent vote into the next round.
    Adopt(Value),
    /// No decision and no leader among the votes; flip the coin.
    Flip,
}

/// Apply the decision rule. Ambiguous votes count for neither value.
pub fn conclude(params: &ProtocolParams, votes: Counts) -> RoundConclusion {
    let threshold = params.decision_threshold();
    if votes.zeros >= threshold {
        RoundConclusion::Decide(Value::Zero)
    } else if votes.ones >= threshold {
        RoundConclusion::Decide(Value::One)
    } else if votes.zeros > votes.ones {
        RoundConclusion::Adopt(Value::Zero)
    } else if votes.ones > votes.zeros {
        RoundConclusion::Adopt(Value::One)
    } else {
        RoundConclusion::Flip
    }
}
