//! Round numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A participant-local round counter.
///
/// `0` means inert (not started). A started participant is at round 1 and
/// advances by exactly one each time a round ends without a decision.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Round(u64);

impl Round {
    /// Not started.
    pub const INERT: Self = Self(0);

    /// The round every participant enters on start.
    pub const FIRST: Self = Self(1);

    pub fn new(k: u64) -> Self {
        Self(k)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn is_inert(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
