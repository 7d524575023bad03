//! Per-round message tallies.
//!
//! One [`Tally`] holds the values received for every round of one message
//! kind. Round entries are created lazily on the first message, values are
//! appended and never deduplicated, and each round carries a `fired` latch so
//! the quorum action runs at most once per round.

use std::collections::BTreeMap;

use benor_types::{Round, Value};

/// Value counts of one round's entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    pub zeros: usize,
    pub ones: usize,
    pub ambiguous: usize,
}

impl Counts {
    pub fn from_values(values: &[Value]) -> Self {
        values.iter().fold(Self::default(), |mut counts, value| {
            match value {
                Value::Zero => counts.zeros += 1,
                Value::One => counts.ones += 1,
                Value::Ambiguous => counts.ambiguous += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.zeros + self.ones + self.ambiguous
    }
}

#[derive(Debug, Default)]
struct RoundEntry {
    values: Vec<Value>,
    fired: bool,
}

#[derive(Debug, Default)]
pub struct Tally {
    rounds: BTreeMap<Round, RoundEntry>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a round and return the round's new size.
    pub fn record(&mut self, round: Round, value: Value) -> usize {
        let entry = self.rounds.entry(round).or_default();
        entry.values.push(value);
        entry.values.len()
    }

    /// Number of values received for a round.
    pub fn len(&self, round: Round) -> usize {
        self.rounds.get(&round).map_or(0, |entry| entry.values.len())
    }

    #[cfg(test)]
    fn values(&self, round: Round) -> &[Value] {
        self.rounds
            .get(&round)
            .map_or(&[][..], |entry| entry.values.as_slice())
    }

    #[cfg(test)]
    fn counts(&self, round: Round) -> Counts {
        Counts::from_values(self.values(round))
    }

    /// Whether the quorum action already ran for this round.
    #[cfg(test)]
    fn has_fired(&self, round: Round) -> bool {
        self.rounds.get(&round).is_some_and(|entry| entry.fired)
    }

    /// Latch the quorum action for `round`.
    ///
    /// Returns the round's counts the first time the round holds at least
    /// `quorum` values; `None` below quorum and on every later call.
    pub fn fire_at_quorum(&mut self, round: Round, quorum: usize) -> Option<Counts> {
        let entry = self.rounds.get_mut(&round)?;
        if entry.fired || entry.values.len() < quorum {
            return None;
        }
        entry.fired = true;
        Some(Counts::from_values(&entry.values))
    }

    #[cfg(test)]
    fn round_count(&self) -> usize {
        self.rounds.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }
}
