//! Participant state record, as held by the engine and reported to observers.

use serde::{Deserialize, Serialize};

use crate::{Round, Value};

/// `{killed, x, decided, k}` for one participant.
///
/// `None` fields are the null marker: a stopped participant has no value,
/// decision flag, or round, and a faulty participant always reports all three
/// as `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub killed: bool,
    pub x: Option<Value>,
    pub decided: Option<bool>,
    pub k: Option<Round>,
}

impl NodeState {
    /// A freshly constructed, not yet started participant.
    pub fn inert(initial: Value) -> Self {
        Self {
            killed: false,
            x: Some(initial),
            decided: Some(false),
            k: Some(Round::INERT),
        }
    }

    /// The null triple, keeping the `killed` flag.
    pub fn null(killed: bool) -> Self {
        Self {
            killed,
            x: None,
            decided: None,
            k: None,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.decided == Some(true)
    }

    /// The decided value, if this participant has decided.
    pub fn decision(&self) -> Option<Value> {
        if self.is_decided() {
            self.x
        } else {
            None
        }
    }

    /// Current round, treating the null marker as inert.
    pub fn round(&self) -> Round {
        self.k.unwrap_or(Round::INERT)
    }
}
