//! Nullable coin: scripted flips.

use std::sync::Mutex;

use benor_consensus::Coin;
use benor_types::Value;

/// A coin that returns pre-configured values in order, cycling when exhausted.
pub struct NullCoin {
    outputs: Mutex<Vec<Value>>,
    index: Mutex<usize>,
    flips: Mutex<usize>,
}

impl NullCoin {
    /// Create with a sequence of flips. Panics if the sequence is empty or
    /// contains the ambiguous marker.
    pub fn new(outputs: Vec<Value>) -> Self {
        assert!(!outputs.is_empty(), "NullCoin needs at least one output");
        assert!(
            outputs.iter().all(Value::is_binary),
            "coin flips must be 0 or 1"
        );
        Self {
            outputs: Mutex::new(outputs),
            index: Mutex::new(0),
            flips: Mutex::new(0),
        }
    }

    /// Create a coin that always lands on `value`.
    pub fn constant(value: Value) -> Self {
        Self::new(vec![value])
    }

    /// How many times the coin has been flipped.
    pub fn flips(&self) -> usize {
        *self.flips.lock().unwrap()
    }
}

impl Coin for NullCoin {
    fn flip(&self) -> Value {
        let outputs = self.outputs.lock().unwrap();
        let mut idx = self.index.lock().unwrap();
        let current = *idx % outputs.len();
        *idx += 1;
        *self.flips.lock().unwrap() += 1;
        outputs[current]
    }
}
