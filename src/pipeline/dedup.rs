//! Processed-transaction ledger
//!
//! Insertion-ordered list of processed keys with a hash index for O(1)
//! membership checks. The ordered list drives FIFO eviction when the ledger
//! is trimmed to its retention cap.
//!
//! On-disk shape (kept compatible with earlier state files):
//! ```json
//! { "processed_tx": ["Ethereum:USDT:0xabc...", "BSC:CAKE:0xdef..."] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Default number of processed keys kept between runs
pub const DEFAULT_MAX_PROCESSED: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StateFile", into = "StateFile")]
pub struct MonitorState {
    order: VecDeque<String>,
    index: HashSet<String>,
}

/// Serialized form of [`MonitorState`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    processed_tx: Vec<String>,
}

impl From<StateFile> for MonitorState {
    fn from(file: StateFile) -> Self {
        let mut state = MonitorState::new();
        for key in file.processed_tx {
            // Duplicates in an old file collapse onto their first position
            state.record(key);
        }
        state
    }
}

impl From<MonitorState> for StateFile {
    fn from(state: MonitorState) -> Self {
        Self {
            processed_tx: state.order.into_iter().collect(),
        }
    }
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` has not been processed yet
    pub fn is_novel(&self, key: &str) -> bool {
        !self.index.contains(key)
    }

    /// Append `key` as the most recent entry
    ///
    /// Returns false (and changes nothing) when the key is already present.
    pub fn record(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if !self.index.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        true
    }

    /// Keep only the `max_size` most recently recorded keys
    pub fn trim(&mut self, max_size: usize) {
        while self.order.len() > max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.index.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in insertion order, oldest first
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
