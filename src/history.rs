//! Repetition history of the current game line.

use crate::constants::REPETITION_LIMIT;

/// Keys of every position in the game line, oldest first, including the
/// position currently on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardHistory {
    keys: Vec<u64>,
}

impl BoardHistory {
    pub fn new(start_key: u64) -> Self {
        Self {
            keys: vec![start_key],
        }
    }

    pub fn push(&mut self, key: u64) {
        self.keys.push(key);
    }

    pub fn pop(&mut self) -> Option<u64> {
        self.keys.pop()
    }

    /// Drop entries so that at most `len` remain.
    pub fn truncate(&mut self, len: usize) {
        self.keys.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn last(&self) -> Option<u64> {
        self.keys.last().copied()
    }

    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    pub fn count(&self, key: u64) -> usize {
        self.keys.iter().filter(|&&k| k == key).count()
    }

    /// True once `key` has occurred three times in the line.
    pub fn is_threefold(&self, key: u64) -> bool {
        self.count(key) >= REPETITION_LIMIT
    }
}
