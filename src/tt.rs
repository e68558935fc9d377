//! Transposition table keyed by Zobrist hash.
//!
//! Fixed-size, always-replace. The slot is `key % len`; a stored entry only
//! counts as a hit when its full key matches.

use crate::position::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Score is a lower bound (the search failed high).
    Lower,
    /// Score is an upper bound (the search failed low).
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub key: u64,
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

/// Outcome of [`TranspositionTable::probe`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Probe {
    /// Score that can be returned without searching.
    pub score: Option<i32>,
    pub best_move: Option<Move>,
}

/// Hit and store counters, reset by [`TranspositionTable::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TtStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<Entry>>,
    stats: TtStats,
}

impl TranspositionTable {
    /// Table with exactly `len` slots (at least one).
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![None; len.max(1)],
            stats: TtStats::default(),
        }
    }

    pub fn with_size_mb(mb: usize) -> Self {
        let bytes = mb.saturating_mul(1024 * 1024);
        let len = bytes / std::mem::size_of::<Option<Entry>>();
        Self::new(len)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    /// Look up `key` for a search of `depth` plies inside `(alpha, beta)`.
    ///
    /// The stored move is returned even when the entry is too shallow or its
    /// bound does not settle the window.
    pub fn probe(&mut self, key: u64, depth: u8, alpha: i32, beta: i32) -> Probe {
        self.stats.probes += 1;
        let Some(entry) = self.peek(key) else {
            return Probe::default();
        };
        self.stats.hits += 1;

        let score = if entry.depth < depth {
            None
        } else {
            match entry.bound {
                Bound::Exact => Some(entry.score),
                Bound::Lower if entry.score >= beta => Some(entry.score),
                Bound::Upper if entry.score <= alpha => Some(entry.score),
                _ => None,
            }
        };
        Probe {
            score,
            best_move: entry.best_move,
        }
    }

    /// Read-only lookup that leaves the counters untouched.
    pub fn peek(&self, key: u64) -> Option<Entry> {
        self.entries[self.index(key)].filter(|e| e.key == key)
    }

    pub fn store(&mut self, key: u64, score: i32, depth: u8, bound: Bound, best_move: Option<Move>) {
        let idx = self.index(key);
        self.entries[idx] = Some(Entry {
            key,
            depth,
            score,
            bound,
            best_move,
        });
        self.stats.stores += 1;
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.stats = TtStats::default();
    }

    pub fn stats(&self) -> TtStats {
        self.stats
    }

    /// Number of occupied slots.
    pub fn filled(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PieceKind, Square};

    fn e2e4() -> Move {
        Move::quiet(
            Square::parse("e2").unwrap(),
            Square::parse("e4").unwrap(),
            PieceKind::Pawn,
        )
    }

    #[test]
    fn exact_entry_usable_at_equal_or_lower_depth() {
        let mut tt = TranspositionTable::new(64);
        tt.store(7, 35, 4, Bound::Exact, Some(e2e4()));

        assert_eq!(tt.probe(7, 4, -100, 100).score, Some(35));
        assert_eq!(tt.probe(7, 1, -100, 100).score, Some(35));

        let deeper = tt.probe(7, 5, -100, 100);
        assert_eq!(deeper.score, None);
        assert_eq!(deeper.best_move, Some(e2e4()));
    }

    #[test]
    fn bounds_only_settle_matching_windows() {
        let mut tt = TranspositionTable::new(64);
        tt.store(1, 50, 3, Bound::Lower, None);
        assert_eq!(tt.probe(1, 3, -10, 40).score, Some(50));
        assert_eq!(tt.probe(1, 3, -10, 60).score, None);

        tt.store(2, -50, 3, Bound::Upper, None);
        assert_eq!(tt.probe(2, 3, -40, 10).score, Some(-50));
        assert_eq!(tt.probe(2, 3, -60, 10).score, None);
    }

    #[test]
    fn probe_requires_matching_key() {
        let mut tt = TranspositionTable::new(8);
        tt.store(3, 0, 2, Bound::Exact, None);
        assert_eq!(tt.peek(3).map(|e| e.depth), Some(2));
        // 11 % 8 == 3 lands in the same slot.
        assert_eq!(tt.probe(11, 0, -1, 1), Probe::default());
        assert_eq!(tt.stats().hits, 0);
        assert_eq!(tt.stats().probes, 1);
    }

    #[test]
    fn store_always_replaces() {
        let mut tt = TranspositionTable::new(8);
        tt.store(3, 0, 6, Bound::Exact, None);
        tt.store(11, 0, 1, Bound::Exact, None);
        assert_eq!(tt.peek(3), None);
        assert_eq!(tt.peek(11).map(|e| e.depth), Some(1));
        assert_eq!(tt.filled(), 1);
    }

    #[test]
    fn clear_empties_table() {
        let mut tt = TranspositionTable::with_size_mb(1);
        assert!(tt.len() > 1000);
        tt.store(5, 0, 1, Bound::Exact, None);
        tt.clear();
        assert_eq!(tt.peek(5), None);
        assert_eq!(tt.filled(), 0);
        assert_eq!(tt.stats(), TtStats::default());
    }

    #[test]
    fn zero_sized_table_still_has_a_slot() {
        let mut tt = TranspositionTable::with_size_mb(0);
        assert_eq!(tt.len(), 1);
        tt.store(99, 0, 1, Bound::Upper, None);
        assert!(tt.peek(99).is_some());
    }
}
