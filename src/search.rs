//! NegaMax search with alpha-beta pruning.
//!
//! The searcher keeps its transposition table between calls. Each call runs
//! iterative deepening from one ply up to the requested depth; a time cap,
//! when given, is checked every few thousand nodes and the last completed
//! iteration wins.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use fastrand::Rng;
use log::debug;

use crate::constants::{
    CHECK_INTERVAL_NODES, DEFAULT_TT_MB, INFINITY, MATE_SCORE, MATE_THRESHOLD, PV_MAX_LEN,
};
use crate::eval::evaluate_relative;
use crate::history::BoardHistory;
use crate::movegen::{generate_legal_moves, has_legal_move, in_check, is_insufficient_material};
use crate::ordering::order_moves;
use crate::position::{Move, Position};
use crate::tt::{Bound, TranspositionTable, TtStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: u8,
    pub max_time: Option<Duration>,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        Self {
            depth,
            max_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// Score from the side to move's point of view.
    pub score: i32,
    /// Deepest fully completed iteration.
    pub depth: u8,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

#[derive(Debug, Clone, Copy)]
struct AbortSearch;

#[derive(Debug)]
pub struct Searcher {
    tt: TranspositionTable,
    nodes: u64,
    stop: bool,
    time_limit: Option<Duration>,
    started_at: Instant,
    /// Shuffles root moves so equally scored moves vary between games.
    rng: Rng,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(DEFAULT_TT_MB)
    }
}

impl Searcher {
    pub fn new(tt_size_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::with_size_mb(tt_size_mb),
            nodes: 0,
            stop: false,
            time_limit: None,
            started_at: Instant::now(),
            rng: Rng::new(),
        }
    }

    /// Fix the root tie-break order, e.g. for reproducible self-play.
    pub fn seed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    pub fn tt_stats(&self) -> TtStats {
        self.tt.stats()
    }

    /// Forget everything learned so far, e.g. when a new game starts.
    pub fn clear(&mut self) {
        self.tt.clear();
    }

    /// Search `position`, whose game line so far is `history` (ending with
    /// the position's own key).
    pub fn search(
        &mut self,
        position: &Position,
        history: &BoardHistory,
        limits: SearchLimits,
    ) -> SearchResult {
        self.nodes = 0;
        self.stop = false;
        self.time_limit = limits.max_time;
        self.started_at = Instant::now();

        let mut working = position.clone();
        let mut line = history.clone();
        let mut result = SearchResult {
            best_move: None,
            score: 0,
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
        };

        for depth in 1..=limits.depth.max(1) {
            if self.should_stop() {
                break;
            }
            match self.search_root(&mut working, &mut line, depth) {
                Ok((best_move, score)) => {
                    result.best_move = best_move;
                    result.score = score;
                    result.depth = depth;
                    result.pv = self.extract_pv_line(position);
                    debug!(
                        "depth {depth} score {} nodes {} pv {}",
                        format_score(score),
                        self.nodes,
                        format_line(&result.pv)
                    );
                }
                Err(AbortSearch) => {
                    debug!("depth {depth} aborted after {} nodes", self.nodes);
                    break;
                }
            }
        }

        // Out of time before the first iteration finished: take the best
        // ordered legal move rather than nothing.
        if result.best_move.is_none() && result.depth == 0 {
            let mut moves = generate_legal_moves(position);
            let tt_move = self.tt.peek(position.key()).and_then(|e| e.best_move);
            order_moves(&mut moves, tt_move);
            result.best_move = moves.first().copied();
        }

        result.nodes = self.nodes;
        result
    }

    fn search_root(
        &mut self,
        position: &mut Position,
        history: &mut BoardHistory,
        depth: u8,
    ) -> Result<(Option<Move>, i32), AbortSearch> {
        self.bump_nodes()?;

        let key = position.key();
        let mut moves = generate_legal_moves(position);
        if moves.is_empty() {
            let score = if in_check(position) {
                -(MATE_SCORE + i32::from(depth))
            } else {
                0
            };
            return Ok((None, score));
        }

        let tt_move = self.tt.probe(key, depth, -INFINITY, INFINITY).best_move;
        self.rng.shuffle(&mut moves);
        order_moves(&mut moves, tt_move);

        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best_score = -INFINITY;
        let mut best_move = None;

        for mv in moves {
            let score = self.search_child(position, history, mv, depth - 1, -beta, -alpha)?;
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
        }

        self.tt.store(key, best_score, depth, Bound::Exact, best_move);
        Ok((best_move, best_score))
    }

    /// Make `mv`, search the reply from the opponent's side and restore the
    /// position before returning the negated score.
    fn search_child(
        &mut self,
        position: &mut Position,
        history: &mut BoardHistory,
        mv: Move,
        depth: u8,
        alpha: i32,
        beta: i32,
    ) -> Result<i32, AbortSearch> {
        let undo = position.make_move(mv);
        history.push(position.key());
        let score = self.negamax(position, history, depth, alpha, beta);
        history.pop();
        position.unmake_move(mv, undo);
        score.map(|s| -s)
    }

    fn negamax(
        &mut self,
        position: &mut Position,
        history: &mut BoardHistory,
        depth: u8,
        mut alpha: i32,
        beta: i32,
    ) -> Result<i32, AbortSearch> {
        self.bump_nodes()?;

        let key = position.key();
        if history.is_threefold(key) || is_insufficient_material(position) {
            return Ok(0);
        }
        if !has_legal_move(position) {
            if in_check(position) {
                return Ok(-(MATE_SCORE + i32::from(depth)));
            }
            return Ok(0);
        }
        if depth == 0 {
            return Ok(evaluate_relative(position));
        }

        let probe = self.tt.probe(key, depth, alpha, beta);
        if let Some(score) = probe.score {
            return Ok(score);
        }

        let mut moves = generate_legal_moves(position);
        order_moves(&mut moves, probe.best_move);

        let original_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;

        for mv in moves {
            let score = self.search_child(position, history, mv, depth - 1, -beta, -alpha)?;
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(key, best_score, depth, bound, best_move);

        Ok(best_score)
    }

    /// Follow stored best moves from `position`, stopping on a miss, an
    /// illegal move (key collision) or a repeated key.
    fn extract_pv_line(&self, position: &Position) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut seen = HashSet::new();
        let mut pos = position.clone();

        while pv.len() < PV_MAX_LEN && seen.insert(pos.key()) {
            let Some(best_move) = self.tt.peek(pos.key()).and_then(|e| e.best_move) else {
                break;
            };
            if !generate_legal_moves(&pos).contains(&best_move) {
                break;
            }
            pos.make_move(best_move);
            pv.push(best_move);
        }

        pv
    }

    fn bump_nodes(&mut self) -> Result<(), AbortSearch> {
        self.nodes = self.nodes.saturating_add(1);
        if self.nodes.is_multiple_of(CHECK_INTERVAL_NODES) && self.should_stop() {
            return Err(AbortSearch);
        }
        Ok(())
    }

    fn should_stop(&mut self) -> bool {
        if self.stop {
            return true;
        }
        if self
            .time_limit
            .is_some_and(|limit| self.started_at.elapsed() >= limit)
        {
            self.stop = true;
        }
        self.stop
    }
}

/// Centipawns, or which side is getting mated.
pub fn format_score(score: i32) -> String {
    if score >= MATE_THRESHOLD {
        "mate".to_string()
    } else if score <= -MATE_THRESHOLD {
        "mated".to_string()
    } else {
        format!("cp {score}")
    }
}

pub fn format_line(moves: &[Move]) -> String {
    moves.iter().map(Move::uci).collect::<Vec<_>>().join(" ")
}
