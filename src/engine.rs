//! Engine facade: book first, then search.
//!
//! An [`Engine`] answers one [`SearchRequest`] with one [`SearchResponse`].
//! Finished games are reported as data before any searching happens.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

use crate::board::Color;
use crate::book::OpeningBook;
use crate::constants::{DEFAULT_TT_MB, DEPTH_EASY, DEPTH_HARD, DEPTH_MEDIUM};
use crate::history::BoardHistory;
use crate::movegen::{GameStatus, game_status};
use crate::position::{Move, Position};
use crate::search::{SearchLimits, Searcher, format_line, format_score};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Search depth in plies.
    pub const fn depth(self) -> u8 {
        match self {
            Self::Easy => DEPTH_EASY,
            Self::Medium => DEPTH_MEDIUM,
            Self::Hard => DEPTH_HARD,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty {0:?} (expected easy, medium or hard)")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" | "1" => Ok(Self::Easy),
            "medium" | "2" => Ok(Self::Medium),
            "hard" | "3" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub difficulty: Difficulty,
    pub tt_size_mb: usize,
    /// Wall-clock cap per search; `None` searches to full depth.
    pub max_time: Option<Duration>,
    pub use_book: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            tt_size_mb: DEFAULT_TT_MB,
            max_time: None,
            use_book: true,
        }
    }
}

/// Everything the engine needs to pick a move for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub position: Position,
    pub depth: u8,
    /// Side the caller expects to move; must match `position`.
    pub side_to_move: Color,
    /// Keys of the game line, ending with `position`'s key.
    pub history: BoardHistory,
    /// Moves played from the start position, used for book matching.
    pub moves_so_far: Vec<Move>,
    pub use_book: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    /// `None` only when the game is already over.
    pub chosen_move: Option<Move>,
    pub terminal: Option<GameStatus>,
    /// Side-to-move score of the chosen move; zero for book moves.
    pub score: i32,
    pub from_book: bool,
    pub nodes: u64,
}

impl SearchResponse {
    fn terminal(status: GameStatus) -> Self {
        Self {
            chosen_move: None,
            terminal: Some(status),
            score: 0,
            from_book: false,
            nodes: 0,
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    searcher: Searcher,
    book: OpeningBook,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            searcher: Searcher::new(config.tt_size_mb),
            book: OpeningBook::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    /// Drop cached search results.
    pub fn new_game(&mut self) {
        self.searcher.clear();
    }

    pub fn think(&mut self, request: &SearchRequest) -> SearchResponse {
        let position = &request.position;
        if request.side_to_move != position.side_to_move() {
            warn!(
                "request names {} to move but the position has {}",
                request.side_to_move,
                position.side_to_move()
            );
        }
        let status = game_status(position, &request.history);
        if status.is_over() {
            info!("no search: {status}");
            return SearchResponse::terminal(status);
        }

        if request.use_book && self.config.use_book {
            if let Some(mv) = self.book.probe(position, &request.moves_so_far) {
                info!("book move {mv}");
                return SearchResponse {
                    chosen_move: Some(mv),
                    terminal: None,
                    score: 0,
                    from_book: true,
                    nodes: 0,
                };
            }
        }

        let limits = SearchLimits {
            depth: request.depth,
            max_time: self.config.max_time,
        };
        let result = self.searcher.search(position, &request.history, limits);
        let stats = self.searcher.tt_stats();
        info!(
            "chose {} score {} depth {} nodes {} pv {} (tt {}/{} hits)",
            result.best_move.map_or_else(|| "-".to_string(), |m| m.uci()),
            format_score(result.score),
            result.depth,
            result.nodes,
            format_line(&result.pv),
            stats.hits,
            stats.probes,
        );

        SearchResponse {
            chosen_move: result.best_move,
            terminal: None,
            score: result.score,
            from_book: false,
            nodes: result.nodes,
        }
    }
}
