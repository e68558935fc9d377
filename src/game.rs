//! The authoritative game held by the caller.
//!
//! Keeps the position, the played moves with their undo records and the
//! repetition history in step with each other.

use log::{info, warn};
use thiserror::Error;

use crate::engine::{SearchRequest, SearchResponse};
use crate::history::BoardHistory;
use crate::movegen::{GameStatus, MoveList, find_move, game_status, generate_legal_moves};
use crate::position::{FenError, Move, Position, Undo};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error("no move to undo")]
    NothingToUndo,
    #[error("game is over: {0}")]
    GameOver(GameStatus),
}

#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    history: BoardHistory,
    moves: Vec<Move>,
    undos: Vec<Undo>,
    /// Book lines only apply to games begun from the standard position.
    from_startpos: bool,
    book_active: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::with_position(Position::startpos(), true)
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let position = Position::from_fen(fen)?;
        let from_startpos = position == Position::startpos();
        Ok(Self::with_position(position, from_startpos))
    }

    fn with_position(position: Position, from_startpos: bool) -> Self {
        Self {
            history: BoardHistory::new(position.key()),
            position,
            moves: Vec::new(),
            undos: Vec::new(),
            from_startpos,
            book_active: from_startpos,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn history(&self) -> &BoardHistory {
        &self.history
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    pub fn book_active(&self) -> bool {
        self.book_active
    }

    pub fn status(&self) -> GameStatus {
        game_status(&self.position, &self.history)
    }

    pub fn legal_moves(&self) -> MoveList {
        generate_legal_moves(&self.position)
    }

    /// Play `mv` if it is legal in the current position.
    pub fn play(&mut self, mv: Move) -> Result<(), GameError> {
        let status = self.status();
        if status.is_over() {
            return Err(GameError::GameOver(status));
        }
        if !self.legal_moves().contains(&mv) {
            return Err(GameError::IllegalMove(mv.uci()));
        }
        self.commit(mv);
        Ok(())
    }

    /// Parse `text` in long algebraic form and play it.
    pub fn play_text(&mut self, text: &str) -> Result<Move, GameError> {
        let status = self.status();
        if status.is_over() {
            return Err(GameError::GameOver(status));
        }
        let mv = find_move(&self.position, text)
            .ok_or_else(|| GameError::IllegalMove(text.to_string()))?;
        self.commit(mv);
        Ok(mv)
    }

    fn commit(&mut self, mv: Move) {
        let undo = self.position.make_move(mv);
        self.history.push(self.position.key());
        self.moves.push(mv);
        self.undos.push(undo);
    }

    /// Take back the last ply.
    pub fn undo(&mut self) -> Result<Move, GameError> {
        let (Some(mv), Some(undo)) = (self.moves.pop(), self.undos.pop()) else {
            return Err(GameError::NothingToUndo);
        };
        self.position.unmake_move(mv, undo);
        self.history.pop();
        Ok(mv)
    }

    /// Take back a full move pair, or the single ply when only one exists.
    /// Returns the number of plies removed.
    pub fn undo_pair(&mut self) -> Result<usize, GameError> {
        self.undo()?;
        if self.undo().is_ok() {
            return Ok(2);
        }
        Ok(1)
    }

    /// Request for the engine to move in the current position.
    pub fn request(&self, depth: u8) -> SearchRequest {
        SearchRequest {
            position: self.position.clone(),
            depth,
            side_to_move: self.position.side_to_move(),
            history: self.history.clone(),
            moves_so_far: self.moves.clone(),
            use_book: self.book_active,
        }
    }

    /// Apply the engine's answer. A search that did not come from the book
    /// switches the book off for the rest of the game.
    pub fn apply_response(&mut self, response: &SearchResponse) -> Result<Option<Move>, GameError> {
        if self.book_active && !response.from_book {
            info!("left the opening book at ply {}", self.ply());
            self.book_active = false;
        }
        match response.chosen_move {
            Some(mv) => self.play(mv).map(|()| Some(mv)),
            None => Ok(None),
        }
    }

    /// Random legal move for when the engine produced nothing.
    pub fn fallback_move(&self) -> Option<Move> {
        let moves = self.legal_moves();
        let mv = fastrand::choice(moves);
        if let Some(mv) = mv {
            warn!("falling back to random move {mv}");
        }
        mv
    }

    pub fn started_from_startpos(&self) -> bool {
        self.from_startpos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::DrawReason;

    #[test]
    fn illegal_move_is_an_error() {
        let mut game = Game::new();
        assert_eq!(
            game.play_text("e2e5"),
            Err(GameError::IllegalMove("e2e5".to_string()))
        );
        assert_eq!(game.ply(), 0);
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn undo_pair_rewinds_two_plies() {
        let mut game = Game::new();
        let start = game.position().clone();
        game.play_text("e2e4").unwrap();
        game.play_text("e7e5").unwrap();
        game.play_text("g1f3").unwrap();

        assert_eq!(game.undo_pair(), Ok(2));
        assert_eq!(game.ply(), 1);
        assert_eq!(game.history().len(), 2);
        assert_eq!(game.undo_pair(), Ok(1));
        assert_eq!(game.position(), &start);
        assert_eq!(game.undo_pair(), Err(GameError::NothingToUndo));
    }

    #[test]
    fn threefold_repetition_draws_despite_material() {
        let mut game = Game::from_fen("7k/8/8/8/8/8/8/R6K w - - 0 1").unwrap();
        for text in ["h1g1", "h8g8", "g1h1", "g8h8", "h1g1", "h8g8", "g1h1", "g8h8"] {
            game.play_text(text).unwrap();
        }
        assert_eq!(game.status(), GameStatus::Draw(DrawReason::Repetition));
        assert!(matches!(game.play_text("a1a2"), Err(GameError::GameOver(_))));
    }

    #[test]
    fn book_switches_off_after_a_search_reply() {
        let mut game = Game::new();
        assert!(game.book_active());
        let mv = find_move(game.position(), "d2d4").unwrap();
        let response = SearchResponse {
            chosen_move: Some(mv),
            terminal: None,
            score: 10,
            from_book: false,
            nodes: 100,
        };
        assert_eq!(game.apply_response(&response), Ok(Some(mv)));
        assert!(!game.book_active());
        assert!(!game.request(3).use_book);
    }

    #[test]
    fn custom_position_never_uses_book() {
        let game = Game::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert!(!game.book_active());
        assert!(!game.started_from_startpos());
    }

    #[test]
    fn fallback_is_legal() {
        let game = Game::new();
        let mv = game.fallback_move().unwrap();
        assert!(game.legal_moves().contains(&mv));
    }

    #[test]
    fn no_fallback_when_mated() {
        let game =
            Game::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
                .unwrap();
        assert_eq!(game.fallback_move(), None);
        assert_eq!(
            game.status(),
            GameStatus::Checkmate {
                winner: crate::board::Color::White
            }
        );
    }
}
