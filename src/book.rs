//! A handful of hardcoded opening lines.
//!
//! White heads for early pressure on f7 with the queen and bishop; Black
//! answers with classical central replies and covers f7 when the queen comes
//! out early. Lines are only followed from the standard start position.

use log::debug;

use crate::board::Color;
use crate::constants::BOOK_MAX_PLY;
use crate::movegen::{find_move, generate_legal_moves};
use crate::position::{Move, Position};

/// Lines in long algebraic notation, tried in order. The first line whose
/// prefix matches the game so far supplies the next move.
const LINES: &[&[&str]] = &[
    // Queen and bishop against f7. Black's own choices cover f7; the last
    // line punishes ...Nf6 from an opponent.
    &["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g7g6", "h5f3", "g8f6"],
    &["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "d8e7"],
    &["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6", "h5f7"],
    &["e2e4", "e7e5", "d1h5", "g7g6", "h5f3", "g8f6"],
    &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"],
    &["e2e4", "e7e5", "f1c4", "g8f6", "d2d3", "b8c6"],
    &["e2e4", "e7e5", "b1c3", "g8f6"],
    &["d2d4", "d7d5", "c2c4", "e7e6", "b1c3", "g8f6"],
    &["d2d4", "d7d5", "g1f3", "g8f6"],
    &["c2c4", "e7e5", "b1c3", "g8f6"],
    &["g1f3", "d7d5", "d2d4", "g8f6"],
];

#[derive(Debug, Clone, Copy, Default)]
pub struct OpeningBook;

impl OpeningBook {
    pub fn new() -> Self {
        Self
    }

    /// Next book move for the game `moves_so_far`, played from the standard
    /// start position. It must hold exactly `ply` moves with `side_to_move`
    /// on move.
    pub fn lookup(&self, ply: usize, side_to_move: Color, moves_so_far: &[Move]) -> Option<Move> {
        let text = line_move(ply, side_to_move, moves_so_far)?;
        let mut pos = Position::startpos();
        for &played in moves_so_far {
            if !generate_legal_moves(&pos).contains(&played) {
                debug!("book line diverges at illegal move {played}");
                return None;
            }
            pos.make_move(played);
        }
        let mv = find_move(&pos, text);
        if mv.is_none() {
            debug!("book move {text} is not legal here");
        }
        mv
    }

    /// Book reply for `pos`, reached by `moves_so_far`.
    pub fn probe(&self, pos: &Position, moves_so_far: &[Move]) -> Option<Move> {
        let mv = self.lookup(moves_so_far.len(), pos.side_to_move(), moves_so_far)?;
        generate_legal_moves(pos).contains(&mv).then_some(mv)
    }
}

/// Text of the book move following `moves_so_far`, if any line matches.
fn line_move(ply: usize, side_to_move: Color, moves_so_far: &[Move]) -> Option<&'static str> {
    if ply >= BOOK_MAX_PLY || moves_so_far.len() != ply {
        return None;
    }
    let expected_side = if ply % 2 == 0 { Color::White } else { Color::Black };
    if side_to_move != expected_side {
        return None;
    }

    LINES
        .iter()
        .filter(|line| line.len() > ply)
        .find(|line| {
            line.iter()
                .zip(moves_so_far)
                .all(|(book, played)| *book == played.uci())
        })
        .map(|line| line[ply])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceKind;

    fn play_line(moves: &[&str]) -> (Position, Vec<Move>) {
        let mut pos = Position::startpos();
        let mut played = Vec::new();
        for text in moves {
            let mv = find_move(&pos, text).unwrap();
            pos.make_move(mv);
            played.push(mv);
        }
        (pos, played)
    }

    #[test]
    fn every_line_is_legal() {
        for line in LINES {
            assert!(line.len() <= BOOK_MAX_PLY);
            let (_, played) = play_line(line);
            assert_eq!(played.len(), line.len());
        }
    }

    #[test]
    fn white_opens_with_king_pawn() {
        let book = OpeningBook::new();
        let pos = Position::startpos();
        assert_eq!(book.probe(&pos, &[]).map(|m| m.uci()), Some("e2e4".to_string()));
    }

    #[test]
    fn black_answers_queen_pawn_symmetrically() {
        let book = OpeningBook::new();
        let (pos, played) = play_line(&["d2d4"]);
        assert_eq!(book.probe(&pos, &played).map(|m| m.uci()), Some("d7d5".to_string()));
    }

    #[test]
    fn white_takes_on_f7_after_knight_f6() {
        let book = OpeningBook::new();
        let (pos, played) = play_line(&["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6"]);
        assert_eq!(book.probe(&pos, &played).map(|m| m.uci()), Some("h5f7".to_string()));
    }

    #[test]
    fn black_covers_f7_against_early_queen() {
        let book = OpeningBook::new();
        let (pos, played) = play_line(&["e2e4", "e7e5", "d1h5", "b8c6", "f1c4"]);
        assert_eq!(book.probe(&pos, &played).map(|m| m.uci()), Some("g7g6".to_string()));
    }

    #[test]
    fn unknown_sequence_misses() {
        let book = OpeningBook::new();
        let (pos, played) = play_line(&["a2a3"]);
        assert_eq!(book.probe(&pos, &played), None);
    }

    #[test]
    fn lookup_resolves_the_move() {
        let book = OpeningBook::new();
        let (_, played) = play_line(&["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6"]);
        let mv = book.lookup(6, Color::White, &played).unwrap();
        assert_eq!(mv.uci(), "h5f7");
        assert_eq!(mv.piece, PieceKind::Queen);
        assert_eq!(mv.captured, Some(PieceKind::Pawn));
    }

    #[test]
    fn probe_ignores_a_position_off_the_line() {
        let book = OpeningBook::new();
        let (_, played) = play_line(&["e2e4"]);
        let elsewhere = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(book.probe(&elsewhere, &played), None);
    }

    #[test]
    fn wrong_side_or_ply_misses() {
        let book = OpeningBook::new();
        assert_eq!(book.lookup(0, Color::Black, &[]), None);
        assert_eq!(book.lookup(1, Color::White, &[]), None);
        assert_eq!(book.lookup(BOOK_MAX_PLY, Color::White, &[]), None);
    }
}
