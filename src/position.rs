//! Chess position representation and move execution.
//!
//! A [`Position`] is mutated in place by [`Position::make_move`], which
//! returns an [`Undo`] record; [`Position::unmake_move`] consumes that record
//! and restores the position exactly. Search walks the tree with this
//! stack-disciplined pair instead of cloning a position per node.
//!
//! The 64-bit Zobrist key is maintained incrementally and always equals
//! [`ZobristKeys::hash_position`] of the current fields.
//!
//! [`ZobristKeys::hash_position`]: crate::zobrist::ZobristKeys::hash_position

use std::fmt;

use thiserror::Error;

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::constants::{N, START_FEN};
use crate::movegen::is_square_attacked;
use crate::zobrist::zobrist_keys;

/// Castling right bits.
pub const WHITE_KINGSIDE: u8 = 1;
pub const WHITE_QUEENSIDE: u8 = 2;
pub const BLACK_KINGSIDE: u8 = 4;
pub const BLACK_QUEENSIDE: u8 = 8;
pub const ALL_CASTLING: u8 = WHITE_KINGSIDE | WHITE_QUEENSIDE | BLACK_KINGSIDE | BLACK_QUEENSIDE;

/// Error raised when a FEN string cannot be loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),
    #[error("bad piece placement: {0}")]
    Placement(String),
    #[error("bad side to move: {0}")]
    SideToMove(String),
    #[error("bad castling field: {0}")]
    Castling(String),
    #[error("bad en passant field: {0}")]
    EnPassant(String),
    #[error("bad move counter: {0}")]
    Counter(String),
    #[error("{0} must have exactly one king")]
    KingCount(Color),
    #[error("{0} is in check but not on move")]
    OpponentInCheck(Color),
}

/// A chess move. Carries enough information to be unmade without looking
/// at the board again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// Kind of the moving piece (before promotion).
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub castle: bool,
    pub en_passant: bool,
}

impl Move {
    pub const fn quiet(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            captured: None,
            promotion: None,
            castle: false,
            en_passant: false,
        }
    }

    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Long algebraic form, e.g. `e2e4` or `e7e8q`.
    pub fn uci(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// State needed to reverse a move that the move itself does not carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Undo {
    castling: u8,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    key: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    castling: u8,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    kings: [Square; 2],
    key: u64,
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl Position {
    /// The standard initial position.
    pub fn startpos() -> Self {
        match Self::from_fen(START_FEN) {
            Ok(pos) => pos,
            Err(err) => unreachable!("start FEN is valid: {err}"),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField("placement"))?;
        let side = fields.next().ok_or(FenError::MissingField("side to move"))?;
        let castling = fields.next().unwrap_or("-");
        let en_passant = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let board = parse_placement(placement)?;

        let side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        let mut rights = 0u8;
        if castling != "-" {
            for c in castling.chars() {
                rights |= match c {
                    'K' => WHITE_KINGSIDE,
                    'Q' => WHITE_QUEENSIDE,
                    'k' => BLACK_KINGSIDE,
                    'q' => BLACK_QUEENSIDE,
                    _ => return Err(FenError::Castling(castling.to_string())),
                };
            }
        }

        let en_passant = match en_passant {
            "-" => None,
            text => parse_en_passant(&board, side_to_move, text)?,
        };

        let halfmove_clock = halfmove
            .parse::<u16>()
            .map_err(|_| FenError::Counter(halfmove.to_string()))?;
        let fullmove_number = fullmove
            .parse::<u16>()
            .map_err(|_| FenError::Counter(fullmove.to_string()))?;

        let kings = [
            single_king(&board, Color::White)?,
            single_king(&board, Color::Black)?,
        ];
        let waiting = !side_to_move;
        if is_square_attacked(&board, kings[waiting as usize], side_to_move) {
            return Err(FenError::OpponentInCheck(waiting));
        }

        // Drop rights whose king or rook is not on its home square.
        let rights = rights & castling_rights_supported_by(&board);
        let key = zobrist_keys().hash_position(&board, side_to_move, rights, en_passant);

        Ok(Self {
            board,
            side_to_move,
            castling: rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
            kings,
            key,
        })
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..N as u8).rev() {
            let mut empty = 0;
            for file in 0..N as u8 {
                match Square::new(file, rank).and_then(|sq| self.board.get(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling == 0 {
            out.push('-');
        } else {
            for (bit, c) in [
                (WHITE_KINGSIDE, 'K'),
                (WHITE_QUEENSIDE, 'Q'),
                (BLACK_KINGSIDE, 'k'),
                (BLACK_QUEENSIDE, 'q'),
            ] {
                if self.castling & bit != 0 {
                    out.push(c);
                }
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> u8 {
        self.castling
    }

    #[inline]
    pub fn can_castle(&self, right: u8) -> bool {
        self.castling & right != 0
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Position key used for the transposition table and repetition checks.
    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color as usize]
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Apply `mv` for the side to move. The move must come from the legal
    /// move generator for this exact position.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let keys = zobrist_keys();
        let undo = Undo {
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            key: self.key,
        };

        let us = self.side_to_move;
        let them = !us;
        let mover = Piece::new(mv.piece, us);

        keys.xor_en_passant(&mut self.key, self.en_passant);
        keys.xor_castling(&mut self.key, self.castling);

        self.board.set(mv.from, None);
        keys.xor_piece(&mut self.key, mover, mv.from);

        if mv.en_passant {
            if let Some(victim_sq) = en_passant_victim(mv.to, us) {
                let victim = Piece::new(PieceKind::Pawn, them);
                self.board.set(victim_sq, None);
                keys.xor_piece(&mut self.key, victim, victim_sq);
            }
        } else if let Some(kind) = mv.captured {
            keys.xor_piece(&mut self.key, Piece::new(kind, them), mv.to);
        }

        let placed = mv.promotion.map_or(mover, |kind| Piece::new(kind, us));
        self.board.set(mv.to, Some(placed));
        keys.xor_piece(&mut self.key, placed, mv.to);

        if mv.castle {
            if let Some((rook_from, rook_to)) = castle_rook_squares(mv.to) {
                let rook = Piece::new(PieceKind::Rook, us);
                self.board.set(rook_from, None);
                self.board.set(rook_to, Some(rook));
                keys.xor_piece(&mut self.key, rook, rook_from);
                keys.xor_piece(&mut self.key, rook, rook_to);
            }
        }

        if mv.piece == PieceKind::King {
            self.kings[us as usize] = mv.to;
        }

        self.castling &= !(castling_mask(mv.from) | castling_mask(mv.to));
        let double_push =
            mv.piece == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2;
        self.en_passant = if double_push && en_passant_capturable(&self.board, mv.to, them) {
            mv.from.offset(0, us.forward())
        } else {
            None
        };

        if mv.piece == PieceKind::Pawn || mv.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = them;
        keys.xor_side_to_move(&mut self.key);
        keys.xor_castling(&mut self.key, self.castling);
        keys.xor_en_passant(&mut self.key, self.en_passant);

        undo
    }

    /// Reverse the most recent [`make_move`](Self::make_move) of `mv`.
    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        let us = !self.side_to_move;
        let them = self.side_to_move;

        self.board.set(mv.to, None);
        self.board.set(mv.from, Some(Piece::new(mv.piece, us)));

        if mv.en_passant {
            if let Some(victim_sq) = en_passant_victim(mv.to, us) {
                self.board
                    .set(victim_sq, Some(Piece::new(PieceKind::Pawn, them)));
            }
        } else if let Some(kind) = mv.captured {
            self.board.set(mv.to, Some(Piece::new(kind, them)));
        }

        if mv.castle {
            if let Some((rook_from, rook_to)) = castle_rook_squares(mv.to) {
                self.board.set(rook_to, None);
                self.board
                    .set(rook_from, Some(Piece::new(PieceKind::Rook, us)));
            }
        }

        if mv.piece == PieceKind::King {
            self.kings[us as usize] = mv.from;
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_sub(1);
        }

        self.side_to_move = us;
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.key = undo.key;
    }

    /// Recompute the key from scratch.
    pub fn compute_key(&self) -> u64 {
        zobrist_keys().hash_position(
            &self.board,
            self.side_to_move,
            self.castling,
            self.en_passant,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(f, "{} to move", self.side_to_move)
    }
}

/// Square of the pawn removed by an en passant capture landing on `to`.
fn en_passant_victim(to: Square, us: Color) -> Option<Square> {
    to.offset(0, -us.forward())
}

/// Whether a `capturer` pawn stands beside the pawn on `pushed`.
///
/// The en passant target is only recorded when this holds, so positions that
/// differ in nothing else share a key.
fn en_passant_capturable(board: &Board, pushed: Square, capturer: Color) -> bool {
    let pawn = Some(Piece::new(PieceKind::Pawn, capturer));
    [-1, 1]
        .into_iter()
        .filter_map(|df| pushed.offset(df, 0))
        .any(|sq| board.get(sq) == pawn)
}

/// En passant field of a FEN. The target must sit behind an enemy pawn that
/// has just double-pushed; it is dropped when no pawn of `side_to_move` can
/// take.
fn parse_en_passant(
    board: &Board,
    side_to_move: Color,
    text: &str,
) -> Result<Option<Square>, FenError> {
    let bad = || FenError::EnPassant(text.to_string());
    let target = Square::parse(text).ok_or_else(bad)?;
    let target_rank = match side_to_move {
        Color::White => 5,
        Color::Black => 2,
    };
    if target.rank() != target_rank || board.get(target).is_some() {
        return Err(bad());
    }
    let origin = target.offset(0, side_to_move.forward()).ok_or_else(bad)?;
    let pushed = en_passant_victim(target, side_to_move).ok_or_else(bad)?;
    let enemy_pawn = Some(Piece::new(PieceKind::Pawn, !side_to_move));
    if board.get(origin).is_some() || board.get(pushed) != enemy_pawn {
        return Err(bad());
    }
    Ok(en_passant_capturable(board, pushed, side_to_move).then_some(target))
}

/// Rook origin and destination for a castling king landing on `king_to`.
fn castle_rook_squares(king_to: Square) -> Option<(Square, Square)> {
    let rank = king_to.rank();
    match king_to.file() {
        6 => Some((Square::new(7, rank)?, Square::new(5, rank)?)),
        2 => Some((Square::new(0, rank)?, Square::new(3, rank)?)),
        _ => None,
    }
}

/// Castling rights lost when a piece leaves or lands on `sq`.
fn castling_mask(sq: Square) -> u8 {
    match sq.index() {
        0 => WHITE_QUEENSIDE,
        4 => WHITE_KINGSIDE | WHITE_QUEENSIDE,
        7 => WHITE_KINGSIDE,
        56 => BLACK_QUEENSIDE,
        60 => BLACK_KINGSIDE | BLACK_QUEENSIDE,
        63 => BLACK_KINGSIDE,
        _ => 0,
    }
}

fn castling_rights_supported_by(board: &Board) -> u8 {
    let has = |index: usize, kind: PieceKind, color: Color| {
        Square::from_index(index).and_then(|sq| board.get(sq)) == Some(Piece::new(kind, color))
    };
    let mut rights = 0;
    if has(4, PieceKind::King, Color::White) {
        if has(7, PieceKind::Rook, Color::White) {
            rights |= WHITE_KINGSIDE;
        }
        if has(0, PieceKind::Rook, Color::White) {
            rights |= WHITE_QUEENSIDE;
        }
    }
    if has(60, PieceKind::King, Color::Black) {
        if has(63, PieceKind::Rook, Color::Black) {
            rights |= BLACK_KINGSIDE;
        }
        if has(56, PieceKind::Rook, Color::Black) {
            rights |= BLACK_QUEENSIDE;
        }
    }
    rights
}

fn parse_placement(placement: &str) -> Result<Board, FenError> {
    let bad = || FenError::Placement(placement.to_string());
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != N {
        return Err(bad());
    }

    let mut board = Board::empty();
    for (row_idx, row) in rows.iter().enumerate() {
        let rank = (N - 1 - row_idx) as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(bad());
                }
                file += skip as u8;
            } else {
                let piece = Piece::from_char(c).ok_or_else(bad)?;
                let sq = Square::new(file, rank).ok_or_else(bad)?;
                if piece.kind == PieceKind::Pawn && (rank == 0 || rank == 7) {
                    return Err(bad());
                }
                board.set(sq, Some(piece));
                file += 1;
            }
            if file > N as u8 {
                return Err(bad());
            }
        }
        if file != N as u8 {
            return Err(bad());
        }
    }
    Ok(board)
}

fn single_king(board: &Board, color: Color) -> Result<Square, FenError> {
    let mut kings = board.find(Piece::new(PieceKind::King, color));
    match (kings.next(), kings.next()) {
        (Some(sq), None) => Ok(sq),
        _ => Err(FenError::KingCount(color)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn startpos_fen_round_trip() {
        let pos = Position::startpos();
        assert_eq!(pos.to_fen(), START_FEN);
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.castling(), ALL_CASTLING);
        assert_eq!(pos.king_square(Color::White), sq("e1"));
        assert_eq!(pos.king_square(Color::Black), sq("e8"));
        assert_eq!(pos.key(), pos.compute_key());
    }

    #[test]
    fn rejects_missing_king() {
        let err = Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").unwrap_err();
        assert_eq!(err, FenError::KingCount(Color::Black));
    }

    #[test]
    fn rejects_malformed_placement() {
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        assert!(Position::from_fen("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1").is_err());
        assert!(Position::from_fen("").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1").is_err());
    }

    #[test]
    fn double_push_sets_en_passant_and_key() {
        let mut pos = Position::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").unwrap();
        let before = pos.clone();
        let mv = Move::quiet(sq("d7"), sq("d5"), PieceKind::Pawn);
        let undo = pos.make_move(mv);
        assert_eq!(pos.en_passant(), Some(sq("d6")));
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.key(), pos.compute_key());
        assert_eq!(pos.to_fen(), "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");

        pos.unmake_move(mv, undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn uncapturable_double_push_leaves_no_target() {
        let mut pos = Position::startpos();
        let mv = Move::quiet(sq("e2"), sq("e4"), PieceKind::Pawn);
        pos.make_move(mv);
        assert_eq!(pos.en_passant(), None);
        assert_eq!(
            pos.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );

        // Same placement loaded with a target shares the key.
        let loaded =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        assert_eq!(loaded.en_passant(), None);
        assert_eq!(loaded.key(), pos.key());
    }

    #[test]
    fn rejects_en_passant_without_pushed_pawn() {
        // Nothing stands on e4, so there is no pawn to take.
        let err = Position::from_fen("4k3/8/8/8/8/8/3P4/4K3 w - e3 0 1").unwrap_err();
        assert_eq!(err, FenError::EnPassant("e3".to_string()));
        // Target on the mover's own side of the board.
        assert!(Position::from_fen("4k3/8/8/8/3pP3/8/8/4K3 w - e3 0 1").is_err());
        // Target square occupied.
        assert!(Position::from_fen("4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1").is_err());

        let ok = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(ok.en_passant(), Some(sq("d6")));
    }

    #[test]
    fn rejects_side_not_on_move_in_check() {
        let err = Position::from_fen("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1").unwrap_err();
        assert_eq!(err, FenError::OpponentInCheck(Color::Black));
        // The same placement with Black on move is an ordinary check.
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4R1K1 b - - 0 1").is_ok());
    }

    #[test]
    fn castling_moves_rook_and_clears_rights() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let before = pos.clone();
        let mv = Move {
            castle: true,
            ..Move::quiet(sq("e1"), sq("g1"), PieceKind::King)
        };
        let undo = pos.make_move(mv);
        assert_eq!(
            pos.piece_at(sq("f1")),
            Some(Piece::new(PieceKind::Rook, Color::White))
        );
        assert_eq!(pos.piece_at(sq("h1")), None);
        assert!(!pos.can_castle(WHITE_KINGSIDE));
        assert!(!pos.can_castle(WHITE_QUEENSIDE));
        assert!(pos.can_castle(BLACK_KINGSIDE));
        assert_eq!(pos.key(), pos.compute_key());

        pos.unmake_move(mv, undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn capturing_a_rook_clears_its_right() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = Move {
            captured: Some(PieceKind::Rook),
            ..Move::quiet(sq("a1"), sq("a8"), PieceKind::Rook)
        };
        pos.make_move(mv);
        assert!(!pos.can_castle(WHITE_QUEENSIDE));
        assert!(!pos.can_castle(BLACK_QUEENSIDE));
        assert!(pos.can_castle(BLACK_KINGSIDE));
        assert_eq!(pos.key(), pos.compute_key());
    }

    #[test]
    fn unsupported_castling_rights_are_dropped() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert_eq!(pos.castling(), 0);
    }

    #[test]
    fn move_display_uses_long_algebraic() {
        let mv = Move {
            promotion: Some(PieceKind::Queen),
            ..Move::quiet(sq("e7"), sq("e8"), PieceKind::Pawn)
        };
        assert_eq!(mv.uci(), "e7e8q");
    }
}
