//! Static evaluation: material plus piece-square tables.
//!
//! Scores are from White's point of view. Tables are written from White's
//! side with rank 8 in the first row; Black squares are mirrored vertically.

use crate::board::{Color, Piece, PieceKind, Square};
use crate::constants::{
    BISHOP_VALUE, KING_VALUE, KNIGHT_VALUE, PAWN_VALUE, QUEEN_VALUE, ROOK_VALUE,
};
use crate::position::Position;

/// Pawns gain as they advance, centre pawns are pushed early.
#[rustfmt::skip]
const PST_PAWN: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const PST_KNIGHT: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const PST_BISHOP: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const PST_ROOK: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const PST_QUEEN: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

/// King shelter: stay castled behind the pawns.
#[rustfmt::skip]
const PST_KING: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[inline]
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => PAWN_VALUE,
        PieceKind::Knight => KNIGHT_VALUE,
        PieceKind::Bishop => BISHOP_VALUE,
        PieceKind::Rook => ROOK_VALUE,
        PieceKind::Queen => QUEEN_VALUE,
        PieceKind::King => KING_VALUE,
    }
}

/// Piece-square bonus for `piece` standing on `sq`.
pub fn pst_bonus(piece: Piece, sq: Square) -> i32 {
    // Table rows run from rank 8 down to rank 1 for White.
    let row = match piece.color {
        Color::White => 7 - usize::from(sq.rank()),
        Color::Black => usize::from(sq.rank()),
    };
    let idx = row * 8 + usize::from(sq.file());
    let table = match piece.kind {
        PieceKind::Pawn => &PST_PAWN,
        PieceKind::Knight => &PST_KNIGHT,
        PieceKind::Bishop => &PST_BISHOP,
        PieceKind::Rook => &PST_ROOK,
        PieceKind::Queen => &PST_QUEEN,
        PieceKind::King => &PST_KING,
    };
    table[idx]
}

/// Static score of `pos`, positive when White is better.
pub fn evaluate(pos: &Position) -> i32 {
    pos.board()
        .pieces()
        .map(|(sq, piece)| piece.color.sign() * (piece_value(piece.kind) + pst_bonus(piece, sq)))
        .sum()
}

/// Static score from the side to move's point of view.
#[inline]
pub fn evaluate_relative(pos: &Position) -> i32 {
    pos.side_to_move().sign() * evaluate(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_balanced() {
        assert_eq!(evaluate(&Position::startpos()), 0);
    }

    #[test]
    fn mirrored_positions_negate() {
        let white_up = Position::from_fen("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1").unwrap();
        let black_up = Position::from_fen("4k3/8/8/3q4/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(evaluate(&white_up), -evaluate(&black_up));
        assert!(evaluate(&white_up) > QUEEN_VALUE - 100);
    }

    #[test]
    fn relative_score_flips_with_side() {
        let white = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
        assert_eq!(evaluate_relative(&white), -evaluate_relative(&black));
        assert!(evaluate_relative(&white) > 0);
    }

    #[test]
    fn central_knight_beats_rim_knight() {
        let knight = Piece::new(PieceKind::Knight, Color::White);
        let e4 = Square::parse("e4").unwrap();
        let a1 = Square::parse("a1").unwrap();
        assert!(pst_bonus(knight, e4) > pst_bonus(knight, a1));
    }

    #[test]
    fn pawn_tables_mirror_between_colours() {
        let white = Piece::new(PieceKind::Pawn, Color::White);
        let black = Piece::new(PieceKind::Pawn, Color::Black);
        assert_eq!(
            pst_bonus(white, Square::parse("d4").unwrap()),
            pst_bonus(black, Square::parse("d5").unwrap())
        );
    }
}
