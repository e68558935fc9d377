//! Zobrist keys for position hashing.
//!
//! Keys come from a fixed splitmix64 stream so that position keys are
//! stable across runs and processes.

use std::sync::LazyLock;

use crate::board::{Board, Color, Piece, Square};
use crate::constants::NUM_SQUARES;

const PIECE_KEYS: usize = 6 * 2 * NUM_SQUARES;

static ZOBRIST_KEYS: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);

#[derive(Debug, Clone)]
pub struct ZobristKeys {
    piece_square: [u64; PIECE_KEYS],
    castling: [u64; 4],
    en_passant_file: [u64; 8],
    side_to_move: u64,
}

pub fn zobrist_keys() -> &'static ZobristKeys {
    &ZOBRIST_KEYS
}

impl ZobristKeys {
    fn new() -> Self {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;

        let mut piece_square = [0u64; PIECE_KEYS];
        for key in &mut piece_square {
            *key = next_u64(&mut state);
        }
        let castling = std::array::from_fn(|_| next_u64(&mut state));
        let en_passant_file = std::array::from_fn(|_| next_u64(&mut state));

        Self {
            piece_square,
            castling,
            en_passant_file,
            side_to_move: next_u64(&mut state),
        }
    }

    #[inline]
    pub fn piece_key(&self, piece: Piece, sq: Square) -> u64 {
        let idx = (piece.kind as usize * 2 + piece.color as usize) * NUM_SQUARES + sq.index();
        self.piece_square[idx]
    }

    #[inline]
    pub fn xor_piece(&self, hash: &mut u64, piece: Piece, sq: Square) {
        *hash ^= self.piece_key(piece, sq);
    }

    /// XOR in every castling right whose bit is set in `rights`.
    pub fn xor_castling(&self, hash: &mut u64, rights: u8) {
        for (bit, key) in self.castling.iter().enumerate() {
            if rights & (1 << bit) != 0 {
                *hash ^= key;
            }
        }
    }

    pub fn xor_en_passant(&self, hash: &mut u64, target: Option<Square>) {
        if let Some(sq) = target {
            *hash ^= self.en_passant_file[usize::from(sq.file())];
        }
    }

    pub fn xor_side_to_move(&self, hash: &mut u64) {
        *hash ^= self.side_to_move;
    }

    pub fn hash_board(&self, board: &Board) -> u64 {
        board
            .pieces()
            .fold(0u64, |hash, (sq, piece)| hash ^ self.piece_key(piece, sq))
    }

    /// Full recomputation; incremental updates must always agree with this.
    pub fn hash_position(
        &self,
        board: &Board,
        side_to_move: Color,
        castling: u8,
        en_passant: Option<Square>,
    ) -> u64 {
        let mut hash = self.hash_board(board);
        self.xor_castling(&mut hash, castling);
        self.xor_en_passant(&mut hash, en_passant);
        if side_to_move == Color::Black {
            hash ^= self.side_to_move;
        }
        hash
    }
}

fn next_u64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceKind;

    #[test]
    fn keys_are_distinct() {
        let keys = zobrist_keys();
        let a = keys.piece_key(
            Piece::new(PieceKind::Pawn, Color::White),
            Square::parse("e2").unwrap(),
        );
        let b = keys.piece_key(
            Piece::new(PieceKind::Pawn, Color::Black),
            Square::parse("e2").unwrap(),
        );
        let c = keys.piece_key(
            Piece::new(PieceKind::Pawn, Color::White),
            Square::parse("e3").unwrap(),
        );
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(keys.side_to_move, 0);
    }

    #[test]
    fn side_to_move_changes_hash() {
        let keys = zobrist_keys();
        let board = Board::empty();
        let white = keys.hash_position(&board, Color::White, 0, None);
        let black = keys.hash_position(&board, Color::Black, 0, None);
        assert_ne!(white, black);
    }
}
