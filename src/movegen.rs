//! Legal move generation, attack detection and game-status classification.
//!
//! Moves are first generated pseudo-legally (piece movement rules, blocked
//! sliders, castling path checks) and then filtered by playing each one on
//! a scratch copy of the position and rejecting those that leave the
//! mover's king attacked.

use std::fmt;

use arrayvec::ArrayVec;

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::constants::{BISHOP_DIRS, KING_DELTAS, KNIGHT_DELTAS, MAX_MOVES, ROOK_DIRS};
use crate::history::BoardHistory;
use crate::position::{
    Move, Position, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE, WHITE_QUEENSIDE,
};

pub type MoveList = ArrayVec<Move, MAX_MOVES>;

/// Why a game ended in a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Repetition,
    InsufficientMaterial,
}

/// Outcome classification of a position in its game line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != Self::Ongoing
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ongoing => f.write_str("ongoing"),
            Self::Checkmate { winner } => write!(f, "checkmate, {winner} wins"),
            Self::Stalemate => f.write_str("stalemate"),
            Self::Draw(DrawReason::Repetition) => f.write_str("draw by threefold repetition"),
            Self::Draw(DrawReason::InsufficientMaterial) => {
                f.write_str("draw by insufficient material")
            }
        }
    }
}

/// All legal moves for the side to move. Order is generation order.
pub fn generate_legal_moves(pos: &Position) -> MoveList {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal_moves(pos, &mut pseudo);

    let mut scratch = pos.clone();
    let us = pos.side_to_move();
    pseudo.retain(|mv| leaves_king_safe(&mut scratch, *mv, us));
    pseudo
}

/// True if the side to move has at least one legal move.
pub fn has_legal_move(pos: &Position) -> bool {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal_moves(pos, &mut pseudo);

    let mut scratch = pos.clone();
    let us = pos.side_to_move();
    pseudo
        .iter()
        .any(|mv| leaves_king_safe(&mut scratch, *mv, us))
}

fn leaves_king_safe(scratch: &mut Position, mv: Move, us: Color) -> bool {
    let undo = scratch.make_move(mv);
    let safe = !is_square_attacked(scratch.board(), scratch.king_square(us), !us);
    scratch.unmake_move(mv, undo);
    safe
}

/// True if the side to move is in check.
pub fn in_check(pos: &Position) -> bool {
    let us = pos.side_to_move();
    is_square_attacked(pos.board(), pos.king_square(us), !us)
}

/// True if any piece of colour `by` attacks `sq`.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    // A pawn of `by` attacks `sq` from one rank behind it (from `by`'s view).
    for df in [-1, 1] {
        if let Some(from) = sq.offset(df, -by.forward()) {
            if board.get(from) == Some(Piece::new(PieceKind::Pawn, by)) {
                return true;
            }
        }
    }

    if attacked_by_stepper(board, sq, by, &KNIGHT_DELTAS, PieceKind::Knight)
        || attacked_by_stepper(board, sq, by, &KING_DELTAS, PieceKind::King)
    {
        return true;
    }

    attacked_by_slider(board, sq, by, &ROOK_DIRS, PieceKind::Rook)
        || attacked_by_slider(board, sq, by, &BISHOP_DIRS, PieceKind::Bishop)
}

fn attacked_by_stepper(
    board: &Board,
    sq: Square,
    by: Color,
    deltas: &[(i8, i8)],
    kind: PieceKind,
) -> bool {
    deltas.iter().any(|&(df, dr)| {
        sq.offset(df, dr)
            .is_some_and(|from| board.get(from) == Some(Piece::new(kind, by)))
    })
}

fn attacked_by_slider(
    board: &Board,
    sq: Square,
    by: Color,
    dirs: &[(i8, i8)],
    kind: PieceKind,
) -> bool {
    for &(df, dr) in dirs {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            if let Some(piece) = board.get(next) {
                if piece.color == by && (piece.kind == kind || piece.kind == PieceKind::Queen) {
                    return true;
                }
                break;
            }
            cur = next;
        }
    }
    false
}

/// Moves that follow piece movement rules but may leave the king in check.
/// Castling is only emitted when the king is not in check and does not
/// pass through an attacked square; the landing square is left to the
/// legality filter.
pub fn generate_pseudo_legal_moves(pos: &Position, out: &mut MoveList) {
    let us = pos.side_to_move();
    let board = pos.board();

    for (from, piece) in board.pieces() {
        if piece.color != us {
            continue;
        }
        match piece.kind {
            PieceKind::Pawn => pawn_moves(pos, from, out),
            PieceKind::Knight => step_moves(board, from, piece, &KNIGHT_DELTAS, out),
            PieceKind::Bishop => slide_moves(board, from, piece, &BISHOP_DIRS, out),
            PieceKind::Rook => slide_moves(board, from, piece, &ROOK_DIRS, out),
            PieceKind::Queen => {
                slide_moves(board, from, piece, &ROOK_DIRS, out);
                slide_moves(board, from, piece, &BISHOP_DIRS, out);
            }
            PieceKind::King => {
                step_moves(board, from, piece, &KING_DELTAS, out);
                castle_moves(pos, from, out);
            }
        }
    }
}

fn push(out: &mut MoveList, mv: Move) {
    let pushed = out.try_push(mv);
    debug_assert!(pushed.is_ok(), "more than {MAX_MOVES} moves generated");
}

fn pawn_moves(pos: &Position, from: Square, out: &mut MoveList) {
    let board = pos.board();
    let us = pos.side_to_move();
    let dir = us.forward();
    let start_rank = match us {
        Color::White => 1,
        Color::Black => 6,
    };
    let last_rank = 7 - us.home_rank();

    let push_pawn = |out: &mut MoveList, to: Square, captured: Option<PieceKind>| {
        let base = Move {
            captured,
            ..Move::quiet(from, to, PieceKind::Pawn)
        };
        if to.rank() == last_rank {
            for promo in PieceKind::PROMOTIONS {
                push(
                    out,
                    Move {
                        promotion: Some(promo),
                        ..base
                    },
                );
            }
        } else {
            push(out, base);
        }
    };

    if let Some(one) = from.offset(0, dir) {
        if board.get(one).is_none() {
            push_pawn(out, one, None);
            if from.rank() == start_rank {
                if let Some(two) = one.offset(0, dir) {
                    if board.get(two).is_none() {
                        push(out, Move::quiet(from, two, PieceKind::Pawn));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = from.offset(df, dir) else {
            continue;
        };
        match board.get(to) {
            Some(target) if target.color != us => push_pawn(out, to, Some(target.kind)),
            None if pos.en_passant() == Some(to) => push(
                out,
                Move {
                    captured: Some(PieceKind::Pawn),
                    en_passant: true,
                    ..Move::quiet(from, to, PieceKind::Pawn)
                },
            ),
            _ => {}
        }
    }
}

fn step_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    deltas: &[(i8, i8)],
    out: &mut MoveList,
) {
    for &(df, dr) in deltas {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match board.get(to) {
            None => push(out, Move::quiet(from, to, piece.kind)),
            Some(target) if target.color != piece.color => push(
                out,
                Move {
                    captured: Some(target.kind),
                    ..Move::quiet(from, to, piece.kind)
                },
            ),
            Some(_) => {}
        }
    }
}

fn slide_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    dirs: &[(i8, i8)],
    out: &mut MoveList,
) {
    for &(df, dr) in dirs {
        let mut cur = from;
        while let Some(to) = cur.offset(df, dr) {
            match board.get(to) {
                None => push(out, Move::quiet(from, to, piece.kind)),
                Some(target) => {
                    if target.color != piece.color {
                        push(
                            out,
                            Move {
                                captured: Some(target.kind),
                                ..Move::quiet(from, to, piece.kind)
                            },
                        );
                    }
                    break;
                }
            }
            cur = to;
        }
    }
}

fn castle_moves(pos: &Position, from: Square, out: &mut MoveList) {
    let us = pos.side_to_move();
    let rank = us.home_rank();
    if from.file() != 4 || from.rank() != rank {
        return;
    }
    let (kingside, queenside) = match us {
        Color::White => (WHITE_KINGSIDE, WHITE_QUEENSIDE),
        Color::Black => (BLACK_KINGSIDE, BLACK_QUEENSIDE),
    };
    if !pos.can_castle(kingside) && !pos.can_castle(queenside) {
        return;
    }

    let board = pos.board();
    let them = !us;
    if is_square_attacked(board, from, them) {
        return;
    }
    let empty = |df: i8| from.offset(df, 0).is_some_and(|sq| board.get(sq).is_none());
    let safe = |df: i8| {
        from.offset(df, 0)
            .is_some_and(|sq| !is_square_attacked(board, sq, them))
    };

    if pos.can_castle(kingside) && empty(1) && empty(2) && safe(1) {
        if let Some(to) = from.offset(2, 0) {
            push(
                out,
                Move {
                    castle: true,
                    ..Move::quiet(from, to, PieceKind::King)
                },
            );
        }
    }
    if pos.can_castle(queenside) && empty(-1) && empty(-2) && empty(-3) && safe(-1) {
        if let Some(to) = from.offset(-2, 0) {
            push(
                out,
                Move {
                    castle: true,
                    ..Move::quiet(from, to, PieceKind::King)
                },
            );
        }
    }
}

/// Resolve long algebraic text (`e2e4`, `e7e8q`) against the legal moves.
/// A missing promotion suffix selects a queen.
pub fn find_move(pos: &Position, text: &str) -> Option<Move> {
    let text = text.trim();
    if !(4..=5).contains(&text.len()) || !text.is_ascii() {
        return None;
    }
    let from = Square::parse(&text[0..2])?;
    let to = Square::parse(&text[2..4])?;
    let promotion = match text.chars().nth(4) {
        Some(c) => Some(PieceKind::from_letter(c)?),
        None => None,
    };

    generate_legal_moves(pos).into_iter().find(|mv| {
        mv.from == from
            && mv.to == to
            && match (mv.promotion, promotion) {
                (None, None) => true,
                (Some(kind), None) => kind == PieceKind::Queen,
                (Some(kind), Some(wanted)) => kind == wanted,
                (None, Some(_)) => false,
            }
    })
}

/// True when neither side can possibly deliver mate: bare kings, a single
/// minor piece, or only bishops all standing on one square colour.
pub fn is_insufficient_material(pos: &Position) -> bool {
    let mut minors = 0usize;
    let mut knights = 0usize;
    let mut bishop_on_dark = false;
    let mut bishop_on_light = false;

    for (sq, piece) in pos.board().pieces() {
        match piece.kind {
            PieceKind::King => {}
            PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            PieceKind::Knight => {
                minors += 1;
                knights += 1;
            }
            PieceKind::Bishop => {
                minors += 1;
                if sq.is_dark() {
                    bishop_on_dark = true;
                } else {
                    bishop_on_light = true;
                }
            }
        }
    }

    minors <= 1 || (knights == 0 && !(bishop_on_dark && bishop_on_light))
}

/// Classify `pos`, whose key is the last entry of `history`.
pub fn game_status(pos: &Position, history: &BoardHistory) -> GameStatus {
    if !has_legal_move(pos) {
        return if in_check(pos) {
            GameStatus::Checkmate {
                winner: !pos.side_to_move(),
            }
        } else {
            GameStatus::Stalemate
        };
    }
    if history.is_threefold(pos.key()) {
        return GameStatus::Draw(DrawReason::Repetition);
    }
    if is_insufficient_material(pos) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }
    GameStatus::Ongoing
}

/// Count leaf nodes of the legal move tree to `depth`.
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal_moves(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        let undo = pos.make_move(mv);
        nodes += perft(pos, depth - 1);
        pos.unmake_move(mv, undo);
    }
    nodes
}
