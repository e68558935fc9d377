//! Move ordering: hash move, then MVV-LVA captures, then quiet moves.

use std::cmp::Reverse;

use crate::constants::{CAPTURE_ORDER_BASE, MVV_LVA_VICTIM_WEIGHT, TT_MOVE_ORDER};
use crate::eval::piece_value;
use crate::position::Move;

/// Most valuable victim, least valuable attacker. Promotions add the value
/// of the new piece. Zero for quiet moves.
pub fn mvv_lva(mv: &Move) -> i32 {
    let capture = mv
        .captured
        .map_or(0, |victim| MVV_LVA_VICTIM_WEIGHT * piece_value(victim) - piece_value(mv.piece));
    let promotion = mv.promotion.map_or(0, piece_value);
    capture + promotion
}

fn order_key(mv: &Move, tt_move: Option<Move>) -> i32 {
    if tt_move == Some(*mv) {
        TT_MOVE_ORDER
    } else if mv.is_capture() || mv.promotion.is_some() {
        CAPTURE_ORDER_BASE + mvv_lva(mv)
    } else {
        0
    }
}

/// Sort `moves` in place, best candidates first. Quiet moves keep their
/// generation order.
pub fn order_moves(moves: &mut [Move], tt_move: Option<Move>) {
    moves.sort_by_key(|mv| Reverse(order_key(mv, tt_move)));
}
