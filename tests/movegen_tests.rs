//! Move generator integration tests.
//!
//! Perft counts for the standard test positions, plus randomised games that
//! check make/unmake and hashing invariants along the way.

use negamax_chess::movegen::{generate_legal_moves, in_check, is_square_attacked, perft};
use negamax_chess::position::Position;

// =============================================================================
// Perft
// =============================================================================

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn perft_fen(fen: &str, depth: u32) -> u64 {
    let mut pos = Position::from_fen(fen).unwrap();
    let before = pos.clone();
    let nodes = perft(&mut pos, depth);
    assert_eq!(pos, before, "perft must leave the position untouched");
    nodes
}

#[test]
fn test_perft_start_position() {
    let fen = negamax_chess::constants::START_FEN;
    assert_eq!(perft_fen(fen, 1), 20);
    assert_eq!(perft_fen(fen, 2), 400);
    assert_eq!(perft_fen(fen, 3), 8_902);
}

#[test]
fn test_perft_kiwipete() {
    assert_eq!(perft_fen(KIWIPETE, 1), 48);
    assert_eq!(perft_fen(KIWIPETE, 2), 2_039);
}

#[test]
fn test_perft_rook_endgame() {
    let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    assert_eq!(perft_fen(fen, 1), 14);
    assert_eq!(perft_fen(fen, 2), 191);
    assert_eq!(perft_fen(fen, 3), 2_812);
}

#[test]
fn test_perft_promotions_and_castling() {
    let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    assert_eq!(perft_fen(fen, 1), 6);
    assert_eq!(perft_fen(fen, 2), 264);
}

#[test]
fn test_perft_discovered_checks() {
    let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    assert_eq!(perft_fen(fen, 1), 44);
    assert_eq!(perft_fen(fen, 2), 1_486);
}

// =============================================================================
// Random games
// =============================================================================

/// Play up to `plies` random legal moves, checking invariants after every
/// move and unmaking everything at the end.
fn random_game(seed: u64, plies: usize) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut pos = Position::startpos();
    let start = pos.clone();
    let mut line = Vec::new();

    for _ in 0..plies {
        let moves = generate_legal_moves(&pos);
        let Some(&mv) = rng.choice(moves.iter()) else {
            break;
        };

        let mover = pos.side_to_move();
        let before = pos.clone();
        let undo = pos.make_move(mv);

        // The mover's king is never left attacked.
        assert!(
            !is_square_attacked(pos.board(), pos.king_square(mover), !mover),
            "{mv} leaves the king in check in {}",
            before.to_fen()
        );
        assert_eq!(pos.key(), pos.compute_key(), "stale key after {mv}");
        assert_eq!(Position::from_fen(&pos.to_fen()).unwrap(), pos);

        // Unmaking restores the exact position.
        let mut copy = pos.clone();
        copy.unmake_move(mv, undo);
        assert_eq!(copy, before);

        line.push((mv, undo));
    }

    while let Some((mv, undo)) = line.pop() {
        pos.unmake_move(mv, undo);
    }
    assert_eq!(pos, start);
}

#[test]
fn test_random_games_keep_invariants() {
    for seed in 0..20 {
        random_game(seed, 120);
    }
}

#[test]
fn test_check_detection_matches_attack_test() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
    assert!(in_check(&pos));
    let moves = generate_legal_moves(&pos);
    assert!(moves.iter().all(|m| m.from == pos.king_square(pos.side_to_move())));
}
