//! Constants for board geometry, piece values and search parameters.
//!
//! Squares are indexed 0..64 with a1 = 0, h1 = 7, a8 = 56, h8 = 63.
//! Scores are centipawns from White's point of view unless noted otherwise.

// =============================================================================
// Board Geometry
// =============================================================================

/// Files and ranks per side.
pub const N: usize = 8;

/// Number of squares on the board.
pub const NUM_SQUARES: usize = N * N;

/// Upper bound on legal moves in any reachable position (218 is the known max).
pub const MAX_MOVES: usize = 256;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// =============================================================================
// Direction Offsets (file delta, rank delta)
// =============================================================================

/// Knight jumps.
pub const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// King steps (also the union of rook and bishop rays).
pub const KING_DELTAS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Rook rays.
pub const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Bishop rays.
pub const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

// =============================================================================
// Piece Values
// =============================================================================

pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;
pub const KING_VALUE: i32 = 20_000;

// =============================================================================
// Search Parameters
// =============================================================================

/// Base magnitude of a checkmate score. Mates found with more remaining depth
/// (closer to the root) score further from zero.
pub const MATE_SCORE: i32 = 100_000;

/// Window bound strictly larger than any reachable score.
pub const INFINITY: i32 = 1_000_000;

/// Scores beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;

/// Search depth for each difficulty level.
pub const DEPTH_EASY: u8 = 2;
pub const DEPTH_MEDIUM: u8 = 3;
pub const DEPTH_HARD: u8 = 4;

/// Default transposition table size in MiB.
pub const DEFAULT_TT_MB: usize = 16;

/// Nodes between wall-clock checks when a time cap is set.
pub const CHECK_INTERVAL_NODES: u64 = 2_048;

/// Longest principal variation walked out of the transposition table.
pub const PV_MAX_LEN: usize = 16;

/// Repetition count that ends the game in a draw.
pub const REPETITION_LIMIT: usize = 3;

// =============================================================================
// Opening Book
// =============================================================================

/// The book is only consulted for plies strictly below this index.
pub const BOOK_MAX_PLY: usize = 10;

// =============================================================================
// MVV-LVA
// =============================================================================

/// Victim multiplier in the capture ordering key (`victim * 10 - aggressor`).
pub const MVV_LVA_VICTIM_WEIGHT: i32 = 10;

/// Offset placing every capture above every quiet move.
pub const CAPTURE_ORDER_BASE: i32 = 1_000_000;

/// Ordering key for the transposition table move.
pub const TT_MOVE_ORDER: i32 = 10_000_000;
