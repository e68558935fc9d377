//! negamax-chess: a small chess engine built around NegaMax alpha-beta search.
//!
//! Given a position and a depth budget the engine returns one move, using an
//! opening book for the first few plies and a transposition-table backed
//! search afterwards. Draws by threefold repetition and insufficient material
//! are detected before any search runs.
//!
//! ## Modules
//!
//! - [`constants`] - Piece values, search limits and tuning parameters
//! - [`board`] - Colours, pieces, squares and the 8x8 grid
//! - [`zobrist`] - Position hash keys
//! - [`position`] - Full game state with make/unmake and FEN
//! - [`movegen`] - Legal moves, check detection, game status, perft
//! - [`eval`] - Material and piece-square evaluation
//! - [`tt`] - Transposition table
//! - [`ordering`] - MVV-LVA move ordering
//! - [`history`] - Repetition history of a game line
//! - [`book`] - Hardcoded opening lines
//! - [`search`] - NegaMax with alpha-beta pruning
//! - [`engine`] - Book-then-search facade and difficulty levels
//! - [`game`] - Caller-side game with undo
//! - [`worker`] - Search on a background thread
//! - [`protocol`] - Line-oriented text protocol
//!
//! ## Example
//!
//! ```
//! use negamax_chess::engine::{Engine, EngineConfig};
//! use negamax_chess::game::Game;
//!
//! let mut game = Game::new();
//! game.play_text("e2e4").unwrap();
//!
//! let mut engine = Engine::new(EngineConfig { tt_size_mb: 1, ..EngineConfig::default() });
//! let response = engine.think(&game.request(2));
//! let reply = game.apply_response(&response).unwrap();
//! println!("engine plays {}", reply.unwrap());
//! ```

pub mod board;
pub mod book;
pub mod constants;
pub mod engine;
pub mod eval;
pub mod game;
pub mod history;
pub mod movegen;
pub mod ordering;
pub mod position;
pub mod protocol;
pub mod search;
pub mod tt;
pub mod worker;
pub mod zobrist;
