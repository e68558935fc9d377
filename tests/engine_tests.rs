//! End-to-end tests for the engine, game and worker.

use negamax_chess::board::Color;
use negamax_chess::constants::MATE_SCORE;
use negamax_chess::engine::{Difficulty, Engine, EngineConfig};
use negamax_chess::game::{Game, GameError};
use negamax_chess::movegen::{DrawReason, GameStatus};
use negamax_chess::worker::Worker;

fn small_config() -> EngineConfig {
    EngineConfig {
        tt_size_mb: 1,
        ..EngineConfig::default()
    }
}

/// Play `moves` from the start position.
fn game_after(moves: &[&str]) -> Game {
    let mut game = Game::new();
    for text in moves {
        game.play_text(text).unwrap();
    }
    game
}

// =============================================================================
// Tactics
// =============================================================================

#[test]
fn test_scholars_mate_at_every_difficulty() {
    for difficulty in Difficulty::ALL {
        let mut engine = Engine::new(EngineConfig {
            difficulty,
            use_book: false,
            ..small_config()
        });
        let mut game = game_after(&["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6"]);
        let response = engine.think(&game.request(difficulty.depth()));

        assert_eq!(response.chosen_move.map(|m| m.uci()), Some("h5f7".to_string()));
        assert!(response.score >= MATE_SCORE);
        game.apply_response(&response).unwrap();
        assert_eq!(game.status(), GameStatus::Checkmate { winner: Color::White });
    }
}

#[test]
fn test_takes_hanging_queen() {
    let mut engine = Engine::new(small_config());
    let game = Game::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
    let response = engine.think(&game.request(2));
    assert_eq!(response.chosen_move.map(|m| m.uci()), Some("d1d5".to_string()));
}

#[test]
fn test_avoids_stalemating_when_winning() {
    // Qb6 or Qc7 would stalemate; the engine should keep the game going or mate.
    let mut engine = Engine::new(small_config());
    let mut game = Game::from_fen("k7/8/1K6/8/8/8/8/2Q5 w - - 0 1").unwrap();
    let response = engine.think(&game.request(3));
    game.apply_response(&response).unwrap();
    assert_ne!(game.status(), GameStatus::Stalemate);
}

// =============================================================================
// Book
// =============================================================================

#[test]
fn test_book_move_first_even_at_high_depth() {
    let mut engine = Engine::new(small_config());
    let game = Game::new();
    let response = engine.think(&game.request(8));
    assert!(response.from_book);
    assert_eq!(response.chosen_move.map(|m| m.uci()), Some("e2e4".to_string()));
}

#[test]
fn test_book_stays_off_once_left() {
    let mut engine = Engine::new(small_config());
    let mut game = game_after(&["a2a3"]);

    let response = engine.think(&game.request(1));
    assert!(!response.from_book);
    game.apply_response(&response).unwrap();
    assert!(!game.book_active());

    // Even if the game transposes back into known territory the book is not
    // consulted again.
    game.undo_pair().unwrap();
    game.play_text("e2e4").unwrap();
    assert!(!game.request(3).use_book);
}

// =============================================================================
// Draws and errors
// =============================================================================

#[test]
fn test_threefold_repetition_stops_the_engine() {
    let mut engine = Engine::new(small_config());
    let mut game = Game::from_fen("7k/8/8/8/8/8/8/R6K w - - 0 1").unwrap();
    for text in ["h1g1", "h8g8", "g1h1", "g8h8", "h1g1", "h8g8", "g1h1", "g8h8"] {
        game.play_text(text).unwrap();
    }
    let response = engine.think(&game.request(3));
    assert_eq!(response.chosen_move, None);
    assert_eq!(response.terminal, Some(GameStatus::Draw(DrawReason::Repetition)));
}

#[test]
fn test_illegal_request_is_reported() {
    let mut game = Game::new();
    let err = game.play_text("e1e2").unwrap_err();
    assert_eq!(err, GameError::IllegalMove("e1e2".to_string()));
    assert!(game.play_text("zz").is_err());
    assert_eq!(game.ply(), 0);
}

// =============================================================================
// Worker
// =============================================================================

#[test]
fn test_worker_self_play_stays_legal() {
    let mut worker = Worker::spawn(EngineConfig {
        difficulty: Difficulty::Easy,
        ..small_config()
    })
    .unwrap();
    let mut game = Game::new();

    for _ in 0..16 {
        if game.status().is_over() {
            break;
        }
        worker.submit(game.request(Difficulty::Easy.depth())).unwrap();
        let response = worker.wait().unwrap();
        let mv = game.apply_response(&response).unwrap();
        assert!(mv.is_some());
    }
    assert!(game.ply() > 0);
    assert_eq!(game.position().key(), game.position().compute_key());
}
