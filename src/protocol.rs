//! Line-oriented text protocol.
//!
//! Modelled on GTP: each command line may start with a numeric id, and every
//! command gets one response of the form `=[id] text` on success or
//! `?[id] error` on failure, followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `list_commands`, `known_command <cmd>`, `quit`
//! - `new` - Start a new game from the standard position
//! - `position startpos|<fen> [moves <m1> <m2> ...]` - Set up a position
//! - `fen` - Print the current position as FEN
//! - `play <move>` - Play a move in long algebraic form (`e2e4`, `e7e8q`)
//! - `genmove` - Let the engine choose and play a move
//! - `undo` - Take back the last move pair
//! - `difficulty [easy|medium|hard]` - Show or set the search depth level
//! - `moves` - List the legal moves
//! - `status` - Report whether the game is over
//! - `showboard` - Draw the board
//! - `perft <depth>` - Count leaf nodes of the move tree

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::engine::{Difficulty, EngineConfig};
use crate::game::Game;
use crate::movegen::perft;
use crate::position::Move;
use crate::worker::Worker;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "difficulty",
    "fen",
    "genmove",
    "known_command",
    "list_commands",
    "moves",
    "name",
    "new",
    "perft",
    "play",
    "position",
    "quit",
    "showboard",
    "status",
    "undo",
    "version",
];

/// Perft deeper than this takes minutes from ordinary positions.
const MAX_PERFT_DEPTH: u32 = 6;

/// Protocol session state: the game and the search worker.
pub struct Session {
    game: Game,
    worker: Worker,
    difficulty: Difficulty,
}

impl Session {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let worker = Worker::spawn(config).context("starting search worker")?;
        Ok(Self {
            game: Game::new(),
            worker,
            difficulty: config.difficulty,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("reading command")?;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n").context("writing response")?;
            output.flush().context("flushing response")?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command id from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "new" => {
                self.game = Game::new();
                match self.worker.new_game() {
                    Ok(()) => (true, String::new()),
                    Err(err) => (false, err.to_string()),
                }
            }

            "position" => self.set_position(args),

            "fen" => (true, self.game.position().to_fen()),

            "play" => {
                let Some(text) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match self.game.play_text(text) {
                    Ok(mv) => (true, mv.uci()),
                    Err(err) => (false, err.to_string()),
                }
            }

            "genmove" => self.genmove(),

            "undo" => match self.game.undo_pair() {
                Ok(plies) => (true, plies.to_string()),
                Err(err) => (false, err.to_string()),
            },

            "difficulty" => match args.first() {
                None => (true, self.difficulty.to_string()),
                Some(level) => match level.parse::<Difficulty>() {
                    Ok(level) => {
                        self.difficulty = level;
                        (true, level.to_string())
                    }
                    Err(err) => (false, err.to_string()),
                },
            },

            "moves" => {
                let moves: Vec<String> = self.game.legal_moves().iter().map(Move::uci).collect();
                (true, moves.join(" "))
            }

            "status" => (true, self.game.status().to_string()),

            "showboard" => {
                let pos = self.game.position();
                (
                    true,
                    format!("\n{}\n{} to move\n{}", pos.board(), pos.side_to_move(), pos.to_fen()),
                )
            }

            "perft" => {
                let Some(depth) = args.first().and_then(|d| d.parse::<u32>().ok()) else {
                    return (false, "expected a depth".to_string());
                };
                if depth > MAX_PERFT_DEPTH {
                    return (false, format!("depth must be at most {MAX_PERFT_DEPTH}"));
                }
                let mut pos = self.game.position().clone();
                (true, perft(&mut pos, depth).to_string())
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn set_position(&mut self, args: &[&str]) -> (bool, String) {
        let (setup, moves) = match args.iter().position(|&a| a == "moves") {
            Some(i) => (&args[..i], &args[i + 1..]),
            None => (args, &[][..]),
        };

        let game = match setup {
            [] => return (false, "missing argument".to_string()),
            ["startpos"] => Game::new(),
            fields => match Game::from_fen(&fields.join(" ")) {
                Ok(game) => game,
                Err(err) => return (false, err.to_string()),
            },
        };
        self.game = game;
        for text in moves {
            if let Err(err) = self.game.play_text(text) {
                return (false, err.to_string());
            }
        }
        (true, String::new())
    }

    fn genmove(&mut self) -> (bool, String) {
        let status = self.game.status();
        if status.is_over() {
            return (false, format!("game is over: {status}"));
        }

        let request = self.game.request(self.difficulty.depth());
        let chosen = match self.worker.submit(request).and_then(|()| self.worker.wait()) {
            Ok(response) => match self.game.apply_response(&response) {
                Ok(mv) => mv,
                Err(err) => {
                    warn!("engine reply rejected: {err}");
                    None
                }
            },
            Err(err) => {
                warn!("search worker failed: {err}");
                None
            }
        };

        let mv = match chosen {
            Some(mv) => mv,
            None => {
                let Some(mv) = self.game.fallback_move() else {
                    return (false, "no legal moves".to_string());
                };
                if let Err(err) = self.game.play(mv) {
                    return (false, err.to_string());
                }
                mv
            }
        };
        info!("genmove {mv}; {}", self.game.status());
        (true, mv.uci())
    }
}
