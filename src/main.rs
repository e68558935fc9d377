//! negamax-chess: a small alpha-beta chess engine.
//!
//! ## Usage
//!
//! - `negamax-chess` - Engine plays itself from the start position
//! - `negamax-chess serve` - Start the text protocol on stdin/stdout
//! - `negamax-chess perft --depth 4` - Count move-tree leaves
//!
//! Set `RUST_LOG=info` (or `debug`) to see search output on stderr.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::warn;

use negamax_chess::constants::{DEFAULT_TT_MB, START_FEN};
use negamax_chess::engine::{Difficulty, EngineConfig};
use negamax_chess::game::Game;
use negamax_chess::movegen::perft;
use negamax_chess::position::{Move, Position};
use negamax_chess::protocol::Session;
use negamax_chess::worker::Worker;

/// negamax-chess: NegaMax alpha-beta chess engine
#[derive(Parser)]
#[command(name = "negamax-chess")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Search depth level: easy, medium or hard
    #[arg(long, global = true, default_value_t = Difficulty::Medium)]
    difficulty: Difficulty,

    /// Transposition table size in MiB
    #[arg(long, global = true, default_value_t = DEFAULT_TT_MB)]
    tt_mb: usize,

    /// Stop each search after this many milliseconds
    #[arg(long, global = true)]
    max_time_ms: Option<u64>,

    /// Never play moves from the opening book
    #[arg(long, global = true)]
    no_book: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text protocol server on stdin/stdout
    Serve,
    /// Let the engine play both sides and print the game
    Play {
        /// Stop after this many plies
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
        /// Starting position (defaults to the standard one)
        #[arg(long)]
        fen: Option<String>,
    },
    /// Count leaf nodes of the legal move tree
    Perft {
        #[arg(long, default_value_t = 4)]
        depth: u32,
        #[arg(long)]
        fen: Option<String>,
    },
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            difficulty: self.difficulty,
            tt_size_mb: self.tt_mb,
            max_time: self.max_time_ms.map(Duration::from_millis),
            use_book: !self.no_book,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.engine_config();

    match cli.command {
        Some(Commands::Serve) => {
            let mut session = Session::new(config)?;
            session.run(io::stdin().lock(), io::stdout().lock())
        }
        Some(Commands::Perft { depth, fen }) => run_perft(depth, fen.as_deref()),
        Some(Commands::Play { max_plies, fen }) => run_self_play(config, max_plies, fen.as_deref()),
        None => run_self_play(config, 200, None),
    }
}

fn run_perft(depth: u32, fen: Option<&str>) -> Result<()> {
    let fen = fen.unwrap_or(START_FEN);
    let mut pos = Position::from_fen(fen).with_context(|| format!("parsing FEN {fen:?}"))?;
    println!("{}", pos.board());
    for d in 1..=depth {
        println!("perft({d}) = {}", perft(&mut pos, d));
    }
    Ok(())
}

fn run_self_play(config: EngineConfig, max_plies: usize, fen: Option<&str>) -> Result<()> {
    let mut game = match fen {
        Some(fen) => Game::from_fen(fen).with_context(|| format!("parsing FEN {fen:?}"))?,
        None => Game::new(),
    };
    let mut worker = Worker::spawn(config).context("starting search worker")?;
    let depth = config.difficulty.depth();

    println!("negamax-chess self-play at {} (depth {depth})\n", config.difficulty);
    println!("{}", game.position().board());

    while !game.status().is_over() && game.ply() < max_plies {
        let mover = game.position().side_to_move();
        let chosen = match worker.submit(game.request(depth)).and_then(|()| worker.wait()) {
            Ok(response) => {
                let tag = if response.from_book { " (book)" } else { "" };
                let mv = game.apply_response(&response)?;
                mv.map(|mv| (mv, format!("{tag} score {} nodes {}", response.score, response.nodes)))
            }
            Err(err) => {
                warn!("search worker failed: {err}");
                None
            }
        };
        let (mv, note) = match chosen {
            Some(found) => found,
            None => (play_fallback(&mut game)?, " (random)".to_string()),
        };
        println!("{:>3}. {:<5} {mv}{note}", game.ply(), mover.to_string());
    }

    println!("\n{}", game.position().board());
    println!("{}", game.position().to_fen());
    println!("result: {}", game.status());
    Ok(())
}

fn play_fallback(game: &mut Game) -> Result<Move> {
    let Some(mv) = game.fallback_move() else {
        bail!("no legal move in {}", game.position().to_fen());
    };
    game.play(mv)?;
    Ok(mv)
}
