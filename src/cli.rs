use std::io::Write;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::cards::{cards_display, parse_board, Card};
use crate::display::{
    board_display, equity_bar, histogram_table, print_error, print_section, progress_line,
    result_table,
};
use crate::equity::{
    clamp_opponents, CancelToken, EngineConfig, EquityEngine, EquityRequest, DEFAULT_ITERATIONS,
};
use crate::error::{EngineError, EngineResult};
use crate::hand_evaluator::evaluate_best;

#[derive(Parser)]
#[command(
    name = "equity",
    version = "1.0.0",
    about = "Hold'em equity calculator: win, tie and lose odds against random hands."
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate equity of a hand against random opponents
    Calc {
        /// Your hole cards (e.g., AsAh)
        hole: String,
        /// Board cards, 0, 3, 4 or 5 of them (e.g., Kd7c2h)
        #[arg(short, long)]
        board: Option<String>,
        /// Number of opponents, clamped to 1-8
        #[arg(short, long, default_value = "1")]
        opponents: usize,
        /// Monte Carlo iteration budget
        #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,
        /// Seed for reproducible Monte Carlo runs
        #[arg(long)]
        seed: Option<u64>,
        /// Worker threads for Monte Carlo runs
        #[arg(short, long)]
        workers: Option<usize>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate the best five card hand out of 5 to 7 cards
    Eval {
        /// Cards to evaluate (e.g., AsKsQsJsTs2d3c)
        cards: String,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

pub fn run_with_args(args: Vec<String>) {
    let cli = Cli::parse_from(args);
    dispatch(cli);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    // A second init (run_with_args in tests) keeps the first logger.
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp_millis()
        .try_init();
}

fn dispatch(cli: Cli) {
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Calc {
            hole,
            board,
            opponents,
            iterations,
            seed,
            workers,
            json,
        } => cmd_calc(hole, board, opponents, iterations, seed, workers, json),
        Commands::Eval { cards } => cmd_eval(cards),
    };

    if let Err(e) = outcome {
        print_error(&e.to_string());
    }
}

fn parse_hole(notation: &str) -> EngineResult<Vec<Card>> {
    let cards = parse_board(notation)?;
    if cards.len() != 2 {
        return Err(EngineError::WrongCardCount {
            need: 2,
            got: cards.len(),
        });
    }
    Ok(cards)
}

fn cmd_calc(
    hole: String,
    board: Option<String>,
    opponents: usize,
    iterations: usize,
    seed: Option<u64>,
    workers: Option<usize>,
    json: bool,
) -> EngineResult<()> {
    let hole = parse_hole(&hole)?;
    let board = match &board {
        Some(b) => parse_board(b)?,
        None => Vec::new(),
    };
    let opponents = clamp_opponents(opponents);

    let config = EngineConfig {
        workers,
        ..EngineConfig::default()
    };
    let engine = EquityEngine::new(config)?;

    let mut request = EquityRequest::new(&hole, &board, opponents)
        .iterations(iterations)
        .with_best_five();
    if let Some(seed) = seed {
        request = request.seed(seed);
    }

    if !json {
        println!();
        let board_str = if board.is_empty() {
            String::new()
        } else {
            format!(" on {}", board_display(&board))
        };
        println!(
            "  {} vs {} opponent(s){}",
            board_display(&hole),
            opponents.to_string().bold(),
            board_str
        );
    }

    let cancel = CancelToken::new();
    let report = engine.compute(&request, &cancel, |partial| {
        if !json {
            eprint!("\r{}", progress_line(partial).dimmed());
            let _ = std::io::stderr().flush();
        }
    })?;
    let report = report.ok_or(EngineError::Cancelled)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    eprintln!();
    println!("\n  Hero: {}\n", equity_bar(report.result.equity(), 30));
    println!("{}", result_table(&report));
    print_section("Hand distribution", &histogram_table(&report));

    if let Some(best) = report.best_five {
        print_section(
            "Best five",
            &format!("  {}  {}", board_display(&best.cards), best.rank),
        );
    }
    println!();
    Ok(())
}

fn cmd_eval(cards: String) -> EngineResult<()> {
    let cards = parse_board(&cards)?;
    let best = evaluate_best(&cards)?;

    println!();
    println!("  Cards:     {}", board_display(&cards));
    println!("  Hand:      {}", best.rank.category().to_string().bold());
    println!("  Best five: {}", cards_display(&best.cards));
    println!("  Rank:      {}", best.rank);
    println!();
    Ok(())
}
