use thiserror::Error;

use crate::cards::Card;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid rank: {0}")]
    InvalidRank(char),

    #[error("Invalid suit: {0}")]
    InvalidSuit(char),

    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Invalid board notation: {0}")]
    InvalidBoardNotation(String),

    #[error("Expected {need} cards, got {got}")]
    WrongCardCount { need: usize, got: usize },

    #[error("Card {0} appears more than once")]
    DuplicateCard(Card),

    #[error("Board must hold 0, 3, 4 or 5 cards, got {0}")]
    InvalidBoardSize(usize),

    #[error("Opponent count must be at least 1, got {0}")]
    InvalidOpponentCount(usize),

    #[error("Cannot deal {requested} cards, only {available} remaining")]
    NotEnoughDeck { requested: usize, available: usize },

    #[error("{requested} iterations cannot be split across {workers} workers")]
    InsufficientIterations { requested: usize, workers: usize },

    #[error("Computation was cancelled")]
    Cancelled,

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
