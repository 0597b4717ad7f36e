//! Hold'em equity engine: a seven card hand evaluator, a shared evaluation
//! cache and an adaptive exact / Monte Carlo equity calculator.

pub mod cache;
pub mod cards;
pub mod cli;
pub mod display;
pub mod equity;
pub mod error;
pub mod hand_evaluator;
