//! Win/tie/lose probabilities for a hero hand against random opponents.
//!
//! Small problems are enumerated exactly on the calling thread. Everything
//! else is sampled by a pool of Monte Carlo workers that report partial
//! tallies back to the caller, which folds them into progress snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use itertools::Itertools;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::cache::EvalCache;
use crate::cards::{find_duplicate, Card, Deck};
use crate::error::{EngineError, EngineResult};
use crate::hand_evaluator::{evaluate_with_best_five, BestHand, HandCategory, HandRank};

/// Iterations the interactive front end asks for.
pub const DEFAULT_ITERATIONS: usize = 120_000;
pub const MAX_OPPONENTS: usize = 8;

/// Clamps a user supplied opponent count to `1..=MAX_OPPONENTS`.
pub fn clamp_opponents(opponents: usize) -> usize {
    opponents.clamp(1, MAX_OPPONENTS)
}

/// `max(2, available_parallelism - 1)`, leaving a core for the caller.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityResult {
    pub win: f64,
    pub tie: f64,
}

impl EquityResult {
    pub fn lose(&self) -> f64 {
        (1.0 - self.win - self.tie).max(0.0)
    }

    pub fn equity(&self) -> f64 {
        self.win + self.tie / 2.0
    }
}

impl fmt::Display for EquityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Win {:.1}% | Tie {:.1}% | Lose {:.1}% (equity: {:.1}%)",
            self.win * 100.0,
            self.tie * 100.0,
            self.lose() * 100.0,
            self.equity() * 100.0,
        )
    }
}

/// Running win/tie/trial counts plus the hero's category counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub wins: u64,
    pub ties: u64,
    pub trials: u64,
    pub categories: [u64; 9],
}

impl Tally {
    /// Records one showdown against the strongest opponent.
    pub fn record(&mut self, hero: HandRank, best_opponent: HandRank) {
        self.categories[hero.category().index()] += 1;
        match hero.cmp(&best_opponent) {
            std::cmp::Ordering::Greater => self.wins += 1,
            std::cmp::Ordering::Equal => self.ties += 1,
            std::cmp::Ordering::Less => {}
        }
        self.trials += 1;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.wins += other.wins;
        self.ties += other.ties;
        self.trials += other.trials;
        for (mine, theirs) in self.categories.iter_mut().zip(other.categories.iter()) {
            *mine += theirs;
        }
    }

    pub fn result(&self) -> EquityResult {
        let trials = self.trials.max(1) as f64;
        EquityResult {
            win: self.wins as f64 / trials,
            tie: self.ties as f64 / trials,
        }
    }

    /// Share of trials per category; categories never seen are absent.
    pub fn histogram(&self) -> BTreeMap<HandCategory, f64> {
        let trials = self.trials.max(1) as f64;
        self.categories
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .filter_map(|(i, &n)| HandCategory::from_index(i).map(|c| (c, n as f64 / trials)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    Exact,
    MonteCarlo,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Exact => write!(f, "Exact enumeration"),
            Method::MonteCarlo => write!(f, "Monte Carlo"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EquityReport {
    pub result: EquityResult,
    pub histogram: BTreeMap<HandCategory, f64>,
    /// Zero for exact enumeration.
    pub iterations_per_second: f64,
    pub trials: u64,
    pub method: Method,
    /// Per worker totals for Monte Carlo runs, empty otherwise.
    pub workers: Vec<Tally>,
    pub best_five: Option<BestHand>,
}

impl EquityReport {
    pub fn totals(&self) -> Tally {
        let mut total = Tally::default();
        for worker in &self.workers {
            total.merge(worker);
        }
        total
    }
}

/// Inputs of one equity computation.
#[derive(Debug, Clone)]
pub struct EquityRequest {
    pub hole: Vec<Card>,
    pub board: Vec<Card>,
    pub opponents: usize,
    pub iterations: usize,
    pub seed: Option<u64>,
    pub best_five: bool,
}

impl EquityRequest {
    pub fn new(hole: &[Card], board: &[Card], opponents: usize) -> EquityRequest {
        EquityRequest {
            hole: hole.to_vec(),
            board: board.to_vec(),
            opponents,
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            best_five: false,
        }
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Makes Monte Carlo runs reproducible for a given worker count.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Adds the hero's best five cards to the report when the board is full.
    pub fn with_best_five(mut self) -> Self {
        self.best_five = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Monte Carlo worker count, `None` for [`default_workers`].
    pub workers: Option<usize>,
    /// Largest number of unknown cards that is enumerated exactly.
    pub exact_threshold: usize,
    /// Trials a worker runs between progress reports.
    pub progress_chunk: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            workers: None,
            exact_threshold: 3,
            progress_chunk: 4096,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and its workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Validated inputs shared read-only with every worker.
#[derive(Debug)]
struct Setup {
    hole: [Card; 2],
    board: Vec<Card>,
    deck: Deck,
    unknown_board: usize,
    opponent_cards: usize,
}

impl Setup {
    fn new(request: &EquityRequest) -> EngineResult<Setup> {
        let hole: [Card; 2] = request.hole.as_slice().try_into().map_err(|_| {
            EngineError::WrongCardCount {
                need: 2,
                got: request.hole.len(),
            }
        })?;

        if !matches!(request.board.len(), 0 | 3 | 4 | 5) {
            return Err(EngineError::InvalidBoardSize(request.board.len()));
        }
        if request.opponents == 0 {
            return Err(EngineError::InvalidOpponentCount(request.opponents));
        }

        let mut used = hole.to_vec();
        used.extend_from_slice(&request.board);
        if let Some(dup) = find_duplicate(&used) {
            return Err(EngineError::DuplicateCard(dup));
        }

        let deck = Deck::without(&used);
        let unknown_board = 5 - request.board.len();
        let opponent_cards = 2 * request.opponents;
        if unknown_board + opponent_cards > deck.len() {
            return Err(EngineError::NotEnoughDeck {
                requested: unknown_board + opponent_cards,
                available: deck.len(),
            });
        }

        Ok(Setup {
            hole,
            board: request.board.clone(),
            deck,
            unknown_board,
            opponent_cards,
        })
    }

    fn remain_to_deal(&self) -> usize {
        self.unknown_board + self.opponent_cards
    }

    /// Known board followed by `runout`.
    fn full_board(&self, runout: &[Card]) -> [Card; 5] {
        let mut board = [self.hole[0]; 5];
        for (slot, card) in board.iter_mut().zip(self.board.iter().chain(runout)) {
            *slot = *card;
        }
        board
    }
}

fn seven(pair: [Card; 2], board: &[Card; 5]) -> [Card; 7] {
    [pair[0], pair[1], board[0], board[1], board[2], board[3], board[4]]
}

/// Strongest of the opponent hands laid out as consecutive pairs.
fn best_opponent(cache: &EvalCache, opponents: &[Card], board: &[Card; 5]) -> HandRank {
    let mut best = cache.rank7(&seven([opponents[0], opponents[1]], board));
    for pair in opponents[2..].chunks_exact(2) {
        let rank = cache.rank7(&seven([pair[0], pair[1]], board));
        if rank > best {
            best = rank;
        }
    }
    best
}

/// Independent stream per worker; seeded runs mix the worker id into the seed.
fn worker_rng(seed: Option<u64>, worker: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(mix_seed(seed, worker)),
        None => StdRng::from_entropy(),
    }
}

// splitmix64 finaliser
fn mix_seed(seed: u64, worker: usize) -> u64 {
    let mut z = seed.wrapping_add((worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn run_worker<R: Rng>(
    id: usize,
    trials: usize,
    chunk: usize,
    setup: &Setup,
    cache: &EvalCache,
    cancel: &CancelToken,
    rng: &mut R,
    tx: &mpsc::Sender<(usize, Tally)>,
) {
    let mut deck = setup.deck.clone();
    let mut local = Tally::default();
    let needed = setup.remain_to_deal();

    for _ in 0..trials {
        if cancel.is_cancelled() {
            return;
        }

        let (dealt, _) = deck.cards.partial_shuffle(rng, needed);
        let (opponents, runout) = dealt.split_at(setup.opponent_cards);
        let board = setup.full_board(runout);

        let hero = cache.rank7(&seven(setup.hole, &board));
        local.record(hero, best_opponent(cache, opponents, &board));

        if local.trials as usize >= chunk {
            if tx.send((id, local)).is_err() {
                return;
            }
            local = Tally::default();
        }
    }

    if local.trials > 0 {
        let _ = tx.send((id, local));
    }
}

pub struct EquityEngine {
    config: EngineConfig,
    workers: usize,
    cache: Arc<EvalCache>,
    pool: rayon::ThreadPool,
}

impl EquityEngine {
    /// Engine backed by the process wide evaluation cache.
    pub fn new(config: EngineConfig) -> EngineResult<EquityEngine> {
        EquityEngine::with_cache(config, EvalCache::global())
    }

    pub fn with_cache(config: EngineConfig, cache: Arc<EvalCache>) -> EngineResult<EquityEngine> {
        let workers = config.workers.unwrap_or_else(default_workers).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("equity-worker-{i}"))
            .build()?;
        debug!("equity engine ready with {} workers", workers);
        Ok(EquityEngine {
            config,
            workers,
            cache,
            pool,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cache(&self) -> &Arc<EvalCache> {
        &self.cache
    }

    /// Runs one computation, calling `progress` after every partial reduction
    /// of a Monte Carlo run. Returns `Ok(None)` once `cancel` fires; nothing
    /// is published after that.
    pub fn compute<F>(
        &self,
        request: &EquityRequest,
        cancel: &CancelToken,
        mut progress: F,
    ) -> EngineResult<Option<EquityReport>>
    where
        F: FnMut(&EquityReport),
    {
        let setup = Setup::new(request)?;
        let best_five = if request.best_five && setup.board.len() == 5 {
            Some(best_hand(&request.hole, &request.board)?)
        } else {
            None
        };

        let remain = setup.remain_to_deal();
        let report = if remain <= self.config.exact_threshold {
            debug!("exact enumeration of {} unknown cards", remain);
            self.enumerate_exact(&setup, cancel)
        } else {
            debug!(
                "monte carlo over {} unknown cards, {} iterations",
                remain, request.iterations
            );
            self.simulate(setup, request, cancel, &mut progress)?
        };

        let stats = self.cache.stats();
        debug!(
            "eval cache: {} entries, {:.1}% hit rate",
            stats.entries,
            stats.hit_rate() * 100.0
        );

        Ok(report.map(|mut report| {
            report.best_five = best_five;
            report
        }))
    }

    fn enumerate_exact(&self, setup: &Setup, cancel: &CancelToken) -> Option<EquityReport> {
        let mut tally = Tally::default();

        for runout in setup.deck.cards.iter().copied().combinations(setup.unknown_board) {
            if cancel.is_cancelled() {
                debug!("exact enumeration cancelled");
                return None;
            }

            let board = setup.full_board(&runout);
            let hero = self.cache.rank7(&seven(setup.hole, &board));
            let runout_mask = runout.iter().fold(0u64, |m, c| m | c.mask());
            let remaining: Vec<Card> = setup
                .deck
                .cards
                .iter()
                .copied()
                .filter(|c| runout_mask & c.mask() == 0)
                .collect();

            for opponents in remaining.into_iter().combinations(setup.opponent_cards) {
                tally.record(hero, best_opponent(&self.cache, &opponents, &board));
            }
        }

        Some(EquityReport {
            result: tally.result(),
            histogram: tally.histogram(),
            iterations_per_second: 0.0,
            trials: tally.trials,
            method: Method::Exact,
            workers: Vec::new(),
            best_five: None,
        })
    }

    fn simulate<F>(
        &self,
        setup: Setup,
        request: &EquityRequest,
        cancel: &CancelToken,
        progress: &mut F,
    ) -> EngineResult<Option<EquityReport>>
    where
        F: FnMut(&EquityReport),
    {
        let per_worker = request.iterations / self.workers;
        if per_worker == 0 {
            return Err(EngineError::InsufficientIterations {
                requested: request.iterations,
                workers: self.workers,
            });
        }

        let setup = Arc::new(setup);
        let chunk = self.config.progress_chunk.max(1);
        let (tx, rx) = mpsc::channel::<(usize, Tally)>();

        for id in 0..self.workers {
            let tx = tx.clone();
            let setup = Arc::clone(&setup);
            let cache = Arc::clone(&self.cache);
            let cancel = cancel.clone();
            let mut rng = worker_rng(request.seed, id);
            self.pool.spawn(move || {
                run_worker(id, per_worker, chunk, &setup, &cache, &cancel, &mut rng, &tx);
            });
        }
        drop(tx);

        let start = Instant::now();
        let mut workers = vec![Tally::default(); self.workers];
        let mut total = Tally::default();
        let mut latest: Option<EquityReport> = None;

        for (id, delta) in rx {
            if cancel.is_cancelled() {
                debug!("monte carlo cancelled after {} trials", total.trials);
                return Ok(None);
            }

            workers[id].merge(&delta);
            total.merge(&delta);

            let elapsed = start.elapsed().as_secs_f64().max(0.001);
            let report = EquityReport {
                result: total.result(),
                histogram: total.histogram(),
                iterations_per_second: total.trials as f64 / elapsed,
                trials: total.trials,
                method: Method::MonteCarlo,
                workers: workers.clone(),
                best_five: None,
            };
            trace!("partial reduction: {} trials", report.trials);
            progress(&report);
            latest = Some(report);
        }

        if cancel.is_cancelled() {
            debug!("monte carlo cancelled after {} trials", total.trials);
            return Ok(None);
        }

        Ok(latest)
    }
}

/// Hero's best five cards on a complete board.
pub fn best_hand(hole: &[Card], board: &[Card]) -> EngineResult<BestHand> {
    if hole.len() != 2 {
        return Err(EngineError::WrongCardCount {
            need: 2,
            got: hole.len(),
        });
    }
    if board.len() != 5 {
        return Err(EngineError::InvalidBoardSize(board.len()));
    }
    let mut cards = hole.to_vec();
    cards.extend_from_slice(board);
    evaluate_with_best_five(&cards)
}

/// One-shot computation on a fresh default engine.
pub fn compute_equity(
    hole: &[Card],
    opponents: usize,
    board: &[Card],
    target_iterations: usize,
) -> EngineResult<EquityReport> {
    let engine = EquityEngine::new(EngineConfig::default())?;
    let request = EquityRequest::new(hole, board, opponents).iterations(target_iterations);
    engine
        .compute(&request, &CancelToken::new(), |_| {})?
        .ok_or(EngineError::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_seed_separates_workers() {
        let seeds: Vec<u64> = (0..8).map(|w| mix_seed(42, w)).collect();
        let unique: std::collections::HashSet<u64> = seeds.iter().copied().collect();
        assert_eq!(unique.len(), seeds.len());
        assert_eq!(mix_seed(42, 3), mix_seed(42, 3));
    }

    #[test]
    fn test_full_board_keeps_known_cards_first() {
        let request = EquityRequest::new(
            &crate::cards::parse_board("AsAh").unwrap(),
            &crate::cards::parse_board("2c3c4c").unwrap(),
            1,
        );
        let setup = Setup::new(&request).unwrap();
        let runout = crate::cards::parse_board("KdQd").unwrap();
        let board = setup.full_board(&runout);
        assert_eq!(
            board.to_vec(),
            crate::cards::parse_board("2c3c4cKdQd").unwrap()
        );
    }
}
