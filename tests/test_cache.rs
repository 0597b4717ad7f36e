use std::sync::Arc;

use holdem_equity::cache::*;
use holdem_equity::cards::*;
use holdem_equity::error::EngineError;
use holdem_equity::hand_evaluator::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

fn random_hands(seed: u64, count: usize) -> Vec<Vec<Card>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut deck = Deck::new();
            deck.shuffle(&mut rng);
            deck.cards[..7].to_vec()
        })
        .collect()
}

#[test]
fn test_encode_decode_round_trip() {
    for hand in random_hands(1, 3_000) {
        let rank = evaluate(&hand).unwrap();
        assert_eq!(decode(encode(&rank)), Some(rank));
    }
}

#[test]
fn test_encoding_layout() {
    let cards = parse_board("AsKsQsJsTs2h3d").unwrap();
    let rank = evaluate(&cards).unwrap();
    // straight flush = 8 in the low nibble, ace index 12 in the first kicker field
    assert_eq!(encode(&rank), 8 | (12 << 4));
}

#[test]
fn test_rank_matches_evaluator() {
    let cache = EvalCache::new();
    for hand in random_hands(2, 2_000) {
        assert_eq!(cache.rank(&hand).unwrap(), evaluate(&hand).unwrap());
    }
}

#[test]
fn test_hits_after_repeat_lookup() {
    let cache = EvalCache::new();
    let hand = parse_board("AsKhQd9s3c2h5d").unwrap();
    let first = cache.rank(&hand).unwrap();
    let mut reversed = hand.clone();
    reversed.reverse();
    let second = cache.rank(&reversed).unwrap();

    assert_eq!(first, second);
    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert!((stats.hit_rate() - 0.5).abs() < 1e-12);
}

#[test]
fn test_clear() {
    let cache = EvalCache::new();
    cache.rank(&parse_board("AsKhQd9s3c2h5d").unwrap()).unwrap();
    assert!(!cache.is_empty());
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), CacheStats::default());
}

#[test]
fn test_rank_rejects_bad_input() {
    let cache = EvalCache::new();
    assert!(matches!(
        cache.rank(&parse_board("AsKhQd9s3c").unwrap()),
        Err(EngineError::WrongCardCount { need: 7, got: 5 })
    ));
    assert!(matches!(
        cache.rank(&parse_board("AsKhQd9s3c2hAs").unwrap()),
        Err(EngineError::DuplicateCard(_))
    ));
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_access() {
    let cache = Arc::new(EvalCache::new());
    let hands = random_hands(3, 500);

    // Every thread walks the same hands so inserts race on the same keys.
    (0..8).into_par_iter().for_each(|_| {
        for hand in &hands {
            assert_eq!(cache.rank(hand).unwrap(), evaluate(hand).unwrap());
        }
    });

    let stats = cache.stats();
    assert!(stats.entries <= hands.len());
    assert_eq!(stats.hits + stats.misses, 8 * hands.len() as u64);
}

#[test]
fn test_global_cache_is_shared() {
    assert!(Arc::ptr_eq(&EvalCache::global(), &EvalCache::global()));
}
