//! Memoised seven card evaluation.
//!
//! Results are keyed by the sorted card indices of the seven cards and stored
//! bit-packed in a sharded map, so many workers can read and insert at once.
//! Two workers missing the same key both compute and insert the same value,
//! which is harmless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;

use crate::cards::{find_duplicate, Card};
use crate::error::{EngineError, EngineResult};
use crate::hand_evaluator::{best_of_seven, HandCategory, HandRank};

const SHARD_COUNT: usize = 64;
const CATEGORY_BITS: u32 = 4;
const KICKER_BITS: u32 = 5;

static GLOBAL: Lazy<Arc<EvalCache>> = Lazy::new(|| Arc::new(EvalCache::new()));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

pub struct EvalCache {
    shards: Vec<RwLock<AHashMap<u64, u32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for EvalCache {
    fn default() -> Self {
        EvalCache::new()
    }
}

impl EvalCache {
    pub fn new() -> EvalCache {
        EvalCache {
            shards: (0..SHARD_COUNT)
                .map(|_| RwLock::new(AHashMap::new()))
                .collect(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Process wide cache, kept for the lifetime of the program.
    pub fn global() -> Arc<EvalCache> {
        Arc::clone(&GLOBAL)
    }

    /// Validated lookup, same contract as [`crate::hand_evaluator::evaluate`].
    pub fn rank(&self, cards: &[Card]) -> EngineResult<HandRank> {
        let seven: [Card; 7] = cards.try_into().map_err(|_| EngineError::WrongCardCount {
            need: 7,
            got: cards.len(),
        })?;
        if let Some(dup) = find_duplicate(&seven) {
            return Err(EngineError::DuplicateCard(dup));
        }
        Ok(self.rank7(&seven))
    }

    /// Hot path lookup; the caller guarantees the cards are distinct.
    pub(crate) fn rank7(&self, cards: &[Card; 7]) -> HandRank {
        let key = canonical_key(cards);
        if let Some(rank) = self.lookup(key) {
            return rank;
        }
        let (rank, _) = best_of_seven(cards);
        self.store(key, &rank);
        rank
    }

    fn lookup(&self, key: u64) -> Option<HandRank> {
        let packed = self.shard(key).read().get(&key).copied();
        match packed.and_then(decode) {
            Some(rank) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(rank)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn store(&self, key: u64, rank: &HandRank) {
        self.shard(key).write().insert(key, encode(rank));
    }

    fn shard(&self, key: u64) -> &RwLock<AHashMap<u64, u32>> {
        let idx = (key.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 58) as usize;
        &self.shards[idx % SHARD_COUNT]
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.write().clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Card indices sorted ascending, six bits each, first card in the high bits.
pub fn canonical_key(cards: &[Card; 7]) -> u64 {
    let mut idx = cards.map(|c| c.index());
    idx.sort_unstable();
    idx.iter().fold(0u64, |key, &i| (key << 6) | i as u64)
}

/// Category in the low 4 bits, then 5 bits per kicker.
pub fn encode(rank: &HandRank) -> u32 {
    let mut packed = rank.category().index() as u32 & 0xF;
    let mut shift = CATEGORY_BITS;
    for &k in rank.kickers().iter().take(5) {
        packed |= (k as u32 & 0x1F) << shift;
        shift += KICKER_BITS;
    }
    packed
}

/// Inverse of [`encode`]; only the category's own kicker slots are read.
pub fn decode(packed: u32) -> Option<HandRank> {
    let category = HandCategory::from_index((packed & 0xF) as usize)?;
    let mut kickers = [0u8; 5];
    let count = category.kicker_count();
    for (i, k) in kickers.iter_mut().take(count).enumerate() {
        let shift = CATEGORY_BITS + KICKER_BITS * i as u32;
        *k = ((packed >> shift) & 0x1F) as u8;
    }
    Some(HandRank::new(category, &kickers[..count]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_board;

    fn seven(notation: &str) -> [Card; 7] {
        parse_board(notation).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_key_ignores_card_order() {
        let a = seven("AsKd5c2h9s7d3c");
        let b = seven("3c7d9s2h5cKdAs");
        assert_eq!(canonical_key(&a), canonical_key(&b));
    }

    #[test]
    fn test_key_distinguishes_suits() {
        let a = seven("AsKd5c2h9s7d3c");
        let b = seven("AhKd5c2h9s7d3c");
        assert_ne!(canonical_key(&a), canonical_key(&b));
    }

    #[test]
    fn test_decode_ignores_padding_bits() {
        let rank = HandRank::new(HandCategory::Straight, &[3]);
        let noisy = encode(&rank) | (0x1F << 9) | (0x1F << 14);
        assert_eq!(decode(noisy), Some(rank));
    }

    #[test]
    fn test_decode_rejects_unknown_category() {
        assert_eq!(decode(0xF), None);
    }
}
