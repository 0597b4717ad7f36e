use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::cards::{find_duplicate, Card, Rank};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

pub const ALL_CATEGORIES: [HandCategory; 9] = [
    HandCategory::HighCard,
    HandCategory::OnePair,
    HandCategory::TwoPair,
    HandCategory::ThreeOfAKind,
    HandCategory::Straight,
    HandCategory::Flush,
    HandCategory::FullHouse,
    HandCategory::FourOfAKind,
    HandCategory::StraightFlush,
];

impl HandCategory {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<HandCategory> {
        ALL_CATEGORIES.get(index).copied()
    }

    /// Number of kickers every rank of this category carries.
    pub fn kicker_count(self) -> usize {
        match self {
            HandCategory::HighCard | HandCategory::Flush => 5,
            HandCategory::OnePair => 4,
            HandCategory::TwoPair | HandCategory::ThreeOfAKind => 3,
            HandCategory::FullHouse | HandCategory::FourOfAKind => 2,
            HandCategory::Straight | HandCategory::StraightFlush => 1,
        }
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandCategory::HighCard => write!(f, "High Card"),
            HandCategory::OnePair => write!(f, "One Pair"),
            HandCategory::TwoPair => write!(f, "Two Pair"),
            HandCategory::ThreeOfAKind => write!(f, "Three of a Kind"),
            HandCategory::Straight => write!(f, "Straight"),
            HandCategory::Flush => write!(f, "Flush"),
            HandCategory::FullHouse => write!(f, "Full House"),
            HandCategory::FourOfAKind => write!(f, "Four of a Kind"),
            HandCategory::StraightFlush => write!(f, "Straight Flush"),
        }
    }
}

/// Strength of a five card hand: a category plus kickers as rank indices
/// (deuce = 0, ace = 12), most significant first.
///
/// Unused kicker slots are always zero so the derived equality and hash agree
/// with [`Ord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandRank {
    category: HandCategory,
    kickers: [u8; 5],
    len: u8,
}

impl HandRank {
    pub(crate) fn new(category: HandCategory, kickers: &[u8]) -> HandRank {
        debug_assert!(kickers.len() <= 5);
        let mut buf = [0u8; 5];
        buf[..kickers.len()].copy_from_slice(kickers);
        HandRank {
            category,
            kickers: buf,
            len: kickers.len() as u8,
        }
    }

    pub fn category(&self) -> HandCategory {
        self.category
    }

    pub fn kickers(&self) -> &[u8] {
        &self.kickers[..self.len as usize]
    }
}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    // Slice ordering compares element-wise and ranks a strict prefix lower.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.category.cmp(&other.category) {
            Ordering::Equal => self.kickers().cmp(other.kickers()),
            ord => ord,
        }
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranks: Vec<String> = self
            .kickers()
            .iter()
            .filter_map(|&k| Rank::from_index(k))
            .map(|r| r.to_char().to_string())
            .collect();
        write!(f, "{} ({})", self.category, ranks.join(" "))
    }
}

impl Serialize for HandRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("HandRank", 2)?;
        s.serialize_field("category", &self.category)?;
        s.serialize_field("kickers", self.kickers())?;
        s.end()
    }
}

/// A ranked hand together with the five cards that make it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BestHand {
    pub rank: HandRank,
    pub cards: [Card; 5],
}

impl fmt::Display for BestHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank)
    }
}

const WHEEL_MASK: u16 = (1 << 12) | 0b1111;

/// Highest rank index of a five long run in `mask`, 3 for the wheel.
fn straight_high(mask: u16) -> Option<u8> {
    for high in (4..=12u8).rev() {
        if (mask >> (high - 4)) & 0b1_1111 == 0b1_1111 {
            return Some(high);
        }
    }
    if mask & WHEEL_MASK == WHEEL_MASK {
        return Some(3);
    }
    None
}

/// Fixed capacity list of rank indices.
#[derive(Default)]
struct RankList {
    buf: [u8; 5],
    len: usize,
}

impl RankList {
    fn push(&mut self, rank: u8) {
        if self.len < self.buf.len() {
            self.buf[self.len] = rank;
            self.len += 1;
        }
    }

    fn get(&self, i: usize) -> u8 {
        self.buf[i]
    }
}

/// Ranks exactly five cards.
pub fn evaluate_five(cards: &[Card; 5]) -> HandRank {
    let mut rank_freq = [0u8; 13];
    let mut suit_freq = [0u8; 4];
    let mut rank_mask = 0u16;
    for card in cards {
        rank_freq[card.rank_index() as usize] += 1;
        suit_freq[card.suit_index() as usize] += 1;
        rank_mask |= 1 << card.rank_index();
    }

    let flush_suit = suit_freq.iter().position(|&n| n >= 5);
    let straight = straight_high(rank_mask);

    if let Some(suit) = flush_suit {
        let flush_mask = cards
            .iter()
            .filter(|c| c.suit_index() as usize == suit)
            .fold(0u16, |m, c| m | (1 << c.rank_index()));
        if let Some(high) = straight_high(flush_mask) {
            return HandRank::new(HandCategory::StraightFlush, &[high]);
        }
        let mut flush_ranks = RankList::default();
        for i in (0..13u8).rev() {
            if flush_mask & (1 << i) != 0 {
                flush_ranks.push(i);
            }
        }
        return HandRank::new(HandCategory::Flush, &flush_ranks.buf[..flush_ranks.len]);
    }

    let mut quads: Option<u8> = None;
    let mut trips: Option<u8> = None;
    let mut pairs = RankList::default();
    let mut singles = RankList::default();
    for i in (0..13u8).rev() {
        match rank_freq[i as usize] {
            4 => quads = Some(i),
            3 => trips = trips.or(Some(i)),
            2 => pairs.push(i),
            1 => singles.push(i),
            _ => {}
        }
    }

    if let Some(q) = quads {
        return HandRank::new(HandCategory::FourOfAKind, &[q, singles.get(0)]);
    }

    if let (Some(t), true) = (trips, pairs.len > 0) {
        return HandRank::new(HandCategory::FullHouse, &[t, pairs.get(0)]);
    }

    if let Some(high) = straight {
        return HandRank::new(HandCategory::Straight, &[high]);
    }

    if let Some(t) = trips {
        return HandRank::new(HandCategory::ThreeOfAKind, &[t, singles.get(0), singles.get(1)]);
    }

    if pairs.len >= 2 {
        return HandRank::new(
            HandCategory::TwoPair,
            &[pairs.get(0), pairs.get(1), singles.get(0)],
        );
    }

    if pairs.len == 1 {
        return HandRank::new(
            HandCategory::OnePair,
            &[pairs.get(0), singles.get(0), singles.get(1), singles.get(2)],
        );
    }

    HandRank::new(HandCategory::HighCard, &singles.buf[..singles.len])
}

/// All five card subsets of seven positions, in lexicographic order.
const FIVE_OF_SEVEN: [[usize; 5]; 21] = [
    [0, 1, 2, 3, 4],
    [0, 1, 2, 3, 5],
    [0, 1, 2, 3, 6],
    [0, 1, 2, 4, 5],
    [0, 1, 2, 4, 6],
    [0, 1, 2, 5, 6],
    [0, 1, 3, 4, 5],
    [0, 1, 3, 4, 6],
    [0, 1, 3, 5, 6],
    [0, 1, 4, 5, 6],
    [0, 2, 3, 4, 5],
    [0, 2, 3, 4, 6],
    [0, 2, 3, 5, 6],
    [0, 2, 4, 5, 6],
    [0, 3, 4, 5, 6],
    [1, 2, 3, 4, 5],
    [1, 2, 3, 4, 6],
    [1, 2, 3, 5, 6],
    [1, 2, 4, 5, 6],
    [1, 3, 4, 5, 6],
    [2, 3, 4, 5, 6],
];

/// Best five of seven without validation. Returns the rank and the subset
/// that produced it; the first subset wins ties.
pub(crate) fn best_of_seven(cards: &[Card; 7]) -> (HandRank, [Card; 5]) {
    let pick = |idx: &[usize; 5]| {
        [
            cards[idx[0]],
            cards[idx[1]],
            cards[idx[2]],
            cards[idx[3]],
            cards[idx[4]],
        ]
    };

    let mut best_five = pick(&FIVE_OF_SEVEN[0]);
    let mut best_rank = evaluate_five(&best_five);
    for idx in &FIVE_OF_SEVEN[1..] {
        let five = pick(idx);
        let rank = evaluate_five(&five);
        if rank > best_rank {
            best_rank = rank;
            best_five = five;
        }
    }
    (best_rank, best_five)
}

fn check_seven(cards: &[Card]) -> EngineResult<[Card; 7]> {
    let seven: [Card; 7] = cards
        .try_into()
        .map_err(|_| EngineError::WrongCardCount {
            need: 7,
            got: cards.len(),
        })?;
    if let Some(dup) = find_duplicate(&seven) {
        return Err(EngineError::DuplicateCard(dup));
    }
    Ok(seven)
}

/// Best five card rank of exactly seven distinct cards.
pub fn evaluate(cards: &[Card]) -> EngineResult<HandRank> {
    let seven = check_seven(cards)?;
    Ok(best_of_seven(&seven).0)
}

/// Like [`evaluate`], also returning which five cards make the hand.
pub fn evaluate_with_best_five(cards: &[Card]) -> EngineResult<BestHand> {
    let seven = check_seven(cards)?;
    let (rank, cards) = best_of_seven(&seven);
    Ok(BestHand { rank, cards })
}

/// Best five card hand out of five to seven distinct cards.
pub fn evaluate_best(cards: &[Card]) -> EngineResult<BestHand> {
    if cards.len() < 5 || cards.len() > 7 {
        return Err(EngineError::WrongCardCount {
            need: if cards.len() < 5 { 5 } else { 7 },
            got: cards.len(),
        });
    }
    if let Some(dup) = find_duplicate(cards) {
        return Err(EngineError::DuplicateCard(dup));
    }

    let mut best: Option<BestHand> = None;
    for combo in cards.iter().combinations(5) {
        let five: [Card; 5] = [*combo[0], *combo[1], *combo[2], *combo[3], *combo[4]];
        let rank = evaluate_five(&five);
        if best.as_ref().map_or(true, |b| rank > b.rank) {
            best = Some(BestHand { rank, cards: five });
        }
    }

    best.ok_or(EngineError::WrongCardCount {
        need: 5,
        got: cards.len(),
    })
}

pub fn evaluate_hand(hole_cards: &[Card], board: &[Card]) -> EngineResult<BestHand> {
    let mut all_cards: Vec<Card> = Vec::with_capacity(hole_cards.len() + board.len());
    all_cards.extend_from_slice(hole_cards);
    all_cards.extend_from_slice(board);
    evaluate_best(&all_cards)
}

/// Compares two hole card hands sharing the same board.
pub fn compare_hands(hand1: &[Card], hand2: &[Card], board: &[Card]) -> EngineResult<Ordering> {
    let r1 = evaluate_hand(hand1, board)?;
    let r2 = evaluate_hand(hand2, board)?;
    Ok(r1.rank.cmp(&r2.rank))
}
