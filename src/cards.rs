use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Serialize, Serializer};

use crate::error::{EngineError, EngineResult};

/// Number of distinct cards in a standard deck.
pub const DECK_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub fn from_char(c: char) -> EngineResult<Rank> {
        match c.to_ascii_uppercase() {
            '2' => Ok(Rank::Two),
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            'A' => Ok(Rank::Ace),
            _ => Err(EngineError::InvalidRank(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Zero based index, deuce = 0 and ace = 12.
    pub fn index(self) -> u8 {
        self as u8 - 2
    }

    /// Inverse of [`Rank::index`].
    pub fn from_index(index: u8) -> Option<Rank> {
        ALL_RANKS.get(index as usize).copied()
    }
}

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub fn from_char(c: char) -> EngineResult<Suit> {
        match c.to_ascii_lowercase() {
            's' => Ok(Suit::Spades),
            'h' => Ok(Suit::Hearts),
            'd' => Ok(Suit::Diamonds),
            'c' => Ok(Suit::Clubs),
            _ => Err(EngineError::InvalidSuit(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "\u{2660}",
            Suit::Hearts => "\u{2665}",
            Suit::Diamonds => "\u{2666}",
            Suit::Clubs => "\u{2663}",
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

pub const ALL_SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

/// A playing card, compared and hashed by rank and suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    pub fn rank_index(&self) -> u8 {
        self.rank.index()
    }

    pub fn suit_index(&self) -> u8 {
        self.suit.index()
    }

    /// Combined index `rank_index * 4 + suit_index`, in `0..52`.
    pub fn index(&self) -> u8 {
        self.rank_index() * 4 + self.suit_index()
    }

    pub fn from_index(index: u8) -> Option<Card> {
        let rank = Rank::from_index(index / 4)?;
        let suit = *ALL_SUITS.get((index % 4) as usize)?;
        Some(Card::new(rank, suit))
    }

    /// Single bit set at [`Card::index`].
    pub fn mask(&self) -> u64 {
        1u64 << self.index()
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.to_char(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index().cmp(&other.index())
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The 52 card universe minus the cards already in use.
#[derive(Debug, Clone)]
pub struct Deck {
    pub cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}

impl Deck {
    /// A full deck, suit major and rank minor.
    pub fn new() -> Deck {
        let cards = ALL_SUITS
            .iter()
            .flat_map(|&s| ALL_RANKS.iter().map(move |&r| Card::new(r, s)))
            .collect();
        Deck { cards }
    }

    /// A full deck with `used` taken out.
    pub fn without(used: &[Card]) -> Deck {
        let mut deck = Deck::new();
        deck.remove(used);
        deck
    }

    /// Drops every card in `used`; cards not in the deck are ignored.
    pub fn remove(&mut self, used: &[Card]) -> &mut Self {
        let used_mask = used.iter().fold(0u64, |m, c| m | c.mask());
        self.cards.retain(|c| used_mask & c.mask() == 0);
        self
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.cards.shuffle(rng);
        self
    }

    pub fn deal(&mut self, n: usize) -> EngineResult<Vec<Card>> {
        if n > self.cards.len() {
            return Err(EngineError::NotEnoughDeck {
                requested: n,
                available: self.cards.len(),
            });
        }
        let dealt: Vec<Card> = self.cards.drain(..n).collect();
        Ok(dealt)
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

pub fn parse_card(notation: &str) -> EngineResult<Card> {
    let notation = notation.trim();
    let chars: Vec<char> = notation.chars().collect();
    if chars.len() != 2 {
        return Err(EngineError::InvalidCardNotation(notation.to_string()));
    }
    let rank = Rank::from_char(chars[0])?;
    let suit = Suit::from_char(chars[1])?;
    Ok(Card::new(rank, suit))
}

/// Parses a run of two character cards, e.g. `AhKd5c` or `Ah Kd 5c`.
pub fn parse_board(notation: &str) -> EngineResult<Vec<Card>> {
    let notation = notation.trim().replace([' ', ','], "");
    let chars: Vec<char> = notation.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(EngineError::InvalidBoardNotation(notation));
    }
    chars
        .chunks(2)
        .map(|pair| parse_card(&pair.iter().collect::<String>()))
        .collect()
}

/// Returns the first card that appears twice in `cards`.
pub fn find_duplicate(cards: &[Card]) -> Option<Card> {
    let mut seen = 0u64;
    for card in cards {
        if seen & card.mask() != 0 {
            return Some(*card);
        }
        seen |= card.mask();
    }
    None
}

pub fn cards_display(cards: &[Card]) -> String {
    cards.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
}
