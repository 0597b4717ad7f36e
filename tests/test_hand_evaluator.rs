use std::cmp::Ordering;

use holdem_equity::cards::*;
use holdem_equity::error::EngineError;
use holdem_equity::hand_evaluator::*;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn c(notation: &str) -> Card {
    parse_card(notation).unwrap()
}

fn five(notation: &str) -> HandRank {
    let cards: [Card; 5] = parse_board(notation).unwrap().try_into().unwrap();
    evaluate_five(&cards)
}

fn seven(notation: &str) -> HandRank {
    evaluate(&parse_board(notation).unwrap()).unwrap()
}

#[test]
fn test_straight_flush() {
    let r = seven("9h8h7h6h5hAcKd");
    assert_eq!(r.category(), HandCategory::StraightFlush);
    assert_eq!(r.kickers(), &[7]);
}

#[test]
fn test_royal_is_top_straight_flush() {
    let r = seven("AsKsQsJsTs2h3d");
    assert_eq!(r.category(), HandCategory::StraightFlush);
    assert_eq!(r.kickers(), &[12]);
}

#[test]
fn test_steel_wheel() {
    let r = seven("As2s3s4s5sKdQh");
    assert_eq!(r.category(), HandCategory::StraightFlush);
    assert_eq!(r.kickers(), &[3]);
}

#[test]
fn test_four_of_a_kind() {
    let r = seven("KsKhKdKc5s2h3d");
    assert_eq!(r.category(), HandCategory::FourOfAKind);
    assert_eq!(r.kickers(), &[11, 3]);
}

#[test]
fn test_full_house() {
    let r = seven("AsAhAdKsKh2c3d");
    assert_eq!(r.category(), HandCategory::FullHouse);
    assert_eq!(r.kickers(), &[12, 11]);
}

#[test]
fn test_full_house_from_two_trips() {
    let r = seven("AsAhAdKsKhKc3d");
    assert_eq!(r.category(), HandCategory::FullHouse);
    assert_eq!(r.kickers(), &[12, 11]);
}

#[test]
fn test_flush() {
    let r = seven("AsTs8s5s2sKdQh");
    assert_eq!(r.category(), HandCategory::Flush);
    assert_eq!(r.kickers(), &[12, 8, 6, 3, 0]);
}

#[test]
fn test_straight() {
    let r = seven("9s8h7d6c5sAhKd");
    assert_eq!(r.category(), HandCategory::Straight);
    assert_eq!(r.kickers(), &[7]);
}

#[test]
fn test_wheel_is_five_high_straight() {
    let r = five("As2h3d4c5s");
    assert_eq!(r.category(), HandCategory::Straight);
    assert_eq!(r.kickers(), &[3]);
}

#[test]
fn test_six_high_beats_wheel() {
    assert!(five("2h3d4c5s6s") > five("As2h3d4c5s"));
}

#[test]
fn test_three_of_a_kind() {
    let r = seven("QsQhQd7s3h2cKd");
    assert_eq!(r.category(), HandCategory::ThreeOfAKind);
    assert_eq!(r.kickers(), &[10, 11, 5]);
}

#[test]
fn test_two_pair_uses_best_kicker() {
    let r = seven("AsKhAdKs5c2h3d");
    assert_eq!(r.category(), HandCategory::TwoPair);
    assert_eq!(r.kickers(), &[12, 11, 3]);
}

#[test]
fn test_three_pairs_keep_top_two() {
    let r = seven("AsAdKsKdQsQd2c");
    assert_eq!(r.category(), HandCategory::TwoPair);
    assert_eq!(r.kickers(), &[12, 11, 10]);
}

#[test]
fn test_one_pair() {
    let r = seven("AsAhKd7s3c2h5d");
    assert_eq!(r.category(), HandCategory::OnePair);
    assert_eq!(r.kickers(), &[12, 11, 5, 3]);
}

#[test]
fn test_high_card() {
    let r = seven("AsKhQd9s3c2h5d");
    assert_eq!(r.category(), HandCategory::HighCard);
    assert_eq!(r.kickers(), &[12, 11, 10, 7, 3]);
}

#[test]
fn test_category_order() {
    let ladder = [
        five("AsKhQd9s3c"),
        five("AsAhKd7s3c"),
        five("AsAhKdKs3c"),
        five("AsAhAdKs3c"),
        five("9s8h7d6c5s"),
        five("AsTs8s5s2s"),
        five("2s2h2d3s3h"),
        five("2s2h2d2c3h"),
        five("6s5s4s3s2s"),
    ];
    for (i, rank) in ladder.iter().enumerate() {
        assert_eq!(rank.category().index(), i);
    }
    for pair in ladder.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    // Category alone decides across categories.
    assert!(five("2s2h2d3s3h") > five("AsKsQsJs9s"));
}

#[test]
fn test_kicker_decides() {
    assert!(five("AsAhKd7s3c") > five("AdAcQd7h3h"));
    assert_eq!(five("AsAhKd7s3c").cmp(&five("AdAcKh7h3h")), Ordering::Equal);
}

#[test]
fn test_kicker_count_is_fixed_per_category() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..5_000 {
        let mut deck = Deck::new();
        deck.shuffle(&mut rng);
        let hand: [Card; 5] = deck.cards[..5].try_into().unwrap();
        let r = evaluate_five(&hand);
        assert_eq!(r.kickers().len(), r.category().kicker_count());
    }
}

#[test]
fn test_seven_cards_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..2_000 {
        let mut deck = Deck::new();
        deck.shuffle(&mut rng);
        let cards = &deck.cards[..7];
        let oracle = cards
            .iter()
            .combinations(5)
            .map(|combo| evaluate_five(&[*combo[0], *combo[1], *combo[2], *combo[3], *combo[4]]))
            .max()
            .unwrap();
        assert_eq!(evaluate(cards).unwrap(), oracle);
    }
}

#[test]
fn test_best_five_is_subset_with_same_rank() {
    let cards = parse_board("9h8h7h6h5hAcKd").unwrap();
    let best = evaluate_with_best_five(&cards).unwrap();
    assert_eq!(best.rank, evaluate(&cards).unwrap());
    assert_eq!(evaluate_five(&best.cards), best.rank);
    for card in &best.cards {
        assert!(cards.contains(card));
        assert_eq!(card.suit, Suit::Hearts);
    }
}

#[test]
fn test_best_five_takes_first_of_equal_subsets() {
    // Broadway with either ace; the subset holding the first ace is kept.
    let cards = parse_board("AhKcQdJsThAc3d").unwrap();
    let best = evaluate_with_best_five(&cards).unwrap();
    assert_eq!(best.cards.to_vec(), cards[..5].to_vec());
}

#[test]
fn test_evaluate_rejects_wrong_count() {
    let cards = parse_board("AsKhQd9s3c2h").unwrap();
    assert!(matches!(
        evaluate(&cards),
        Err(EngineError::WrongCardCount { need: 7, got: 6 })
    ));
}

#[test]
fn test_evaluate_rejects_duplicates() {
    let cards = parse_board("AsKhQd9s3c2hAs").unwrap();
    assert!(matches!(evaluate(&cards), Err(EngineError::DuplicateCard(_))));
}

#[test]
fn test_evaluate_best_handles_five_and_six() {
    let r5 = evaluate_best(&parse_board("AsAhKd7s3c").unwrap()).unwrap();
    assert_eq!(r5.rank.category(), HandCategory::OnePair);
    let r6 = evaluate_best(&parse_board("AsAhKd7s3cAd").unwrap()).unwrap();
    assert_eq!(r6.rank.category(), HandCategory::ThreeOfAKind);
    assert!(evaluate_best(&parse_board("AsAhKd7s").unwrap()).is_err());
}

#[test]
fn test_evaluate_hand_joins_hole_and_board() {
    let best = evaluate_hand(&[c("As"), c("2h")], &parse_board("3d4c5sKhQd").unwrap()).unwrap();
    assert_eq!(best.rank.category(), HandCategory::Straight);
    assert_eq!(best.rank.kickers(), &[3]);
}

#[test]
fn test_compare_hands() {
    let board = parse_board("7s6s5s4dAh").unwrap();
    assert_eq!(
        compare_hands(&[c("As"), c("2s")], &[c("8h"), c("9h")], &board).unwrap(),
        Ordering::Greater
    );
    let board = parse_board("AsKdQhJsTs").unwrap();
    assert_eq!(
        compare_hands(&[c("2h"), c("3d")], &[c("4h"), c("5d")], &board).unwrap(),
        Ordering::Equal
    );
}

#[test]
fn test_display() {
    assert_eq!(five("AsAhKd7s3c").to_string(), "One Pair (A K 7 3)");
    assert_eq!(HandCategory::FullHouse.to_string(), "Full House");
}
