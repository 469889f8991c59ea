use crate::model::card::Card;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        let mut hand = Self { cards };
        hand.sort();
        hand
    }

    pub fn extend(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
        self.sort();
    }

    pub fn remove(&mut self, card: Card) -> bool {
        if let Some(index) = self.cards.iter().position(|&c| c == card) {
            self.cards.remove(index);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn of_suit(&self, suit: Suit) -> impl Iterator<Item = Card> + '_ {
        self.cards.iter().copied().filter(move |card| card.suit == suit)
    }

    pub fn has_suit(&self, suit: Suit) -> bool {
        self.cards.iter().any(|card| card.suit == suit)
    }

    fn sort(&mut self) {
        self.cards.sort_by_key(|card| card.sort_key());
    }
}

#[cfg(test)]
mod tests {
    use super::Hand;
    use crate::model::card::Card;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    #[test]
    fn extend_and_remove_cards() {
        let mut hand = Hand::new();
        let card = Card::new(Rank::Nine, Suit::Clubs);
        hand.extend([card]);
        assert!(hand.contains(card));
        assert!(hand.remove(card));
        assert!(!hand.remove(card));
        assert!(hand.is_empty());
    }

    #[test]
    fn cards_are_sorted_by_suit_then_rank() {
        let hand = Hand::with_cards(vec![
            Card::new(Rank::King, Suit::Spades),
            Card::new(Rank::Ace, Suit::Clubs),
            Card::new(Rank::Seven, Suit::Clubs),
        ]);
        let ordered: Vec<_> = hand.iter().copied().collect();
        assert_eq!(ordered[0], Card::new(Rank::Seven, Suit::Clubs));
        assert_eq!(ordered[1], Card::new(Rank::Ace, Suit::Clubs));
        assert_eq!(ordered[2], Card::new(Rank::King, Suit::Spades));
    }

    #[test]
    fn suit_queries() {
        let hand = Hand::with_cards(vec![
            Card::new(Rank::Ten, Suit::Hearts),
            Card::new(Rank::Jack, Suit::Hearts),
            Card::new(Rank::Eight, Suit::Diamonds),
        ]);
        assert!(hand.has_suit(Suit::Hearts));
        assert!(!hand.has_suit(Suit::Spades));
        assert_eq!(hand.of_suit(Suit::Hearts).count(), 2);
    }
}
