use crate::model::mode::GameMode;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn point_value(self, mode: GameMode) -> u32 {
        if mode.uses_trump_table(self.suit) {
            self.rank.trump_points()
        } else {
            self.rank.plain_points()
        }
    }

    /// Ordering key within a suit; higher wins. Only meaningful between cards
    /// of the same suit.
    pub fn strength(self, mode: GameMode) -> u8 {
        if mode.uses_trump_table(self.suit) {
            self.rank.trump_strength()
        } else {
            self.rank.plain_strength()
        }
    }

    /// Display ordering: suit first, then rank.
    pub fn sort_key(self) -> (Suit, Rank) {
        (self.suit, self.rank)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[cfg(test)]
mod tests {
    use super::{Card, Rank, Suit};
    use crate::model::mode::GameMode;

    #[test]
    fn jack_of_trump_is_worth_twenty() {
        let card = Card::new(Rank::Jack, Suit::Hearts);
        assert_eq!(card.point_value(GameMode::ColourHearts), 20);
        assert_eq!(card.point_value(GameMode::ColourSpades), 2);
        assert_eq!(card.point_value(GameMode::AllTrumps), 20);
        assert_eq!(card.point_value(GameMode::NoTrumps), 2);
    }

    #[test]
    fn nine_ranks_second_only_under_trump_table() {
        let nine = Card::new(Rank::Nine, Suit::Spades);
        let ace = Card::new(Rank::Ace, Suit::Spades);
        assert!(nine.strength(GameMode::ColourSpades) > ace.strength(GameMode::ColourSpades));
        assert!(nine.strength(GameMode::AllTrumps) > ace.strength(GameMode::AllTrumps));
        assert!(nine.strength(GameMode::NoTrumps) < ace.strength(GameMode::NoTrumps));
        assert!(nine.strength(GameMode::ColourClubs) < ace.strength(GameMode::ColourClubs));
    }

    #[test]
    fn display_concatenates_rank_and_suit() {
        assert_eq!(Card::new(Rank::Ten, Suit::Diamonds).to_string(), "10D");
        assert_eq!(Card::new(Rank::Ace, Suit::Clubs).to_string(), "AC");
    }
}
