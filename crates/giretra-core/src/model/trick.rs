use crate::error::ErrorKind;
use crate::model::card::Card;
use crate::model::mode::GameMode;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use core::cmp::Ordering;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Orders two cards inside a trick led with `lead`.
///
/// Trumps beat everything else; among non-trumps a card of the lead suit beats
/// one that is not. Cards of the same suit compare by strength, and two
/// off-suit discards are `Equal` since neither can win.
pub fn compare(a: Card, b: Card, lead: Suit, mode: GameMode) -> Ordering {
    let a_trump = mode.is_trump(a.suit);
    let b_trump = mode.is_trump(b.suit);
    if a_trump != b_trump {
        return if a_trump {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }

    if !a_trump {
        let a_follows = a.suit == lead;
        let b_follows = b.suit == lead;
        if a_follows != b_follows {
            return if a_follows {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
    }

    if a.suit == b.suit {
        a.strength(mode).cmp(&b.strength(mode))
    } else {
        Ordering::Equal
    }
}

pub fn beats(challenger: Card, current: Card, lead: Suit, mode: GameMode) -> bool {
    compare(challenger, current, lead, mode) == Ordering::Greater
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub position: PlayerPosition,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} has already played this trick")]
    AlreadyPlayed(PlayerPosition),
    #[error("{0} already lies on the table")]
    DuplicateCard(Card),
}

impl TrickError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrickError::TrickComplete | TrickError::DuplicateCard(_) => {
                ErrorKind::InvariantViolation
            }
            _ => ErrorKind::IllegalAction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trick {
    leader: PlayerPosition,
    plays: Vec<Play>,
}

impl Trick {
    pub fn new(leader: PlayerPosition) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(4),
        }
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    pub fn expected_position(&self) -> PlayerPosition {
        self.plays
            .last()
            .map(|play| play.position.next())
            .unwrap_or(self.leader)
    }

    pub fn play(&mut self, position: PlayerPosition, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }
        if self.plays.iter().any(|play| play.position == position) {
            return Err(TrickError::AlreadyPlayed(position));
        }
        let expected = self.expected_position();
        if expected != position {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }
        if self.plays.iter().any(|play| play.card == card) {
            return Err(TrickError::DuplicateCard(card));
        }

        self.plays.push(Play { position, card });
        Ok(())
    }

    /// The play currently holding the trick, folding `beats` from the lead.
    pub fn winning_play(&self, mode: GameMode) -> Option<Play> {
        let (first, rest) = self.plays.split_first()?;
        let lead = first.card.suit;
        let best = rest.iter().fold(*first, |best, play| {
            if beats(play.card, best.card, lead, mode) {
                *play
            } else {
                best
            }
        });
        Some(best)
    }

    /// Winner of a sealed trick; `None` while cards are still to come.
    pub fn winner(&self, mode: GameMode) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        self.winning_play(mode).map(|play| play.position)
    }

    pub fn has_trump(&self, mode: GameMode) -> bool {
        self.plays.iter().any(|play| mode.is_trump(play.card.suit))
    }

    pub fn highest_trump(&self, mode: GameMode) -> Option<Card> {
        self.plays
            .iter()
            .map(|play| play.card)
            .filter(|card| mode.is_trump(card.suit))
            .max_by_key(|card| card.strength(mode))
    }

    pub fn points(&self, mode: GameMode) -> u32 {
        self.plays
            .iter()
            .map(|play| play.card.point_value(mode))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{Trick, TrickError, beats, compare};
    use crate::error::ErrorKind;
    use crate::model::card::Card;
    use crate::model::mode::GameMode;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use core::cmp::Ordering;

    fn full_trick(leader: PlayerPosition, cards: [Card; 4]) -> Trick {
        let mut trick = Trick::new(leader);
        let mut seat = leader;
        for card in cards {
            trick.play(seat, card).unwrap();
            seat = seat.next();
        }
        trick
    }

    #[test]
    fn plays_follow_turn_order() {
        let mut trick = Trick::new(PlayerPosition::North);
        assert!(
            trick
                .play(PlayerPosition::North, Card::new(Rank::Seven, Suit::Clubs))
                .is_ok()
        );
        let err = trick
            .play(PlayerPosition::South, Card::new(Rank::Eight, Suit::Clubs))
            .unwrap_err();
        assert!(matches!(err, TrickError::OutOfTurn { .. }));
        assert_eq!(err.kind(), ErrorKind::IllegalAction);
        assert_eq!(trick.plays().len(), 1);
    }

    #[test]
    fn trump_beats_lead_suit() {
        let lead = Suit::Hearts;
        let small_trump = Card::new(Rank::Seven, Suit::Spades);
        let ace_lead = Card::new(Rank::Ace, Suit::Hearts);
        assert!(beats(small_trump, ace_lead, lead, GameMode::ColourSpades));
        assert!(!beats(small_trump, ace_lead, lead, GameMode::NoTrumps));
    }

    #[test]
    fn off_suit_discards_compare_equal() {
        let a = Card::new(Rank::Ace, Suit::Clubs);
        let b = Card::new(Rank::Seven, Suit::Diamonds);
        assert_eq!(compare(a, b, Suit::Hearts, GameMode::NoTrumps), Ordering::Equal);
        assert!(!beats(a, b, Suit::Hearts, GameMode::NoTrumps));
    }

    #[test]
    fn winner_is_highest_of_lead_suit_without_trump() {
        let trick = full_trick(
            PlayerPosition::North,
            [
                Card::new(Rank::Ten, Suit::Clubs),
                Card::new(Rank::Ace, Suit::Clubs),
                Card::new(Rank::Jack, Suit::Clubs),
                Card::new(Rank::Ace, Suit::Spades),
            ],
        );
        assert_eq!(trick.winner(GameMode::NoTrumps), Some(PlayerPosition::East));
        assert_eq!(trick.points(GameMode::NoTrumps), 10 + 11 + 2 + 11);
    }

    #[test]
    fn jack_wins_under_all_trumps() {
        let trick = full_trick(
            PlayerPosition::East,
            [
                Card::new(Rank::Ace, Suit::Diamonds),
                Card::new(Rank::Nine, Suit::Diamonds),
                Card::new(Rank::Jack, Suit::Diamonds),
                Card::new(Rank::Jack, Suit::Clubs),
            ],
        );
        assert_eq!(trick.winner(GameMode::AllTrumps), Some(PlayerPosition::West));
        assert_eq!(trick.points(GameMode::AllTrumps), 11 + 14 + 20 + 20);
        assert!(!trick.has_trump(GameMode::AllTrumps));
    }

    #[test]
    fn overtrump_takes_the_trick() {
        let trick = full_trick(
            PlayerPosition::South,
            [
                Card::new(Rank::Ace, Suit::Hearts),
                Card::new(Rank::Seven, Suit::Diamonds),
                Card::new(Rank::Nine, Suit::Diamonds),
                Card::new(Rank::King, Suit::Hearts),
            ],
        );
        let mode = GameMode::ColourDiamonds;
        assert_eq!(trick.winner(mode), Some(PlayerPosition::North));
        assert_eq!(
            trick.highest_trump(mode),
            Some(Card::new(Rank::Nine, Suit::Diamonds))
        );
    }

    #[test]
    fn incomplete_trick_has_no_winner() {
        let mut trick = Trick::new(PlayerPosition::West);
        trick
            .play(PlayerPosition::West, Card::new(Rank::King, Suit::Clubs))
            .unwrap();
        assert_eq!(trick.winner(GameMode::NoTrumps), None);
        assert_eq!(
            trick.winning_play(GameMode::NoTrumps).map(|p| p.position),
            Some(PlayerPosition::West)
        );
    }

    #[test]
    fn sealed_trick_rejects_fifth_card() {
        let mut trick = full_trick(
            PlayerPosition::North,
            [
                Card::new(Rank::Seven, Suit::Clubs),
                Card::new(Rank::Eight, Suit::Clubs),
                Card::new(Rank::Nine, Suit::Clubs),
                Card::new(Rank::Ten, Suit::Clubs),
            ],
        );
        let err = trick
            .play(PlayerPosition::North, Card::new(Rank::Jack, Suit::Clubs))
            .unwrap_err();
        assert_eq!(err, TrickError::TrickComplete);
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert_eq!(trick.plays().len(), 4);
    }
}
