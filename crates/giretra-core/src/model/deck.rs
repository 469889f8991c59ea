use crate::error::ErrorKind;
use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

pub const DECK_SIZE: usize = 32;
pub const MIN_CUT: usize = 6;
pub const MAX_CUT: usize = 26;

/// An ordered pile of cards, index 0 being the top. Every operation returns a
/// new deck and leaves `self` as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("cut position {0} outside {MIN_CUT}..={MAX_CUT}")]
    CutOutOfRange(usize),
    #[error("only a full {DECK_SIZE}-card deck can be cut, this one holds {0}")]
    NotFull(usize),
    #[error("cannot deal {requested} cards from {remaining}")]
    NotEnoughCards { requested: usize, remaining: usize },
    #[error("deck does not hold {DECK_SIZE} distinct cards")]
    Corrupt,
}

impl DeckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeckError::Corrupt => ErrorKind::InvariantViolation,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

impl Deck {
    /// Clubs, Diamonds, Hearts, Spades; 7 up to Ace within each suit.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL.iter().copied() {
            for rank in Rank::ORDERED.iter().copied() {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// Fisher-Yates over the standard order, driven by `rng`.
    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = Self::standard().cards;
        cards.shuffle(rng);
        Self { cards }
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    /// Non-reproducible shuffle from the thread-local generator.
    pub fn shuffled_unseeded() -> Self {
        Self::shuffled(&mut rand::thread_rng())
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    /// Takes `position` cards from the top (or bottom when `from_top` is
    /// false) and moves the rest above them.
    pub fn cut(&self, position: usize, from_top: bool) -> Result<Deck, DeckError> {
        if !(MIN_CUT..=MAX_CUT).contains(&position) {
            return Err(DeckError::CutOutOfRange(position));
        }
        if self.cards.len() != DECK_SIZE {
            return Err(DeckError::NotFull(self.cards.len()));
        }

        let split = if from_top {
            position
        } else {
            DECK_SIZE - position
        };
        let (top, bottom) = self.cards.split_at(split);
        let mut cards = Vec::with_capacity(DECK_SIZE);
        cards.extend_from_slice(bottom);
        cards.extend_from_slice(top);
        Ok(Deck { cards })
    }

    pub fn deal(&self, count: usize) -> Result<(Vec<Card>, Deck), DeckError> {
        if count > self.cards.len() {
            return Err(DeckError::NotEnoughCards {
                requested: count,
                remaining: self.cards.len(),
            });
        }
        let (dealt, rest) = self.cards.split_at(count);
        Ok((dealt.to_vec(), Deck::from_cards(rest.to_vec())))
    }

    /// Checks the full-deck invariant: 32 cards, no repeats.
    pub fn verify_full(&self) -> Result<(), DeckError> {
        if self.cards.len() != DECK_SIZE {
            return Err(DeckError::Corrupt);
        }
        let mut seen = [false; DECK_SIZE];
        for card in &self.cards {
            let slot = card.suit.index() * 8 + (card.rank.value() as usize - 7);
            if std::mem::replace(&mut seen[slot], true) {
                return Err(DeckError::Corrupt);
            }
        }
        Ok(())
    }
}
