use crate::error::ErrorKind;
use crate::model::card::Card;
use crate::model::deck::{Deck, DeckError};
use crate::model::hand::Hand;
use crate::model::mode::GameMode;
use crate::model::negotiation::{
    Contract, NegotiationAction, NegotiationError, NegotiationOutcome, NegotiationRules,
    NegotiationState,
};
use crate::model::play::legal_cards;
use crate::model::player::PlayerPosition;
use crate::model::score::{DealResult, TRICKS_PER_DEAL, TrickTally, score_deal};
use crate::model::suit::Suit;
use crate::model::trick::{Trick, TrickError};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::array;
use thiserror::Error;
use tracing::{Level, event};

/// Cards per seat in each distribution round: two before bidding, one after.
const OPENING_PACKETS: [usize; 2] = [3, 2];
const CLOSING_PACKET: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealPhase {
    AwaitingCut,
    Negotiating,
    Playing,
    Completed,
    Redeal,
}

impl fmt::Display for DealPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DealPhase::AwaitingCut => "awaiting cut",
            DealPhase::Negotiating => "negotiating",
            DealPhase::Playing => "playing",
            DealPhase::Completed => "completed",
            DealPhase::Redeal => "redeal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played {
        next: PlayerPosition,
    },
    TrickCompleted {
        winner: PlayerPosition,
        points: u32,
        deal_over: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("cards can only be played while the deal is being played")]
    NotInPlayPhase,
    #[error("{0} is not in hand")]
    CardNotInHand(Card),
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{card} is not a legal play on a {lead} lead")]
    IllegalCard { card: Card, lead: Suit },
    #[error(transparent)]
    Trick(#[from] TrickError),
}

impl PlayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlayError::Trick(err) => err.kind(),
            _ => ErrorKind::IllegalAction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealError {
    #[error("cannot {action} while the deal is {phase}")]
    WrongPhase {
        action: &'static str,
        phase: DealPhase,
    },
    #[error("{expected} cuts this deal, not {actual}")]
    WrongCutter {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Play(#[from] PlayError),
}

impl DealError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DealError::WrongPhase { .. } | DealError::WrongCutter { .. } => {
                ErrorKind::IllegalAction
            }
            DealError::Deck(err) => err.kind(),
            DealError::Negotiation(err) => err.kind(),
            DealError::Play(err) => err.kind(),
        }
    }
}

/// One deal from the cut to the final trick.
#[derive(Debug, Clone)]
pub struct DealState {
    dealer: PlayerPosition,
    deck: Deck,
    hands: [Hand; 4],
    negotiation: NegotiationState,
    contract: Option<Contract>,
    current_trick: Trick,
    trick_history: Vec<Trick>,
    tally: TrickTally,
    colour_sweep_points: Option<u32>,
    phase: DealPhase,
    result: Option<DealResult>,
}

impl DealState {
    pub fn new(
        dealer: PlayerPosition,
        deck: Deck,
        negotiation_rules: NegotiationRules,
        colour_sweep_points: Option<u32>,
    ) -> Self {
        event!(
            target: "giretra_core::deal",
            Level::DEBUG,
            dealer = %dealer,
            "deal started"
        );
        Self {
            dealer,
            deck,
            hands: array::from_fn(|_| Hand::new()),
            negotiation: NegotiationState::new(dealer, negotiation_rules),
            contract: None,
            current_trick: Trick::new(dealer.next()),
            trick_history: Vec::with_capacity(TRICKS_PER_DEAL as usize),
            tally: TrickTally::new(),
            colour_sweep_points,
            phase: DealPhase::AwaitingCut,
            result: None,
        }
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    /// The seat to the dealer's right.
    pub fn cutter(&self) -> PlayerPosition {
        self.dealer.previous()
    }

    pub fn phase(&self) -> DealPhase {
        self.phase
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn negotiation(&self) -> &NegotiationState {
        &self.negotiation
    }

    pub fn contract(&self) -> Option<Contract> {
        self.contract
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn trick_history(&self) -> &[Trick] {
        &self.trick_history
    }

    pub fn tally(&self) -> &TrickTally {
        &self.tally
    }

    pub fn result(&self) -> Option<&DealResult> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, DealPhase::Completed | DealPhase::Redeal)
    }

    /// Seat expected to act next in the current phase.
    pub fn to_act(&self) -> Option<PlayerPosition> {
        match self.phase {
            DealPhase::AwaitingCut => Some(self.cutter()),
            DealPhase::Negotiating => Some(self.negotiation.current_player()),
            DealPhase::Playing => Some(self.current_trick.expected_position()),
            DealPhase::Completed | DealPhase::Redeal => None,
        }
    }

    pub fn cut(
        &mut self,
        seat: PlayerPosition,
        position: usize,
        from_top: bool,
    ) -> Result<(), DealError> {
        self.require_phase(DealPhase::AwaitingCut, "cut")?;
        let expected = self.cutter();
        if seat != expected {
            return Err(DealError::WrongCutter {
                expected,
                actual: seat,
            });
        }

        self.deck.verify_full()?;
        let mut deck = self.deck.cut(position, from_top)?;
        let mut hands = self.hands.clone();
        for packet in OPENING_PACKETS {
            deck = distribute(&deck, &mut hands, self.dealer, packet)?;
        }

        event!(
            target: "giretra_core::deal",
            Level::DEBUG,
            cutter = %seat,
            position,
            from_top,
            "deck cut"
        );
        self.deck = deck;
        self.hands = hands;
        self.phase = DealPhase::Negotiating;
        Ok(())
    }

    pub fn submit_negotiation(
        &mut self,
        seat: PlayerPosition,
        action: NegotiationAction,
    ) -> Result<NegotiationOutcome, DealError> {
        self.require_phase(DealPhase::Negotiating, "negotiate")?;
        self.negotiation.validate(seat, action)?;

        let mut hands = self.hands.clone();
        let mut deck = self.deck.clone();
        let mut negotiation = self.negotiation.clone();
        let outcome = negotiation.apply(seat, action)?;
        if matches!(outcome, NegotiationOutcome::Settled(_)) {
            deck = distribute(&deck, &mut hands, self.dealer, CLOSING_PACKET)?;
        }

        event!(
            target: "giretra_core::deal",
            Level::DEBUG,
            seat = %seat,
            action = %action,
            "negotiation action"
        );
        self.negotiation = negotiation;
        self.hands = hands;
        self.deck = deck;

        match outcome {
            NegotiationOutcome::Settled(contract) => {
                event!(
                    target: "giretra_core::deal",
                    Level::DEBUG,
                    mode = %contract.mode,
                    multiplier = %contract.multiplier,
                    announcer = %contract.announcer,
                    "contract settled"
                );
                self.contract = Some(contract);
                self.phase = DealPhase::Playing;
            }
            NegotiationOutcome::NoContract => {
                event!(
                    target: "giretra_core::deal",
                    Level::DEBUG,
                    dealer = %self.dealer,
                    "no contract, redeal"
                );
                self.phase = DealPhase::Redeal;
            }
            NegotiationOutcome::Continuing { .. } => {}
        }
        Ok(outcome)
    }

    pub fn legal_cards(&self, seat: PlayerPosition) -> Vec<Card> {
        match (self.phase, self.contract) {
            (DealPhase::Playing, Some(contract))
                if self.current_trick.expected_position() == seat =>
            {
                legal_cards(
                    &self.hands[seat.index()],
                    &self.current_trick,
                    contract.mode,
                    seat,
                )
            }
            _ => Vec::new(),
        }
    }

    pub fn play_card(
        &mut self,
        seat: PlayerPosition,
        card: Card,
    ) -> Result<PlayOutcome, PlayError> {
        let contract = match (self.phase, self.contract) {
            (DealPhase::Playing, Some(contract)) => contract,
            _ => return Err(PlayError::NotInPlayPhase),
        };
        let mode = contract.mode;

        let expected = self.current_trick.expected_position();
        if seat != expected {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        let hand = &self.hands[seat.index()];
        if !hand.contains(card) {
            return Err(PlayError::CardNotInHand(card));
        }
        if let Some(lead) = self.current_trick.lead_suit() {
            if !legal_cards(hand, &self.current_trick, mode, seat).contains(&card) {
                return Err(PlayError::IllegalCard { card, lead });
            }
        }

        self.current_trick.play(seat, card)?;
        self.hands[seat.index()].remove(card);

        if !self.current_trick.is_complete() {
            return Ok(PlayOutcome::Played {
                next: self.current_trick.expected_position(),
            });
        }
        Ok(self.seal_trick(contract, mode))
    }

    fn seal_trick(&mut self, contract: Contract, mode: GameMode) -> PlayOutcome {
        // A complete trick always has a winner.
        let winner = self
            .current_trick
            .winner(mode)
            .unwrap_or(self.current_trick.leader());
        let points = self.current_trick.points(mode);
        let last = self.trick_history.len() + 1 == TRICKS_PER_DEAL as usize;
        self.tally.record(winner.team(), points, last);

        let finished = std::mem::replace(&mut self.current_trick, Trick::new(winner));
        self.trick_history.push(finished);

        event!(
            target: "giretra_core::deal",
            Level::DEBUG,
            trick = self.trick_history.len(),
            winner = %winner,
            points,
            "trick completed"
        );

        if last {
            let result = score_deal(&contract, &self.tally, self.colour_sweep_points);
            event!(
                target: "giretra_core::deal",
                Level::DEBUG,
                mode = %result.mode,
                team1_card_points = result.card_points[0],
                team2_card_points = result.card_points[1],
                team1_match_points = result.match_points[0],
                team2_match_points = result.match_points[1],
                sweep = ?result.sweep,
                instant_win = result.instant_win,
                "deal scored"
            );
            self.result = Some(result);
            self.phase = DealPhase::Completed;
        }

        PlayOutcome::TrickCompleted {
            winner,
            points,
            deal_over: last,
        }
    }

    fn require_phase(&self, phase: DealPhase, action: &'static str) -> Result<(), DealError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(DealError::WrongPhase {
                action,
                phase: self.phase,
            })
        }
    }
}

/// Hands `count` cards to each seat in play order and returns what is left.
fn distribute(
    deck: &Deck,
    hands: &mut [Hand; 4],
    dealer: PlayerPosition,
    count: usize,
) -> Result<Deck, DeckError> {
    let mut remaining = deck.clone();
    for seat in dealer.play_order() {
        let (cards, rest) = remaining.deal(count)?;
        hands[seat.index()].extend(cards);
        remaining = rest;
    }
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::{DealError, DealPhase, DealState, PlayError, PlayOutcome};
    use crate::error::ErrorKind;
    use crate::model::deck::{Deck, DeckError};
    use crate::model::mode::{GameMode, MultiplierState};
    use crate::model::negotiation::{NegotiationAction as A, NegotiationOutcome, NegotiationRules};
    use crate::model::player::PlayerPosition as P;

    fn fresh(dealer: P) -> DealState {
        DealState::new(dealer, Deck::standard(), NegotiationRules::default(), None)
    }

    fn settle(deal: &mut DealState, mode: GameMode) {
        let first = deal.negotiation().current_player();
        deal.submit_negotiation(first, A::Announce(mode)).unwrap();
        for _ in 0..3 {
            let seat = deal.negotiation().current_player();
            deal.submit_negotiation(seat, A::Pass).unwrap();
        }
    }

    #[test]
    fn cut_is_made_by_seat_right_of_dealer() {
        let mut deal = fresh(P::North);
        assert_eq!(deal.cutter(), P::West);
        let err = deal.cut(P::East, 10, true).unwrap_err();
        assert!(matches!(err, DealError::WrongCutter { .. }));
        assert_eq!(deal.phase(), DealPhase::AwaitingCut);
        deal.cut(P::West, 10, true).unwrap();
        assert_eq!(deal.phase(), DealPhase::Negotiating);
    }

    #[test]
    fn bad_cut_leaves_state_untouched() {
        let mut deal = fresh(P::North);
        let err = deal.cut(P::West, 27, true).unwrap_err();
        assert_eq!(err, DealError::Deck(DeckError::CutOutOfRange(27)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(deal.deck(), &Deck::standard());
        assert!(deal.hand(P::East).is_empty());
    }

    #[test]
    fn corrupt_deck_is_refused_at_the_cut() {
        let mut cards = Deck::standard().cards().to_vec();
        cards[1] = cards[0];
        let mut deal = DealState::new(
            P::North,
            Deck::from_cards(cards),
            NegotiationRules::default(),
            None,
        );
        let err = deal.cut(P::West, 6, false).unwrap_err();
        assert_eq!(err, DealError::Deck(DeckError::Corrupt));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert_eq!(deal.phase(), DealPhase::AwaitingCut);
        assert!(deal.hand(P::North).is_empty());
    }

    #[test]
    fn opening_distribution_is_three_then_two() {
        let mut deal = fresh(P::West);
        deal.cut(P::South, 6, false).unwrap();
        // Cut from bottom by 6: the deck now starts at card index 26.
        let cut = Deck::standard().cut(6, false).unwrap();
        let north = deal.hand(P::North);
        assert_eq!(north.len(), 5);
        for card in &cut.cards()[0..3] {
            assert!(north.contains(*card));
        }
        for card in &cut.cards()[12..14] {
            assert!(north.contains(*card));
        }
        for seat in P::LOOP {
            assert_eq!(deal.hand(seat).len(), 5);
        }
        assert_eq!(deal.deck().len(), 12);
    }

    #[test]
    fn settlement_completes_hands_to_eight() {
        let mut deal = fresh(P::West);
        deal.cut(P::South, 16, true).unwrap();
        settle(&mut deal, GameMode::ColourHearts);
        assert_eq!(deal.phase(), DealPhase::Playing);
        for seat in P::LOOP {
            assert_eq!(deal.hand(seat).len(), 8);
        }
        assert!(deal.deck().is_empty());
        assert_eq!(deal.to_act(), Some(P::North));
    }

    #[test]
    fn negotiation_before_cut_is_rejected() {
        let mut deal = fresh(P::North);
        let err = deal
            .submit_negotiation(P::East, A::Announce(GameMode::NoTrumps))
            .unwrap_err();
        assert!(matches!(err, DealError::WrongPhase { .. }));
    }

    #[test]
    fn four_passes_end_in_redeal() {
        let mut deal = fresh(P::North);
        deal.cut(P::West, 12, true).unwrap();
        let mut last = None;
        for _ in 0..4 {
            let seat = deal.negotiation().current_player();
            last = Some(deal.submit_negotiation(seat, A::Pass).unwrap());
        }
        assert_eq!(last, Some(NegotiationOutcome::NoContract));
        assert_eq!(deal.phase(), DealPhase::Redeal);
        assert!(deal.is_finished());
        assert!(deal.result().is_none());
    }

    #[test]
    fn plays_are_validated_before_mutation() {
        let mut deal = fresh(P::West);
        deal.cut(P::South, 16, true).unwrap();
        settle(&mut deal, GameMode::NoTrumps);

        let east_card = deal.hand(P::East).cards()[0];
        assert!(matches!(
            deal.play_card(P::East, east_card),
            Err(PlayError::OutOfTurn { .. })
        ));
        let foreign = deal.hand(P::South).cards()[0];
        let err = deal.play_card(P::North, foreign).unwrap_err();
        assert_eq!(err, PlayError::CardNotInHand(foreign));
        assert_eq!(err.kind(), ErrorKind::IllegalAction);
        assert_eq!(deal.hand(P::North).len(), 8);
        assert!(deal.current_trick().is_empty());
    }

    #[test]
    fn follow_suit_violation_is_rejected() {
        let mut deal = fresh(P::West);
        deal.cut(P::South, 16, true).unwrap();
        settle(&mut deal, GameMode::NoTrumps);

        let lead = deal.hand(P::North).cards()[0];
        deal.play_card(P::North, lead).unwrap();
        let east = deal.hand(P::East).clone();
        if east.has_suit(lead.suit) {
            if let Some(off) = east.iter().copied().find(|c| c.suit != lead.suit) {
                assert_eq!(
                    deal.play_card(P::East, off),
                    Err(PlayError::IllegalCard {
                        card: off,
                        lead: lead.suit
                    })
                );
            }
        }
    }

    #[test]
    fn full_deal_plays_out_and_scores() {
        let mut deal = DealState::new(
            P::South,
            Deck::shuffled_with_seed(11),
            NegotiationRules::default(),
            None,
        );
        deal.cut(P::East, 20, true).unwrap();
        let first = deal.negotiation().current_player();
        deal.submit_negotiation(first, A::Announce(GameMode::AllTrumps))
            .unwrap();
        let seat = deal.negotiation().current_player();
        deal.submit_negotiation(seat, A::Double).unwrap();
        for _ in 0..3 {
            let seat = deal.negotiation().current_player();
            deal.submit_negotiation(seat, A::Pass).unwrap();
        }
        assert_eq!(
            deal.contract().map(|c| c.multiplier),
            Some(MultiplierState::Doubled)
        );

        let mut tricks = 0;
        while deal.phase() == DealPhase::Playing {
            let seat = deal.to_act().unwrap();
            let card = deal.legal_cards(seat)[0];
            if let PlayOutcome::TrickCompleted { .. } = deal.play_card(seat, card).unwrap() {
                tricks += 1;
            }
        }
        assert_eq!(tricks, 8);
        assert_eq!(deal.phase(), DealPhase::Completed);
        let result = deal.result().copied().unwrap();
        assert_eq!(result.card_points[0] + result.card_points[1], 258);
        assert_eq!(result.tricks[0] + result.tricks[1], 8);
        assert!(result.match_points[0] + result.match_points[1] >= 52);
        assert!(deal.legal_cards(P::North).is_empty());
    }

    #[test]
    fn legal_cards_are_empty_for_seat_not_to_act() {
        let mut deal = fresh(P::West);
        deal.cut(P::South, 16, true).unwrap();
        settle(&mut deal, GameMode::ColourSpades);
        assert!(deal.legal_cards(P::East).is_empty());
        assert_eq!(deal.legal_cards(P::North).len(), 8);
    }
}
