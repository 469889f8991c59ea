use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::mode::GameMode;
use crate::model::player::PlayerPosition;
use crate::model::trick::{Trick, beats};

/// Cards `seat` may put on `trick` from `hand` under `mode`.
///
/// Following suit is mandatory. Under AllTrumps, and under a Colour mode when
/// trump is led, a follower must also head the current winner of the lead suit
/// when able. A Colour-mode player who cannot follow must trump (overtrumping
/// when a trump is already down) unless the partner holds the trick with a
/// plain card and nobody has trumped yet. Everything else is a free discard.
pub fn legal_cards(hand: &Hand, trick: &Trick, mode: GameMode, seat: PlayerPosition) -> Vec<Card> {
    let Some(lead) = trick.lead_suit() else {
        return hand.cards().to_vec();
    };

    let following: Vec<Card> = hand.of_suit(lead).collect();
    if !following.is_empty() {
        let must_head = match mode {
            GameMode::AllTrumps => true,
            _ => mode.is_trump(lead),
        };
        if must_head {
            if let Some(winning) = trick.winning_play(mode) {
                if winning.card.suit == lead {
                    let higher: Vec<Card> = following
                        .iter()
                        .copied()
                        .filter(|card| beats(*card, winning.card, lead, mode))
                        .collect();
                    if !higher.is_empty() {
                        return higher;
                    }
                }
            }
        }
        return following;
    }

    let Some(trump) = mode.trump_suit() else {
        return hand.cards().to_vec();
    };
    let trumps: Vec<Card> = hand.of_suit(trump).collect();
    if trumps.is_empty() {
        return hand.cards().to_vec();
    }

    let trump_down = trick.has_trump(mode);
    let partner_holds_plain = trick.winning_play(mode).is_some_and(|winning| {
        winning.position.team() == seat.team() && !mode.is_trump(winning.card.suit)
    });
    if partner_holds_plain && !trump_down {
        return hand.cards().to_vec();
    }

    if let Some(top_trump) = trick.highest_trump(mode) {
        let over: Vec<Card> = trumps
            .iter()
            .copied()
            .filter(|card| beats(*card, top_trump, trump, mode))
            .collect();
        if !over.is_empty() {
            return over;
        }
    }
    trumps
}

pub fn is_legal(
    card: Card,
    hand: &Hand,
    trick: &Trick,
    mode: GameMode,
    seat: PlayerPosition,
) -> bool {
    hand.contains(card) && legal_cards(hand, trick, mode, seat).contains(&card)
}
