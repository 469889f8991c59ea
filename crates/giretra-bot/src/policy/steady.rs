use super::{Policy, PolicyContext};
use giretra_core::model::card::Card;
use giretra_core::model::hand::Hand;
use giretra_core::model::mode::GameMode;
use giretra_core::model::negotiation::NegotiationAction;
use giretra_core::model::rank::Rank;
use giretra_core::model::suit::Suit;
use giretra_core::model::trick::beats;
use tracing::{Level, event};

const CUT_POSITION: usize = 16;

/// Deterministic rule-of-thumb player.
///
/// Bids a Colour only with a trump holding worth playing (Jack with a second
/// card, or Nine with two more), falls back to NoTrumps on three or more aces
/// and tens, and otherwise lets the bid stand. It doubles an opposing contract
/// whose plain win would carry the opponents to the target. In play it takes tricks as
/// cheaply as possible and sheds its least valuable card when it cannot, or
/// when its partner already holds the trick.
#[derive(Debug, Default, Clone, Copy)]
pub struct SteadyPolicy;

impl SteadyPolicy {
    pub fn new() -> Self {
        Self
    }

    fn preferred_mode(hand: &Hand) -> Option<GameMode> {
        let colour = Suit::ALL
            .iter()
            .copied()
            .filter(|suit| trump_holding_is_strong(hand, *suit))
            .max_by_key(|suit| {
                let count = hand.of_suit(*suit).count();
                let weight: u32 = hand.of_suit(*suit).map(|c| c.rank.trump_points()).sum();
                (count, weight)
            })
            .map(GameMode::from_suit);
        if colour.is_some() {
            return colour;
        }

        let winners = hand
            .iter()
            .filter(|card| matches!(card.rank, Rank::Ace | Rank::Ten))
            .count();
        (winners >= 3).then_some(GameMode::NoTrumps)
    }
}

fn trump_holding_is_strong(hand: &Hand, suit: Suit) -> bool {
    let count = hand.of_suit(suit).count();
    let has = |rank: Rank| hand.contains(Card::new(rank, suit));
    (has(Rank::Jack) && count >= 2) || (has(Rank::Nine) && count >= 3)
}

/// Whether the standing opposing bid, if made undoubled, ends the match.
fn opponents_close_out(ctx: &PolicyContext) -> bool {
    ctx.deal
        .negotiation()
        .current_bid()
        .is_some_and(|(mode, seat)| {
            seat.team() != ctx.seat.team()
                && ctx.opponent_score() + mode.base_match_points() >= ctx.target_score
        })
}

/// Lowest point value first, then weakest.
fn cheapest(cards: impl Iterator<Item = Card>, mode: GameMode) -> Option<Card> {
    cards.min_by_key(|card| (card.point_value(mode), card.strength(mode)))
}

impl Policy for SteadyPolicy {
    fn name(&self) -> &str {
        "steady"
    }

    fn choose_cut(&mut self, _ctx: &PolicyContext) -> (usize, bool) {
        (CUT_POSITION, true)
    }

    fn choose_negotiation(
        &mut self,
        ctx: &PolicyContext,
        options: &[NegotiationAction],
    ) -> NegotiationAction {
        let wanted = Self::preferred_mode(ctx.hand).map(NegotiationAction::Announce);
        let double = (options.contains(&NegotiationAction::Double)
            && opponents_close_out(ctx))
        .then_some(NegotiationAction::Double);
        let choice = double
            .or(wanted.filter(|action| options.contains(action)))
            .or_else(|| {
                [NegotiationAction::Accept, NegotiationAction::Pass]
                    .into_iter()
                    .find(|action| options.contains(action))
            })
            .unwrap_or(options[0]);

        event!(
            target: "giretra_bot::negotiation",
            Level::DEBUG,
            seat = %ctx.seat,
            options = options.len(),
            choice = %choice,
        );
        choice
    }

    fn choose_play(&mut self, ctx: &PolicyContext, legal: &[Card]) -> Card {
        let Some(contract) = ctx.deal.contract() else {
            return legal[0];
        };
        let mode = contract.mode;
        let trick = ctx.deal.current_trick();

        let (choice, reason) = match (trick.lead_suit(), trick.winning_play(mode)) {
            (Some(lead), Some(winning)) => {
                if winning.position.team() == ctx.seat.team() {
                    (cheapest(legal.iter().copied(), mode), "partner_holds")
                } else {
                    let winners = legal
                        .iter()
                        .copied()
                        .filter(|card| beats(*card, winning.card, lead, mode));
                    match cheapest(winners, mode) {
                        Some(card) => (Some(card), "cheapest_winner"),
                        None => (cheapest(legal.iter().copied(), mode), "shed"),
                    }
                }
            }
            _ => (
                legal.iter().copied().max_by_key(|card| {
                    (card.strength(mode), card.point_value(mode))
                }),
                "lead_strongest",
            ),
        };
        let card = choice.unwrap_or(legal[0]);

        event!(
            target: "giretra_bot::play",
            Level::DEBUG,
            seat = %ctx.seat,
            legal_count = legal.len(),
            chosen = %card,
            reason,
        );
        card
    }
}
