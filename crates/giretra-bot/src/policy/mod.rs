mod random;
mod steady;

pub use random::RandomPolicy;
pub use steady::SteadyPolicy;

use giretra_core::model::card::Card;
use giretra_core::model::deal::DealState;
use giretra_core::model::hand::Hand;
use giretra_core::model::negotiation::NegotiationAction;
use giretra_core::model::player::PlayerPosition;

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub seat: PlayerPosition,
    pub hand: &'a Hand,
    pub deal: &'a DealState,
    pub scores: [u32; 2],
    pub target_score: u32,
}

impl<'a> PolicyContext<'a> {
    pub fn new(
        seat: PlayerPosition,
        deal: &'a DealState,
        scores: [u32; 2],
        target_score: u32,
    ) -> Self {
        Self {
            seat,
            hand: deal.hand(seat),
            deal,
            scores,
            target_score,
        }
    }

    pub fn opponent_score(&self) -> u32 {
        self.scores[self.seat.team().opponent().index()]
    }
}

/// A seat's decision maker. The engine supplies the legal options; a policy
/// only ever picks one of them.
pub trait Policy: Send {
    fn name(&self) -> &str;

    /// Cut position in 6..=26 and whether to take it from the top.
    fn choose_cut(&mut self, ctx: &PolicyContext) -> (usize, bool);

    fn choose_negotiation(
        &mut self,
        ctx: &PolicyContext,
        options: &[NegotiationAction],
    ) -> NegotiationAction;

    fn choose_play(&mut self, ctx: &PolicyContext, legal: &[Card]) -> Card;
}
