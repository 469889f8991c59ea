use super::{Policy, PolicyContext};
use giretra_core::model::card::Card;
use giretra_core::model::deck::{MAX_CUT, MIN_CUT};
use giretra_core::model::negotiation::NegotiationAction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform choice among whatever the engine allows.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_cut(&mut self, _ctx: &PolicyContext) -> (usize, bool) {
        (self.rng.gen_range(MIN_CUT..=MAX_CUT), self.rng.gen_bool(0.5))
    }

    fn choose_negotiation(
        &mut self,
        _ctx: &PolicyContext,
        options: &[NegotiationAction],
    ) -> NegotiationAction {
        options[self.rng.gen_range(0..options.len())]
    }

    fn choose_play(&mut self, _ctx: &PolicyContext, legal: &[Card]) -> Card {
        legal[self.rng.gen_range(0..legal.len())]
    }
}
