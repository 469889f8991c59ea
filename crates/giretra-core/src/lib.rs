pub mod error;
pub mod game;
pub mod model;

pub use error::ErrorKind;
pub use game::match_state::{MatchError, MatchRules, MatchState};
pub use game::serialization::MatchSnapshot;
pub use model::card::Card;
pub use model::deal::{DealError, DealPhase, DealState, PlayError, PlayOutcome};
pub use model::deck::{Deck, DeckError};
pub use model::mode::{GameMode, MultiplierState};
pub use model::negotiation::{
    Contract, NegotiationAction, NegotiationError, NegotiationOutcome, NegotiationRules,
    RedealRule,
};
pub use model::player::{PlayerPosition, Team};
pub use model::rank::Rank;
pub use model::score::DealResult;
pub use model::suit::Suit;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "giretra"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
