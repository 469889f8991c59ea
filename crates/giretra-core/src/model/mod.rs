pub mod card;
pub mod deal;
pub mod deck;
pub mod hand;
pub mod mode;
pub mod negotiation;
pub mod play;
pub mod player;
pub mod rank;
pub mod score;
pub mod suit;
pub mod trick;
