use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

/// The six contracts, declared in bidding order (lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameMode {
    ColourClubs = 0,
    ColourDiamonds = 1,
    ColourHearts = 2,
    ColourSpades = 3,
    NoTrumps = 4,
    AllTrumps = 5,
}

/// Fixed scoring and bidding constants attached to a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRules {
    pub trump_suit: Option<Suit>,
    pub win_threshold: u32,
    pub total_points: u32,
    pub base_match_points: u32,
    pub sweep_bonus: u32,
    pub can_redouble: bool,
    pub accept_auto_doubles: bool,
}

const fn colour_rules(suit: Suit) -> ModeRules {
    // Clubs bids like NoTrumps: no redouble, an opposing accept doubles.
    let clubs = matches!(suit, Suit::Clubs);
    ModeRules {
        trump_suit: Some(suit),
        win_threshold: 82,
        total_points: 162,
        base_match_points: 16,
        sweep_bonus: 0,
        can_redouble: !clubs,
        accept_auto_doubles: clubs,
    }
}

static RULES: [ModeRules; 6] = [
    colour_rules(Suit::Clubs),
    colour_rules(Suit::Diamonds),
    colour_rules(Suit::Hearts),
    colour_rules(Suit::Spades),
    ModeRules {
        trump_suit: None,
        win_threshold: 65,
        total_points: 130,
        base_match_points: 52,
        sweep_bonus: 90,
        can_redouble: false,
        accept_auto_doubles: true,
    },
    ModeRules {
        trump_suit: None,
        win_threshold: 129,
        total_points: 258,
        base_match_points: 26,
        sweep_bonus: 35,
        can_redouble: true,
        accept_auto_doubles: false,
    },
];

impl GameMode {
    pub const ALL: [GameMode; 6] = [
        GameMode::ColourClubs,
        GameMode::ColourDiamonds,
        GameMode::ColourHearts,
        GameMode::ColourSpades,
        GameMode::NoTrumps,
        GameMode::AllTrumps,
    ];

    pub fn rules(self) -> &'static ModeRules {
        &RULES[self as usize]
    }

    pub const fn from_suit(suit: Suit) -> Self {
        match suit {
            Suit::Clubs => GameMode::ColourClubs,
            Suit::Diamonds => GameMode::ColourDiamonds,
            Suit::Hearts => GameMode::ColourHearts,
            Suit::Spades => GameMode::ColourSpades,
        }
    }

    pub const fn is_higher_than(self, other: GameMode) -> bool {
        (self as u8) > (other as u8)
    }

    pub fn is_colour(self) -> bool {
        self.rules().trump_suit.is_some()
    }

    pub fn trump_suit(self) -> Option<Suit> {
        self.rules().trump_suit
    }

    /// Whether `suit` ranks and scores with the trump table under this mode.
    pub fn uses_trump_table(self, suit: Suit) -> bool {
        match self {
            GameMode::AllTrumps => true,
            _ => self.trump_suit() == Some(suit),
        }
    }

    /// Whether cards of `suit` beat every card of other suits in a trick.
    pub fn is_trump(self, suit: Suit) -> bool {
        self.trump_suit() == Some(suit)
    }

    pub fn win_threshold(self) -> u32 {
        self.rules().win_threshold
    }

    pub fn total_points(self) -> u32 {
        self.rules().total_points
    }

    pub fn base_match_points(self) -> u32 {
        self.rules().base_match_points
    }

    pub fn sweep_bonus(self) -> u32 {
        self.rules().sweep_bonus
    }

    pub fn can_redouble(self) -> bool {
        self.rules().can_redouble
    }

    pub fn accept_auto_doubles(self) -> bool {
        self.rules().accept_auto_doubles
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameMode::ColourClubs => "Colour(C)",
            GameMode::ColourDiamonds => "Colour(D)",
            GameMode::ColourHearts => "Colour(H)",
            GameMode::ColourSpades => "Colour(S)",
            GameMode::NoTrumps => "NoTrumps",
            GameMode::AllTrumps => "AllTrumps",
        };
        f.write_str(label)
    }
}

/// Stake ladder for a deal. Only ever climbs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum MultiplierState {
    #[default]
    Normal,
    Doubled,
    Redoubled,
}

impl MultiplierState {
    pub const fn factor(self) -> u32 {
        match self {
            MultiplierState::Normal => 1,
            MultiplierState::Doubled => 2,
            MultiplierState::Redoubled => 4,
        }
    }
}

impl fmt::Display for MultiplierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.factor())
    }
}

#[cfg(test)]
mod tests {
    use super::{GameMode, MultiplierState};
    use crate::model::suit::Suit;

    #[test]
    fn bidding_order_is_strict_and_irreflexive() {
        for (i, lower) in GameMode::ALL.iter().enumerate() {
            assert!(!lower.is_higher_than(*lower));
            for higher in &GameMode::ALL[i + 1..] {
                assert!(higher.is_higher_than(*lower), "{higher} > {lower}");
                assert!(!lower.is_higher_than(*higher));
            }
        }
        assert!(GameMode::AllTrumps.is_higher_than(GameMode::NoTrumps));
        assert!(GameMode::NoTrumps.is_higher_than(GameMode::ColourSpades));
    }

    #[test]
    fn from_suit_maps_to_colour_modes() {
        for suit in Suit::ALL {
            let mode = GameMode::from_suit(suit);
            assert!(mode.is_colour());
            assert_eq!(mode.trump_suit(), Some(suit));
        }
        assert!(!GameMode::NoTrumps.is_colour());
        assert!(!GameMode::AllTrumps.is_colour());
    }

    #[test]
    fn clubs_bids_like_no_trumps() {
        assert!(!GameMode::ColourClubs.can_redouble());
        assert!(GameMode::ColourClubs.accept_auto_doubles());
        assert!(!GameMode::NoTrumps.can_redouble());
        assert!(GameMode::NoTrumps.accept_auto_doubles());
        for mode in [
            GameMode::ColourDiamonds,
            GameMode::ColourHearts,
            GameMode::ColourSpades,
            GameMode::AllTrumps,
        ] {
            assert!(mode.can_redouble(), "{mode}");
            assert!(!mode.accept_auto_doubles(), "{mode}");
        }
    }

    #[test]
    fn rule_table_constants() {
        assert_eq!(GameMode::AllTrumps.win_threshold(), 129);
        assert_eq!(GameMode::AllTrumps.total_points(), 258);
        assert_eq!(GameMode::AllTrumps.base_match_points(), 26);
        assert_eq!(GameMode::AllTrumps.sweep_bonus(), 35);
        assert_eq!(GameMode::NoTrumps.win_threshold(), 65);
        assert_eq!(GameMode::NoTrumps.total_points(), 130);
        assert_eq!(GameMode::NoTrumps.base_match_points(), 52);
        assert_eq!(GameMode::NoTrumps.sweep_bonus(), 90);
        for suit in Suit::ALL {
            let mode = GameMode::from_suit(suit);
            assert_eq!(mode.win_threshold(), 82);
            assert_eq!(mode.total_points(), 162);
            assert_eq!(mode.base_match_points(), 16);
            assert_eq!(mode.sweep_bonus(), 0);
        }
    }

    #[test]
    fn all_trumps_uses_trump_table_without_trump_suit() {
        assert!(GameMode::AllTrumps.uses_trump_table(Suit::Hearts));
        assert!(!GameMode::AllTrumps.is_trump(Suit::Hearts));
        assert!(!GameMode::NoTrumps.uses_trump_table(Suit::Hearts));
        assert!(GameMode::ColourHearts.uses_trump_table(Suit::Hearts));
        assert!(!GameMode::ColourHearts.uses_trump_table(Suit::Spades));
    }

    #[test]
    fn multiplier_ladder_factors() {
        assert_eq!(MultiplierState::Normal.factor(), 1);
        assert_eq!(MultiplierState::Doubled.factor(), 2);
        assert_eq!(MultiplierState::Redoubled.factor(), 4);
        assert!(MultiplierState::Normal < MultiplierState::Doubled);
        assert!(MultiplierState::Doubled < MultiplierState::Redoubled);
    }
}
