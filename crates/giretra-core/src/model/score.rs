use crate::model::mode::{GameMode, MultiplierState};
use crate::model::negotiation::Contract;
use crate::model::player::Team;
use serde::{Deserialize, Serialize};

pub const TRICKS_PER_DEAL: u8 = 8;
pub const LAST_TRICK_BONUS: u32 = 10;

/// Running card points and trick counts per team for the deal in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrickTally {
    card_points: [u32; 2],
    tricks: [u8; 2],
}

impl TrickTally {
    pub const fn new() -> Self {
        Self {
            card_points: [0; 2],
            tricks: [0; 2],
        }
    }

    /// Credits a sealed trick to `winner`; `last` adds the last-trick bonus.
    pub fn record(&mut self, winner: Team, points: u32, last: bool) {
        let bonus = if last { LAST_TRICK_BONUS } else { 0 };
        self.card_points[winner.index()] += points + bonus;
        self.tricks[winner.index()] += 1;
    }

    pub fn card_points(&self, team: Team) -> u32 {
        self.card_points[team.index()]
    }

    pub fn tricks(&self, team: Team) -> u8 {
        self.tricks[team.index()]
    }

    pub fn tricks_played(&self) -> u8 {
        self.tricks[0] + self.tricks[1]
    }

    pub fn sweeping_team(&self) -> Option<Team> {
        Team::BOTH
            .into_iter()
            .find(|team| self.tricks(*team) == TRICKS_PER_DEAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealResult {
    pub mode: GameMode,
    pub multiplier: MultiplierState,
    pub announcer_team: Team,
    pub card_points: [u32; 2],
    pub match_points: [u32; 2],
    pub tricks: [u8; 2],
    pub sweep: Option<Team>,
    pub instant_win: bool,
}

impl DealResult {
    pub fn card_points(&self, team: Team) -> u32 {
        self.card_points[team.index()]
    }

    pub fn match_points(&self, team: Team) -> u32 {
        self.match_points[team.index()]
    }

    pub fn is_sweep(&self) -> bool {
        self.sweep.is_some()
    }

    /// True on any instant win, whichever team swept.
    pub fn announcer_won(&self) -> bool {
        let announcer = self.match_points(self.announcer_team);
        let defender = self.match_points(self.announcer_team.opponent());
        self.instant_win || announcer > defender
    }
}

/// Converts a finished deal into match points.
///
/// A Colour sweep is an instant match win unless `colour_sweep_points` gives
/// it a fixed award. Otherwise the announcer scores the mode's base times the
/// multiplier when reaching the threshold, the defenders otherwise, and a
/// NoTrumps/AllTrumps sweep adds the flat sweep bonus on top.
pub fn score_deal(
    contract: &Contract,
    tally: &TrickTally,
    colour_sweep_points: Option<u32>,
) -> DealResult {
    let mode = contract.mode;
    let announcer = contract.announcer_team();
    let factor = contract.multiplier.factor();
    let sweep = tally.sweeping_team();

    let mut result = DealResult {
        mode,
        multiplier: contract.multiplier,
        announcer_team: announcer,
        card_points: [tally.card_points(Team::Team1), tally.card_points(Team::Team2)],
        match_points: [0; 2],
        tricks: [tally.tricks(Team::Team1), tally.tricks(Team::Team2)],
        sweep,
        instant_win: false,
    };

    if let (Some(sweeper), true) = (sweep, mode.is_colour()) {
        match colour_sweep_points {
            Some(points) => result.match_points[sweeper.index()] = points * factor,
            None => result.instant_win = true,
        }
        return result;
    }

    let base = mode.base_match_points() * factor;
    let taker = if tally.card_points(announcer) >= mode.win_threshold() {
        announcer
    } else {
        announcer.opponent()
    };
    result.match_points[taker.index()] += base;

    if let Some(sweeper) = sweep {
        result.match_points[sweeper.index()] += mode.sweep_bonus();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{DealResult, TrickTally, score_deal};
    use crate::model::mode::{GameMode, MultiplierState};
    use crate::model::negotiation::Contract;
    use crate::model::player::{PlayerPosition, Team};

    fn contract(mode: GameMode, multiplier: MultiplierState, announcer: PlayerPosition) -> Contract {
        Contract {
            mode,
            multiplier,
            announcer,
        }
    }

    /// Team1 takes `team1_tricks` tricks holding `team1_points`; Team2 the rest.
    fn split(team1_points: u32, team1_tricks: u8, total: u32) -> TrickTally {
        let mut tally = TrickTally::new();
        for i in 0..team1_tricks {
            tally.record(Team::Team1, if i == 0 { team1_points } else { 0 }, false);
        }
        for i in 0..(8 - team1_tricks) {
            tally.record(Team::Team2, if i == 0 { total - team1_points } else { 0 }, false);
        }
        tally
    }

    #[test]
    fn tally_awards_last_trick_bonus() {
        let mut tally = TrickTally::new();
        tally.record(Team::Team2, 20, true);
        assert_eq!(tally.card_points(Team::Team2), 30);
        assert_eq!(tally.tricks(Team::Team2), 1);
        assert_eq!(tally.tricks_played(), 1);
    }

    #[test]
    fn doubled_spades_announcer_makes_contract() {
        let c = contract(GameMode::ColourSpades, MultiplierState::Doubled, PlayerPosition::North);
        let result = score_deal(&c, &split(90, 5, 162), None);
        assert_eq!(result.match_points(Team::Team1), 32);
        assert_eq!(result.match_points(Team::Team2), 0);
        assert!(result.announcer_won());
        assert!(!result.instant_win);
    }

    #[test]
    fn announcer_below_threshold_hands_points_to_defenders() {
        let c = contract(GameMode::ColourHearts, MultiplierState::Normal, PlayerPosition::East);
        let result = score_deal(&c, &split(81, 4, 162), None);
        assert_eq!(result.card_points(Team::Team2), 81);
        assert_eq!(result.match_points(Team::Team2), 0);
        assert_eq!(result.match_points(Team::Team1), 16);
        assert!(!result.announcer_won());
    }

    #[test]
    fn threshold_is_inclusive() {
        let c = contract(GameMode::AllTrumps, MultiplierState::Normal, PlayerPosition::South);
        let result = score_deal(&c, &split(129, 4, 258), None);
        assert_eq!(result.match_points(Team::Team1), 26);
    }

    #[test]
    fn no_trumps_announcer_sweep_adds_flat_bonus() {
        for multiplier in [MultiplierState::Normal, MultiplierState::Doubled] {
            let c = contract(GameMode::NoTrumps, multiplier, PlayerPosition::North);
            let result = score_deal(&c, &split(130, 8, 130), None);
            assert_eq!(result.sweep, Some(Team::Team1));
            assert_eq!(
                result.match_points(Team::Team1),
                52 * multiplier.factor() + 90
            );
            assert_eq!(result.match_points(Team::Team2), 0);
            assert!(!result.instant_win);
        }
    }

    #[test]
    fn all_trumps_defender_sweep_stacks_bonus_on_conversion() {
        let c = contract(GameMode::AllTrumps, MultiplierState::Redoubled, PlayerPosition::North);
        let result = score_deal(&c, &split(0, 0, 258), None);
        assert_eq!(result.sweep, Some(Team::Team2));
        assert_eq!(result.match_points(Team::Team2), 26 * 4 + 35);
        assert!(!result.announcer_won());
    }

    #[test]
    fn colour_defender_sweep_is_an_instant_win() {
        let c = contract(GameMode::ColourHearts, MultiplierState::Normal, PlayerPosition::North);
        let result = score_deal(&c, &split(0, 0, 162), None);
        assert!(result.instant_win);
        assert_eq!(result.sweep, Some(Team::Team2));
        assert_eq!(result.match_points, [0, 0]);
        assert!(result.announcer_won());
    }

    #[test]
    fn colour_announcer_sweep_counts_as_announcer_win() {
        let c = contract(GameMode::ColourDiamonds, MultiplierState::Normal, PlayerPosition::West);
        let result: DealResult = score_deal(&c, &split(0, 0, 162), None);
        assert!(result.instant_win);
        assert!(result.announcer_won());
    }

    #[test]
    fn configured_colour_sweep_award_replaces_instant_win() {
        let c = contract(GameMode::ColourClubs, MultiplierState::Doubled, PlayerPosition::North);
        let result = score_deal(&c, &split(162, 8, 162), Some(100));
        assert!(!result.instant_win);
        assert_eq!(result.match_points(Team::Team1), 200);
        assert_eq!(result.match_points(Team::Team2), 0);
    }
}
