use crate::error::ErrorKind;
use crate::model::card::Card;
use crate::model::deal::{DealError, DealPhase, DealState, PlayOutcome};
use crate::model::deck::Deck;
use crate::model::negotiation::{NegotiationAction, NegotiationOutcome, NegotiationRules};
use crate::model::player::{PlayerPosition, Team};
use crate::model::score::DealResult;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

pub const DEFAULT_TARGET_SCORE: u32 = 150;
/// Added to the target whenever both teams reach it on the same deal or tie on it.
pub const TARGET_RAISE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    pub target_score: u32,
    pub first_dealer: PlayerPosition,
    /// When set, a Colour sweep scores this many points (times the multiplier)
    /// instead of ending the match.
    pub colour_sweep_points: Option<u32>,
    pub negotiation: NegotiationRules,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            target_score: DEFAULT_TARGET_SCORE,
            first_dealer: PlayerPosition::North,
            colour_sweep_points: None,
            negotiation: NegotiationRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("match is over, won by {winner}")]
    MatchOver { winner: Team },
    #[error(transparent)]
    Deal(#[from] DealError),
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::MatchOver { .. } => ErrorKind::IllegalAction,
            MatchError::Deal(err) => err.kind(),
        }
    }
}

/// A whole match: successive deals until one team reaches the target or sweeps
/// a Colour contract.
#[derive(Debug, Clone)]
pub struct MatchState {
    seed: u64,
    rng: StdRng,
    rules: MatchRules,
    scores: [u32; 2],
    target_score: u32,
    results: Vec<DealResult>,
    redeals: u32,
    deal_index: u32,
    deal: DealState,
    winner: Option<Team>,
}

impl MatchState {
    pub fn new(seed: u64, target_score: u32) -> Self {
        Self::with_rules(
            seed,
            MatchRules {
                target_score,
                ..MatchRules::default()
            },
        )
    }

    pub fn with_rules(seed: u64, rules: MatchRules) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let deal = Self::start_deal(&mut rng, &rules, rules.first_dealer, 0);
        Self {
            seed,
            rng,
            rules,
            scores: [0; 2],
            target_score: rules.target_score,
            results: Vec::new(),
            redeals: 0,
            deal_index: 0,
            deal,
            winner: None,
        }
    }

    /// Rebuilds a match positioned at the start of deal `deal_index` by
    /// replaying the seeded shuffles that preceded it.
    pub(crate) fn resume(
        seed: u64,
        rules: MatchRules,
        progress: MatchProgress,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..progress.deal_index {
            let _ = Deck::shuffled(&mut rng);
        }
        let deal = Self::start_deal(&mut rng, &rules, progress.dealer, progress.deal_index);
        Self {
            seed,
            rng,
            rules,
            scores: progress.scores,
            target_score: progress.target_score,
            results: progress.results,
            redeals: progress.redeals,
            deal_index: progress.deal_index,
            deal,
            winner: progress.winner,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.deal.dealer()
    }

    pub fn deal(&self) -> &DealState {
        &self.deal
    }

    /// Deals started so far, redeals included, minus one.
    pub fn deal_index(&self) -> u32 {
        self.deal_index
    }

    pub fn score(&self, team: Team) -> u32 {
        self.scores[team.index()]
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    pub fn target_score(&self) -> u32 {
        self.target_score
    }

    pub fn results(&self) -> &[DealResult] {
        &self.results
    }

    pub fn redeals(&self) -> u32 {
        self.redeals
    }

    /// Result of the most recently scored deal.
    pub fn current_deal_result(&self) -> Option<&DealResult> {
        self.results.last()
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn is_match_over(&self) -> (bool, Option<Team>) {
        (self.is_over(), self.winner)
    }

    pub fn submit_cut(
        &mut self,
        seat: PlayerPosition,
        position: usize,
        from_top: bool,
    ) -> Result<(), MatchError> {
        self.ensure_running()?;
        self.deal.cut(seat, position, from_top)?;
        Ok(())
    }

    pub fn valid_negotiation_actions(&self) -> Vec<NegotiationAction> {
        if self.is_over() || self.deal.phase() != DealPhase::Negotiating {
            return Vec::new();
        }
        self.deal.negotiation().valid_actions()
    }

    pub fn submit_negotiation_action(
        &mut self,
        seat: PlayerPosition,
        action: NegotiationAction,
    ) -> Result<NegotiationOutcome, MatchError> {
        self.ensure_running()?;
        let outcome = self.deal.submit_negotiation(seat, action)?;
        if outcome == NegotiationOutcome::NoContract {
            self.redeals += 1;
            event!(
                target: "giretra_core::match",
                Level::DEBUG,
                redeals = self.redeals,
                "deal abandoned without contract"
            );
            self.advance_dealer();
        }
        Ok(outcome)
    }

    pub fn legal_cards(&self, seat: PlayerPosition) -> Vec<Card> {
        if self.is_over() {
            return Vec::new();
        }
        self.deal.legal_cards(seat)
    }

    pub fn submit_card(
        &mut self,
        seat: PlayerPosition,
        card: Card,
    ) -> Result<PlayOutcome, MatchError> {
        self.ensure_running()?;
        let outcome = self.deal.play_card(seat, card).map_err(DealError::from)?;
        if let PlayOutcome::TrickCompleted {
            deal_over: true, ..
        } = outcome
        {
            if let Some(result) = self.deal.result().copied() {
                self.apply_result(result);
            }
        }
        Ok(outcome)
    }

    fn apply_result(&mut self, result: DealResult) {
        self.results.push(result);

        if result.instant_win {
            self.winner = result.sweep;
        } else {
            for team in Team::BOTH {
                self.scores[team.index()] += result.match_points(team);
            }
            self.winner = self.settle_target();
        }

        match self.winner {
            Some(winner) => event!(
                target: "giretra_core::match",
                Level::DEBUG,
                winner = %winner,
                team1 = self.scores[0],
                team2 = self.scores[1],
                deals = self.results.len(),
                instant_win = result.instant_win,
                "match over"
            ),
            None => self.advance_dealer(),
        }
    }

    /// Decides the winner after scores change, raising the target when both
    /// teams reach it or tie on it.
    fn settle_target(&mut self) -> Option<Team> {
        let [team1, team2] = self.scores;
        let target = self.target_score;
        match (team1 >= target, team2 >= target) {
            (false, false) => None,
            (true, false) => Some(Team::Team1),
            (false, true) => Some(Team::Team2),
            (true, true) => {
                self.target_score += TARGET_RAISE;
                event!(
                    target: "giretra_core::match",
                    Level::DEBUG,
                    target = self.target_score,
                    "target raised"
                );
                None
            }
        }
    }

    fn advance_dealer(&mut self) {
        let next = self.deal.dealer().next();
        self.deal_index += 1;
        self.deal = Self::start_deal(&mut self.rng, &self.rules, next, self.deal_index);
    }

    fn start_deal(
        rng: &mut StdRng,
        rules: &MatchRules,
        dealer: PlayerPosition,
        deal_index: u32,
    ) -> DealState {
        event!(
            target: "giretra_core::match",
            Level::DEBUG,
            deal_index,
            dealer = %dealer,
            "dealing"
        );
        DealState::new(
            dealer,
            Deck::shuffled(rng),
            rules.negotiation,
            rules.colour_sweep_points,
        )
    }

    fn ensure_running(&self) -> Result<(), MatchError> {
        match self.winner {
            Some(winner) => Err(MatchError::MatchOver { winner }),
            None => Ok(()),
        }
    }
}

/// Everything besides seed and rules needed to resume a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchProgress {
    pub dealer: PlayerPosition,
    pub scores: [u32; 2],
    pub target_score: u32,
    pub deal_index: u32,
    pub redeals: u32,
    pub results: Vec<DealResult>,
    pub winner: Option<Team>,
}
