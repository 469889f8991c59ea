use super::match_state::{MatchProgress, MatchRules, MatchState};
use crate::model::player::{PlayerPosition, Team};
use crate::model::score::DealResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchSnapshot {
    pub seed: u64,
    #[serde(default)]
    pub rules: MatchRules,
    pub dealer: PlayerPosition,
    pub scores: [u32; 2],
    pub target_score: u32,
    pub deal_index: u32,
    #[serde(default)]
    pub redeals: u32,
    #[serde(default)]
    pub results: Vec<DealResult>,
    #[serde(default)]
    pub winner: Option<Team>,
}

impl MatchSnapshot {
    /// Captures the match at the start of its current deal. Cards already
    /// played in that deal are not recorded; restoring re-deals it.
    pub fn capture(state: &MatchState) -> Self {
        MatchSnapshot {
            seed: state.seed(),
            rules: *state.rules(),
            dealer: state.dealer(),
            scores: state.scores(),
            target_score: state.target_score(),
            deal_index: state.deal_index(),
            redeals: state.redeals(),
            results: state.results().to_vec(),
            winner: state.winner(),
        }
    }

    pub fn restore(self) -> MatchState {
        MatchState::resume(
            self.seed,
            self.rules,
            MatchProgress {
                dealer: self.dealer,
                scores: self.scores,
                target_score: self.target_score,
                deal_index: self.deal_index,
                redeals: self.redeals,
                results: self.results,
                winner: self.winner,
            },
        )
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::MatchSnapshot;
    use crate::game::match_state::MatchState;
    use crate::model::negotiation::NegotiationAction;
    use crate::model::player::{PlayerPosition, Team};

    fn pass_out_one_deal(state: &mut MatchState) {
        let cutter = state.deal().cutter();
        state.submit_cut(cutter, 12, true).unwrap();
        for _ in 0..4 {
            let seat = state.deal().negotiation().current_player();
            state
                .submit_negotiation_action(seat, NegotiationAction::Pass)
                .unwrap();
        }
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let state = MatchState::new(99, 150);
        let json = MatchSnapshot::to_json(&state).unwrap();
        assert!(json.contains("\"seed\": 99"));
        assert!(json.contains("\"target_score\": 150"));
        assert!(json.contains("\"dealer\": \"North\""));
    }

    #[test]
    fn restore_replays_the_deck_of_the_current_deal() {
        let mut state = MatchState::new(123, 150);
        pass_out_one_deal(&mut state);
        pass_out_one_deal(&mut state);

        let snapshot = MatchSnapshot::capture(&state);
        let restored = snapshot.clone().restore();
        assert_eq!(restored.deal_index(), 2);
        assert_eq!(restored.redeals(), 2);
        assert_eq!(restored.dealer(), PlayerPosition::South);
        assert_eq!(restored.deal().deck(), state.deal().deck());
        assert_eq!(MatchSnapshot::capture(&restored), snapshot);
    }

    #[test]
    fn json_roundtrip_keeps_progress() {
        let mut state = MatchState::new(8, 200);
        pass_out_one_deal(&mut state);
        let json = MatchSnapshot::to_json(&state).unwrap();
        let restored = MatchSnapshot::from_json(&json).unwrap().restore();
        assert_eq!(restored.target_score(), 200);
        assert_eq!(restored.dealer(), PlayerPosition::East);
        assert_eq!(restored.deal().deck(), state.deal().deck());
    }

    #[test]
    fn minimal_json_fills_defaults() {
        let json = r#"{
            "seed": 7,
            "dealer": "West",
            "scores": [40, 96],
            "target_score": 150,
            "deal_index": 5
        }"#;
        let snapshot = MatchSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.redeals, 0);
        assert!(snapshot.results.is_empty());
        let restored = snapshot.restore();
        assert_eq!(restored.score(Team::Team2), 96);
        assert_eq!(restored.dealer(), PlayerPosition::West);
        assert!(!restored.is_over());
    }
}
