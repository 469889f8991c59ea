mod summary;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use giretra_bot::policy::{Policy, PolicyContext, RandomPolicy, SteadyPolicy};
use giretra_core::game::match_state::{MatchError, MatchState};
use giretra_core::model::deal::{DealPhase, PlayOutcome};
use giretra_core::model::negotiation::NegotiationOutcome;
use giretra_core::model::player::{PlayerPosition, Team};
use giretra_core::model::score::DealResult;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs, SEAT_COUNT};
use crate::logging::TELEMETRY_FILE;

pub use summary::{MatchOutcome, SummaryCollector};

/// Hard stop for a single match; a legal match ends long before this.
const MAX_DEALS_PER_MATCH: u32 = 10_000;

/// Plays seeded matches between configured agents and records every scored deal.
pub struct MatchRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub matches_played: usize,
    pub deals_scored: usize,
    pub redeals: u32,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl MatchRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if agents.len() != SEAT_COUNT {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            config,
            outputs,
            agents,
        })
    }

    /// Play every configured match, streaming one JSONL row per scored deal.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.matches.seed.unwrap_or(0));
        let mut collector = SummaryCollector::new(&self.config);
        let mut rows_written = 0usize;

        for match_index in 0..self.config.matches.count {
            let match_seed = rng.next_u64();
            let outcome = self.play_match(match_index, match_seed)?;
            rows_written += write_deal_rows(
                &mut writer,
                &self.config.run_id,
                match_index,
                match_seed,
                &outcome,
            )?;
            collector.record_match(&outcome);
        }

        writer.flush()?;
        collector.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self
            .config
            .logging
            .enable_structured
            .then(|| self.outputs.artifact_dir().join(TELEMETRY_FILE));

        Ok(RunSummary {
            matches_played: self.config.matches.count,
            deals_scored: collector.deals_scored(),
            redeals: collector.redeals(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    fn play_match(&self, match_index: usize, match_seed: u64) -> Result<MatchOutcome, RunnerError> {
        let mut state = MatchState::with_rules(match_seed, self.config.matches.rules());
        let mut seats = self.build_seats(match_seed);
        let mut deals = Vec::new();
        let mut dealer = state.dealer();
        let mut deal_index = state.deal_index();

        while !state.is_over() {
            if state.deal_index() >= MAX_DEALS_PER_MATCH {
                return Err(RunnerError::game(format!(
                    "match {match_index} exceeded {MAX_DEALS_PER_MATCH} deals"
                )));
            }

            let phase = state.deal().phase();
            let seat = state.deal().to_act().ok_or_else(|| {
                RunnerError::game(format!("no seat to act in phase {phase}"))
            })?;
            let policy = &mut seats[seat.index()].policy;
            let ctx = PolicyContext::new(seat, state.deal(), state.scores(), state.target_score());

            match phase {
                DealPhase::AwaitingCut => {
                    let (position, from_top) = policy.choose_cut(&ctx);
                    state.submit_cut(seat, position, from_top)?;
                }
                DealPhase::Negotiating => {
                    let options = state.valid_negotiation_actions();
                    let action = policy.choose_negotiation(&ctx, &options);
                    event!(
                        target: "giretra_bench::negotiation",
                        Level::DEBUG,
                        match_index = match_index as u64,
                        seat = %seat,
                        action = %action
                    );
                    if state.submit_negotiation_action(seat, action)?
                        == NegotiationOutcome::NoContract
                    {
                        dealer = state.dealer();
                        deal_index = state.deal_index();
                    }
                }
                DealPhase::Playing => {
                    let legal = state.legal_cards(seat);
                    let card = policy.choose_play(&ctx, &legal);
                    let outcome = state.submit_card(seat, card)?;
                    if let PlayOutcome::TrickCompleted {
                        deal_over: true, ..
                    } = outcome
                    {
                        let result = state.current_deal_result().copied().ok_or_else(|| {
                            RunnerError::game("finished deal has no result".to_string())
                        })?;
                        deals.push(ScoredDeal {
                            deal_index,
                            dealer,
                            result,
                            scores_after: state.scores(),
                        });
                        dealer = state.dealer();
                        deal_index = state.deal_index();
                    }
                }
                DealPhase::Completed | DealPhase::Redeal => {
                    return Err(RunnerError::game(format!(
                        "match {match_index} stalled in phase {phase}"
                    )));
                }
            }
        }

        let winner = state
            .winner()
            .ok_or_else(|| RunnerError::game(format!("match {match_index} ended without winner")))?;

        event!(
            target: "giretra_bench::match",
            Level::INFO,
            run_id = %self.config.run_id,
            match_index = match_index as u64,
            match_seed,
            winner = %winner,
            team1 = state.score(Team::Team1),
            team2 = state.score(Team::Team2),
            deals = deals.len() as u64,
            redeals = state.redeals(),
            seating = %seating_label(&seats)
        );

        Ok(MatchOutcome {
            winner,
            final_scores: state.scores(),
            redeals: state.redeals(),
            deals,
        })
    }

    fn build_seats(&self, match_seed: u64) -> Vec<SeatState> {
        PlayerPosition::LOOP
            .iter()
            .zip(&self.agents)
            .map(|(&seat, agent)| SeatState {
                policy: agent.spawn_policy(match_seed, seat),
            })
            .collect()
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_deal_rows(
    writer: &mut BufWriter<File>,
    run_id: &str,
    match_index: usize,
    match_seed: u64,
    outcome: &MatchOutcome,
) -> Result<usize, RunnerError> {
    for deal in &outcome.deals {
        let result = &deal.result;
        let row = DealLogRow {
            run_id,
            deal_id: format!("M{match_index:05}_D{:03}", deal.deal_index),
            match_index,
            match_seed,
            deal_index: deal.deal_index,
            dealer: seat_label(deal.dealer),
            mode: result.mode.to_string(),
            multiplier: result.multiplier.factor(),
            announcer_team: result.announcer_team,
            announcer_won: result.announcer_won(),
            card_points: result.card_points,
            match_points: result.match_points,
            tricks: result.tricks,
            sweep: result.sweep,
            instant_win: result.instant_win,
            scores_after: deal.scores_after,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
    }

    Ok(outcome.deals.len())
}

fn seat_label(position: PlayerPosition) -> &'static str {
    match position {
        PlayerPosition::North => "north",
        PlayerPosition::East => "east",
        PlayerPosition::South => "south",
        PlayerPosition::West => "west",
    }
}

struct SeatState {
    policy: Box<dyn Policy>,
}

/// `north=steady east=random ...`, in seat order.
fn seating_label(seats: &[SeatState]) -> String {
    PlayerPosition::LOOP
        .iter()
        .zip(seats)
        .map(|(&seat, state)| format!("{}={}", seat_label(seat), state.policy.name()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A deal that reached scoring, with the dealer who shuffled it.
#[derive(Debug, Clone)]
pub struct ScoredDeal {
    pub deal_index: u32,
    pub dealer: PlayerPosition,
    pub result: DealResult,
    pub scores_after: [u32; 2],
}

#[derive(Serialize)]
struct DealLogRow<'a> {
    run_id: &'a str,
    deal_id: String,
    match_index: usize,
    match_seed: u64,
    deal_index: u32,
    dealer: &'static str,
    mode: String,
    multiplier: u32,
    announcer_team: Team,
    announcer_won: bool,
    card_points: [u32; 2],
    match_points: [u32; 2],
    tricks: [u8; 2],
    sweep: Option<Team>,
    instant_win: bool,
    scores_after: [u32; 2],
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("engine rejected a policy decision: {0}")]
    Match(#[from] MatchError),
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("configuration requires exactly 4 agents but found {found}")]
    SeatCount { found: usize },
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid random parameter for agent '{name}': {message}")]
    InvalidRandomParam { name: String, message: String },
    #[error("agent '{name}' of kind {kind:?} takes no parameters")]
    UnexpectedParams { name: String, kind: AgentKind },
}

struct AgentBlueprint {
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Random(RandomOptions),
    Steady,
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::Random => {
                let options = RandomOptions::from_params(&config.name, &config.params)?;
                AgentImplementation::Random(options)
            }
            AgentKind::Steady => {
                if !is_empty_params(&config.params) {
                    return Err(AgentError::UnexpectedParams {
                        name: config.name.clone(),
                        kind: config.kind,
                    });
                }
                AgentImplementation::Steady
            }
        };

        Ok(Self { implementation })
    }

    fn spawn_policy(&self, match_seed: u64, seat: PlayerPosition) -> Box<dyn Policy> {
        match &self.implementation {
            AgentImplementation::Random(opts) => {
                Box::new(RandomPolicy::with_seed(opts.seed_for(match_seed, seat)))
            }
            AgentImplementation::Steady => Box::new(SteadyPolicy::new()),
        }
    }
}

fn is_empty_params(params: &serde_yaml::Value) -> bool {
    params.is_null() || params.as_mapping().is_some_and(|m| m.is_empty())
}

struct RandomOptions {
    seed: u64,
}

impl RandomOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        if params.is_null() {
            return Ok(Self { seed: 0 });
        }

        let mapping = params
            .as_mapping()
            .ok_or_else(|| AgentError::InvalidRandomParam {
                name: name.to_string(),
                message: "expected mapping for random params".to_string(),
            })?;

        let mut seed = 0;
        for (key, value) in mapping {
            match key.as_str() {
                Some("seed") => {
                    seed = value.as_u64().ok_or_else(|| AgentError::InvalidRandomParam {
                        name: name.to_string(),
                        message: "seed must be a non-negative integer".to_string(),
                    })?;
                }
                other => {
                    return Err(AgentError::InvalidRandomParam {
                        name: name.to_string(),
                        message: format!("unknown parameter {other:?}"),
                    });
                }
            }
        }

        Ok(Self { seed })
    }

    /// Distinct per match and per seat, stable for a given configuration.
    fn seed_for(&self, match_seed: u64, seat: PlayerPosition) -> u64 {
        match_seed
            .rotate_left(seat.index() as u32 * 16)
            .wrapping_add(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(yaml: &str) -> serde_yaml::Value {
        serde_yaml::from_str(yaml).expect("yaml")
    }

    #[test]
    fn random_params_accept_seed() {
        let opts = RandomOptions::from_params("r", &params("seed: 9")).expect("valid");
        assert_eq!(opts.seed, 9);
        let defaults = RandomOptions::from_params("r", &serde_yaml::Value::Null).expect("null");
        assert_eq!(defaults.seed, 0);
    }

    #[test]
    fn random_params_reject_unknown_keys() {
        let err = RandomOptions::from_params("r", &params("depth: 3")).err();
        assert!(matches!(err, Some(AgentError::InvalidRandomParam { .. })));
        let err = RandomOptions::from_params("r", &params("seed: -1")).err();
        assert!(matches!(err, Some(AgentError::InvalidRandomParam { .. })));
    }

    #[test]
    fn steady_rejects_params() {
        let config = AgentConfig {
            name: "s".to_string(),
            kind: AgentKind::Steady,
            params: params("depth: 3"),
        };
        assert!(matches!(
            AgentBlueprint::from_config(&config),
            Err(AgentError::UnexpectedParams { .. })
        ));
    }

    #[test]
    fn seats_follow_agent_order() {
        let yaml = r#"
run_id: "seating"
matches:
  seed: 3
  count: 1
agents:
  - { name: "a", kind: "steady" }
  - { name: "b", kind: "random" }
  - { name: "c", kind: "steady" }
  - { name: "d", kind: "random", params: { seed: 4 } }
outputs:
  jsonl: "out/deals.jsonl"
  summary_md: "out/summary.md"
"#;
        let mut config: BenchmarkConfig = serde_yaml::from_str(yaml).expect("config");
        config.validate().expect("valid");
        let outputs = config.resolved_outputs();
        let runner = MatchRunner::new(config, outputs).expect("runner");
        let seats = runner.build_seats(17);
        assert_eq!(
            seating_label(&seats),
            "north=steady east=random south=steady west=random"
        );
    }

    #[test]
    fn random_seeds_differ_per_seat() {
        let opts = RandomOptions { seed: 1 };
        let seeds: Vec<u64> = PlayerPosition::LOOP
            .iter()
            .map(|&seat| opts.seed_for(0xDEAD_BEEF, seat))
            .collect();
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
