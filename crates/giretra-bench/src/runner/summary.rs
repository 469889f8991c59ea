use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use giretra_core::AppInfo;
use giretra_core::model::mode::GameMode;
use giretra_core::model::player::Team;

use super::ScoredDeal;
use crate::config::BenchmarkConfig;

/// Everything the summary needs from one finished match.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub winner: Team,
    pub final_scores: [u32; 2],
    pub redeals: u32,
    pub deals: Vec<ScoredDeal>,
}

#[derive(Debug, Default, Clone, Copy)]
struct ModeTally {
    deals: usize,
    announcer_wins: usize,
    doubled: usize,
    redoubled: usize,
}

/// Aggregates match outcomes into the Markdown report.
pub struct SummaryCollector {
    run_id: String,
    team_agents: [String; 2],
    matches: usize,
    match_wins: [usize; 2],
    match_points: [u64; 2],
    deals: usize,
    redeals: u32,
    sweeps: usize,
    instant_wins: usize,
    announcer_wins: usize,
    modes: [ModeTally; 6],
}

impl SummaryCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let team_agents = Team::BOTH.map(|team| {
            team.seats()
                .iter()
                .filter_map(|seat| config.agents.get(seat.index()))
                .map(|agent| agent.name.as_str())
                .collect::<Vec<_>>()
                .join(" + ")
        });

        Self {
            run_id: config.run_id.clone(),
            team_agents,
            matches: 0,
            match_wins: [0; 2],
            match_points: [0; 2],
            deals: 0,
            redeals: 0,
            sweeps: 0,
            instant_wins: 0,
            announcer_wins: 0,
            modes: [ModeTally::default(); 6],
        }
    }

    pub fn record_match(&mut self, outcome: &MatchOutcome) {
        self.matches += 1;
        self.match_wins[outcome.winner.index()] += 1;
        self.redeals += outcome.redeals;
        for team in Team::BOTH {
            self.match_points[team.index()] += u64::from(outcome.final_scores[team.index()]);
        }

        for deal in &outcome.deals {
            let result = &deal.result;
            self.deals += 1;
            if result.is_sweep() {
                self.sweeps += 1;
            }
            if result.instant_win {
                self.instant_wins += 1;
            }
            let tally = &mut self.modes[result.mode as usize];
            tally.deals += 1;
            if result.announcer_won() {
                self.announcer_wins += 1;
                tally.announcer_wins += 1;
            }
            match result.multiplier.factor() {
                2 => tally.doubled += 1,
                4 => tally.redoubled += 1,
                _ => {}
            }
        }
    }

    pub fn deals_scored(&self) -> usize {
        self.deals
    }

    pub fn redeals(&self) -> u32 {
        self.redeals
    }

    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Match Summary: {}\n", self.run_id);
        let _ = writeln!(out, "Engine: {} {}\n", AppInfo::name(), AppInfo::version());
        let _ = writeln!(
            out,
            "Matches: {} | Scored deals: {} | Redeals: {} | Sweeps: {} | Instant wins: {}\n",
            self.matches, self.deals, self.redeals, self.sweeps, self.instant_wins
        );

        out.push_str("| Team | Agents | Match wins | Win % | Avg final score |\n");
        out.push_str("|------|--------|------------|-------|-----------------|\n");
        for team in Team::BOTH {
            let i = team.index();
            let _ = writeln!(
                out,
                "| {team} | {agents} | {wins} | {rate:.1}% | {avg:.1} |",
                agents = self.team_agents[i],
                wins = self.match_wins[i],
                rate = percent(self.match_wins[i], self.matches),
                avg = ratio(self.match_points[i] as f64, self.matches),
            );
        }

        let _ = writeln!(
            out,
            "\nAnnouncer success: {:.1}% of scored deals\n",
            percent(self.announcer_wins, self.deals)
        );

        out.push_str("| Mode | Deals | Announcer % | Doubled | Redoubled |\n");
        out.push_str("|------|-------|-------------|---------|-----------|\n");
        for mode in GameMode::ALL {
            let tally = &self.modes[mode as usize];
            let _ = writeln!(
                out,
                "| {mode} | {deals} | {rate:.1}% | {doubled} | {redoubled} |",
                deals = tally.deals,
                rate = percent(tally.announcer_wins, tally.deals),
                doubled = tally.doubled,
                redoubled = tally.redoubled,
            );
        }

        out
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.render_markdown())
    }
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

fn percent(hits: usize, count: usize) -> f64 {
    ratio(hits as f64, count) * 100.0
}
