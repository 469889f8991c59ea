use std::path::PathBuf;

use clap::Parser;

use giretra_bench::config::{BenchmarkConfig, ResolvedOutputs};
use giretra_bench::logging::init_logging;
use giretra_bench::runner::MatchRunner;

/// Seeded self-play harness for Giretra policies.
#[derive(Debug, Parser)]
#[command(
    name = "giretra-bench",
    author,
    version,
    about = "Deterministic Giretra match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of matches to play.
    #[arg(long, value_name = "MATCHES")]
    matches: Option<usize>,

    /// Override the master RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the match target score.
    #[arg(long, value_name = "POINTS")]
    target_score: Option<u32>,

    /// Exit after validating the configuration (no matches are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(matches) = cli.matches {
        config.matches.count = matches;
    }

    if let Some(seed) = cli.seed {
        config.matches.seed = Some(seed);
    }

    if let Some(target_score) = cli.target_score {
        config.matches.target_score = target_score;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let matches = config.matches.count;
    let target = config.matches.target_score;

    println!(
        "Loaded configuration '{run_id}' ({matches} match{}, target {target})",
        if matches == 1 { "" } else { "es" }
    );

    let runner = MatchRunner::new(config.clone(), outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: match execution skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} matches, {} scored deals, {} redeals -> {} rows at {}",
        summary.matches_played,
        summary.deals_scored,
        summary.redeals,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
