use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{Level, event};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, ResolvedOutputs};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Owns the appender worker. Telemetry is flushed when this is dropped.
pub struct LoggingGuard {
    _worker: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Installs the JSON telemetry subscriber for a run, or nothing when
/// structured logging is off.
///
/// Engine, bot and harness events land in `telemetry.jsonl` in the summary's
/// directory. `RUST_LOG` wins over the configured level.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let (writer, worker, telemetry_path) = telemetry_writer(outputs)?;
    let fallback = logging.level().unwrap_or(Level::INFO);

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter_for(fallback))
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(writer)
        .try_init();
    if installed.is_err() {
        // Tests share one process; the first subscriber keeps receiving events.
        eprintln!("WARN: telemetry subscriber already installed");
    }

    event!(
        target: "giretra_bench::run",
        Level::INFO,
        run_id,
        telemetry = %telemetry_path.display(),
        "telemetry enabled"
    );

    Ok(Some(LoggingGuard {
        _worker: worker,
        telemetry_path,
    }))
}

fn telemetry_writer(outputs: &ResolvedOutputs) -> Result<(NonBlocking, WorkerGuard, PathBuf)> {
    let dir = outputs.artifact_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating artifact directory {}", dir.display()))?;

    let path = dir.join(TELEMETRY_FILE);
    let file =
        File::create(&path).with_context(|| format!("opening telemetry log {}", path.display()))?;
    let (writer, worker) = NonBlockingBuilder::default().lossy(false).finish(file);
    Ok((writer, worker, path))
}

fn filter_for(fallback: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn outputs_in(dir: &std::path::Path) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: dir.join("deals.jsonl"),
            summary_md: dir.join("nested").join("summary.md"),
        }
    }

    #[test]
    fn disabled_logging_installs_nothing() {
        let dir = tempdir().expect("temp dir");
        let guard = init_logging(&LoggingConfig::default(), &outputs_in(dir.path()), "off")
            .expect("init");
        assert!(guard.is_none());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn telemetry_file_sits_beside_summary() {
        let dir = tempdir().expect("temp dir");
        let (_writer, _worker, path) = telemetry_writer(&outputs_in(dir.path())).expect("writer");
        assert_eq!(path, dir.path().join("nested").join(TELEMETRY_FILE));
        assert!(path.exists());
    }
}
