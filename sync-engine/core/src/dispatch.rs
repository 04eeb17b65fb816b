//! Sequential fan-out of one source schema over a list of targets.

use crate::config::DispatchConfig;
use std::fmt;
use std::time::{Duration, Instant};

/// How a single target run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    InSync,
    Differences,
    Failed(String),
    /// Not run, because an earlier target failed and the dispatch is
    /// configured to abort.
    Skipped,
}

impl RunStatus {
    fn as_str(&self) -> &'static str {
        match self {
            RunStatus::InSync => "in sync",
            RunStatus::Differences => "out of sync",
            RunStatus::Failed(_) => "FAILED",
            RunStatus::Skipped => "skipped",
        }
    }
}

/// Runs one source → target comparison.
#[async_trait::async_trait]
pub trait SyncRunner: Send + Sync {
    async fn run(&self, source_url: &str, target_url: &str) -> RunStatus;
}

#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub target_url: String,
    pub status: RunStatus,
    pub duration: Duration,
}

/// Run every target of the config against the source, in order, one at a
/// time. Each target gets the same source and the same runner settings.
pub async fn dispatch(config: &DispatchConfig, runner: &dyn SyncRunner) -> DispatchReport {
    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(config.targets.len());
    let mut abort = false;

    for target_url in &config.targets {
        if abort {
            outcomes.push(TargetOutcome {
                target_url: target_url.clone(),
                status: RunStatus::Skipped,
                duration: Duration::ZERO,
            });
            continue;
        }

        tracing::info!("syncing {} -> {}", config.source_url, target_url);

        let run_started = Instant::now();
        let status = runner.run(&config.source_url, target_url).await;
        let duration = run_started.elapsed();

        if let RunStatus::Failed(error) = &status {
            tracing::error!("sync of {target_url} failed: {error}");

            if config.abort_on_failure {
                abort = true;
            }
        }

        outcomes.push(TargetOutcome {
            target_url: target_url.clone(),
            status,
            duration,
        });
    }

    DispatchReport {
        outcomes,
        total_duration: started.elapsed(),
    }
}

/// Per-target outcomes of a dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub outcomes: Vec<TargetOutcome>,
    pub total_duration: Duration,
}

impl DispatchReport {
    pub fn in_sync(&self) -> usize {
        self.count(|status| matches!(status, RunStatus::InSync))
    }

    pub fn differences(&self) -> usize {
        self.count(|status| matches!(status, RunStatus::Differences))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, RunStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, RunStatus::Skipped))
    }

    fn count(&self, predicate: impl Fn(&RunStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(&outcome.status)).count()
    }

    /// 0 when every target was in sync, 2 when scripts were written for some
    /// target, 1 when any target failed or was skipped.
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 || self.skipped() > 0 {
            1
        } else if self.differences() > 0 {
            2
        } else {
            0
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 60 {
        format!("{}m {}s", duration.as_secs() / 60, duration.as_secs() % 60)
    } else if duration.as_millis() >= 1000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bar = "=".repeat(72);

        writeln!(f, "\n{bar}")?;
        writeln!(f, "  SCHEMA SYNC DISPATCH")?;
        writeln!(f, "{bar}\n")?;

        if self.outcomes.is_empty() {
            writeln!(f, "  (no targets)")?;
        } else {
            writeln!(f, "  {:<4} {:<44} {:<12} {}", "#", "TARGET", "STATUS", "DURATION")?;

            for (i, outcome) in self.outcomes.iter().enumerate() {
                writeln!(
                    f,
                    "  {:<4} {:<44} {:<12} {}",
                    i + 1,
                    outcome.target_url,
                    outcome.status.as_str(),
                    format_duration(outcome.duration),
                )?;

                if let RunStatus::Failed(error) = &outcome.status {
                    writeln!(f, "       -> {error}")?;
                }
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "  {} in sync, {} out of sync, {} failed, {} skipped in {}",
            self.in_sync(),
            self.differences(),
            self.failed(),
            self.skipped(),
            format_duration(self.total_duration),
        )?;
        writeln!(f, "{bar}")?;

        Ok(())
    }
}
