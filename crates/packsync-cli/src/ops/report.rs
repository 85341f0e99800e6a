//! What a sync did, and how to print it.

use crossterm::style::Stylize;
use packsync_core::{CompletionStatus, ReconciliationTask};
use std::collections::BTreeMap;

/// A file whose task ended in an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub name: String,
    pub key: String,
    pub kind: &'static str,
    pub message: String,
}

impl Failure {
    pub fn from_task(task: &ReconciliationTask) -> Option<Self> {
        task.error().map(|err| Self {
            name: task.name().to_string(),
            key: task.key().to_string(),
            kind: err.kind(),
            message: err.to_string(),
        })
    }
}

/// An optional file the user may want to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalNotice {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
}

/// Outcome of one `sync` run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Nothing was checked because the pack had not changed.
    pub up_to_date: bool,
    pub statuses: BTreeMap<CompletionStatus, usize>,
    pub failures: Vec<Failure>,
    pub new_optional: Vec<OptionalNotice>,
    /// Files removed because the pack no longer lists them.
    pub stale_removed: usize,
    /// `--enable`/`--disable` names that matched no optional file.
    pub unmatched_options: Vec<String>,
}

impl SyncReport {
    pub fn up_to_date() -> Self {
        Self {
            up_to_date: true,
            ..Self::default()
        }
    }

    pub fn record(&mut self, task: &ReconciliationTask) {
        if let Some(failure) = Failure::from_task(task) {
            self.failures.push(failure);
        } else {
            *self.statuses.entry(task.completion_status()).or_default() += 1;
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn count(&self, status: CompletionStatus) -> usize {
        self.statuses.get(&status).copied().unwrap_or(0)
    }

    /// Print the report to stdout.
    pub fn print(&self, quiet: bool) {
        if self.up_to_date {
            if !quiet {
                println!("Pack is already up to date");
            }
            return;
        }

        if !quiet {
            for notice in &self.new_optional {
                let state = if notice.enabled {
                    "enabled".green()
                } else {
                    "disabled".dark_grey()
                };
                match &notice.description {
                    Some(desc) => println!("New optional file {} ({state}): {desc}", notice.name),
                    None => println!("New optional file {} ({state})", notice.name),
                }
            }
            for name in &self.unmatched_options {
                println!("{} no optional file named '{name}'", "warning:".yellow());
            }

            for status in CompletionStatus::ALL {
                let count = self.count(status);
                if count > 0 {
                    println!("{count:>5} {}", status.describe());
                }
            }
            if self.stale_removed > 0 {
                println!("{:>5} removed (no longer in pack)", self.stale_removed);
            }
        }

        if self.failures.is_empty() {
            if !quiet {
                println!("{}", "Finished successfully".green());
            }
            return;
        }

        eprintln!();
        eprintln!("{} {} file(s) failed:", "error:".red().bold(), self.failures.len());
        for failure in &self.failures {
            eprintln!("  {} [{}] {}", failure.name, failure.kind, failure.message);
        }
    }
}
