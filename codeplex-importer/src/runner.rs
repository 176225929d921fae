//! Orchestrates a full export-to-GitHub migration run.

use crate::export::{load_issues, ExportError, LoadedIssue};
use crate::importer::{import_issues, issue_title, ImportError};
use crate::labels::{
    component_label, distinct_components, distinct_priorities, priority_label, sync_labels,
    LabelError,
};
use crate::signature::{SignatureCodec, SignatureError};
use crate::summary::RunSummary;
use crate::throttle::RequestThrottler;
use octocrab::Octocrab;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default title prefix for migrated issues.
const DEFAULT_TITLE_PREFIX: &str = "CP";

/// Configuration for running the importer.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path to the CodePlex export directory.
    export_path: PathBuf,
    /// Target repository owner.
    owner: String,
    /// Target repository name.
    repo: String,
    /// GitHub token used for API calls.
    token: String,
    /// Prefix for derived issue titles.
    title_prefix: String,
    /// Whether to preview the migration without touching the target.
    dry_run: bool,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(export_path: PathBuf, owner: String, repo: String, token: String) -> Self {
        Self {
            export_path,
            owner,
            repo,
            token,
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            dry_run: false,
        }
    }

    /// Sets a custom title prefix.
    pub fn with_title_prefix(mut self, title_prefix: String) -> Self {
        self.title_prefix = title_prefix;
        self
    }

    /// Enables or disables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the export directory path.
    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Returns the target repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the target repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Returns the configured title prefix.
    pub fn title_prefix(&self) -> &str {
        &self.title_prefix
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Errors that can occur while running the importer.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Export loading errors.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// Signature template compilation errors.
    #[error(transparent)]
    Signature(#[from] SignatureError),
    /// Label synchronization errors.
    #[error(transparent)]
    Label(#[from] LabelError),
    /// Import errors.
    #[error(transparent)]
    Import(#[from] ImportError),
    /// GitHub API client errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),
}

/// Orchestrates a full migration run.
pub struct Runner {
    config: RunnerConfig,
    octocrab: Octocrab,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let octocrab = Octocrab::builder()
            .personal_token(config.token.clone())
            .build()?;
        Ok(Self { config, octocrab })
    }

    /// Executes the full migration flow.
    ///
    /// Loads the export, validates the target repository, synchronizes
    /// labels, then reconciles every issue and comment. Any API error aborts
    /// the run; already-migrated content stays in place and a rerun is safe.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new(self.config.dry_run);

        info!(path = %self.config.export_path.display(), "Loading export");
        let issues = load_issues(&self.config.export_path)?;

        if issues.is_empty() {
            warn!("No issues found in export");
            return Ok(summary);
        }

        info!(count = issues.len(), "Found issues");

        if self.config.dry_run {
            print_dry_run_preview(&self.config, &issues);
            return Ok(summary);
        }

        // Validate the target exists before creating anything.
        self.octocrab
            .repos(self.config.owner(), self.config.repo())
            .get()
            .await?;

        let mut throttler = RequestThrottler::new(self.octocrab.clone());
        let codec = SignatureCodec::new()?;

        // Labels must exist before any issue references them.
        let components = distinct_components(&issues);
        summary.labels_created += sync_labels(
            &self.octocrab,
            self.config.owner(),
            self.config.repo(),
            &mut throttler,
            &components,
            component_label,
        )
        .await?;

        let priorities = distinct_priorities(&issues);
        summary.labels_created += sync_labels(
            &self.octocrab,
            self.config.owner(),
            self.config.repo(),
            &mut throttler,
            &priorities,
            priority_label,
        )
        .await?;

        import_issues(
            &self.octocrab,
            self.config.owner(),
            self.config.repo(),
            self.config.title_prefix(),
            &mut throttler,
            &codec,
            &issues,
            &mut summary,
        )
        .await?;

        Ok(summary)
    }
}

fn print_dry_run_preview(config: &RunnerConfig, issues: &[LoadedIssue]) {
    println!(
        "\n[DRY RUN] Would migrate {} issues to {}/{}:\n",
        issues.len(),
        config.owner(),
        config.repo()
    );

    for (i, loaded) in issues.iter().enumerate() {
        let work_item = &loaded.issue.work_item;
        let title = issue_title(config.title_prefix(), work_item);
        println!("  [{}/{}] {}", i + 1, issues.len(), title);
        println!(
            "    {} comments, {} attachments{}",
            loaded.issue.comments.len(),
            loaded.issue.file_attachments.len(),
            if work_item.closed_date.is_some() {
                ", closed"
            } else {
                ""
            }
        );
    }

    println!();
}
