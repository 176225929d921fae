//! Idempotent issue reconciliation against the target repository.
//!
//! For every source issue the engine decides create-vs-reuse by derived
//! title; for every comment it decides create-vs-skip by the timestamp
//! recovered from the migration signature. State transitions (closing) fire
//! at most once per issue, ever, across reruns.

mod error;
mod plan;

pub use error::ImportError;
pub use plan::{plan_comments, CommentPlan, CommentPost};

use crate::export::{self, CodePlexWorkItem, LoadedIssue};
use crate::signature::{MigrationSignature, SignatureCodec};
use crate::summary::RunSummary;
use crate::throttle::RequestThrottler;
use chrono::{DateTime, Utc};
use octocrab::models::IssueState;
use octocrab::{params, Octocrab};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, info_span, Instrument};

/// An issue already present on the target, indexed by title.
#[derive(Debug, Clone)]
struct ExistingIssue {
    number: u64,
    closed: bool,
}

/// A resolved target issue for one source issue.
struct ResolvedIssue {
    number: u64,
    /// Whether the target issue is closed before comment processing starts.
    closed: bool,
}

/// Derives the canonical target title for a work item.
///
/// Format: `"<prefix>-<id>: <summary>"`. Identifiers are unique in the
/// export, so titles are unique on the target.
#[must_use]
pub fn issue_title(prefix: &str, work_item: &CodePlexWorkItem) -> String {
    format!("{prefix}-{}: {}", work_item.id, work_item.summary)
}

/// Migrates all loaded issues into the target repository.
///
/// Fetches a snapshot of all target issues once, then walks the source
/// issues sequentially: resolve-or-create the issue, copy its attachments,
/// then reconcile its comment timeline. Every API call goes through the
/// throttler.
///
/// # Errors
///
/// Returns [`ImportError`] on the first API or attachment failure; work
/// already done stays in place and a rerun picks up where this one stopped.
#[allow(clippy::too_many_arguments)]
pub async fn import_issues(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    title_prefix: &str,
    throttler: &mut RequestThrottler,
    codec: &SignatureCodec,
    issues: &[LoadedIssue],
    summary: &mut RunSummary,
) -> Result<(), ImportError> {
    let existing = list_existing_issues(octocrab, owner, repo, throttler).await?;
    info!(count = existing.len(), "Fetched existing target issues");

    for loaded in issues {
        let work_item = &loaded.issue.work_item;
        let span = info_span!("import_issue", id = work_item.id);

        async {
            summary.issues_processed += 1;

            let resolved = resolve_issue(
                octocrab,
                owner,
                repo,
                title_prefix,
                throttler,
                codec,
                loaded,
                &existing,
                summary,
            )
            .await?;

            summary.attachments_copied += export::copy_attachments(loaded)?;

            if !loaded.issue.comments.is_empty() {
                reconcile_comments(
                    octocrab, owner, repo, throttler, codec, loaded, &resolved, summary,
                )
                .await?;
            }

            Ok::<(), ImportError>(())
        }
        .instrument(span)
        .await?;
    }

    Ok(())
}

/// Finds the target issue by title, creating it if it does not exist.
///
/// A reused issue is never mutated here; that is what makes issue-level
/// creation idempotent.
#[allow(clippy::too_many_arguments)]
async fn resolve_issue(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    title_prefix: &str,
    throttler: &mut RequestThrottler,
    codec: &SignatureCodec,
    loaded: &LoadedIssue,
    existing: &HashMap<String, ExistingIssue>,
    summary: &mut RunSummary,
) -> Result<ResolvedIssue, ImportError> {
    let work_item = &loaded.issue.work_item;
    let title = issue_title(title_prefix, work_item);

    if let Some(found) = existing.get(&title) {
        info!(number = found.number, title = %title, "Reusing existing issue");
        summary.issues_reused += 1;
        return Ok(ResolvedIssue {
            number: found.number,
            closed: found.closed,
        });
    }

    let signature = MigrationSignature::new("", work_item.reported_date);
    let body = codec.prepend(&signature, &work_item.description);
    let labels = initial_labels(work_item);

    throttler.throttle().await?;
    let issues = octocrab.issues(owner, repo);
    let mut builder = issues.create(title.as_str()).body(body.as_str());
    if !labels.is_empty() {
        builder = builder.labels(labels);
    }
    let issue = builder.send().await?;
    throttler.record_request_sent();

    info!(number = issue.number, title = %title, "Created issue");
    summary.issues_created += 1;

    Ok(ResolvedIssue {
        number: issue.number,
        closed: false,
    })
}

/// Initial label set from the optional component and priority names.
fn initial_labels(work_item: &CodePlexWorkItem) -> Vec<String> {
    let mut labels = Vec::new();

    if let Some(component) = &work_item.affected_component {
        if !component.name.is_empty() {
            labels.push(format!("component:{}", component.name));
        }
    }

    if let Some(priority) = &work_item.priority {
        if !priority.name.is_empty() {
            labels.push(format!("priority:{}", priority.name));
        }
    }

    labels
}

/// Reconciles one issue's comment timeline against the target.
#[allow(clippy::too_many_arguments)]
async fn reconcile_comments(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    throttler: &mut RequestThrottler,
    codec: &SignatureCodec,
    loaded: &LoadedIssue,
    resolved: &ResolvedIssue,
    summary: &mut RunSummary,
) -> Result<(), ImportError> {
    let migrated = list_migrated_timestamps(octocrab, owner, repo, resolved.number, throttler, codec)
        .await?;

    let plan = plan_comments(
        &loaded.issue.comments,
        loaded.issue.work_item.closed_date,
        resolved.closed,
        &migrated,
    );
    summary.comments_skipped += plan.skipped;
    summary.comments_suppressed += plan.suppressed;

    for post in &plan.posts {
        let comment = &loaded.issue.comments[post.index];
        let signature = MigrationSignature::new("", comment.posted_date);
        let body = codec.prepend(&signature, comment.message_text());

        info!(posted = %signature.timestamp, "Creating comment");
        throttler.throttle().await?;
        octocrab
            .issues(owner, repo)
            .create_comment(resolved.number, body)
            .await?;
        throttler.record_request_sent();
        summary.comments_created += 1;

        if post.close_after {
            close_issue(octocrab, owner, repo, resolved.number, throttler).await?;
            summary.close_transitions += 1;
        }
    }

    if plan.force_close {
        close_issue(octocrab, owner, repo, resolved.number, throttler).await?;
        summary.close_transitions += 1;
    }

    Ok(())
}

/// Collects the signature timestamps of comments already on the target.
///
/// Comments without a parseable signature are organic (human-authored) and
/// are simply ignored.
async fn list_migrated_timestamps(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    number: u64,
    throttler: &mut RequestThrottler,
    codec: &SignatureCodec,
) -> Result<HashSet<DateTime<Utc>>, ImportError> {
    throttler.throttle().await?;
    let mut page = octocrab
        .issues(owner, repo)
        .list_comments(number)
        .per_page(100)
        .send()
        .await?;
    throttler.record_request_sent();

    let mut timestamps = HashSet::new();
    loop {
        for comment in &page.items {
            let body = comment.body.as_deref().unwrap_or("");
            if let Some(signature) = codec.parse(body) {
                timestamps.insert(signature.timestamp);
            }
        }

        if page.next.is_none() {
            break;
        }

        throttler.throttle().await?;
        let next_page = octocrab
            .get_page::<octocrab::models::issues::Comment>(&page.next)
            .await?;
        throttler.record_request_sent();

        match next_page {
            Some(next_page) => page = next_page,
            None => break,
        }
    }

    debug!(count = timestamps.len(), "Indexed migrated comments");
    Ok(timestamps)
}

/// Fetches a snapshot of all issues on the target (any state), indexed by
/// exact title. Pull requests are excluded. The first issue wins on a title
/// collision.
async fn list_existing_issues(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    throttler: &mut RequestThrottler,
) -> Result<HashMap<String, ExistingIssue>, ImportError> {
    throttler.throttle().await?;
    let mut page = octocrab
        .issues(owner, repo)
        .list()
        .state(params::State::All)
        .per_page(100)
        .send()
        .await?;
    throttler.record_request_sent();

    let mut existing = HashMap::new();
    loop {
        for issue in &page.items {
            if issue.pull_request.is_some() {
                continue;
            }
            existing
                .entry(issue.title.clone())
                .or_insert_with(|| ExistingIssue {
                    number: issue.number,
                    closed: issue.closed_at.is_some(),
                });
        }

        if page.next.is_none() {
            break;
        }

        throttler.throttle().await?;
        let next_page = octocrab
            .get_page::<octocrab::models::issues::Issue>(&page.next)
            .await?;
        throttler.record_request_sent();

        match next_page {
            Some(next_page) => page = next_page,
            None => break,
        }
    }

    Ok(existing)
}

/// Transitions the target issue to closed.
async fn close_issue(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    number: u64,
    throttler: &mut RequestThrottler,
) -> Result<(), ImportError> {
    info!(number, "Closing issue");
    throttler.throttle().await?;
    octocrab
        .issues(owner, repo)
        .update(number)
        .state(IssueState::Closed)
        .send()
        .await?;
    throttler.record_request_sent();
    Ok(())
}
