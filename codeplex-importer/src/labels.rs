//! GitHub label synchronization.
//!
//! Component and priority labels referenced by migrated issues must exist
//! before the first issue is created; referencing a missing label is a
//! target-side error. Synchronization is keyed by exact, case-sensitive
//! label name and creates each missing label exactly once.

use crate::export::{CodePlexComponent, CodePlexPriority, LoadedIssue};
use crate::throttle::RequestThrottler;
use octocrab::Octocrab;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during label synchronization.
#[derive(Debug, Error)]
pub enum LabelError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),
}

/// A label to ensure on the target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub color: String,
}

/// Color for all `component:` labels.
const COMPONENT_COLOR: &str = "f6d612";

/// Color for priority names outside the known set.
const FALLBACK_PRIORITY_COLOR: &str = "ededed";

/// Converts an affected component into its label.
#[must_use]
pub fn component_label(component: &CodePlexComponent) -> LabelSpec {
    LabelSpec {
        name: format!("component:{}", component.name),
        color: COMPONENT_COLOR.to_string(),
    }
}

/// Converts a priority into its label.
#[must_use]
pub fn priority_label(priority: &CodePlexPriority) -> LabelSpec {
    LabelSpec {
        name: format!("priority:{}", priority.name),
        color: priority_color(&priority.name).to_string(),
    }
}

fn priority_color(name: &str) -> &'static str {
    match name {
        "High" => "ff3c00",
        "Medium" => "f97923",
        "Low" => "ff9900",
        "Unassigned" => "0000c0",
        _ => FALLBACK_PRIORITY_COLOR,
    }
}

/// Collects the distinct affected components across all loaded issues,
/// keyed by component name. Components with empty names are skipped.
#[must_use]
pub fn distinct_components(issues: &[LoadedIssue]) -> Vec<CodePlexComponent> {
    let mut seen = HashSet::new();
    let mut components = Vec::new();
    for loaded in issues {
        if let Some(component) = &loaded.issue.work_item.affected_component {
            if !component.name.is_empty() && seen.insert(component.name.clone()) {
                components.push(component.clone());
            }
        }
    }
    components
}

/// Collects the distinct priorities across all loaded issues, keyed by
/// priority id. Priorities with empty names are skipped.
#[must_use]
pub fn distinct_priorities(issues: &[LoadedIssue]) -> Vec<CodePlexPriority> {
    let mut seen = HashSet::new();
    let mut priorities = Vec::new();
    for loaded in issues {
        if let Some(priority) = &loaded.issue.work_item.priority {
            if !priority.name.is_empty() && seen.insert(priority.id) {
                priorities.push(priority.clone());
            }
        }
    }
    priorities
}

/// Ensures every label produced by `to_label` exists on the repository.
///
/// Lists the repository's labels once, then creates only the missing ones
/// through the throttled channel. Already-existing names (exact match) cost
/// zero create calls. Returns the number of labels created.
///
/// # Errors
///
/// Returns [`LabelError`] if listing or creating labels fails.
pub async fn sync_labels<T>(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    throttler: &mut RequestThrottler,
    items: &[T],
    to_label: impl Fn(&T) -> LabelSpec,
) -> Result<usize, LabelError> {
    let existing = list_label_names(octocrab, owner, repo, throttler).await?;
    let missing = missing_labels(&existing, items, to_label);
    let created = missing.len();

    for label in missing {
        throttler.throttle().await?;
        octocrab
            .issues(owner, repo)
            .create_label(label.name.as_str(), label.color.as_str(), "")
            .await?;
        throttler.record_request_sent();

        info!(name = %label.name, color = %label.color, "Created label");
    }

    Ok(created)
}

/// Decides which labels actually need a create call.
///
/// A name already on the repository (exact match) costs zero create calls;
/// duplicate names within the batch collapse to one.
fn missing_labels<T>(
    existing: &HashSet<String>,
    items: &[T],
    to_label: impl Fn(&T) -> LabelSpec,
) -> Vec<LabelSpec> {
    let mut requested = HashSet::new();
    let mut missing = Vec::new();

    for item in items {
        let label = to_label(item);
        if existing.contains(&label.name) {
            debug!(name = %label.name, "Label already exists");
            continue;
        }
        if requested.insert(label.name.clone()) {
            missing.push(label);
        }
    }

    missing
}

/// Fetches all label names currently on the repository, paginated.
///
/// Every page fetch, follow-ups included, goes through the throttler.
async fn list_label_names(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    throttler: &mut RequestThrottler,
) -> Result<HashSet<String>, LabelError> {
    throttler.throttle().await?;
    let mut page = octocrab
        .issues(owner, repo)
        .list_labels_for_repo()
        .per_page(100)
        .send()
        .await?;
    throttler.record_request_sent();

    let mut names = HashSet::new();
    loop {
        names.extend(page.items.iter().map(|label| label.name.clone()));

        if page.next.is_none() {
            break;
        }

        throttler.throttle().await?;
        let next_page = octocrab
            .get_page::<octocrab::models::Label>(&page.next)
            .await?;
        throttler.record_request_sent();

        match next_page {
            Some(next_page) => page = next_page,
            None => break,
        }
    }

    Ok(names)
}
