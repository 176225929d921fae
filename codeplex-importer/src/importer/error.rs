//! Import error types.

use crate::export::ExportError;
use thiserror::Error;

/// Errors that can occur while importing issues.
///
/// Target API errors are not retried; they propagate and abort the run.
/// Already-migrated issues and comments stay in place, so a rerun is safe.
#[derive(Debug, Error)]
pub enum ImportError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// Attachment copying failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}
