//! Signature codec error types.

use thiserror::Error;

/// Errors that can occur while compiling a signature template.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The matcher derived from the template is not a valid pattern.
    ///
    /// This can only happen with a custom template whose placeholder names
    /// are not valid capture group names.
    #[error("Failed to compile signature matcher: {0}")]
    Pattern(#[from] regex::Error),
}
