//! Export loading error types.

use thiserror::Error;

/// Errors that can occur while loading a CodePlex export from disk.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to read a file from the export.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The export data did not match the expected schema.
    ///
    /// Unknown and missing fields are both fatal; a schema mismatch aborts
    /// the run before any network call is made.
    #[error("Failed to parse '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Missing required file.
    #[error("Missing required file: {path}")]
    MissingFile { path: String },
}
