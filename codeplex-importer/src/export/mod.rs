//! CodePlex export loading.
//!
//! This module reads the static, file-based export of a CodePlex project:
//! an `issues.json` index at the export root plus one `<id>/<id>.json` file
//! per issue. Parsing is strict; a schema mismatch anywhere aborts the load.

mod error;
mod issue;

pub use error::ExportError;
pub use issue::{
    CodePlexCloseReason, CodePlexComment, CodePlexComponent, CodePlexFileAttachment, CodePlexIssue,
    CodePlexIssueReference, CodePlexPriority, CodePlexStatus, CodePlexWorkItem,
    CodePlexWorkItemType,
};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A fully loaded issue paired with the export directory it came from.
///
/// The directory is kept so attachments can be resolved relative to it.
#[derive(Debug, Clone)]
pub struct LoadedIssue {
    /// Directory containing this issue's JSON file and attachments.
    pub dir: PathBuf,
    /// The parsed issue record.
    pub issue: CodePlexIssue,
}

/// Loads all issues from an export directory.
///
/// The directory structure is:
/// ```text
/// export/
/// ├── issues.json
/// ├── 42/
/// │   ├── 42.json
/// │   └── leak-repro.zip
/// └── 43/
///     └── 43.json
/// ```
///
/// Issues are returned in the order listed by `issues.json`, fully
/// materialized before any migration work starts.
///
/// # Errors
///
/// Returns [`ExportError`] if the index is missing, any referenced issue
/// file is missing, or any record fails strict deserialization.
pub fn load_issues(export_path: &Path) -> Result<Vec<LoadedIssue>, ExportError> {
    info!(path = %export_path.display(), "Loading export");

    let index_path = export_path.join("issues.json");
    if !index_path.exists() {
        return Err(ExportError::MissingFile {
            path: index_path.display().to_string(),
        });
    }

    let references: Vec<CodePlexIssueReference> = read_json(&index_path)?;

    let mut issues = Vec::with_capacity(references.len());
    for reference in &references {
        let dir = export_path.join(reference.id.to_string());
        let issue_path = dir.join(format!("{}.json", reference.id));
        if !issue_path.exists() {
            return Err(ExportError::MissingFile {
                path: issue_path.display().to_string(),
            });
        }

        let issue: CodePlexIssue = read_json(&issue_path)?;
        debug!(id = issue.work_item.id, "Loaded issue");
        issues.push(LoadedIssue { dir, issue });
    }

    info!(count = issues.len(), "Loaded export");
    Ok(issues)
}

/// Copies an issue's file attachments into an `attachments/` directory next
/// to the issue JSON.
///
/// Files that already exist at the destination are left alone, so this is
/// safe to repeat across runs. Returns the number of files copied.
///
/// # Errors
///
/// Returns [`ExportError`] if a source file cannot be read or the output
/// directory cannot be created.
pub fn copy_attachments(loaded: &LoadedIssue) -> Result<usize, ExportError> {
    if loaded.issue.file_attachments.is_empty() {
        return Ok(0);
    }

    let output_dir = loaded.dir.join("attachments");
    std::fs::create_dir_all(&output_dir).map_err(|e| ExportError::IoError {
        path: output_dir.display().to_string(),
        source: e,
    })?;

    let mut copied = 0;
    for attachment in &loaded.issue.file_attachments {
        let source = loaded.dir.join(&attachment.download_url);
        let target = output_dir.join(&attachment.file_name);
        if target.exists() {
            continue;
        }

        std::fs::copy(&source, &target).map_err(|e| ExportError::IoError {
            path: source.display().to_string(),
            source: e,
        })?;
        copied += 1;
    }

    Ok(copied)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ExportError> {
    let data = std::fs::read_to_string(path).map_err(|e| ExportError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    serde_json::from_str(&data).map_err(|e| ExportError::JsonError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_issue(dir: &Path, id: i64, closed: bool) {
        let issue_dir = dir.join(id.to_string());
        fs::create_dir_all(&issue_dir).unwrap();
        let closed_date = if closed {
            r#""2009-05-07T10:00:00Z""#
        } else {
            "null"
        };
        fs::write(
            issue_dir.join(format!("{id}.json")),
            format!(
                r#"{{
                    "WorkItem": {{
                        "Id": {id},
                        "Type": {{ "Name": "Issue", "Id": 3 }},
                        "Summary": "Summary {id}",
                        "Description": "Description",
                        "Status": {{ "Name": "Open", "Id": 1 }},
                        "AffectedComponent": null,
                        "ClosedComment": null,
                        "ClosedDate": {closed_date},
                        "CommentCount": 0,
                        "Custom": null,
                        "LastUpdatedDate": "2009-05-07T10:00:00Z",
                        "PlannedForRelease": null,
                        "ReleaseVisibleToPublic": false,
                        "Priority": null,
                        "ProjectName": "quickgraph",
                        "ReportedDate": "2009-05-05T08:30:00Z",
                        "ReasonClosed": null,
                        "VoteCount": 0
                    }},
                    "FileAttachments": [],
                    "Comments": []
                }}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn load_issues_from_export() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("issues.json"), r#"[{"Id":42},{"Id":43}]"#).unwrap();
        write_issue(temp.path(), 42, true);
        write_issue(temp.path(), 43, false);

        let issues = load_issues(temp.path()).unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].issue.work_item.id, 42);
        assert!(issues[0].issue.work_item.closed_date.is_some());
        assert_eq!(issues[1].issue.work_item.id, 43);
        assert!(issues[1].issue.work_item.closed_date.is_none());
    }

    #[test]
    fn load_issues_missing_index() {
        let temp = TempDir::new().unwrap();
        let result = load_issues(temp.path());
        assert!(matches!(result, Err(ExportError::MissingFile { .. })));
    }

    #[test]
    fn load_issues_missing_issue_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("issues.json"), r#"[{"Id":7}]"#).unwrap();

        let result = load_issues(temp.path());
        assert!(matches!(result, Err(ExportError::MissingFile { .. })));
    }

    #[test]
    fn load_issues_rejects_unknown_fields() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("issues.json"),
            r#"[{"Id":7,"Title":"nope"}]"#,
        )
        .unwrap();

        let result = load_issues(temp.path());
        assert!(matches!(result, Err(ExportError::JsonError { .. })));
    }

    #[test]
    fn copy_attachments_skips_existing() {
        let temp = TempDir::new().unwrap();
        let issue_dir = temp.path().join("42");
        fs::create_dir_all(&issue_dir).unwrap();
        fs::write(issue_dir.join("repro.zip"), b"data").unwrap();

        let loaded = LoadedIssue {
            dir: issue_dir.clone(),
            issue: CodePlexIssue {
                work_item: minimal_work_item(),
                file_attachments: vec![CodePlexFileAttachment {
                    file_id: 1,
                    file_name: "repro.zip".to_string(),
                    download_url: "repro.zip".to_string(),
                }],
                comments: Vec::new(),
            },
        };

        assert_eq!(copy_attachments(&loaded).unwrap(), 1);
        assert!(issue_dir.join("attachments/repro.zip").exists());
        // Second run finds the file already in place.
        assert_eq!(copy_attachments(&loaded).unwrap(), 0);
    }

    fn minimal_work_item() -> CodePlexWorkItem {
        serde_json::from_str(
            r#"{
                "Id": 42,
                "Type": { "Name": "Issue", "Id": 3 },
                "Summary": "Leak",
                "Description": "d",
                "Status": { "Name": "Open", "Id": 1 },
                "AffectedComponent": null,
                "ClosedComment": null,
                "ClosedDate": null,
                "CommentCount": 0,
                "Custom": null,
                "LastUpdatedDate": "2009-05-07T10:00:00Z",
                "PlannedForRelease": null,
                "ReleaseVisibleToPublic": false,
                "Priority": null,
                "ProjectName": "quickgraph",
                "ReportedDate": "2009-05-05T08:30:00Z",
                "ReasonClosed": null,
                "VoteCount": 0
            }"#,
        )
        .unwrap()
    }
}
