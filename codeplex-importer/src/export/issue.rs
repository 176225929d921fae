//! On-disk CodePlex export records.
//!
//! These mirror the JSON schema of the CodePlex issue export. Every record is
//! parsed strictly (`deny_unknown_fields`) and is immutable after load.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An entry of the top-level `issues.json` index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexIssueReference {
    pub id: i64,
}

/// A single exported issue: work item, attachments and the ordered comment
/// timeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexIssue {
    pub work_item: CodePlexWorkItem,
    #[serde(default)]
    pub file_attachments: Vec<CodePlexFileAttachment>,
    #[serde(default)]
    pub comments: Vec<CodePlexComment>,
}

/// The work item record of an exported issue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexWorkItem {
    pub id: i64,
    #[serde(rename = "Type")]
    pub work_item_type: CodePlexWorkItemType,
    pub summary: String,
    pub description: String,
    pub status: CodePlexStatus,
    pub affected_component: Option<CodePlexComponent>,
    pub closed_comment: Option<String>,
    pub closed_date: Option<DateTime<Utc>>,
    pub comment_count: i64,
    pub custom: Option<String>,
    pub last_updated_date: DateTime<Utc>,
    pub planned_for_release: Option<String>,
    pub release_visible_to_public: bool,
    pub priority: Option<CodePlexPriority>,
    pub project_name: String,
    pub reported_date: DateTime<Utc>,
    pub reason_closed: Option<CodePlexCloseReason>,
    pub vote_count: i64,
}

/// A single comment on an exported issue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexComment {
    pub id: i64,
    pub posted_date: DateTime<Utc>,
    pub message: Option<String>,
}

impl CodePlexComment {
    /// Returns the comment text, treating an absent message as empty.
    #[must_use]
    pub fn message_text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexWorkItemType {
    pub name: String,
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexStatus {
    pub name: String,
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexComponent {
    pub name: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexPriority {
    pub name: String,
    pub severity: Option<i64>,
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexCloseReason {
    pub name: String,
    pub id: Option<i64>,
}

/// A file attached to an exported issue.
///
/// `download_url` is relative to the issue's directory inside the export.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CodePlexFileAttachment {
    pub file_id: i64,
    pub file_name: String,
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_issue() {
        let json = r#"{
            "WorkItem": {
                "Id": 42,
                "Type": { "Name": "Issue", "Id": 3 },
                "Summary": "Leak",
                "Description": "Memory leak in traversal",
                "Status": { "Name": "Closed", "Id": 2 },
                "AffectedComponent": { "Name": "Core", "DisplayName": "Core" },
                "ClosedComment": null,
                "ClosedDate": "2009-05-07T10:00:00Z",
                "CommentCount": 2,
                "Custom": null,
                "LastUpdatedDate": "2009-05-07T10:00:00Z",
                "PlannedForRelease": null,
                "ReleaseVisibleToPublic": false,
                "Priority": { "Name": "Low", "Severity": 50, "Id": 1 },
                "ProjectName": "quickgraph",
                "ReportedDate": "2009-05-05T08:30:00Z",
                "ReasonClosed": { "Name": "Fixed", "Id": null },
                "VoteCount": 1
            },
            "FileAttachments": [],
            "Comments": [
                { "Id": 1, "PostedDate": "2009-05-05T08:30:00Z", "Message": "initial" },
                { "Id": 2, "PostedDate": "2009-05-07T10:00:00Z", "Message": null }
            ]
        }"#;

        let issue: CodePlexIssue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.work_item.id, 42);
        assert_eq!(issue.work_item.summary, "Leak");
        assert!(issue.work_item.closed_date.is_some());
        assert_eq!(issue.comments.len(), 2);
        assert_eq!(issue.comments[0].message_text(), "initial");
        assert_eq!(issue.comments[1].message_text(), "");
    }

    #[test]
    fn unknown_field_is_fatal() {
        let json = r#"{ "Id": 7, "Unexpected": true }"#;
        let result: Result<CodePlexIssueReference, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn missing_field_is_fatal() {
        let json = r#"{ "Name": "Core" }"#;
        let result: Result<CodePlexPriority, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
