#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod export;
pub mod importer;
pub mod labels;
pub mod runner;
pub mod signature;
pub mod summary;
pub mod throttle;

pub use export::{
    load_issues, CodePlexComment, CodePlexIssue, CodePlexWorkItem, ExportError, LoadedIssue,
};
pub use importer::{import_issues, issue_title, plan_comments, CommentPlan, ImportError};
pub use labels::{
    component_label, distinct_components, distinct_priorities, priority_label, sync_labels,
    LabelError, LabelSpec,
};
pub use runner::{Runner, RunnerConfig, RunnerError};
pub use signature::{truncate_to_seconds, MigrationSignature, SignatureCodec, SignatureError};
pub use summary::RunSummary;
pub use throttle::{RequestThrottler, ThrottleState};
