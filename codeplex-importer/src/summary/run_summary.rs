//! Run summary types.

/// Counters for a complete migration run.
///
/// Errors abort the run, so the summary only ever describes successful work.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of source issues walked.
    pub issues_processed: usize,

    /// Issues created on the target this run.
    pub issues_created: usize,

    /// Issues recognized by title and reused untouched.
    pub issues_reused: usize,

    /// Comments created on the target this run.
    pub comments_created: usize,

    /// Comments skipped because their timestamp was already migrated.
    pub comments_skipped: usize,

    /// Blank comments suppressed at non-closing timestamps.
    pub comments_suppressed: usize,

    /// Close transitions issued.
    pub close_transitions: usize,

    /// Labels created during synchronization.
    pub labels_created: usize,

    /// Attachment files copied to the output directory.
    pub attachments_copied: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Returns true if the run changed nothing on the target.
    ///
    /// A rerun over an already-migrated export ends up here.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.issues_created == 0
            && self.comments_created == 0
            && self.close_transitions == 0
            && self.labels_created == 0
    }
}
