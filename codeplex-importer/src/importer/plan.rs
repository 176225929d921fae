//! Pure reconciliation rules for a single issue's comment timeline.
//!
//! The planner decides, without touching the network, what the engine should
//! do for each source comment: post it, skip it because it was already
//! migrated, or suppress it because it is blank. It also decides when the
//! close transition fires. Keeping this pure makes the close-once and
//! blank-comment rules testable without a client.

use crate::export::CodePlexComment;
use crate::signature::truncate_to_seconds;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A comment the engine should post, by index into the source sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPost {
    /// Index into the source comment sequence.
    pub index: usize,
    /// Whether the issue must be closed right after posting this comment.
    pub close_after: bool,
}

/// The planned actions for one issue's comment timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentPlan {
    /// Comments to post, in source order.
    pub posts: Vec<CommentPost>,
    /// Comments skipped because their timestamp is already on the target.
    pub skipped: usize,
    /// Blank comments suppressed at non-closing timestamps.
    pub suppressed: usize,
    /// Close after the loop: the source records a closed timestamp but no
    /// comment fired the transition (closing comment filtered or absent).
    pub force_close: bool,
}

/// Plans the per-comment actions for one issue.
///
/// Timestamps are compared at whole-second precision throughout. A comment
/// whose timestamp is already in `migrated` is skipped entirely, including
/// its close detection; a rerun relies on `initially_closed` (and the
/// fallback guard) to avoid re-firing the transition.
///
/// Blank comments are suppressed unless they coincide with the close moment
/// while the issue is still open; then an empty comment is posted anyway to
/// carry the state transition.
#[must_use]
pub fn plan_comments(
    comments: &[CodePlexComment],
    closed_date: Option<DateTime<Utc>>,
    initially_closed: bool,
    migrated: &HashSet<DateTime<Utc>>,
) -> CommentPlan {
    let closed_at = closed_date.map(truncate_to_seconds);
    let mut was_closed = initially_closed;
    let mut plan = CommentPlan::default();

    for (index, comment) in comments.iter().enumerate() {
        let posted = truncate_to_seconds(comment.posted_date);
        if migrated.contains(&posted) {
            plan.skipped += 1;
            continue;
        }

        let is_empty = comment.message_text().trim().is_empty();
        let is_closing = closed_at == Some(posted);
        let close_after = !was_closed && is_closing;

        if !is_empty || close_after {
            plan.posts.push(CommentPost { index, close_after });
        } else {
            plan.suppressed += 1;
        }

        if close_after {
            was_closed = true;
        }
    }

    plan.force_close = !was_closed && closed_at.is_some();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2009, 5, 5, 8, 30, secs).unwrap()
    }

    fn comment(id: i64, posted: DateTime<Utc>, message: &str) -> CodePlexComment {
        CodePlexComment {
            id,
            posted_date: posted,
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn posts_all_comments_on_empty_target() {
        let comments = vec![comment(1, at(0), "first"), comment(2, at(10), "second")];

        let plan = plan_comments(&comments, None, false, &HashSet::new());

        assert_eq!(plan.posts.len(), 2);
        assert!(plan.posts.iter().all(|p| !p.close_after));
        assert!(!plan.force_close);
    }

    #[test]
    fn skips_already_migrated_timestamps() {
        let comments = vec![comment(1, at(0), "first"), comment(2, at(10), "second")];
        let migrated: HashSet<_> = [at(0)].into_iter().collect();

        let plan = plan_comments(&comments, None, false, &migrated);

        assert_eq!(plan.skipped, 1);
        assert_eq!(plan.posts, vec![CommentPost {
            index: 1,
            close_after: false
        }]);
    }

    #[test]
    fn blank_comment_at_non_closing_moment_is_suppressed() {
        let comments = vec![comment(1, at(0), "  \t\n"), comment(2, at(10), "real")];

        let plan = plan_comments(&comments, Some(at(10)), false, &HashSet::new());

        assert_eq!(plan.suppressed, 1);
        assert_eq!(plan.posts.len(), 1);
        assert_eq!(plan.posts[0].index, 1);
        assert!(plan.posts[0].close_after);
    }

    #[test]
    fn blank_closing_comment_is_posted_to_carry_the_transition() {
        let comments = vec![comment(1, at(0), "initial"), comment(2, at(20), "")];

        let plan = plan_comments(&comments, Some(at(20)), false, &HashSet::new());

        assert_eq!(plan.posts.len(), 2);
        assert!(!plan.posts[0].close_after);
        assert!(plan.posts[1].close_after);
        assert!(!plan.force_close);
        assert_eq!(plan.suppressed, 0);
    }

    #[test]
    fn close_fires_exactly_once_across_repeated_closing_timestamps() {
        let comments = vec![
            comment(1, at(20), "closing"),
            comment(2, at(20), "also at the closing moment"),
            comment(3, at(20), ""),
        ];

        let plan = plan_comments(&comments, Some(at(20)), false, &HashSet::new());

        let closes: usize = plan.posts.iter().filter(|p| p.close_after).count();
        assert_eq!(closes, 1);
        assert!(plan.posts[0].close_after);
        // The blank comment at the closing moment is suppressed once the
        // transition has fired.
        assert_eq!(plan.posts.len(), 2);
        assert!(!plan.force_close);
    }

    #[test]
    fn already_closed_issue_never_closes_again() {
        let comments = vec![comment(1, at(20), "closing")];

        let plan = plan_comments(&comments, Some(at(20)), true, &HashSet::new());

        assert_eq!(plan.posts.len(), 1);
        assert!(!plan.posts[0].close_after);
        assert!(!plan.force_close);
    }

    #[test]
    fn force_close_when_closing_comment_matches_nothing() {
        let comments = vec![comment(1, at(0), "only comment")];

        let plan = plan_comments(&comments, Some(at(30)), false, &HashSet::new());

        assert!(plan.force_close);
    }

    #[test]
    fn rerun_produces_no_posts_and_no_closes() {
        let comments = vec![comment(1, at(0), "initial"), comment(2, at(20), "")];
        let migrated: HashSet<_> = [at(0), at(20)].into_iter().collect();

        let plan = plan_comments(&comments, Some(at(20)), true, &migrated);

        assert!(plan.posts.is_empty());
        assert_eq!(plan.skipped, 2);
        assert!(!plan.force_close);
    }

    #[test]
    fn sub_second_closing_timestamp_still_matches() {
        let closing = at(20) + chrono::Duration::milliseconds(321);
        let comments = vec![comment(1, at(20), "closing")];

        let plan = plan_comments(&comments, Some(closing), false, &HashSet::new());

        assert!(plan.posts[0].close_after);
        assert!(!plan.force_close);
    }
}
