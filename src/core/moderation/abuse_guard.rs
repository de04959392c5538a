// Abuse guard - posting cadence and backlog limits.
//
// Runs before any approval judgment. Each check is a hard stop; the first
// failing check decides the violation.

use super::moderation_models::{count_with_status, pending_posts, CommentRecord, CommentStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Minimum time between two comments from the same user.
pub const COOLDOWN_MS: i64 = 30_000;
/// Pending comments allowed on a single post.
pub const MAX_PENDING_PER_POST: usize = 5;
/// Distinct posts a user may have pending comments on.
pub const MAX_PENDING_POSTS: usize = 10;
/// Rejected comments before the user is locked out.
pub const MAX_REJECTED: usize = 5;

/// Why the guard refused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("You are commenting too frequently, please wait a moment")]
    TooFrequent,

    #[error("Too many comments on this post are awaiting moderation")]
    TooManyPendingForPost,

    #[error("Too many posts have your comments awaiting moderation")]
    TooManyPendingPosts,

    #[error("Too many of your comments have been rejected")]
    TooManyRejected,
}

/// Check a user's history before accepting a new comment on `post_id`.
///
/// `history` must be ordered newest first.
pub fn check(
    history: &[CommentRecord],
    post_id: &str,
    now: DateTime<Utc>,
) -> Result<(), GuardViolation> {
    if let Some(latest) = history.first() {
        let elapsed = now.signed_duration_since(latest.created_at);
        if elapsed.num_milliseconds() < COOLDOWN_MS {
            return Err(GuardViolation::TooFrequent);
        }
    }

    let pending_here = history
        .iter()
        .filter(|c| c.status == CommentStatus::Pending && c.post_id == post_id)
        .count();
    if pending_here >= MAX_PENDING_PER_POST {
        return Err(GuardViolation::TooManyPendingForPost);
    }

    if pending_posts(history).len() >= MAX_PENDING_POSTS {
        return Err(GuardViolation::TooManyPendingPosts);
    }

    // No expiry: only a moderator changing a status lifts this.
    if count_with_status(history, CommentStatus::Rejected) >= MAX_REJECTED {
        return Err(GuardViolation::TooManyRejected);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const POST: &str = "https://x.com/blog/1";

    fn record_at(post_id: &str, status: CommentStatus, at: DateTime<Utc>) -> CommentRecord {
        CommentRecord {
            id: 0,
            post_id: post_id.to_string(),
            content: "hello".to_string(),
            user_id: "user-1".to_string(),
            status,
            created_at: at,
        }
    }

    /// History of `n` records with the given status, the newest one hour old.
    fn old_records(
        now: DateTime<Utc>,
        n: usize,
        post_id: impl Fn(usize) -> String,
        status: CommentStatus,
    ) -> Vec<CommentRecord> {
        (0..n)
            .map(|i| record_at(&post_id(i), status, now - Duration::hours(1 + i as i64)))
            .collect()
    }

    #[test]
    fn test_empty_history_passes() {
        assert_eq!(check(&[], POST, Utc::now()), Ok(()));
    }

    #[test]
    fn test_recent_comment_is_too_frequent() {
        let now = Utc::now();
        let history = vec![record_at(
            "https://x.com/other",
            CommentStatus::Approved,
            now - Duration::seconds(29),
        )];
        assert_eq!(check(&history, POST, now), Err(GuardViolation::TooFrequent));
    }

    #[test]
    fn test_cooldown_wins_over_every_other_limit() {
        let now = Utc::now();
        let mut history = vec![record_at(POST, CommentStatus::Rejected, now - Duration::seconds(5))];
        history.extend(old_records(now, 6, |_| POST.to_string(), CommentStatus::Pending));
        history.extend(old_records(now, 6, |_| POST.to_string(), CommentStatus::Rejected));

        assert_eq!(check(&history, POST, now), Err(GuardViolation::TooFrequent));
    }

    #[test]
    fn test_cooldown_boundary() {
        let now = Utc::now();
        let at_limit = vec![record_at(
            POST,
            CommentStatus::Approved,
            now - Duration::milliseconds(COOLDOWN_MS),
        )];
        assert_eq!(check(&at_limit, POST, now), Ok(()));

        let just_under = vec![record_at(
            POST,
            CommentStatus::Approved,
            now - Duration::milliseconds(COOLDOWN_MS - 1),
        )];
        assert_eq!(
            check(&just_under, POST, now),
            Err(GuardViolation::TooFrequent)
        );
    }

    #[test]
    fn test_future_timestamp_counts_as_recent() {
        let now = Utc::now();
        let history = vec![record_at(
            POST,
            CommentStatus::Approved,
            now + Duration::minutes(5),
        )];
        assert_eq!(check(&history, POST, now), Err(GuardViolation::TooFrequent));
    }

    #[test]
    fn test_only_newest_record_drives_cooldown() {
        let now = Utc::now();
        // A recent record that is not first is ignored; ordering is the fetcher's job.
        let history = vec![
            record_at(POST, CommentStatus::Approved, now - Duration::hours(1)),
            record_at(POST, CommentStatus::Approved, now - Duration::seconds(1)),
        ];
        assert_eq!(check(&history, POST, now), Ok(()));
    }

    #[test]
    fn test_pending_on_this_post_limit() {
        let now = Utc::now();
        let four = old_records(now, 4, |_| POST.to_string(), CommentStatus::Pending);
        assert_eq!(check(&four, POST, now), Ok(()));

        let five = old_records(now, 5, |_| POST.to_string(), CommentStatus::Pending);
        assert_eq!(
            check(&five, POST, now),
            Err(GuardViolation::TooManyPendingForPost)
        );

        // Same backlog does not block a different post
        assert_eq!(check(&five, "https://x.com/blog/2", now), Ok(()));
    }

    #[test]
    fn test_pending_for_post_wins_over_rejections() {
        let now = Utc::now();
        let mut history = old_records(now, 5, |_| POST.to_string(), CommentStatus::Pending);
        history.extend(old_records(now, 5, |_| POST.to_string(), CommentStatus::Rejected));

        assert_eq!(
            check(&history, POST, now),
            Err(GuardViolation::TooManyPendingForPost)
        );
    }

    #[test]
    fn test_pending_breadth_limit() {
        let now = Utc::now();
        let nine = old_records(
            now,
            9,
            |i| format!("https://x.com/post/{}", i),
            CommentStatus::Pending,
        );
        assert_eq!(check(&nine, POST, now), Ok(()));

        let ten = old_records(
            now,
            10,
            |i| format!("https://x.com/post/{}", i),
            CommentStatus::Pending,
        );
        assert_eq!(
            check(&ten, POST, now),
            Err(GuardViolation::TooManyPendingPosts)
        );
    }

    #[test]
    fn test_pending_breadth_wins_over_rejections() {
        let now = Utc::now();
        let mut history = old_records(
            now,
            10,
            |i| format!("https://x.com/post/{}", i),
            CommentStatus::Pending,
        );
        history.extend(old_records(now, 5, |_| POST.to_string(), CommentStatus::Rejected));

        assert_eq!(
            check(&history, POST, now),
            Err(GuardViolation::TooManyPendingPosts)
        );
    }

    #[test]
    fn test_rejection_limit() {
        let now = Utc::now();
        let four = old_records(
            now,
            4,
            |i| format!("https://x.com/post/{}", i),
            CommentStatus::Rejected,
        );
        assert_eq!(check(&four, POST, now), Ok(()));

        let five = old_records(
            now,
            5,
            |i| format!("https://x.com/post/{}", i),
            CommentStatus::Rejected,
        );
        assert_eq!(
            check(&five, POST, now),
            Err(GuardViolation::TooManyRejected)
        );
    }

    #[test]
    fn test_approved_history_never_trips_limits() {
        let now = Utc::now();
        let history = old_records(now, 50, |_| POST.to_string(), CommentStatus::Approved);
        assert_eq!(check(&history, POST, now), Ok(()));
    }
}
