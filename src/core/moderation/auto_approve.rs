// Auto-approve rule evaluation.
//
// Pure functions only, so the rule can be tested with literal inputs.

use super::moderation_models::{count_with_status, AutoApproveRule, CommentRecord, CommentStatus};
use once_cell::sync::Lazy;
use regex::Regex;

/// Approved comments a user needs before their comments skip review.
pub const MIN_APPROVED_HISTORY: usize = 2;

/// `[label](url)` or `[label](url "title")`, not preceded by `!`.
static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[^!])\[[^\]]*\]\(\s*[^\s)]+(?:\s+(?:"[^"]*"|'[^']*'))?\s*\)"#)
        .expect("markdown link pattern is valid")
});

/// Whether `content` contains a Markdown hyperlink. Images do not count.
pub fn contains_markdown_link(content: &str) -> bool {
    MARKDOWN_LINK.is_match(content)
}

/// Decide whether a comment on `post_id` is published without review.
pub fn decide(
    rule: &AutoApproveRule,
    post_id: &str,
    history: &[CommentRecord],
    content: &str,
) -> bool {
    if !rule.enabled {
        return false;
    }

    if !rule.covers_post(post_id) {
        return false;
    }

    // Links are the main spam signal, whatever the history looks like
    if contains_markdown_link(content) {
        return false;
    }

    count_with_status(history, CommentStatus::Approved) >= MIN_APPROVED_HISTORY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::AutoApproveSettings;
    use chrono::{Duration, Utc};

    fn rule(enabled: bool, include: Option<&str>, exclude: Option<&str>) -> AutoApproveRule {
        AutoApproveRule::try_from(&AutoApproveSettings {
            enabled,
            include: include.map(String::from),
            exclude: exclude.map(String::from),
        })
        .unwrap()
    }

    fn approved(n: usize) -> Vec<CommentRecord> {
        (0..n)
            .map(|i| CommentRecord {
                id: i as i64,
                post_id: format!("https://elsewhere.org/post/{}", i),
                content: "thanks".to_string(),
                user_id: "user-1".to_string(),
                status: CommentStatus::Approved,
                created_at: Utc::now() - Duration::days(i as i64 + 1),
            })
            .collect()
    }

    #[test]
    fn test_disabled_rule_never_approves() {
        let rule = rule(false, None, None);
        assert!(!decide(&rule, "https://x.com/blog/1", &approved(10), "hello"));
    }

    #[test]
    fn test_trusted_user_is_approved() {
        let rule = rule(true, None, None);
        assert!(decide(
            &rule,
            "https://x.com/blog/1",
            &approved(3),
            "nice post, thanks!"
        ));
    }

    #[test]
    fn test_needs_two_approved_comments() {
        let rule = rule(true, None, None);
        assert!(!decide(&rule, "p", &[], "hello"));
        assert!(!decide(&rule, "p", &approved(1), "hello"));
        assert!(decide(&rule, "p", &approved(2), "hello"));
    }

    #[test]
    fn test_pending_and_rejected_history_does_not_count() {
        let rule = rule(true, None, None);
        let mut history = approved(1);
        for status in [CommentStatus::Pending, CommentStatus::Rejected] {
            let mut extra = approved(1).remove(0);
            extra.status = status;
            history.push(extra);
        }
        assert!(!decide(&rule, "p", &history, "hello"));
    }

    #[test]
    fn test_link_blocks_auto_approve() {
        let rule = rule(true, None, None);
        assert!(!decide(
            &rule,
            "https://x.com/blog/1",
            &approved(5),
            "check [this](http://x.com)"
        ));
    }

    #[test]
    fn test_include_pattern() {
        let rule = rule(true, Some("/blog/"), None);
        assert!(!decide(&rule, "https://x.com/docs/1", &approved(5), "hello"));
        assert!(decide(&rule, "https://x.com/blog/1", &approved(2), "hello"));
    }

    #[test]
    fn test_exclude_pattern() {
        let rule = rule(true, None, Some("^https://x\\.com/private"));
        assert!(!decide(
            &rule,
            "https://X.com/Private/notes",
            &approved(5),
            "hello"
        ));
        assert!(decide(&rule, "https://x.com/blog/1", &approved(5), "hello"));
    }

    #[test]
    fn test_decide_is_idempotent() {
        let rule = rule(true, Some("blog"), None);
        let history = approved(3);
        let first = decide(&rule, "https://x.com/blog/1", &history, "great read");
        let second = decide(&rule, "https://x.com/blog/1", &history, "great read");
        assert_eq!(first, second);
    }

    #[test]
    fn test_markdown_link_detection() {
        assert!(contains_markdown_link("[site](https://example.com)"));
        assert!(contains_markdown_link("see [docs](/docs \"The docs\") here"));
        assert!(contains_markdown_link("see [docs](/docs 'The docs')"));
        assert!(contains_markdown_link("![img](a.png) and [link](b)"));

        assert!(!contains_markdown_link("![screenshot](https://example.com/a.png)"));
        assert!(!contains_markdown_link("plain https://example.com link"));
        assert!(!contains_markdown_link("[just brackets] (and parens)"));
        assert!(!contains_markdown_link("[label](has space inside)"));
    }
}
