// Moderation policy engine - decides the status of a newly submitted comment.
//
// Flow for one submission:
// 1. Load and validate the moderation config
// 2. Admins bypass everything and are approved
// 3. Fetch the submitter's history (newest first)
// 4. Abuse guard (cooldown, pending backlog, rejections)
// 5. Auto-approve rule -> Approved or Pending
// 6. Approved comments invalidate the post's cached comment lists
//
// No transport dependencies here - collaborators come in through the ports below.

use super::abuse_guard::{self, GuardViolation};
use super::auto_approve;
use super::moderation_models::{
    CommentRecord, CommentStatus, ModerationConfig, ModerationSettings, Submission,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("You are commenting too frequently, please wait a moment")]
    TooFrequent,

    #[error("Too many comments on this post are awaiting moderation")]
    TooManyPendingForPost,

    #[error("Too many posts have your comments awaiting moderation")]
    TooManyPendingPosts,

    #[error("Too many of your comments have been rejected")]
    TooManyRejected,

    #[error("Comment history unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("Invalid moderation config: {0}")]
    InvalidConfig(String),

    #[error("Moderation config unavailable: {0}")]
    ConfigUnavailable(String),

    #[error("Comment cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl ModerationError {
    /// Errors the submitter caused and can be shown as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ModerationError::TooFrequent
                | ModerationError::TooManyPendingForPost
                | ModerationError::TooManyPendingPosts
                | ModerationError::TooManyRejected
        )
    }

    /// Stable identifier for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ModerationError::TooFrequent => "too_frequent",
            ModerationError::TooManyPendingForPost => "too_many_pending_for_post",
            ModerationError::TooManyPendingPosts => "too_many_pending_posts",
            ModerationError::TooManyRejected => "too_many_rejected",
            ModerationError::HistoryUnavailable(_) => "history_unavailable",
            ModerationError::InvalidConfig(_) => "invalid_config",
            ModerationError::ConfigUnavailable(_) => "config_unavailable",
            ModerationError::CacheUnavailable(_) => "cache_unavailable",
        }
    }
}

impl From<GuardViolation> for ModerationError {
    fn from(violation: GuardViolation) -> Self {
        match violation {
            GuardViolation::TooFrequent => ModerationError::TooFrequent,
            GuardViolation::TooManyPendingForPost => ModerationError::TooManyPendingForPost,
            GuardViolation::TooManyPendingPosts => ModerationError::TooManyPendingPosts,
            GuardViolation::TooManyRejected => ModerationError::TooManyRejected,
        }
    }
}

// ============================================================================
// PORTS
// ============================================================================

/// Source of a user's previous comments.
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// All comments by `user_id` across every post, newest first.
    ///
    /// Failures must surface as `HistoryUnavailable`, never as an empty list.
    async fn fetch_history(&self, user_id: &str) -> Result<Vec<CommentRecord>, ModerationError>;
}

/// Drops cached public comment lists for a post.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, post_id: &str) -> Result<(), ModerationError>;
}

/// Where the moderation settings live.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_settings(&self) -> Result<ModerationSettings, ModerationError>;

    async fn save_settings(&self, settings: &ModerationSettings) -> Result<(), ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<H: HistoryFetcher, C: CacheInvalidator, S: ConfigStore> {
    history: H,
    cache: C,
    config: S,
}

impl<H: HistoryFetcher, C: CacheInvalidator, S: ConfigStore> ModerationService<H, C, S> {
    pub fn new(history: H, cache: C, config: S) -> Self {
        Self {
            history,
            cache,
            config,
        }
    }

    /// Decide the status a new comment is stored with.
    ///
    /// Guard violations fail the whole submission; the comment must not be stored.
    pub async fn moderate(&self, submission: &Submission) -> Result<CommentStatus, ModerationError> {
        self.moderate_at(submission, Utc::now()).await
    }

    async fn moderate_at(
        &self,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<CommentStatus, ModerationError> {
        let config = self.load_config().await?;

        let status = if config.is_admin(submission.email.as_deref()) {
            tracing::debug!(post_id = %submission.post_id, "Admin comment, skipping moderation");
            CommentStatus::Approved
        } else {
            self.evaluate(&config, submission, now).await?
        };

        tracing::info!(
            user_id = %submission.user_id,
            post_id = %submission.post_id,
            status = %status,
            "Comment moderated"
        );

        if status == CommentStatus::Approved {
            // Best effort: the caller stores the comment regardless.
            if let Err(e) = self.cache.invalidate(&submission.post_id).await {
                tracing::warn!(
                    post_id = %submission.post_id,
                    "Failed to invalidate comment cache: {}",
                    e
                );
            }
        }

        Ok(status)
    }

    async fn evaluate(
        &self,
        config: &ModerationConfig,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<CommentStatus, ModerationError> {
        let history = self.history.fetch_history(&submission.user_id).await?;
        tracing::debug!(
            user_id = %submission.user_id,
            history_len = history.len(),
            "Fetched comment history"
        );

        if let Err(violation) = abuse_guard::check(&history, &submission.post_id, now) {
            tracing::warn!(
                user_id = %submission.user_id,
                post_id = %submission.post_id,
                "Comment refused: {}",
                violation
            );
            return Err(violation.into());
        }

        let approved = auto_approve::decide(
            &config.auto_approve,
            &submission.post_id,
            &history,
            &submission.content,
        );

        Ok(if approved {
            CommentStatus::Approved
        } else {
            CommentStatus::Pending
        })
    }

    /// Load the settings and compile them for a decision.
    pub async fn load_config(&self) -> Result<ModerationConfig, ModerationError> {
        let settings = self.config.load_settings().await?;
        ModerationConfig::try_from(&settings)
    }

    /// Get the stored settings as-is.
    pub async fn get_settings(&self) -> Result<ModerationSettings, ModerationError> {
        self.config.load_settings().await
    }

    /// Replace the stored settings. Invalid patterns are refused before anything is written.
    pub async fn update_settings(&self, settings: ModerationSettings) -> Result<(), ModerationError> {
        ModerationConfig::try_from(&settings)?;
        self.config.save_settings(&settings).await?;
        tracing::info!(
            admins = settings.admin_emails.len(),
            auto_approve = settings.auto_approve.enabled,
            "Moderation settings updated"
        );
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
