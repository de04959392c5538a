// Moderation domain models - comment records, statuses and the moderation config.
//
// Pure domain types with no transport dependencies. The infra layer decodes
// these from the data API and the KV store.

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::moderation_service::ModerationError;

// ============================================================================
// STATUS & QUERY FILTERS
// ============================================================================

/// Status of a stored comment.
///
/// Encoded as its numeric code on the wire (`0`, `1`, `2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum CommentStatus {
    /// Awaiting a moderator decision
    Pending,
    /// Publicly visible
    Approved,
    /// Hidden by a moderator
    Rejected,
}

impl CommentStatus {
    pub fn code(self) -> u16 {
        match self {
            CommentStatus::Pending => 0,
            CommentStatus::Approved => 1,
            CommentStatus::Rejected => 2,
        }
    }
}

impl TryFrom<u16> for CommentStatus {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CommentStatus::Pending),
            1 => Ok(CommentStatus::Approved),
            2 => Ok(CommentStatus::Rejected),
            other => Err(format!("{} is not a stored comment status", other)),
        }
    }
}

impl From<CommentStatus> for u16 {
    fn from(status: CommentStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentStatus::Pending => write!(f, "pending"),
            CommentStatus::Approved => write!(f, "approved"),
            CommentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Filter used by admin comment listings.
///
/// `UnReplied` and `RepliedToAdmin` only exist as query markers. Keeping them
/// out of `CommentStatus` means they can never be written as a status.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum CommentFilter {
    Status(CommentStatus),
    UnReplied,
    RepliedToAdmin,
}

#[allow(dead_code)]
impl CommentFilter {
    pub const UN_REPLIED_CODE: u16 = 255;
    pub const REPLIED_TO_ADMIN_CODE: u16 = 256;

    pub fn code(self) -> u16 {
        match self {
            CommentFilter::Status(status) => status.code(),
            CommentFilter::UnReplied => Self::UN_REPLIED_CODE,
            CommentFilter::RepliedToAdmin => Self::REPLIED_TO_ADMIN_CODE,
        }
    }

    /// The stored status this filter selects on, if it is a plain status filter.
    pub fn status(self) -> Option<CommentStatus> {
        match self {
            CommentFilter::Status(status) => Some(status),
            _ => None,
        }
    }
}

impl TryFrom<u16> for CommentFilter {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            Self::UN_REPLIED_CODE => Ok(CommentFilter::UnReplied),
            Self::REPLIED_TO_ADMIN_CODE => Ok(CommentFilter::RepliedToAdmin),
            other => CommentStatus::try_from(other)
                .map(CommentFilter::Status)
                .map_err(|_| format!("{} is not a comment filter", other)),
        }
    }
}

impl From<CommentFilter> for u16 {
    fn from(filter: CommentFilter) -> Self {
        filter.code()
    }
}

impl From<CommentStatus> for CommentFilter {
    fn from(status: CommentStatus) -> Self {
        CommentFilter::Status(status)
    }
}

// ============================================================================
// HISTORY
// ============================================================================

/// One of a user's previous comments, as returned by the data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    /// Identifier of the post on the owning site (usually its URL)
    pub post_id: String,
    pub content: String,
    pub user_id: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

/// Sort records newest first. Stable, so records sharing a timestamp keep
/// their relative order.
pub fn sort_newest_first(records: &mut [CommentRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Number of records with the given status.
pub fn count_with_status(history: &[CommentRecord], status: CommentStatus) -> usize {
    history.iter().filter(|c| c.status == status).count()
}

/// Distinct posts the user has comments awaiting moderation on.
pub fn pending_posts(history: &[CommentRecord]) -> HashSet<&str> {
    history
        .iter()
        .filter(|c| c.status == CommentStatus::Pending)
        .map(|c| c.post_id.as_str())
        .collect()
}

// ============================================================================
// SUBMISSION
// ============================================================================

/// A comment someone is trying to post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Stable per-browser or per-account identifier
    pub user_id: String,
    pub post_id: String,
    pub content: String,
    /// Verified email of a signed-in submitter
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Auto-approve rule as stored. Patterns are uncompiled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoApproveSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Only posts whose id matches this pattern may be auto-approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Posts whose id matches this pattern are never auto-approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

/// Moderation settings as stored in the KV store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationSettings {
    #[serde(default)]
    pub admin_emails: Vec<String>,
    #[serde(default)]
    pub auto_approve: AutoApproveSettings,
}

/// Compiled auto-approve rule.
#[derive(Debug, Clone)]
pub struct AutoApproveRule {
    pub enabled: bool,
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
}

impl AutoApproveRule {
    /// Whether the rule allows auto-approval on this post at all.
    pub fn covers_post(&self, post_id: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(post_id) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(post_id) {
                return false;
            }
        }
        true
    }
}

impl TryFrom<&AutoApproveSettings> for AutoApproveRule {
    type Error = ModerationError;

    fn try_from(settings: &AutoApproveSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: settings.enabled,
            include: compile_pattern("include", settings.include.as_deref())?,
            exclude: compile_pattern("exclude", settings.exclude.as_deref())?,
        })
    }
}

/// Treats an empty pattern as unset, matching how the admin form stores a
/// cleared field.
fn compile_pattern(field: &str, pattern: Option<&str>) -> Result<Option<Regex>, ModerationError> {
    match pattern.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(p) => RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|e| {
                ModerationError::InvalidConfig(format!("autoApprove.{} is invalid: {}", field, e))
            }),
    }
}

/// Validated moderation config used for a single decision.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub admin_emails: Vec<String>,
    pub auto_approve: AutoApproveRule,
}

impl ModerationConfig {
    pub fn is_admin(&self, email: Option<&str>) -> bool {
        let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
            return false;
        };
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}

impl TryFrom<&ModerationSettings> for ModerationConfig {
    type Error = ModerationError;

    fn try_from(settings: &ModerationSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            admin_emails: settings.admin_emails.clone(),
            auto_approve: AutoApproveRule::try_from(&settings.auto_approve)?,
        })
    }
}
