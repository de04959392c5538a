// Core moderation module - decides what happens to a newly submitted comment.
// Following the same pattern as the other core modules: models, pure rules, service.

pub mod abuse_guard;
pub mod auto_approve;
pub mod moderation_models;
pub mod moderation_service;

pub use abuse_guard::GuardViolation;
pub use moderation_models::*;
pub use moderation_service::*;
