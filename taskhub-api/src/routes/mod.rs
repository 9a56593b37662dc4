/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `projects`: Projects, invitations out, leadership transfer
/// - `tasks`: Assignment, submission, activity
/// - `subscriptions`: Subscription purchase
/// - `invitations`: Invitation lookup, accept, decline
/// - `notifications`: Manual deadline scan

pub mod auth;
pub mod health;
pub mod invitations;
pub mod notifications;
pub mod projects;
pub mod subscriptions;
pub mod tasks;

use serde::{Deserialize, Serialize};

/// Body for endpoints that only confirm an action
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
