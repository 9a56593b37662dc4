/// Manual deadline scan
///
/// `POST /notifications/check-deadlines` runs one scan of the deadline
/// notifier in the request and reports what it did. The worker runs the
/// same scan on a timer.
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskhub_shared::services::notifications::DEFAULT_WINDOW_HOURS;

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckDeadlinesResponse {
    pub message: String,

    /// Open tasks due within the window
    pub flagged: usize,

    /// Warnings handed to the mailer
    pub warned: usize,

    pub failed: usize,
}

pub async fn check_deadlines(State(state): State<AppState>) -> ApiResult<Json<CheckDeadlinesResponse>> {
    let scan = state
        .services
        .notifications
        .check_deadlines(Duration::hours(DEFAULT_WINDOW_HOURS))
        .await?;

    Ok(Json(CheckDeadlinesResponse {
        message: "Deadline check completed".to_string(),
        flagged: scan.flagged,
        warned: scan.notified,
        failed: scan.failed,
    }))
}
