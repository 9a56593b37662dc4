/// Task endpoints
///
/// # Endpoints
///
/// - `POST /tasks` - Assign a task (Leader only)
/// - `GET /tasks/:id` - Single task
/// - `POST /tasks/:id/submit` - Assignee marks the task Completed
/// - `GET /tasks/project/:id/activity` - Counts and task list for a project
/// - `GET /tasks/my-tasks` - Tasks assigned to the caller
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskhub_shared::auth::middleware::AuthContext;
use taskhub_shared::services::views::{ProjectActivity, TaskView};
use taskhub_shared::services::NewTask;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub project_id: Uuid,

    pub assignee_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,

    /// RFC 3339 timestamp
    pub deadline: DateTime<Utc>,
}

/// `201 Created` with the task view
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the Leader
/// - `404 Not Found`: Project does not exist
/// - `409 Conflict`: Assignee is not a member
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    req.validate()?;

    let task = state
        .services
        .tasks
        .assign(
            auth.user_id,
            NewTask {
                project_id: req.project_id,
                assignee_id: req.assignee_id,
                title: req.title,
                description: req.description,
                deadline: req.deadline,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(state.services.tasks.get(task_id).await?))
}

pub async fn submit_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(state.services.tasks.submit(task_id, auth.user_id).await?))
}

/// Moves past-deadline tasks to Overdue before counting
pub async fn project_activity(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectActivity>> {
    Ok(Json(state.services.tasks.project_activity(project_id).await?))
}

pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskView>>> {
    Ok(Json(state.services.tasks.user_tasks(auth.user_id).await?))
}
