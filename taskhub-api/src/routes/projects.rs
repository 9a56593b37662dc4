/// Project endpoints
///
/// # Endpoints
///
/// - `POST /projects` - Create a project (caller becomes Leader)
/// - `GET /projects/:id` - Project with roster
/// - `GET /projects/my-projects` - Projects the caller belongs to
/// - `POST /projects/invite` - Invite an email address (Leader only)
/// - `POST /projects/transfer-leadership` - Hand over the Leader role
use crate::{app::AppState, error::ApiResult, routes::MessageResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::auth::middleware::AuthContext;
use taskhub_shared::services::views::{InvitationView, ProjectView};
use taskhub_shared::services::NewProject;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    pub project_id: Uuid,

    #[validate(email(message = "Invalid email format"), length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InviteMemberResponse {
    pub message: String,
    pub invitation: InvitationView,
}

#[derive(Debug, Deserialize)]
pub struct TransferLeadershipRequest {
    pub project_id: Uuid,
    pub new_leader_id: Uuid,
}

/// `201 Created` with the project view
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    req.validate()?;

    let project = state
        .services
        .projects
        .create(
            auth.user_id,
            NewProject {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectView>> {
    Ok(Json(state.services.projects.get(project_id).await?))
}

pub async fn my_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectView>>> {
    Ok(Json(state.services.projects.user_projects(auth.user_id).await?))
}

/// Creates the invitation; the email goes out in the background
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the Leader
/// - `404 Not Found`: Project does not exist
/// - `409 Conflict`: Already a member, or an invitation is still open
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<InviteMemberRequest>,
) -> ApiResult<Json<InviteMemberResponse>> {
    req.validate()?;

    let invitation = state
        .services
        .invitations
        .invite(req.project_id, &req.email, auth.user_id)
        .await?;

    Ok(Json(InviteMemberResponse {
        message: "Invitation sent".to_string(),
        invitation,
    }))
}

pub async fn transfer_leadership(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TransferLeadershipRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .services
        .projects
        .transfer_leadership(req.project_id, req.new_leader_id, auth.user_id)
        .await?;

    Ok(Json(MessageResponse::new("Leadership transferred")))
}
