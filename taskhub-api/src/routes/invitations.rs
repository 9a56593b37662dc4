/// Invitation endpoints
///
/// The path segment is the signed token from the invitation email.
///
/// # Endpoints
///
/// - `GET /invitations/:token` - Show the invitation (no login needed)
/// - `POST /invitations/:token/accept` - Join the project
/// - `POST /invitations/:token/decline` - Decline
///
/// # Errors
///
/// - `400 Bad Request`: Malformed or forged token
/// - `401 Unauthorized`: Logged-in user is not the invitee
/// - `404 Not Found`: Invitation or project is gone
/// - `409 Conflict`: Already processed, expired, already a member, or the
///   project needs a subscription
use crate::{app::AppState, error::ApiResult, routes::MessageResponse};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskhub_shared::auth::middleware::AuthContext;
use taskhub_shared::services::views::InvitationView;

pub async fn get_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<InvitationView>> {
    Ok(Json(state.services.invitations.resolve(&token).await?))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(token): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .services
        .invitations
        .accept(&token, auth.user_id)
        .await?;

    Ok(Json(MessageResponse::new("Invitation accepted")))
}

pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(token): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .services
        .invitations
        .decline(&token, auth.user_id)
        .await?;

    Ok(Json(MessageResponse::new("Invitation declined")))
}
