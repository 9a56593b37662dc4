/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Create an account
/// - `POST /auth/login` - Exchange credentials for a bearer token
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::Deserialize;
use taskhub_shared::auth::password;
use taskhub_shared::services::views::{AuthSession, RegisteredUser};
use taskhub_shared::services::RegisterUser;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"), length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    /// Strength rules are checked separately
    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters"))]
    pub full_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "Correct-Horse-1",
///   "full_name": "Ada Lovelace"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "user_id": "uuid", "email": "ada@example.com", "full_name": "Ada Lovelace" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisteredUser>> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid_field("password", e))?;

    let user = state
        .services
        .accounts
        .register(RegisterUser {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
        })
        .await?;

    Ok(Json(user))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "Correct-Horse-1" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_at": "2025-01-02T00:00:00Z",
///   "user_id": "uuid",
///   "email": "ada@example.com",
///   "full_name": "Ada Lovelace"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials or deactivated account
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    req.validate()?;

    let session = state
        .services
        .accounts
        .login(&req.email, &req.password)
        .await?;

    Ok(Json(session))
}
