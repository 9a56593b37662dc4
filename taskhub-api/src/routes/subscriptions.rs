/// Subscription endpoint
///
/// `POST /subscriptions` buys a subscription for a project, lifting the
/// four-member limit until it ends. Leader only.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskhub_shared::auth::middleware::AuthContext;
use taskhub_shared::models::subscription::Subscription;
use taskhub_shared::services::NewSubscription;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubscriptionRequest {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Package name must be between 1 and 100 characters"))]
    pub package_name: String,

    /// Decimal amount, stored in cents
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    #[validate(range(min = 1, max = 36, message = "Duration must be between 1 and 36 months"))]
    pub duration_months: u32,
}

/// Converts a decimal price to whole cents
fn to_cents(price: f64) -> Result<i64, ApiError> {
    let cents = (price * 100.0).round();
    if !cents.is_finite() || cents < 0.0 || cents > i64::MAX as f64 {
        return Err(ApiError::invalid_field("price", "Price is out of range"));
    }
    Ok(cents as i64)
}

/// `201 Created` with the subscription
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the Leader
/// - `404 Not Found`: Project does not exist
/// - `409 Conflict`: The project already has an active subscription
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    req.validate()?;

    let subscription = state
        .services
        .subscriptions
        .create(
            auth.user_id,
            NewSubscription {
                project_id: req.project_id,
                package_name: req.package_name,
                price_cents: to_cents(req.price)?,
                duration_months: req.duration_months,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}
