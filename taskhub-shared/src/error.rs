/// Service error taxonomy
///
/// Every business rule violation is raised where it is detected and surfaced
/// to the caller as one of these variants. Nothing here is retried.
///
/// - `NotFound`: the entity does not exist
/// - `Forbidden`: authenticated, but the caller's project role does not allow the action
/// - `Unauthorized`: the caller's identity does not match (bad credentials, wrong invitee)
/// - `Conflict`: the request collides with current state (duplicates, wrong
///   workflow state, subscription gate)
/// - `Validation`: malformed input that passed transport-level validation
use crate::store::StoreError;

/// Result alias used by all services
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// Persistence failure (connection loss, constraint we did not anticipate, ...)
    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ServiceError::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ServiceError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    /// Short machine-readable code, used in logs and error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Store(_) => "store_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::NotFound(msg) => ServiceError::NotFound(msg),
            StoreError::Database(e) => ServiceError::Store(e.to_string()),
        }
    }
}

impl From<crate::auth::password::PasswordError> for ServiceError {
    fn from(err: crate::auth::password::PasswordError) -> Self {
        ServiceError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<crate::auth::jwt::JwtError> for ServiceError {
    fn from(err: crate::auth::jwt::JwtError) -> Self {
        ServiceError::Internal(format!("Token operation failed: {}", err))
    }
}
