/// Bearer authentication middleware for Axum
///
/// Reads `Authorization: Bearer <jwt>`, validates the token and inserts an
/// [`AuthContext`] into the request extensions. Handlers behind the layer
/// take `Extension<AuthContext>`.
///
/// Token validation is purely cryptographic; whether the user still exists
/// is checked by the service that handles the request.
use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{JwtError, TokenIssuer};

/// Identity of the caller, added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Email claim at token issue time
    pub email: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingCredentials,

    /// Authorization header is not `Bearer <token>`
    InvalidFormat(String),

    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Missing authorization header".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg,
        };

        let body = json!({
            "error": "unauthorized",
            "message": message,
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Resolves the caller from request headers
pub fn authenticate_bearer(headers: &HeaderMap, tokens: &TokenIssuer) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = tokens.validate(token).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        email: claims.email,
    })
}

/// Validates the bearer token and forwards the request with an `AuthContext`
pub async fn jwt_auth_middleware(
    tokens: TokenIssuer,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = authenticate_bearer(req.headers(), &tokens)?;

    tracing::debug!(user_id = %auth_context.user_id, "Authenticated request");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Wraps [`jwt_auth_middleware`] for `axum::middleware::from_fn`
pub fn create_jwt_middleware(
    tokens: TokenIssuer,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>> + Clone {
    move |req, next| {
        let tokens = tokens.clone();
        Box::pin(jwt_auth_middleware(tokens, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret-key-at-least-32-bytes-long", Duration::hours(1))
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate_valid_bearer() {
        let tokens = issuer();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "ada@example.com", Utc::now()).unwrap();

        let ctx = authenticate_bearer(&headers(&format!("Bearer {}", token)), &tokens).unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.email, "ada@example.com");
    }

    #[test]
    fn test_authenticate_missing_header() {
        let result = authenticate_bearer(&HeaderMap::new(), &issuer());
        assert_eq!(result, Err(AuthError::MissingCredentials));
    }

    #[test]
    fn test_authenticate_wrong_scheme() {
        let result = authenticate_bearer(&headers("Basic dXNlcjpwYXNz"), &issuer());
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));

        let result = authenticate_bearer(&headers("Bearer "), &issuer());
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_authenticate_invalid_token() {
        let result = authenticate_bearer(&headers("Bearer garbage"), &issuer());
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_auth_error_into_response() {
        for err in [
            AuthError::MissingCredentials,
            AuthError::InvalidFormat("x".to_string()),
            AuthError::InvalidToken("y".to_string()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
