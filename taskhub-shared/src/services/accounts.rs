/// Registration and login
use std::sync::Arc;

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{hash_password_blocking, validate_password_strength, verify_password_blocking};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::mailer::{spawn_detached, templates, Mailer};
use crate::models::user::CreateUser;
use crate::services::views::{AuthSession, RegisteredUser};
use crate::store::Store;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            mailer,
            clock,
            tokens,
        }
    }

    /// Creates an active account and queues a welcome email
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email, empty name or weak password
    /// - `Conflict` if the email is already registered (case-insensitive)
    pub async fn register(&self, input: RegisterUser) -> ServiceResult<RegisteredUser> {
        let email = input.email.trim().to_string();
        let full_name = input.full_name.trim().to_string();

        if !is_plausible_email(&email) {
            return Err(ServiceError::validation("Invalid email address"));
        }
        if full_name.is_empty() {
            return Err(ServiceError::validation("Full name is required"));
        }
        validate_password_strength(&input.password).map_err(ServiceError::Validation)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::conflict("Email already registered"));
        }

        let password_hash = hash_password_blocking(input.password).await?;

        let user = self
            .store
            .create_user(CreateUser {
                email,
                password_hash,
                full_name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        spawn_detached(self.mailer.clone(), templates::welcome(&user.email, &user.full_name));

        Ok(RegisteredUser {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
        })
    }

    /// Checks credentials and issues a bearer token
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let user = self
            .store
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INVALID_CREDENTIALS))?;

        let valid = verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            tracing::debug!(user_id = %user.id, "Login rejected: bad password");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        if !user.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }

        let now = self.clock.now();
        self.store.record_login(user.id, now).await?;

        let token = self.tokens.issue(user.id, &user.email, now)?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthSession {
            token,
            token_type: "Bearer".to_string(),
            expires_at: now + self.tokens.ttl(),
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
        })
    }
}

/// `local@domain.tld` shape check; full validation happens at the edge
pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
