/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: bearer token issuing and validation (HS256)
/// - [`invitation_token`]: HMAC-signed invitation capabilities
/// - [`middleware`]: Axum bearer-auth middleware and `AuthContext`
/// - [`authorization`]: project role checks

pub mod authorization;
pub mod invitation_token;
pub mod jwt;
pub mod middleware;
pub mod password;
