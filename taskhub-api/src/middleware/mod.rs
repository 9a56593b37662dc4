/// Middleware modules for the API server
///
/// Bearer authentication lives in `taskhub_shared::auth::middleware` so the
/// token rules sit next to the token issuer.

pub mod security;
