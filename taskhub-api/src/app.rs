/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_api::{app::{build_router, AppState}, config::Config};
/// use taskhub_shared::{clock::SystemClock, mailer::LogMailer, store::MemoryStore};
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(LogMailer),
///     Arc::new(SystemClock),
///     config,
/// );
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use taskhub_shared::auth::jwt::TokenIssuer;
use taskhub_shared::auth::middleware::create_jwt_middleware;
use taskhub_shared::clock::Clock;
use taskhub_shared::mailer::Mailer;
use taskhub_shared::services::Services;
use taskhub_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,

    /// Used directly only by the health check
    pub store: Arc<dyn Store>,

    pub tokens: TokenIssuer,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        let tokens = config.jwt.issuer();
        let services = Services::new(
            store.clone(),
            mailer,
            clock,
            tokens.clone(),
            config.app_base_url.clone(),
        );

        Self {
            services,
            store,
            tokens,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth
/// │   ├── POST /register
/// │   └── POST /login
/// ├── /projects
/// │   ├── POST /                          (bearer)
/// │   ├── GET  /my-projects               (bearer)
/// │   ├── POST /invite                    (bearer)
/// │   ├── POST /transfer-leadership       (bearer)
/// │   └── GET  /:id
/// ├── /tasks
/// │   ├── POST /                          (bearer)
/// │   ├── GET  /my-tasks                  (bearer)
/// │   ├── POST /:id/submit                (bearer)
/// │   ├── GET  /:id
/// │   └── GET  /project/:id/activity
/// ├── /subscriptions
/// │   └── POST /                          (bearer)
/// ├── /invitations
/// │   ├── GET  /:token
/// │   ├── POST /:token/accept             (bearer)
/// │   └── POST /:token/decline            (bearer)
/// └── POST /notifications/check-deadlines
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Bearer authentication (route layer on the protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/projects/:id", get(routes::projects::get_project))
        .route("/tasks/:id", get(routes::tasks::get_task))
        .route("/tasks/project/:id/activity", get(routes::tasks::project_activity))
        .route("/invitations/:token", get(routes::invitations::get_invitation))
        .route(
            "/notifications/check-deadlines",
            post(routes::notifications::check_deadlines),
        );

    let protected_routes = Router::new()
        .route("/projects", post(routes::projects::create_project))
        .route("/projects/my-projects", get(routes::projects::my_projects))
        .route("/projects/invite", post(routes::projects::invite_member))
        .route(
            "/projects/transfer-leadership",
            post(routes::projects::transfer_leadership),
        )
        .route("/tasks", post(routes::tasks::create_task))
        .route("/tasks/my-tasks", get(routes::tasks::my_tasks))
        .route("/tasks/:id/submit", post(routes::tasks::submit_task))
        .route("/subscriptions", post(routes::subscriptions::create_subscription))
        .route("/invitations/:token/accept", post(routes::invitations::accept_invitation))
        .route("/invitations/:token/decline", post(routes::invitations::decline_invitation))
        .route_layer(axum::middleware::from_fn(create_jwt_middleware(
            state.tokens.clone(),
        )));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}
