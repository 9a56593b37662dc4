/// Common test utilities for integration tests
///
/// Builds the full router over the in-memory store with a manual clock and a
/// recording mailer, and wraps `oneshot` calls in small request helpers.
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, JwtConfig};
use taskhub_shared::auth::invitation_token;
use taskhub_shared::clock::ManualClock;
use taskhub_shared::db::pool::DatabaseConfig;
use taskhub_shared::mailer::{MailerConfig, MemoryMailer};
use taskhub_shared::store::MemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "api-test-secret-key-at-least-32-bytes";
pub const PASSWORD: &str = "Correct-Horse-1";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<MemoryMailer>,
    pub clock: Arc<ManualClock>,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration_hours: 24,
        },
        mailer: MailerConfig::default(),
        app_base_url: "https://app.example.com".to_string(),
    }
}

/// A registered and logged-in user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let mailer = Arc::new(MemoryMailer::new());

        let state = AppState::new(store.clone(), mailer.clone(), clock.clone(), test_config());

        Self {
            app: build_router(state),
            store,
            mailer,
            clock,
        }
    }

    /// Sends one request and returns the status with the decoded JSON body
    /// (`Value::Null` when the body is empty or not JSON)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Registers and logs in a user
    pub async fn user(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({ "email": email, "password": PASSWORD, "full_name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);

        let (status, body) = self
            .post("/auth/login", None, json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        TestUser {
            id: body["user_id"].as_str().unwrap().parse().unwrap(),
            email: email.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn project(&self, leader: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/projects",
                Some(&leader.token),
                json!({ "name": name, "description": "integration test" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Invites `email` and returns the invitation token
    pub async fn invite(&self, leader: &TestUser, project_id: Uuid, email: &str) -> String {
        let (status, body) = self
            .post(
                "/projects/invite",
                Some(&leader.token),
                json!({ "project_id": project_id, "email": email }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "invite failed: {}", body);

        let id: Uuid = body["invitation"]["id"].as_str().unwrap().parse().unwrap();
        invitation_token::encode(id, &invitation_token::signing_key(JWT_SECRET.as_bytes()))
    }

    pub async fn add_member(&self, leader: &TestUser, project_id: Uuid, member: &TestUser) {
        let token = self.invite(leader, project_id, &member.email).await;
        let (status, body) = self
            .post(&format!("/invitations/{}/accept", token), Some(&member.token), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "accept failed: {}", body);
    }
}
