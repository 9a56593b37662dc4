/// Integration tests for the TaskHub API
///
/// These tests drive the real router end to end over the in-memory store:
/// - Registration, login and bearer authentication
/// - Projects, invitations and the member limit
/// - Subscriptions
/// - Task assignment, submission and project activity
/// - The manual deadline check
///
/// Run with: cargo test -p taskhub-api --test integration_test
mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{TestContext, PASSWORD};
use serde_json::json;
use taskhub_shared::clock::Clock;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new();

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request).await.unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new();
    let user = ctx.user("Ada Lovelace", "ada@example.com").await;

    assert!(!user.token.is_empty());

    let (status, body) = ctx
        .post("/auth/login", None, json!({ "email": "ada@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["full_name"], "Ada Lovelace");
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let ctx = TestContext::new();
    ctx.user("Ada", "ada@example.com").await;

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({ "email": "ada@example.com", "password": PASSWORD, "full_name": "Other" }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({ "email": "not-an-email", "password": PASSWORD, "full_name": "Ada" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({ "email": "ada@example.com", "password": "short", "full_name": "Ada" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = TestContext::new();
    ctx.user("Ada", "ada@example.com").await;

    let (status, wrong_password) = ctx
        .post("/auth/login", None, json!({ "email": "ada@example.com", "password": "Wrong-Horse-1" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_email) = ctx
        .post("/auth/login", None, json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same message either way
    assert_eq!(wrong_password["message"], unknown_email["message"]);
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let ctx = TestContext::new();

    let (status, _) = ctx.get("/projects/my-projects", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/tasks/my-tasks", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post("/projects", None, json!({ "name": "Apollo" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_and_get_project() {
    let ctx = TestContext::new();
    let leader = ctx.user("Ada", "ada@example.com").await;

    let project_id = ctx.project(&leader, "Apollo").await;

    let (status, body) = ctx.get(&format!("/projects/{}", project_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Apollo");
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["members"][0]["role"], "leader");
    assert_eq!(body["members"][0]["user_id"], leader.id.to_string());

    let (status, body) = ctx.get("/projects/my-projects", Some(&leader.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_project() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get(&format!("/projects/{}", Uuid::new_v4()), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_create_project_requires_name() {
    let ctx = TestContext::new();
    let leader = ctx.user("Ada", "ada@example.com").await;

    let (status, body) = ctx
        .post("/projects", Some(&leader.token), json!({ "name": "" }))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_transfer_leadership() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let bob = ctx.user("Bob", "bob@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    ctx.add_member(&ada, project_id, &bob).await;

    let (status, _) = ctx
        .post(
            "/projects/transfer-leadership",
            Some(&ada.token),
            json!({ "project_id": project_id, "new_leader_id": bob.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, project) = ctx.get(&format!("/projects/{}", project_id), None).await;
    let members = project["members"].as_array().unwrap();
    let leaders: Vec<_> = members.iter().filter(|m| m["role"] == "leader").collect();
    assert_eq!(leaders.len(), 1);
    assert_eq!(leaders[0]["user_id"], bob.id.to_string());

    // Ada is a Member now and cannot transfer again
    let (status, _) = ctx
        .post(
            "/projects/transfer-leadership",
            Some(&ada.token),
            json!({ "project_id": project_id, "new_leader_id": ada.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_invite_requires_leader() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let bob = ctx.user("Bob", "bob@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    ctx.add_member(&ada, project_id, &bob).await;

    let (status, body) = ctx
        .post(
            "/projects/invite",
            Some(&bob.token),
            json!({ "project_id": project_id, "email": "carol@example.com" }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_duplicate_invitation_conflicts() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    ctx.invite(&ada, project_id, "carol@example.com").await;

    let (status, body) = ctx
        .post(
            "/projects/invite",
            Some(&ada.token),
            json!({ "project_id": project_id, "email": "carol@example.com" }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "An invitation has already been sent to this email");
}

#[tokio::test]
async fn test_get_invitation_without_login() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    let token = ctx.invite(&ada, project_id, "carol@example.com").await;

    let (status, body) = ctx.get(&format!("/invitations/{}", token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_name"], "Apollo");
    assert_eq!(body["inviter_name"], "Ada");
    assert_eq!(body["email"], "carol@example.com");
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_forged_invitation_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/invitations/not-a-real-token", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid invitation token");
}

#[tokio::test]
async fn test_accept_invitation_for_other_email() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let mallory = ctx.user("Mallory", "mallory@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    let token = ctx.invite(&ada, project_id, "carol@example.com").await;

    let (status, _) = ctx
        .post(&format!("/invitations/{}/accept", token), Some(&mallory.token), json!({}))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_decline_invitation() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let carol = ctx.user("Carol", "carol@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    let token = ctx.invite(&ada, project_id, &carol.email).await;

    let (status, body) = ctx
        .post(&format!("/invitations/{}/decline", token), Some(&carol.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invitation declined");

    // Settled invitations cannot be accepted
    let (status, body) = ctx
        .post(&format!("/invitations/{}/accept", token), Some(&carol.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Invitation has already been processed");

    let (_, project) = ctx.get(&format!("/projects/{}", project_id), None).await;
    assert_eq!(project["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_expired_invitation() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let carol = ctx.user("Carol", "carol@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    let token = ctx.invite(&ada, project_id, &carol.email).await;

    ctx.clock.advance(Duration::days(8));

    let (status, body) = ctx
        .post(&format!("/invitations/{}/accept", token), Some(&carol.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Invitation has expired");

    // Settled as Expired, so it no longer resolves
    let (status, body) = ctx.get(&format!("/invitations/{}", token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Invitation has already been processed");
}

// ---------------------------------------------------------------------------
// Member limit and subscriptions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_member_limit_and_subscription() {
    let ctx = TestContext::new();
    let leader = ctx.user("Leader", "leader@example.com").await;
    let project_id = ctx.project(&leader, "Apollo").await;

    for i in 1..=3 {
        let member = ctx.user(&format!("Member {}", i), &format!("m{}@example.com", i)).await;
        ctx.add_member(&leader, project_id, &member).await;
    }

    // Four members: the fifth needs a subscription
    let fifth = ctx.user("Fifth", "fifth@example.com").await;
    let token = ctx.invite(&leader, project_id, &fifth.email).await;

    let (status, body) = ctx
        .post(&format!("/invitations/{}/accept", token), Some(&fifth.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Project with more than 4 members requires an active subscription"
    );

    let (status, subscription) = ctx
        .post(
            "/subscriptions",
            Some(&leader.token),
            json!({
                "project_id": project_id,
                "package_name": "Team",
                "price": 19.99,
                "duration_months": 12
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", subscription);
    assert_eq!(subscription["price_cents"], 1999);
    assert_eq!(subscription["status"], "active");

    let (status, _) = ctx
        .post(&format!("/invitations/{}/accept", token), Some(&fifth.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, project) = ctx.get(&format!("/projects/{}", project_id), None).await;
    assert_eq!(project["members"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_second_subscription_conflicts() {
    let ctx = TestContext::new();
    let leader = ctx.user("Leader", "leader@example.com").await;
    let project_id = ctx.project(&leader, "Apollo").await;
    let body = json!({
        "project_id": project_id,
        "package_name": "Team",
        "price": 10,
        "duration_months": 1
    });

    let (status, _) = ctx.post("/subscriptions", Some(&leader.token), body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx.post("/subscriptions", Some(&leader.token), body).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_subscription_validation() {
    let ctx = TestContext::new();
    let leader = ctx.user("Leader", "leader@example.com").await;
    let project_id = ctx.project(&leader, "Apollo").await;

    let (status, body) = ctx
        .post(
            "/subscriptions",
            Some(&leader.token),
            json!({
                "project_id": project_id,
                "package_name": "Team",
                "price": 10,
                "duration_months": 0
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "duration_months");
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let bob = ctx.user("Bob", "bob@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    ctx.add_member(&ada, project_id, &bob).await;

    let deadline = ctx.clock.now() + Duration::days(3);
    let (status, task) = ctx
        .post(
            "/tasks",
            Some(&ada.token),
            json!({
                "project_id": project_id,
                "assignee_id": bob.id,
                "title": "Write report",
                "deadline": deadline
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", task);
    assert_eq!(task["status"], "pending");
    assert_eq!(task["assignee_name"], "Bob");
    assert_eq!(task["assigner_name"], "Ada");
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, mine) = ctx.get("/tasks/my-tasks", Some(&bob.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Only the assignee can submit
    let (status, _) = ctx
        .post(&format!("/tasks/{}/submit", task_id), Some(&ada.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, submitted) = ctx
        .post(&format!("/tasks/{}/submit", task_id), Some(&bob.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "completed");
    assert!(submitted["completed_at"].is_string());

    let (status, _) = ctx
        .post(&format!("/tasks/{}/submit", task_id), Some(&bob.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, fetched) = ctx.get(&format!("/tasks/{}", task_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "completed");
}

#[tokio::test]
async fn test_assign_to_non_member() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let outsider = ctx.user("Eve", "eve@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;

    let (status, body) = ctx
        .post(
            "/tasks",
            Some(&ada.token),
            json!({
                "project_id": project_id,
                "assignee_id": outsider.id,
                "title": "Sneak in",
                "deadline": Utc::now() + Duration::days(1)
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Assigned user is not a member of this project");
}

#[tokio::test]
async fn test_project_activity_marks_overdue() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    let now = ctx.clock.now();

    for (title, deadline) in [
        ("Late", now - Duration::hours(1)),
        ("Soon", now + Duration::days(1)),
        ("Done", now + Duration::days(2)),
    ] {
        let (status, task) = ctx
            .post(
                "/tasks",
                Some(&ada.token),
                json!({
                    "project_id": project_id,
                    "assignee_id": ada.id,
                    "title": title,
                    "deadline": deadline
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        if title == "Done" {
            let (status, _) = ctx
                .request(
                    Method::POST,
                    &format!("/tasks/{}/submit", task["id"].as_str().unwrap()),
                    Some(&ada.token),
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    let (status, activity) = ctx
        .get(&format!("/tasks/project/{}/activity", project_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity["total_tasks"], 3);
    assert_eq!(activity["completed_tasks"], 1);
    assert_eq!(activity["pending_tasks"], 1);
    assert_eq!(activity["overdue_tasks"], 1);
    let percentage = activity["completion_percentage"].as_f64().unwrap();
    assert!((percentage - 33.33).abs() < 0.01);
}

#[tokio::test]
async fn test_activity_for_empty_project() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;

    let (status, activity) = ctx
        .get(&format!("/tasks/project/{}/activity", project_id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity["total_tasks"], 0);
    assert_eq!(activity["completion_percentage"], 0.0);
}

// ---------------------------------------------------------------------------
// Deadline check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_check_deadlines() {
    let ctx = TestContext::new();
    let ada = ctx.user("Ada", "ada@example.com").await;
    let project_id = ctx.project(&ada, "Apollo").await;
    let now = ctx.clock.now();

    for (title, deadline) in [
        ("Due soon", now + Duration::hours(5)),
        ("Due later", now + Duration::days(3)),
    ] {
        let (status, _) = ctx
            .post(
                "/tasks",
                Some(&ada.token),
                json!({
                    "project_id": project_id,
                    "assignee_id": ada.id,
                    "title": title,
                    "deadline": deadline
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = ctx.post("/notifications/check-deadlines", None, json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flagged"], 1);
    assert_eq!(body["warned"], 1);
    assert_eq!(body["failed"], 0);

    let warnings: Vec<_> = ctx
        .mailer
        .sent_to("ada@example.com")
        .into_iter()
        .filter(|m| m.subject.starts_with("Deadline approaching"))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].subject, "Deadline approaching: Due soon");
}
