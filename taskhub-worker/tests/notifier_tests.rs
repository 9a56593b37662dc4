/// Deadline notifier tests
///
/// Time is paused so the interval ticks only when the test advances it. The
/// store clock is a separate `ManualClock` that stays put, so the same task
/// stays inside the warning window across scans.
///
/// Run with: cargo test -p taskhub-worker --test notifier_tests
use chrono::Duration;
use std::sync::Arc;
use taskhub_shared::auth::jwt::TokenIssuer;
use taskhub_shared::clock::{Clock, ManualClock};
use taskhub_shared::mailer::MemoryMailer;
use taskhub_shared::services::{NewProject, NewTask, RegisterUser, Services};
use taskhub_shared::store::MemoryStore;
use taskhub_worker::config::NotifierConfig;
use taskhub_worker::notifier::DeadlineNotifier;

struct Fixture {
    services: Services,
    mailer: Arc<MemoryMailer>,
    clock: Arc<ManualClock>,
}

fn fixture(mailer: MemoryMailer) -> Fixture {
    let mailer = Arc::new(mailer);
    let clock = Arc::new(ManualClock::starting_now());
    let services = Services::new(
        Arc::new(MemoryStore::with_clock(clock.clone())),
        mailer.clone(),
        clock.clone(),
        TokenIssuer::new("worker-test-secret-at-least-32-bytes", Duration::hours(1)),
        "https://app.example.com",
    );

    Fixture {
        services,
        mailer,
        clock,
    }
}

/// Registers Ada, gives her a project and one task per deadline offset
async fn seed(f: &Fixture, offsets: &[Duration]) {
    let ada = f
        .services
        .accounts
        .register(RegisterUser {
            email: "ada@example.com".to_string(),
            password: "Correct-Horse-1".to_string(),
            full_name: "Ada".to_string(),
        })
        .await
        .unwrap();

    let project = f
        .services
        .projects
        .create(
            ada.user_id,
            NewProject {
                name: "Apollo".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

    for (i, offset) in offsets.iter().enumerate() {
        f.services
            .tasks
            .assign(
                ada.user_id,
                NewTask {
                    project_id: project.id,
                    assignee_id: ada.user_id,
                    title: format!("Task {}", i + 1),
                    description: String::new(),
                    deadline: f.clock.now() + *offset,
                },
            )
            .await
            .unwrap();
    }
}

fn warnings(mailer: &MemoryMailer) -> usize {
    mailer
        .sent()
        .iter()
        .filter(|m| m.subject.starts_with("Deadline approaching"))
        .count()
}

async fn wait_for_warnings(mailer: &MemoryMailer, expected: usize) {
    for _ in 0..500 {
        if warnings(mailer) >= expected {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {} warnings, saw {}", expected, warnings(mailer));
}

#[tokio::test]
async fn test_run_once_uses_configured_window() {
    let f = fixture(MemoryMailer::new());
    seed(&f, &[Duration::hours(2), Duration::hours(30), -Duration::hours(1)]).await;

    let narrow = DeadlineNotifier::new(f.services.notifications.clone(), NotifierConfig::default());
    let scan = narrow.run_once().await.unwrap();
    assert_eq!(scan.flagged, 1);
    assert_eq!(scan.notified, 1);

    let wide = DeadlineNotifier::new(
        f.services.notifications.clone(),
        NotifierConfig {
            interval_secs: 60,
            window_hours: 48,
        },
    );
    let scan = wide.run_once().await.unwrap();
    assert_eq!(scan.flagged, 2);
}

#[tokio::test]
async fn test_run_once_counts_send_failures() {
    let f = fixture(MemoryMailer::failing());
    seed(&f, &[Duration::hours(1), Duration::hours(2)]).await;

    let notifier = DeadlineNotifier::new(f.services.notifications.clone(), NotifierConfig::default());
    let scan = notifier.run_once().await.unwrap();

    assert_eq!(scan.flagged, 2);
    assert_eq!(scan.notified, 0);
    assert_eq!(scan.failed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_scans_every_interval_until_cancelled() {
    let f = fixture(MemoryMailer::new());
    seed(&f, &[Duration::hours(3)]).await;

    let notifier = Arc::new(DeadlineNotifier::new(
        f.services.notifications.clone(),
        NotifierConfig::default(),
    ));
    let shutdown = notifier.shutdown_token();

    let handle = tokio::spawn({
        let notifier = notifier.clone();
        async move { notifier.run().await }
    });

    // First scan runs at startup
    wait_for_warnings(&f.mailer, 1).await;

    // No de-duplication: the next tick warns again
    tokio::time::advance(std::time::Duration::from_secs(3600)).await;
    wait_for_warnings(&f.mailer, 2).await;

    shutdown.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(warnings(&f.mailer), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_returns_immediately_when_already_cancelled() {
    let f = fixture(MemoryMailer::new());
    seed(&f, &[Duration::hours(3)]).await;

    let notifier = DeadlineNotifier::new(f.services.notifications.clone(), NotifierConfig::default());
    notifier.shutdown_token().cancel();

    notifier.run().await.unwrap();

    assert_eq!(warnings(&f.mailer), 0);
}
