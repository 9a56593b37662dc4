/// Business rules
///
/// Each service owns one area of the domain and works against the
/// [`Store`](crate::store::Store) seam, so the same rules run on Postgres in
/// production and on the in-memory store in tests. Time comes from the
/// injected [`Clock`] and outbound mail from the injected [`Mailer`].
///
/// # Services
///
/// - [`AccountService`]: registration and login
/// - [`ProjectService`]: projects, rosters, leadership transfer
/// - [`InvitationService`]: invite, resolve, accept, decline
/// - [`SubscriptionService`]: paid subscriptions that lift the member limit
/// - [`TaskService`]: assignment, submission, activity
/// - [`NotificationService`]: deadline warnings
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::Duration;
/// use taskhub_shared::auth::jwt::TokenIssuer;
/// use taskhub_shared::clock::SystemClock;
/// use taskhub_shared::mailer::LogMailer;
/// use taskhub_shared::services::Services;
/// use taskhub_shared::store::MemoryStore;
///
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(LogMailer),
///     Arc::new(SystemClock),
///     TokenIssuer::new("a-secret-of-at-least-thirty-two-bytes!", Duration::hours(24)),
///     "http://localhost:3000",
/// );
/// # let _ = services;
/// ```
use std::sync::Arc;

use crate::auth::invitation_token;
use crate::auth::jwt::TokenIssuer;
use crate::clock::Clock;
use crate::mailer::Mailer;
use crate::store::Store;

pub mod accounts;
pub mod invitations;
pub mod notifications;
pub mod projects;
pub mod subscriptions;
pub mod tasks;
pub mod views;

pub use accounts::{AccountService, RegisterUser};
pub use invitations::InvitationService;
pub use notifications::NotificationService;
pub use projects::{NewProject, ProjectService};
pub use subscriptions::{has_active_subscription, NewSubscription, SubscriptionService};
pub use tasks::{NewTask, TaskService};

/// All services wired to the same store, mailer and clock
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub projects: ProjectService,
    pub invitations: InvitationService,
    pub subscriptions: SubscriptionService,
    pub tasks: TaskService,
    pub notifications: NotificationService,
}

impl Services {
    /// `app_base_url` is the front-end origin used in invitation links
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        tokens: TokenIssuer,
        app_base_url: impl Into<String>,
    ) -> Self {
        let invitation_key = invitation_token::signing_key(tokens.secret().as_bytes());

        Self {
            accounts: AccountService::new(store.clone(), mailer.clone(), clock.clone(), tokens),
            projects: ProjectService::new(store.clone()),
            invitations: InvitationService::new(
                store.clone(),
                mailer.clone(),
                clock.clone(),
                invitation_key,
                app_base_url,
            ),
            subscriptions: SubscriptionService::new(store.clone(), clock.clone()),
            tasks: TaskService::new(store.clone(), clock.clone()),
            notifications: NotificationService::new(store, mailer, clock),
        }
    }
}
