/// Persistence seam
///
/// Services talk to storage through one trait per aggregate. The umbrella
/// [`Store`] trait bundles them so a single `Arc<dyn Store>` can be passed
/// around.
///
/// Two implementations:
///
/// - [`PgStore`]: PostgreSQL through sqlx; composite operations run in one transaction
/// - [`MemoryStore`]: maps behind a single `RwLock`; composite operations run
///   under one write guard
///
/// Composite operations (`create_project_with_leader`, `accept_invitation`,
/// `transfer_leadership`, `mark_tasks_overdue`) are atomic in both.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::invitation::{CreateInvitation, Invitation, InvitationStatus};
use crate::models::membership::ProjectMember;
use crate::models::project::{CreateProject, Project};
use crate::models::subscription::{CreateSubscription, Subscription};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule or a compare-and-swap precondition did not hold
    #[error("{0}")]
    Conflict(String),

    /// A row the operation depends on is missing
    #[error("{0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Conflict if the email is taken (case-insensitive)
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Missing IDs are skipped
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Inserts the project and its creator as Leader
    async fn create_project_with_leader(
        &self,
        data: CreateProject,
    ) -> StoreResult<(Project, ProjectMember)>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Projects with a membership row for the user, oldest first
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn find_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<ProjectMember>>;

    /// Members in join order
    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<ProjectMember>>;

    async fn count_members(&self, project_id: Uuid) -> StoreResult<i64>;

    /// Demotes `from` and promotes `to`
    ///
    /// NotFound if either membership is missing, Conflict if `from` is not
    /// the Leader any more.
    async fn transfer_leadership(&self, project_id: Uuid, from: Uuid, to: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation>;

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>>;

    /// Pending and unexpired invitation for (project, email)
    async fn find_open_invitation(
        &self,
        project_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Invitation>>;

    /// Compare-and-swap status change
    ///
    /// Conflict if the invitation is no longer in `from`.
    async fn set_invitation_status(
        &self,
        id: Uuid,
        from: InvitationStatus,
        to: InvitationStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Invitation>;

    /// Inserts the Member row and marks the invitation Accepted
    ///
    /// Conflict (and nothing written) if the invitation is no longer Pending
    /// or the user is already a member.
    async fn accept_invitation(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<(Invitation, ProjectMember)>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Conflict if the project already has an Active subscription
    async fn create_subscription(&self, data: CreateSubscription) -> StoreResult<Subscription>;

    async fn find_active_subscription(&self, project_id: Uuid) -> StoreResult<Option<Subscription>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn list_project_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn list_user_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    /// `None` if the task is missing or already completed
    async fn complete_task(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Task>>;

    /// Flags open tasks of the project past their deadline, returns how many
    async fn mark_tasks_overdue(&self, project_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Open tasks with `from < deadline <= until`
    async fn list_tasks_due_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>>;
}

/// Everything the services need from storage
#[async_trait]
pub trait Store: UserStore + ProjectStore + InvitationStore + SubscriptionStore + TaskStore {
    /// Round trip to the backend
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;
}
