/// PostgreSQL store
///
/// Single-statement operations delegate to the model methods. Composite
/// operations open a transaction and pass `&mut *tx` to the same methods;
/// an early return drops the transaction, which rolls it back.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{
    InvitationStore, ProjectStore, Store, StoreError, StoreResult, SubscriptionStore, TaskStore,
    UserStore,
};
use crate::db::pool::health_check;
use crate::models::invitation::{CreateInvitation, Invitation, InvitationStatus};
use crate::models::membership::{CreateProjectMember, ProjectMember, ProjectRole};
use crate::models::project::{CreateProject, Project};
use crate::models::subscription::{CreateSubscription, Subscription};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to `Conflict`, everything else passes through
fn unique_violation(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(|e| unique_violation(e, "Email is already registered"))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(User::find_many(&self.pool, ids).await?)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        User::update_last_login(&self.pool, id, at).await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create_project_with_leader(
        &self,
        data: CreateProject,
    ) -> StoreResult<(Project, ProjectMember)> {
        let mut tx = self.pool.begin().await?;

        let creator = data.created_by;
        let project = Project::create(&mut *tx, data).await?;
        let leader = ProjectMember::create(
            &mut *tx,
            CreateProjectMember {
                project_id: project.id,
                user_id: creator,
                role: ProjectRole::Leader,
            },
        )
        .await?;

        tx.commit().await?;

        debug!(project_id = %project.id, leader_id = %creator, "Project created");
        Ok((project, leader))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn find_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<ProjectMember>> {
        Ok(ProjectMember::find(&self.pool, project_id, user_id).await?)
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<ProjectMember>> {
        Ok(ProjectMember::list_by_project(&self.pool, project_id).await?)
    }

    async fn count_members(&self, project_id: Uuid) -> StoreResult<i64> {
        Ok(ProjectMember::count_by_project(&self.pool, project_id).await?)
    }

    async fn transfer_leadership(&self, project_id: Uuid, from: Uuid, to: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the current leader serializes concurrent transfers
        let current: Option<(ProjectRole,)> = sqlx::query_as(
            "SELECT role FROM project_members WHERE project_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(project_id)
        .bind(from)
        .fetch_optional(&mut *tx)
        .await?;

        match current {
            None => return Err(StoreError::NotFound("Caller is not a member of this project".into())),
            Some((ProjectRole::Member,)) => {
                return Err(StoreError::Conflict("Caller is no longer the project leader".into()))
            }
            Some((ProjectRole::Leader,)) => {}
        }

        // Demote first: the partial unique index allows one leader per project
        ProjectMember::update_role(&mut *tx, project_id, from, ProjectRole::Member).await?;

        let promoted =
            ProjectMember::update_role(&mut *tx, project_id, to, ProjectRole::Leader).await?;
        if promoted.is_none() {
            return Err(StoreError::NotFound("New leader is not a member of this project".into()));
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl InvitationStore for PgStore {
    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        Ok(Invitation::create(&self.pool, data).await?)
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_by_id(&self.pool, id).await?)
    }

    async fn find_open_invitation(
        &self,
        project_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_open(&self.pool, project_id, email, now).await?)
    }

    async fn set_invitation_status(
        &self,
        id: Uuid,
        from: InvitationStatus,
        to: InvitationStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Invitation> {
        Invitation::transition(&self.pool, id, from, to, None, now)
            .await?
            .ok_or_else(|| StoreError::Conflict("This invitation has already been processed".into()))
    }

    async fn accept_invitation(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<(Invitation, ProjectMember)> {
        let mut tx = self.pool.begin().await?;

        let invitation = Invitation::transition(
            &mut *tx,
            id,
            InvitationStatus::Pending,
            InvitationStatus::Accepted,
            Some(user_id),
            now,
        )
        .await?
        .ok_or_else(|| StoreError::Conflict("This invitation has already been processed".into()))?;

        let member = ProjectMember::create(
            &mut *tx,
            CreateProjectMember {
                project_id: invitation.project_id,
                user_id,
                role: ProjectRole::Member,
            },
        )
        .await
        .map_err(|e| unique_violation(e, "User is already a member of this project"))?;

        tx.commit().await?;
        Ok((invitation, member))
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn create_subscription(&self, data: CreateSubscription) -> StoreResult<Subscription> {
        Subscription::create(&self.pool, data)
            .await
            .map_err(|e| unique_violation(e, "Project already has an active subscription"))
    }

    async fn find_active_subscription(&self, project_id: Uuid) -> StoreResult<Option<Subscription>> {
        Ok(Subscription::find_active(&self.pool, project_id).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_project_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id).await?)
    }

    async fn list_user_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_assignee(&self.pool, user_id).await?)
    }

    async fn complete_task(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Task>> {
        Ok(Task::mark_completed(&self.pool, id, now).await?)
    }

    async fn mark_tasks_overdue(&self, project_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Task::mark_overdue(&self.pool, project_id, now).await?)
    }

    async fn list_tasks_due_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        Ok(Task::list_due_between(&self.pool, from, until).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
