/// Project membership model and database operations
///
/// One row per (project, user) pair, tagged with a role. Every project has
/// exactly one Leader; the role only changes through a leadership transfer,
/// which demotes and promotes in the same transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('leader', 'member');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
///
/// CREATE UNIQUE INDEX project_members_one_leader
///     ON project_members (project_id) WHERE role = 'leader';
/// ```
///
/// # Roles
///
/// - **leader**: invite members, assign tasks, transfer leadership, purchase a subscription
/// - **member**: work on and submit assigned tasks
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Role within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// The single member with elevated authorization
    Leader,

    /// Regular member
    Member,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Leader => "leader",
            ProjectRole::Member => "member",
        }
    }

    pub fn can_invite(&self) -> bool {
        matches!(self, ProjectRole::Leader)
    }

    pub fn can_assign_tasks(&self) -> bool {
        matches!(self, ProjectRole::Leader)
    }

    pub fn can_transfer_leadership(&self) -> bool {
        matches!(self, ProjectRole::Leader)
    }

    pub fn can_manage_subscription(&self) -> bool {
        matches!(self, ProjectRole::Leader)
    }
}

/// Membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,

    pub project_id: Uuid,

    pub user_id: Uuid,

    pub role: ProjectRole,

    pub joined_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectMember {
    pub project_id: Uuid,

    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

impl ProjectMember {
    pub fn is_leader(&self) -> bool {
        self.role == ProjectRole::Leader
    }

    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// Unique violation if the user is already a member (or if a second
    /// Leader would be created), foreign key violation if either side is missing.
    pub async fn create<'e, E>(executor: E, data: CreateProjectMember) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, user_id, role, joined_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    /// Finds the membership of a user in a project
    pub async fn find<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Lists all members of a project in join order
    pub async fn list_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(members)
    }

    /// Changes a member's role
    ///
    /// Returns `None` if the membership does not exist.
    pub async fn update_role<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            UPDATE project_members
            SET role = $3
            WHERE project_id = $1 AND user_id = $2
            RETURNING id, project_id, user_id, role, joined_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Counts members of a project
    pub async fn count_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM project_members WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }
}
