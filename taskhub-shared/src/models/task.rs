/// Task model and database operations
///
/// Tasks are assigned by a project's Leader to one of its members and carry
/// a deadline. The assignee submits the task to complete it; the activity
/// read marks tasks past their deadline as Overdue.
///
/// # State Machine
///
/// ```text
/// pending ─────► in_progress ──► completed
///    │               │              ▲
///    │               ▼              │
///    └─────────► overdue ───────────┘
///    │                              ▲
///    └──────────────────────────────┘
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed', 'overdue');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assignee_id UUID NOT NULL REFERENCES users(id),
///     assigner_id UUID NOT NULL REFERENCES users(id),
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(2000) NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'pending',
///     deadline TIMESTAMPTZ NOT NULL,
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned, not started
    Pending,

    /// Being worked on
    InProgress,

    /// Submitted by the assignee
    Completed,

    /// Deadline passed before completion
    Overdue,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Overdue => "overdue",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            (TaskStatus::Pending, TaskStatus::InProgress) => true,
            (TaskStatus::Pending, TaskStatus::Completed) => true,
            (TaskStatus::Pending, TaskStatus::Overdue) => true,

            (TaskStatus::InProgress, TaskStatus::Completed) => true,
            (TaskStatus::InProgress, TaskStatus::Overdue) => true,

            // Late submission is still a submission
            (TaskStatus::Overdue, TaskStatus::Completed) => true,

            _ => false,
        }
    }
}

/// Task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub project_id: Uuid,

    pub assignee_id: Uuid,

    pub assigner_id: Uuid,

    pub title: String,

    pub description: String,

    pub status: TaskStatus,

    pub deadline: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,

    pub assignee_id: Uuid,

    pub assigner_id: Uuid,

    pub title: String,

    pub description: String,

    pub deadline: DateTime<Utc>,
}

impl Task {
    /// Past its deadline without being completed or already flagged
    pub fn should_become_overdue(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now && self.status.can_transition_to(TaskStatus::Overdue)
    }

    /// Not completed and due within `(now, until]`
    pub fn is_due_between(&self, now: DateTime<Utc>, until: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.deadline > now && self.deadline <= until
    }

    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, assignee_id, assigner_id, title, description, deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, assignee_id, assigner_id, title, description,
                      status, deadline, completed_at, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.assignee_id)
        .bind(data.assigner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.deadline)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, assignee_id, assigner_id, title, description,
                   status, deadline, completed_at, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists a project's tasks by deadline
    pub async fn list_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, assignee_id, assigner_id, title, description,
                   status, deadline, completed_at, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY deadline ASC, created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks assigned to a user by deadline
    pub async fn list_by_assignee<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, assignee_id, assigner_id, title, description,
                   status, deadline, completed_at, created_at, updated_at
            FROM tasks
            WHERE assignee_id = $1
            ORDER BY deadline ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Marks a task Completed
    ///
    /// Returns `None` if the task is missing or already completed.
    pub async fn mark_completed<'e, E>(
        executor: E,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'completed', completed_at = $2, updated_at = $2
            WHERE id = $1 AND status <> 'completed'
            RETURNING id, project_id, assignee_id, assigner_id, title, description,
                      status, deadline, completed_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Flags every open task of a project whose deadline has passed
    ///
    /// Returns the number of rows transitioned.
    pub async fn mark_overdue<'e, E>(
        executor: E,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'overdue', updated_at = $2
            WHERE project_id = $1
              AND deadline < $2
              AND status IN ('pending', 'in_progress')
            "#,
        )
        .bind(project_id)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists open tasks due within `(from, until]`
    pub async fn list_due_between<'e, E>(
        executor: E,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, assignee_id, assigner_id, title, description,
                   status, deadline, completed_at, created_at, updated_at
            FROM tasks
            WHERE status <> 'completed'
              AND deadline > $1
              AND deadline <= $2
            ORDER BY deadline ASC
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }
}
