/// Task assignment, submission and project activity
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::{require_permission, ProjectAction};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{CreateTask, TaskStatus};
use crate::services::views::{task_views, ProjectActivity, TaskView};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub assignee_id: Uuid,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Assigns a new Pending task to a project member
    ///
    /// Deadlines in the past are accepted; the task shows up as Overdue on
    /// the next activity read.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty title
    /// - `NotFound` if the project does not exist
    /// - `Forbidden` if the assigner is not the Leader
    /// - `Conflict` if the assignee is not a member
    pub async fn assign(&self, assigner_id: Uuid, input: NewTask) -> ServiceResult<TaskView> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::validation("Task title is required"));
        }

        self.store
            .find_project(input.project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        require_permission(&*self.store, input.project_id, assigner_id, ProjectAction::AssignTasks).await?;

        if self
            .store
            .find_member(input.project_id, input.assignee_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::conflict(
                "Assigned user is not a member of this project",
            ));
        }

        let task = self
            .store
            .create_task(CreateTask {
                project_id: input.project_id,
                assignee_id: input.assignee_id,
                assigner_id,
                title,
                description: input.description.trim().to_string(),
                deadline: input.deadline,
            })
            .await?;

        tracing::info!(
            task_id = %task.id,
            project_id = %task.project_id,
            assignee_id = %task.assignee_id,
            deadline = %task.deadline,
            "Task assigned"
        );

        self.single_view(task).await
    }

    /// Marks the caller's task Completed
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task does not exist
    /// - `Forbidden` if the caller is not the assignee
    /// - `Conflict` if the task is already Completed
    pub async fn submit(&self, task_id: Uuid, user_id: Uuid) -> ServiceResult<TaskView> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task not found"))?;

        if task.assignee_id != user_id {
            return Err(ServiceError::forbidden("You can only submit your own tasks"));
        }

        if task.status == TaskStatus::Completed {
            return Err(ServiceError::conflict("Task has already been completed"));
        }

        let task = self
            .store
            .complete_task(task_id, self.clock.now())
            .await?
            .ok_or_else(|| ServiceError::conflict("Task has already been completed"))?;

        tracing::info!(task_id = %task.id, %user_id, "Task submitted");

        self.single_view(task).await
    }

    pub async fn get(&self, task_id: Uuid) -> ServiceResult<TaskView> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task not found"))?;

        self.single_view(task).await
    }

    /// Task counts for a project
    ///
    /// Open tasks past their deadline are moved to Overdue first, so the
    /// counts reflect the persisted state and repeated calls agree.
    pub async fn project_activity(&self, project_id: Uuid) -> ServiceResult<ProjectActivity> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        let flagged = self
            .store
            .mark_tasks_overdue(project_id, self.clock.now())
            .await?;
        if flagged > 0 {
            tracing::info!(%project_id, flagged, "Tasks marked overdue");
        }

        let tasks = self.store.list_project_tasks(project_id).await?;

        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let total_tasks = tasks.len();
        let completed_tasks = count(TaskStatus::Completed);
        let pending_tasks = count(TaskStatus::Pending);
        let in_progress_tasks = count(TaskStatus::InProgress);
        let overdue_tasks = count(TaskStatus::Overdue);

        Ok(ProjectActivity {
            project_id,
            project_name: project.name,
            total_tasks,
            completed_tasks,
            pending_tasks,
            in_progress_tasks,
            overdue_tasks,
            completion_percentage: completion_percentage(completed_tasks, total_tasks),
            tasks: task_views(&*self.store, tasks).await?,
        })
    }

    /// Tasks assigned to the user across all projects
    pub async fn user_tasks(&self, user_id: Uuid) -> ServiceResult<Vec<TaskView>> {
        let tasks = self.store.list_user_tasks(user_id).await?;
        task_views(&*self.store, tasks).await
    }

    async fn single_view(&self, task: crate::models::task::Task) -> ServiceResult<TaskView> {
        task_views(&*self.store, vec![task])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::Internal("Task view missing".to_string()))
    }
}

/// `completed / total * 100`, or 0 without tasks
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}
