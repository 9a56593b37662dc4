/// Read models returned by the services
///
/// Views join a row with the names a client needs to display it (member
/// names, project name, inviter name). They serialize straight into API
/// responses.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::models::invitation::{Invitation, InvitationStatus};
use crate::models::membership::{ProjectMember, ProjectRole};
use crate::models::project::Project;
use crate::models::task::{Task, TaskStatus};
use crate::models::user::User;
use crate::store::Store;

/// One row of a project roster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberView {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

/// Project with its roster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub members: Vec<MemberView>,
}

impl ProjectView {
    /// The current Leader, if the roster has one
    pub fn leader(&self) -> Option<&MemberView> {
        self.members.iter().find(|m| m.role == ProjectRole::Leader)
    }
}

/// Invitation as shown to its recipient
///
/// The token is never part of the view; it only travels in the email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvitationView {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub invited_by: Uuid,
    pub inviter_name: String,
    pub email: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InvitationView {
    pub(crate) fn new(invitation: &Invitation, project_name: &str, inviter_name: &str) -> Self {
        Self {
            id: invitation.id,
            project_id: invitation.project_id,
            project_name: project_name.to_string(),
            invited_by: invitation.invited_by,
            inviter_name: inviter_name.to_string(),
            email: invitation.email.clone(),
            status: invitation.status,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskView {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub assignee_id: Uuid,
    pub assignee_name: String,
    pub assigner_id: Uuid,
    pub assigner_name: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub deadline: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Task counts for one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectActivity {
    pub project_id: Uuid,
    pub project_name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub overdue_tasks: usize,
    /// `completed / total * 100`, 0 for a project without tasks
    pub completion_percentage: f64,
    pub tasks: Vec<TaskView>,
}

/// Result of a registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredUser {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
}

/// Outcome of one deadline scan
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeadlineScan {
    /// Open tasks inside the warning window
    pub flagged: usize,
    /// Warnings the mailer accepted
    pub notified: usize,
    /// Warnings that could not be sent
    pub failed: usize,
}

async fn users_by_id(store: &dyn Store, ids: Vec<Uuid>) -> ServiceResult<HashMap<Uuid, User>> {
    let users = store.find_users(&ids).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

fn name_of(users: &HashMap<Uuid, User>, id: Uuid) -> String {
    users.get(&id).map(|u| u.full_name.clone()).unwrap_or_default()
}

/// Loads the roster and builds the project view
pub(crate) async fn project_view(store: &dyn Store, project: Project) -> ServiceResult<ProjectView> {
    let members = store.list_members(project.id).await?;
    let users = users_by_id(store, members.iter().map(|m| m.user_id).collect()).await?;

    Ok(ProjectView {
        members: members
            .into_iter()
            .map(|m| member_view(&users, m))
            .collect(),
        id: project.id,
        name: project.name,
        description: project.description,
        created_by: project.created_by,
        created_at: project.created_at,
    })
}

fn member_view(users: &HashMap<Uuid, User>, member: ProjectMember) -> MemberView {
    let (full_name, email) = users
        .get(&member.user_id)
        .map(|u| (u.full_name.clone(), u.email.clone()))
        .unwrap_or_default();

    MemberView {
        user_id: member.user_id,
        full_name,
        email,
        role: member.role,
        joined_at: member.joined_at,
    }
}

/// Attaches project and user names to tasks, keeping their order
pub(crate) async fn task_views(store: &dyn Store, tasks: Vec<Task>) -> ServiceResult<Vec<TaskView>> {
    let mut user_ids: Vec<Uuid> = tasks
        .iter()
        .flat_map(|t| [t.assignee_id, t.assigner_id])
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users = users_by_id(store, user_ids).await?;

    let mut project_names: HashMap<Uuid, String> = HashMap::new();
    for task in &tasks {
        if !project_names.contains_key(&task.project_id) {
            let name = store
                .find_project(task.project_id)
                .await?
                .map(|p| p.name)
                .unwrap_or_default();
            project_names.insert(task.project_id, name);
        }
    }

    Ok(tasks
        .into_iter()
        .map(|t| TaskView {
            project_name: project_names.get(&t.project_id).cloned().unwrap_or_default(),
            assignee_name: name_of(&users, t.assignee_id),
            assigner_name: name_of(&users, t.assigner_id),
            id: t.id,
            project_id: t.project_id,
            assignee_id: t.assignee_id,
            assigner_id: t.assigner_id,
            title: t.title,
            description: t.description,
            status: t.status,
            deadline: t.deadline,
            completed_at: t.completed_at,
            created_at: t.created_at,
        })
        .collect())
}
