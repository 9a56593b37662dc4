/// Projects, rosters and leadership transfer
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::{require_permission, ProjectAction};
use crate::error::{ServiceError, ServiceResult};
use crate::models::project::CreateProject;
use crate::services::views::{project_view, ProjectView};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a project with the creator as its Leader
    pub async fn create(&self, creator_id: Uuid, input: NewProject) -> ServiceResult<ProjectView> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("Project name is required"));
        }

        self.store
            .find_user(creator_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let (project, _leader) = self
            .store
            .create_project_with_leader(CreateProject {
                name,
                description: input.description.trim().to_string(),
                created_by: creator_id,
            })
            .await?;

        tracing::info!(project_id = %project.id, %creator_id, "Project created");

        project_view(&*self.store, project).await
    }

    pub async fn get(&self, project_id: Uuid) -> ServiceResult<ProjectView> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        project_view(&*self.store, project).await
    }

    /// Hands the Leader role to another member; the caller becomes a Member
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project does not exist or the target is not a member
    /// - `Forbidden` if the caller is not the Leader
    /// - `Conflict` if the caller names themselves
    pub async fn transfer_leadership(
        &self,
        project_id: Uuid,
        new_leader_id: Uuid,
        caller_id: Uuid,
    ) -> ServiceResult<()> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        require_permission(&*self.store, project_id, caller_id, ProjectAction::TransferLeadership).await?;

        if new_leader_id == caller_id {
            return Err(ServiceError::conflict("You are already the project leader"));
        }

        self.store
            .find_member(project_id, new_leader_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("New leader is not a member of this project"))?;

        self.store
            .transfer_leadership(project_id, caller_id, new_leader_id)
            .await?;

        tracing::info!(%project_id, from = %caller_id, to = %new_leader_id, "Leadership transferred");

        Ok(())
    }

    /// Every project the user belongs to, oldest first
    pub async fn user_projects(&self, user_id: Uuid) -> ServiceResult<Vec<ProjectView>> {
        let projects = self.store.list_projects_for_user(user_id).await?;

        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            views.push(project_view(&*self.store, project).await?);
        }

        Ok(views)
    }
}
