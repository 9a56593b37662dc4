/// Project-level permission checks
///
/// Authorization in TaskHub is per project: the caller's membership row
/// decides what they may do. Only the Leader may invite, assign tasks,
/// transfer leadership or buy a subscription; any member may read.
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::membership::ProjectMember;
use crate::store::ProjectStore;

/// Actions gated on the caller's project role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    Invite,
    AssignTasks,
    TransferLeadership,
    ManageSubscription,
}

impl ProjectAction {
    fn denied_message(&self) -> &'static str {
        match self {
            ProjectAction::Invite => "Only the project leader can invite members",
            ProjectAction::AssignTasks => "Only the project leader can assign tasks",
            ProjectAction::TransferLeadership => "Only the project leader can transfer leadership",
            ProjectAction::ManageSubscription => "Only the project leader can purchase a subscription",
        }
    }
}

/// Whether a membership permits an action
pub fn is_permitted(member: &ProjectMember, action: ProjectAction) -> bool {
    match action {
        ProjectAction::Invite => member.role.can_invite(),
        ProjectAction::AssignTasks => member.role.can_assign_tasks(),
        ProjectAction::TransferLeadership => member.role.can_transfer_leadership(),
        ProjectAction::ManageSubscription => member.role.can_manage_subscription(),
    }
}

/// Returns the caller's membership if it permits `action`
///
/// # Errors
///
/// `Forbidden` if the caller is not a member or their role does not allow the action.
pub async fn require_permission<S: ProjectStore + ?Sized>(
    store: &S,
    project_id: Uuid,
    user_id: Uuid,
    action: ProjectAction,
) -> ServiceResult<ProjectMember> {
    let member = store
        .find_member(project_id, user_id)
        .await?
        .filter(|m| is_permitted(m, action))
        .ok_or_else(|| ServiceError::forbidden(action.denied_message()))?;

    Ok(member)
}
