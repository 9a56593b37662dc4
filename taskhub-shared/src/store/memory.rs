/// In-memory store
///
/// Backs the test suites and `DATABASE_URL=memory` development runs. All
/// state sits behind one `RwLock`, so every composite operation is applied
/// under a single write guard and readers never see half of it. Rules that
/// Postgres enforces with constraints (unique email, one Leader, one Active
/// subscription) are checked explicitly here.
///
/// Row timestamps (`created_at`, `joined_at`, ...) come from the store's
/// clock, which test harnesses share with the services.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    InvitationStore, ProjectStore, Store, StoreError, StoreResult, SubscriptionStore, TaskStore,
    UserStore,
};
use crate::clock::{Clock, SystemClock};
use crate::models::invitation::{CreateInvitation, Invitation, InvitationStatus};
use crate::models::membership::{ProjectMember, ProjectRole};
use crate::models::project::{CreateProject, Project};
use crate::models::subscription::{CreateSubscription, Subscription, SubscriptionStatus};
use crate::models::task::{CreateTask, Task, TaskStatus};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    members: Vec<ProjectMember>,
    invitations: HashMap<Uuid, Invitation>,
    subscriptions: Vec<Subscription>,
    tasks: HashMap<Uuid, Task>,
}

impl Inner {
    fn member_mut(&mut self, project_id: Uuid, user_id: Uuid) -> Option<&mut ProjectMember> {
        self.members
            .iter_mut()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
    }

    fn is_member(&self, project_id: Uuid, user_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
    }

    fn insert_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
        joined_at: DateTime<Utc>,
    ) -> ProjectMember {
        let member = ProjectMember {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            role,
            joined_at,
        };
        self.members.push(member.clone());
        member
    }
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Store stamping rows with wall-clock time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_tasks<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<Task> {
    let mut tasks: Vec<Task> = tasks.cloned().collect();
    tasks.sort_by(|a, b| a.deadline.cmp(&b.deadline).then(a.created_at.cmp(&b.created_at)));
    tasks
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email_matches(&data.email)) {
            return Err(StoreError::Conflict("Email is already registered".into()));
        }

        let now = self.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            full_name: data.full_name,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email_matches(email)).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.users.get(id).cloned()).collect())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.inner.write().await.users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project_with_leader(
        &self,
        data: CreateProject,
    ) -> StoreResult<(Project, ProjectMember)> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&data.created_by) {
            return Err(StoreError::NotFound("User not found".into()));
        }

        let now = self.clock.now();
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.projects.insert(project.id, project.clone());
        let leader = inner.insert_member(project.id, data.created_by, ProjectRole::Leader, now);

        Ok((project, leader))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let inner = self.inner.read().await;

        let mut projects: Vec<Project> = inner
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| inner.projects.get(&m.project_id).cloned())
            .collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(projects)
    }

    async fn find_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<ProjectMember>> {
        let inner = self.inner.read().await;
        Ok(inner
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<ProjectMember>> {
        let inner = self.inner.read().await;
        // Insertion order is join order
        Ok(inner
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn count_members(&self, project_id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.members.iter().filter(|m| m.project_id == project_id).count() as i64)
    }

    async fn transfer_leadership(&self, project_id: Uuid, from: Uuid, to: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        match inner.member_mut(project_id, from).map(|m| m.role) {
            None => return Err(StoreError::NotFound("Caller is not a member of this project".into())),
            Some(ProjectRole::Member) => {
                return Err(StoreError::Conflict("Caller is no longer the project leader".into()))
            }
            Some(ProjectRole::Leader) => {}
        }

        if !inner.is_member(project_id, to) {
            return Err(StoreError::NotFound("New leader is not a member of this project".into()));
        }

        if let Some(member) = inner.member_mut(project_id, from) {
            member.role = ProjectRole::Member;
        }
        if let Some(member) = inner.member_mut(project_id, to) {
            member.role = ProjectRole::Leader;
        }

        Ok(())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        let mut inner = self.inner.write().await;

        if !inner.projects.contains_key(&data.project_id) {
            return Err(StoreError::NotFound("Project not found".into()));
        }

        let now = self.clock.now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            invited_by: data.invited_by,
            email: data.email,
            status: InvitationStatus::Pending,
            expires_at: data.expires_at,
            accepted_by: None,
            created_at: now,
            updated_at: now,
        };
        inner.invitations.insert(invitation.id, invitation.clone());

        Ok(invitation)
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(self.inner.read().await.invitations.get(&id).cloned())
    }

    async fn find_open_invitation(
        &self,
        project_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Invitation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .invitations
            .values()
            .filter(|i| i.project_id == project_id && i.is_for_email(email) && i.is_open_at(now))
            .max_by_key(|i| i.created_at)
            .cloned())
    }

    async fn set_invitation_status(
        &self,
        id: Uuid,
        from: InvitationStatus,
        to: InvitationStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Invitation> {
        let mut inner = self.inner.write().await;

        let invitation = inner
            .invitations
            .get_mut(&id)
            .filter(|i| i.status == from)
            .ok_or_else(|| StoreError::Conflict("This invitation has already been processed".into()))?;

        invitation.status = to;
        invitation.updated_at = now;

        Ok(invitation.clone())
    }

    async fn accept_invitation(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<(Invitation, ProjectMember)> {
        let mut inner = self.inner.write().await;

        let project_id = match inner.invitations.get(&id) {
            Some(i) if i.status == InvitationStatus::Pending => i.project_id,
            _ => {
                return Err(StoreError::Conflict(
                    "This invitation has already been processed".into(),
                ))
            }
        };

        if inner.is_member(project_id, user_id) {
            return Err(StoreError::Conflict("User is already a member of this project".into()));
        }

        let member = inner.insert_member(project_id, user_id, ProjectRole::Member, now);

        let invitation = inner
            .invitations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Invitation not found".into()))?;
        invitation.status = InvitationStatus::Accepted;
        invitation.accepted_by = Some(user_id);
        invitation.updated_at = now;

        Ok((invitation.clone(), member))
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn create_subscription(&self, data: CreateSubscription) -> StoreResult<Subscription> {
        let mut inner = self.inner.write().await;

        if inner
            .subscriptions
            .iter()
            .any(|s| s.project_id == data.project_id && s.status == SubscriptionStatus::Active)
        {
            return Err(StoreError::Conflict(
                "Project already has an active subscription".into(),
            ));
        }

        let subscription = Subscription {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            purchased_by: data.purchased_by,
            package_name: data.package_name,
            price_cents: data.price_cents,
            starts_at: data.starts_at,
            ends_at: data.ends_at,
            status: SubscriptionStatus::Active,
            created_at: self.clock.now(),
        };
        inner.subscriptions.push(subscription.clone());

        Ok(subscription)
    }

    async fn find_active_subscription(&self, project_id: Uuid) -> StoreResult<Option<Subscription>> {
        let inner = self.inner.read().await;
        Ok(inner
            .subscriptions
            .iter()
            .find(|s| s.project_id == project_id && s.status == SubscriptionStatus::Active)
            .cloned())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut inner = self.inner.write().await;

        if !inner.projects.contains_key(&data.project_id) {
            return Err(StoreError::NotFound("Project not found".into()));
        }

        let now = self.clock.now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            assignee_id: data.assignee_id,
            assigner_id: data.assigner_id,
            title: data.title,
            description: data.description,
            status: TaskStatus::Pending,
            deadline: data.deadline,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn list_project_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(sorted_tasks(
            inner.tasks.values().filter(|t| t.project_id == project_id),
        ))
    }

    async fn list_user_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(sorted_tasks(
            inner.tasks.values().filter(|t| t.assignee_id == user_id),
        ))
    }

    async fn complete_task(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Task>> {
        let mut inner = self.inner.write().await;

        match inner.tasks.get_mut(&id) {
            Some(task) if task.status.can_transition_to(TaskStatus::Completed) => {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(now);
                task.updated_at = now;
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_tasks_overdue(&self, project_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;

        let mut flagged = 0;
        for task in inner
            .tasks
            .values_mut()
            .filter(|t| t.project_id == project_id && t.should_become_overdue(now))
        {
            task.status = TaskStatus::Overdue;
            task.updated_at = now;
            flagged += 1;
        }

        Ok(flagged)
    }

    async fn list_tasks_due_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(sorted_tasks(
            inner.tasks.values().filter(|t| t.is_due_between(from, until)),
        ))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                full_name: email.to_string(),
            })
            .await
            .unwrap()
    }

    async fn seed_project(store: &MemoryStore, leader: &User) -> Project {
        let (project, _) = store
            .create_project_with_leader(CreateProject {
                name: "Apollo".to_string(),
                description: String::new(),
                created_by: leader.id,
            })
            .await
            .unwrap();
        project
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        seed_user(&store, "ada@example.com").await;

        let result = store
            .create_user(CreateUser {
                email: "ADA@example.com".to_string(),
                password_hash: "hash".to_string(),
                full_name: "Other".to_string(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_accept_invitation_is_compare_and_swap() {
        let store = MemoryStore::new();
        let leader = seed_user(&store, "lead@example.com").await;
        let invitee = seed_user(&store, "bob@example.com").await;
        let project = seed_project(&store, &leader).await;

        let invitation = store
            .create_invitation(CreateInvitation {
                project_id: project.id,
                invited_by: leader.id,
                email: invitee.email.clone(),
                expires_at: Utc::now() + Duration::days(7),
            })
            .await
            .unwrap();

        let now = Utc::now();
        let (accepted, member) = store.accept_invitation(invitation.id, invitee.id, now).await.unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(accepted.accepted_by, Some(invitee.id));
        assert_eq!(member.role, ProjectRole::Member);

        let second = store.accept_invitation(invitation.id, invitee.id, now).await;
        assert!(matches!(second, Err(StoreError::Conflict(_))));
        assert_eq!(store.count_members(project.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_transfer_leadership_keeps_single_leader() {
        let store = MemoryStore::new();
        let leader = seed_user(&store, "lead@example.com").await;
        let other = seed_user(&store, "other@example.com").await;
        let project = seed_project(&store, &leader).await;

        // Not a member yet
        let result = store.transfer_leadership(project.id, leader.id, other.id).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        store
            .inner
            .write()
            .await
            .insert_member(project.id, other.id, ProjectRole::Member, Utc::now());
        store.transfer_leadership(project.id, leader.id, other.id).await.unwrap();

        let members = store.list_members(project.id).await.unwrap();
        let leaders: Vec<_> = members.iter().filter(|m| m.is_leader()).collect();
        assert_eq!(leaders.len(), 1);
        assert_eq!(leaders[0].user_id, other.id);

        // The old leader lost the role
        let result = store.transfer_leadership(project.id, leader.id, other.id).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_lapsed_subscription_still_blocks_purchase() {
        let store = MemoryStore::new();
        let leader = seed_user(&store, "lead@example.com").await;
        let project = seed_project(&store, &leader).await;
        let now = Utc::now();

        let purchase = |starts_at: DateTime<Utc>| CreateSubscription {
            project_id: project.id,
            purchased_by: leader.id,
            package_name: "Team".to_string(),
            price_cents: 1000,
            starts_at,
            ends_at: starts_at + Duration::days(30),
        };

        store.create_subscription(purchase(now)).await.unwrap();
        let duplicate = store.create_subscription(purchase(now)).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        // Status is never changed by the store, so the first row stays Active
        let later = now + Duration::days(31);
        let renewal = store.create_subscription(purchase(later)).await;
        assert!(matches!(renewal, Err(StoreError::Conflict(_))));

        let active = store.find_active_subscription(project.id).await.unwrap().unwrap();
        assert_eq!(active.status, SubscriptionStatus::Active);
        assert!(!active.is_active_at(later));
    }

    #[tokio::test]
    async fn test_rows_are_stamped_with_store_clock() {
        let start = Utc::now() - Duration::days(400);
        let clock = Arc::new(ManualClock::new(start));
        let store = MemoryStore::with_clock(clock.clone());

        let leader = seed_user(&store, "lead@example.com").await;
        assert_eq!(leader.created_at, start);

        clock.advance(Duration::hours(1));
        let (project, leadership) = store
            .create_project_with_leader(CreateProject {
                name: "Apollo".to_string(),
                description: String::new(),
                created_by: leader.id,
            })
            .await
            .unwrap();
        assert_eq!(project.created_at, clock.now());
        assert_eq!(leadership.joined_at, clock.now());

        clock.advance(Duration::hours(1));
        let task = store
            .create_task(CreateTask {
                project_id: project.id,
                assignee_id: leader.id,
                assigner_id: leader.id,
                title: "Task".to_string(),
                description: String::new(),
                deadline: clock.now() + Duration::days(1),
            })
            .await
            .unwrap();
        assert_eq!(task.created_at, clock.now());

        let subscription = store
            .create_subscription(CreateSubscription {
                project_id: project.id,
                purchased_by: leader.id,
                package_name: "Team".to_string(),
                price_cents: 1000,
                starts_at: clock.now(),
                ends_at: clock.now() + Duration::days(30),
            })
            .await
            .unwrap();
        assert_eq!(subscription.created_at, clock.now());
    }

    #[tokio::test]
    async fn test_mark_tasks_overdue_skips_completed() {
        let store = MemoryStore::new();
        let leader = seed_user(&store, "lead@example.com").await;
        let project = seed_project(&store, &leader).await;
        let now = Utc::now();

        let create = |deadline| CreateTask {
            project_id: project.id,
            assignee_id: leader.id,
            assigner_id: leader.id,
            title: "Task".to_string(),
            description: String::new(),
            deadline,
        };

        let late = store.create_task(create(now - Duration::hours(1))).await.unwrap();
        let done = store.create_task(create(now - Duration::hours(2))).await.unwrap();
        store.create_task(create(now + Duration::hours(1))).await.unwrap();
        store.complete_task(done.id, now).await.unwrap();

        assert_eq!(store.mark_tasks_overdue(project.id, now).await.unwrap(), 1);
        assert_eq!(store.mark_tasks_overdue(project.id, now).await.unwrap(), 0);

        let late = store.find_task(late.id).await.unwrap().unwrap();
        assert_eq!(late.status, TaskStatus::Overdue);
    }
}
