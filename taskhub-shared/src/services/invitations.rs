/// Invitation lifecycle
///
/// ```text
///            accept            decline           lazily, once past expires_at
/// Pending ─────────► Accepted  ───────► Declined  ─────────────────────────► Expired
/// ```
///
/// Every operation takes the signed token from the invitation email (see
/// [`invitation_token`]). Expiry is detected on use: the first resolve,
/// accept or decline after `expires_at` persists `Expired` and fails.
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::{require_permission, ProjectAction};
use crate::auth::invitation_token;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::mailer::templates::{self, InvitationEmail};
use crate::mailer::{spawn_detached, Mailer};
use crate::models::invitation::{CreateInvitation, Invitation, InvitationStatus, INVITATION_TTL_DAYS};
use crate::models::membership::ProjectMember;
use crate::models::subscription::FREE_TIER_MEMBER_LIMIT;
use crate::models::user::User;
use crate::services::accounts::is_plausible_email;
use crate::services::subscriptions::has_active_subscription;
use crate::services::views::InvitationView;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    secret: Arc<[u8]>,
    app_base_url: String,
}

impl InvitationService {
    /// `secret` is the invitation signing key, already derived from the
    /// server secret with `invitation_token::signing_key`
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        secret: Vec<u8>,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            clock,
            secret: secret.into(),
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Token for an invitation, as it appears in the email links
    pub fn token_for(&self, invitation_id: Uuid) -> String {
        invitation_token::encode(invitation_id, &self.secret)
    }

    fn link(&self, action: &str, token: &str) -> String {
        format!("{}/invitation/{}?token={}", self.app_base_url, action, token)
    }

    /// Invites an email address to a project
    ///
    /// The invitation email is sent in the background; delivery failures are
    /// logged and do not affect the result.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email
    /// - `NotFound` if the project does not exist
    /// - `Forbidden` if the inviter is not the Leader
    /// - `Conflict` if the address already belongs to a member or already has
    ///   an open invitation to this project
    pub async fn invite(&self, project_id: Uuid, email: &str, inviter_id: Uuid) -> ServiceResult<InvitationView> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(ServiceError::validation("Invalid email address"));
        }

        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        require_permission(&*self.store, project_id, inviter_id, ProjectAction::Invite).await?;

        if let Some(existing) = self.store.find_user_by_email(email).await? {
            if self.store.find_member(project_id, existing.id).await?.is_some() {
                return Err(ServiceError::conflict("User is already a member of this project"));
            }
        }

        let now = self.clock.now();
        if self
            .store
            .find_open_invitation(project_id, email, now)
            .await?
            .is_some()
        {
            return Err(ServiceError::conflict(
                "An invitation has already been sent to this email",
            ));
        }

        let invitation = self
            .store
            .create_invitation(CreateInvitation {
                project_id,
                invited_by: inviter_id,
                email: email.to_string(),
                expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            })
            .await?;

        let inviter_name = self
            .store
            .find_user(inviter_id)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_default();

        let token = self.token_for(invitation.id);
        let accept_url = self.link("accept", &token);
        let decline_url = self.link("decline", &token);

        spawn_detached(
            self.mailer.clone(),
            templates::invitation(&InvitationEmail {
                to: &invitation.email,
                project_name: &project.name,
                inviter_name: &inviter_name,
                accept_url: &accept_url,
                decline_url: &decline_url,
                expires_at: invitation.expires_at,
            }),
        );

        tracing::info!(
            invitation_id = %invitation.id,
            %project_id,
            %inviter_id,
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        Ok(InvitationView::new(&invitation, &project.name, &inviter_name))
    }

    /// Looks up a pending invitation for display
    ///
    /// # Errors
    ///
    /// - `Validation` if the token is malformed or forged
    /// - `NotFound` if the invitation or its project no longer exists
    /// - `Conflict` if it was already processed or has expired
    pub async fn resolve(&self, token: &str) -> ServiceResult<InvitationView> {
        let invitation = self.load_pending(token).await?;

        let project = self
            .store
            .find_project(invitation.project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        let inviter_name = self
            .store
            .find_user(invitation.invited_by)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_default();

        Ok(InvitationView::new(&invitation, &project.name, &inviter_name))
    }

    /// Joins the project as a Member
    ///
    /// # Errors
    ///
    /// Everything [`resolve`](Self::resolve) reports, plus:
    ///
    /// - `Unauthorized` if the user is unknown or their email is not the invited one
    /// - `Conflict` if the user is already a member (the invitation is
    ///   declined), or the project is at the free-tier limit without an
    ///   active subscription
    pub async fn accept(&self, token: &str, user_id: Uuid) -> ServiceResult<ProjectMember> {
        let invitation = self.load_pending(token).await?;
        self.invitee(&invitation, user_id).await?;

        let project = self
            .store
            .find_project(invitation.project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        let now = self.clock.now();

        if self.store.find_member(project.id, user_id).await?.is_some() {
            self.settle(invitation.id, InvitationStatus::Declined).await?;
            return Err(ServiceError::conflict("User is already a member of this project"));
        }

        let members = self.store.count_members(project.id).await?;
        if members >= FREE_TIER_MEMBER_LIMIT && !has_active_subscription(&*self.store, project.id, now).await? {
            tracing::info!(
                project_id = %project.id,
                members,
                "Invitation blocked by member limit"
            );
            return Err(ServiceError::conflict(format!(
                "Project with more than {} members requires an active subscription",
                FREE_TIER_MEMBER_LIMIT
            )));
        }

        let (_, member) = self.store.accept_invitation(invitation.id, user_id, now).await?;

        tracing::info!(
            invitation_id = %invitation.id,
            project_id = %project.id,
            %user_id,
            "Invitation accepted"
        );

        Ok(member)
    }

    /// Declines the invitation
    ///
    /// Fails the same way [`accept`](Self::accept) does for bad tokens,
    /// processed or expired invitations and the wrong user.
    pub async fn decline(&self, token: &str, user_id: Uuid) -> ServiceResult<()> {
        let invitation = self.load_pending(token).await?;
        self.invitee(&invitation, user_id).await?;

        self.store
            .set_invitation_status(
                invitation.id,
                InvitationStatus::Pending,
                InvitationStatus::Declined,
                self.clock.now(),
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ServiceError::conflict("Invitation has already been processed"),
                other => other.into(),
            })?;

        tracing::info!(invitation_id = %invitation.id, %user_id, "Invitation declined");

        Ok(())
    }

    /// Decodes the token and loads the invitation if it can still be used
    async fn load_pending(&self, token: &str) -> ServiceResult<Invitation> {
        let id = invitation_token::decode(token, &self.secret)
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let invitation = self
            .store
            .find_invitation(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invitation not found"))?;

        if invitation.status != InvitationStatus::Pending {
            return Err(ServiceError::conflict("Invitation has already been processed"));
        }

        if invitation.is_expired_at(self.clock.now()) {
            self.settle(invitation.id, InvitationStatus::Expired).await?;
            tracing::debug!(invitation_id = %invitation.id, "Invitation expired");
            return Err(ServiceError::conflict("Invitation has expired"));
        }

        Ok(invitation)
    }

    /// Moves a Pending invitation to a terminal status
    ///
    /// Losing the race to a concurrent request is fine: the row already left
    /// Pending.
    async fn settle(&self, id: Uuid, to: InvitationStatus) -> ServiceResult<()> {
        match self
            .store
            .set_invitation_status(id, InvitationStatus::Pending, to, self.clock.now())
            .await
        {
            Ok(_) | Err(StoreError::Conflict(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The user the invitation was sent to
    async fn invitee(&self, invitation: &Invitation, user_id: Uuid) -> ServiceResult<User> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("User not found"))?;

        if !invitation.is_for_email(&user.email) {
            tracing::debug!(
                invitation_id = %invitation.id,
                %user_id,
                "Invitation email does not match user"
            );
            return Err(ServiceError::unauthorized(
                "This invitation was sent to a different email address",
            ));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::mailer::MemoryMailer;
    use crate::store::MemoryStore;

    fn service(base: &str) -> InvitationService {
        InvitationService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryMailer::new()),
            Arc::new(ManualClock::starting_now()),
            b"invitation-test-secret".to_vec(),
            base,
        )
    }

    #[test]
    fn test_links_strip_trailing_slash() {
        let svc = service("https://app.example.com/");
        assert_eq!(
            svc.link("accept", "abc"),
            "https://app.example.com/invitation/accept?token=abc"
        );
    }

    #[test]
    fn test_token_for_round_trips() {
        let svc = service("http://localhost");
        let id = Uuid::new_v4();
        let token = svc.token_for(id);
        assert_eq!(invitation_token::decode(&token, b"invitation-test-secret").unwrap(), id);
    }

    #[tokio::test]
    async fn test_garbage_token_is_validation_error() {
        let svc = service("http://localhost");
        let err = svc.resolve("not-a-token").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg == "Invalid invitation token"));
    }

    #[tokio::test]
    async fn test_unknown_invitation_is_not_found() {
        let svc = service("http://localhost");
        let token = svc.token_for(Uuid::new_v4());
        assert!(matches!(svc.resolve(&token).await, Err(ServiceError::NotFound(_))));
    }
}
