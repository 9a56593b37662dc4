/// Invitation model and database operations
///
/// An invitation lets a Leader bring a user into a project by email. It is
/// valid for seven days and resolves exactly once.
///
/// # State Machine
///
/// ```text
/// Pending ──► Accepted
///    │
///    ├──────► Declined
///    │
///    └──────► Expired
/// ```
///
/// All states except Pending are terminal. Expiry is applied lazily: the
/// first lookup, accept or decline that sees `expires_at < now` persists
/// Expired.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'declined', 'expired');
///
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     invited_by UUID NOT NULL REFERENCES users(id),
///     email VARCHAR(255) NOT NULL,
///     status invitation_status NOT NULL DEFAULT 'pending',
///     expires_at TIMESTAMPTZ NOT NULL,
///     accepted_by UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::user::same_email;

/// Days an invitation stays acceptable
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Invitation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }

    /// Checks if a transition to another status is valid
    pub fn can_transition_to(&self, to: InvitationStatus) -> bool {
        use InvitationStatus::*;

        matches!(
            (self, to),
            (Pending, Accepted) | (Pending, Declined) | (Pending, Expired)
        )
    }
}

/// Invitation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,

    pub project_id: Uuid,

    /// Leader who sent the invitation
    pub invited_by: Uuid,

    /// Invited email address, as typed by the inviter
    pub email: String,

    pub status: InvitationStatus,

    pub expires_at: DateTime<Utc>,

    /// Set once the invitation is accepted
    pub accepted_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating an invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    pub project_id: Uuid,

    pub invited_by: Uuid,

    pub email: String,

    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    /// The single expiry predicate used by lookup, accept and decline
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Pending and not yet past its expiry
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired_at(now)
    }

    pub fn is_for_email(&self, email: &str) -> bool {
        same_email(&self.email, email)
    }

    pub async fn create<'e, E>(executor: E, data: CreateInvitation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (project_id, invited_by, email, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, invited_by, email, status, expires_at,
                      accepted_by, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.invited_by)
        .bind(data.email)
        .bind(data.expires_at)
        .fetch_one(executor)
        .await?;

        Ok(invitation)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, project_id, invited_by, email, status, expires_at,
                   accepted_by, created_at, updated_at
            FROM invitations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Finds a Pending, unexpired invitation for (project, email)
    pub async fn find_open<'e, E>(
        executor: E,
        project_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, project_id, invited_by, email, status, expires_at,
                   accepted_by, created_at, updated_at
            FROM invitations
            WHERE project_id = $1
              AND LOWER(email) = LOWER($2)
              AND status = 'pending'
              AND expires_at >= $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(email.trim())
        .bind(now)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Moves an invitation from `from` to `to`
    ///
    /// Compare-and-swap on the current status: returns `None` when the row is
    /// missing or no longer in `from`, so two racing callers cannot both win.
    pub async fn transition<'e, E>(
        executor: E,
        id: Uuid,
        from: InvitationStatus,
        to: InvitationStatus,
        accepted_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET status = $3,
                accepted_by = COALESCE($4, accepted_by),
                updated_at = $5
            WHERE id = $1 AND status = $2
            RETURNING id, project_id, invited_by, email, status, expires_at,
                      accepted_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(accepted_by)
        .bind(now)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }
}
