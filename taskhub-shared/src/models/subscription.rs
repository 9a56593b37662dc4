/// Subscription model and database operations
///
/// A subscription is a paid entitlement attached to a project. Once a project
/// holds `FREE_TIER_MEMBER_LIMIT` members, further invitations can only be
/// accepted while an Active subscription with a future end date exists.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE subscription_status AS ENUM ('active', 'expired', 'cancelled');
///
/// CREATE TABLE subscriptions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     purchased_by UUID NOT NULL REFERENCES users(id),
///     package_name VARCHAR(100) NOT NULL,
///     price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
///     starts_at TIMESTAMPTZ NOT NULL,
///     ends_at TIMESTAMPTZ NOT NULL,
///     status subscription_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX subscriptions_one_active
///     ON subscriptions (project_id) WHERE status = 'active';
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Members a project may hold without a subscription
pub const FREE_TIER_MEMBER_LIMIT: i64 = 4;

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, to: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;

        matches!((self, to), (Active, Expired) | (Active, Cancelled))
    }
}

/// Subscription
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,

    pub project_id: Uuid,

    pub purchased_by: Uuid,

    pub package_name: String,

    /// Price in cents
    pub price_cents: i64,

    pub starts_at: DateTime<Utc>,

    pub ends_at: DateTime<Utc>,

    pub status: SubscriptionStatus,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub project_id: Uuid,

    pub purchased_by: Uuid,

    pub package_name: String,

    pub price_cents: i64,

    pub starts_at: DateTime<Utc>,

    pub ends_at: DateTime<Utc>,
}

impl Subscription {
    /// Active status and an end date still in the future
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.ends_at > now
    }

    /// Inserts an Active subscription
    ///
    /// # Errors
    ///
    /// Unique violation on `subscriptions_one_active` if the project already
    /// has an Active row.
    pub async fn create<'e, E>(executor: E, data: CreateSubscription) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (project_id, purchased_by, package_name,
                                       price_cents, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, purchased_by, package_name, price_cents,
                      starts_at, ends_at, status, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.purchased_by)
        .bind(data.package_name)
        .bind(data.price_cents)
        .bind(data.starts_at)
        .bind(data.ends_at)
        .fetch_one(executor)
        .await?;

        Ok(subscription)
    }

    /// Finds the project's Active row, regardless of end date
    pub async fn find_active<'e, E>(executor: E, project_id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, project_id, purchased_by, package_name, price_cents,
                   starts_at, ends_at, status, created_at
            FROM subscriptions
            WHERE project_id = $1 AND status = 'active'
            "#,
        )
        .bind(project_id)
        .fetch_optional(executor)
        .await?;

        Ok(subscription)
    }
}
