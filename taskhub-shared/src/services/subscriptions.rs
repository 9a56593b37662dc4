/// Subscription gate
///
/// A project may hold up to [`FREE_TIER_MEMBER_LIMIT`] members for free.
/// Accepting an invitation past that point requires an Active subscription
/// whose end date is still ahead.
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::{require_permission, ProjectAction};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::models::subscription::{CreateSubscription, Subscription};
use crate::store::{Store, StoreResult, SubscriptionStore};

pub use crate::models::subscription::FREE_TIER_MEMBER_LIMIT;

pub const MAX_DURATION_MONTHS: u32 = 36;

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub project_id: Uuid,
    pub package_name: String,
    pub price_cents: i64,
    pub duration_months: u32,
}

/// Whether the project has an Active subscription that has not ended
pub async fn has_active_subscription<S: SubscriptionStore + ?Sized>(
    store: &S,
    project_id: Uuid,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    Ok(store
        .find_active_subscription(project_id)
        .await?
        .map_or(false, |s| s.is_active_at(now)))
}

#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Purchases a subscription starting now
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty package name, negative price or a
    ///   duration outside 1..=36 months
    /// - `NotFound` if the project does not exist
    /// - `Forbidden` if the caller is not the Leader
    /// - `Conflict` if the project already has an Active subscription
    pub async fn create(&self, caller_id: Uuid, input: NewSubscription) -> ServiceResult<Subscription> {
        let package_name = input.package_name.trim().to_string();
        if package_name.is_empty() {
            return Err(ServiceError::validation("Package name is required"));
        }
        if input.price_cents < 0 {
            return Err(ServiceError::validation("Price cannot be negative"));
        }
        if !(1..=MAX_DURATION_MONTHS).contains(&input.duration_months) {
            return Err(ServiceError::validation(format!(
                "Duration must be between 1 and {} months",
                MAX_DURATION_MONTHS
            )));
        }

        self.store
            .find_project(input.project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))?;

        require_permission(&*self.store, input.project_id, caller_id, ProjectAction::ManageSubscription)
            .await?;

        // An Active row blocks a new purchase even after its end date
        if self.store.find_active_subscription(input.project_id).await?.is_some() {
            return Err(ServiceError::conflict("Project already has an active subscription"));
        }

        let now = self.clock.now();

        let ends_at = now
            .checked_add_months(Months::new(input.duration_months))
            .ok_or_else(|| ServiceError::validation("Subscription end date is out of range"))?;

        let subscription = self
            .store
            .create_subscription(CreateSubscription {
                project_id: input.project_id,
                purchased_by: caller_id,
                package_name,
                price_cents: input.price_cents,
                starts_at: now,
                ends_at,
            })
            .await?;

        tracing::info!(
            project_id = %subscription.project_id,
            subscription_id = %subscription.id,
            package = %subscription.package_name,
            ends_at = %subscription.ends_at,
            "Subscription purchased"
        );

        Ok(subscription)
    }
}
